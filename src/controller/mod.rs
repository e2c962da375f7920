//! Table Controller (spec §4.3).

pub mod filters;
pub mod handle;
pub mod ordering;

pub use handle::TableHandleStore;
pub use ordering::{ColumnKind, SortDirection};

use crate::client::GenericClient;
use crate::error::{CoreError, CoreResult};
use crate::ident::validate_quotable_ident;
use crate::row::row_to_json;
use crate::sql::{QueryBuilder, QueryCache};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// A page of rows plus the metadata a JSON `/fetch_data`-shaped response
/// needs (spec §6): `{rows, offset, limit, total_count, row_methods}`.
#[derive(Debug, Serialize)]
pub struct TablePage {
    pub rows: Vec<serde_json::Map<String, Value>>,
    pub columns: Vec<String>,
    pub offset: i64,
    pub limit: i64,
    pub total_count: i64,
    pub handle: Uuid,
}

/// Turns a composed query plus user request parameters into an executed,
/// paginated result behind a short-lived handle (spec §4.3).
pub struct TableController {
    handles: TableHandleStore,
}

impl TableController {
    pub fn new(handles: TableHandleStore) -> Self {
        Self { handles }
    }

    fn count_query(base: &QueryBuilder) -> QueryBuilder {
        let unpaged = base.clone(true, true);
        let mut counted = QueryBuilder::new("counted", "counted");
        counted.select("COUNT(*) AS total_count");
        counted.from_subquery(&unpaged, "counted");
        counted
    }

    async fn read_count(
        count_qb: &QueryBuilder,
        client: &impl GenericClient,
        cache: &QueryCache,
    ) -> CoreResult<i64> {
        let rows = count_qb.execute(client, cache).await?;
        let row = rows
            .first()
            .ok_or_else(|| CoreError::internal("count query returned no rows"))?;
        row.try_get::<_, i64>("total_count")
            .map_err(|e| CoreError::internal(format!("reading total_count: {e}")))
    }

    /// First page of a freshly composed query (spec §4.3 "Initial page").
    /// Applies `LIMIT overview_limit OFFSET 0`, executes, deduplicates rows
    /// by the first column's value (stable order), and stores the *unpaged*
    /// builder behind a new handle for subsequent paging.
    pub async fn initial_page(
        &self,
        mut builder: QueryBuilder,
        row_methods: Vec<(String, ColumnKind)>,
        overview_limit: i64,
        client: &impl GenericClient,
        cache: &QueryCache,
    ) -> CoreResult<TablePage> {
        let count_qb = Self::count_query(&builder);
        let total_count = Self::read_count(&count_qb, client, cache).await?;

        let mut paged = builder.clone(true, true);
        paged.limit(overview_limit).offset(0);
        let rows = paged.execute(client, cache).await?;

        let mut columns = Vec::new();
        let mut seen_first_column = std::collections::HashSet::new();
        let mut out_rows = Vec::new();
        for row in rows.iter() {
            let json_row = row_to_json(row)?;
            if columns.is_empty() {
                columns = json_row.iter().map(|(name, _)| name.clone()).collect();
            }
            if let Some((_, first_value)) = json_row.first() {
                let key = first_value.to_string();
                if !seen_first_column.insert(key) {
                    continue;
                }
            }
            out_rows.push(json_row.into_iter().collect());
        }

        builder.limit(overview_limit).offset(0);
        let handle = self.handles.insert(builder, row_methods);

        Ok(TablePage {
            rows: out_rows,
            columns,
            offset: 0,
            limit: overview_limit,
            total_count,
            handle,
        })
    }

    /// Subsequent page/sort request against an existing handle (spec §4.3
    /// "Subsequent pages").
    #[allow(clippy::too_many_arguments)]
    pub async fn fetch_data(
        &self,
        handle: Uuid,
        offset: i64,
        limit: i64,
        order_column: Option<&str>,
        order_type: Option<&str>,
        client: &impl GenericClient,
        cache: &QueryCache,
    ) -> CoreResult<TablePage> {
        let (executable, count_base) = self.handles.with_entry(handle, |qb, row_methods| {
            let base_for_count = qb.clone(true, true);

            let executable = match (order_column, order_type) {
                (Some(col), Some(dir)) => {
                    let validated = validate_quotable_ident(col)?;
                    let direction = ordering::SortDirection::parse(dir)
                        .ok_or_else(|| CoreError::bad_request(format!("invalid order_type '{dir}'")))?;
                    let kind = row_methods
                        .iter()
                        .find(|(name, _)| name.as_str() == validated)
                        .map(|(_, kind)| *kind)
                        .unwrap_or(ColumnKind::Plain);

                    let unordered = qb.clone(true, true);
                    let mut wrapped = QueryBuilder::new("ordered", "ordered");
                    wrapped.select("ordered.*");
                    wrapped.from_subquery(&unordered, "ordered");
                    let qualified = format!("ordered.\"{validated}\"");
                    wrapped.and_is_not_null(&qualified);
                    wrapped.and_where(&qualified, "<>", String::new());
                    wrapped.order_by_raw(ordering::order_by_fragment(&qualified, kind, direction));
                    wrapped.limit(limit).offset(offset);
                    wrapped
                }
                _ => {
                    let mut plain = qb.clone(false, false);
                    plain.limit(limit).offset(offset);
                    plain
                }
            };

            // Persist the (re-wrapped/re-paginated) builder back into the
            // handle, matching the original's accepted footgun (spec §5
            // "Mutation discipline"): `fetch_data` mutates the stored query
            // in place, safe only because a handle is single-user.
            *qb = executable.clone(false, false);
            Ok::<_, CoreError>((executable, base_for_count))
        })??;

        let count_qb = Self::count_query(&count_base);
        let total_count = Self::read_count(&count_qb, client, cache).await?;

        let rows = executable.execute(client, cache).await?;
        let mut columns = Vec::new();
        let mut out_rows = Vec::new();
        for row in rows.iter() {
            let json_row = row_to_json(row)?;
            if columns.is_empty() {
                columns = json_row.iter().map(|(name, _)| name.clone()).collect();
            }
            out_rows.push(json_row.into_iter().collect());
        }

        Ok(TablePage {
            rows: out_rows,
            columns,
            offset,
            limit,
            total_count,
            handle,
        })
    }
}
