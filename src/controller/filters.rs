//! Filter application (spec §4.3 "Filter application").
//!
//! The controller inspects request parameters by declared field name and
//! applies one of three shapes: string filter (OR-split or independent-AND),
//! or integer range filter. `is_aggregated` routes the predicate to HAVING
//! instead of WHERE.

use crate::sql::{Connector, QueryBuilder};

/// Split `raw_value` by `,` and trim tokens, dropping empty ones — the
/// tokenization shared by both string-filter modes.
fn tokenize(raw_value: &str) -> Vec<String> {
    raw_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Apply a string filter on `column`.
///
/// - `or_split`: tokens are OR-joined as one nested group attached by AND.
///   Comparison is `ILIKE %token%` unless `equal`, in which case it's
///   `= token`. Otherwise, each token is an independent AND condition.
/// - `int_like`: tokens that don't parse as an integer are skipped (per
///   filter, not per request — a non-numeric token alongside numeric ones in
///   the same value still drops only that token).
/// - `is_aggregated`: predicates go to HAVING instead of WHERE.
pub fn apply_string_filter(
    qb: &mut QueryBuilder,
    column: &str,
    raw_value: &str,
    or_split: bool,
    equal: bool,
    int_like: bool,
    is_aggregated: bool,
) {
    let tokens: Vec<String> = tokenize(raw_value)
        .into_iter()
        .filter(|t| !int_like || t.parse::<i64>().is_ok())
        .collect();
    if tokens.is_empty() {
        return;
    }

    if or_split {
        let parts = tokens
            .into_iter()
            .map(|token| {
                if equal {
                    (column.to_string(), "=".to_string(), crate::sql::param(token))
                } else {
                    (
                        column.to_string(),
                        "ILIKE".to_string(),
                        crate::sql::param(format!("%{token}%")),
                    )
                }
            })
            .collect();
        qb.nested(is_aggregated, Connector::And, Connector::Or, parts);
    } else {
        for token in tokens {
            let (op, value) = if equal {
                ("=", token)
            } else {
                ("ILIKE", format!("%{token}%"))
            };
            if is_aggregated {
                qb.and_having(column, op, value);
            } else {
                qb.and_where(column, op, value);
            }
        }
    }
}

/// Apply an integer range filter (`{field}_from`/`{field}_to`) on `column`.
/// `is_year` additionally enforces `column >= 1950` regardless of `from`.
pub fn apply_integer_filter(
    qb: &mut QueryBuilder,
    column: &str,
    from: Option<i64>,
    to: Option<i64>,
    is_year: bool,
    is_aggregated: bool,
) {
    let mut push = |op: &str, value: i64| {
        if is_aggregated {
            qb.and_having(column, op, value);
        } else {
            qb.and_where(column, op, value);
        }
    };
    if is_year {
        push(">=", 1950);
    }
    if let Some(from) = from {
        push(">=", from);
    }
    if let Some(to) = to {
        push("<=", to);
    }
}
