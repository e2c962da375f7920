//! Rewriting `:name` placeholders to the driver's `$n` positional syntax.
//!
//! Grounded on `QueryBuilder._convert_params_for_psycopg` in
//! `examples/original_source/com/gwngames/server/query/QueryBuilder.py`, which
//! does the equivalent rewrite to `%(name)s` with a single regex pass. Names
//! are produced by [`next_param_name`], mirroring `_next_param_name` there:
//! `md5(base)[..10]` plus a per-builder counter, so two conditions built from
//! the same base text never collide.

use md5::{Digest, Md5};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tokio_postgres::types::ToSql;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").unwrap())
}

/// The `:name` placeholder pattern, exposed for placeholder-prefixing in
/// [`crate::sql::builder::QueryBuilder::absorb`] and for builder tests.
pub(crate) fn placeholder_regex() -> &'static Regex {
    placeholder_re()
}

/// Derive a stable `:name` placeholder name from a base text and a counter.
///
/// The counter is required even though the hash is already unique per base
/// text: the same base text (e.g. the same column name) is often bound more
/// than once in one query (an `id BETWEEN :x AND :y`-shaped condition, or the
/// same filter applied to two joined tables), and each occurrence needs its
/// own placeholder.
pub fn next_param_name(base: &str, counter: u32) -> String {
    let digest = Md5::digest(base.as_bytes());
    let hex = format!("{digest:x}");
    format!("{}{}", &hex[..10], counter)
}

/// Rewrite every `:name` occurrence in `sql` to `$1`, `$2`, ... in the order
/// encountered, looking up bound values from `params` by name.
///
/// Returns the rewritten SQL text and the positional argument list in `$n`
/// order. Errors if a placeholder in `sql` has no entry in `params` (spec
/// invariant: every `:name` token has a matching parameter map entry).
pub fn rewrite_to_positional<'a>(
    sql: &str,
    params: &'a std::collections::HashMap<String, Arc<dyn ToSql + Sync + Send>>,
) -> Result<(String, Vec<&'a (dyn ToSql + Sync)>), String> {
    let mut ordered: Vec<&'a (dyn ToSql + Sync)> = Vec::new();
    let mut index = 0usize;
    let rewritten = placeholder_re().replace_all(sql, |_: &regex::Captures| {
        index += 1;
        format!("${index}")
    });

    // Second pass to resolve references, since `replace_all`'s closure above
    // can't return borrowed values through `String`.
    for caps in placeholder_re().captures_iter(sql) {
        let name = &caps[1];
        match params.get(name) {
            Some(value) => ordered.push(value.as_ref()),
            None => return Err(format!("unbound placeholder :{name}")),
        }
    }

    Ok((rewritten.into_owned(), ordered))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_name_depends_on_base_and_counter() {
        let a = next_param_name("author.name", 0);
        let b = next_param_name("author.name", 1);
        assert_ne!(a, b);
        assert_eq!(a, next_param_name("author.name", 0));
    }

    #[test]
    fn rewrite_replaces_in_encounter_order() {
        let mut params: std::collections::HashMap<String, Arc<dyn ToSql + Sync + Send>> =
            std::collections::HashMap::new();
        params.insert("abc0".to_string(), Arc::new(1_i32));
        params.insert("def1".to_string(), Arc::new("x".to_string()));

        let (sql, ordered) =
            rewrite_to_positional("SELECT * FROM t WHERE a = :abc0 AND b = :def1", &params)
                .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE a = $1 AND b = $2");
        assert_eq!(ordered.len(), 2);
    }

    #[test]
    fn rewrite_errors_on_unbound_name() {
        let params: std::collections::HashMap<String, Arc<dyn ToSql + Sync + Send>> =
            std::collections::HashMap::new();
        let err = rewrite_to_positional("SELECT 1 WHERE x = :missing", &params).unwrap_err();
        assert!(err.contains("missing"));
    }
}
