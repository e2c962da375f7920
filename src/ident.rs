//! Safe SQL identifier validation.
//!
//! Adapted from `examples/fankaiLiu-pgorm/crates/pgorm/src/ident.rs`, trimmed
//! to what this crate actually needs: validating identifiers that originate
//! from request input (order-by/filter column names handled by the Table
//! Controller, spec §4.3) before they are spliced into SQL text. Query
//! constructors that only ever splice in their own literal column names don't
//! need this — it exists for the one seam where an identifier is untrusted.

use crate::error::{CoreError, CoreResult};

/// Validate `name` as a safe unquoted SQL identifier (optionally dotted, e.g.
/// `p.publication_year`), matching `[A-Za-z_][A-Za-z0-9_$]*` per segment.
///
/// Returns `name` unchanged on success; this is a gate, not a rewrite.
pub fn validate_ident(name: &str) -> CoreResult<&str> {
    if name.is_empty() {
        return Err(CoreError::bad_request("identifier cannot be empty"));
    }
    for segment in name.split('.') {
        if segment.is_empty() {
            return Err(CoreError::bad_request(format!(
                "empty identifier segment in '{name}'"
            )));
        }
        let mut chars = segment.chars();
        let first = chars.next().unwrap();
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(CoreError::bad_request(format!(
                "invalid identifier '{name}'"
            )));
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            return Err(CoreError::bad_request(format!(
                "invalid identifier '{name}'"
            )));
        }
    }
    Ok(name)
}

/// Validate `name` as safe to splice into a double-quoted SQL identifier
/// (`"name"`). Unlike [`validate_ident`], this accepts the display-name
/// columns the Table Controller sorts by (spec §4.3's `order_column`, e.g.
/// `"Frequent Conf. Rank"`) — the original's `OrderFunctions.py`
/// double-quotes exactly these human-readable aliases, spaces, periods, and
/// all. The only requirement for safety is that the name cannot contain a
/// double quote itself, which would let it escape the quoting and splice
/// arbitrary SQL.
pub fn validate_quotable_ident(name: &str) -> CoreResult<&str> {
    if name.is_empty() {
        return Err(CoreError::bad_request("identifier cannot be empty"));
    }
    if name.contains('"') || name.contains('\0') {
        return Err(CoreError::bad_request(format!("invalid identifier '{name}'")));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dotted_column_name() {
        assert_eq!(validate_ident("p.publication_year").unwrap(), "p.publication_year");
    }

    #[test]
    fn quotable_ident_accepts_display_name_with_space_and_period() {
        assert_eq!(
            validate_quotable_ident("Frequent Conf. Rank").unwrap(),
            "Frequent Conf. Rank"
        );
    }

    #[test]
    fn quotable_ident_rejects_embedded_quote() {
        assert!(validate_quotable_ident(r#"a" OR "1"="1"#).is_err());
    }

    #[test]
    fn quotable_ident_rejects_empty() {
        assert!(validate_quotable_ident("").is_err());
    }

    #[test]
    fn rejects_injection_attempt() {
        assert!(validate_ident("id; DROP TABLE author --").is_err());
    }

    #[test]
    fn rejects_empty_segment() {
        assert!(validate_ident("p.").is_err());
    }
}
