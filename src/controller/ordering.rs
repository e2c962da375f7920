//! Ordering rules (spec §4.3 "Ordering rules", invariant 9).
//!
//! Conference/journal rank columns sort by a fixed ordinal, not by the raw
//! text value (`"A*"` must sort before `"A"`, which text order gets wrong).
//! Every other column sorts by its raw value.

/// Which ordinal mapping (if any) a column's values should be sorted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Plain,
    ConfRank,
    JournalRank,
}

/// Sort direction, spelled out exactly as the `ORDER BY` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(order_type: &str) -> Option<Self> {
        match order_type.to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Ordinal for a conference rank token: `A*→1, A→2, B→3, C→4, other→5`.
pub fn conf_rank_ordinal(token: &str) -> i32 {
    match token {
        "A*" => 1,
        "A" => 2,
        "B" => 3,
        "C" => 4,
        _ => 5,
    }
}

/// Ordinal for a journal quartile token: `Q1→1, Q2→2, Q3→3, Q4→4, other→5`.
pub fn journal_rank_ordinal(token: &str) -> i32 {
    match token {
        "Q1" => 1,
        "Q2" => 2,
        "Q3" => 3,
        "Q4" => 4,
        _ => 5,
    }
}

/// Build the `ORDER BY` fragment for `column` given its [`ColumnKind`] and
/// direction. Rank columns sort by a `CASE` ordinal expression first, then
/// by the raw column as the stable secondary key (spec invariant 9: "within
/// a rank group, secondary sort is by the raw column").
pub fn order_by_fragment(column: &str, kind: ColumnKind, direction: SortDirection) -> String {
    let dir = direction.keyword();
    match kind {
        ColumnKind::Plain => format!("{column} {dir}"),
        ColumnKind::ConfRank => format!(
            "CASE {column} WHEN 'A*' THEN 1 WHEN 'A' THEN 2 WHEN 'B' THEN 3 WHEN 'C' THEN 4 ELSE 5 END {dir}, {column} {dir}"
        ),
        ColumnKind::JournalRank => format!(
            "CASE {column} WHEN 'Q1' THEN 1 WHEN 'Q2' THEN 2 WHEN 'Q3' THEN 3 WHEN 'Q4' THEN 4 ELSE 5 END {dir}, {column} {dir}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conf_rank_orders_astar_first() {
        let mut tokens = vec!["B", "A*", "C", "A", "other"];
        tokens.sort_by_key(|t| conf_rank_ordinal(t));
        assert_eq!(tokens, vec!["A*", "A", "B", "C", "other"]);
    }

    #[test]
    fn journal_rank_orders_q1_first() {
        let mut tokens = vec!["Q3", "Q1", "Q4", "Q2"];
        tokens.sort_by_key(|t| journal_rank_ordinal(t));
        assert_eq!(tokens, vec!["Q1", "Q2", "Q3", "Q4"]);
    }

    #[test]
    fn plain_column_sorts_directly() {
        assert_eq!(order_by_fragment("p.title", ColumnKind::Plain, SortDirection::Asc), "p.title ASC");
    }

    #[test]
    fn rank_column_orders_by_case_then_raw_value() {
        let fragment = order_by_fragment("c.rank", ColumnKind::ConfRank, SortDirection::Desc);
        assert!(fragment.starts_with("CASE c.rank"));
        assert!(fragment.ends_with("c.rank DESC"));
    }

    #[test]
    fn parses_asc_desc_case_insensitively() {
        assert_eq!(SortDirection::parse("asc"), Some(SortDirection::Asc));
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::parse("sideways"), None);
    }
}
