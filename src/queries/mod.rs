//! Predefined Query Constructors (spec §4.2).
//!
//! Each function is a factory that returns a configured [`QueryBuilder`];
//! table/column names follow the entities in
//! `examples/original_source/com/gwngames/server/entity/base/` (Author,
//! Publication, Journal, Conference, Interest, Relationships). SQL logic
//! (joins, modal-rank aggregation, the `authors` denormalization consumed
//! read-only) follows `examples/original_source/com/gwngames/server/query/queries/AuthorQuery.py`.
//! All batched constructors encode their input list as a `VALUES` join
//! rather than a long `IN (...)` list, per spec §4.2.

use crate::sql::{JoinKind, QueryBuilder};

/// Publications overview (spec §4.2).
pub fn publications_overview() -> QueryBuilder {
    let mut qb = QueryBuilder::new("publication", "p");
    qb.select(
        "p.id::text AS id, \
         initcap(p.title) AS title, \
         CASE WHEN p.publication_year < 1950 THEN '' ELSE p.publication_year::text END AS year, \
         p.publisher AS publisher, \
         p.authors AS authors, \
         MODE() WITHIN GROUP (ORDER BY NULLIF(regexp_replace(j.sjr, '[^0-9.]', '', 'g'), '')::numeric) AS journal_score, \
         j.q_rank AS journal_rank, \
         c.rank AS conference_rank",
    );
    qb.join(JoinKind::Left, "journal", "j", "p.journal_id", "j.id")
        .expect("literal join columns");
    qb.join(JoinKind::Left, "conference", "c", "p.conference_id", "c.id")
        .expect("literal join columns");
    qb.join(
        JoinKind::Inner,
        "publication_scholar",
        "ps",
        "ps.publication_id",
        "p.id",
    )
    .expect("literal join columns");
    qb.group_by(&[
        "p.id",
        "p.title",
        "p.publication_year",
        "p.publisher",
        "p.authors",
        "j.q_rank",
        "c.rank",
    ]);
    qb
}

/// Publication detail (spec §4.2): overview columns plus description,
/// scholar URL, journal h-index, and summed scholar citations; filtered to
/// one id, `LIMIT 1`.
pub fn publication_detail(publication_id: i32) -> QueryBuilder {
    let mut qb = QueryBuilder::new("publication", "p");
    qb.select(
        "p.id::text AS id, \
         initcap(p.title) AS title, \
         CASE WHEN p.publication_year < 1950 THEN '' ELSE p.publication_year::text END AS year, \
         p.publisher AS publisher, \
         p.description AS description, \
         p.authors AS authors, \
         ps.profile_url AS scholar_url, \
         j.h_index AS journal_h_index, \
         j.q_rank AS journal_rank, \
         c.rank AS conference_rank, \
         SUM(ps.total_citations) AS total_citations",
    );
    qb.join(JoinKind::Left, "journal", "j", "p.journal_id", "j.id")
        .expect("literal join columns");
    qb.join(JoinKind::Left, "conference", "c", "p.conference_id", "c.id")
        .expect("literal join columns");
    qb.join(
        JoinKind::Inner,
        "publication_scholar",
        "ps",
        "ps.publication_id",
        "p.id",
    )
    .expect("literal join columns");
    qb.and_where("p.id", "=", publication_id);
    qb.group_by(&[
        "p.id",
        "p.title",
        "p.publication_year",
        "p.publisher",
        "p.description",
        "p.authors",
        "ps.profile_url",
        "j.h_index",
        "j.q_rank",
        "c.rank",
    ]);
    qb.limit(1);
    qb
}

/// Authors overview (spec §4.2): five CTEs LEFT JOINed onto `author_base`.
pub fn authors_overview() -> QueryBuilder {
    let mut author_base = QueryBuilder::new("author", "a");
    author_base.select("a.id, a.name, a.role, a.organization, a.image_url, a.homepage_url");
    author_base
        .join(
            JoinKind::Inner,
            "author_scholar",
            "asch",
            "asch.author_id",
            "a.id",
        )
        .expect("literal join columns");

    let mut interests = QueryBuilder::new("author_interest", "ai");
    interests.select("ai.author_id, STRING_AGG(DISTINCT i.name, ', ') AS interest_names");
    interests
        .join(JoinKind::Inner, "interest", "i", "i.id", "ai.interest_id")
        .expect("literal join columns");
    interests.group_by(&["ai.author_id"]);

    let mut freq_conf_rank = QueryBuilder::new("publication_author", "pa");
    freq_conf_rank.select(
        "pa.author_id, MODE() WITHIN GROUP (ORDER BY c.rank) AS freq_conf_rank",
    );
    freq_conf_rank
        .join(
            JoinKind::Inner,
            "publication",
            "p",
            "p.id",
            "pa.publication_id",
        )
        .expect("literal join columns");
    freq_conf_rank
        .join(JoinKind::Inner, "conference", "c", "c.id", "p.conference_id")
        .expect("literal join columns");
    freq_conf_rank.group_by(&["pa.author_id"]);

    let mut freq_journal_rank = QueryBuilder::new("publication_author", "pa");
    freq_journal_rank.select(
        "pa.author_id, MODE() WITHIN GROUP (ORDER BY j.q_rank) AS freq_journal_rank",
    );
    freq_journal_rank
        .join(
            JoinKind::Inner,
            "publication",
            "p",
            "p.id",
            "pa.publication_id",
        )
        .expect("literal join columns");
    freq_journal_rank
        .join(JoinKind::Inner, "journal", "j", "j.id", "p.journal_id")
        .expect("literal join columns");
    freq_journal_rank.group_by(&["pa.author_id"]);

    let mut avg_sjr_score = QueryBuilder::new("publication_author", "pa");
    avg_sjr_score.select(
        "pa.author_id, ROUND(AVG(NULLIF(regexp_replace(j.sjr, '[^0-9.]', '', 'g'), '')::numeric), 2) AS avg_sjr_score",
    );
    avg_sjr_score
        .join(
            JoinKind::Inner,
            "publication",
            "p",
            "p.id",
            "pa.publication_id",
        )
        .expect("literal join columns");
    avg_sjr_score
        .join(JoinKind::Inner, "journal", "j", "j.id", "p.journal_id")
        .expect("literal join columns");
    avg_sjr_score.group_by(&["pa.author_id"]);

    let mut qb = QueryBuilder::new("author_base", "ab");
    qb.select(
        "ab.id, ab.name, \
         CASE WHEN ab.role = '?' OR ab.role IS NULL THEN ab.organization \
              ELSE ab.role || ' - ' || ab.organization END AS organization, \
         ab.image_url, ab.homepage_url, \
         itr.interest_names, fcr.freq_conf_rank, fjr.freq_journal_rank, sjr.avg_sjr_score",
    );
    qb.with_cte("author_base", &author_base);
    qb.with_cte("interests", &interests);
    qb.with_cte("freq_conf_rank", &freq_conf_rank);
    qb.with_cte("freq_journal_rank", &freq_journal_rank);
    qb.with_cte("avg_sjr_score", &avg_sjr_score);
    qb.join_raw("LEFT JOIN interests AS itr ON itr.author_id = ab.id");
    qb.join_raw("LEFT JOIN freq_conf_rank AS fcr ON fcr.author_id = ab.id");
    qb.join_raw("LEFT JOIN freq_journal_rank AS fjr ON fjr.author_id = ab.id");
    qb.join_raw("LEFT JOIN avg_sjr_score AS sjr ON sjr.author_id = ab.id");
    qb
}

/// Author detail (spec §4.2): per-author aggregates, filtered to one id.
pub fn author_detail(author_id: i32) -> QueryBuilder {
    let mut qb = QueryBuilder::new("author", "a");
    qb.select(
        "a.id, a.name, a.role, a.organization, \
         asch.scholar_id, asch.h_index, asch.i10_index, \
         STRING_AGG(DISTINCT i.name, ', ') AS interests, \
         MODE() WITHIN GROUP (ORDER BY c.rank) AS freq_conf_rank, \
         MODE() WITHIN GROUP (ORDER BY j.q_rank) AS freq_journal_rank, \
         ROUND(AVG(NULLIF(regexp_replace(j.sjr, '[^0-9.]', '', 'g'), '')::numeric), 2) AS avg_sjr_score, \
         SUM(asch.total_citations) AS total_citations, \
         COUNT(DISTINCT pa.publication_id) AS publication_count",
    );
    qb.join(
        JoinKind::Inner,
        "author_scholar",
        "asch",
        "asch.author_id",
        "a.id",
    )
    .expect("literal join columns");
    qb.join(JoinKind::Left, "author_interest", "ai", "ai.author_id", "a.id")
        .expect("literal join columns");
    qb.join(JoinKind::Left, "interest", "i", "i.id", "ai.interest_id")
        .expect("literal join columns");
    qb.join(
        JoinKind::Left,
        "publication_author",
        "pa",
        "pa.author_id",
        "a.id",
    )
    .expect("literal join columns");
    qb.join(
        JoinKind::Left,
        "publication",
        "p",
        "p.id",
        "pa.publication_id",
    )
    .expect("literal join columns");
    qb.join(JoinKind::Left, "conference", "c", "c.id", "p.conference_id")
        .expect("literal join columns");
    qb.join(JoinKind::Left, "journal", "j", "j.id", "p.journal_id")
        .expect("literal join columns");
    qb.and_where("a.id", "=", author_id);
    qb.group_by(&[
        "a.id",
        "a.name",
        "a.role",
        "a.organization",
        "asch.scholar_id",
        "asch.h_index",
        "asch.i10_index",
    ]);
    qb.limit(1);
    qb
}

/// Conferences list (spec §4.2): restricted to a non-null rank.
pub fn conferences_list() -> QueryBuilder {
    let mut qb = QueryBuilder::new("conference", "c");
    qb.select("c.id, c.title, c.acronym, c.publisher, c.rank, c.dblp_link, c.average_rating");
    qb.and_is_not_null("c.rank");
    qb
}

/// Journals list (spec §4.2): restricted to a non-null rank.
pub fn journals_list() -> QueryBuilder {
    let mut qb = QueryBuilder::new("journal", "j");
    qb.select("j.id, j.title, j.year, j.sjr, j.q_rank, j.h_index");
    qb.and_is_not_null("j.q_rank");
    qb
}

/// Which venue foreign key a venue query joins against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueKind {
    Journal,
    Conference,
}

impl VenueKind {
    fn fk_column(self) -> &'static str {
        match self {
            VenueKind::Journal => "p.journal_id",
            VenueKind::Conference => "p.conference_id",
        }
    }
}

/// Venue → publications (spec §4.2): publication ids for a set of venue ids.
pub fn venue_publications(kind: VenueKind, venue_ids: &[i32]) -> QueryBuilder {
    let mut qb = QueryBuilder::new("publication", "p");
    qb.select("DISTINCT p.id");
    let values = qb.values_source("v", "id", venue_ids);
    qb.join_raw(format!("INNER JOIN {values} ON v.id = {}", kind.fk_column()));
    qb
}

/// Venue → authors (spec §4.2): distinct author names for a set of venue ids.
pub fn venue_authors(kind: VenueKind, venue_ids: &[i32]) -> QueryBuilder {
    let mut qb = QueryBuilder::new("publication", "p");
    qb.select("DISTINCT a.name");
    let values = qb.values_source("v", "id", venue_ids);
    qb.join_raw(format!("INNER JOIN {values} ON v.id = {}", kind.fk_column()));
    qb.join(
        JoinKind::Inner,
        "publication_author",
        "pa",
        "pa.publication_id",
        "p.id",
    )
    .expect("literal join columns");
    qb.join(JoinKind::Inner, "author", "a", "a.id", "pa.author_id")
        .expect("literal join columns");
    qb
}

/// Author co-author list (spec §4.2): union of both directions of the
/// symmetric pair table.
pub fn author_coauthors(author_id: i32) -> QueryBuilder {
    let mut forward = QueryBuilder::new("author_coauthor", "ac");
    forward.select("ac.coauthor_id AS coauthor_id");
    forward.and_where("ac.author_id", "=", author_id);

    let mut backward = QueryBuilder::new("author_coauthor", "ac");
    backward.select("ac.author_id AS coauthor_id");
    backward.and_where("ac.coauthor_id", "=", author_id);

    let mut qb = QueryBuilder::new("both_directions", "bd");
    qb.select("DISTINCT bd.coauthor_id");
    qb.with_union_cte("both_directions", &[&forward, &backward]);
    qb
}

/// Co-author edge batch (spec §4.2): distinct `(start_author, end_author)`
/// pairs where both co-appear on a publication and both have scholar
/// records. Drives the BFS expansion in [`crate::graph`].
pub fn coauthor_edge_batch(root_ids: &[i32]) -> QueryBuilder {
    let mut qb = QueryBuilder::new("publication_author", "pa1");
    qb.select(
        "DISTINCT pa1.author_id AS sid, sa.name AS slabel, sa.image_url AS simg, \
         pa2.author_id AS eid, ea.name AS elabel, ea.image_url AS eimg",
    );
    let values = qb.values_source("roots", "id", root_ids);
    qb.join_raw(format!("INNER JOIN {values} ON roots.id = pa1.author_id"));
    qb.join(
        JoinKind::Inner,
        "publication_author",
        "pa2",
        "pa2.publication_id",
        "pa1.publication_id",
    )
    .expect("literal join columns");
    qb.join(JoinKind::Inner, "author", "sa", "sa.id", "pa1.author_id")
        .expect("literal join columns");
    qb.join(JoinKind::Inner, "author", "ea", "ea.id", "pa2.author_id")
        .expect("literal join columns");
    qb.join(
        JoinKind::Inner,
        "author_scholar",
        "ssch",
        "ssch.author_id",
        "pa1.author_id",
    )
    .expect("literal join columns");
    qb.join(
        JoinKind::Inner,
        "author_scholar",
        "esch",
        "esch.author_id",
        "pa2.author_id",
    )
    .expect("literal join columns");
    qb.and_raw("pa1.author_id <> pa2.author_id");
    qb
}

/// Pair publication-rank batch (spec §4.2): per `(a1,a2)` pair with
/// `a1 < a2`, counts of shared publications grouped by
/// `coalesce(journal_rank, conference_rank)`.
pub fn pair_rank_batch(pairs: &[(i32, i32)]) -> QueryBuilder {
    let mut qb = QueryBuilder::new("publication_author", "pa1");
    qb.select(
        "pairs.a1 AS a1, pairs.a2 AS a2, \
         COALESCE(j.q_rank, c.rank) AS rank_token, COUNT(*) AS hit_count",
    );
    let values = qb.values_source2("pairs", "a1", "a2", pairs);
    qb.join_raw(format!("INNER JOIN {values} ON pairs.a1 = pa1.author_id"));
    qb.join(
        JoinKind::Inner,
        "publication_author",
        "pa2",
        "pa2.publication_id",
        "pa1.publication_id",
    )
    .expect("literal join columns");
    qb.and_raw("pa2.author_id = pairs.a2");
    qb.join(
        JoinKind::Inner,
        "publication",
        "p",
        "p.id",
        "pa1.publication_id",
    )
    .expect("literal join columns");
    qb.join(JoinKind::Left, "journal", "j", "j.id", "p.journal_id")
        .expect("literal join columns");
    qb.join(JoinKind::Left, "conference", "c", "c.id", "p.conference_id")
        .expect("literal join columns");
    qb.group_by(&["pairs.a1", "pairs.a2", "j.q_rank", "c.rank"]);
    qb
}

/// Pair publication-year batch (spec §4.2): same input shape, counts grouped
/// by publication year.
pub fn pair_year_batch(pairs: &[(i32, i32)]) -> QueryBuilder {
    let mut qb = QueryBuilder::new("publication_author", "pa1");
    qb.select(
        "pairs.a1 AS a1, pairs.a2 AS a2, p.publication_year AS year, COUNT(*) AS hit_count",
    );
    let values = qb.values_source2("pairs", "a1", "a2", pairs);
    qb.join_raw(format!("INNER JOIN {values} ON pairs.a1 = pa1.author_id"));
    qb.join(
        JoinKind::Inner,
        "publication_author",
        "pa2",
        "pa2.publication_id",
        "pa1.publication_id",
    )
    .expect("literal join columns");
    qb.and_raw("pa2.author_id = pairs.a2");
    qb.join(
        JoinKind::Inner,
        "publication",
        "p",
        "p.id",
        "pa1.publication_id",
    )
    .expect("literal join columns");
    qb.group_by(&["pairs.a1", "pairs.a2", "p.publication_year"]);
    qb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publications_overview_restricts_to_scholar_rows() {
        let sql = publications_overview().build_query_string();
        assert!(sql.contains("INNER JOIN publication_scholar"));
        assert!(sql.contains("MODE() WITHIN GROUP"));
    }

    #[test]
    fn publication_detail_limits_to_one_row() {
        let sql = publication_detail(42).build_query_string();
        assert!(sql.ends_with("LIMIT 1"));
        assert!(sql.contains("p.id = :"));
    }

    #[test]
    fn authors_overview_declares_five_ctes() {
        let sql = authors_overview().build_query_string();
        assert!(sql.starts_with("WITH author_base AS"));
        for cte in ["author_base", "interests", "freq_conf_rank", "freq_journal_rank", "avg_sjr_score"] {
            assert!(sql.contains(&format!("{cte} AS (")));
        }
    }

    #[test]
    fn venues_lists_require_non_null_rank() {
        assert!(conferences_list().build_query_string().contains("c.rank IS NOT NULL"));
        assert!(journals_list().build_query_string().contains("j.q_rank IS NOT NULL"));
    }

    #[test]
    fn coauthor_edge_batch_uses_values_join_not_in_list() {
        let sql = coauthor_edge_batch(&[1, 2, 3]).build_query_string();
        assert!(sql.contains("VALUES"));
        assert!(!sql.contains(" IN ("));
    }

    #[test]
    fn pair_batches_join_on_values_source() {
        let sql = pair_rank_batch(&[(1, 2), (2, 3)]).build_query_string();
        assert!(sql.contains("(VALUES"));
        assert!(sql.contains("pairs(a1,a2)"));
    }
}
