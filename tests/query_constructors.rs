//! Rendered-SQL shape checks for the Predefined Query Constructors
//! (spec §4.2). These never touch a database; they assert on
//! `build_query_string()` output, which is deterministic given the
//! constructor's inputs.

use citegraph_core::queries::{
    author_coauthors, author_detail, authors_overview, coauthor_edge_batch, conferences_list,
    journals_list, pair_rank_batch, pair_year_batch, publication_detail, publications_overview,
    venue_authors, venue_publications, VenueKind,
};

#[test]
fn publications_overview_groups_by_every_non_aggregate_column() {
    let sql = publications_overview().build_query_string();
    assert!(sql.contains("GROUP BY"));
    assert!(sql.contains("LEFT JOIN journal"));
    assert!(sql.contains("LEFT JOIN conference"));
}

#[test]
fn publication_detail_filters_a_single_id() {
    let sql = publication_detail(7).build_query_string();
    assert!(sql.contains("SUM(ps.total_citations)"));
    assert!(sql.ends_with("LIMIT 1"));
}

#[test]
fn authors_overview_left_joins_all_derived_ctes() {
    let sql = authors_overview().build_query_string();
    assert!(sql.contains("LEFT JOIN interests AS itr"));
    assert!(sql.contains("LEFT JOIN freq_conf_rank AS fcr"));
    assert!(sql.contains("LEFT JOIN freq_journal_rank AS fjr"));
    assert!(sql.contains("LEFT JOIN avg_sjr_score AS sjr"));
}

#[test]
fn author_detail_aggregates_interests_and_citations() {
    let sql = author_detail(1).build_query_string();
    assert!(sql.contains("STRING_AGG(DISTINCT i.name"));
    assert!(sql.contains("SUM(asch.total_citations)"));
}

#[test]
fn venue_queries_select_by_kind() {
    let pubs = venue_publications(VenueKind::Journal, &[1, 2]).build_query_string();
    assert!(pubs.contains("v.id = p.journal_id"));
    let authors = venue_authors(VenueKind::Conference, &[1, 2]).build_query_string();
    assert!(authors.contains("v.id = p.conference_id"));
}

#[test]
fn conferences_and_journals_lists_reject_null_rank() {
    assert!(conferences_list().build_query_string().contains("IS NOT NULL"));
    assert!(journals_list().build_query_string().contains("IS NOT NULL"));
}

#[test]
fn author_coauthors_unions_both_relationship_directions() {
    let sql = author_coauthors(5).build_query_string();
    assert!(sql.contains(" UNION "));
    assert!(sql.contains("WITH both_directions AS"));
}

#[test]
fn coauthor_edge_batch_excludes_self_pairs() {
    let sql = coauthor_edge_batch(&[1, 2]).build_query_string();
    assert!(sql.contains("pa1.author_id <> pa2.author_id"));
}

#[test]
fn pair_batches_constrain_to_the_requested_pairs() {
    let rank_sql = pair_rank_batch(&[(1, 2)]).build_query_string();
    assert!(rank_sql.contains("pa2.author_id = pairs.a2"));
    let year_sql = pair_year_batch(&[(1, 2)]).build_query_string();
    assert!(year_sql.contains("p.publication_year"));
}
