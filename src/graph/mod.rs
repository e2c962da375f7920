//! Graph Materializer (spec §4.4): BFS co-author expansion plus pair/node
//! enrichment, bounded to `max_active_transactions` concurrent queries.

pub mod bfs;
pub mod classify;
pub mod types;

use crate::error::CoreResult;
use crate::queries;
use crate::sql::QueryCache;
use bfs::{chunk, BfsState};
use classify::{build_adjacency, build_link, classify_edge, discovery_counts, edge_key, EdgeDataMap, Tier};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use types::{GraphResult, Link, Node};

/// Request parameters for graph materialization (spec §4.4 step 0).
pub struct GraphRequest {
    pub root_author_ids: Vec<i32>,
    pub depth: u32,
}

/// Runs the full materializer pipeline (spec §4.4 steps 1-10) against a
/// pool. Every batch checks out its own pooled connection and queries run
/// concurrently, bounded to `max_active_transactions` in-flight at once.
pub async fn materialize(
    request: GraphRequest,
    pool: &deadpool_postgres::Pool,
    cache: &Arc<QueryCache>,
    max_active_transactions: usize,
    max_tuple_per_query: usize,
) -> CoreResult<GraphResult> {
    let roots: HashSet<i32> = request.root_author_ids.iter().copied().collect();
    let semaphore = Arc::new(Semaphore::new(max_active_transactions.max(1)));

    // Steps 1-2: bounded BFS fan-out, one depth at a time.
    let mut state = BfsState::new(&request.root_author_ids);
    for _ in 0..request.depth {
        let current = state.advance();
        if current.is_empty() {
            break;
        }
        let edges = fetch_batches(&current, pool, cache, &semaphore, max_tuple_per_query).await;
        state.absorb(edges);
    }

    // Step 3: boundary pass — one more batch on the final unseen frontier,
    // producing weak edges without extending the frontier any further.
    let boundary_ids = state.unseen_frontier();
    let boundary_edges = if boundary_ids.is_empty() {
        Vec::new()
    } else {
        fetch_batches(&boundary_ids, pool, cache, &semaphore, max_tuple_per_query).await
    };

    // Step 4: dedup strong edges first, then admit boundary weak edges only
    // between already-discovered nodes.
    let mut edges = EdgeDataMap::new();
    for edge in state.strong_edges {
        edges.insert_strong(edge);
    }
    for edge in boundary_edges {
        edges.insert_weak(edge, &state.seen);
    }

    // Step 5: adjacency from the deduplicated edge-data map only.
    let adjacency = build_adjacency(&edges);

    // Step 6: per-root BFS tree, never crossing root -> root.
    let mut root_visits = Vec::with_capacity(roots.len());
    let mut tree_edges = HashSet::new();
    for &root in &request.root_author_ids {
        let (visited, tree) = classify::bfs_tree(root, &roots, &adjacency);
        tree_edges.extend(tree);
        root_visits.push(visited);
    }

    // Step 7: discovery counts.
    let discovery = discovery_counts(&root_visits);

    // Step 8: classify every deduplicated edge.
    let mut links = Vec::new();
    let mut semi_weak_links = Vec::new();
    let mut weak_links = Vec::new();
    let mut pair_list: Vec<(i32, i32)> = Vec::new();
    for &key in edges.keys_in_order() {
        let tier = classify_edge(key, &roots, &tree_edges, &discovery);
        pair_list.push(key);
        match tier {
            Tier::Links => links.push((key, tier)),
            Tier::SemiWeakLinks => semi_weak_links.push((key, tier)),
            Tier::WeakLinks => weak_links.push((key, tier)),
        }
    }

    // Step 9: pair enrichment — batched rank/year histograms for every
    // classified pair, `a1 < a2` per invariant 7.
    let (rank_hist, year_hist) =
        fetch_pair_histograms(&pair_list, pool, cache, &semaphore, max_tuple_per_query).await;

    let finish = |items: Vec<((i32, i32), Tier)>| -> Vec<Link> {
        items
            .into_iter()
            .map(|(key, tier)| {
                let rank_counts = rank_hist.get(&key).cloned().unwrap_or_default();
                let year_counts = year_hist.get(&key).cloned().unwrap_or_default();
                // spec §4.4 step 7: `root_counts = max(count(a), count(b))`,
                // carried only on `semi_weak_links` (§6 JSON shape).
                let root_counts = if tier == Tier::SemiWeakLinks {
                    let count_a = discovery.get(&key.0).copied().unwrap_or(1);
                    let count_b = discovery.get(&key.1).copied().unwrap_or(1);
                    Some(count_a.max(count_b))
                } else {
                    None
                };
                build_link(key.0, key.1, rank_counts, year_counts, root_counts)
            })
            .collect()
    };
    let links = finish(links);
    let semi_weak_links = finish(semi_weak_links);
    let weak_links = finish(weak_links);

    // Step 10: node enrichment for every discovered node.
    let discovered_ids: Vec<i32> = edges
        .keys_in_order()
        .iter()
        .flat_map(|&(a, b)| [a, b])
        .chain(request.root_author_ids.iter().copied())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let nodes = fetch_nodes(&discovered_ids, &roots, pool, cache).await?;

    Ok(GraphResult {
        nodes,
        links,
        semi_weak_links,
        weak_links,
    })
}

async fn fetch_batches(
    ids: &[i32],
    pool: &deadpool_postgres::Pool,
    cache: &Arc<QueryCache>,
    semaphore: &Arc<Semaphore>,
    max_tuple_per_query: usize,
) -> Vec<types::EdgeRow> {
    let mut join_set = JoinSet::new();
    for batch in chunk(ids, max_tuple_per_query.max(1)) {
        let pool = pool.clone();
        let cache = cache.clone();
        let semaphore = Arc::clone(semaphore);
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
            run_edge_batch(&batch, &pool, &cache).await
        });
    }
    let mut out = Vec::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok(edges)) => out.extend(edges),
            // Failure policy (spec §4.4): a failed batch logs and
            // contributes an empty partial rather than aborting the run.
            Ok(Err(err)) => tracing::warn!(error = %err, "edge batch failed, contributing empty partial"),
            Err(join_err) => tracing::warn!(error = %join_err, "edge batch task panicked"),
        }
    }
    out
}

async fn run_edge_batch(
    ids: &[i32],
    pool: &deadpool_postgres::Pool,
    cache: &Arc<QueryCache>,
) -> CoreResult<Vec<types::EdgeRow>> {
    let client = crate::pool::checkout(pool).await?;
    let qb = queries::coauthor_edge_batch(ids);
    let rows = qb.execute(&client, cache).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        out.push(types::EdgeRow {
            sid: row.try_get("sid")?,
            slabel: row.try_get("slabel")?,
            simg: row.try_get::<_, Option<String>>("simg")?.unwrap_or_default(),
            eid: row.try_get("eid")?,
            elabel: row.try_get("elabel")?,
            eimg: row.try_get::<_, Option<String>>("eimg")?.unwrap_or_default(),
        });
    }
    Ok(out)
}

async fn fetch_pair_histograms(
    pairs: &[(i32, i32)],
    pool: &deadpool_postgres::Pool,
    cache: &Arc<QueryCache>,
    semaphore: &Arc<Semaphore>,
    max_tuple_per_query: usize,
) -> (
    HashMap<(i32, i32), BTreeMap<String, i64>>,
    HashMap<(i32, i32), BTreeMap<String, i64>>,
) {
    // invariant 7: every pair ordered a1 < a2 before it ever reaches SQL.
    let ordered: Vec<(i32, i32)> = pairs.iter().map(|&(a, b)| edge_key(a, b)).collect();
    if ordered.is_empty() {
        return (HashMap::new(), HashMap::new());
    }

    let mut join_set = JoinSet::new();
    for batch in chunk_pairs(&ordered, max_tuple_per_query.max(1)) {
        let pool = pool.clone();
        let cache = cache.clone();
        let semaphore = Arc::clone(semaphore);
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
            run_pair_histograms(&batch, &pool, &cache).await
        });
    }

    let mut rank_hist: HashMap<(i32, i32), BTreeMap<String, i64>> = HashMap::new();
    let mut year_hist: HashMap<(i32, i32), BTreeMap<String, i64>> = HashMap::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok((ranks, years))) => {
                for (key, hist) in ranks {
                    rank_hist.entry(key).or_default().extend(hist);
                }
                for (key, hist) in years {
                    year_hist.entry(key).or_default().extend(hist);
                }
            }
            Ok(Err(err)) => tracing::warn!(error = %err, "pair histogram batch failed, contributing empty partial"),
            Err(join_err) => tracing::warn!(error = %join_err, "pair histogram task panicked"),
        }
    }
    (rank_hist, year_hist)
}

type PairHistBatch = (
    HashMap<(i32, i32), BTreeMap<String, i64>>,
    HashMap<(i32, i32), BTreeMap<String, i64>>,
);

async fn run_pair_histograms(
    pairs: &[(i32, i32)],
    pool: &deadpool_postgres::Pool,
    cache: &Arc<QueryCache>,
) -> CoreResult<PairHistBatch> {
    let client = crate::pool::checkout(pool).await?;

    let rank_qb = queries::pair_rank_batch(pairs);
    let rank_rows = rank_qb.execute(&client, cache).await?;
    let mut ranks: HashMap<(i32, i32), BTreeMap<String, i64>> = HashMap::new();
    for row in rank_rows.iter() {
        let a1: i32 = row.try_get("a1")?;
        let a2: i32 = row.try_get("a2")?;
        let token: Option<String> = row.try_get("rank_token")?;
        let count: i64 = row.try_get("hit_count")?;
        *ranks
            .entry((a1, a2))
            .or_default()
            .entry(token.unwrap_or_else(|| "Unranked".to_string()))
            .or_insert(0) += count;
    }

    let year_qb = queries::pair_year_batch(pairs);
    let year_rows = year_qb.execute(&client, cache).await?;
    let mut years: HashMap<(i32, i32), BTreeMap<String, i64>> = HashMap::new();
    for row in year_rows.iter() {
        let a1: i32 = row.try_get("a1")?;
        let a2: i32 = row.try_get("a2")?;
        let year: Option<i32> = row.try_get("year")?;
        let count: i64 = row.try_get("hit_count")?;
        let label = match year {
            Some(y) if y >= 1950 => y.to_string(),
            _ => String::new(),
        };
        *years.entry((a1, a2)).or_default().entry(label).or_insert(0) += count;
    }

    Ok((ranks, years))
}

fn chunk_pairs(pairs: &[(i32, i32)], width: usize) -> Vec<Vec<(i32, i32)>> {
    pairs.chunks(width.max(1)).map(|c| c.to_vec()).collect()
}

async fn fetch_nodes(
    ids: &[i32],
    roots: &HashSet<i32>,
    pool: &deadpool_postgres::Pool,
    cache: &Arc<QueryCache>,
) -> CoreResult<Vec<Node>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let client = crate::pool::checkout(pool).await?;
    let mut qb = queries::authors_overview();
    qb.and_in("ab.id", ids);
    let rows = qb.execute(&client, cache).await?;

    let mut nodes = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        let id: i32 = row.try_get("id")?;
        let label: String = row.try_get("name")?;
        let image: Option<String> = row.try_get("image_url")?;
        let freq_conf_rank: Option<String> = row.try_get("freq_conf_rank")?;
        let freq_journal_rank: Option<String> = row.try_get("freq_journal_rank")?;
        nodes.push(Node {
            id,
            label,
            image: image.unwrap_or_default(),
            is_root: roots.contains(&id),
            freq_conf_rank,
            freq_journal_rank,
        });
    }
    Ok(nodes)
}
