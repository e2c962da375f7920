//! Graph payload types (spec §6 "/generate-graph" JSON shape).

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One co-author edge between `sid` and `eid`, as returned by the
/// co-author edge batch constructor (spec §4.2, §4.4 step 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRow {
    pub sid: i32,
    pub slabel: String,
    pub simg: String,
    pub eid: i32,
    pub elabel: String,
    pub eimg: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: i32,
    pub label: String,
    pub image: String,
    pub is_root: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq_conf_rank: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq_journal_rank: Option<String>,
}

/// One classified edge, with the fixed rank/year fields plus one dynamic
/// field per observed year and per observed rank token (spec §4.4 step 8).
#[derive(Debug, Clone)]
pub struct Link {
    pub source: i32,
    pub target: i32,
    pub avg_conf_rank: String,
    pub avg_journal_rank: String,
    pub unranked: i64,
    pub rank_counts: BTreeMap<String, i64>,
    pub year_counts: BTreeMap<String, i64>,
    pub root_counts: Option<i64>,
}

impl Serialize for Link {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = Map::new();
        map.insert("source".to_string(), Value::from(self.source));
        map.insert("target".to_string(), Value::from(self.target));
        map.insert("avg_conf_rank".to_string(), Value::from(self.avg_conf_rank.clone()));
        map.insert(
            "avg_journal_rank".to_string(),
            Value::from(self.avg_journal_rank.clone()),
        );
        map.insert("Unranked".to_string(), Value::from(self.unranked));
        for (rank, count) in &self.rank_counts {
            map.insert(rank.clone(), Value::from(*count));
        }
        for (year, count) in &self.year_counts {
            map.insert(year.clone(), Value::from(*count));
        }
        if let Some(root_counts) = self.root_counts {
            map.insert("root_counts".to_string(), Value::from(root_counts));
        }
        Value::Object(map).serialize(serializer)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphResult {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub semi_weak_links: Vec<Link>,
    pub weak_links: Vec<Link>,
}
