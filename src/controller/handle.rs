//! Table Handle store (spec §4.3 "Handle store", §3 "Table Handle").
//!
//! Process-wide map from opaque handle id to (Composed Query, row-methods
//! list), guarded by a single mutex per spec §5 ("The Table Handle store is
//! shared process-wide with an internal mutex"). Handles are v4 UUIDs and
//! expire after a fixed TTL (24h default); expiry is checked lazily on
//! access, and [`TableHandleStore::sweep`] additionally removes anything
//! already past TTL so a caller can run it on a timer without leaking
//! memory between accesses.

use crate::controller::ordering::ColumnKind;
use crate::error::{CoreError, CoreResult};
use crate::sql::QueryBuilder;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct Entry {
    builder: QueryBuilder,
    row_methods: Vec<(String, ColumnKind)>,
    created_at: Instant,
}

pub struct TableHandleStore {
    entries: Mutex<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl TableHandleStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Store a composed query behind a freshly generated handle. Entries are
    /// never mutated once stored except in place through
    /// [`TableHandleStore::with_entry`] (spec §3: "handles are immutable once
    /// stored"; the only sanctioned mutation is `fetch_data`'s own
    /// order/limit/offset rewrite, per spec §5 "Mutation discipline").
    pub fn insert(&self, builder: QueryBuilder, row_methods: Vec<(String, ColumnKind)>) -> Uuid {
        let id = Uuid::new_v4();
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            id,
            Entry {
                builder,
                row_methods,
                created_at: Instant::now(),
            },
        );
        id
    }

    /// Look up `id`, run `f` against the stored builder and row-methods list,
    /// and return its result. Returns `CoreError::NotFound` for an unknown or
    /// TTL-expired handle (spec S6); an expired entry is removed as a side
    /// effect of the lookup.
    pub fn with_entry<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut QueryBuilder, &[(String, ColumnKind)]) -> R,
    ) -> CoreResult<R> {
        let mut entries = self.entries.lock().unwrap();
        let expired = entries
            .get(&id)
            .map(|e| e.created_at.elapsed() > self.ttl)
            .unwrap_or(false);
        if expired {
            entries.remove(&id);
        }
        match entries.get_mut(&id) {
            Some(entry) => Ok(f(&mut entry.builder, &entry.row_methods)),
            None => Err(CoreError::not_found(format!("unknown or expired handle {id}"))),
        }
    }

    /// Remove every entry past its TTL. Intended to be driven by a caller's
    /// own background timer (per spec §9's "process-wide singletons... not
    /// accessed via ambient global lookups", this store never spawns its own
    /// task).
    pub fn sweep(&self) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, entry| entry.created_at.elapsed() <= self.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TableHandleStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
