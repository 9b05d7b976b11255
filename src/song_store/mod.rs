mod matcher;
mod models;
mod schema;
mod sqlite_history_store;

pub use matcher::{find_match, window, Tolerances};
pub use models::{GenerationRecord, NewGenerationRecord};
pub use schema::SONGS_VERSIONED_SCHEMAS;
pub use sqlite_history_store::SqliteHistoryStore;

use crate::mood::ParameterSet;
use anyhow::Result;
use std::sync::Mutex;

/// Append-only history of generated songs.
pub trait HistoryStore: Send + Sync {
    fn append(&self, record: &NewGenerationRecord) -> Result<GenerationRecord>;

    /// Most recent record inside the tolerance windows around `candidate`.
    fn find_similar(
        &self,
        candidate: &ParameterSet,
        tolerances: &Tolerances,
    ) -> Result<Option<GenerationRecord>>;

    /// Every record, newest first.
    fn all(&self) -> Result<Vec<GenerationRecord>>;

    fn count(&self) -> Result<usize>;
}

/// History kept in memory, filtered in-process. Used by tests and when the
/// service runs without a data directory.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: Mutex<Vec<GenerationRecord>>,
}

impl HistoryStore for InMemoryHistoryStore {
    fn append(&self, record: &NewGenerationRecord) -> Result<GenerationRecord> {
        let mut records = self.records.lock().unwrap();
        let id = records.len() as i64 + 1;
        let stored = GenerationRecord::from_new(id, record.clone());
        records.push(stored.clone());
        Ok(stored)
    }

    fn find_similar(
        &self,
        candidate: &ParameterSet,
        tolerances: &Tolerances,
    ) -> Result<Option<GenerationRecord>> {
        // Newest insert first so equal timestamps resolve like the SQLite store.
        let records = self.records.lock().unwrap();
        Ok(find_match(candidate, records.iter().rev(), tolerances).cloned())
    }

    fn all(&self) -> Result<Vec<GenerationRecord>> {
        let mut records = self.records.lock().unwrap().clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.lock().unwrap().len())
    }
}
