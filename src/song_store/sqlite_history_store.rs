use super::matcher::{window, Tolerances};
use super::models::{GenerationRecord, NewGenerationRecord};
use super::schema::SONGS_VERSIONED_SCHEMAS;
use super::HistoryStore;
use crate::mood::{DescriptorBundle, ParameterSet};
use crate::sqlite_persistence::open_versioned;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const SELECT_COLUMNS: &str = "SELECT id, tempo, style_value, energy_value, drums_value, \
     bass_boost, distortion, bpm, style_text, energy_text, drums_text, bass_text, lead_text, \
     audio_url, public_url, created_at FROM songs";

pub struct SqliteHistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteHistoryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned(db_path, SONGS_VERSIONED_SCHEMAS, "songs")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<GenerationRecord> {
        Ok(GenerationRecord {
            id: row.get(0)?,
            params: ParameterSet::new(
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ),
            descriptors: DescriptorBundle {
                bpm: row.get(7)?,
                style: row.get(8)?,
                energy: row.get(9)?,
                drums: row.get(10)?,
                bass: row.get(11)?,
                lead: row.get(12)?,
            },
            audio_url: row.get(13)?,
            public_url: row.get(14)?,
            created_at: row.get(15)?,
        })
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn append(&self, record: &NewGenerationRecord) -> Result<GenerationRecord> {
        let conn = self.conn.lock().unwrap();
        let p = &record.params;
        let d = &record.descriptors;

        conn.execute(
            "INSERT INTO songs (tempo, style_value, energy_value, drums_value, bass_boost, \
             distortion, bpm, style_text, energy_text, drums_text, bass_text, lead_text, \
             audio_url, public_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                p.tempo,
                p.style,
                p.energy,
                p.drums,
                p.bass_boost,
                p.distortion,
                d.bpm,
                d.style,
                d.energy,
                d.drums,
                d.bass,
                d.lead,
                record.audio_url,
                record.public_url,
                record.created_at,
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Stored song {} for {:?}", id, p);
        Ok(GenerationRecord::from_new(id, record.clone()))
    }

    fn find_similar(
        &self,
        candidate: &ParameterSet,
        tolerances: &Tolerances,
    ) -> Result<Option<GenerationRecord>> {
        let conn = self.conn.lock().unwrap();
        let (tempo_min, tempo_max) = window(candidate.tempo, tolerances.tempo);
        let (style_min, style_max) = window(candidate.style, tolerances.style);
        let (energy_min, energy_max) = window(candidate.energy, tolerances.energy);
        let (drums_min, drums_max) = window(candidate.drums, tolerances.drums);

        let mut stmt = conn.prepare(&format!(
            "{} WHERE tempo BETWEEN ?1 AND ?2
               AND style_value BETWEEN ?3 AND ?4
               AND energy_value BETWEEN ?5 AND ?6
               AND drums_value BETWEEN ?7 AND ?8
               AND bass_boost = ?9
               AND distortion = ?10
             ORDER BY created_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        ))?;

        let record = stmt
            .query_row(
                params![
                    tempo_min,
                    tempo_max,
                    style_min,
                    style_max,
                    energy_min,
                    energy_max,
                    drums_min,
                    drums_max,
                    candidate.bass_boost,
                    candidate.distortion,
                ],
                Self::row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    fn all(&self) -> Result<Vec<GenerationRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS
        ))?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
