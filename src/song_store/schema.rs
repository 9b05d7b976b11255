//! SQLite schema for the generation history database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

// =============================================================================
// Version 1 - Songs
// =============================================================================

/// One row per generated track. Slider columns hold the 0-100 values.
const SONGS_TABLE_V1: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true), // AUTOINCREMENT
        sqlite_column!("tempo", &SqlType::Integer, non_null = true),
        sqlite_column!("style_value", &SqlType::Integer, non_null = true),
        sqlite_column!("energy_value", &SqlType::Integer, non_null = true),
        sqlite_column!("drums_value", &SqlType::Integer, non_null = true),
        sqlite_column!("bass_boost", &SqlType::Integer, non_null = true),
        sqlite_column!("distortion", &SqlType::Integer, non_null = true),
        sqlite_column!("bpm", &SqlType::Integer, non_null = true),
        sqlite_column!("style_text", &SqlType::Text, non_null = true),
        sqlite_column!("energy_text", &SqlType::Text, non_null = true),
        sqlite_column!("drums_text", &SqlType::Text, non_null = true),
        sqlite_column!("bass_text", &SqlType::Text, non_null = true),
        sqlite_column!("lead_text", &SqlType::Text, non_null = true),
        sqlite_column!("audio_url", &SqlType::Text, non_null = true),
        sqlite_column!("public_url", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_songs_toggles_tempo", "bass_boost, distortion, tempo"),
        ("idx_songs_created_at", "created_at DESC"),
    ],
};

pub const SONGS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[SONGS_TABLE_V1],
    migration: None,
}];
