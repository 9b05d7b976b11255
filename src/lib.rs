//! EPA-dunk mood server library
//!
//! Exposes the internal modules for the binary and the end-to-end tests.

pub mod audio_generator;
pub mod blob_store;
pub mod config;
pub mod generation;
pub mod mood;
pub mod server;
pub mod song_store;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use generation::{GenerateSongError, GeneratedSong, GenerationSettings, SongGenerator};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use song_store::{HistoryStore, InMemoryHistoryStore, SqliteHistoryStore};
