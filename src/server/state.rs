use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use crate::generation::SongGenerator;
use crate::song_store::HistoryStore;

use super::ServerConfig;

pub type GuardedSongGenerator = Arc<SongGenerator>;
pub type GuardedHistoryStore = Arc<dyn HistoryStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub song_generator: GuardedSongGenerator,
}

impl ServerState {
    pub fn new(config: ServerConfig, song_generator: SongGenerator) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            song_generator: Arc::new(song_generator),
        }
    }
}

impl FromRef<ServerState> for GuardedSongGenerator {
    fn from_ref(input: &ServerState) -> Self {
        input.song_generator.clone()
    }
}

impl FromRef<ServerState> for GuardedHistoryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.song_generator.history().clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
