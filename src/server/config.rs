use super::RequestsLoggingLevel;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Static dashboard served as the fallback route.
    pub public_dir: Option<PathBuf>,
    /// Local track copies, served under `/tracks`.
    pub tracks_dir: Option<PathBuf>,
    /// Directory of the local blob store, served under `/shared`.
    pub shared_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3000,
            metrics_port: 9091,
            public_dir: None,
            tracks_dir: None,
            shared_dir: None,
        }
    }
}
