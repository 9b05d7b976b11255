//! Shared constants for end-to-end tests

/// Bytes returned by the fake generator for every prompt.
pub const FAKE_AUDIO: &[u8] = b"ID3\x04\x00fake-epa-audio";

/// Per-request timeout of the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// How long to wait for a spawned server to answer
pub const SERVER_READY_TIMEOUT_MS: u64 = 5_000;

pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
