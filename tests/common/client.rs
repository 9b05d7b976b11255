//! HTTP client for end-to-end tests
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// POST /api/generate-song with the given body as-is
    pub async fn generate_song_raw(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/api/generate-song", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Generate song request failed")
    }

    /// POST /api/generate-song with a `{ "payload": ... }` body
    pub async fn generate_song(
        &self,
        tempo: u8,
        style: u8,
        energy: u8,
        drums: u8,
        bass_boost: bool,
        distortion: bool,
    ) -> Response {
        self.generate_song_raw(json!({
            "payload": {
                "tempo": tempo,
                "typ_value": style,
                "energi_value": energy,
                "trummor_value": drums,
                "bassPlus": bass_boost,
                "dist": distortion,
            }
        }))
        .await
    }

    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .expect("Health request failed")
    }

    /// GET a path or absolute URL returned by the server
    pub async fn fetch(&self, url: &str) -> Response {
        let url = if url.starts_with("http") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        };
        self.client
            .get(url)
            .send()
            .await
            .expect("Fetch request failed")
    }
}
