//! In-process stand-ins for the external services.

use super::constants::FAKE_AUDIO;
use async_trait::async_trait;
use epa_dunk_server::audio_generator::{AudioGenerator, GenerationOptions, GeneratorError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Generator that records prompts and can be switched into a failing mode.
#[derive(Default)]
pub struct FakeGenerator {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl FakeGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioGenerator for FakeGenerator {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<Vec<u8>, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(GeneratorError::Api {
                status: 503,
                message: "generator unavailable".to_string(),
            });
        }
        Ok(FAKE_AUDIO.to_vec())
    }
}
