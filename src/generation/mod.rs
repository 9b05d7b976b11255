//! Turns a mood payload into a playable track, reusing earlier generations
//! whenever their parameters are close enough.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio_generator::{AudioGenerator, GenerationOptions, GeneratorError};
use crate::blob_store::{BlobStore, StorageError, TrackSink};
use crate::mood::{compose_prompt, DescriptorBundle, ParameterSet, RawMoodPayload};
use crate::server::metrics;
use crate::song_store::{HistoryStore, NewGenerationRecord, Tolerances};

#[derive(Debug, Error)]
pub enum GenerateSongError {
    #[error("Audio generation failed: {0}")]
    Generation(#[from] GeneratorError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSong {
    pub audio_url: String,
    pub public_url: String,
    /// True when an earlier generation was returned instead of a new one.
    pub reused: bool,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub tolerances: Tolerances,
    pub options: GenerationOptions,
    /// Upper bound on the generator call, on top of the client's own timeout.
    pub generator_timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            tolerances: Tolerances::default(),
            options: GenerationOptions::default(),
            generator_timeout: Duration::from_secs(240),
        }
    }
}

pub struct SongGenerator {
    history: Arc<dyn HistoryStore>,
    generator: Arc<dyn AudioGenerator>,
    blob_store: Arc<dyn BlobStore>,
    track_sink: Option<Arc<dyn TrackSink>>,
    settings: GenerationSettings,
}

impl SongGenerator {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        generator: Arc<dyn AudioGenerator>,
        blob_store: Arc<dyn BlobStore>,
        track_sink: Option<Arc<dyn TrackSink>>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            history,
            generator,
            blob_store,
            track_sink,
            settings,
        }
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    pub async fn generate(&self, raw: &RawMoodPayload) -> Result<GeneratedSong, GenerateSongError> {
        let params = ParameterSet::from_raw(raw);
        let result = self.generate_for(params).await;
        metrics::record_generation_outcome(match &result {
            Ok(song) if song.reused => "reused",
            Ok(_) => "generated",
            Err(GenerateSongError::Generation(_)) => "generator_failed",
            Err(GenerateSongError::Storage(_)) => "storage_failed",
        });
        result
    }

    /// Runs the match-or-generate flow for already normalized parameters.
    ///
    /// The history record is the last write: any failure before it leaves the
    /// history untouched.
    pub async fn generate_for(
        &self,
        params: ParameterSet,
    ) -> Result<GeneratedSong, GenerateSongError> {
        let similar = self
            .history
            .find_similar(&params, &self.settings.tolerances)
            .map_err(|e| StorageError::History(format!("{:#}", e)))?;

        if let Some(record) = similar {
            info!("Reusing song {} for {:?}", record.id, params);
            return Ok(GeneratedSong {
                audio_url: record.audio_url,
                public_url: record.public_url,
                reused: true,
            });
        }

        let descriptors = DescriptorBundle::from_params(&params);
        let prompt = compose_prompt(&descriptors);
        debug!("Prompt for {:?}:\n{}", params, prompt);

        let options = &self.settings.options;
        let started = Instant::now();
        let audio = tokio::time::timeout(
            self.settings.generator_timeout,
            self.generator.generate(&prompt, options),
        )
        .await
        .map_err(|_| GeneratorError::Timeout)??;
        metrics::record_generator_latency(self.generator.name(), started.elapsed());
        info!(
            "Generated {} bytes with {} in {}ms",
            audio.len(),
            self.generator.name(),
            started.elapsed().as_millis()
        );

        let file_name = format!(
            "epa_{}_{}.{}",
            Utc::now().timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8],
            options.output_format.extension()
        );

        let local_url = match &self.track_sink {
            Some(sink) => Some(sink.save(&audio, &file_name).await?),
            None => None,
        };

        let public_url = match self
            .blob_store
            .put(&audio, &file_name, options.output_format.content_type())
            .await
        {
            Ok(url) => url,
            Err(err) => {
                warn!("Upload of {} failed: {}", file_name, err);
                self.discard_local_copy(&file_name).await;
                return Err(err.into());
            }
        };

        let audio_url = local_url.unwrap_or_else(|| public_url.clone());
        let record = NewGenerationRecord {
            params,
            descriptors,
            audio_url,
            public_url,
            created_at: Utc::now().timestamp(),
        };
        let stored = match self.history.append(&record) {
            Ok(stored) => stored,
            Err(err) => {
                self.discard_local_copy(&file_name).await;
                return Err(StorageError::History(format!("{:#}", err)).into());
            }
        };
        info!("Stored song {} ({})", stored.id, stored.public_url);

        Ok(GeneratedSong {
            audio_url: stored.audio_url,
            public_url: stored.public_url,
            reused: false,
        })
    }

    async fn discard_local_copy(&self, file_name: &str) {
        if let Some(sink) = &self.track_sink {
            if let Err(err) = sink.remove(file_name).await {
                warn!("Could not remove local copy {}: {}", file_name, err);
            }
        }
    }
}
