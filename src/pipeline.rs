/*!
 * Video to bilingual subtitle pipeline.
 *
 * One run goes through these stages, reporting `(message, ratio)` progress:
 *
 * 1. audio extraction into a temporary directory (0.05 - 0.10)
 * 2. transcription, concurrently with diarization when enabled (0.15 - 0.50)
 * 3. speaker assignment and consolidation (0.55 - 0.60)
 * 4. batched translation (0.65 - 0.90)
 * 5. ASS serialization (0.92 - 1.0)
 *
 * The subtitle file is written last, so a failure in any earlier stage
 * leaves no output behind. The temporary audio is removed on every path.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::app_config::Config;
use crate::audio::{AudioExtractor, FfmpegExtractor};
use crate::diarization::{CommandDiarizer, DiarizationRequest, Diarizer};
use crate::errors::{PipelineError, SubtitleError};
use crate::file_utils::FileManager;
use crate::merger::{assign_speakers, consolidate, speaker_stats, ConsolidationOptions};
use crate::recognition::{RecognitionHint, Recognizer, WhisperApiRecognizer};
use crate::segment::{Segment, TranslatedCue};
use crate::subtitle::{format_duration, write_ass, AssOptions};
use crate::translation::{BatchTranslator, TokenUsageStats, TranslationService};

/// Per-run settings that do not belong to a collaborator
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Directory receiving `<video stem>.ass`
    pub output_dir: PathBuf,
    pub hint: RecognitionHint,
    pub diarization: DiarizationRequest,
    pub consolidation: ConsolidationOptions,
    pub ass: AssOptions,
    /// Also write `<video stem>.segments.json`
    pub dump_json: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            hint: RecognitionHint::default(),
            diarization: DiarizationRequest::default(),
            consolidation: ConsolidationOptions::default(),
            ass: AssOptions::default(),
            dump_json: false,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub subtitle_path: PathBuf,
    pub segments_path: Option<PathBuf>,
    /// Number of cues after consolidation
    pub cue_count: usize,
    /// Speakers found by diarization, sorted
    pub speakers: Vec<String>,
    /// Token usage of the translation stage
    pub usage: Option<TokenUsageStats>,
    /// Video length in seconds, when the extractor could read it
    pub video_duration: Option<f64>,
}

/// The video to subtitle pipeline
pub struct Pipeline {
    extractor: Arc<dyn AudioExtractor>,
    recognizer: Arc<dyn Recognizer>,
    diarizer: Option<Arc<dyn Diarizer>>,
    translator: Option<BatchTranslator>,
    settings: PipelineSettings,
}

impl Pipeline {
    /// Pipeline with transcription only; see `with_diarizer` and `with_translator`
    pub fn new(
        extractor: Arc<dyn AudioExtractor>,
        recognizer: Arc<dyn Recognizer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            extractor,
            recognizer,
            diarizer: None,
            translator: None,
            settings,
        }
    }

    pub fn with_diarizer(mut self, diarizer: Arc<dyn Diarizer>) -> Self {
        self.diarizer = Some(diarizer);
        self
    }

    pub fn with_translator(mut self, translator: BatchTranslator) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Build the production pipeline from configuration
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let settings = PipelineSettings {
            output_dir: PathBuf::from(&config.output.dir),
            hint: config.transcription.hint(&config.source_language),
            diarization: config.diarization.request(),
            consolidation: config.consolidation,
            ass: config.output.ass.clone(),
            dump_json: config.output.dump_json,
        };

        let mut pipeline = Self::new(
            Arc::new(FfmpegExtractor::new(config.audio.clone())),
            Arc::new(WhisperApiRecognizer::new(&config.transcription)),
            settings,
        );

        if config.diarization.enabled {
            pipeline = pipeline.with_diarizer(Arc::new(CommandDiarizer::new(&config.diarization)));
        }
        if config.translation.enabled {
            let service = TranslationService::new(config)?;
            pipeline = pipeline.with_translator(BatchTranslator::new(service, config.translation.batch_size));
        }

        Ok(pipeline)
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn diarization_enabled(&self) -> bool {
        self.diarizer.is_some()
    }

    pub fn translation_enabled(&self) -> bool {
        self.translator.is_some()
    }

    /// Path of the subtitle file produced for `video`
    pub fn output_path_for(&self, video: &Path) -> PathBuf {
        Self::output_path_in(video, &self.settings.output_dir)
    }

    /// Path of the subtitle file produced for `video` inside `output_dir`
    pub fn output_path_in(video: &Path, output_dir: &Path) -> PathBuf {
        FileManager::generate_output_path(video, output_dir, ".ass")
    }

    /// Run every stage for one video, writing into the configured output dir
    pub async fn process_video(
        &self,
        video: &Path,
        progress: impl Fn(&str, f64),
    ) -> Result<PipelineOutput, PipelineError> {
        self.process_video_into(video, &self.settings.output_dir, progress).await
    }

    /// Run every stage for one video, writing into `output_dir`
    pub async fn process_video_into(
        &self,
        video: &Path,
        output_dir: &Path,
        progress: impl Fn(&str, f64),
    ) -> Result<PipelineOutput, PipelineError> {
        if !video.exists() {
            return Err(PipelineError::VideoNotFound(video.display().to_string()));
        }
        let started = std::time::Instant::now();

        let video_duration = match self.extractor.duration(video).await {
            Ok(duration) => duration,
            Err(e) => {
                warn!("Could not read the duration of {:?}: {}", video, e);
                None
            }
        };
        if let Some(duration) = video_duration {
            info!("Video duration: {}", format_duration(duration));
        }

        progress("Extracting audio...", 0.05);
        let work_dir = tempfile::Builder::new().prefix("duosub-").tempdir()?;
        let audio = self.extractor.extract(video, work_dir.path()).await?;
        progress("Audio extracted", 0.10);

        let (texts, turns) = match &self.diarizer {
            Some(diarizer) => {
                progress("Transcribing and identifying speakers...", 0.15);
                let (texts, turns) = tokio::try_join!(
                    async {
                        self.recognizer
                            .transcribe(&audio, &self.settings.hint)
                            .await
                            .map_err(PipelineError::from)
                    },
                    async {
                        diarizer
                            .diarize(&audio, &self.settings.diarization)
                            .await
                            .map_err(PipelineError::from)
                    },
                )?;
                progress("Transcription complete", 0.40);
                progress("Speaker identification complete", 0.50);
                (texts, Some(turns))
            }
            None => {
                progress("Transcribing...", 0.15);
                let texts = self.recognizer.transcribe(&audio, &self.settings.hint).await?;
                progress("Transcription complete", 0.50);
                (texts, None)
            }
        };
        // The audio is no longer needed
        drop(work_dir);

        let speakers = match &turns {
            Some(turns) => {
                let stats = speaker_stats(turns);
                info!(
                    "Detected {} speakers over {}",
                    stats.speakers.len(),
                    format_duration(stats.total_duration)
                );
                stats.speakers
            }
            None => Vec::new(),
        };
        if texts.is_empty() {
            warn!("No speech recognized in {:?}", video);
        }

        progress("Merging segments...", 0.55);
        let merged = assign_speakers(&texts, turns.as_deref());
        let cues = consolidate(&merged, self.settings.consolidation);
        debug!("Merged {} recognized segments into {} cues", merged.len(), cues.len());
        progress("Segments merged", 0.60);

        let (translated, usage) = match &self.translator {
            Some(translator) => {
                progress("Translating...", 0.65);
                let (translated, usage) = translator
                    .translate(&cues, |done, total| {
                        let ratio = 0.65 + (done as f64 / total as f64) * 0.25;
                        progress(&format!("Translating... ({}/{})", done, total), ratio);
                    })
                    .await?;
                progress("Translation complete", 0.90);
                (translated, Some(usage))
            }
            None => (cues.into_iter().map(TranslatedCue::untranslated).collect(), None),
        };

        progress("Writing subtitle file...", 0.92);
        let subtitle_path = Self::output_path_in(video, output_dir);

        if translated.is_empty() {
            return Err(SubtitleError::EmptyInput.into());
        }

        // The segment dump goes first so a failed dump leaves no subtitle file
        let segments_path = if self.settings.dump_json {
            let path = FileManager::generate_output_path(video, output_dir, ".segments.json");
            let json = serde_json::to_string_pretty(&Segment::from_translated(&translated))
                .map_err(std::io::Error::other)?;
            std::fs::create_dir_all(output_dir)?;
            std::fs::write(&path, json)?;
            Some(path)
        } else {
            None
        };

        write_ass(&translated, &subtitle_path, self.translator.is_some(), &self.settings.ass)?;
        progress("Done", 1.0);

        info!(
            "Wrote {} cues to {:?} in {}",
            translated.len(),
            subtitle_path,
            format_duration(started.elapsed().as_secs_f64())
        );

        Ok(PipelineOutput {
            subtitle_path,
            segments_path,
            cue_count: translated.len(),
            speakers,
            usage,
            video_duration,
        })
    }
}
