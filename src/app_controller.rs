use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::pipeline::{Pipeline, PipelineOutput};
use crate::subtitle::format_duration;

// @module: Application controller for video processing

/// What happened to a single input file
#[derive(Debug)]
pub enum RunOutcome {
    /// Subtitles were generated
    Processed(PipelineOutput),
    /// The output already existed and overwriting was not forced
    Skipped(PathBuf),
}

/// Counts reported by folder mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    pipeline: Pipeline,
    // @field: Hide progress bars
    quiet: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let pipeline = Pipeline::from_config(&config).context("Failed to set up the processing pipeline")?;
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create a controller around an already assembled pipeline
    pub fn with_pipeline(config: Config, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline,
            quiet: false,
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the main workflow for one video file
    pub async fn run(&self, input_file: PathBuf, force_overwrite: bool) -> Result<RunOutcome> {
        let multi_progress = self.multi_progress();
        let output_dir = self.pipeline.settings().output_dir.clone();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite).await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<RunOutcome> {
        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = Pipeline::output_path_in(input_file, output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, subtitles already exist (use -f to force overwrite)", input_file);
            return Ok(RunOutcome::Skipped(output_path));
        }

        FileManager::ensure_dir(output_dir)?;

        info!("Processing: {}", input_file.display());
        info!(
            "Speaker diarization: {} - Translation: {}",
            if self.pipeline.diarization_enabled() { "enabled" } else { "disabled" },
            if self.pipeline.translation_enabled() { "enabled" } else { "disabled" }
        );

        let progress_bar = multi_progress.add(ProgressBar::new(100));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {percent}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));

        let start_time = std::time::Instant::now();
        let pb = progress_bar.clone();
        let result = self
            .pipeline
            .process_video_into(input_file, output_dir, move |message, ratio| {
                pb.set_position((ratio.clamp(0.0, 1.0) * 100.0).round() as u64);
                pb.set_message(message.to_string());
            })
            .await;

        // Clear the bar so only the folder progress bar stays visible
        progress_bar.finish_and_clear();

        let output = result.with_context(|| format!("Failed to process {}", input_file.display()))?;

        if let Some(usage) = output.usage.as_ref().filter(|u| u.total_tokens > 0) {
            info!("{}", usage.summary());
        }
        info!(
            "Success: {} ({} cues, {})",
            output.subtitle_path.display(),
            output.cue_count,
            format_duration(start_time.elapsed().as_secs_f64())
        );

        Ok(RunOutcome::Processed(output))
    }

    /// Run the workflow in folder mode, processing all video files below a
    /// directory. Subtitles mirror the subfolder layout of `input_dir` under the
    /// output directory. Files whose subtitles already exist are skipped.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !input_dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let video_files = FileManager::find_video_files(&input_dir)?;
        if video_files.is_empty() {
            return Err(anyhow!("No video files found in directory: {:?}", input_dir));
        }

        let multi_progress = self.multi_progress();
        let folder_pb = multi_progress.add(ProgressBar::new(video_files.len() as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(style.progress_chars("█▓▒░"));

        let mut summary = FolderSummary::default();
        let mut failures = Vec::new();

        for video_file in &video_files {
            let file_name = video_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir =
                FileManager::mirrored_output_dir(&input_dir, video_file, &self.pipeline.settings().output_dir);
            match self.run_with_progress(video_file, &output_dir, &multi_progress, force_overwrite).await {
                Ok(RunOutcome::Processed(_)) => summary.processed += 1,
                Ok(RunOutcome::Skipped(_)) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    failures.push(format!("{}: {:#}", video_file.display(), e));
                    summary.failed += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors ({})",
            summary.processed,
            summary.skipped,
            summary.failed,
            format_duration(start_time.elapsed().as_secs_f64())
        );

        if !failures.is_empty() {
            let log_path = self.pipeline.settings().output_dir.join("duosub.issues.log");
            if let Err(e) = Self::write_issue_log(&log_path, &input_dir, &failures) {
                warn!("Failed to write issue log: {}", e);
            } else {
                info!("Failures written to {}", log_path.display());
            }
        }

        Ok(summary)
    }

    fn multi_progress(&self) -> MultiProgress {
        let multi_progress = MultiProgress::new();
        if self.quiet {
            multi_progress.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        }
        multi_progress
    }

    /// Write folder mode failures to a log file
    fn write_issue_log(path: &Path, input_dir: &Path, failures: &[String]) -> Result<()> {
        let mut content = format!(
            "Folder Processing: {} ({})\n\n",
            input_dir.display(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        for failure in failures {
            content.push_str(&format!("[ERROR] {}\n", failure));
        }
        FileManager::write_to_file(path, &content)
    }
}
