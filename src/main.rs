// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use duosub::app_config::{Config, LogLevel};
use duosub::app_controller::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate bilingual subtitles for a video file or folder (default command)
    Process(ProcessArgs),

    /// Validate the configuration and exit
    Validate {
        /// Configuration file path
        #[arg(short, long, default_value = "duosub.json")]
        config_path: String,
    },

    /// Generate shell completions for duosub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct ProcessArgs {
    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output directory for subtitle files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Disable speaker diarization
    #[arg(long)]
    no_diarization: bool,

    /// Write Japanese-only subtitles without translating
    #[arg(long)]
    no_translation: bool,

    /// Number of lines sent per translation request
    #[arg(long)]
    batch_size: Option<usize>,

    /// Maximum number of speakers to detect
    #[arg(long)]
    max_speakers: Option<u32>,

    /// Vocabulary hint for speech recognition
    #[arg(long)]
    prompt: Option<String>,

    /// Also write the segment list as <name>.segments.json
    #[arg(long)]
    dump_json: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "duosub.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// duosub - bilingual Japanese/Chinese subtitles for video
///
/// Transcribes the Japanese speech of a video, attributes lines to speakers,
/// translates them to Chinese and writes an ASS subtitle file with one color
/// per speaker.
#[derive(Parser, Debug)]
#[command(name = "duosub")]
#[command(version)]
#[command(about = "Bilingual Japanese/Chinese ASS subtitles from video")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "duosub extracts the audio of a video, transcribes it, identifies speakers, translates every line to Chinese and writes a bilingual ASS subtitle file.

EXAMPLES:
    duosub video.mp4                         # Process using default config
    duosub video.mp4 -o subtitles/           # Write to a specific directory
    duosub video.mp4 --no-diarization        # Single speaker, no HF token needed
    duosub -f --log-level debug /videos/     # Process a whole directory again
    duosub validate                          # Check configuration and exit
    duosub completions bash > duosub.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in duosub.json by default. If the file doesn't exist,
    a default one is created automatically. Environment variables override it:
    CLAUDE_API_KEY, HF_TOKEN, WHISPER_API_KEY, WHISPER_MODEL, ENABLE_DIARIZATION,
    TRANSLATION_BATCH_SIZE, OUTPUT_DIR.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    process: ProcessArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and emoji for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, emoji) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start at info; the level is adjusted once the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "duosub", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Validate { config_path }) => run_validate(&config_path),
        Some(Commands::Process(args)) => run_process(args).await,
        None => run_process(cli.process).await,
    }
}

/// Load the config file and apply environment overrides
fn load_config(config_path: &str) -> Result<Config> {
    let mut config = Config::load_or_create(config_path)?;
    config
        .apply_env_overrides()
        .context("Failed to apply environment overrides")?;
    Ok(config)
}

fn run_validate(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let problems = config.problems();
    if !problems.is_empty() {
        eprintln!("Configuration errors:");
        for problem in &problems {
            eprintln!("  - {}", problem);
        }
        return Err(anyhow!("{} configuration error(s) in {}", problems.len(), config_path));
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Override config values with CLI options
fn apply_cli_overrides(config: &mut Config, options: &ProcessArgs) {
    if let Some(output_dir) = &options.output_dir {
        config.output.dir = output_dir.to_string_lossy().to_string();
    }
    if options.no_diarization {
        config.diarization.enabled = false;
    }
    if options.no_translation {
        config.translation.enabled = false;
    }
    if let Some(batch_size) = options.batch_size {
        config.translation.batch_size = batch_size;
    }
    if let Some(max_speakers) = options.max_speakers {
        config.diarization.max_speakers = Some(max_speakers);
    }
    if let Some(prompt) = &options.prompt {
        config.transcription.initial_prompt = prompt.clone();
    }
    if options.dump_json {
        config.output.dump_json = true;
    }
    if let Some(log_level) = options.log_level {
        config.log_level = log_level.into();
    }
}

async fn run_process(options: ProcessArgs) -> Result<()> {
    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

    if let Some(log_level) = options.log_level {
        log::set_max_level(LogLevel::from(log_level).to_level_filter());
    }

    let mut config = load_config(&options.config_path)?;
    apply_cli_overrides(&mut config, &options);
    log::set_max_level(config.log_level.to_level_filter());

    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?.quiet(options.quiet);

    if input_path.is_file() {
        controller.run(input_path, options.force_overwrite).await?;
    } else if input_path.is_dir() {
        let summary = controller.run_folder(input_path, options.force_overwrite).await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} file(s) failed", summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    info!("All done");
    Ok(())
}
