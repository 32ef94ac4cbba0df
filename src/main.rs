// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use tei2lcp::app_config::{self, Config, LemmaStrategy};
use tei2lcp::app_controller::{Controller, RunOptions};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for LemmaStrategy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLemmaStrategy {
    Plain,
    Composite,
}

impl From<CliLemmaStrategy> for LemmaStrategy {
    fn from(cli_strategy: CliLemmaStrategy) -> Self {
        match cli_strategy {
            CliLemmaStrategy::Plain => LemmaStrategy::Plain,
            CliLemmaStrategy::Composite => LemmaStrategy::Composite,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the collection, convert it and fill the media directory (default command)
    Run(RunArgs),

    /// Convert a directory of TEI files into a corpus
    Convert {
        /// Directory holding the .tei files
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Output corpus directory (defaults to the configured corpus directory)
        #[arg(short, long, value_name = "OUTPUT_DIR")]
        output: Option<PathBuf>,
    },

    /// Download the collection's transcripts and audio
    Download {
        /// Target directory (defaults to the configured download directory)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Only fetch the transcripts
        #[arg(long)]
        no_audio: bool,
    },

    /// Generate shell completions for tei2lcp
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Use the transcripts already in the download directory
    #[arg(long)]
    no_download: bool,

    /// Skip the conversion
    #[arg(long)]
    no_convert: bool,

    /// Do not fetch audio, create empty media files instead
    #[arg(long)]
    dummy_audio: bool,
}

/// tei2lcp - TEI oral corpus to LCP converter
///
/// Downloads TEI transcripts of an oral corpus and converts them into a
/// time-aligned corpus of interviews, utterances, tokens and multi-word units.
#[derive(Parser, Debug)]
#[command(name = "tei2lcp")]
#[command(version)]
#[command(about = "Convert TEI oral transcripts into an LCP corpus")]
#[command(long_about = "tei2lcp mirrors a Nakala collection of TEI transcripts and converts it into a corpus.

EXAMPLES:
    tei2lcp                                     # Download, convert and copy audio
    tei2lcp run --no-download                   # Convert what is already downloaded
    tei2lcp run --dummy-audio                   # Skip audio, create placeholder media
    tei2lcp convert download/ -o corpus/        # Convert a directory
    tei2lcp --audio-format mp3 convert download/ # Reference .mp3 audio files
    tei2lcp download --no-audio                 # Fetch transcripts only
    tei2lcp completions bash > tei2lcp.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Extension of the audio files referenced by the corpus (e.g. 'mp3')
    #[arg(long, global = true)]
    audio_format: Option<String>,

    /// How the lemma layer is read
    #[arg(long, global = true, value_enum)]
    lemma_strategy: Option<CliLemmaStrategy>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything, the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "tei2lcp", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;

    match cli.command {
        Some(Commands::Run(args)) => run_pipeline(&controller, args).await,
        None => run_pipeline(&controller, RunArgs::default()).await,
        Some(Commands::Convert { input, output }) => {
            let output = output.unwrap_or_else(|| controller.corpus_dir().to_path_buf());
            controller.convert(&input, &output)?;
            Ok(())
        }
        Some(Commands::Download { dir, no_audio }) => {
            let dir = dir.unwrap_or_else(|| controller.download_dir().to_path_buf());
            controller.download(&dir, !no_audio).await?;
            Ok(())
        }
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

async fn run_pipeline(controller: &Controller, args: RunArgs) -> Result<()> {
    let options = RunOptions {
        download: !args.no_download,
        convert: !args.no_convert,
        dummy_audio: args.dummy_audio,
    };
    let report = controller.run(options).await?;

    if let Some(summary) = report.conversion {
        info!(
            "Corpus ready: {} interviews, {} media files, timeline ends at frame {}",
            summary.documents, report.media_files, summary.end_frame
        );
    }
    Ok(())
}

/// Load the configuration file, creating a default one if missing, then apply CLI overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = if Path::new(&cli.config).exists() {
        Config::from_file(&cli.config)?
    } else {
        warn!("Config file not found at '{}', creating default config.", cli.config.display());
        let config = Config::default();
        config
            .save(&cli.config)
            .context("Failed to write default config")?;
        config
    };

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    if let Some(format) = &cli.audio_format {
        config.conversion.audio_format = Some(format.clone());
    }

    if let Some(strategy) = &cli.lemma_strategy {
        config.conversion.lemma_strategy = strategy.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}
