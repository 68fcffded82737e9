// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, info, debug, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand, Args};
use clap_complete::{generate, Shell};

use ts_translator::app_config::{self, BatchMode, Config, InitSettings, TranslationProvider};
use ts_translator::app_controller::{Controller, RunSummary};
use ts_translator::language_utils;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a single .ts file
    Translate(TranslateArgs),

    /// Translate every .ts file in a directory
    Batch(BatchArgs),

    /// Write a configuration file
    Init(InitArgs),

    /// Generate shell completions for ts-translator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by the translating commands
#[derive(Args, Debug)]
struct ProviderArgs {
    /// Source language code (e.g., 'en_US')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Units per request in multi-batch mode
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Split the file into several requests of --batch-size units
    #[arg(long)]
    multi_batch: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force: bool,
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input .ts file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file (default: <stem><output_suffix>.ts next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target language code (e.g., 'fr_FR')
    #[arg(short, long)]
    target_language: Option<String>,

    #[command(flatten)]
    provider: ProviderArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory containing .ts files
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    /// Output directory, mirroring the input tree (default: next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Search subdirectories too
    #[arg(short, long)]
    recursive: bool,

    /// Target language code, repeatable
    #[arg(short, long = "target-language", value_name = "TARGET")]
    target_languages: Vec<String>,

    #[command(flatten)]
    provider: ProviderArgs,
}

#[derive(Parser, Debug)]
struct InitArgs {
    /// Where to write the configuration (default: ~/.ts_translator_config.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target language code, repeatable
    #[arg(short, long = "target-language", value_name = "TARGET", required = true)]
    target_languages: Vec<String>,

    /// Source language code
    #[arg(short, long)]
    source_language: Option<String>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name for the chosen provider
    #[arg(short, long)]
    model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long)]
    temperature: Option<f32>,

    /// Units per request in multi-batch mode
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Split files into several requests by default
    #[arg(long)]
    multi_batch: bool,

    /// Retries for a failed batch
    #[arg(long)]
    max_retries: Option<u32>,

    /// Suffix for output files ({lang} is replaced by the target code)
    #[arg(long)]
    output_suffix: Option<String>,

    /// Overwrite an existing configuration file
    #[arg(short, long)]
    force: bool,
}

/// ts-translator - Qt Linguist translation with AI
///
/// Fills in the unfinished messages of Qt Linguist (.ts) files using
/// OpenAI or Anthropic models, leaving everything else in the file untouched.
#[derive(Parser, Debug)]
#[command(name = "ts-translator")]
#[command(version)]
#[command(about = "AI-powered Qt Linguist translation tool")]
#[command(long_about = "ts-translator translates the unfinished messages of Qt Linguist .ts files using AI providers.

EXAMPLES:
    ts-translator translate app_en.ts -t fr_FR              # Translate into French
    ts-translator translate app_en.ts -t de_DE -o app_de.ts # Choose the output file
    ts-translator translate app_en.ts --multi-batch -b 20   # 20 strings per request
    ts-translator batch i18n/ -r -t fr_FR -t de_DE          # Whole tree, two languages
    ts-translator init -t fr_FR -t de_DE                    # Write a configuration file
    ts-translator completions bash > ts-translator.bash     # Generate bash completions

CONFIGURATION:
    Configuration is read from ~/.ts_translator_config.json by default, or from
    the file given with --config. TS_TRANSLATOR_* environment variables and
    OPENAI_API_KEY / ANTHROPIC_API_KEY override the file.

SUPPORTED PROVIDERS:
    openai    - OpenAI Chat Completions API (default: gpt-4.1-mini)
    anthropic - Anthropic Messages API (default: claude-3-haiku-20240307)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Shortcut for --log-level debug
    #[arg(long, global = true)]
    debug: bool,
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
        // The logger accepts everything; log::set_max_level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Color escape for log level
    fn get_color_for_level(level: Level) -> &'static str {
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
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                color, now, record.level(), record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the configuration is known
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if cli.debug {
        log::set_max_level(LevelFilter::Debug);
    } else if let Some(level) = &cli.log_level {
        log::set_max_level(app_config::LogLevel::from(level.clone()).to_level_filter());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "ts-translator", &mut std::io::stdout());
            Ok(())
        }
        Commands::Init(ref args) => run_init(args, cli.config.as_deref()),
        Commands::Translate(ref args) => {
            let mut config = load_config(cli.config.as_deref(), cli.log_level.is_some() || cli.debug)?;
            if let Some(target) = &args.target_language {
                config.target_language = target.clone();
            }
            apply_provider_args(&mut config, &args.provider);
            config.validate().context("Configuration validation failed")?;

            let controller = Controller::with_config(config)?;
            let summary = controller
                .run(&args.input, args.output.as_deref(), args.provider.force)
                .await?;
            finish(summary)
        }
        Commands::Batch(ref args) => {
            let mut config = load_config(cli.config.as_deref(), cli.log_level.is_some() || cli.debug)?;
            apply_provider_args(&mut config, &args.provider);
            for target in &args.target_languages {
                language_utils::get_language_name(target)
                    .with_context(|| format!("Invalid target language: {}", target))?;
            }
            config.validate().context("Configuration validation failed")?;

            let controller = Controller::with_config(config)?;
            let summary = controller
                .run_folder(
                    &args.input_dir,
                    args.output_dir.as_deref(),
                    args.recursive,
                    &args.target_languages,
                    args.provider.force,
                )
                .await?;
            finish(summary)
        }
    }
}

/// Load the configuration file, then apply environment overrides.
///
/// A missing file is an error only when its path was given explicitly.
fn load_config(path: Option<&Path>, log_level_from_cli: bool) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path)?,
        None => {
            let default_path = Config::default_path();
            if default_path.exists() {
                Config::load(&default_path)?
            } else {
                debug!("No configuration file at {:?}, using defaults", default_path);
                Config::default()
            }
        }
    };

    config.apply_env_overrides()?;

    if !log_level_from_cli {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

fn apply_provider_args(config: &mut Config, args: &ProviderArgs) {
    if let Some(source) = &args.source_language {
        config.source_language = source.clone();
    }
    if let Some(provider) = &args.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &args.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(batch_size) = args.batch_size {
        config.batch.batch_size = batch_size;
    }
    if args.multi_batch {
        config.batch.mode = BatchMode::Multi;
    }
}

fn run_init(args: &InitArgs, config_path: Option<&Path>) -> Result<()> {
    let path = args
        .output
        .clone()
        .or_else(|| config_path.map(Path::to_path_buf))
        .unwrap_or_else(Config::default_path);

    if path.exists() && !args.force {
        return Err(anyhow!("Configuration file already exists: {:?} (use -f to overwrite)", path));
    }

    let config = Config::from_init(&InitSettings {
        target_languages: args.target_languages.clone(),
        source_language: args.source_language.clone(),
        provider: args.provider.clone().map(Into::into),
        model: args.model.clone(),
        temperature: args.temperature,
        batch_size: args.batch_size,
        multi_batch: args.multi_batch,
        max_retries: args.max_retries,
        output_suffix: args.output_suffix.clone(),
    })?;

    config.save(&path)?;
    info!("Configuration written to {}", path.display());
    info!(
        "Set {} or edit the file to add your API key",
        config.translation.provider.api_key_env_var()
    );
    Ok(())
}

fn finish(summary: RunSummary) -> Result<()> {
    if summary.has_failures() {
        warn!(
            "{} failed batch(es), {} unreadable file(s)",
            summary.failed_batches, summary.files_failed
        );
        return Err(anyhow!("Translation finished with failures"));
    }
    Ok(())
}
