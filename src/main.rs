// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::Path;

use translation_store::app_config::{self, Config};
use translation_store::container::{self, AdminContainer, Translations};
use translation_store::decorator::EncodingDecorator;
use translation_store::language::LanguageSpec;

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
    /// List registered languages
    Languages,

    /// Print one translated string
    Get {
        /// String identifier
        string_id: String,
        /// Language to read
        #[arg(short, long)]
        lang: String,
        /// Page identifier; omit for the absent page, pass "" for the empty page
        #[arg(short, long)]
        page: Option<String>,
        /// Re-encode the output into this charset
        #[arg(long)]
        output_charset: Option<String>,
    },

    /// Print every string of a page
    Page {
        #[arg(short, long)]
        lang: String,
        #[arg(short, long)]
        page: Option<String>,
        #[arg(long)]
        output_charset: Option<String>,
    },

    /// Find the string id holding a value
    Find {
        value: String,
        #[arg(short, long)]
        page: Option<String>,
    },

    /// List page identifiers
    Pages,

    /// Register a new language and create its storage
    AddLanguage {
        id: String,
        /// Table holding the language's column (relational backend)
        #[arg(short, long, default_value = "i18n")]
        table: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        meta: String,
        #[arg(long, default_value = "")]
        error_text: String,
        #[arg(long, default_value = "UTF-8")]
        encoding: String,
    },

    /// Unregister a language and drop its storage
    RemoveLanguage {
        id: String,
        /// Drop the whole table even when other languages share it
        #[arg(short, long)]
        force: bool,
    },

    /// Add or update a string entry
    Set {
        string_id: String,
        #[arg(short, long)]
        page: Option<String>,
        /// Translations as LANG=VALUE pairs
        #[arg(required = true, value_parser = parse_translation)]
        values: Vec<(String, String)>,
    },

    /// Remove a string entry in every language
    Remove {
        string_id: String,
        #[arg(short, long)]
        page: Option<String>,
    },

    /// Generate shell completions for tstore
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// tstore - translation string store administration
///
/// Reads and edits translated strings kept in a SQLite database or an XML
/// document.
#[derive(Parser, Debug)]
#[command(name = "tstore")]
#[command(version)]
#[command(about = "Translation string store administration")]
#[command(long_about = "tstore reads and edits translated strings kept in a SQLite database or an XML document.

EXAMPLES:
    tstore add-language en --name English         # Register English in table i18n
    tstore add-language de --table i18n_de        # Register German in its own table
    tstore set greet --page home en=Hi de=Hallo   # Write one entry in two languages
    tstore get greet --page home --lang de        # Read it back
    tstore page --page home --lang en             # Dump a whole page
    tstore remove-language de --force             # Drop German and its table
    tstore completions bash > tstore.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one (SQLite backend) will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: String,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

fn parse_translation(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((lang, value)) if !lang.is_empty() => Ok((lang.to_string(), value.to_string())),
        _ => Err(format!("expected LANG=VALUE, got '{}'", raw)),
    }
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
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
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
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
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

fn main() -> Result<()> {
    // Most verbose filter here; the effective level is applied after config load
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "tstore", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&cli)?;
    config.validate().context("Configuration validation failed")?;

    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let mut store = container::open(&config.backend)
        .with_context(|| format!("Failed to open {} container", config.backend.kind()))?;

    run_command(cli.command, store.as_mut())
}

/// Load the configuration, creating a default one when the file is missing
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let config_path = Path::new(&cli.config);

    let mut config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", cli.config);
        let config = Config::default();
        config.save(config_path)?;
        config
    };

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }

    Ok(config)
}

fn write_bytes(bytes: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

fn run_command(command: Commands, store: &mut dyn AdminContainer) -> Result<()> {
    match command {
        Commands::Languages => {
            for language in store.fetch_languages()?.values() {
                println!("{}\t{}\t{}", language.id, language.encoding, language.name);
            }
        }

        Commands::Get {
            string_id,
            lang,
            page,
            output_charset,
        } => match output_charset {
            Some(charset) => {
                let decorator = EncodingDecorator::with_charset(&*store, charset);
                match decorator.get_one(&string_id, page.as_deref(), &lang)? {
                    Some(bytes) => write_bytes(&bytes)?,
                    None => warn!("No '{}' translation for '{}'", lang, string_id),
                }
            }
            None => match store.get_one(&string_id, page.as_deref(), &lang)? {
                Some(value) => println!("{}", value),
                None => warn!("No '{}' translation for '{}'", lang, string_id),
            },
        },

        Commands::Page {
            lang,
            page,
            output_charset,
        } => match output_charset {
            Some(charset) => {
                let decorator = EncodingDecorator::with_charset(&*store, charset);
                for (string_id, value) in decorator.get_page(page.as_deref(), &lang)? {
                    let mut line = format!("{}\t", string_id).into_bytes();
                    line.extend(value.unwrap_or_default());
                    write_bytes(&line)?;
                }
            }
            None => {
                for (string_id, value) in store.get_page(page.as_deref(), &lang)? {
                    println!("{}\t{}", string_id, value.unwrap_or_default());
                }
            }
        },

        Commands::Find { value, page } => {
            let string_id = store.get_string_id(&value, page.as_deref())?;
            if string_id.is_empty() {
                return Err(anyhow!("No string holds {:?}", value));
            }
            println!("{}", string_id);
        }

        Commands::Pages => {
            for page in store.list_page_ids()? {
                match page {
                    Some(page) => println!("{:?}", page),
                    None => println!("(none)"),
                }
            }
        }

        Commands::AddLanguage {
            id,
            table,
            name,
            meta,
            error_text,
            encoding,
        } => {
            let spec = LanguageSpec::new(&id, table)
                .with_name(name)
                .with_meta(meta)
                .with_error_text(error_text)
                .with_encoding(encoding);
            store.create_language(&spec)?;
            store.save()?;
            info!("Language {} added", id);
        }

        Commands::RemoveLanguage { id, force } => {
            store.remove_language(&id, force)?;
            store.save()?;
            info!("Language {} removed", id);
        }

        Commands::Set {
            string_id,
            page,
            values,
        } => {
            let values: Translations = values.into_iter().collect();
            store.add_or_update_entry(&string_id, page.as_deref(), &values)?;
            store.save()?;
        }

        Commands::Remove { string_id, page } => {
            store.remove_entry(&string_id, page.as_deref())?;
            store.save()?;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}
