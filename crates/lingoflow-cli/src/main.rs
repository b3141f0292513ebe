use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use lingoflow_config::{Config, ConfigManager};
use lingoflow_observability::{LogConfig, LogManager};
use std::path::PathBuf;

mod app;
mod collab;
mod commands;

use app::App;

#[derive(Parser)]
#[command(name = "lingoflow")]
#[command(about = "Interpreter preparation notebooks: briefings, glossaries, assistant and Rapid Fire drills")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, global = true, env = "LINGOFLOW_CONFIG", default_value = "~/.lingoflow/config.json")]
    config: String,

    /// Enable debug logging
    #[arg(long, short, global = true, default_value = "false")]
    debug: bool,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true, default_value = "false")]
    yes: bool,

    /// Keep changes in memory, leave the notebook file untouched
    #[arg(long, global = true, default_value = "false")]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a briefing and glossary for a topic and save it as a new notebook
    Prep {
        /// Topic, e.g. "Solid-state batteries"
        topic: String,
    },
    /// List notebooks, most recent first
    List,
    /// Show a notebook
    Show {
        /// Notebook id or unique prefix
        id: String,
    },
    /// Rename a notebook
    Rename { id: String, topic: String },
    /// Delete a notebook
    Delete { id: String },
    /// Export a notebook's glossary (csv) or the whole notebook (json)
    Export {
        id: String,
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Output file, `-` for stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Import a notebook package (.json) or merge a glossary (.csv) into a notebook
    Import {
        file: PathBuf,
        /// Notebook that receives CSV rows
        #[arg(long)]
        into: Option<String>,
    },
    /// Show or change notes
    Notes(NotesArgs),
    /// Glossary editing
    Term(TermArgs),
    /// Chat with the interpreter assistant about a notebook's topic
    Chat { id: String },
    /// Rapid Fire recall drill over a notebook's glossary
    Drill { id: String },
    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Args)]
pub struct NotesArgs {
    pub id: String,
    /// Replace the notes
    #[arg(long, conflicts_with = "capture")]
    pub set: Option<String>,
    /// Append a timestamped snippet
    #[arg(long)]
    pub capture: Option<String>,
}

#[derive(Args)]
pub struct TermArgs {
    #[command(subcommand)]
    pub command: TermCommands,
}

#[derive(Subcommand)]
pub enum TermCommands {
    /// Add a term at the top of the glossary
    Add {
        id: String,
        #[arg(long)]
        english: Option<String>,
        #[arg(long)]
        chinese: Option<String>,
    },
    /// Edit a term's English and Chinese text
    Edit {
        id: String,
        /// Term id or unique prefix
        term: String,
        #[arg(long)]
        english: Option<String>,
        #[arg(long)]
        chinese: Option<String>,
    },
    /// Remove a term
    Remove { id: String, term: String },
}

#[derive(Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// 获取配置值
    Get {
        /// 配置键 (如: drill.card_duration_ms, llm.default_provider)
        key: String,
    },
    /// 设置配置值
    Set { key: String, value: String },
    /// 初始化默认配置
    Init {
        /// 强制覆盖已有配置
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// 显示当前配置
    Show,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{}", format!("❌ {}", e).red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = lingoflow_config::expand_tilde(&cli.config)
        .unwrap_or_else(|| PathBuf::from(&cli.config));

    // config commands must work even when the file is broken
    if let Commands::Config(args) = cli.command {
        return commands::config::handle(args, &config_path).await;
    }

    let config = ConfigManager::load(&config_path).await?.snapshot().await;
    let _logs = init_logging(&config, cli.debug)?;
    tracing::debug!("Config path: {:?}", config_path);

    let app = App::load(config, cli.yes, cli.ephemeral).await?;

    match cli.command {
        Commands::Prep { topic } => commands::sessions::prep(&app, &topic).await,
        Commands::List => commands::sessions::list(&app),
        Commands::Show { id } => commands::sessions::show(&app, &id),
        Commands::Rename { id, topic } => commands::sessions::rename(&app, &id, &topic).await,
        Commands::Delete { id } => commands::sessions::delete(&app, &id).await,
        Commands::Export { id, format, output } => {
            commands::sessions::export(&app, &id, format, output).await
        }
        Commands::Import { file, into } => commands::sessions::import(&app, &file, into).await,
        Commands::Notes(args) => commands::sessions::notes(&app, args).await,
        Commands::Term(args) => commands::terms::handle(&app, args.command).await,
        Commands::Chat { id } => commands::chat::run(&app, &id).await,
        Commands::Drill { id } => commands::drill::run(&app, &id).await,
        Commands::Config(_) => Ok(()),
    }
}

fn init_logging(config: &Config, debug: bool) -> anyhow::Result<LogManager> {
    let mut log_config = LogConfig::default()
        .with_log_level(config.logging.level.as_str())
        .with_json_format(config.logging.json);
    if debug {
        log_config = log_config.with_log_level("debug").ignore_env();
    }
    if let Some(dir) = &config.logging.directory {
        let dir = lingoflow_config::expand_tilde(dir).unwrap_or_else(|| PathBuf::from(dir));
        log_config = log_config.with_directory(dir);
    }
    Ok(LogManager::init(log_config)?)
}
