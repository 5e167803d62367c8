//! Versa prompt store command line
//!
//! `versa serve` runs the JSON admin API; the other subcommands operate on
//! the store directly.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use versa_core::prompt::{NewPromptVersion, PromptKey, PromptRecord};
use versa_prompts::{seeds, PromptManager};
use versa_server::{
    config::{Config, LoggingConfig},
    server::{open_manager, Server},
};

/// Versioned prompt store
#[derive(Parser)]
#[command(name = "versa")]
#[command(about = "Versioned prompt store with a single active version per prompt")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override the database URL
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default prompts
    Init {
        /// JSON file with seeds to use instead of the built-in defaults
        #[arg(long)]
        seed_file: Option<PathBuf>,

        /// Save every seed as a new active version even if the prompt exists
        #[arg(long)]
        force: bool,
    },
    /// Run the admin API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
    /// List active prompts
    List {
        #[arg(long)]
        agent_type: Option<String>,
    },
    /// Print the active version, or a specific one
    Show {
        agent_type: String,
        prompt_name: String,

        #[arg(long)]
        version: Option<u32>,
    },
    /// Print the version history, most recent first
    History {
        agent_type: String,
        prompt_name: String,

        #[arg(long)]
        limit: Option<u32>,
    },
    /// Save a new version
    Create {
        agent_type: String,
        prompt_name: String,

        /// Prompt text
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,

        /// Read the prompt text from a file
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        author: Option<String>,

        /// Template variable used by the content, repeatable
        #[arg(long = "variable", value_name = "NAME")]
        variables: Vec<String>,

        /// Make the new version active
        #[arg(long)]
        activate: bool,
    },
    /// Make a version the active one
    Activate {
        agent_type: String,
        prompt_name: String,
        version: u32,
    },
    /// Print the active prompt and count one use of it
    Use {
        agent_type: String,
        prompt_name: String,
    },
    /// Export all active prompts as text
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print store statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => Config::load().context("Failed to load configuration")?,
    };
    if let Some(url) = &cli.database_url {
        config.database.url = url.clone();
    }
    if let Command::Serve { host, port } = &cli.command {
        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
    }

    init_tracing(&config.logging);
    info!("Configuration loaded successfully");

    if let Err(e) = run(cli.command, config).await {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "versa_server={level},versa_prompts={level},versa_storage={level},tower_http=info",
            level = logging.level
        ))
    });

    // Logs go to stderr so command output stays pipeable
    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    if let Command::Serve { .. } = command {
        let server = Server::new(config).await?;
        server.run().await?;
        return Ok(());
    }

    let manager = open_manager(&config).await?;
    let result = run_command(command, &manager).await;
    manager.storage().close().await;
    result
}

async fn run_command(command: Command, manager: &PromptManager) -> anyhow::Result<()> {
    match command {
        Command::Init { seed_file, force } => {
            let seeds = match seed_file {
                Some(path) => seeds::load_seeds(&path)?,
                None => seeds::default_seeds(),
            };
            let report = manager.initialize(&seeds, force).await?;
            for record in &report.created {
                println!("created  {}", record.label());
            }
            for key in &report.skipped {
                println!("skipped  {} (already exists)", key);
            }
        }
        Command::Serve { .. } => anyhow::bail!("serve runs through Server::run"),
        Command::List { agent_type } => {
            let prompts = manager.list_active(agent_type.as_deref()).await?;
            if prompts.is_empty() {
                println!("No active prompts");
            }
            for record in &prompts {
                println!(
                    "{:<40} v{:<4} used {} times",
                    record.key().to_string(),
                    record.version,
                    record.usage_count
                );
            }
        }
        Command::Show {
            agent_type,
            prompt_name,
            version,
        } => {
            let record = match version {
                Some(version) => manager.get_version(&agent_type, &prompt_name, version).await?,
                None => manager.get_active(&agent_type, &prompt_name).await?,
            };
            print_record(&record);
        }
        Command::History {
            agent_type,
            prompt_name,
            limit,
        } => {
            let history = manager.list_history(&agent_type, &prompt_name, limit).await?;
            if history.is_empty() {
                println!("No versions saved for {}.{}", agent_type, prompt_name);
            }
            for record in &history {
                println!(
                    "v{:<4} {} {:<8} by {:<12} used {:<6} {}",
                    record.version,
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    if record.is_active { "ACTIVE" } else { "" },
                    record.created_by,
                    record.usage_count,
                    record.description.as_deref().unwrap_or("")
                );
            }
        }
        Command::Create {
            agent_type,
            prompt_name,
            content,
            file,
            description,
            author,
            variables,
            activate,
        } => {
            let content = match (content, file) {
                (Some(content), _) => content,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("either --content or --file is required"),
            };
            let request = NewPromptVersion::new(
                PromptKey::parse(&agent_type, &prompt_name)?,
                &content,
                description.as_deref(),
                author.as_deref(),
                activate,
            )?
            .with_variables(&variables)?;
            let record = manager.create_version(request).await?;
            println!(
                "Saved {}{}",
                record.label(),
                if record.is_active { " (active)" } else { "" }
            );
        }
        Command::Activate {
            agent_type,
            prompt_name,
            version,
        } => {
            let record = manager
                .activate_version(&agent_type, &prompt_name, version)
                .await?;
            println!("Activated {}", record.label());
        }
        Command::Use {
            agent_type,
            prompt_name,
        } => {
            let record = manager.get_active(&agent_type, &prompt_name).await?;
            manager.record_usage(&agent_type, &prompt_name).await?;
            println!("{}", record.content);
        }
        Command::Export { output } => {
            let text = manager.export_active().await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported active prompts to {}", path.display());
                }
                None => print!("{}", text),
            }
        }
        Command::Stats => {
            let stats = manager.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}

fn print_record(record: &PromptRecord) {
    println!("{}{}", record.label(), if record.is_active { " (active)" } else { "" });
    if let Some(description) = &record.description {
        println!("Description: {}", description);
    }
    println!(
        "Created {} by {}, used {} times",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        record.created_by,
        record.usage_count
    );
    println!();
    println!("{}", record.content);
}
