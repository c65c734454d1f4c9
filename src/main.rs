//! Analytics intake CLI
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{Parser, Subcommand};
use colored::Colorize;
use intake::agent::GeminiClient;
use intake::config::LogFormat;
use intake::conversation::ScriptedPolicy;
use intake::session::IntakeSession;
use intake::ui::TerminalPrompter;
use intake::{samples, AnalyticsRequest, Config, PersistOutcome, RequestStore, Validator};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "analytics-intake")]
#[command(author, version, about = "Guided intake for analytics requests", long_about = None)]
struct Cli {
    /// Path to a config file (defaults to intake.toml in cwd or ~/.config/intake)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the requester's basic information
    Validate {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        role: String,
        #[arg(long, default_value = "")]
        department: String,
        #[arg(long, default_value = "")]
        timeline: String,
    },
    /// Summarise and save an intake record read from a JSON file
    Save {
        /// JSON file holding basic_info, request_type and requirements
        file: PathBuf,
    },
    /// List saved requests, newest first
    List,
    /// Print the JSON Schema of a saved request
    Schema,
    /// Write sample requests for each request type
    Samples,
}

fn init_logging(config: &Config) {
    use tracing::Level;

    let log_level = config
        .logging
        .level
        .parse::<Level>()
        .unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    init_logging(&config);

    let store = RequestStore::open(&config.output.dir);

    match cli.command {
        Some(Commands::Validate {
            name,
            role,
            department,
            timeline,
        }) => {
            let validator = Validator::new(config.validation);
            let result = validator.validate(&name, &role, &department, &timeline);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Some(Commands::Save { file }) => {
            // Fail on a missing API key before touching the record
            let client = GeminiClient::from_config(&config)?;
            let outcome = match read_record(&file) {
                Ok(request) => store.persist(&client, request).await,
                Err(e) => PersistOutcome::save_failed(e),
            };
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Some(Commands::List) => {
            let requests = store.list_all()?;

            if requests.is_empty() {
                println!("No saved requests found in {}.", store.dir().display());
            } else {
                println!("Saved requests ({}):\n", requests.len());
                for stored in requests {
                    let request = &stored.request;
                    let created = request
                        .metadata
                        .as_ref()
                        .map(|m| m.created_at.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    println!(
                        "📄 {} for {} ({})",
                        request.request_type.to_string().bold(),
                        request.basic_info.name,
                        created
                    );
                    println!("   {}", stored.path.display());
                    println!(
                        "   {}, {}, needed: {}\n",
                        request.basic_info.role,
                        request.basic_info.department,
                        request.basic_info.timeline
                    );
                }
            }
        }
        Some(Commands::Schema) => {
            let schema = schemars::schema_for!(AnalyticsRequest);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Some(Commands::Samples) => {
            println!("Analytics Intake - Example Outputs");
            println!("{}", "=".repeat(50));

            let written = samples::sample_requests(&intake::clock::SystemClock);
            for sample in &written {
                let path = store.write_named(sample.file_name, &sample.request)?;
                println!("\n📄 {}", sample.file_name);
                println!("{}", "-".repeat(30));
                for line in samples::recap(&sample.request) {
                    println!("{}", line);
                }
                println!("{} Saved to {}", "✅".green(), path.display());
            }
            println!("\nGenerated {} example analytics requests.", written.len());
        }
        None => {
            // Default: run the interactive intake
            let client = GeminiClient::from_config(&config)?;
            let validator = Validator::new(config.validation);
            let mut session = IntakeSession::new(ScriptedPolicy, &validator, &store, &client);
            let outcome = session.run(&mut TerminalPrompter::new()).await?;

            match outcome {
                PersistOutcome::Success { file_path, summary, .. } => {
                    println!("\n{} {}", "Saved:".green().bold(), file_path.display());
                    println!("  {}", summary);
                }
                PersistOutcome::Error { message } => {
                    eprintln!("\n{} {}", "Not saved:".red().bold(), message);
                }
            }
        }
    }

    Ok(())
}

/// Parse an intake record from a JSON file
fn read_record(path: &Path) -> anyhow::Result<AnalyticsRequest> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
