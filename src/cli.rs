use crate::agents::orchestrator::MasterOrchestrator;
use crate::agents::router::{BillRouter, Category, KeywordRouter, LlmRouter, RouterStrategy};
use crate::agents::tools;
use crate::agents::specialized::{SpecialistSpec, required_providers};
use crate::agents::state::BillInput;
use crate::api::{self, AppState};
use crate::config::Config;
use crate::llm::{LlmClient, RigLlmClient};
use crate::log_debug;
use crate::memory::InMemoryNegotiationMemory;
use crate::ocr::{PlainTextOcr, extract_bill_amount};
use crate::providers::Provider;
use crate::ui;

use anyhow::{Context, Result};
use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand, crate_version};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LOG_FILE: &str = "hagglz-debug.log";

/// CLI structure defining the available commands and global arguments
#[derive(Parser)]
#[command(
    author,
    version = crate_version!(),
    about = "Hagglz: AI-powered bill negotiation",
    long_about = "Hagglz routes a bill to a specialist negotiation pipeline, scores the strategy it produces and decides how much human oversight it needs.",
    disable_version_flag = true,
    after_help = get_dynamic_help(),
    styles = get_styles(),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log debug messages to a file
    #[arg(short = 'l', long = "log", global = true, help = "Log debug messages to a file")]
    pub log: bool,

    /// Specify a custom log file path
    #[arg(long = "log-file", global = true, help = "Specify a custom log file path")]
    pub log_file: Option<String>,

    /// Suppress non-essential output
    #[arg(short = 'q', long = "quiet", global = true, help = "Suppress non-essential output")]
    pub quiet: bool,

    /// Display the version
    #[arg(short = 'v', long = "version", global = true, help = "Display the version")]
    pub version: bool,
}

/// Enumeration of available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the negotiation HTTP API
    #[command(about = "Start the negotiation HTTP API")]
    Serve {
        /// Address to listen on, overriding `server.bind`
        #[arg(short, long, help = "Address to listen on (e.g. 127.0.0.1:8000)")]
        bind: Option<String>,
    },

    /// Negotiate a bill from already-extracted text
    #[command(
        about = "Negotiate a bill from a text file",
        long_about = "Run the full orchestration on bill text that has already been extracted and print the outcome as JSON."
    )]
    Negotiate {
        /// File containing the bill text
        #[arg(short, long, help = "File containing the bill text")]
        file: PathBuf,

        /// Amount due; extracted from the text when omitted
        #[arg(short, long, help = "Amount due (extracted from the text when omitted)")]
        amount: Option<f64>,

        /// Company that issued the bill
        #[arg(short, long, help = "Company that issued the bill")]
        company: Option<String>,

        /// User the negotiation is run for
        #[arg(short, long, default_value = "cli", help = "User the negotiation is run for")]
        user: String,
    },

    /// Classify a bill without negotiating it
    #[command(about = "Classify a bill into a specialist category")]
    Classify {
        /// File containing the bill text
        #[arg(short, long, help = "File containing the bill text")]
        file: PathBuf,
    },

    /// List the specialist pipelines and their steps
    #[command(about = "List the specialist pipelines and their steps")]
    Pipelines,

    /// Print the effective configuration
    #[command(about = "Print the effective configuration as TOML")]
    Config,

    /// Show reference market data for a bill category
    #[command(about = "Show competitor rates and company research for a category")]
    Market {
        /// Bill category (utility, medical, subscription, telecom)
        #[arg(short = 't', long = "type", help = "Bill category")]
        category: Category,

        /// Company to research
        #[arg(short, long, help = "Company to research")]
        company: Option<String>,
    },

    /// Grade a finished negotiation
    #[command(about = "Grade a finished negotiation and compute the savings")]
    Savings {
        /// Amount before negotiating
        #[arg(short, long, help = "Amount before negotiating")]
        original: f64,

        /// Amount after negotiating
        #[arg(short, long, help = "Amount after negotiating")]
        negotiated: f64,

        /// Strategy that was used
        #[arg(short, long, default_value = "", help = "Strategy that was used")]
        strategy: String,
    },

    /// Summarise a bill history
    #[command(about = "Summarise a history of monthly bill amounts")]
    Trend {
        /// Monthly amounts, oldest first
        #[arg(required = true, help = "Monthly amounts, oldest first")]
        amounts: Vec<f64>,
    },
}

/// Define custom styles for Clap
fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default().bold())
        .placeholder(AnsiColor::Yellow.on_default())
        .valid(AnsiColor::Blue.on_default().bold())
        .invalid(AnsiColor::Red.on_default().bold())
        .error(AnsiColor::Red.on_default().bold())
}

/// Parse the command-line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Help footer listing the supported LLM providers
fn get_dynamic_help() -> String {
    let providers_list = Provider::all_names()
        .iter()
        .map(|p| format!("{}", p.bold()))
        .collect::<Vec<_>>()
        .join(" • ");

    format!("\nAvailable LLM Providers: {providers_list}")
}

/// Main function to parse arguments and handle the command
pub async fn main() -> Result<()> {
    let cli = parse_args();

    if cli.version {
        ui::print_version(crate_version!());
        return Ok(());
    }

    let serving = matches!(cli.command, Some(Commands::Serve { .. }));
    if cli.log {
        crate::logger::enable_logging();
        let log_file = cli.log_file.as_deref().unwrap_or(LOG_FILE);
        crate::logger::set_log_file(log_file)?;
        crate::logger::set_log_to_stderr(serving);
    } else if serving {
        crate::logger::enable_logging();
    } else {
        crate::logger::disable_logging();
        crate::logger::set_log_to_stderr(false);
    }

    if cli.quiet {
        ui::set_quiet_mode(true);
    }

    if let Some(command) = cli.command {
        let config = Config::load()?;
        crate::logger::set_verbose_logging(config.performance.verbose_logging);
        handle_command(command, config).await
    } else {
        let _ = Cli::parse_from(["hagglz", "--help"]);
        Ok(())
    }
}

/// Handle the command based on parsed arguments
pub async fn handle_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Serve { bind } => handle_serve(config, bind).await,
        Commands::Negotiate {
            file,
            amount,
            company,
            user,
        } => handle_negotiate(&config, &file, amount, company.as_deref(), user).await,
        Commands::Classify { file } => handle_classify(&config, &file).await,
        Commands::Pipelines => {
            handle_pipelines(&config);
            Ok(())
        }
        Commands::Config => handle_config(&config),
        Commands::Market { category, company } => handle_market(category, company.as_deref()),
        Commands::Savings {
            original,
            negotiated,
            strategy,
        } => handle_savings(original, negotiated, &strategy),
        Commands::Trend { amounts } => handle_trend(&amounts),
    }
}

/// Create the production LLM client after checking the API keys it needs
fn llm_client(config: &Config) -> Result<Arc<dyn LlmClient>> {
    let providers = required_providers(config);
    let client = RigLlmClient::new(&providers)?;
    Ok(Arc::new(client))
}

fn build_orchestrator(config: &Config) -> Result<MasterOrchestrator> {
    let llm = llm_client(config)?;
    MasterOrchestrator::from_config(&llm, config).context("Failed to build negotiation pipelines")
}

fn read_bill_text(file: &Path) -> Result<String> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read bill text from {}", file.display()))?;
    if text.trim().is_empty() {
        anyhow::bail!("{} contains no bill text", file.display());
    }
    Ok(text)
}

async fn handle_serve(config: Config, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    log_debug!("Handling 'serve' command on {}", bind);

    let orchestrator = build_orchestrator(&config)?;
    let state = AppState::new(
        Arc::new(orchestrator),
        Arc::new(InMemoryNegotiationMemory::new()),
        Arc::new(PlainTextOcr),
        config.memory.store_threshold,
    );

    ui::print_info(&format!("Starting Hagglz negotiation API on {bind}"));
    ui::print_field("Router", &config.negotiation.router.to_string());
    ui::print_field("Savings table", &config.negotiation.savings_table.to_string());
    api::serve(state, &bind).await
}

async fn handle_negotiate(
    config: &Config,
    file: &Path,
    amount: Option<f64>,
    company: Option<&str>,
    user: String,
) -> Result<()> {
    let text = read_bill_text(file)?;
    let amount = amount.unwrap_or_else(|| extract_bill_amount(&text));
    let bill = BillInput::new(text, user, amount).with_company(company);
    log_debug!("Handling 'negotiate' command for {} ({:.2})", bill.company, bill.amount);

    let orchestrator = build_orchestrator(config)?;
    let outcome = orchestrator.process_bill(&bill).await?;

    ui::print_success(&format!(
        "{} bill negotiated: {} (confidence {:.2})",
        outcome.result.agent_type, outcome.execution_mode, outcome.confidence
    ));
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn handle_classify(config: &Config, file: &Path) -> Result<()> {
    let text = read_bill_text(file)?;
    let router: Box<dyn BillRouter> = match config.negotiation.router {
        RouterStrategy::Keyword => Box::new(KeywordRouter),
        RouterStrategy::Llm => {
            let llm = llm_client(config)?;
            Box::new(LlmRouter::new(
                llm,
                config.classification_settings(),
                config.call_policy(),
            )?)
        }
    };

    let classification = router.classify(&text).await?;
    if classification.fallback {
        ui::print_warning(&format!(
            "No category recognised, defaulting to {}",
            classification.category
        ));
    }
    println!("{}", classification.category);
    Ok(())
}

fn handle_pipelines(config: &Config) {
    for spec in SpecialistSpec::all() {
        let provider = spec.provider(config);
        println!("{}", spec.category.to_string().bold());
        for (index, step) in spec.steps.iter().enumerate() {
            let settings = config.step_settings(spec.category, step.name, provider, spec.temperature);
            println!(
                "  {}. {} → {} ({} {} @ {:.1})",
                index + 1,
                step.name,
                step.output,
                settings.provider,
                settings.model,
                settings.temperature
            );
        }
        ui::print_field("strategy", spec.strategy_field.key());
        if let Some(script) = spec.script_field {
            ui::print_field("script", script.key());
        }
    }
}

fn handle_config(config: &Config) -> Result<()> {
    println!("{}", config.to_toml()?);
    for provider in Provider::ALL {
        if !provider.has_api_key() {
            ui::print_warning(&format!(
                "{} is not set; {} steps will fail",
                provider.api_key_env(),
                provider
            ));
        }
    }
    Ok(())
}

fn handle_market(category: Category, company: Option<&str>) -> Result<()> {
    let rates = tools::get_competitor_rates(category);
    println!("{}", serde_json::to_string_pretty(&rates)?);

    if let Some(company) = company {
        let research = tools::research_company(company);
        ui::print_field("Best contact", &research.best_contact_method);
        ui::print_field("Best time", &research.peak_negotiation_times);
        println!("{}", serde_json::to_string_pretty(&research)?);
    }
    Ok(())
}

fn handle_savings(original: f64, negotiated: f64, strategy: &str) -> Result<()> {
    let report = tools::calculate_savings(original, negotiated)?;
    let validation = tools::validate_negotiation_outcome(original, negotiated, strategy)?;

    ui::print_success(&validation.recommendation);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "savings": report,
            "validation": validation,
        }))?
    );
    Ok(())
}

fn handle_trend(amounts: &[f64]) -> Result<()> {
    let analysis = tools::analyze_bill_patterns(amounts)?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
