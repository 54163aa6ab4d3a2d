use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use remitlens::core::log::init_logging;
use remitlens::core::{Currency, DeliveryMethod};
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for remitlens::AppCommand {
    fn from(cmd: Commands) -> remitlens::AppCommand {
        match cmd {
            Commands::Compare {
                amount,
                from,
                to,
                method,
                provider,
                refresh,
            } => remitlens::AppCommand::Compare(remitlens::CompareArgs {
                amount,
                from,
                to,
                method,
                providers: provider,
                refresh,
            }),
            Commands::Providers => remitlens::AppCommand::Providers,
            Commands::Rates { to } => remitlens::AppCommand::Rates { to },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Compare what the recipient gets across providers
    Compare {
        /// Amount to send, in the source currency
        amount: Decimal,
        /// Source currency (USD, GBP, EUR, CAD, AUD, AED)
        #[arg(short, long)]
        from: Option<Currency>,
        /// Destination currency
        #[arg(short, long)]
        to: Option<Currency>,
        /// Only providers delivering by this method (mpesa, bank, cash)
        #[arg(short, long)]
        method: Option<DeliveryMethod>,
        /// Restrict to these providers (repeatable)
        #[arg(short, long)]
        provider: Vec<String>,
        /// Ignore the cached mid-market rate
        #[arg(long)]
        refresh: bool,
    },
    /// List configured providers
    Providers,
    /// Show current mid-market rates for every supported corridor
    Rates {
        /// Destination currency
        #[arg(short, long)]
        to: Option<Currency>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => remitlens::cli::setup::setup(),
        Some(cmd) => remitlens::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
