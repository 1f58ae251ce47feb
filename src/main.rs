use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use scopto::core::log::init_logging;
use scopto::core::wallet::WalletId;

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display wallet balances and portfolio totals
    Summary {
        /// Also list holdings below the dust threshold
        #[arg(long)]
        show_dust: bool,
    },
    /// Keep the summary on screen and refresh it with live prices
    Watch,
    /// Start tracking a wallet address
    Track {
        address: String,
        #[arg(short, long)]
        label: Option<String>,
    },
    /// Stop tracking a wallet
    Untrack { id: WalletId },
    /// Change a wallet's label. Omit the label to clear it.
    Rename { id: WalletId, label: Option<String> },
    /// List tracked wallets
    Wallets,
}

impl From<Commands> for scopto::AppCommand {
    fn from(cmd: Commands) -> scopto::AppCommand {
        match cmd {
            Commands::Summary { show_dust } => scopto::AppCommand::Summary { show_dust },
            Commands::Watch => scopto::AppCommand::Watch,
            Commands::Track { address, label } => scopto::AppCommand::Track { address, label },
            Commands::Untrack { id } => scopto::AppCommand::Untrack { id },
            Commands::Rename { id, label } => scopto::AppCommand::Rename { id, label },
            Commands::Wallets => scopto::AppCommand::Wallets,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => scopto::cli::setup::setup_at_path(path),
            None => scopto::cli::setup::setup(),
        },
        Some(cmd) => scopto::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
