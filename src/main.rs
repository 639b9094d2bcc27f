//! azurerm-network - Azure network resources from the command line
//!
//! This is the main entry point for the azurerm-network CLI.

mod cli;

use anyhow::{Context, Result};
use azurerm_network::config::Config;
use azurerm_network::logging::init_logging;
use azurerm_network::service::service_from_config;
use cli::commands::CommandContext;
use cli::output::OutputFormatter;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Parse command line arguments; usage errors exit with 2
    let cli = Cli::parse_args();
    let output = OutputFormatter::new(!cli.no_color, cli.output, cli.verbosity());

    let exit_code = match run(&cli, &output).await {
        Ok(code) => code,
        Err(e) => {
            output.error(&format!("{:#}", e));
            1
        }
    };

    output.flush();
    std::process::exit(exit_code);
}

async fn run(cli: &Cli, output: &OutputFormatter) -> Result<i32> {
    if let Commands::Completions(args) = &cli.command {
        cli::completions::generate_completions(args.shell);
        return Ok(0);
    }

    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.mock {
        config.azure.mock = true;
    }
    if let Some(subscription) = &cli.subscription {
        config.azure.subscription_id = Some(subscription.clone());
    }

    if let Err(e) = init_logging(&config.logging, cli.verbosity()) {
        output.warning(&format!("Failed to initialize logging: {}", e));
    }

    if cli.verbosity() >= 2 {
        output.debug(&format!("azurerm-network v{}", azurerm_network::version()));
    }

    let service = service_from_config(&config)?;
    let ctx = CommandContext::new(config, output.clone(), service);
    if ctx.is_mock() {
        output.debug("Serving requests from the in-memory mock service");
    }

    match &cli.command {
        Commands::Nic(args) => args.execute(&ctx).await,
        Commands::SecurityRule(args) => args.execute(&ctx).await,
        Commands::ExpressRoute(args) => args.execute(&ctx).await,
        Commands::Module(args) => args.execute(&ctx).await,
        Commands::Completions(_) => Ok(0),
    }
}
