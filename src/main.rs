//! Insur CLI binary entry point.

use insur::cli::{Cli, Commands};
use insur::error::InsurError;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_env("INSUR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse_args();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e.message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), InsurError> {
    let config = cli.client_config()?;
    let client = insur::cli::connect(&config)?;

    match cli.command {
        Commands::Auth(args) => insur::cli::auth::handle(client, args.command).await,
        Commands::Claims(args) => insur::cli::resources::handle_claims(client, args.command).await,
        Commands::Policies(args) => {
            insur::cli::resources::handle_policies(client, args.command).await
        }
        Commands::UserPolicies(args) => {
            insur::cli::resources::handle_user_policies(client, &config, args.command).await
        }
    }
}
