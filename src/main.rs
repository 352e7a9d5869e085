mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use teamster::catalog::ImageCatalog;
use teamster::config::{Config, default_config_path, log_config_source};
use teamster::{api, observability, teams};

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = Config::load(Some(config_path.clone()))?;
    observability::init_tracing(config.debug);
    log_config_source(&config_path);

    match cli.command {
        Commands::Serve(args) => {
            if let Some(address) = args.address {
                config.listen_address = address.ip();
                config.port = address.port();
            }
            if config.update_teams_config {
                teams::update_client_config(&teams::client_config_path(), &config)?;
            }
            api::run(config).await?;
        }
        Commands::Manifest => print_manifest(&config)?,
        Commands::TeamsConfig => {
            let path = teams::client_config_path();
            if !teams::update_client_config(&path, &config)? {
                println!("{} is already up to date", path.display());
            }
        }
    }

    Ok(())
}

fn print_manifest(config: &Config) -> Result<(), AnyError> {
    std::fs::create_dir_all(&config.thumbnail_dir)?;
    let manifest = ImageCatalog::from_config(config).manifest()?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}
