pub mod init;
pub mod outbox;
pub mod reconcile;
pub mod schema;

use expo_config::ExpoConfig;
use expo_db::service::ExpoService;

use crate::bootstrap;
use crate::cli::root_commands::OutboxCommands;
use crate::cli::{Commands, GlobalFlags};

/// Route a parsed command to its handler.
pub async fn dispatch(command: &Commands, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Schema(args) => schema::handle(args, flags),
        Commands::Init => {
            let (config, service) = open(flags).await?;
            init::handle(&service, &config, flags).await
        }
        Commands::Reconcile(args) => {
            let (config, service) = open(flags).await?;
            reconcile::handle(args, &service, &config, flags).await
        }
        Commands::Outbox {
            action: OutboxCommands::List(args),
        } => {
            let (config, service) = open(flags).await?;
            outbox::list(args, &service, &config, flags).await
        }
    }
}

async fn open(flags: &GlobalFlags) -> anyhow::Result<(ExpoConfig, ExpoService)> {
    let config = bootstrap::load_config(flags)?;
    let service = bootstrap::open_service(&config).await?;
    Ok((config, service))
}
