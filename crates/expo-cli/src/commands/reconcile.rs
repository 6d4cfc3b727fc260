use expo_config::ExpoConfig;
use expo_db::service::ExpoService;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ReconcileArgs;
use crate::output::output;

/// Handle `expo reconcile`.
pub async fn handle(
    args: &ReconcileArgs,
    service: &ExpoService,
    config: &ExpoConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let limit = args.limit.unwrap_or(config.outbox.batch_size);
    let report = service.reconcile_outbox(limit).await?;
    output(&report, flags.format)
}
