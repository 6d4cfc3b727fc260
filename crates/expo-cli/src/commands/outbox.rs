use expo_config::ExpoConfig;
use expo_db::service::ExpoService;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::OutboxListArgs;
use crate::output::output;

/// Handle `expo outbox list`.
pub async fn list(
    args: &OutboxListArgs,
    service: &ExpoService,
    config: &ExpoConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let limit = args.limit.unwrap_or(config.general.default_limit);
    let entries = service
        .list_outbox(args.status.map(Into::into), limit)
        .await?;
    output(&entries, flags.format)
}
