use clap::{Args, Subcommand, ValueEnum};

use expo_core::enums::OutboxStatus;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create or migrate the database and seed the default role
    Init,

    /// Retry due fan-out outbox entries once
    Reconcile(ReconcileArgs),

    /// Inspect the fan-out outbox
    Outbox {
        #[command(subcommand)]
        action: OutboxCommands,
    },

    /// Print the JSON schema of an entity document
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Entries to process (defaults to `outbox.batch_size`)
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum OutboxCommands {
    /// List queued entries, oldest first
    List(OutboxListArgs),
}

#[derive(Debug, Args)]
pub struct OutboxListArgs {
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// Max entries (defaults to `general.default_limit`)
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Dead,
}

impl From<StatusArg> for OutboxStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => Self::Pending,
            StatusArg::Dead => Self::Dead,
        }
    }
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[arg(value_enum)]
    pub entity: SchemaEntity,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SchemaEntity {
    User,
    Role,
    Exhibition,
    Project,
    Review,
    Company,
    Class,
    Knowledge,
    Actor,
}
