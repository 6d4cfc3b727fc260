use schemars::{Schema, schema_for};

use expo_core::entities::{Company, Exhibition, Knowledge, Project, Review, Role, SchoolClass, User};
use expo_core::identity::ActorContext;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{SchemaArgs, SchemaEntity};
use crate::output::output;

/// Handle `expo schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&schema(args.entity), flags.format)
}

fn schema(entity: SchemaEntity) -> Schema {
    match entity {
        SchemaEntity::User => schema_for!(User),
        SchemaEntity::Role => schema_for!(Role),
        SchemaEntity::Exhibition => schema_for!(Exhibition),
        SchemaEntity::Project => schema_for!(Project),
        SchemaEntity::Review => schema_for!(Review),
        SchemaEntity::Company => schema_for!(Company),
        SchemaEntity::Class => schema_for!(SchoolClass),
        SchemaEntity::Knowledge => schema_for!(Knowledge),
        SchemaEntity::Actor => schema_for!(ActorContext),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_name_their_type() {
        let value = serde_json::to_value(schema(SchemaEntity::Class)).unwrap();
        assert_eq!(value["title"], "SchoolClass");
        let value = serde_json::to_value(schema(SchemaEntity::Exhibition)).unwrap();
        assert!(value["properties"]["roles"].is_object());
    }
}
