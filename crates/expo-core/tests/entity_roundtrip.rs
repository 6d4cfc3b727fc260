//! Serde roundtrip and JsonSchema validation tests for stored documents.

use chrono::{TimeZone, Utc};
use expo_core::entities::*;
use expo_core::identity::ActorContext;
use expo_core::validation::ScoreInput;
use schemars::schema_for;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn guest() -> RoleSummary {
    RoleSummary {
        id: "default".into(),
        name: "guest".into(),
        permissions: vec![
            "read_exhibition".into(),
            "read_project".into(),
            "create_review".into(),
        ],
    }
}

roundtrip_and_validate!(
    user_roundtrip,
    User,
    User {
        id: "usr-4f1c".into(),
        email: "ana@example.com".into(),
        password_hash: "$2b$12$abc".into(),
        name: "Ana Souza".into(),
        phone: Some("+55 11 99999-0000".into()),
        role: guest(),
        profile_picture: None,
        knowledge: Some("Robotics".into()),
        age: Some(17),
        company: None,
        class_name: Some("3A".into()),
        project: Some(UserProjectResume {
            id: "prj-9".into(),
            name: "Solar Kiosk".into(),
            logo: None,
            company_name: Some("SunCo".into()),
        }),
        reviews: vec![UserReviewResume {
            id: "rev-1".into(),
            project_id: "prj-2".into(),
            exhibition_id: "exh-1".into(),
            comment: None,
        }],
        favorited_projects: vec!["prj-2".into()],
        deactivation_date: None,
    }
);

roundtrip_and_validate!(
    role_roundtrip,
    Role,
    Role {
        id: "rol-judge".into(),
        name: "judge".into(),
        permissions: vec!["read_review".into(), "create_review".into()],
    }
);

roundtrip_and_validate!(
    exhibition_roundtrip,
    Exhibition,
    Exhibition {
        id: "exh-1".into(),
        name: "Science Fair 2025".into(),
        description: Some("Annual fair".into()),
        image: None,
        start_date: Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap(),
        end_date: Utc.with_ymd_and_hms(2025, 9, 3, 18, 0, 0).unwrap(),
        deactivation_date: None,
        roles: vec![
            RoleResume {
                id: "default".into(),
                name: "guest".into(),
                weight: 0.6,
            },
            RoleResume {
                id: "rol-judge".into(),
                name: "judge".into(),
                weight: 0.4,
            },
        ],
        criteria: vec![CriteriaResume {
            name: "Overall".into(),
            weight: 1.0,
        }],
        projects: vec![ProjectResume {
            id: "prj-9".into(),
            name: "Solar Kiosk".into(),
            logo: None,
            company_name: None,
            description: "Off-grid charging".into(),
            banners: vec!["https://cdn/b.png".into()],
            coordinates: Some(4),
        }],
        banners: vec!["https://cdn/b.png".into()],
    }
);

roundtrip_and_validate!(
    project_roundtrip,
    Project,
    Project {
        id: "prj-9".into(),
        name: "Solar Kiosk".into(),
        company_name: Some("SunCo".into()),
        description: "Off-grid charging".into(),
        coordinates: None,
        exhibition_id: "exh-1".into(),
        expositors: vec![ExpositorResume {
            id: "usr-4f1c".into(),
            name: Some("Ana Souza".into()),
        }],
        images: vec![],
        logo: Some("https://cdn/logo.png".into()),
        deactivation_date: Some(Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()),
    }
);

roundtrip_and_validate!(
    review_roundtrip,
    Review,
    Review {
        id: "rev-1".into(),
        grades: vec![Grade {
            name: "Overall".into(),
            score: 4.5,
            weight: 1.0,
        }],
        project: ReviewProject {
            id: "prj-9".into(),
            name: "Solar Kiosk".into(),
        },
        exhibition: ReviewExhibition {
            id: "exh-1".into(),
            name: "Science Fair 2025".into(),
        },
        user: ReviewerResume {
            id: "usr-7".into(),
            name: "Bruno".into(),
            role: ReviewerRole {
                id: "rol-judge".into(),
                name: "judge".into(),
                weight: 0.4,
            },
        },
        comment: Some("Clear pitch".into()),
        active: true,
        created_at: Utc.with_ymd_and_hms(2025, 9, 2, 10, 30, 0).unwrap(),
    }
);

roundtrip_and_validate!(
    company_roundtrip,
    Company,
    Company {
        id: "cmp-1".into(),
        name: "SunCo".into(),
    }
);

roundtrip_and_validate!(
    class_roundtrip,
    SchoolClass,
    SchoolClass {
        id: "cls-1".into(),
        name: "3A".into(),
        year: "2025".into(),
    }
);

roundtrip_and_validate!(
    knowledge_roundtrip,
    Knowledge,
    Knowledge {
        id: "knw-1".into(),
        name: "Robotics".into(),
    }
);

roundtrip_and_validate!(
    actor_roundtrip,
    ActorContext,
    ActorContext {
        user_id: "usr-7".into(),
        role_id: "rol-judge".into(),
        role_name: "judge".into(),
        role_weight: 0.4,
        permissions: vec!["read_review".into()],
    }
);

roundtrip_and_validate!(
    score_input_roundtrip,
    ScoreInput,
    ScoreInput {
        name: "Overall".into(),
        score: 3.0,
    }
);

#[test]
fn documents_written_without_lists_still_load() {
    let json = serde_json::json!({
        "id": "exh-2",
        "name": "Bare",
        "description": null,
        "image": null,
        "start_date": "2025-01-01T00:00:00Z",
        "end_date": "2025-01-02T00:00:00Z",
        "deactivation_date": null
    });
    let exhibition: Exhibition = serde_json::from_value(json).unwrap();
    assert!(exhibition.roles.is_empty());
    assert!(exhibition.projects.is_empty());
    assert!(exhibition.is_active());
}
