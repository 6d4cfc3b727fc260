//! Shared fixtures for expo-db unit tests.

pub(crate) mod helpers {
    use chrono::{TimeZone, Utc};

    use expo_core::entities::{
        CriteriaResume, Exhibition, ExpositorResume, Project, RoleResume, RoleSummary, User,
    };
    use expo_core::enums::Permission;
    use expo_core::identity::ActorContext;
    use expo_core::ids::{DEFAULT_ROLE_ID, DEFAULT_ROLE_NAME};

    use crate::ExpoDb;
    use crate::external::Collaborators;
    use crate::service::ExpoService;

    pub async fn test_db() -> ExpoDb {
        ExpoDb::open_local(":memory:").await.unwrap()
    }

    /// In-memory service with in-memory blobs and a log-only mailer.
    pub async fn test_service() -> ExpoService {
        ExpoService::from_db(test_db().await, Collaborators::in_memory("https://expo.test"))
    }

    pub fn admin() -> ActorContext {
        ActorContext {
            user_id: "usr-admin".into(),
            role_id: "rol-admin".into(),
            role_name: "admin".into(),
            role_weight: 1.0,
            permissions: Permission::ALL.iter().map(|p| p.as_str().to_string()).collect(),
        }
    }

    pub fn sample_user(id: &str, email: &str) -> User {
        User {
            id: id.into(),
            email: email.into(),
            password_hash: "hash".into(),
            name: format!("User {id}"),
            phone: None,
            role: RoleSummary {
                id: DEFAULT_ROLE_ID.into(),
                name: DEFAULT_ROLE_NAME.into(),
                permissions: Permission::default_strings(),
            },
            profile_picture: None,
            knowledge: None,
            age: None,
            company: None,
            class_name: None,
            project: None,
            reviews: vec![],
            favorited_projects: vec![],
            deactivation_date: None,
        }
    }

    pub fn sample_exhibition(id: &str) -> Exhibition {
        Exhibition {
            id: id.into(),
            name: format!("Exhibition {id}"),
            description: None,
            image: None,
            start_date: Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 9, 3, 18, 0, 0).unwrap(),
            deactivation_date: None,
            roles: vec![RoleResume {
                id: DEFAULT_ROLE_ID.into(),
                name: DEFAULT_ROLE_NAME.into(),
                weight: 1.0,
            }],
            criteria: vec![CriteriaResume {
                name: "Overall".into(),
                weight: 1.0,
            }],
            projects: vec![],
            banners: vec![],
        }
    }

    pub fn sample_project(id: &str, exhibition_id: &str) -> Project {
        Project {
            id: id.into(),
            name: format!("Project {id}"),
            company_name: None,
            description: "A project".into(),
            coordinates: Some(1),
            exhibition_id: exhibition_id.into(),
            expositors: vec![ExpositorResume {
                id: "usr-1".into(),
                name: Some("User usr-1".into()),
            }],
            images: vec![],
            logo: Some("https://cdn/logo.png".into()),
            deactivation_date: None,
        }
    }
}
