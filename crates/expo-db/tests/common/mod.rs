//! Shared fixtures for expo-db integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use expo_core::entities::{Exhibition, Role, User};
use expo_core::enums::Permission;
use expo_core::identity::ActorContext;
use expo_db::external::{Collaborators, MailError, Mailer, ObjectStoreBlobs, StaticLinkIssuer};
use expo_db::repos::exhibition::NewExhibition;
use expo_db::repos::role::NewRole;
use expo_db::repos::user::NewUser;
use expo_db::service::ExpoService;

/// A sent access-link e-mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub recipient: String,
    pub display_name: String,
    pub access_url: String,
}

/// Records every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_access_link(
        &self,
        recipient: &str,
        display_name: &str,
        access_url: &str,
    ) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            display_name: display_name.to_string(),
            access_url: access_url.to_string(),
        });
        Ok(())
    }
}

/// Refuses every message.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_access_link(&self, _: &str, _: &str, _: &str) -> Result<(), MailError> {
        Err(MailError::Rejected {
            status: 503,
            body: "relay down".into(),
        })
    }
}

pub fn collaborators(mailer: Arc<dyn Mailer>) -> Collaborators {
    Collaborators {
        blobs: Arc::new(ObjectStoreBlobs::in_memory("https://cdn.test")),
        mailer,
        links: Arc::new(StaticLinkIssuer::new("https://expo.test/access")),
    }
}

pub async fn service_with(mailer: Arc<dyn Mailer>) -> ExpoService {
    ExpoService::new_local(":memory:", collaborators(mailer))
        .await
        .unwrap()
}

pub async fn test_service() -> ExpoService {
    service_with(Arc::new(RecordingMailer::default())).await
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

/// The actor a signed-in user would present.
pub fn actor_for(user: &User) -> ActorContext {
    ActorContext {
        user_id: user.id.clone(),
        role_id: user.role.id.clone(),
        role_name: user.role.name.clone(),
        role_weight: 0.0,
        permissions: user.role.permissions.clone(),
    }
}

pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, day, 9, 0, 0).unwrap()
}

pub async fn user(svc: &ExpoService, name: &str, role_id: Option<&str>) -> User {
    svc.create_user(
        &admin(),
        NewUser {
            email: format!("{}@expo.test", name.to_lowercase()),
            password_hash: "hash".into(),
            name: name.into(),
            role_id: role_id.map(String::from),
            ..NewUser::default()
        },
    )
    .await
    .unwrap()
}

pub async fn role(svc: &ExpoService, name: &str) -> Role {
    svc.create_role(NewRole {
        name: name.into(),
        permissions: vec![],
    })
    .await
    .unwrap()
}

/// An exhibition with the default role and a single criterion.
pub async fn exhibition(svc: &ExpoService, name: &str) -> Exhibition {
    svc.create_exhibition(NewExhibition {
        name: name.into(),
        description: None,
        start_date: at(1),
        end_date: at(3),
        roles: vec![],
        criteria: vec![],
    })
    .await
    .unwrap()
}
