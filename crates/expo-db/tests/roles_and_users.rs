//! Role references, user lifecycle and access-link delivery.

mod common;

use std::sync::Arc;

use expo_core::enums::EntityType;
use expo_core::validation::{ScoreInput, ValidationError};
use expo_db::error::RepoError;
use expo_db::repos::exhibition::{NewExhibition, RoleWeight};
use expo_db::repos::project::NewProject;
use expo_db::repos::review::NewReview;
use expo_db::repos::role::NewRole;
use expo_db::repos::user::NewUser;
use expo_db::updates::role::RoleUpdateBuilder;
use expo_db::updates::user::UserUpdateBuilder;
use pretty_assertions::assert_eq;

use common::{
    FailingMailer, RecordingMailer, actor_for, admin, at, exhibition, role, service_with,
    test_service, user,
};

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn role_in_use_by_user_is_not_deleted() {
    let svc = test_service().await;
    let teacher = role(&svc, "teacher").await;
    user(&svc, "Ana", Some(&teacher.id)).await;

    let err = svc.delete_role(&teacher.id).await.unwrap_err();
    match err {
        RepoError::Validation(ValidationError::RoleInUse { entity, count, .. }) => {
            assert_eq!(entity, EntityType::User);
            assert_eq!(count, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(svc.get_role(&teacher.id).await.unwrap().name, "teacher");
}

#[tokio::test]
async fn role_in_use_by_exhibition_is_not_deleted() {
    let svc = test_service().await;
    let teacher = role(&svc, "teacher").await;
    svc.create_exhibition(NewExhibition {
        name: "Fair".into(),
        description: None,
        start_date: at(1),
        end_date: at(2),
        roles: vec![
            RoleWeight::new("default", 0.5),
            RoleWeight::new(&teacher.id, 0.5),
        ],
        criteria: vec![],
    })
    .await
    .unwrap();

    let err = svc.delete_role(&teacher.id).await.unwrap_err();
    assert_eq!(err.status_hint(), 409);
}

#[tokio::test]
async fn role_rename_reaches_exhibitions_and_reviews() {
    let svc = test_service().await;
    let teacher = role(&svc, "teacher").await;
    let exh = svc
        .create_exhibition(NewExhibition {
            name: "Fair".into(),
            description: None,
            start_date: at(1),
            end_date: at(2),
            roles: vec![
                RoleWeight::new("default", 0.7),
                RoleWeight::new(&teacher.id, 0.3),
            ],
            criteria: vec![],
        })
        .await
        .unwrap();
    let project = svc
        .create_project(NewProject {
            name: "Rover".into(),
            exhibition_id: exh.id.clone(),
            ..NewProject::default()
        })
        .await
        .unwrap();
    let judge = user(&svc, "Judge", Some(&teacher.id)).await;
    let review = svc
        .create_review(
            &actor_for(&judge),
            NewReview {
                exhibition_id: exh.id.clone(),
                project_id: project.id,
                grades: vec![ScoreInput {
                    name: "Overall".into(),
                    score: 4.0,
                }],
                comment: None,
            },
        )
        .await
        .unwrap();

    svc.update_role(&teacher.id, RoleUpdateBuilder::new().name("mentor").build())
        .await
        .unwrap();

    let exh = svc.get_exhibition(&exh.id).await.unwrap();
    let entry = exh.role_entry(&teacher.id).unwrap();
    assert_eq!(entry.name, "mentor");
    assert_eq!(entry.weight, 0.3);
    let review = svc.get_review(&review.id).await.unwrap();
    assert_eq!(review.user.role.name, "mentor");
    assert_eq!(review.user.role.weight, 0.3);
    assert_eq!(svc.get_user(&judge.id).await.unwrap().role.name, "mentor");
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_user_receives_access_link() {
    let mailer = Arc::new(RecordingMailer::default());
    let svc = service_with(mailer.clone()).await;

    let ana = user(&svc, "Ana", None).await;

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "ana@expo.test");
    assert_eq!(sent[0].display_name, "Ana");
    assert_eq!(sent[0].access_url, format!("https://expo.test/access/{}", ana.id));
}

#[tokio::test]
async fn failed_mail_removes_the_user() {
    let svc = service_with(Arc::new(FailingMailer)).await;

    let err = svc
        .create_user(
            &admin(),
            NewUser {
                email: "ana@expo.test".into(),
                password_hash: "hash".into(),
                name: "Ana".into(),
                ..NewUser::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::Mail(_)));
    assert!(svc.get_user_by_email("ana@expo.test").await.unwrap_err().is_not_found());
    assert!(svc.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn rename_reaches_projects_and_reviews() {
    let svc = test_service().await;
    let exh = exhibition(&svc, "Fair").await;
    let ana = user(&svc, "Ana", None).await;
    let project = svc
        .create_project(NewProject {
            name: "Rover".into(),
            exhibition_id: exh.id.clone(),
            expositor_ids: vec![ana.id.clone()],
            ..NewProject::default()
        })
        .await
        .unwrap();
    let review = svc
        .create_review(
            &actor_for(&ana),
            NewReview {
                exhibition_id: exh.id,
                project_id: project.id.clone(),
                grades: vec![ScoreInput {
                    name: "Overall".into(),
                    score: 2.0,
                }],
                comment: None,
            },
        )
        .await
        .unwrap();

    svc.update_user(&admin(), &ana.id, UserUpdateBuilder::new().name("Ana Lima").build())
        .await
        .unwrap();

    let project = svc.get_project(&project.id).await.unwrap();
    assert_eq!(project.expositors[0].name.as_deref(), Some("Ana Lima"));
    assert_eq!(svc.get_review(&review.id).await.unwrap().user.name, "Ana Lima");
}

#[tokio::test]
async fn role_change_embeds_new_summary() {
    let svc = test_service().await;
    let teacher = role(&svc, "teacher").await;
    let ana = user(&svc, "Ana", None).await;

    let updated = svc
        .update_user(&admin(), &ana.id, UserUpdateBuilder::new().role_id(&teacher.id).build())
        .await
        .unwrap();
    assert_eq!(updated.role.id, teacher.id);
    assert_eq!(svc.list_users_by_role(&teacher.id).await.unwrap().len(), 1);

    let organizer = svc
        .create_role(NewRole {
            name: "organizer".into(),
            permissions: vec!["delete_project".into()],
        })
        .await
        .unwrap();
    let err = svc
        .update_user(
            &actor_for(&updated),
            &ana.id,
            UserUpdateBuilder::new().role_id(&organizer.id).build(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_hint(), 403);
    assert_eq!(svc.get_user(&ana.id).await.unwrap().role.id, teacher.id);
}

#[tokio::test]
async fn email_taken_by_another_user_is_rejected() {
    let svc = test_service().await;
    let ana = user(&svc, "Ana", None).await;
    user(&svc, "Bo", None).await;

    let err = svc
        .update_user(&admin(), &ana.id, UserUpdateBuilder::new().email("BO@expo.test").build())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::DuplicateEmail(_))
    ));
    assert_eq!(svc.get_user(&ana.id).await.unwrap().email, "ana@expo.test");
}
