//! Fan-out failures are queued and converge once the fault clears.
//!
//! Faults are injected with a `BEFORE UPDATE` trigger that aborts every write
//! to one table.

mod common;

use chrono::{Duration, Utc};

use expo_core::enums::{EntityType, OutboxStatus};
use expo_db::error::RepoError;
use expo_db::propagation::FanoutStep;
use expo_db::repos::project::NewProject;
use expo_db::service::ExpoService;
use expo_db::updates::project::ProjectUpdateBuilder;
use pretty_assertions::assert_eq;

use common::{exhibition, test_service, user};

async fn block_writes(svc: &ExpoService, table: &str) {
    svc.db()
        .conn()
        .execute(
            &format!(
                "CREATE TRIGGER block_{table} BEFORE UPDATE ON {table}
                 BEGIN SELECT RAISE(ABORT, 'injected fault'); END"
            ),
            (),
        )
        .await
        .unwrap();
}

async fn unblock_writes(svc: &ExpoService, table: &str) {
    svc.db()
        .conn()
        .execute(&format!("DROP TRIGGER block_{table}"), ())
        .await
        .unwrap();
}

async fn block_exhibition_writes(svc: &ExpoService) {
    block_writes(svc, "exhibitions").await;
}

async fn unblock_exhibition_writes(svc: &ExpoService) {
    unblock_writes(svc, "exhibitions").await;
}

#[tokio::test]
async fn failed_add_is_reported_queued_and_reconciled() {
    let svc = test_service().await;
    let exh = exhibition(&svc, "Fair").await;
    let ana = user(&svc, "Ana", None).await;

    block_exhibition_writes(&svc).await;
    let err = svc
        .create_project(NewProject {
            name: "Rover".into(),
            exhibition_id: exh.id.clone(),
            expositor_ids: vec![ana.id.clone()],
            ..NewProject::default()
        })
        .await
        .unwrap_err();

    let RepoError::Propagation(failure) = err else {
        panic!("expected a propagation error");
    };
    assert_eq!(failure.entity, EntityType::Project);
    assert_eq!(failure.failures.len(), 1);
    assert!(matches!(
        failure.failures[0].step,
        FanoutStep::AddProjectToExhibition { .. }
    ));
    assert!(failure.failures[0].error.contains("injected fault"));
    assert!(failure.failures[0].outbox_id.is_some());

    // Primary write and the step before the failure are kept.
    let project = svc.get_project(&failure.id).await.unwrap();
    assert_eq!(svc.get_user(&ana.id).await.unwrap().project.unwrap().id, project.id);
    assert_eq!(svc.get_exhibition(&exh.id).await.unwrap().project_count(&project.id), 0);

    let pending = svc.list_outbox(Some(OutboxStatus::Pending), 10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].entity_id, project.id);

    unblock_exhibition_writes(&svc).await;
    let report = svc
        .reconcile_outbox_as_of(Utc::now() + Duration::hours(1), 10)
        .await
        .unwrap();
    assert_eq!(report.resolved, 1);

    assert_eq!(svc.get_exhibition(&exh.id).await.unwrap().project_count(&project.id), 1);
    assert!(svc.list_outbox(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_runs_every_step_despite_a_failure() {
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

    block_exhibition_writes(&svc).await;
    let err = svc.delete_project(&project.id).await.unwrap_err();
    assert!(matches!(err, RepoError::Propagation(ref p) if p.failures.len() == 1));

    // Later steps still ran.
    assert!(svc.get_project(&project.id).await.unwrap_err().is_not_found());
    assert!(svc.get_user(&ana.id).await.unwrap().project.is_none());
    assert_eq!(svc.get_exhibition(&exh.id).await.unwrap().project_count(&project.id), 1);

    unblock_exhibition_writes(&svc).await;
    svc.reconcile_outbox_as_of(Utc::now() + Duration::hours(1), 10)
        .await
        .unwrap();
    assert_eq!(svc.get_exhibition(&exh.id).await.unwrap().project_count(&project.id), 0);
    assert!(svc.list_outbox(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn replaying_a_resolved_step_is_harmless() {
    let svc = test_service().await;
    let exh = exhibition(&svc, "Fair").await;
    let project = svc
        .create_project(NewProject {
            name: "Rover".into(),
            exhibition_id: exh.id.clone(),
            ..NewProject::default()
        })
        .await
        .unwrap();

    let step = FanoutStep::AddProjectToExhibition {
        exhibition_id: exh.id.clone(),
        project: (&project).into(),
    };
    svc.db().apply_step(&step).await.unwrap();
    svc.db().apply_step(&step).await.unwrap();

    assert_eq!(svc.get_exhibition(&exh.id).await.unwrap().project_count(&project.id), 1);
}

#[tokio::test]
async fn queued_add_does_not_resurrect_a_deleted_project() {
    let svc = test_service().await;
    let exh = exhibition(&svc, "Fair").await;

    block_exhibition_writes(&svc).await;
    let err = svc
        .create_project(NewProject {
            name: "Rover".into(),
            exhibition_id: exh.id.clone(),
            ..NewProject::default()
        })
        .await
        .unwrap_err();
    let RepoError::Propagation(failure) = err else {
        panic!("expected a propagation error");
    };
    unblock_exhibition_writes(&svc).await;

    svc.delete_project(&failure.id).await.unwrap();
    let report = svc
        .reconcile_outbox_as_of(Utc::now() + Duration::hours(1), 10)
        .await
        .unwrap();
    assert_eq!(report.dropped, 1);

    let stored = svc.get_exhibition(&exh.id).await.unwrap();
    assert_eq!(stored.project_count(&failure.id), 0);
    assert!(svc.list_outbox(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn queued_summary_does_not_overwrite_a_newer_rename() {
    let svc = test_service().await;
    let exh = exhibition(&svc, "Fair").await;
    let ana = user(&svc, "Ana", None).await;
    let project = svc
        .create_project(NewProject {
            name: "A".into(),
            exhibition_id: exh.id.clone(),
            expositor_ids: vec![ana.id.clone()],
            ..NewProject::default()
        })
        .await
        .unwrap();

    block_writes(&svc, "users").await;
    let err = svc
        .update_project(&project.id, ProjectUpdateBuilder::new().name("B").build())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Propagation(ref p)
            if p.failures.iter().any(|f| matches!(f.step, FanoutStep::SetUserProject { .. }))
    ));
    unblock_writes(&svc, "users").await;

    svc.update_project(&project.id, ProjectUpdateBuilder::new().name("C").build())
        .await
        .unwrap();
    svc.reconcile_outbox_as_of(Utc::now() + Duration::hours(1), 10)
        .await
        .unwrap();

    assert_eq!(svc.get_project(&project.id).await.unwrap().name, "C");
    assert_eq!(svc.get_user(&ana.id).await.unwrap().project.unwrap().name, "C");
    let stored = svc.get_exhibition(&exh.id).await.unwrap();
    assert_eq!(stored.projects[0].name, "C");
    assert!(svc.list_outbox(None, 10).await.unwrap().is_empty());
}
