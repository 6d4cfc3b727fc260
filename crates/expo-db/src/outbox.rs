//! Fan-out outbox: failed steps waiting to be retried.
//!
//! ```text
//! step fails ─► pending (attempts = 1, next_attempt_at = now + delay(1))
//!   reconcile ─► rebuilt from the current source
//!             ├► source gone or moved ─► row deleted (dropped)
//!             ├► step succeeds ────────► row deleted
//!             └► step fails ───────────► attempts += 1, rescheduled
//!                                         └► attempts == max_attempts ─► dead
//! ```
//!
//! A queued step carries the summary as it was when it failed. Reconcile
//! re-reads the source document and rebuilds the step before running it; the
//! captured summary is never replayed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use expo_core::entities::{
    Exhibition, Project, ProjectResume, Review, Role, RoleSummary, User, UserProjectResume,
    UserReviewResume,
};
use expo_core::enums::{EntityType, OutboxStatus};
use expo_core::ids::PREFIX_OUTBOX;

use crate::ExpoDb;
use crate::error::DatabaseError;
use crate::helpers::{format_timestamp, parse_datetime, parse_enum};
use crate::propagation::FanoutStep;
use crate::service::ExpoService;
use crate::store::{Collection, DocFilter};

/// A queued fan-out step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboxEntry {
    pub id: String,
    pub entity: EntityType,
    pub entity_id: String,
    pub step: FanoutStep,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub last_error: String,
    pub created_at: DateTime<Utc>,
    pub next_attempt_at: DateTime<Utc>,
}

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Due entries picked up in this pass.
    pub attempted: u32,
    /// Entries whose step succeeded and were removed.
    pub resolved: u32,
    /// Entries that failed again and were rescheduled.
    pub still_pending: u32,
    /// Entries that exhausted their attempts in this pass.
    pub dead: u32,
    /// Entries removed without running because their source is gone, being
    /// deleted, or has moved on.
    pub dropped: u32,
}

const SELECT_COLS: &str =
    "id, entity, entity_id, step, status, attempts, last_error, created_at, next_attempt_at";

fn row_to_entry(row: &libsql::Row) -> Result<OutboxEntry, DatabaseError> {
    Ok(OutboxEntry {
        id: row.get::<String>(0)?,
        entity: parse_enum(&row.get::<String>(1)?)?,
        entity_id: row.get::<String>(2)?,
        step: serde_json::from_str(&row.get::<String>(3)?)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        attempts: u32::try_from(row.get::<i64>(5)?).unwrap_or(u32::MAX),
        last_error: row.get::<String>(6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        next_attempt_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

impl ExpoService {
    /// Queue a failed step. Returns the outbox entry id.
    pub(crate) async fn enqueue_step(
        &self,
        entity: EntityType,
        entity_id: &str,
        step: &FanoutStep,
        error: &str,
    ) -> Result<String, DatabaseError> {
        let id = self.db().generate_id(PREFIX_OUTBOX).await?;
        let now = Utc::now();
        let delay = chrono::Duration::from_std(self.outbox_retry().delay_for(1))
            .unwrap_or_else(|_| chrono::Duration::zero());
        let step_json = serde_json::to_string(step)?;
        let created_at = format_timestamp(now);
        let next_attempt_at = format_timestamp(now + delay);

        self.db()
            .execute_with(
                "INSERT INTO fanout_outbox (id, entity, entity_id, step, status, attempts, last_error, created_at, next_attempt_at)
                 VALUES (?1, ?2, ?3, ?4, 'pending', 1, ?5, ?6, ?7)",
                || {
                    libsql::params![
                        id.as_str(),
                        entity.as_str(),
                        entity_id,
                        step_json.as_str(),
                        error,
                        created_at.as_str(),
                        next_attempt_at.as_str()
                    ]
                },
            )
            .await?;
        tracing::info!(outbox_id = %id, %entity, entity_id, step = step.name(), "fan-out step queued");
        Ok(id)
    }

    /// List outbox entries, oldest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_outbox(
        &self,
        status: Option<OutboxStatus>,
        limit: u32,
    ) -> Result<Vec<OutboxEntry>, DatabaseError> {
        let mut rows = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {SELECT_COLS} FROM fanout_outbox WHERE status = ?1 ORDER BY created_at, id LIMIT ?2"
                );
                self.db()
                    .query_with(&sql, || libsql::params![status.as_str(), i64::from(limit)])
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {SELECT_COLS} FROM fanout_outbox ORDER BY created_at, id LIMIT ?1"
                );
                self.db()
                    .query_with(&sql, || libsql::params![i64::from(limit)])
                    .await?
            }
        };

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }
        Ok(entries)
    }

    /// Retry up to `limit` due entries now.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the outbox itself cannot be read or updated.
    /// Step failures are not errors; they are counted in the report.
    pub async fn reconcile_outbox(&self, limit: u32) -> Result<ReconcileReport, DatabaseError> {
        self.reconcile_outbox_as_of(Utc::now(), limit).await
    }

    /// Retry up to `limit` pending entries due at `now`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::reconcile_outbox`].
    pub async fn reconcile_outbox_as_of(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<ReconcileReport, DatabaseError> {
        let due = self.due_entries(now, limit).await?;
        let mut report = ReconcileReport::default();

        for entry in due {
            report.attempted += 1;
            let outcome = match self.refresh_step(&entry.step).await {
                Ok(Some(step)) => self.db().apply_step(&step).await,
                Ok(None) => {
                    self.db()
                        .execute_with("DELETE FROM fanout_outbox WHERE id = ?1", || [entry.id.as_str()])
                        .await?;
                    tracing::debug!(outbox_id = %entry.id, step = entry.step.name(), "outbox entry no longer applies");
                    report.dropped += 1;
                    continue;
                }
                Err(e) => Err(e),
            };
            match outcome {
                Ok(written) => {
                    self.db()
                        .execute_with("DELETE FROM fanout_outbox WHERE id = ?1", || [entry.id.as_str()])
                        .await?;
                    tracing::debug!(outbox_id = %entry.id, step = entry.step.name(), written, "outbox entry resolved");
                    report.resolved += 1;
                }
                Err(e) => {
                    let attempts = entry.attempts.saturating_add(1);
                    let retry = self.outbox_retry();
                    let dead = attempts >= retry.max_attempts;
                    let status = if dead {
                        OutboxStatus::Dead
                    } else {
                        OutboxStatus::Pending
                    };
                    let delay = chrono::Duration::from_std(retry.delay_for(attempts))
                        .unwrap_or_else(|_| chrono::Duration::zero());
                    let next_attempt_at = format_timestamp(now + delay);
                    let error = e.to_string();

                    self.db()
                        .execute_with(
                            "UPDATE fanout_outbox SET status = ?1, attempts = ?2, last_error = ?3, next_attempt_at = ?4 WHERE id = ?5",
                            || {
                                libsql::params![
                                    status.as_str(),
                                    i64::from(attempts),
                                    error.as_str(),
                                    next_attempt_at.as_str(),
                                    entry.id.as_str()
                                ]
                            },
                        )
                        .await?;

                    if dead {
                        tracing::warn!(outbox_id = %entry.id, step = entry.step.name(), attempts, error = %e, "outbox entry exhausted its attempts");
                        report.dead += 1;
                    } else {
                        tracing::debug!(outbox_id = %entry.id, step = entry.step.name(), attempts, error = %e, "outbox entry rescheduled");
                        report.still_pending += 1;
                    }
                }
            }
        }

        if report.attempted > 0 {
            tracing::info!(
                attempted = report.attempted,
                resolved = report.resolved,
                still_pending = report.still_pending,
                dead = report.dead,
                dropped = report.dropped,
                "outbox reconciled"
            );
        }
        Ok(report)
    }

    /// Rebuild a queued step from the current state of its source document.
    ///
    /// Returns `None` when the step no longer applies.
    async fn refresh_step(&self, step: &FanoutStep) -> Result<Option<FanoutStep>, DatabaseError> {
        let db = self.db();
        let refreshed = match step {
            FanoutStep::SetUserProject { project, .. } => {
                live_project(db, &project.id)
                    .await?
                    .map(|p| FanoutStep::SetUserProject {
                        user_ids: p.expositor_ids(),
                        project: UserProjectResume::from(&p),
                    })
            }
            FanoutStep::DetachUsersFromProject { project_id, .. } => {
                let keep_user_ids = live_project(db, project_id)
                    .await?
                    .map(|p| p.expositor_ids())
                    .unwrap_or_default();
                Some(FanoutStep::DetachUsersFromProject {
                    project_id: project_id.clone(),
                    keep_user_ids,
                })
            }
            FanoutStep::AddProjectToExhibition {
                exhibition_id,
                project,
            } => live_project(db, &project.id)
                .await?
                .filter(|p| &p.exhibition_id == exhibition_id)
                .map(|p| FanoutStep::AddProjectToExhibition {
                    exhibition_id: exhibition_id.clone(),
                    project: ProjectResume::from(&p),
                }),
            FanoutStep::ReplaceProjectInExhibition {
                exhibition_id,
                project,
            } => live_project(db, &project.id)
                .await?
                .filter(|p| &p.exhibition_id == exhibition_id)
                .map(|p| FanoutStep::ReplaceProjectInExhibition {
                    exhibition_id: exhibition_id.clone(),
                    project: ProjectResume::from(&p),
                }),
            FanoutStep::RemoveProjectFromExhibition {
                exhibition_id,
                project_id,
            } => {
                let moved_back = live_project(db, project_id)
                    .await?
                    .is_some_and(|p| &p.exhibition_id == exhibition_id);
                (!moved_back).then(|| step.clone())
            }
            FanoutStep::RemoveFavoriteProject { project_id }
            | FanoutStep::DeactivateProjectReviews { project_id }
            | FanoutStep::DeleteProjectDocument { project_id } => {
                let live = live_project(db, project_id).await?.is_some();
                (!live).then(|| step.clone())
            }
            FanoutStep::RemoveExhibitionBanner { .. } => Some(step.clone()),
            FanoutStep::SyncRoleInUsers { role } => db
                .find_by_id::<Role>(&role.id)
                .await?
                .map(|r| FanoutStep::SyncRoleInUsers {
                    role: RoleSummary::from(&r),
                }),
            FanoutStep::SyncRoleInExhibitions { role_id, .. } => db
                .find_by_id::<Role>(role_id)
                .await?
                .map(|r| FanoutStep::SyncRoleInExhibitions {
                    role_id: r.id,
                    name: r.name,
                }),
            FanoutStep::SyncRoleInReviews { role_id, .. } => db
                .find_by_id::<Role>(role_id)
                .await?
                .map(|r| FanoutStep::SyncRoleInReviews {
                    role_id: r.id,
                    name: r.name,
                }),
            FanoutStep::UpsertUserReview { review, .. } => db
                .find_by_id::<Review>(&review.id)
                .await?
                .map(|r| FanoutStep::UpsertUserReview {
                    user_id: r.user.id.clone(),
                    review: UserReviewResume::from(&r),
                }),
            FanoutStep::PullUserReview {
                user_id,
                project_id,
            } => {
                let reviewed_again = db
                    .count(
                        Collection::Reviews,
                        &DocFilter::new()
                            .eq("$.user.id", user_id.as_str())
                            .eq("$.project.id", project_id.as_str()),
                    )
                    .await?
                    > 0;
                (!reviewed_again).then(|| step.clone())
            }
            FanoutStep::SyncUserInProjects { user_id, .. } => db
                .find_by_id::<User>(user_id)
                .await?
                .map(|u| FanoutStep::SyncUserInProjects {
                    user_id: u.id,
                    name: u.name,
                }),
            FanoutStep::SyncUserInReviews { user_id, .. } => db
                .find_by_id::<User>(user_id)
                .await?
                .map(|u| FanoutStep::SyncUserInReviews {
                    user_id: u.id,
                    name: u.name,
                }),
            FanoutStep::SyncExhibitionInReviews { exhibition_id, .. } => db
                .find_by_id::<Exhibition>(exhibition_id)
                .await?
                .map(|e| FanoutStep::SyncExhibitionInReviews {
                    exhibition_id: e.id,
                    name: e.name,
                }),
            FanoutStep::SyncProjectInReviews { project_id, .. } => live_project(db, project_id)
                .await?
                .map(|p| FanoutStep::SyncProjectInReviews {
                    project_id: p.id,
                    name: p.name,
                }),
        };
        Ok(refreshed)
    }

    async fn due_entries(&self, now: DateTime<Utc>, limit: u32) -> Result<Vec<OutboxEntry>, DatabaseError> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM fanout_outbox
             WHERE status = 'pending' AND next_attempt_at <= ?1
             ORDER BY created_at, id LIMIT ?2"
        );
        let at = format_timestamp(now);
        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params![at.as_str(), i64::from(limit)])
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }
        Ok(entries)
    }
}

/// The project, unless it is gone or stamped for deletion.
async fn live_project(db: &ExpoDb, id: &str) -> Result<Option<Project>, DatabaseError> {
    Ok(db
        .find_by_id::<Project>(id)
        .await?
        .filter(|p| p.deactivation_date.is_none()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::retry::RetryConfig;
    use crate::test_support::helpers::{sample_exhibition, sample_project, test_service};

    /// Stores project `prj-1` in `exhibition_id` and returns the step that
    /// embeds it there.
    async fn seeded_add_step(svc: &ExpoService, exhibition_id: &str) -> FanoutStep {
        let project = sample_project("prj-1", exhibition_id);
        svc.db().insert(&project).await.unwrap();
        FanoutStep::AddProjectToExhibition {
            exhibition_id: exhibition_id.into(),
            project: ProjectResume::from(&project),
        }
    }

    fn later() -> DateTime<Utc> {
        Utc::now() + chrono::Duration::hours(1)
    }

    #[tokio::test]
    async fn entries_are_not_due_before_their_delay() {
        let svc = test_service().await.with_outbox_retry(RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(600),
        });
        let step = seeded_add_step(&svc, "exh-1").await;
        svc.enqueue_step(EntityType::Project, "prj-1", &step, "boom")
            .await
            .unwrap();

        let report = svc.reconcile_outbox(10).await.unwrap();
        assert_eq!(report, ReconcileReport::default());

        let pending = svc.list_outbox(Some(OutboxStatus::Pending), 10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].last_error, "boom");
    }

    #[tokio::test]
    async fn resolved_entries_are_removed() {
        let svc = test_service().await;
        let step = seeded_add_step(&svc, "exh-1").await;
        svc.enqueue_step(EntityType::Project, "prj-1", &step, "exhibition missing")
            .await
            .unwrap();
        svc.db().insert(&sample_exhibition("exh-1")).await.unwrap();

        let report = svc.reconcile_outbox_as_of(later(), 10).await.unwrap();
        assert_eq!(
            report,
            ReconcileReport {
                attempted: 1,
                resolved: 1,
                still_pending: 0,
                dead: 0,
                dropped: 0,
            }
        );
        assert!(svc.list_outbox(None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replay_uses_the_current_project_not_the_queued_copy() {
        let svc = test_service().await;
        let step = seeded_add_step(&svc, "exh-1").await;
        svc.enqueue_step(EntityType::Project, "prj-1", &step, "exhibition missing")
            .await
            .unwrap();
        svc.db().insert(&sample_exhibition("exh-1")).await.unwrap();
        svc.db()
            .update_fields(Collection::Projects, "prj-1", &serde_json::json!({"name": "Renamed"}))
            .await
            .unwrap();

        svc.reconcile_outbox_as_of(later(), 10).await.unwrap();
        let exhibition: Exhibition = svc.db().find_by_id("exh-1").await.unwrap().unwrap();
        assert_eq!(exhibition.projects[0].name, "Renamed");
    }

    #[tokio::test]
    async fn steps_for_gone_or_moved_projects_are_dropped() {
        let svc = test_service().await;
        svc.db().insert(&sample_exhibition("exh-1")).await.unwrap();
        let step = seeded_add_step(&svc, "exh-1").await;
        svc.enqueue_step(EntityType::Project, "prj-1", &step, "e")
            .await
            .unwrap();
        svc.db()
            .update_fields(Collection::Projects, "prj-1", &serde_json::json!({"exhibition_id": "exh-2"}))
            .await
            .unwrap();

        let report = svc.reconcile_outbox_as_of(later(), 10).await.unwrap();
        assert_eq!((report.attempted, report.dropped), (1, 1));
        let exhibition: Exhibition = svc.db().find_by_id("exh-1").await.unwrap().unwrap();
        assert_eq!(exhibition.project_count("prj-1"), 0);

        svc.enqueue_step(EntityType::Project, "prj-1", &step, "e")
            .await
            .unwrap();
        svc.db().delete(Collection::Projects, "prj-1").await.unwrap();
        let report = svc.reconcile_outbox_as_of(later(), 10).await.unwrap();
        assert_eq!(report.dropped, 1);
        assert!(svc.list_outbox(None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_entries_go_dead_after_max_attempts() {
        let svc = test_service().await.with_outbox_retry(RetryConfig {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        });
        let step = seeded_add_step(&svc, "exh-nope").await;
        svc.enqueue_step(EntityType::Project, "prj-1", &step, "missing")
            .await
            .unwrap();

        let soon = Utc::now() + chrono::Duration::seconds(1);
        let first = svc.reconcile_outbox_as_of(soon, 10).await.unwrap();
        assert_eq!(first.still_pending, 1);
        let second = svc.reconcile_outbox_as_of(soon, 10).await.unwrap();
        assert_eq!(second.dead, 1);
        let third = svc.reconcile_outbox_as_of(soon, 10).await.unwrap();
        assert_eq!(third.attempted, 0);

        let dead = svc.list_outbox(Some(OutboxStatus::Dead), 10).await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].attempts, 3);
        assert!(dead[0].last_error.contains("exh-nope"));
    }

    #[tokio::test]
    async fn limit_caps_the_pass() {
        let svc = test_service().await;
        let step = seeded_add_step(&svc, "exh-x").await;
        for _ in 0..3 {
            svc.enqueue_step(EntityType::Project, "prj-1", &step, "e")
                .await
                .unwrap();
        }
        let report = svc.reconcile_outbox_as_of(later(), 2).await.unwrap();
        assert_eq!(report.attempted, 2);
    }
}
