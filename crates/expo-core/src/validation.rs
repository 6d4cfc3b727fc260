//! Business-rule validation, run before any write reaches the store.
//!
//! Every check is a pure function of its inputs. A failing check returns a
//! [`ValidationError`] and the caller must not write anything.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{CriteriaResume, Grade, RoleResume};
use crate::enums::{EntityType, Permission};
use crate::ids::DEFAULT_ROLE_ID;

/// Maximum review comment length, in characters.
pub const MAX_COMMENT_CHARS: usize = 300;

/// Inclusive score bounds for a grade.
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 5.0;

/// Absolute tolerance applied when checking that weights sum to 1.0.
pub const DEFAULT_WEIGHT_TOLERANCE: f64 = 1e-6;

/// Which weighted list a weight error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightKind {
    Role,
    Criteria,
}

impl fmt::Display for WeightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Role => "role",
            Self::Criteria => "criteria",
        })
    }
}

/// A business invariant was violated. Raised before any write.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("end date {end} is before start date {start}")]
    DateOrder {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("{kind} weights sum to {sum}, expected 1.0")]
    WeightSum { kind: WeightKind, sum: f64 },

    #[error("default role '{DEFAULT_ROLE_ID}' must be present among the exhibition roles")]
    MissingDefaultRole,

    #[error("duplicate {kind} entry '{name}'")]
    DuplicateEntry { kind: WeightKind, name: String },

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("grades do not match the exhibition criteria (missing: {missing:?}, extra: {extra:?})")]
    CriteriaMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("score {score} for '{name}' is outside {MIN_SCORE}-{MAX_SCORE}")]
    ScoreOutOfRange { name: String, score: f64 },

    #[error("comment has {len} characters, at most {MAX_COMMENT_CHARS} allowed")]
    CommentTooLong { len: usize },

    #[error("email '{0}' is already registered")]
    DuplicateEmail(String),

    #[error("role '{role_id}' is still referenced by {count} {entity} document(s)")]
    RoleInUse {
        role_id: String,
        entity: EntityType,
        count: usize,
    },

    #[error("the default role cannot be deleted")]
    DefaultRoleProtected,

    #[error("unknown permission '{0}'")]
    UnknownPermission(String),

    #[error("project '{project_id}' does not belong to exhibition '{exhibition_id}'")]
    ProjectNotInExhibition {
        project_id: String,
        exhibition_id: String,
    },
}

/// A grade as submitted by a reviewer, before the criterion weight is copied in.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ScoreInput {
    pub name: String,
    pub score: f64,
}

/// Validation settings that vary by deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationRules {
    pub weight_tolerance: f64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            weight_tolerance: DEFAULT_WEIGHT_TOLERANCE,
        }
    }
}

impl ValidationRules {
    #[must_use]
    pub const fn new(weight_tolerance: f64) -> Self {
        Self { weight_tolerance }
    }

    /// Whether `weights` add up to 1.0 within the configured tolerance.
    #[must_use]
    pub fn sums_to_one(&self, weights: impl IntoIterator<Item = f64>) -> bool {
        let sum: f64 = weights.into_iter().sum();
        (sum - 1.0).abs() <= self.weight_tolerance
    }

    /// Role entries: unique ids, weights summing to 1.0, default role present.
    pub fn check_roles(&self, roles: &[RoleResume]) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for role in roles {
            if !seen.insert(role.id.as_str()) {
                return Err(ValidationError::DuplicateEntry {
                    kind: WeightKind::Role,
                    name: role.id.clone(),
                });
            }
        }
        if !seen.contains(DEFAULT_ROLE_ID) {
            return Err(ValidationError::MissingDefaultRole);
        }
        self.check_weight_sum(WeightKind::Role, roles.iter().map(|r| r.weight))
    }

    /// Criteria: non-empty unique names, weights summing to 1.0.
    pub fn check_criteria(&self, criteria: &[CriteriaResume]) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for c in criteria {
            if c.name.trim().is_empty() {
                return Err(ValidationError::EmptyField("criteria name"));
            }
            if !seen.insert(c.name.as_str()) {
                return Err(ValidationError::DuplicateEntry {
                    kind: WeightKind::Criteria,
                    name: c.name.clone(),
                });
            }
        }
        self.check_weight_sum(WeightKind::Criteria, criteria.iter().map(|c| c.weight))
    }

    fn check_weight_sum(
        &self,
        kind: WeightKind,
        weights: impl Iterator<Item = f64> + Clone,
    ) -> Result<(), ValidationError> {
        if self.sums_to_one(weights.clone()) {
            Ok(())
        } else {
            Err(ValidationError::WeightSum {
                kind,
                sum: weights.sum(),
            })
        }
    }
}

/// `end` must not precede `start`.
pub fn check_date_order(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::DateOrder { start, end });
    }
    Ok(())
}

/// Match submitted scores against the exhibition criteria and copy each
/// criterion's weight onto its grade.
///
/// The submitted name set must equal the criteria name set exactly; a name
/// submitted twice counts as extra.
pub fn grade_against_criteria(
    criteria: &[CriteriaResume],
    scores: &[ScoreInput],
) -> Result<Vec<Grade>, ValidationError> {
    let expected: BTreeSet<&str> = criteria.iter().map(|c| c.name.as_str()).collect();
    let mut submitted = BTreeSet::new();
    let mut extra = Vec::new();
    for s in scores {
        if !expected.contains(s.name.as_str()) || !submitted.insert(s.name.as_str()) {
            extra.push(s.name.clone());
        }
    }
    let missing: Vec<String> = expected
        .difference(&submitted)
        .map(|name| (*name).to_string())
        .collect();
    if !missing.is_empty() || !extra.is_empty() {
        return Err(ValidationError::CriteriaMismatch { missing, extra });
    }

    scores
        .iter()
        .map(|s| {
            if !(MIN_SCORE..=MAX_SCORE).contains(&s.score) {
                return Err(ValidationError::ScoreOutOfRange {
                    name: s.name.clone(),
                    score: s.score,
                });
            }
            let weight = criteria
                .iter()
                .find(|c| c.name == s.name)
                .map_or(0.0, |c| c.weight);
            Ok(Grade {
                name: s.name.clone(),
                score: s.score,
                weight,
            })
        })
        .collect()
}

/// Review comments are capped at [`MAX_COMMENT_CHARS`] characters.
pub fn check_comment(comment: Option<&str>) -> Result<(), ValidationError> {
    match comment {
        Some(c) if c.chars().count() > MAX_COMMENT_CHARS => Err(ValidationError::CommentTooLong {
            len: c.chars().count(),
        }),
        _ => Ok(()),
    }
}

/// Every permission string must name a known [`Permission`].
pub fn check_permissions(permissions: &[String]) -> Result<(), ValidationError> {
    for p in permissions {
        if p.parse::<Permission>().is_err() {
            return Err(ValidationError::UnknownPermission(p.clone()));
        }
    }
    Ok(())
}

/// Rejects blank required text fields.
pub fn check_not_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn role(id: &str, weight: f64) -> RoleResume {
        RoleResume {
            id: id.into(),
            name: id.into(),
            weight,
        }
    }

    fn criterion(name: &str, weight: f64) -> CriteriaResume {
        CriteriaResume {
            name: name.into(),
            weight,
        }
    }

    fn score(name: &str, score: f64) -> ScoreInput {
        ScoreInput {
            name: name.into(),
            score,
        }
    }

    #[test]
    fn roles_with_default_summing_to_one_pass() {
        let rules = ValidationRules::default();
        assert!(rules
            .check_roles(&[role("default", 0.6), role("r2", 0.4)])
            .is_ok());
    }

    #[test]
    fn roles_summing_below_one_fail() {
        let rules = ValidationRules::default();
        let err = rules
            .check_roles(&[role("default", 0.6), role("r2", 0.3)])
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::WeightSum {
                kind: WeightKind::Role,
                ..
            }
        ));
    }

    #[test]
    fn roles_without_default_fail() {
        let rules = ValidationRules::default();
        assert_eq!(
            rules.check_roles(&[role("r1", 0.5), role("r2", 0.5)]),
            Err(ValidationError::MissingDefaultRole)
        );
    }

    #[test]
    fn duplicate_role_ids_fail() {
        let rules = ValidationRules::default();
        assert!(matches!(
            rules.check_roles(&[role("default", 0.5), role("default", 0.5)]),
            Err(ValidationError::DuplicateEntry { .. })
        ));
    }

    #[test]
    fn tolerance_absorbs_float_accumulation() {
        let rules = ValidationRules::default();
        let tenths: Vec<CriteriaResume> = (0..10)
            .map(|i| criterion(&format!("c{i}"), 0.1))
            .collect();
        assert!(rules.check_criteria(&tenths).is_ok());

        let exact = ValidationRules::new(0.0);
        assert!(exact.check_criteria(&tenths).is_err());
    }

    #[rstest]
    #[case(&[("Idea", 0.5), ("Execution", 0.5)], true)]
    #[case(&[("Idea", 1.0)], true)]
    #[case(&[("Idea", 0.5), ("Execution", 0.4)], false)]
    #[case(&[("Idea", 0.5), ("Idea", 0.5)], false)]
    #[case(&[("", 1.0)], false)]
    #[case(&[], false)]
    fn criteria_cases(#[case] entries: &[(&str, f64)], #[case] ok: bool) {
        let rules = ValidationRules::default();
        let criteria: Vec<_> = entries.iter().map(|(n, w)| criterion(n, *w)).collect();
        assert_eq!(rules.check_criteria(&criteria).is_ok(), ok);
    }

    #[test]
    fn date_order() {
        let start = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 12, 0, 0, 0).unwrap();
        assert!(check_date_order(start, end).is_ok());
        assert!(check_date_order(start, start).is_ok());
        assert!(matches!(
            check_date_order(end, start),
            Err(ValidationError::DateOrder { .. })
        ));
    }

    #[test]
    fn grades_copy_weights_from_criteria() {
        let criteria = [criterion("Idea", 0.7), criterion("Execution", 0.3)];
        let grades =
            grade_against_criteria(&criteria, &[score("Execution", 3.0), score("Idea", 5.0)])
                .unwrap();
        assert_eq!(
            grades,
            vec![
                Grade {
                    name: "Execution".into(),
                    score: 3.0,
                    weight: 0.3
                },
                Grade {
                    name: "Idea".into(),
                    score: 5.0,
                    weight: 0.7
                },
            ]
        );
    }

    #[test]
    fn grades_report_missing_and_extra_names() {
        let criteria = [criterion("Idea", 0.5), criterion("Execution", 0.5)];
        let err =
            grade_against_criteria(&criteria, &[score("Idea", 4.0), score("Pitch", 4.0)])
                .unwrap_err();
        assert_eq!(
            err,
            ValidationError::CriteriaMismatch {
                missing: vec!["Execution".into()],
                extra: vec!["Pitch".into()],
            }
        );
    }

    #[test]
    fn repeated_grade_name_counts_as_extra() {
        let criteria = [criterion("Idea", 1.0)];
        let err = grade_against_criteria(&criteria, &[score("Idea", 4.0), score("Idea", 2.0)])
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::CriteriaMismatch {
                missing: vec![],
                extra: vec!["Idea".into()],
            }
        );
    }

    #[rstest]
    #[case(-0.5, false)]
    #[case(0.0, true)]
    #[case(5.0, true)]
    #[case(5.1, false)]
    fn score_bounds(#[case] value: f64, #[case] ok: bool) {
        let criteria = [criterion("Idea", 1.0)];
        assert_eq!(
            grade_against_criteria(&criteria, &[score("Idea", value)]).is_ok(),
            ok
        );
    }

    #[test]
    fn comment_length_counts_chars_not_bytes() {
        let accented = "é".repeat(MAX_COMMENT_CHARS);
        assert!(check_comment(Some(&accented)).is_ok());
        let long = "a".repeat(MAX_COMMENT_CHARS + 1);
        assert_eq!(
            check_comment(Some(&long)),
            Err(ValidationError::CommentTooLong { len: 301 })
        );
        assert!(check_comment(None).is_ok());
    }

    #[test]
    fn permissions_must_be_known() {
        assert!(check_permissions(&["read_role".into(), "create_review".into()]).is_ok());
        assert_eq!(
            check_permissions(&["read_role".into(), "fly".into()]),
            Err(ValidationError::UnknownPermission("fly".into()))
        );
    }

    #[test]
    fn blank_fields_rejected() {
        assert!(check_not_blank("name", "Expo").is_ok());
        assert_eq!(
            check_not_blank("name", "   "),
            Err(ValidationError::EmptyField("name"))
        );
    }
}
