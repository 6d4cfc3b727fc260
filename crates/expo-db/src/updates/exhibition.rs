//! Exhibition update builder.

use chrono::{DateTime, Utc};

use expo_core::entities::CriteriaResume;

use crate::repos::exhibition::RoleWeight;

#[derive(Debug, Clone, Default)]
pub struct ExhibitionUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Replaces the whole weighted role list.
    pub roles: Option<Vec<RoleWeight>>,
    /// Replaces the whole criteria list. Existing reviews keep their grades.
    pub criteria: Option<Vec<CriteriaResume>>,
}

impl ExhibitionUpdate {
    /// Top-level document fields this update writes.
    pub(crate) fn fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("description", self.description.is_some()),
            ("start_date", self.start_date.is_some()),
            ("end_date", self.end_date.is_some()),
            ("roles", self.roles.is_some()),
            ("criteria", self.criteria.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, set)| set.then_some(field))
        .collect()
    }
}

pub struct ExhibitionUpdateBuilder(ExhibitionUpdate);

impl ExhibitionUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ExhibitionUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.0.description = Some(description);
        self
    }

    #[must_use]
    pub fn start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.0.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.0.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn roles(mut self, roles: Vec<RoleWeight>) -> Self {
        self.0.roles = Some(roles);
        self
    }

    #[must_use]
    pub fn criteria(mut self, criteria: Vec<CriteriaResume>) -> Self {
        self.0.criteria = Some(criteria);
        self
    }

    #[must_use]
    pub fn build(self) -> ExhibitionUpdate {
        self.0
    }
}

impl Default for ExhibitionUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
