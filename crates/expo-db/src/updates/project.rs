//! Project update builder.

use expo_core::entities::Project;

#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub company_name: Option<Option<String>>,
    pub description: Option<String>,
    pub coordinates: Option<Option<i64>>,
    /// Moving the project to another exhibition.
    pub exhibition_id: Option<String>,
    /// Replaces the whole expositor list.
    pub expositor_ids: Option<Vec<String>>,
}

impl ProjectUpdate {
    /// Top-level document fields this update writes.
    pub(crate) fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.company_name.is_some() {
            fields.push("company_name");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.coordinates.is_some() {
            fields.push("coordinates");
        }
        if self.exhibition_id.is_some() {
            fields.push("exhibition_id");
        }
        if self.expositor_ids.is_some() {
            fields.push("expositors");
        }
        fields
    }

    /// Apply the scalar fields. Expositors are resolved by the repository.
    pub(crate) fn apply_scalars(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name.clone_from(name);
        }
        if let Some(company_name) = &self.company_name {
            project.company_name.clone_from(company_name);
        }
        if let Some(description) = &self.description {
            project.description.clone_from(description);
        }
        if let Some(coordinates) = self.coordinates {
            project.coordinates = coordinates;
        }
        if let Some(exhibition_id) = &self.exhibition_id {
            project.exhibition_id.clone_from(exhibition_id);
        }
    }
}

pub struct ProjectUpdateBuilder(ProjectUpdate);

impl ProjectUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ProjectUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn company_name(mut self, company_name: Option<String>) -> Self {
        self.0.company_name = Some(company_name);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.0.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn coordinates(mut self, coordinates: Option<i64>) -> Self {
        self.0.coordinates = Some(coordinates);
        self
    }

    #[must_use]
    pub fn exhibition_id(mut self, exhibition_id: impl Into<String>) -> Self {
        self.0.exhibition_id = Some(exhibition_id.into());
        self
    }

    #[must_use]
    pub fn expositor_ids(mut self, ids: Vec<String>) -> Self {
        self.0.expositor_ids = Some(ids);
        self
    }

    #[must_use]
    pub fn build(self) -> ProjectUpdate {
        self.0
    }
}

impl Default for ProjectUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
