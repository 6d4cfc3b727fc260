//! Review update builder.

use expo_core::validation::ScoreInput;

#[derive(Debug, Clone, Default)]
pub struct ReviewUpdate {
    /// Re-validated against the exhibition's current criteria.
    pub grades: Option<Vec<ScoreInput>>,
    pub comment: Option<Option<String>>,
}

impl ReviewUpdate {
    /// Top-level document fields this update writes.
    pub(crate) fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.grades.is_some() {
            fields.push("grades");
        }
        if self.comment.is_some() {
            fields.push("comment");
        }
        fields
    }
}

pub struct ReviewUpdateBuilder(ReviewUpdate);

impl ReviewUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ReviewUpdate::default())
    }

    #[must_use]
    pub fn grades(mut self, grades: Vec<ScoreInput>) -> Self {
        self.0.grades = Some(grades);
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: Option<String>) -> Self {
        self.0.comment = Some(comment);
        self
    }

    #[must_use]
    pub fn build(self) -> ReviewUpdate {
        self.0
    }
}

impl Default for ReviewUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
