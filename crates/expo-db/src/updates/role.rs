//! Role update builder.

#[derive(Debug, Clone, Default)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
}

pub struct RoleUpdateBuilder(RoleUpdate);

impl RoleUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(RoleUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn permissions(mut self, permissions: Vec<String>) -> Self {
        self.0.permissions = Some(permissions);
        self
    }

    #[must_use]
    pub fn build(self) -> RoleUpdate {
        self.0
    }
}

impl Default for RoleUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
