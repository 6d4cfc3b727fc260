//! User update builder.
//!
//! Serializes to an RFC 7396 merge patch: unset fields are omitted and
//! `Some(None)` becomes `null`, which removes the field from the document.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<Option<String>>,
    /// Resolved to an embedded role summary by the repository.
    #[serde(skip)]
    pub role_id: Option<String>,
}

impl UserUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.name.is_none()
            && self.phone.is_none()
            && self.profile_picture.is_none()
            && self.knowledge.is_none()
            && self.age.is_none()
            && self.company.is_none()
            && self.class_name.is_none()
            && self.role_id.is_none()
    }
}

pub struct UserUpdateBuilder(UserUpdate);

impl UserUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(UserUpdate::default())
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.0.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn password_hash(mut self, hash: impl Into<String>) -> Self {
        self.0.password_hash = Some(hash.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: Option<String>) -> Self {
        self.0.phone = Some(phone);
        self
    }

    #[must_use]
    pub fn profile_picture(mut self, url: Option<String>) -> Self {
        self.0.profile_picture = Some(url);
        self
    }

    #[must_use]
    pub fn knowledge(mut self, knowledge: Option<String>) -> Self {
        self.0.knowledge = Some(knowledge);
        self
    }

    #[must_use]
    pub fn age(mut self, age: Option<u32>) -> Self {
        self.0.age = Some(age);
        self
    }

    #[must_use]
    pub fn company(mut self, company: Option<String>) -> Self {
        self.0.company = Some(company);
        self
    }

    #[must_use]
    pub fn class_name(mut self, class_name: Option<String>) -> Self {
        self.0.class_name = Some(class_name);
        self
    }

    #[must_use]
    pub fn role_id(mut self, role_id: impl Into<String>) -> Self {
        self.0.role_id = Some(role_id.into());
        self
    }

    #[must_use]
    pub fn build(self) -> UserUpdate {
        self.0
    }
}

impl Default for UserUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
