use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::validation::{FieldErrors, NAME_MAX, Validate};

#[derive(Debug, Clone, Serialize)]
pub struct Secretariat {
    pub id: Uuid,
    pub mayoralty_id: Uuid,
    pub mayoralty_name: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecretariatInput {
    pub mayoralty_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Validate for SecretariatInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &self.name, NAME_MAX);
        errors.optional_email("email", self.email.as_deref());
        errors.optional_phone("phone", self.phone.as_deref());
        errors
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Subsecretariat {
    pub id: Uuid,
    pub secretariat_id: Uuid,
    pub secretariat_name: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubsecretariatInput {
    pub secretariat_id: Uuid,
    pub name: String,
}

impl Validate for SubsecretariatInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &self.name, NAME_MAX);
        errors
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Responsible {
    pub id: Uuid,
    pub secretariat_id: Uuid,
    pub secretariat_name: String,
    pub subsecretariat_id: Option<Uuid>,
    pub subsecretariat_name: Option<String>,
    pub full_name: String,
    pub position: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponsibleInput {
    pub secretariat_id: Uuid,
    pub subsecretariat_id: Option<Uuid>,
    pub full_name: String,
    pub position: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Validate for ResponsibleInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("full_name", &self.full_name, NAME_MAX);
        errors.require_text("position", &self.position, NAME_MAX);
        errors.optional_email("email", self.email.as_deref());
        errors.optional_phone("phone", self.phone.as_deref());
        errors
    }
}

impl From<&Secretariat> for SecretariatInput {
    fn from(s: &Secretariat) -> Self {
        Self {
            mayoralty_id: s.mayoralty_id,
            name: s.name.clone(),
            email: s.email.clone(),
            phone: s.phone.clone(),
        }
    }
}

impl From<&Subsecretariat> for SubsecretariatInput {
    fn from(s: &Subsecretariat) -> Self {
        Self {
            secretariat_id: s.secretariat_id,
            name: s.name.clone(),
        }
    }
}

impl From<&Responsible> for ResponsibleInput {
    fn from(r: &Responsible) -> Self {
        Self {
            secretariat_id: r.secretariat_id,
            subsecretariat_id: r.subsecretariat_id,
            full_name: r.full_name.clone(),
            position: r.position.clone(),
            email: r.email.clone(),
            phone: r.phone.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responsible_requires_name_and_position() {
        let input = ResponsibleInput {
            secretariat_id: Uuid::new_v4(),
            subsecretariat_id: None,
            full_name: " ".into(),
            position: "".into(),
            email: Some("bad@".into()),
            phone: None,
        };
        let errors = input.validate();
        assert!(errors.contains("full_name"));
        assert!(errors.contains("position"));
        assert!(errors.contains("email"));
    }

    #[test]
    fn secretariat_accepts_optional_contact() {
        let input = SecretariatInput {
            mayoralty_id: Uuid::new_v4(),
            name: "Secretaría de Hacienda".into(),
            email: None,
            phone: None,
        };
        assert!(input.validate().is_empty());
    }
}
