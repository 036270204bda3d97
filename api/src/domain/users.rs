use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::validation::{FieldErrors, NAME_MAX, Validate};

pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;

/// Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Planner,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Viewer, Role::Planner, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Planner => "planner",
            Role::Admin => "admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Viewer => "Viewer",
            Role::Planner => "Planner",
            Role::Admin => "Administrator",
        }
    }

    pub fn allows(&self, required: Role) -> bool {
        *self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "planner" => Ok(Role::Planner),
            "admin" => Ok(Role::Admin),
            other => anyhow::bail!("unknown role: {}", other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        errors.add(
            field,
            format!("Password must be at least {} characters", PASSWORD_MIN),
        );
    } else if len > PASSWORD_MAX {
        errors.add(
            field,
            format!("Password must be at most {} characters", PASSWORD_MAX),
        );
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password: String,
}

impl Validate for NewUser {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_email("email", &self.email);
        errors.require_text("name", &self.name, NAME_MAX);
        check_password(&mut errors, "password", &self.password);
        errors
    }
}

#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub name: String,
    pub role: Role,
    pub is_active: bool,
}

impl Validate for UserUpdate {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &self.name, NAME_MAX);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_ordered() {
        assert!(Role::Admin.allows(Role::Planner));
        assert!(Role::Planner.allows(Role::Planner));
        assert!(!Role::Viewer.allows(Role::Planner));
        assert!(!Role::Planner.allows(Role::Admin));
    }

    #[test]
    fn role_round_trips_through_text() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
        assert_eq!(" Admin ".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn new_user_checks_password_length() {
        let user = NewUser {
            email: "planner@example.gov.co".into(),
            name: "Planner".into(),
            role: Role::Planner,
            password: "short".into(),
        };
        assert!(user.validate().contains("password"));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ana@Example.GOV.co "), "ana@example.gov.co");
    }
}
