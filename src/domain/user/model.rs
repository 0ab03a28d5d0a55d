//! User domain entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::errors::DomainError;

/// Fixed role enumeration. Declaration order is the canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    Teacher,
    #[default]
    Student,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::SuperAdmin, UserRole::Teacher, UserRole::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(DomainError::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

/// Learner, teacher or administrator account.
///
/// Identity comes from the external identity provider; `id` is the
/// provider's subject.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, allowed: &[UserRole]) -> bool {
        allowed.contains(&self.role)
    }

    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => self.email.clone().unwrap_or_else(|| self.id.clone()),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: "u-1".into(),
            email: Some("ayu@example.org".into()),
            first_name: Some("Ayu".into()),
            last_name: None,
            profile_image_url: None,
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_strings_match_the_fixed_enumeration() {
        let names: Vec<&str> = UserRole::ALL.iter().map(UserRole::as_str).collect();
        assert_eq!(names, ["super_admin", "teacher", "student"]);
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(matches!(
            "instructor".parse::<UserRole>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn default_role_is_student() {
        assert_eq!(UserRole::default(), UserRole::Student);
    }

    #[test]
    fn role_membership() {
        let teacher = sample_user(UserRole::Teacher);
        assert!(teacher.has_role(&[UserRole::SuperAdmin, UserRole::Teacher]));
        assert!(!teacher.has_role(&[UserRole::SuperAdmin]));
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let mut user = sample_user(UserRole::Student);
        assert_eq!(user.display_name(), "Ayu");
        user.first_name = None;
        assert_eq!(user.display_name(), "ayu@example.org");
    }
}
