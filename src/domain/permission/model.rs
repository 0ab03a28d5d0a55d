//! Permission domain types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserRole;
use crate::shared::errors::DomainError;

/// Named capability gating an administrative or content action.
///
/// Declaration order is the canonical order used for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    ManageModules,
    ManageContent,
    ManageQuizzes,
    ManageAssignments,
    GradeAssignments,
    ViewAnalytics,
    ManageCertificates,
    ModerateForums,
    ManageEnrollments,
    SystemSettings,
    BackupData,
    ManageQuotes,
    ManageWebsiteSettings,
}

impl Permission {
    pub const ALL: [Permission; 14] = [
        Permission::ManageUsers,
        Permission::ManageModules,
        Permission::ManageContent,
        Permission::ManageQuizzes,
        Permission::ManageAssignments,
        Permission::GradeAssignments,
        Permission::ViewAnalytics,
        Permission::ManageCertificates,
        Permission::ModerateForums,
        Permission::ManageEnrollments,
        Permission::SystemSettings,
        Permission::BackupData,
        Permission::ManageQuotes,
        Permission::ManageWebsiteSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageUsers => "manage_users",
            Self::ManageModules => "manage_modules",
            Self::ManageContent => "manage_content",
            Self::ManageQuizzes => "manage_quizzes",
            Self::ManageAssignments => "manage_assignments",
            Self::GradeAssignments => "grade_assignments",
            Self::ViewAnalytics => "view_analytics",
            Self::ManageCertificates => "manage_certificates",
            Self::ModerateForums => "moderate_forums",
            Self::ManageEnrollments => "manage_enrollments",
            Self::SystemSettings => "system_settings",
            Self::BackupData => "backup_data",
            Self::ManageQuotes => "manage_quotes",
            Self::ManageWebsiteSettings => "manage_website_settings",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("Unknown permission '{}'", s)))
    }
}

/// Default role → permission table written by the seed routine.
pub fn default_role_permissions(role: UserRole) -> &'static [Permission] {
    const TEACHER: [Permission; 4] = [
        Permission::ManageContent,
        Permission::ManageQuizzes,
        Permission::GradeAssignments,
        Permission::ViewAnalytics,
    ];

    match role {
        UserRole::SuperAdmin => &Permission::ALL,
        UserRole::Teacher => &TEACHER,
        UserRole::Student => &[],
    }
}

/// Combine the role grant with an optional per-user override.
///
/// An override, when present, is authoritative in both directions: it can
/// revoke a role-granted permission or grant one the role lacks.
pub fn resolve(role_grants: bool, user_override: Option<bool>) -> bool {
    user_override.unwrap_or(role_grants)
}

/// Row of the role default table.
#[derive(Debug, Clone, PartialEq)]
pub struct RolePermission {
    pub id: i32,
    pub role: UserRole,
    pub permission: Permission,
    pub is_granted: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-user override of the role default for one permission.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPermission {
    pub id: i32,
    pub user_id: String,
    pub permission: Permission,
    pub is_granted: bool,
    pub granted_by: Option<String>,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserPermission {
    /// An expired override no longer takes part in resolution.
    pub fn is_in_effect(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

#[derive(Debug, Clone)]
pub struct NewUserOverride {
    pub user_id: String,
    pub permission: Permission,
    pub is_granted: bool,
    pub granted_by: Option<String>,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fourteen_permissions_in_canonical_order() {
        let names: Vec<&str> = Permission::ALL.iter().map(Permission::as_str).collect();
        assert_eq!(
            names,
            [
                "manage_users",
                "manage_modules",
                "manage_content",
                "manage_quizzes",
                "manage_assignments",
                "grade_assignments",
                "view_analytics",
                "manage_certificates",
                "moderate_forums",
                "manage_enrollments",
                "system_settings",
                "backup_data",
                "manage_quotes",
                "manage_website_settings",
            ]
        );
    }

    #[test]
    fn parses_every_permission_name() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
        }
        assert!("delete_everything".parse::<Permission>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&Permission::ManageWebsiteSettings).unwrap();
        assert_eq!(json, "\"manage_website_settings\"");
    }

    #[test]
    fn default_table() {
        assert_eq!(default_role_permissions(UserRole::SuperAdmin).len(), 14);
        assert_eq!(
            default_role_permissions(UserRole::Teacher),
            &[
                Permission::ManageContent,
                Permission::ManageQuizzes,
                Permission::GradeAssignments,
                Permission::ViewAnalytics,
            ]
        );
        assert!(default_role_permissions(UserRole::Student).is_empty());
    }

    #[test]
    fn override_wins_in_both_directions() {
        assert!(resolve(true, None));
        assert!(!resolve(false, None));
        assert!(!resolve(true, Some(false)));
        assert!(resolve(false, Some(true)));
        assert!(resolve(true, Some(true)));
        assert!(!resolve(false, Some(false)));
    }

    #[test]
    fn override_expiry() {
        let now = Utc::now();
        let mut o = UserPermission {
            id: 1,
            user_id: "u-1".into(),
            permission: Permission::ManageQuotes,
            is_granted: true,
            granted_by: None,
            reason: Some("quote curator".into()),
            expires_at: None,
            created_at: now,
        };
        assert!(o.is_in_effect(now));
        o.expires_at = Some(now + Duration::hours(1));
        assert!(o.is_in_effect(now));
        o.expires_at = Some(now);
        assert!(!o.is_in_effect(now));
    }
}
