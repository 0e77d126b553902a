//! Acting identity passed to every lifecycle operation

use crate::{BarangayId, GovernanceAreaId, UserId};
use serde::{Deserialize, Serialize};

/// Roles known to the portal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Barangay user submitting the self-assessment
    BlguUser,
    /// Municipal assessor assigned to one governance area
    AreaAssessor,
    /// Administrator (period management, finalization)
    SystemAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::BlguUser => "blgu_user",
            Role::AreaAssessor => "area_assessor",
            Role::SystemAdmin => "system_admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blgu_user" | "blgu" => Ok(Role::BlguUser),
            "area_assessor" | "assessor" => Ok(Role::AreaAssessor),
            "system_admin" | "admin" => Ok(Role::SystemAdmin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// An authenticated caller.
///
/// `scope_id` is the barangay for BLGU users and the governance area for
/// assessors. Administrators carry no scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<String>,
}

impl Actor {
    pub fn blgu(user_id: impl Into<String>, barangay_id: &BarangayId) -> Self {
        Self {
            user_id: UserId::new(user_id),
            role: Role::BlguUser,
            scope_id: Some(barangay_id.as_str().to_string()),
        }
    }

    pub fn assessor(user_id: impl Into<String>, area_id: &GovernanceAreaId) -> Self {
        Self {
            user_id: UserId::new(user_id),
            role: Role::AreaAssessor,
            scope_id: Some(area_id.as_str().to_string()),
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            role: Role::SystemAdmin,
            scope_id: None,
        }
    }

    /// True if this actor is the BLGU user of the given barangay
    pub fn is_blgu_of(&self, barangay_id: &BarangayId) -> bool {
        self.role == Role::BlguUser && self.scope_id.as_deref() == Some(barangay_id.as_str())
    }

    /// True if this actor is the assessor of the given governance area
    pub fn is_assessor_of(&self, area_id: &GovernanceAreaId) -> bool {
        self.role == Role::AreaAssessor && self.scope_id.as_deref() == Some(area_id.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::SystemAdmin
    }

    /// Governance area scope, for assessors
    pub fn area_scope(&self) -> Option<GovernanceAreaId> {
        match self.role {
            Role::AreaAssessor => self.scope_id.as_deref().map(GovernanceAreaId::new),
            _ => None,
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope_id {
            Some(scope) => write!(f, "{}({}@{})", self.role, self.user_id, scope),
            None => write!(f, "{}({})", self.role, self.user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_accepts_short_forms() {
        assert_eq!("blgu".parse::<Role>().unwrap(), Role::BlguUser);
        assert_eq!("Area_Assessor".parse::<Role>().unwrap(), Role::AreaAssessor);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::SystemAdmin);
        assert!("mayor".parse::<Role>().is_err());
    }

    #[test]
    fn test_scope_checks() {
        let barangay = BarangayId::new("b-1");
        let area = GovernanceAreaId::new("financial-admin");

        let blgu = Actor::blgu("u1", &barangay);
        assert!(blgu.is_blgu_of(&barangay));
        assert!(!blgu.is_blgu_of(&BarangayId::new("b-2")));
        assert!(!blgu.is_assessor_of(&area));

        let assessor = Actor::assessor("u2", &area);
        assert!(assessor.is_assessor_of(&area));
        assert_eq!(assessor.area_scope(), Some(area));
        assert!(Actor::admin("root").area_scope().is_none());
    }
}
