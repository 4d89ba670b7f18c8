//! Actors and roles
//!
//! The auth collaborator resolves who is calling; the core only receives an
//! [`Actor`] and checks its role against each operation's requirement.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Staff roles recognised by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "user_role", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Takes customer bookings
    Moderator,
    /// Approves bookings, payments and stock requests
    Accountant,
    /// Delivers bookings and requests new stock
    Storeman,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Moderator => "moderator",
            Role::Accountant => "accountant",
            Role::Storeman => "storeman",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "moderator" => Some(Role::Moderator),
            "accountant" => Some(Role::Accountant),
            "storeman" => Some(Role::Storeman),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller of a core operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    /// Fail with `Forbidden` unless the actor holds one of `allowed`
    pub fn require(&self, allowed: &[Role]) -> DomainResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(DomainError::Forbidden {
                required: allowed.to_vec(),
                actual: self.role,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in [Role::Moderator, Role::Accountant, Role::Storeman] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("admin"), None);
    }

    #[test]
    fn test_require_rejects_other_roles() {
        let actor = Actor::new(Uuid::new_v4(), Role::Moderator);
        assert!(actor.require(&[Role::Moderator]).is_ok());

        let err = actor.require(&[Role::Accountant]).unwrap_err();
        assert_eq!(
            err,
            DomainError::Forbidden {
                required: vec![Role::Accountant],
                actual: Role::Moderator,
            }
        );
    }
}
