use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role stored in `users.role` and carried in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            "user" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Set of roles a route accepts. Every protected route declares one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSet {
    /// Any authenticated identity.
    Any,
    Only(&'static [Role]),
}

impl RoleSet {
    pub const ANY: RoleSet = RoleSet::Any;
    pub const ADMIN: RoleSet = RoleSet::Only(&[Role::Admin]);
    pub const EDITORS: RoleSet = RoleSet::Only(&[Role::Admin, Role::Editor]);

    pub fn allows(&self, role: Role) -> bool {
        match self {
            RoleSet::Any => true,
            RoleSet::Only(roles) => roles.contains(&role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles_only() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("editor".parse::<Role>().unwrap(), Role::Editor);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("Admin".parse::<Role>().is_err());
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_sets_gate_membership() {
        assert!(RoleSet::ANY.allows(Role::User));
        assert!(RoleSet::EDITORS.allows(Role::Editor));
        assert!(RoleSet::EDITORS.allows(Role::Admin));
        assert!(!RoleSet::EDITORS.allows(Role::User));
        assert!(RoleSet::ADMIN.allows(Role::Admin));
        assert!(!RoleSet::ADMIN.allows(Role::Editor));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), "\"editor\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
