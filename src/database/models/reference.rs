use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::RoleSet;

/// `(id, name)` row shared by every reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReferenceEntry {
    pub id: i64,
    pub name: String,
}

/// Roles required to mutate a reference table. Reads are open to any role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePolicy {
    pub read: RoleSet,
    pub write: RoleSet,
    pub delete: RoleSet,
}

/// The closed set of lookup tables served by the generic controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceTable {
    Positions,
    Professions,
    Education,
    Genders,
    Actions,
}

impl ReferenceTable {
    pub const ALL: [ReferenceTable; 5] = [
        ReferenceTable::Positions,
        ReferenceTable::Professions,
        ReferenceTable::Education,
        ReferenceTable::Genders,
        ReferenceTable::Actions,
    ];

    /// Physical table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            ReferenceTable::Positions => "position",
            ReferenceTable::Professions => "prof",
            ReferenceTable::Education => "education",
            ReferenceTable::Genders => "gender",
            ReferenceTable::Actions => "actions",
        }
    }

    /// Path segment under `/api`.
    pub fn route_segment(&self) -> &'static str {
        match self {
            ReferenceTable::Positions => "positions",
            ReferenceTable::Professions => "professions",
            ReferenceTable::Education => "education",
            ReferenceTable::Genders => "genders",
            ReferenceTable::Actions => "actions",
        }
    }

    pub fn policy(&self) -> ReferencePolicy {
        match self {
            ReferenceTable::Positions | ReferenceTable::Professions | ReferenceTable::Education => {
                ReferencePolicy {
                    read: RoleSet::ANY,
                    write: RoleSet::EDITORS,
                    delete: RoleSet::EDITORS,
                }
            }
            ReferenceTable::Genders | ReferenceTable::Actions => ReferencePolicy {
                read: RoleSet::ANY,
                write: RoleSet::EDITORS,
                delete: RoleSet::ADMIN,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn table_names_are_unique() {
        let mut names: Vec<_> = ReferenceTable::ALL.iter().map(|t| t.table_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ReferenceTable::ALL.len());
    }

    #[test]
    fn genders_and_actions_delete_is_admin_only() {
        for table in [ReferenceTable::Genders, ReferenceTable::Actions] {
            let policy = table.policy();
            assert!(policy.write.allows(Role::Editor));
            assert!(!policy.delete.allows(Role::Editor));
            assert!(policy.delete.allows(Role::Admin));
        }
        let positions = ReferenceTable::Positions.policy();
        assert!(positions.delete.allows(Role::Editor));
        assert!(!positions.write.allows(Role::User));
    }

    #[test]
    fn every_table_is_readable_by_plain_users() {
        for table in ReferenceTable::ALL {
            assert!(table.policy().read.allows(Role::User), "{:?}", table);
        }
    }
}
