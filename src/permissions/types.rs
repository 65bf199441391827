use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Role entity. Roles live independently of the users referencing them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

/// Persisted permission record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub module: String,
    pub action: String,
}

impl Permission {
    pub fn key(&self) -> PermissionKey {
        PermissionKey {
            module: self.module.clone(),
            action: self.action.clone(),
        }
    }
}

/// Structured module/action pair checked by set membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionKey {
    pub module: String,
    pub action: String,
}

impl PermissionKey {
    pub fn new(module: &str, action: &str) -> Self {
        Self {
            module: module.into(),
            action: action.into(),
        }
    }
}

pub type PermissionSet = HashSet<PermissionKey>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_is_by_module_action_pair() {
        let mut set = PermissionSet::new();
        set.insert(PermissionKey::new("sheets", "edit"));
        assert!(set.contains(&PermissionKey::new("sheets", "edit")));
        assert!(!set.contains(&PermissionKey::new("sheets", "delete")));
        assert!(!set.contains(&PermissionKey::new("users", "edit")));
    }
}
