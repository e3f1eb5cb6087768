//! Teacher projection over user accounts.
//!
//! # Invariants
//! - A teacher exists for exactly the users whose role is `Teacher` or
//!   `GroupLeader`, with the same id, name and group.
//! - Never stored; always recomputed from the current user collection, so it
//!   cannot drift from the accounts it mirrors.

use super::{GroupId, User, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: UserId,
    pub name: String,
    pub group_id: Option<GroupId>,
}

impl Teacher {
    /// Projects one user; `None` for non-teacher roles.
    pub fn from_user(user: &User) -> Option<Self> {
        if !user.role.is_teacher() {
            return None;
        }
        Some(Self {
            id: user.id.clone(),
            name: user.name.clone(),
            group_id: user.group_id.clone(),
        })
    }
}

/// Projects every teacher-role user, preserving collection order.
pub fn project(users: &[User]) -> Vec<Teacher> {
    users.iter().filter_map(Teacher::from_user).collect()
}
