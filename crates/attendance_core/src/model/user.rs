//! User account model.
//!
//! # Invariants
//! - `group_id` is present iff `role` is `Teacher` or `GroupLeader`.
//! - `password` is stored and compared as plain text.

use super::{
    non_empty, require_text, Entity, EntityId, EntityKind, GroupId, Record, UserId,
    ValidationError,
};
use crate::store::Dataset;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Manages accounts, groups, academic years and activities.
    Admin,
    /// Records attendance for the teachers of one group.
    GroupLeader,
    /// Views own participation history.
    Teacher,
}

impl UserRole {
    /// Whether users with this role appear in the teacher projection.
    pub fn is_teacher(self) -> bool {
        matches!(self, Self::Teacher | Self::GroupLeader)
    }
}

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

/// Caller fields for a new user account.
///
/// Teacher and GroupLeader drafts must name an existing group through
/// [`NewUser::in_group`]; without one, `add` fails with
/// `ValidationError::MissingGroup`. Admin drafts never keep a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub role: UserRole,
    pub password: String,
    pub group_id: Option<GroupId>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, role: UserRole, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            password: password.into(),
            group_id: None,
        }
    }

    pub fn in_group(mut self, group_id: impl Into<GroupId>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
    type Draft = NewUser;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: EntityId, draft: NewUser) -> Self {
        Self {
            id,
            name: draft.name,
            role: draft.role,
            password: draft.password,
            group_id: draft.group_id,
        }
    }

    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.group_id = if self.role.is_teacher() {
            non_empty(self.group_id)
        } else {
            None
        };
        self
    }

    /// An empty incoming password means "keep the stored one".
    fn merge_update(mut self, existing: &Self) -> Self {
        if self.password.is_empty() {
            self.password = existing.password.clone();
        }
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.name, EntityKind::User, "name")?;
        require_text(&self.password, EntityKind::User, "password")?;
        if self.role.is_teacher() && self.group_id.is_none() {
            return Err(ValidationError::MissingGroup(self.id.clone()));
        }
        Ok(())
    }

    fn into_record(self) -> Record {
        Record::User(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::User(item) => Some(item),
            _ => None,
        }
    }

    fn collection(dataset: &Dataset) -> &[Self] {
        &dataset.users
    }

    fn collection_mut(dataset: &mut Dataset) -> &mut Vec<Self> {
        &mut dataset.users
    }
}

#[cfg(test)]
mod tests {
    use super::{NewUser, User, UserRole};
    use crate::model::{Entity, ValidationError};

    fn user(role: UserRole, group_id: Option<&str>) -> User {
        User::from_draft(
            "user-1".to_string(),
            NewUser {
                name: "  Alice ".to_string(),
                role,
                password: "secret".to_string(),
                group_id: group_id.map(str::to_string),
            },
        )
    }

    #[test]
    fn admin_never_keeps_a_group() {
        let admin = user(UserRole::Admin, Some("group-1")).normalized();
        assert_eq!(admin.group_id, None);
        assert_eq!(admin.name, "Alice");
        assert!(admin.validate().is_ok());
    }

    #[test]
    fn teacher_without_group_is_rejected() {
        let teacher = user(UserRole::Teacher, Some("")).normalized();
        assert_eq!(
            teacher.validate(),
            Err(ValidationError::MissingGroup("user-1".to_string()))
        );
    }

    #[test]
    fn empty_password_on_update_keeps_stored_value() {
        let stored = user(UserRole::Teacher, Some("group-1"));
        let mut incoming = stored.clone();
        incoming.password = String::new();
        incoming.name = "Alice B".to_string();

        let merged = incoming.merge_update(&stored);
        assert_eq!(merged.password, "secret");
        assert_eq!(merged.name, "Alice B");
    }

    #[test]
    fn role_classification_matches_projection_rule() {
        assert!(UserRole::Teacher.is_teacher());
        assert!(UserRole::GroupLeader.is_teacher());
        assert!(!UserRole::Admin.is_teacher());
    }
}
