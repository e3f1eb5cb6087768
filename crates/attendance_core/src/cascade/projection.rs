//! Teacher projection transitions on user writes.
//!
//! The projection itself is derived on every read, so nothing here mutates
//! state. Classifying the transition keeps role changes observable (logs,
//! callers that mirror teachers elsewhere) and pins down the rule table.

use crate::model::{Teacher, User, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionChange {
    /// User became (or was created as) a teacher-role account.
    Insert(Teacher),
    /// User stopped being (or was deleted as) a teacher-role account.
    ///
    /// Participation records are retained on demotion; only deletion of the
    /// account removes them.
    Remove(UserId),
    /// Teacher-role user changed; name or group may differ.
    Update(Teacher),
    /// Neither side is a teacher-role account.
    Unchanged,
}

impl ProjectionChange {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Remove(_) => "remove",
            Self::Update(_) => "update",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Classifies a user write. `before`/`after` are `None` for add/delete.
pub fn classify_projection(before: Option<&User>, after: Option<&User>) -> ProjectionChange {
    let was_teacher = before.is_some_and(|user| user.role.is_teacher());
    let is_teacher = after.is_some_and(|user| user.role.is_teacher());

    match (was_teacher, is_teacher, before, after) {
        (false, true, _, Some(user)) => Teacher::from_user(user)
            .map(ProjectionChange::Insert)
            .unwrap_or(ProjectionChange::Unchanged),
        (true, false, Some(user), _) => ProjectionChange::Remove(user.id.clone()),
        (true, true, _, Some(user)) => Teacher::from_user(user)
            .map(ProjectionChange::Update)
            .unwrap_or(ProjectionChange::Unchanged),
        _ => ProjectionChange::Unchanged,
    }
}
