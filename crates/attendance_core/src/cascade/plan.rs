//! Deletion transition table and cascade planning.

use crate::model::{EntityId, EntityKind, GroupId};
use crate::store::Dataset;
use std::collections::BTreeSet;

/// What deleting a parent does to a dependent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Dependent row is deleted too, with its own cascade.
    Cascade,
    /// Dependent row survives with the reference cleared.
    ClearReference,
}

/// One edge of the transition table: `child` rows reference the parent.
#[derive(Debug, Clone, Copy)]
pub struct Dependency {
    pub child: EntityKind,
    pub action: OnDelete,
    select: fn(&Dataset, &str) -> Vec<EntityId>,
}

impl Dependency {
    /// Ids of `child` rows that reference `parent_id` through this edge.
    pub fn select(&self, dataset: &Dataset, parent_id: &str) -> Vec<EntityId> {
        (self.select)(dataset, parent_id)
    }
}

const ACADEMIC_YEAR_DEPENDENTS: &[Dependency] = &[Dependency {
    child: EntityKind::Activity,
    action: OnDelete::Cascade,
    select: activities_in_year,
}];

const ACTIVITY_DEPENDENTS: &[Dependency] = &[Dependency {
    child: EntityKind::ParticipationRecord,
    action: OnDelete::Cascade,
    select: records_for_activity,
}];

// Members are deleted as accounts, not just detached from the group.
const GROUP_DEPENDENTS: &[Dependency] = &[Dependency {
    child: EntityKind::User,
    action: OnDelete::Cascade,
    select: group_members,
}];

const USER_DEPENDENTS: &[Dependency] = &[
    Dependency {
        child: EntityKind::Group,
        action: OnDelete::ClearReference,
        select: groups_led_by,
    },
    Dependency {
        child: EntityKind::ParticipationRecord,
        action: OnDelete::Cascade,
        select: records_for_teacher,
    },
];

/// Transition table: the dependents of `kind`, in processing order.
pub fn dependents(kind: EntityKind) -> &'static [Dependency] {
    match kind {
        EntityKind::AcademicYear => ACADEMIC_YEAR_DEPENDENTS,
        EntityKind::Activity => ACTIVITY_DEPENDENTS,
        EntityKind::Group => GROUP_DEPENDENTS,
        EntityKind::User => USER_DEPENDENTS,
        EntityKind::ParticipationRecord => &[],
    }
}

/// One step of a removal plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeStep {
    /// Set `Group.leader_id` to none; the group survives.
    ClearGroupLeader { group_id: GroupId },
    /// Delete one row.
    Remove { kind: EntityKind, id: EntityId },
}

/// Ordered closure of a deletion. The last step removes the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPlan {
    pub kind: EntityKind,
    pub id: EntityId,
    pub steps: Vec<CascadeStep>,
}

impl RemovalPlan {
    /// Ids removed from one collection, in plan order.
    pub fn removed(&self, kind: EntityKind) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                CascadeStep::Remove { kind: step_kind, id } if *step_kind == kind => {
                    Some(id.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Groups whose leader reference is cleared.
    pub fn cleared_leaders(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                CascadeStep::ClearGroupLeader { group_id } => Some(group_id.as_str()),
                CascadeStep::Remove { .. } => None,
            })
            .collect()
    }
}

/// Plans the deletion of `kind`/`id` and everything that depends on it.
///
/// Returns `None` when the target does not exist in `dataset`.
pub fn plan_removal(dataset: &Dataset, kind: EntityKind, id: &str) -> Option<RemovalPlan> {
    if !exists(dataset, kind, id) {
        return None;
    }

    let mut planner = Planner {
        dataset,
        steps: Vec::new(),
        removed: BTreeSet::new(),
        cleared: BTreeSet::new(),
    };
    planner.visit(kind, id);

    Some(RemovalPlan {
        kind,
        id: id.to_string(),
        steps: planner.steps,
    })
}

struct Planner<'a> {
    dataset: &'a Dataset,
    steps: Vec<CascadeStep>,
    removed: BTreeSet<(EntityKind, EntityId)>,
    cleared: BTreeSet<GroupId>,
}

impl Planner<'_> {
    fn visit(&mut self, kind: EntityKind, id: &str) {
        if !self.removed.insert((kind, id.to_string())) {
            return;
        }

        for dependency in dependents(kind) {
            for child_id in dependency.select(self.dataset, id) {
                match dependency.action {
                    OnDelete::Cascade => self.visit(dependency.child, &child_id),
                    OnDelete::ClearReference => self.clear_leader(child_id),
                }
            }
        }

        self.steps.push(CascadeStep::Remove {
            kind,
            id: id.to_string(),
        });
    }

    fn clear_leader(&mut self, group_id: GroupId) {
        if self.cleared.insert(group_id.clone()) {
            self.steps.push(CascadeStep::ClearGroupLeader { group_id });
        }
    }
}

fn exists(dataset: &Dataset, kind: EntityKind, id: &str) -> bool {
    match kind {
        EntityKind::User => dataset.users.iter().any(|item| item.id == id),
        EntityKind::Group => dataset.groups.iter().any(|item| item.id == id),
        EntityKind::AcademicYear => dataset.academic_years.iter().any(|item| item.id == id),
        EntityKind::Activity => dataset.activities.iter().any(|item| item.id == id),
        EntityKind::ParticipationRecord => {
            dataset.participation_records.iter().any(|item| item.id == id)
        }
    }
}

fn activities_in_year(dataset: &Dataset, year_id: &str) -> Vec<EntityId> {
    dataset
        .activities
        .iter()
        .filter(|activity| activity.academic_year_id == year_id)
        .map(|activity| activity.id.clone())
        .collect()
}

fn records_for_activity(dataset: &Dataset, activity_id: &str) -> Vec<EntityId> {
    dataset
        .participation_records
        .iter()
        .filter(|record| record.activity_id == activity_id)
        .map(|record| record.id.clone())
        .collect()
}

fn group_members(dataset: &Dataset, group_id: &str) -> Vec<EntityId> {
    dataset
        .users
        .iter()
        .filter(|user| user.role.is_teacher() && user.group_id.as_deref() == Some(group_id))
        .map(|user| user.id.clone())
        .collect()
}

fn groups_led_by(dataset: &Dataset, user_id: &str) -> Vec<EntityId> {
    dataset
        .groups
        .iter()
        .filter(|group| group.leader_id.as_deref() == Some(user_id))
        .map(|group| group.id.clone())
        .collect()
}

fn records_for_teacher(dataset: &Dataset, user_id: &str) -> Vec<EntityId> {
    dataset
        .participation_records
        .iter()
        .filter(|record| record.teacher_id == user_id)
        .map(|record| record.id.clone())
        .collect()
}
