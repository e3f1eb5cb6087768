use crate::model::{Entity, EntityId};
use uuid::Uuid;

/// Generates `<prefix>-<uuid>` not yet used in `existing`.
pub(crate) fn fresh_id<T: Entity>(existing: &[T]) -> EntityId {
    loop {
        let candidate = format!("{}-{}", T::KIND.id_prefix(), Uuid::new_v4().simple());
        if !existing.iter().any(|item| item.id() == candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fresh_id;
    use crate::model::Group;

    #[test]
    fn fresh_id_uses_kind_prefix() {
        let id = fresh_id::<Group>(&[]);
        assert!(id.starts_with("group-"));
        assert_eq!(id.len(), "group-".len() + 32);
    }
}
