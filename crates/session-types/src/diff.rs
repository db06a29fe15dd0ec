use crate::{ChangeSet, ComparableField, FieldEdit, Snapshot};

/// Compare the freshly fetched snapshot against the previous one.
///
/// Ids only in `new` are additions, ids only in `old` are removals. Ids in
/// both are checked field by field (exact string comparison) and produce one
/// `FieldEdit` per differing field. Output order follows session id, then
/// `ComparableField::ALL`.
pub fn diff_snapshots(new: &Snapshot, old: &Snapshot) -> ChangeSet {
    let mut changes = ChangeSet::default();
    let mut in_both = Vec::new();

    for (id, record) in new.iter() {
        match old.get(id) {
            None => changes.added.push(record.clone()),
            Some(previous) => in_both.push((previous, record)),
        }
    }

    for (id, record) in old.iter() {
        if !new.contains(id) {
            changes.removed.push(record.clone());
        }
    }

    for (previous, current) in in_both {
        for field in ComparableField::ALL {
            let before = field.value(previous);
            let after = field.value(current);
            if before != after {
                changes.edited.push(FieldEdit {
                    session_id: current.session_id.clone(),
                    field,
                    previous_value: before.to_string(),
                    current_value: after.to_string(),
                });
            }
        }
    }

    changes
}
