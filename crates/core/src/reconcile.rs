//! Annotation reconciliation: the create/update/delete diff between a
//! client-submitted annotation set and the persisted set for one target.
//!
//! Reconciliation is always per target (whole record vs. a single page) so
//! that submitting one page's set can never delete another page's
//! annotations. Membership checks use id sets, so the diff is O(n) over
//! both lists.

use std::collections::HashSet;

use crate::annotation::{PersistentAnnotation, SubmittedAnnotation};
use crate::types::DbId;

/// The three disjoint sets a reconciliation pass produces.
#[derive(Debug, Default, PartialEq)]
pub struct AnnotationDiff {
    /// Submitted without a server-known id; assigned identity on save.
    pub to_create: Vec<SubmittedAnnotation>,
    /// Submitted with an id matching a stored annotation; body replaced.
    pub to_update: Vec<SubmittedAnnotation>,
    /// Stored ids missing from the submission: the user deleted them.
    pub to_delete: Vec<DbId>,
}

impl AnnotationDiff {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Compute the diff that makes `stored` match `submitted`.
///
/// A submitted annotation with an id the server does not know is treated as
/// a create: the id is meaningless until the store assigns one, so it is
/// dropped. Every annotation in `to_update` carries a `Some` id.
pub fn reconcile(
    stored: &[PersistentAnnotation],
    submitted: Vec<SubmittedAnnotation>,
) -> AnnotationDiff {
    let stored_ids: HashSet<DbId> = stored.iter().filter_map(|a| a.id).collect();

    let mut diff = AnnotationDiff::default();
    let mut kept_ids: HashSet<DbId> = HashSet::with_capacity(submitted.len());

    for annotation in submitted {
        match annotation.id {
            Some(id) if stored_ids.contains(&id) => {
                kept_ids.insert(id);
                diff.to_update.push(annotation);
            }
            Some(_) => {
                // Client-side id for an annotation we never persisted.
                diff.to_create.push(SubmittedAnnotation {
                    id: None,
                    body: annotation.body,
                });
            }
            None => diff.to_create.push(annotation),
        }
    }

    diff.to_delete = stored
        .iter()
        .filter_map(|a| a.id)
        .filter(|id| !kept_ids.contains(id))
        .collect();

    diff
}
