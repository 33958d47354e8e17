//! Annotation types shared by the reconciler, the stores, and the API.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

use crate::types::DbId;

/// Maximum serialized size of a single annotation body, in bytes.
pub const MAX_ANNOTATION_BODY_BYTES: usize = 65_536;

/// What an annotation is attached to: the whole record (manifest) or one
/// page (canvas) within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationTarget {
    Record,
    Page(i32),
}

impl AnnotationTarget {
    /// Build a target from an optional page order (None = whole record).
    pub fn from_page(page: Option<i32>) -> Self {
        match page {
            Some(order) => Self::Page(order),
            None => Self::Record,
        }
    }

    /// The page order this target refers to, if any.
    pub fn page(self) -> Option<i32> {
        match self {
            Self::Page(order) => Some(order),
            Self::Record => None,
        }
    }
}

/// A stored annotation for a (campaign, record, target).
///
/// `id` is None until the storage collaborator assigns one; equality for
/// reconciliation purposes is by id. The body is an opaque Web Annotation
/// payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentAnnotation {
    pub id: Option<DbId>,
    pub campaign_id: DbId,
    pub pi: String,
    /// 1-based page order; None targets the whole record.
    pub target_page: Option<i32>,
    pub body: serde_json::Value,
    pub access_condition: Option<String>,
}

/// An annotation as submitted by the client: an optional id plus the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedAnnotation {
    #[serde(default)]
    pub id: Option<DbId>,
    pub body: serde_json::Value,
}

/// Validate an annotation body.
///
/// The payload is opaque, but it must be a JSON object (Web Annotations
/// are) and must not exceed [`MAX_ANNOTATION_BODY_BYTES`] when serialized.
pub fn validate_annotation_body(body: &serde_json::Value) -> Result<(), CoreError> {
    if !body.is_object() {
        return Err(CoreError::Validation(
            "annotation body must be a JSON object".to_string(),
        ));
    }

    let size = body.to_string().len();
    if size > MAX_ANNOTATION_BODY_BYTES {
        return Err(CoreError::Validation(format!(
            "annotation body is {size} bytes, maximum is {MAX_ANNOTATION_BODY_BYTES}"
        )));
    }

    Ok(())
}
