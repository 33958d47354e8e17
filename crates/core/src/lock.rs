//! Edit-lock claims and the WebSocket message protocol for advisory page
//! locking.
//!
//! A claim says "this connection is currently editing this page". Claims
//! are advisory: nothing stops two connections from claiming the same page;
//! the coordinator only makes the collision visible so the UI can warn the
//! second editor. Claims are ephemeral and die with their connection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// A connection's claim on one page of one record.
///
/// Equality ignores which connection holds the claim: two claims are "the
/// same" iff campaign, record, and page match, which is exactly the
/// comparison used to detect distinct connections converging on a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditLock {
    pub campaign_id: DbId,
    pub record_id: String,
    pub page_index: i32,
}

impl EditLock {
    /// Whether this claim belongs to the same (campaign, record) scope.
    pub fn same_record(&self, campaign_id: DbId, record_id: &str) -> bool {
        self.campaign_id == campaign_id && self.record_id == record_id
    }
}

/// Occupancy marker for a page in a locked-pages notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    #[serde(rename = "LOCKED")]
    Locked,
}

/// Page index to occupancy, as pushed to clients. Integer keys serialize
/// as JSON strings, e.g. `{"1":"LOCKED"}`.
pub type LockedPages = BTreeMap<i32, LockState>;

/// Messages exchanged over the edit-lock WebSocket.
///
/// Serialized as JSON with an internally-tagged `"type"` discriminator so
/// the frontend can route messages by type string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum LockMessage {
    /// Client sends: user is editing this page now. Sent on entering a
    /// page and periodically as a keep-alive; replaces any prior claim
    /// held by the same connection.
    #[serde(rename = "page.claim")]
    ClaimPage {
        campaign_id: DbId,
        record_id: String,
        page_index: i32,
    },

    /// Server pushes: pages of this record currently claimed by other
    /// connections.
    #[serde(rename = "pages.locked")]
    LockedPages {
        campaign_id: DbId,
        record_id: String,
        #[serde(deserialize_with = "de_locked_pages")]
        locked: LockedPages,
    },
}

/// Deserialize a locked-pages map from its wire form, where the integer
/// page indices are JSON string keys. The internally-tagged `LockMessage`
/// buffers its content before dispatch, which bypasses serde_json's usual
/// string-to-integer map-key coercion, so the keys must be parsed here.
fn de_locked_pages<'de, D>(deserializer: D) -> Result<LockedPages, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw = BTreeMap::<String, LockState>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(k, v)| {
            k.parse::<i32>()
                .map(|k| (k, v))
                .map_err(|_| D::Error::custom(format!("invalid page index key: {k:?}")))
        })
        .collect()
}
