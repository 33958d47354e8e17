//! Quire domain core.
//!
//! Pure types and logic for crowdsourcing campaign coordination: the status
//! state machine, the campaign aggregate with record/page statistics, the
//! annotation reconciler, the edit-lock wire protocol, and the collaborator
//! traits (storage, reindexing) implemented by the outer crates. No I/O
//! happens here.

pub mod annotation;
pub mod campaign;
pub mod error;
pub mod lock;
pub mod log;
pub mod reconcile;
pub mod status;
pub mod store;
pub mod types;
