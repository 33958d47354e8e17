//! Application services sitting between the HTTP handlers and the
//! storage/indexing collaborators.

pub mod annotations;
pub mod indexer;
pub mod status;
