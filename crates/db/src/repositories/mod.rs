//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument and return plain rows;
//! aggregate assembly and error mapping happen in `stores`.

pub mod annotation_repo;
pub mod campaign_repo;
pub mod log_repo;

pub use annotation_repo::AnnotationRepo;
pub use campaign_repo::CampaignRepo;
pub use log_repo::LogRepo;
