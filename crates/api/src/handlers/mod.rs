pub mod annotations;
pub mod log;
pub mod records;
