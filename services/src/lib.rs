//! Small shared helpers: deterministic record ids and content fingerprints.

pub mod hash;
pub mod uuid;
