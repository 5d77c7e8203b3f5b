//! Command implementations

pub mod version;
pub mod workload;
