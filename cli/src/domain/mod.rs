//! Domain layer — pure business logic, types, and naming rules.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod session;
pub mod teardown;

pub use config::{AwsConfig, SkiffConfig};
pub use error::{CatalogError, TargetError, TeardownError};
pub use session::{Credentials, Session};
pub use teardown::{
    ClusterRef, InstanceRef, StackInfo, StackLookup, TeardownReport, TeardownRequest,
    TeardownScope,
};
