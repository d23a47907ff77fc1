//! Service plumbing shared by Keyhold binaries: error envelope, health checks,
//! request ids, serde helpers and tracing setup.

pub mod error;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
