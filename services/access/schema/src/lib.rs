//! sea-orm entities for the access service.

pub mod access_grants;
pub mod locks;
pub mod open_attempts;
pub mod properties;
pub mod tokens;
pub mod users;
