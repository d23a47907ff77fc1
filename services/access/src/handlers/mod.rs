pub mod access;
pub mod attempts;
pub mod grants;
pub mod locks;
pub mod properties;
pub mod tokens;
pub mod users;
