pub mod access;
pub mod attempt;
pub mod grant;
pub mod lock;
pub mod property;
pub mod token;
pub mod user;
