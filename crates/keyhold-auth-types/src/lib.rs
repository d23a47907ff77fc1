//! Auth types shared across Keyhold services.
//!
//! Provides the `IdentityHeaders` extractor for gateway-injected caller identity.

pub mod identity;
