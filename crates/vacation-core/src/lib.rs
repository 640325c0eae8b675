//! # Vacation MCP Core
//!
//! Transport-agnostic pieces of the vacation MCP gateway.
//!
//! ## Modules
//!
//! - `branding` - Product name and hardcoded fallbacks
//! - `token` - Bearer token decoding, expiry/signature checks, derived credential
//! - `domain` - Tool catalog, tool inputs, downstream response bodies
//! - `render` - Text rendering of downstream responses

pub mod branding;
pub mod domain;
pub mod render;
pub mod token;

pub use domain::*;
pub use token::{
    derive_credential, issue_token, validate_token, validate_token_at, CallerContext,
    DerivedCredential, SigningSecret, TokenError, TokenPayload,
};
