//! HTTP Module
//!
//! Uncached transport: verbs, auth-header injection, timeout and error
//! normalization.

mod auth;
mod client;
mod response;

pub use auth::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use client::{HttpClient, UnauthorizedHook};
pub use response::{ApiResponse, RequestBody, RequestOptions};
