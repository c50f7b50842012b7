//! Shared configuration, session and token types for Postbox.
//!
//! This crate provides common pieces used across all other crates:
//! - Layered configuration loading
//! - Session claims carried by access tokens
//! - JWT issuance and validation

pub mod auth;
pub mod config;
pub mod jwt;

pub use auth::{Claims, Session};
pub use config::{JwtSettings, LogConfig, LogFormat, ServerConfig};
pub use jwt::{JwtConfig, JwtError, JwtService};
