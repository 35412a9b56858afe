//! Utility functions for code generation, URL checks, and request handling.
//!
//! - [`code_generator`] - Short code generation and validation
//! - [`url_validator`] - Target URL re-validation
//! - [`client_ip`] - Client identity from forwarding headers or the peer address

pub mod client_ip;
pub mod code_generator;
pub mod url_validator;
