//! Short code generation and validation utilities.
//!
//! Provides cryptographically secure random code generation and the format
//! check shared by custom aliases and lookups.

use crate::error::AppError;
use base64::Engine as _;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Random bytes drawn per generated code.
const CODE_ENTROPY_BYTES: usize = 6;

/// Length of a generated code.
pub const GENERATED_CODE_LENGTH: usize = 6;

static CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{3,10}$").expect("static regex is valid"));

/// Generates a random short code.
///
/// Draws six bytes from the OS random source, encodes them as URL-safe
/// base64 and keeps the first six characters.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code()?;
/// assert_eq!(code.len(), 6);
/// assert!(is_valid_code(&code));
/// ```
pub fn generate_code() -> Result<String, AppError> {
    let mut buffer = [0u8; CODE_ENTROPY_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate random bytes",
            json!({ "reason": e.to_string() }),
        )
    })?;

    let mut code = base64::engine::general_purpose::URL_SAFE.encode(buffer);
    code.truncate(GENERATED_CODE_LENGTH);
    Ok(code)
}

/// Returns true if `code` is 3-10 characters of `[A-Za-z0-9_-]`.
pub fn is_valid_code(code: &str) -> bool {
    CODE_REGEX.is_match(code)
}

/// Validates a caller-supplied alias.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the alias is empty, has the wrong
/// length, or contains characters outside `[A-Za-z0-9_-]`.
pub fn validate_custom_alias(alias: &str) -> Result<(), AppError> {
    if alias.is_empty() {
        return Err(AppError::bad_request(
            "Custom alias cannot be empty",
            json!({}),
        ));
    }

    if !is_valid_code(alias) {
        return Err(AppError::bad_request(
            "Custom alias must be 3-10 characters: letters, digits, dash or underscore",
            json!({ "alias": alias }),
        ));
    }

    Ok(())
}
