//! Target URL validation.
//!
//! Full sanitization happens upstream; this is the defensive re-check run
//! before a URL is written to the store. Hostnames are not resolved.

use std::net::IpAddr;
use url::{Host, Url};

/// Longest accepted target URL, in bytes.
pub const MAX_URL_LENGTH: usize = 2048;

/// Reasons a target URL is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("URL cannot be empty")]
    Empty,

    #[error("URL too long (max {MAX_URL_LENGTH} characters)")]
    TooLong,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must have a host")]
    MissingHost,

    #[error("URL points at a local or private address")]
    LocalAddress,
}

/// Checks that `input` is an absolute http/https URL safe to redirect to.
///
/// # Errors
///
/// Returns the first [`UrlValidationError`] that applies.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_target_url("https://example.com/page").is_ok());
/// assert!(validate_target_url("javascript:alert(1)").is_err());
/// assert!(validate_target_url("http://127.0.0.1/admin").is_err());
/// ```
pub fn validate_target_url(input: &str) -> Result<(), UrlValidationError> {
    if input.is_empty() {
        return Err(UrlValidationError::Empty);
    }
    if input.len() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong);
    }

    let url = Url::parse(input).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    match url.host() {
        None => Err(UrlValidationError::MissingHost),
        Some(Host::Domain(domain)) => {
            let domain = domain.to_ascii_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") {
                Err(UrlValidationError::LocalAddress)
            } else {
                Ok(())
            }
        }
        Some(Host::Ipv4(ip)) => check_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => check_ip(IpAddr::V6(ip)),
    }
}

fn check_ip(ip: IpAddr) -> Result<(), UrlValidationError> {
    let local = match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_multicast()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || v6.is_unique_local()
                || v6.is_unicast_link_local()
        }
    };

    if local {
        Err(UrlValidationError::LocalAddress)
    } else {
        Ok(())
    }
}
