//! URL handling module
//!
//! This module provides the sanitizer that guards every outbound fetch built
//! from user input, and the same-origin test used by link discovery.

mod origin;
mod sanitize;

pub use origin::same_origin;
pub use sanitize::{sanitize_url, sanitize_url_with, SanitizeOptions, SanitizedUrl};
