//! Error signature hashing.
//!
//! A signature is an error message with its variable parts replaced by
//! placeholder tokens. The store buckets groups by the SHA-256 of the
//! signature, so the hash must be computed from the exact signature string
//! the caller supplied, never from the raw error message.

use sha2::{Digest, Sha256};

/// Instructions shown to callers in tool descriptions.
pub const NORMALIZATION_GUIDE: &str = "\
Replace variable parts of the error message with placeholders:
- Class, type and component names -> {class}
- File paths and file names -> {file}
- Numeric or UUID identifiers -> {id}
- Line and column numbers -> {line}
- Quoted user values (variable names, keys, strings) -> {value}
- URLs and hostnames -> {url}
Keep the stable wording of the message intact.
Example: \"Cannot read properties of undefined (reading 'map') at UserList.tsx:42\"
      -> \"Cannot read properties of undefined (reading '{value}') at {file}:{line}\"";

/// Returns the lowercase hex SHA-256 of `signature`.
///
/// ```rust
/// use fixhive_core::signature::hash_signature;
///
/// let a = hash_signature("TypeError: {class} is not a function");
/// assert_eq!(a, hash_signature("TypeError: {class} is not a function"));
/// assert_eq!(a.len(), 64);
/// ```
pub fn hash_signature(signature: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signature.as_bytes());
    hex::encode(hasher.finalize())
}
