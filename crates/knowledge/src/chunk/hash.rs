//! Content fingerprints stored alongside each chunk.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the chunk text, stored as `contentHash`.
pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}
