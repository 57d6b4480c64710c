use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::SapError;
use crate::serde::to_canonical_json_bytes;

/// Hex SHA-256 of the canonical JSON form of `value`.
///
/// Key order in maps and struct field order never change the result.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, SapError> {
    let bytes = to_canonical_json_bytes(value)?;
    Ok(hex::encode(Sha256::digest(bytes)))
}
