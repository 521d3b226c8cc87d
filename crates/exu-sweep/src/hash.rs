use serde::Serialize;
use sha2::{Digest, Sha256};

use exu_core::errors::{ErrorInfo, ExuError};

/// Serializes a payload as canonical JSON bytes.
///
/// Object keys are emitted in sorted order with no insignificant
/// whitespace, so structurally equal payloads always produce identical
/// bytes regardless of construction order.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, ExuError> {
    let canonical = serde_json::to_value(value).map_err(|err| {
        ExuError::Serde(
            ErrorInfo::new("json-canonicalize", "failed to canonicalize payload")
                .with_hint(err.to_string()),
        )
    })?;
    serde_json::to_vec(&canonical).map_err(|err| {
        ExuError::Serde(
            ErrorInfo::new("json-encode", "failed to encode canonical json")
                .with_hint(err.to_string()),
        )
    })
}

/// Computes a stable hexadecimal hash for the provided serializable payload.
///
/// This is the identity used to deduplicate hyperparameter tuples in the
/// result registries.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, ExuError> {
    let bytes = to_canonical_json_bytes(value)?;
    let digest = Sha256::digest(bytes);
    Ok(format!("{:x}", digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_independent_of_key_order() {
        let a = json!({"alpha": 0.1, "lambda": 0.9});
        let b = json!({"lambda": 0.9, "alpha": 0.1});
        assert_eq!(
            stable_hash_string(&a).unwrap(),
            stable_hash_string(&b).unwrap()
        );
    }

    #[test]
    fn hash_distinguishes_values() {
        let a = json!({"alpha": 0.1});
        let b = json!({"alpha": 0.2});
        assert_ne!(
            stable_hash_string(&a).unwrap(),
            stable_hash_string(&b).unwrap()
        );
    }
}
