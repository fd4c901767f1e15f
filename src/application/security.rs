use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of the non-secret key slice stored as a lookup index.
pub const KEY_PREFIX_LEN: usize = 8;

const KEY_BYTES: usize = 32;

/// Generate a new raw API key: 32 bytes from the OS RNG, base64url encoded
/// without padding (43 URL-safe characters, 256 bits of entropy).
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex-encoded SHA-256 digest of a raw key. This is the only form of the
/// key that is ever persisted.
pub fn fingerprint(raw_key: &str) -> String {
    hex::encode(Sha256::digest(raw_key.as_bytes()))
}

/// Leading slice of a raw key, safe to store and log as a lookup index.
/// Returns `None` for inputs too short to ever verify.
pub fn key_prefix(raw_key: &str) -> Option<&str> {
    raw_key.get(..KEY_PREFIX_LEN)
}

/// Compare a raw key against a stored fingerprint in constant time, so the
/// comparison never leaks how many leading bytes matched.
pub fn fingerprint_matches(raw_key: &str, stored_hash: &str) -> bool {
    let computed = Sha256::digest(raw_key.as_bytes());
    let Ok(stored) = hex::decode(stored_hash) else {
        return false;
    };
    computed.as_slice().ct_eq(&stored).into()
}
