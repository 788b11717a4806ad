// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SPKI pin computation — SHA-1 and SHA-256 over the SubjectPublicKeyInfo.

use certpins_core::types::{PinResult, SHA1_LEN, SHA256_LEN};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Compute both pins for the DER-encoded SubjectPublicKeyInfo `spki`.
///
/// Plain digests: no salt, no key, no truncation.  An empty slice is valid
/// input and yields the digests of the empty message.
pub fn compute_pins(spki: &[u8]) -> PinResult {
    let mut sha1 = [0u8; SHA1_LEN];
    sha1.copy_from_slice(&Sha1::digest(spki));

    let mut sha256 = [0u8; SHA256_LEN];
    sha256.copy_from_slice(&Sha256::digest(spki));

    PinResult { sha1, sha256 }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-1 of the empty byte slice (well-known constant).
    const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn pins_of_empty_input() {
        let pins = compute_pins(b"");
        assert_eq!(pins.sha1_hex(), EMPTY_SHA1);
        assert_eq!(pins.sha256_hex(), EMPTY_SHA256);
    }

    #[test]
    fn pins_of_known_value() {
        // SHA-1("hello") and SHA-256("hello") — verified against coreutils.
        let pins = compute_pins(b"hello");
        assert_eq!(pins.sha1_hex(), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
        assert_eq!(
            pins.sha256_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn pins_are_deterministic() {
        let spki = [0x30u8, 0x59, 0x30, 0x13, 0x06, 0x07];
        assert_eq!(compute_pins(&spki), compute_pins(&spki));
    }

    #[test]
    fn different_keys_different_pins() {
        assert_ne!(compute_pins(b"key-a"), compute_pins(b"key-b"));
    }
}
