//! Storage key generation
//!
//! Object keys are never derived from client-supplied names. Each upload gets
//! a fresh slug drawn from the OS CSPRNG, so keys are unguessable and
//! collisions are not a practical concern.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Random bytes per slug. 32 bytes = 256 bits of entropy, which encodes to a
/// 43-character base64 slug.
const SLUG_RANDOM_BYTES: usize = 32;

/// Generate a storage key of the form `[prefix/]slug.ext`.
///
/// The slug is URL-safe base64 without padding, so the key can appear in a
/// URL path without percent-encoding. `extension` must not include the dot.
pub fn generate_object_key(prefix: Option<&str>, extension: &str) -> String {
    let mut raw = [0u8; SLUG_RANDOM_BYTES];
    rand::rng().fill_bytes(&mut raw);
    let slug = URL_SAFE_NO_PAD.encode(raw);

    match prefix {
        Some(prefix) => format!("{}/{}.{}", prefix, slug, extension),
        None => format!("{}.{}", slug, extension),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_format_with_prefix() {
        let key = generate_object_key(Some("landscape"), "mp4");
        let (prefix, rest) = key.split_once('/').unwrap();
        assert_eq!(prefix, "landscape");
        assert!(rest.ends_with(".mp4"));

        // 32 random bytes encode to 43 base64 characters without padding.
        let slug = rest.strip_suffix(".mp4").unwrap();
        assert_eq!(slug.len(), 43);
    }

    #[test]
    fn test_key_format_without_prefix() {
        let key = generate_object_key(None, "jpg");
        assert!(!key.contains('/'));
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn test_slug_is_url_safe() {
        for _ in 0..100 {
            let key = generate_object_key(None, "png");
            let slug = key.strip_suffix(".png").unwrap();
            assert!(
                slug.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
                "unexpected character in slug: {}",
                slug
            );
            assert!(!slug.contains('='));
        }
    }

    #[test]
    fn test_keys_do_not_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let key = generate_object_key(Some("other"), "mp4");
            assert!(seen.insert(key), "generated a duplicate key");
        }
    }
}
