//! Stored password formats.
//!
//! Passwords are kept as plaintext unless `auth.hash_passwords` is enabled,
//! in which case new passwords are written as `blake3$<salt>$<hex digest>`.
//! Verification understands both forms, so a file can mix them.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::config::AuthConfig;

const BLAKE3_TAG: &str = "blake3";
const SEPARATOR: char = '$';
const SALT_LEN: usize = 16;

/// How newly written passwords are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordScheme {
    /// Store the password as typed.
    #[default]
    Plaintext,
    /// Store a salted BLAKE3 digest.
    SaltedBlake3,
}

impl PasswordScheme {
    /// Pick the scheme configured in `auth`.
    #[must_use]
    pub fn from_config(auth: &AuthConfig) -> Self {
        if auth.hash_passwords {
            Self::SaltedBlake3
        } else {
            Self::Plaintext
        }
    }

    /// Produce the stored form of `password`.
    #[must_use]
    pub fn seal(self, password: &str) -> String {
        match self {
            Self::Plaintext => password.to_string(),
            Self::SaltedBlake3 => {
                let salt = make_salt();
                let hash = digest(&salt, password);
                format!("{BLAKE3_TAG}{SEPARATOR}{salt}{SEPARATOR}{}", hash.to_hex())
            }
        }
    }
}

/// Check `candidate` against a stored password of either form.
#[must_use]
pub fn verify(stored: &str, candidate: &str) -> bool {
    let mut parts = stored.splitn(3, SEPARATOR);
    if parts.next() != Some(BLAKE3_TAG) {
        return stored == candidate;
    }

    let (Some(salt), Some(hex)) = (parts.next(), parts.next()) else {
        return false;
    };
    match blake3::Hash::from_hex(hex) {
        // `blake3::Hash` equality is constant-time.
        Ok(expected) => digest(salt, candidate) == expected,
        Err(_) => false,
    }
}

/// Whether `stored` is a digest rather than a plaintext password.
///
/// Plaintext passwords with this shape are refused at entry, so the answer
/// is unambiguous for anything written by this crate.
#[must_use]
pub fn is_sealed(stored: &str) -> bool {
    stored
        .split_once(SEPARATOR)
        .is_some_and(|(tag, _)| tag == BLAKE3_TAG)
}

fn digest(salt: &str, password: &str) -> blake3::Hash {
    blake3::Hasher::new()
        .update(salt.as_bytes())
        .update(password.as_bytes())
        .finalize()
}

/// Hex salt drawn from the operating system's random source.
fn make_salt() -> String {
    let mut bytes = [0u8; SALT_LEN / 2];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_from_config() {
        let mut auth = AuthConfig::default();
        assert_eq!(PasswordScheme::from_config(&auth), PasswordScheme::Plaintext);

        auth.hash_passwords = true;
        assert_eq!(
            PasswordScheme::from_config(&auth),
            PasswordScheme::SaltedBlake3
        );
    }

    #[test]
    fn test_plaintext_seal_and_verify() {
        let stored = PasswordScheme::Plaintext.seal("secret");
        assert_eq!(stored, "secret");
        assert!(verify(&stored, "secret"));
        assert!(!verify(&stored, "Secret"));
        assert!(!is_sealed(&stored));
    }

    #[test]
    fn test_blake3_seal_and_verify() {
        let stored = PasswordScheme::SaltedBlake3.seal("secret");

        assert!(stored.starts_with("blake3$"));
        assert!(!stored.contains(','));
        assert!(is_sealed(&stored));
        assert!(verify(&stored, "secret"));
        assert!(!verify(&stored, "secret "));
    }

    #[test]
    fn test_blake3_salts_are_random() {
        let a = PasswordScheme::SaltedBlake3.seal("same");
        let b = PasswordScheme::SaltedBlake3.seal("same");
        assert_ne!(a, b);
        assert!(verify(&a, "same"));
        assert!(verify(&b, "same"));
    }

    #[test]
    fn test_salt_shape() {
        let salt = make_salt();
        assert_eq!(salt.len(), SALT_LEN);
        assert!(salt.chars().all(|c: char| c.is_ascii_hexdigit()));
        assert_ne!(salt, make_salt());
    }

    #[test]
    fn test_verify_rejects_corrupt_digest() {
        assert!(!verify("blake3$abcd", "secret"));
        assert!(!verify("blake3$abcd$nothex", "secret"));
    }
}
