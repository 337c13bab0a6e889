//! PBKDF2-HMAC-SHA256 hashing with PHC-style string output.

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::apply_pepper;
use crate::hasher::PasswordHashAlgorithm;
use crate::policy::{AlgorithmPolicy, PBKDF2_MAX_HASH_LENGTH, PBKDF2_MAX_ITERATIONS, Pbkdf2Policy};
use crate::{Error, Result, TRACING_TARGET_HASHER};

/// Registry name of the PBKDF2 algorithm.
pub const PBKDF2_ALGORITHM_NAME: &str = "pbkdf2";

/// PHC identifier written into encoded hashes.
const PBKDF2_SHA256_IDENT: &str = "pbkdf2-sha256";

/// PBKDF2-HMAC-SHA256 password hasher.
///
/// Produces `$pbkdf2-sha256$i=<iterations>$<salt>$<hash>` strings, with salt
/// and hash in unpadded standard base64.
#[derive(Debug, Clone)]
pub struct Pbkdf2Hasher {
    policy: Pbkdf2Policy,
}

/// Decoded components of an encoded PBKDF2 hash.
struct Pbkdf2Hash {
    iterations: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl Pbkdf2Hash {
    fn parse(encoded: &str) -> Result<Self> {
        let malformed = |reason: &str| {
            tracing::warn!(
                target: TRACING_TARGET_HASHER,
                reason,
                "invalid password hash format provided"
            );
            Error::hashing().with_message("malformed password hash")
        };

        let mut parts = encoded.split('$');
        if parts.next() != Some("") {
            return Err(malformed("missing leading separator"));
        }

        match parts.next() {
            Some(PBKDF2_SHA256_IDENT) => {}
            Some(_) => {
                return Err(
                    Error::hashing().with_message("password hash was not produced by pbkdf2-sha256")
                );
            }
            None => return Err(malformed("missing algorithm identifier")),
        }

        let iterations = parts
            .next()
            .and_then(|param| param.strip_prefix("i="))
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|iterations| (1..=PBKDF2_MAX_ITERATIONS).contains(iterations))
            .ok_or_else(|| malformed("invalid iteration count"))?;

        let salt = parts
            .next()
            .and_then(|salt| STANDARD_NO_PAD.decode(salt).ok())
            .filter(|salt| !salt.is_empty())
            .ok_or_else(|| malformed("invalid salt encoding"))?;

        let hash = parts
            .next()
            .and_then(|hash| STANDARD_NO_PAD.decode(hash).ok())
            .filter(|hash| !hash.is_empty() && hash.len() <= PBKDF2_MAX_HASH_LENGTH)
            .ok_or_else(|| malformed("invalid hash encoding"))?;

        if parts.next().is_some() {
            return Err(malformed("unexpected trailing segment"));
        }

        Ok(Self {
            iterations,
            salt,
            hash,
        })
    }
}

impl Pbkdf2Hasher {
    /// Creates a hasher for the given policy.
    pub fn new(policy: Pbkdf2Policy) -> Self {
        Self { policy }
    }

    /// Creates a hasher from a registry policy.
    ///
    /// `Unspecified` falls back to [`Pbkdf2Policy::default`].
    ///
    /// # Errors
    ///
    /// Returns an `InvalidPolicyConfig` error for a policy of another family.
    pub fn from_policy(policy: AlgorithmPolicy) -> Result<Self> {
        match policy {
            AlgorithmPolicy::Pbkdf2(policy) => Ok(Self::new(policy)),
            AlgorithmPolicy::Unspecified => Ok(Self::new(Pbkdf2Policy::default())),
            other => Err(Error::invalid_policy_config().with_message(format!(
                "pbkdf2 hasher cannot be configured with a {} policy",
                other.family()
            ))),
        }
    }

    /// Returns the active policy.
    #[inline]
    pub fn policy(&self) -> &Pbkdf2Policy {
        &self.policy
    }

    fn derive(&self, password: &str, salt: &[u8], iterations: u32, output: &mut [u8]) {
        let peppered = apply_pepper(password, self.policy.pepper());
        pbkdf2::pbkdf2_hmac::<Sha256>(peppered.as_bytes(), salt, iterations, output);
    }
}

impl PasswordHashAlgorithm for Pbkdf2Hasher {
    fn name(&self) -> &'static str {
        PBKDF2_ALGORITHM_NAME
    }

    fn hash(&self, password: &str) -> Result<String> {
        if password.is_empty() {
            return Err(Error::hashing().with_message("password must not be empty"));
        }

        let mut salt = vec![0u8; self.policy.salt_length()];
        OsRng.try_fill_bytes(&mut salt).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_HASHER,
                error = %e,
                "failed to generate cryptographically secure salt"
            );

            Error::hashing()
                .with_message("password processing failed")
                .with_source(e)
        })?;

        let iterations = self.policy.iterations();
        let mut output = vec![0u8; self.policy.hash_length()];
        self.derive(password, &salt, iterations, &mut output);

        Ok(format!(
            "${PBKDF2_SHA256_IDENT}$i={iterations}${}${}",
            STANDARD_NO_PAD.encode(&salt),
            STANDARD_NO_PAD.encode(&output),
        ))
    }

    fn verify(&self, encoded: &str, password: &str) -> Result<bool> {
        let stored = Pbkdf2Hash::parse(encoded)?;
        if password.is_empty() {
            return Ok(false);
        }

        let mut computed = vec![0u8; stored.hash.len()];
        self.derive(password, &stored.salt, stored.iterations, &mut computed);

        let matches: bool = computed.ct_eq(&stored.hash).into();
        tracing::debug!(
            target: TRACING_TARGET_HASHER,
            matches,
            "pbkdf2 password verification completed"
        );

        Ok(matches)
    }

    fn needs_rehash(&self, encoded: &str) -> Result<bool> {
        let stored = Pbkdf2Hash::parse(encoded)?;
        Ok(stored.iterations != self.policy.iterations()
            || stored.hash.len() != self.policy.hash_length()
            || stored.salt.len() != self.policy.salt_length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::policy::Argon2Policy;

    fn cheap_hasher() -> anyhow::Result<Pbkdf2Hasher> {
        Ok(Pbkdf2Hasher::new(Pbkdf2Policy::new(1_000)?))
    }

    #[test]
    fn hash_and_verify_password() -> anyhow::Result<()> {
        let hasher = cheap_hasher()?;
        let hash = hasher.hash("my_secure_password")?;

        assert!(hash.starts_with("$pbkdf2-sha256$i=1000$"));
        assert!(hasher.verify(&hash, "my_secure_password")?);
        assert!(!hasher.verify(&hash, "wrong_password")?);
        assert!(!hasher.verify(&hash, "")?);
        Ok(())
    }

    #[test]
    fn different_salts_produce_different_hashes() -> anyhow::Result<()> {
        let hasher = cheap_hasher()?;
        assert_ne!(hasher.hash("password")?, hasher.hash("password")?);
        Ok(())
    }

    #[test]
    fn long_password_round_trips() -> anyhow::Result<()> {
        let hasher = cheap_hasher()?;
        let password = "a".repeat(1000);
        let hash = hasher.hash(&password)?;
        assert!(hasher.verify(&hash, &password)?);
        Ok(())
    }

    #[test]
    fn malformed_hashes_are_errors() -> anyhow::Result<()> {
        let hasher = cheap_hasher()?;
        for encoded in [
            "",
            "garbage",
            "$pbkdf2-sha256$1000$c2FsdA$aGFzaA",
            "$pbkdf2-sha256$i=abc$c2FsdA$aGFzaA",
            "$pbkdf2-sha256$i=1000$!!!$aGFzaA",
            "$pbkdf2-sha256$i=1000$c2FsdA$aGFzaA$extra",
        ] {
            let error = hasher.verify(encoded, "password").unwrap_err();
            assert_eq!(error.kind(), ErrorKind::HashingError, "{encoded}");
        }
        Ok(())
    }

    #[test]
    fn excessive_stored_iterations_are_an_error() -> anyhow::Result<()> {
        let hasher = cheap_hasher()?;
        let hash = hasher.hash("P@ssw0rd!")?;
        let inflated = hash.replace("$i=1000$", &format!("$i={}$", u32::MAX));

        let error = hasher.verify(&inflated, "P@ssw0rd!").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::HashingError);
        let error = hasher.needs_rehash(&inflated).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::HashingError);
        Ok(())
    }

    #[test]
    fn argon2_hash_is_an_error() -> anyhow::Result<()> {
        let hasher = cheap_hasher()?;
        let foreign = "$argon2id$v=19$m=1024,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNo";
        let error = hasher.verify(foreign, "password").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::HashingError);
        Ok(())
    }

    #[test]
    fn pepper_must_match() -> anyhow::Result<()> {
        let peppered = Pbkdf2Hasher::new(
            Pbkdf2Policy::builder()
                .with_iterations(1_000)
                .with_pepper("a-long-enough-pepper")
                .build()?,
        );
        let plain = cheap_hasher()?;

        let hash = peppered.hash("P@ssw0rd!")?;
        assert!(peppered.verify(&hash, "P@ssw0rd!")?);
        assert!(!plain.verify(&hash, "P@ssw0rd!")?);
        Ok(())
    }

    #[test]
    fn rehash_when_iterations_change() -> anyhow::Result<()> {
        let old = cheap_hasher()?;
        let hash = old.hash("P@ssw0rd!")?;
        assert!(!old.needs_rehash(&hash)?);

        let new = Pbkdf2Hasher::new(Pbkdf2Policy::new(2_000)?);
        assert!(new.verify(&hash, "P@ssw0rd!")?);
        assert!(new.needs_rehash(&hash)?);
        Ok(())
    }

    #[test]
    fn foreign_policy_is_rejected() {
        let policy = AlgorithmPolicy::Argon2(Argon2Policy::default());
        let error = Pbkdf2Hasher::from_policy(policy).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidPolicyConfig);
    }
}
