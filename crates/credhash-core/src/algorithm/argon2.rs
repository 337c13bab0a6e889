//! Argon2id hashing with PHC string output.

use std::fmt;

use argon2::password_hash::Output;
use argon2::{ARGON2ID_IDENT, Algorithm, Argon2, Block, Params, PasswordHash, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

use super::apply_pepper;
use crate::hasher::PasswordHashAlgorithm;
use crate::policy::{
    ARGON2_MAX_MEMORY, ARGON2_MAX_PARALLELISM, ARGON2_MAX_SALT_LENGTH, ARGON2_MAX_TIME_COST,
    AlgorithmPolicy, Argon2Policy,
};
use crate::{Error, Result, TRACING_TARGET_HASHER};

/// Registry name of the Argon2id algorithm.
pub const ARGON2_ALGORITHM_NAME: &str = "argon2";

/// Argon2id (v0x13) password hasher.
///
/// Produces `$argon2id$v=19$m=<m>,t=<t>,p=<p>$<salt>$<hash>` strings.
#[derive(Clone)]
pub struct Argon2Hasher {
    policy: Argon2Policy,
    params: Params,
}

/// Cost parameters and version read from a stored hash.
struct StoredParams {
    params: Params,
    version: Version,
}

impl Argon2Hasher {
    /// Creates a hasher for the given policy.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidPolicyConfig` error if the primitive rejects the
    /// cost parameters.
    pub fn new(policy: Argon2Policy) -> Result<Self> {
        let params = Params::new(
            policy.memory_cost(),
            policy.time_cost(),
            policy.parallelism(),
            Some(policy.hash_length()),
        )
        .map_err(|e| {
            Error::invalid_policy_config()
                .with_message("argon2 rejected the cost parameters")
                .with_source(e)
        })?;

        Ok(Self { policy, params })
    }

    /// Creates a hasher from a registry policy.
    ///
    /// `Unspecified` falls back to [`Argon2Policy::default`].
    ///
    /// # Errors
    ///
    /// Returns an `InvalidPolicyConfig` error for a policy of another family.
    pub fn from_policy(policy: AlgorithmPolicy) -> Result<Self> {
        match policy {
            AlgorithmPolicy::Argon2(policy) => Self::new(policy),
            AlgorithmPolicy::Unspecified => Self::new(Argon2Policy::default()),
            other => Err(Error::invalid_policy_config().with_message(format!(
                "argon2 hasher cannot be configured with a {} policy",
                other.family()
            ))),
        }
    }

    /// Returns the active policy.
    #[inline]
    pub fn policy(&self) -> &Argon2Policy {
        &self.policy
    }

    fn generate_salt(&self) -> Result<Vec<u8>> {
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

        Ok(salt)
    }

    /// Runs Argon2id into `output`, allocating the memory blocks fallibly.
    fn derive(
        params: Params,
        version: Version,
        password: &[u8],
        salt: &[u8],
        output: &mut [u8],
    ) -> Result<()> {
        let block_count = params.block_count();
        let mut blocks: Vec<Block> = Vec::new();
        blocks.try_reserve_exact(block_count).map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_HASHER,
                error = %e,
                block_count,
                "failed to allocate argon2 memory"
            );

            Error::hashing()
                .with_message("password processing failed")
                .with_source(e)
        })?;
        blocks.resize(block_count, Block::default());

        Argon2::new(Algorithm::Argon2id, version, params)
            .hash_password_into_with_memory(password, salt, output, blocks.as_mut_slice())
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET_HASHER,
                    error = %e,
                    "password hashing operation failed"
                );

                Error::hashing()
                    .with_message("password processing failed")
                    .with_source(e)
            })
    }

    /// Parses an encoded hash, requiring the argon2id identifier, a salt and
    /// a digest.
    fn parse<'a>(&self, encoded: &'a str) -> Result<PasswordHash<'a>> {
        let parsed = PasswordHash::new(encoded).map_err(|e| {
            tracing::warn!(
                target: TRACING_TARGET_HASHER,
                error = %e,
                "invalid password hash format provided"
            );

            Error::hashing()
                .with_message("malformed password hash")
                .with_source(e)
        })?;

        if parsed.algorithm != ARGON2ID_IDENT {
            tracing::warn!(
                target: TRACING_TARGET_HASHER,
                algorithm = %parsed.algorithm,
                "password hash was not produced by argon2id"
            );

            return Err(Error::hashing().with_message("password hash was not produced by argon2id"));
        }

        if parsed.salt.is_none() || parsed.hash.is_none() {
            tracing::warn!(
                target: TRACING_TARGET_HASHER,
                "password hash is missing its salt or digest"
            );

            return Err(Error::hashing().with_message("malformed password hash"));
        }

        Ok(parsed)
    }

    /// Reads the embedded parameters, rejecting costs no valid policy allows.
    fn stored_params(parsed: &PasswordHash<'_>, output_len: usize) -> Result<StoredParams> {
        let malformed = |reason: &str| {
            tracing::warn!(
                target: TRACING_TARGET_HASHER,
                reason,
                "invalid argon2 parameters in password hash"
            );
            Error::hashing().with_message("malformed argon2 parameters")
        };

        let embedded = Params::try_from(parsed).map_err(|e| {
            tracing::warn!(
                target: TRACING_TARGET_HASHER,
                error = %e,
                "invalid argon2 parameters in password hash"
            );

            Error::hashing()
                .with_message("malformed argon2 parameters")
                .with_source(e)
        })?;

        if embedded.m_cost() > ARGON2_MAX_MEMORY {
            return Err(malformed("memory cost above the accepted ceiling"));
        }
        if embedded.t_cost() > ARGON2_MAX_TIME_COST {
            return Err(malformed("time cost above the accepted ceiling"));
        }
        if embedded.p_cost() > ARGON2_MAX_PARALLELISM {
            return Err(malformed("parallelism above the accepted ceiling"));
        }

        let version = match parsed.version {
            Some(version) => {
                Version::try_from(version).map_err(|_| malformed("unsupported argon2 version"))?
            }
            None => Version::V0x13,
        };

        let params = Params::new(
            embedded.m_cost(),
            embedded.t_cost(),
            embedded.p_cost(),
            Some(output_len),
        )
        .map_err(|e| {
            Error::hashing()
                .with_message("malformed argon2 parameters")
                .with_source(e)
        })?;

        Ok(StoredParams { params, version })
    }
}

/// Decodes the salt and digest of an already parsed hash.
fn decode_segments<'b>(
    parsed: &PasswordHash<'_>,
    salt_buf: &'b mut [u8],
) -> Result<(&'b [u8], Output)> {
    let malformed = || Error::hashing().with_message("malformed password hash");

    let salt = parsed
        .salt
        .ok_or_else(malformed)?
        .decode_b64(salt_buf)
        .map_err(|e| malformed().with_source(e))?;
    let digest = parsed.hash.ok_or_else(malformed)?;

    Ok((salt, digest))
}

impl PasswordHashAlgorithm for Argon2Hasher {
    fn name(&self) -> &'static str {
        ARGON2_ALGORITHM_NAME
    }

    fn hash(&self, password: &str) -> Result<String> {
        if password.is_empty() {
            return Err(Error::hashing().with_message("password must not be empty"));
        }

        let salt = self.generate_salt()?;
        let peppered = apply_pepper(password, self.policy.pepper());

        let mut digest = vec![0u8; self.policy.hash_length()];
        Self::derive(
            self.params.clone(),
            Version::V0x13,
            peppered.as_bytes(),
            &salt,
            &mut digest,
        )?;

        Ok(format!(
            "${ARGON2ID_IDENT}$v={}$m={},t={},p={}${}${}",
            u32::from(Version::V0x13),
            self.policy.memory_cost(),
            self.policy.time_cost(),
            self.policy.parallelism(),
            STANDARD_NO_PAD.encode(&salt),
            STANDARD_NO_PAD.encode(&digest),
        ))
    }

    fn verify(&self, encoded: &str, password: &str) -> Result<bool> {
        let parsed = self.parse(encoded)?;
        let mut salt_buf = [0u8; ARGON2_MAX_SALT_LENGTH];
        let (salt, expected) = decode_segments(&parsed, &mut salt_buf)?;
        let stored = Self::stored_params(&parsed, expected.len())?;

        if password.is_empty() {
            return Ok(false);
        }

        let peppered = apply_pepper(password, self.policy.pepper());
        let mut computed = vec![0u8; expected.len()];
        Self::derive(
            stored.params,
            stored.version,
            peppered.as_bytes(),
            salt,
            &mut computed,
        )?;

        let matches: bool = computed.ct_eq(expected.as_bytes()).into();
        if matches {
            tracing::debug!(
                target: TRACING_TARGET_HASHER,
                "password verification successful"
            );
        } else {
            tracing::debug!(
                target: TRACING_TARGET_HASHER,
                "password verification failed: incorrect password provided"
            );
        }

        Ok(matches)
    }

    fn needs_rehash(&self, encoded: &str) -> Result<bool> {
        let parsed = self.parse(encoded)?;
        let mut salt_buf = [0u8; ARGON2_MAX_SALT_LENGTH];
        let (salt, digest) = decode_segments(&parsed, &mut salt_buf)?;
        let stored = Self::stored_params(&parsed, digest.len())?;

        Ok(stored.version != Version::V0x13
            || stored.params.t_cost() != self.policy.time_cost()
            || stored.params.m_cost() != self.policy.memory_cost()
            || stored.params.p_cost() != self.policy.parallelism()
            || digest.len() != self.policy.hash_length()
            || salt.len() != self.policy.salt_length())
    }
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
