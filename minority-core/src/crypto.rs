use crate::constants::{SALT_BYTES, SALT_HEX_LEN, VOTE_FALSE, VOTE_TRUE};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use thiserror::Error;

// Commit/reveal hashing. The on-chain verifier computes
// SHA3_256(utf8(voteString.concat(salt))) so the word form of the vote and the
// concatenation order are fixed.

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("salt must be exactly {} hex characters (got {} chars)", SALT_HEX_LEN, .len)]
    InvalidSalt { len: usize },
    #[error("secure random source unavailable: {0}")]
    SecureRandomUnavailable(String),
}

/// Both possible commitments for one salt, so the vote can be chosen after the salt exists.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteHashes {
    pub vote_true: String,
    pub vote_false: String,
}

impl VoteHashes {
    pub fn compute(salt: &str) -> Result<Self, CryptoError> {
        Ok(Self {
            vote_true: commit_hash(true, salt)?,
            vote_false: commit_hash(false, salt)?,
        })
    }

    pub fn for_vote(&self, vote: bool) -> &str {
        if vote {
            &self.vote_true
        } else {
            &self.vote_false
        }
    }
}

pub fn generate_salt() -> Result<String, CryptoError> {
    generate_salt_with(&mut OsRng)
}

pub fn generate_salt_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<String, CryptoError> {
    let mut bytes = [0u8; SALT_BYTES];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::SecureRandomUnavailable(e.to_string()))?;
    Ok(to_hex(&bytes))
}

pub fn vote_string(vote: bool) -> &'static str {
    if vote {
        VOTE_TRUE
    } else {
        VOTE_FALSE
    }
}

pub fn validate_salt(salt: &str) -> Result<(), CryptoError> {
    if salt.len() != SALT_HEX_LEN || !salt.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CryptoError::InvalidSalt {
            len: salt.chars().count(),
        });
    }
    Ok(())
}

pub fn commit_hash(vote: bool, salt: &str) -> Result<String, CryptoError> {
    validate_salt(salt)?;
    let mut hasher = Sha3_256::new();
    hasher.update(vote_string(vote).as_bytes());
    hasher.update(salt.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn verify_commitment(vote: bool, salt: &str, hash: &str) -> Result<bool, CryptoError> {
    let expected = commit_hash(vote, salt)?;
    Ok(expected.eq_ignore_ascii_case(hash.trim()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
