use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

const LEGACY_DIGEST_LEN: usize = 32;
const BCRYPT_DIGEST_LEN: usize = 60;
const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("unrecognized password hash format")]
    UnrecognizedFormat,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Stored password digest, classified by format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredHash {
    /// Unsalted MD5 hex digest from the previous system.
    Legacy(String),
    /// bcrypt digest written by the previous system after its md5 era.
    Bcrypt(String),
    /// Argon2 PHC string.
    Modern(String),
}

impl StoredHash {
    pub fn parse(digest: &str) -> Result<Self, PasswordError> {
        if digest.starts_with("$argon2") {
            PasswordHash::new(digest).map_err(|_| PasswordError::UnrecognizedFormat)?;
            return Ok(StoredHash::Modern(digest.to_string()));
        }

        if digest.len() == BCRYPT_DIGEST_LEN && BCRYPT_PREFIXES.iter().any(|p| digest.starts_with(p)) {
            return Ok(StoredHash::Bcrypt(digest.to_string()));
        }

        if digest.len() == LEGACY_DIGEST_LEN && digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(StoredHash::Legacy(digest.to_ascii_lowercase()));
        }

        Err(PasswordError::UnrecognizedFormat)
    }

    /// Anything but argon2 is rehashed after a successful login.
    pub fn needs_upgrade(&self) -> bool {
        !matches!(self, StoredHash::Modern(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            StoredHash::Legacy(digest) | StoredHash::Bcrypt(digest) | StoredHash::Modern(digest) => digest,
        }
    }
}

/// Produces argon2 digests and verifies every stored format.
#[derive(Clone, Default)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Returns `false` for a wrong password; errors only on a malformed digest.
    pub fn verify(&self, plaintext: &str, stored: &StoredHash) -> Result<bool, PasswordError> {
        match stored {
            StoredHash::Legacy(digest) => Ok(legacy_digest(plaintext) == *digest),
            StoredHash::Bcrypt(digest) => {
                bcrypt::verify(plaintext, digest).map_err(|_| PasswordError::UnrecognizedFormat)
            }
            StoredHash::Modern(phc) => {
                let parsed = PasswordHash::new(phc).map_err(|_| PasswordError::UnrecognizedFormat)?;
                Ok(self
                    .argon2
                    .verify_password(plaintext.as_bytes(), &parsed)
                    .is_ok())
            }
        }
    }
}

pub fn legacy_digest(plaintext: &str) -> String {
    format!("{:x}", md5::compute(plaintext.as_bytes()))
}
