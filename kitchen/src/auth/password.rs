//! Password hashing, verification and the strength policy for new cooks.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::PasswordConfig;
use crate::errors::Error;

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    /// Create Argon2 instance with these parameters.
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// Secure defaults for production (Argon2id RFC recommendations)
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MB
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl From<&PasswordConfig> for Argon2Params {
    fn from(config: &PasswordConfig) -> Self {
        Self {
            memory_kib: config.argon2_memory_kib,
            iterations: config.argon2_iterations,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// Hash a string using Argon2.
///
/// Uses the provided parameters or secure defaults if None.
pub fn hash_string_with_params(input: &str, params: Option<Argon2Params>) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = params.unwrap_or_default().to_argon2()?;

    let hash = argon2.hash_password(input.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash string: {e}"),
    })?;

    Ok(hash.to_string())
}

/// Hash a string using Argon2 with default secure parameters.
pub fn hash_string(input: &str) -> Result<String, Error> {
    hash_string_with_params(input, None)
}

/// Verify a string against a hash.
///
/// Note: Verification uses the parameters embedded in the hash itself.
pub fn verify_string(input: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse hash: {e}"),
    })?;

    // Verification always uses params from the hash
    let argon2 = Argon2::default();
    Ok(argon2.verify_password(input.as_bytes(), &parsed_hash).is_ok())
}

/// Hash with the configured cost on the blocking pool.
pub async fn hash_password(password: String, config: &PasswordConfig) -> Result<String, Error> {
    let params = Argon2Params::from(config);
    tokio::task::spawn_blocking(move || hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

/// Verify on the blocking pool.
pub async fn verify_password(password: String, hash: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}

/// Whether a stored password column already holds an Argon2 PHC string with a salt and hash.
pub fn is_password_hash(stored: &str) -> bool {
    stored.starts_with("$argon2")
        && PasswordHash::new(stored).is_ok_and(|parsed| parsed.salt.is_some() && parsed.hash.is_some())
}

const COMMON_PASSWORDS: &[&str] = &[
    "123456", "123456789", "12345678", "password", "qwerty", "qwerty123", "1q2w3e4r", "111111",
    "1234567890", "abc123", "password1", "password123", "iloveyou", "admin", "admin123", "welcome",
    "letmein", "monkey", "dragon", "sunshine", "football", "baseball", "princess", "superman",
    "trustno1", "passw0rd", "qwertyuiop", "asdfghjkl", "zxcvbnm", "1qaz2wsx", "changeme", "kitchen",
    "restaurant", "chef1234",
];

const MAX_SIMILARITY: f64 = 0.7;

/// Check a new password against the configured policy.
///
/// Returns one message per failed rule, empty when the password is acceptable.
pub fn password_policy_errors(password: &str, username: &str, config: &PasswordConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let length = password.chars().count();

    if length < config.min_length {
        errors.push(format!(
            "This password is too short. It must contain at least {} characters.",
            config.min_length
        ));
    }
    if length > config.max_length {
        errors.push(format!(
            "This password is too long. It must contain at most {} characters.",
            config.max_length
        ));
    }
    if is_too_similar(password, username) {
        errors.push("The password is too similar to the username.".to_string());
    }
    if COMMON_PASSWORDS.contains(&password.to_lowercase().trim()) {
        errors.push("This password is too common.".to_string());
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.push("This password is entirely numeric.".to_string());
    }

    errors
}

fn is_too_similar(password: &str, username: &str) -> bool {
    let password = password.to_lowercase();
    let username = username.to_lowercase();
    if username.is_empty() || password.is_empty() {
        return false;
    }

    let mut candidates = vec![username.as_str()];
    candidates.extend(username.split(|c: char| !c.is_alphanumeric()).filter(|part| part.len() >= 3));

    candidates
        .into_iter()
        .any(|candidate| similarity(&password, candidate) >= MAX_SIMILARITY)
}

/// `2 * M / T`, where `M` is the longest common subsequence length and `T` the total length.
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let mut previous = vec![0usize; b.len() + 1];
    for ca in &a {
        let mut current = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        previous = current;
    }

    2.0 * previous[b.len()] as f64 / total as f64
}
