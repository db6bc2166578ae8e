//! Password hashing for the credentials store.

use anyhow::{bail, Result};
use std::str::FromStr;

mod shiftkerja_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash<T: AsRef<str>>(plain: &[u8], b64_salt: T) -> Result<String> {
        let argon2 = Argon2::default();
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
        let hash_string = argon2
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let argon2 = Argon2::default();
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(argon2.verify_password(plain_pw, &password_hash).is_ok())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftKerjaHasher {
    Argon2,
    /// Plain-text comparison for fast test logins. Never enabled in release
    /// builds without the dev feature.
    #[cfg(feature = "test-fast-hasher")]
    Fast,
}

impl ShiftKerjaHasher {
    pub fn default_hasher() -> Self {
        #[cfg(feature = "test-fast-hasher")]
        return ShiftKerjaHasher::Fast;
        #[cfg(not(feature = "test-fast-hasher"))]
        ShiftKerjaHasher::Argon2
    }

    pub fn generate_b64_salt(&self) -> String {
        match self {
            ShiftKerjaHasher::Argon2 => shiftkerja_argon2::generate_b64_salt(),
            #[cfg(feature = "test-fast-hasher")]
            ShiftKerjaHasher::Fast => "fastsalt".to_string(),
        }
    }

    pub fn hash<T: AsRef<str>>(&self, plain: &[u8], b64_salt: T) -> Result<String> {
        match self {
            ShiftKerjaHasher::Argon2 => shiftkerja_argon2::hash(plain, b64_salt),
            #[cfg(feature = "test-fast-hasher")]
            ShiftKerjaHasher::Fast => Ok(format!(
                "fast:{}:{}",
                b64_salt.as_ref(),
                String::from_utf8_lossy(plain)
            )),
        }
    }

    #[cfg_attr(not(feature = "test-fast-hasher"), allow(unused_variables))]
    pub fn verify<T: AsRef<str>>(&self, plain_pw: T, target_hash: T, salt: T) -> Result<bool> {
        match self {
            ShiftKerjaHasher::Argon2 => {
                shiftkerja_argon2::verify(plain_pw.as_ref().as_bytes(), target_hash)
            }
            #[cfg(feature = "test-fast-hasher")]
            ShiftKerjaHasher::Fast => {
                let expected = self.hash(plain_pw.as_ref().as_bytes(), salt.as_ref())?;
                Ok(expected == target_hash.as_ref())
            }
        }
    }
}

impl FromStr for ShiftKerjaHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(ShiftKerjaHasher::Argon2),
            #[cfg(feature = "test-fast-hasher")]
            "fast" => Ok(ShiftKerjaHasher::Fast),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl std::fmt::Display for ShiftKerjaHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShiftKerjaHasher::Argon2 => write!(f, "argon2"),
            #[cfg(feature = "test-fast-hasher")]
            ShiftKerjaHasher::Fast => write!(f, "fast"),
        }
    }
}

/// Stored password credentials for one user.
#[derive(Clone, Debug)]
pub struct UserCredentials {
    pub user_id: i64,
    pub salt: String,
    pub hash: String,
    pub hasher: ShiftKerjaHasher,
}

impl UserCredentials {
    pub fn from_password(user_id: i64, password: &str) -> Result<Self> {
        let hasher = ShiftKerjaHasher::default_hasher();
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password.as_bytes(), &salt)?;
        Ok(UserCredentials {
            user_id,
            salt,
            hash,
            hasher,
        })
    }

    pub fn verify(&self, password: &str) -> Result<bool> {
        self.hasher
            .verify(password, self.hash.as_str(), self.salt.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argon2_hash_is_deterministic_per_salt() {
        let pw = "123mypw";
        let b64_salt = ShiftKerjaHasher::Argon2.generate_b64_salt();

        let hash1 = ShiftKerjaHasher::Argon2
            .hash(pw.as_bytes(), &b64_salt)
            .unwrap();
        let hash2 = ShiftKerjaHasher::Argon2
            .hash(b"123mypw", &b64_salt)
            .unwrap();
        assert_eq!(hash1, hash2);

        assert!(ShiftKerjaHasher::Argon2
            .verify("123mypw", &hash1, "unused")
            .unwrap());
        assert!(!ShiftKerjaHasher::Argon2
            .verify("not the pw", &hash1, "unused")
            .unwrap());
    }

    #[test]
    fn credentials_verify_roundtrip() {
        let credentials = UserCredentials::from_password(7, "hunter2").unwrap();
        assert!(credentials.verify("hunter2").unwrap());
        assert!(!credentials.verify("hunter3").unwrap());
    }
}
