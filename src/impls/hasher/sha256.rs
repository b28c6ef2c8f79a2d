use crate::core::ports::hasher::Hasher;
use hex::ToHex;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn gen_salt(&self) -> String {
        thread_rng().sample_iter(&Alphanumeric).take(SALT_LEN).map(char::from).collect()
    }

    fn hash_password(&self, password: &str, salt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password);
        hasher.update(salt);
        hasher.finalize().encode_hex()
    }

    fn verify_password(&self, password: &str, salt: &str, hashed: &str) -> bool {
        let computed = self.hash_password(password, salt);
        if computed.len() != hashed.len() {
            return false;
        }
        computed.bytes().zip(hashed.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_salt() {
        let hasher = Sha256Hasher;
        let a = hasher.gen_salt();
        let b = hasher.gen_salt();
        assert_eq!(a.len(), SALT_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = Sha256Hasher;
        let hashed = hasher.hash_password("secret", "salt");
        assert_eq!(hashed.len(), 64);
        assert_eq!(hashed, hasher.hash_password("secret", "salt"));
        assert_ne!(hashed, hasher.hash_password("secret", "other"));
        assert!(hasher.verify_password("secret", "salt", &hashed));
        assert!(!hasher.verify_password("Secret", "salt", &hashed));
        assert!(!hasher.verify_password("secret", "salt", "short"));
    }
}
