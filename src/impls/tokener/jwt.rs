use crate::core::ports::tokener::{Payload, Tokener};
use crate::error::Error;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session claims, `user` is the numeric user id.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claim {
    pub user: String,
    pub exp: i64,
}

impl Claim {
    pub fn new(uid: i32, ttl_days: i64) -> Self {
        Self {
            user: uid.to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::days(ttl_days)).timestamp(),
        }
    }

    pub fn uid(&self) -> Option<i32> {
        Payload::user(self).parse().ok()
    }
}

impl Payload for Claim {
    fn user(&self) -> &str {
        &self.user
    }
}

#[derive(Clone)]
pub struct JWT {
    secret: Vec<u8>,
}

impl JWT {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }
}

impl<P> Tokener<P> for JWT
where
    P: Payload,
{
    fn gen_token(&self, payload: &P) -> Result<String, Error> {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(&self.secret);
        let token = encode(&header, payload, &key)?;
        Ok(token)
    }
    fn verify_token(&self, token: &str) -> Result<P, Error> {
        let key = DecodingKey::from_secret(&self.secret);
        let validation = Validation::new(Algorithm::HS256);
        let payload = decode(token, &key, &validation)?;
        Ok(payload.claims)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gen_and_verify_token() {
        let jwt = JWT::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0]);
        let claim = Claim::new(42, 7);
        let token = jwt.gen_token(&claim).unwrap();
        let c: Claim = jwt.verify_token(&token).unwrap();
        assert_eq!(claim.user, c.user);
        assert_eq!(c.uid(), Some(42));
    }

    #[test]
    fn test_different_tokens() {
        let jwt = JWT::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0]);
        let claim_a = Claim::new(1, 7);
        let token_a = jwt.gen_token(&claim_a).unwrap();
        let claim_b = Claim::new(2, 7);
        let token_b = jwt.gen_token(&claim_b).unwrap();
        let c_a: Claim = jwt.verify_token(&token_a).unwrap();
        let c_b: Claim = jwt.verify_token(&token_b).unwrap();
        assert_eq!(c_a.user, claim_a.user);
        assert_eq!(c_b.user, claim_b.user);
    }

    #[test]
    fn test_rejects_foreign_and_expired_tokens() {
        let jwt = JWT::new(b"one".to_vec());
        let other = JWT::new(b"two".to_vec());
        let token = other.gen_token(&Claim::new(1, 7)).unwrap();
        assert!(<JWT as Tokener<Claim>>::verify_token(&jwt, &token).is_err());

        let expired = jwt.gen_token(&Claim::new(1, -1)).unwrap();
        assert!(<JWT as Tokener<Claim>>::verify_token(&jwt, &expired).is_err());
    }
}
