pub trait Hasher {
    fn gen_salt(&self) -> String;
    fn hash_password(&self, password: &str, salt: &str) -> String;

    /// Must take the same time whether or not `hashed` matches.
    fn verify_password(&self, password: &str, salt: &str, hashed: &str) -> bool;
}
