use super::{authenticated, check_len, non_blank};
use crate::core::models::user::{Insert as UserInsert, Patch as UserPatch, Profile, ProfileUpdate, Register, User, ALIAS_MAX_LEN, EMAIL_MAX_LEN};
use crate::core::ports::hasher::Hasher;
use crate::core::ports::repository::{finish, Store, TxStore, UserCommon};
use crate::error::Error;
use chrono::Utc;

// Verified against when the email is unknown so both failure paths hash once.
const DUMMY_SALT: &str = "00000000000000000000000000000000";
const DUMMY_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Stores a new identity with a freshly salted password hash.
pub async fn create<S, H>(store: &mut S, hasher: &H, email: &str, alias: &str, password: &str) -> Result<i32, Error>
where
    S: UserCommon,
    H: Hasher,
{
    let email = normalize_email(email);
    if UserCommon::exists_email(store, &email).await? {
        return Err(Error::DuplicateEmail);
    }
    let salt = hasher.gen_salt();
    let id = UserCommon::insert(
        store,
        UserInsert {
            email,
            alias: alias.to_owned(),
            password: hasher.hash_password(password, &salt),
            salt,
        },
    )
    .await?;
    Ok(id)
}

/// Unknown email and wrong password both end in `InvalidCredentials`.
pub async fn verify<S, H>(store: &mut S, hasher: &H, email: &str, password: &str) -> Result<User, Error>
where
    S: UserCommon,
    H: Hasher,
{
    match UserCommon::get_by_email(store, &normalize_email(email)).await? {
        Some(user) => {
            if hasher.verify_password(password, &user.salt, &user.password) {
                Ok(user)
            } else {
                Err(Error::InvalidCredentials)
            }
        }
        None => {
            hasher.verify_password(password, DUMMY_SALT, DUMMY_HASH);
            Err(Error::InvalidCredentials)
        }
    }
}

async fn register_in<T, H>(tx: &mut T, hasher: &H, reg: Register) -> Result<i32, Error>
where
    T: TxStore,
    H: Hasher,
{
    let email = non_blank(reg.email).ok_or(Error::MissingField("email"))?;
    let alias = non_blank(reg.alias).ok_or(Error::MissingField("alias"))?;
    let password = reg.password.filter(|p| !p.is_empty()).ok_or(Error::MissingField("password"))?;
    check_len(&email, "email", EMAIL_MAX_LEN)?;
    check_len(&alias, "alias", ALIAS_MAX_LEN)?;
    if reg.confirm_password.as_deref() != Some(password.as_str()) {
        return Err(Error::PasswordMismatch);
    }
    create(tx, hasher, &email, &alias, &password).await
}

pub async fn register<T, H>(mut tx: T, hasher: &H, reg: Register) -> Result<i32, Error>
where
    T: TxStore,
    H: Hasher,
{
    let res = register_in(&mut tx, hasher, reg).await;
    let id = finish(tx, res).await?;
    log::info!("registered user {}", id);
    Ok(id)
}

async fn login_in<T, H>(tx: &mut T, hasher: &H, email: &str, password: &str) -> Result<User, Error>
where
    T: TxStore,
    H: Hasher,
{
    let mut user = verify(tx, hasher, email, password).await?;
    let now = Utc::now().naive_utc();
    UserCommon::patch(
        tx,
        user.id,
        UserPatch {
            last_login: Some(now),
            ..Default::default()
        },
    )
    .await?;
    user.last_login = Some(now);
    Ok(user)
}

/// Verifies credentials and stamps `last_login`.
pub async fn login<T, H>(mut tx: T, hasher: &H, email: &str, password: &str) -> Result<User, Error>
where
    T: TxStore,
    H: Hasher,
{
    let res = login_in(&mut tx, hasher, email, password).await;
    finish(tx, res).await
}

pub async fn profile<S>(store: &mut S, caller: Option<i32>) -> Result<Profile, Error>
where
    S: Store,
{
    let uid = authenticated(caller)?;
    let user = UserCommon::get(store, uid).await?.ok_or(Error::Unauthenticated)?;
    Ok(user.into())
}

async fn update_profile_in<T, H>(tx: &mut T, hasher: &H, uid: i32, update: ProfileUpdate) -> Result<Profile, Error>
where
    T: TxStore,
    H: Hasher,
{
    let user = UserCommon::get(tx, uid).await?.ok_or(Error::Unauthenticated)?;
    let mut patch = UserPatch::default();
    if let Some(alias) = non_blank(update.alias) {
        check_len(&alias, "alias", ALIAS_MAX_LEN)?;
        if alias != user.alias {
            patch.alias = Some(alias);
        }
    }
    if let Some(new_password) = update.new_password.filter(|p| !p.is_empty()) {
        let current = update.current_password.filter(|p| !p.is_empty()).ok_or(Error::MissingField("current password"))?;
        if !hasher.verify_password(&current, &user.salt, &user.password) {
            return Err(Error::InvalidCredentials);
        }
        if update.confirm_password.as_deref() != Some(new_password.as_str()) {
            return Err(Error::PasswordMismatch);
        }
        let salt = hasher.gen_salt();
        patch.password = Some(hasher.hash_password(&new_password, &salt));
        patch.salt = Some(salt);
    }
    UserCommon::patch(tx, uid, patch).await?;
    let user = UserCommon::get(tx, uid).await?.ok_or(Error::Unauthenticated)?;
    Ok(user.into())
}

pub async fn update_profile<T, H>(mut tx: T, hasher: &H, caller: Option<i32>, update: ProfileUpdate) -> Result<Profile, Error>
where
    T: TxStore,
    H: Hasher,
{
    let uid = authenticated(caller)?;
    let res = update_profile_in(&mut tx, hasher, uid, update).await;
    finish(tx, res).await
}
