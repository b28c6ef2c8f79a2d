use super::{survey::create_survey, user::register};
use crate::core::models::{survey::SurveyCreate, user::Register};
use crate::core::ports::hasher::Hasher;
use crate::core::ports::repository::{Manager, UserCommon};
use crate::error::Error;

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "password123";

/// Creates the demo owner and one sample survey on an empty user table.
/// Returns whether anything was written.
pub async fn seed<M, H>(manager: &M, hasher: &H) -> Result<bool, Error>
where
    M: Manager,
    H: Hasher,
{
    if UserCommon::count(&mut manager.db().await?).await? > 0 {
        return Ok(false);
    }
    let uid = register(
        manager.tx().await?,
        hasher,
        Register {
            email: Some(DEMO_EMAIL.to_owned()),
            alias: Some("Demo User".to_owned()),
            password: Some(DEMO_PASSWORD.to_owned()),
            confirm_password: Some(DEMO_PASSWORD.to_owned()),
        },
    )
    .await?;
    create_survey(
        manager.tx().await?,
        Some(uid),
        SurveyCreate {
            title: Some("Customer Satisfaction Survey".to_owned()),
            description: Some("How satisfied are you with our service?".to_owned()),
            options: ["Very Satisfied", "Satisfied", "Neutral", "Dissatisfied", "Very Dissatisfied"].iter().map(|o| o.to_string()).collect(),
        },
    )
    .await?;
    log::info!("seeded demo account {}", DEMO_EMAIL);
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::ports::repository::{OptionCommon, SurveyCommon};
    use crate::core::services::user::login;
    use crate::database::memory::MemoryManager;
    use crate::impls::hasher::sha256::Sha256Hasher;

    #[tokio::test]
    async fn test_seed_runs_once() {
        let manager = MemoryManager::new();
        assert!(seed(&manager, &Sha256Hasher).await.unwrap());
        assert!(!seed(&manager, &Sha256Hasher).await.unwrap());

        let mut db = manager.db().await.unwrap();
        assert_eq!(UserCommon::count(&mut db).await.unwrap(), 1);
        assert_eq!(SurveyCommon::count(&mut db).await.unwrap(), 1);
        assert_eq!(OptionCommon::count(&mut db, None).await.unwrap(), 5);
        drop(db);

        assert!(login(manager.tx().await.unwrap(), &Sha256Hasher, DEMO_EMAIL, DEMO_PASSWORD).await.is_ok());
    }
}
