use crate::core::models::{
    option::{Insert as OptionInsert, Query as OptionQuery, SurveyOption},
    response::{Insert as ResponseInsert, OptionCount, SurveyResponse},
    survey::{Insert as SurveyInsert, Survey, Update as SurveyUpdate},
    user::{Insert as UserInsert, Patch as UserPatch, User},
};
use crate::error::Error;

pub trait UserCommon {
    /// Fails with `Error::DuplicateEmail` when the email is taken.
    async fn insert(&mut self, user: UserInsert) -> Result<i32, Error>;
    async fn get(&mut self, id: i32) -> Result<Option<User>, Error>;
    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error>;
    async fn exists_email(&mut self, email: &str) -> Result<bool, Error>;
    async fn patch(&mut self, id: i32, patch: UserPatch) -> Result<(), Error>;
    async fn count(&mut self) -> Result<i64, Error>;
}

/// Every owner-scoped method treats a survey of another owner as missing.
pub trait SurveyCommon {
    async fn insert(&mut self, survey: SurveyInsert) -> Result<Survey, Error>;
    async fn get(&mut self, owner_id: i32, id: i32) -> Result<Option<Survey>, Error>;
    async fn get_active(&mut self, id: i32) -> Result<Option<Survey>, Error>;
    async fn query(&mut self, owner_id: i32) -> Result<Vec<Survey>, Error>;
    async fn update(&mut self, owner_id: i32, id: i32, update: SurveyUpdate) -> Result<Option<Survey>, Error>;
    async fn toggle(&mut self, owner_id: i32, id: i32) -> Result<Option<Survey>, Error>;
    async fn delete(&mut self, owner_id: i32, id: i32) -> Result<bool, Error>;
    async fn count(&mut self) -> Result<i64, Error>;
}

pub trait OptionCommon {
    async fn insert(&mut self, option: OptionInsert) -> Result<SurveyOption, Error>;
    /// Options ordered by survey, then by `option_order`.
    async fn query(&mut self, query: &OptionQuery) -> Result<Vec<SurveyOption>, Error>;
    async fn is_belongs_to_survey(&mut self, survey_id: i32, option_id: i32) -> Result<bool, Error>;
    async fn delete_by_survey(&mut self, survey_id: i32) -> Result<u64, Error>;
    async fn count(&mut self, survey_id: Option<i32>) -> Result<i64, Error>;
}

pub trait ResponseCommon {
    /// Inserts only when the option belongs to the survey and the survey is active,
    /// returns `None` otherwise.
    async fn insert(&mut self, response: ResponseInsert) -> Result<Option<SurveyResponse>, Error>;
    async fn count_by_option(&mut self, survey_id: i32) -> Result<Vec<OptionCount>, Error>;
    async fn delete_by_survey(&mut self, survey_id: i32) -> Result<u64, Error>;
    async fn count(&mut self, survey_id: Option<i32>) -> Result<i64, Error>;
}

pub trait Common: UserCommon + SurveyCommon + OptionCommon + ResponseCommon {}

pub trait Store: Common {}

pub trait TxStore: Store {
    async fn commit(self) -> Result<(), Error>;
    async fn rollback(self) -> Result<(), Error>;
}

pub trait Manager {
    type Store: Store;
    type Tx: TxStore;
    async fn db(&self) -> Result<Self::Store, Error>;
    async fn tx(&self) -> Result<Self::Tx, Error>;
}

/// Commits `tx` when `res` is ok, rolls it back otherwise.
pub async fn finish<T, R>(tx: T, res: Result<R, Error>) -> Result<R, Error>
where
    T: TxStore,
{
    match res {
        Ok(r) => {
            tx.commit().await?;
            Ok(r)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                log::error!("failed to rollback transaction: {}", rollback_err);
            }
            Err(e)
        }
    }
}
