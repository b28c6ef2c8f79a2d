use crate::core::models::{
    option::{Insert as OptionInsert, Query as OptionQuery, SurveyOption},
    response::{Insert as ResponseInsert, OptionCount, SurveyResponse},
    survey::{Insert as SurveyInsert, Survey, Update as SurveyUpdate},
    user::{Insert as UserInsert, Patch as UserPatch, User},
};
use crate::core::ports::repository::{Common, Manager, OptionCommon, ResponseCommon, Store, SurveyCommon, TxStore, UserCommon};
use crate::error::Error;
use chrono::Utc;
use sqlx::pool::PoolConnection;
use sqlx::{query, query_as, query_scalar, Executor, PgPool, Postgres, Transaction};

const SCHEMA: &str = include_str!("../../schema.sql");
const UNIQUE_VIOLATION: &str = "23505";

/// Applies `schema.sql`; every statement is idempotent.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), Error> {
    pool.execute(SCHEMA).await?;
    Ok(())
}

pub struct PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    executor: E,
}

impl<E> PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

impl<E> UserCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, user: UserInsert) -> Result<i32, Error> {
        let id = query_scalar("INSERT INTO users (email, alias, password, salt, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING id")
            .bind(user.email)
            .bind(user.alias)
            .bind(user.password)
            .bind(user.salt)
            .bind(Utc::now().naive_utc())
            .fetch_one(&mut self.executor)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => Error::DuplicateEmail,
                e => e.into(),
            })?;
        Ok(id)
    }

    async fn get(&mut self, id: i32) -> Result<Option<User>, Error> {
        let user = query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(&mut self.executor).await?;
        Ok(user)
    }

    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        let user = query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(&mut self.executor).await?;
        Ok(user)
    }

    async fn exists_email(&mut self, email: &str) -> Result<bool, Error> {
        let exists = query_scalar("SELECT EXISTS(SELECT * FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(exists)
    }

    async fn patch(&mut self, id: i32, patch: UserPatch) -> Result<(), Error> {
        query(
            "
        UPDATE users SET
            alias = COALESCE($1, alias),
            password = COALESCE($2, password),
            salt = COALESCE($3, salt),
            last_login = COALESCE($4, last_login)
        WHERE id = $5",
        )
        .bind(patch.alias)
        .bind(patch.password)
        .bind(patch.salt)
        .bind(patch.last_login)
        .bind(id)
        .execute(&mut self.executor)
        .await?;
        Ok(())
    }

    async fn count(&mut self) -> Result<i64, Error> {
        let n = query_scalar("SELECT COUNT(*) FROM users").fetch_one(&mut self.executor).await?;
        Ok(n)
    }
}

impl<E> SurveyCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, survey: SurveyInsert) -> Result<Survey, Error> {
        let survey = query_as(
            "
        INSERT INTO surveys (user_id, title, description, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, TRUE, $4, $4)
        RETURNING *",
        )
        .bind(survey.user_id)
        .bind(survey.title)
        .bind(survey.description)
        .bind(Utc::now().naive_utc())
        .fetch_one(&mut self.executor)
        .await?;
        Ok(survey)
    }

    async fn get(&mut self, owner_id: i32, id: i32) -> Result<Option<Survey>, Error> {
        let survey = query_as("SELECT * FROM surveys WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(survey)
    }

    async fn get_active(&mut self, id: i32) -> Result<Option<Survey>, Error> {
        let survey = query_as("SELECT * FROM surveys WHERE id = $1 AND is_active FOR SHARE")
            .bind(id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(survey)
    }

    async fn query(&mut self, owner_id: i32) -> Result<Vec<Survey>, Error> {
        let surveys = query_as("SELECT * FROM surveys WHERE user_id = $1 ORDER BY id")
            .bind(owner_id)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(surveys)
    }

    async fn update(&mut self, owner_id: i32, id: i32, update: SurveyUpdate) -> Result<Option<Survey>, Error> {
        let set_description = update.description.is_some();
        let survey = query_as(
            "
        UPDATE surveys SET
            title = COALESCE($1, title),
            description = CASE WHEN $2 THEN $3 ELSE description END,
            is_active = COALESCE($4, is_active),
            updated_at = $5
        WHERE id = $6 AND user_id = $7
        RETURNING *",
        )
        .bind(update.title)
        .bind(set_description)
        .bind(update.description.flatten())
        .bind(update.is_active)
        .bind(Utc::now().naive_utc())
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut self.executor)
        .await?;
        Ok(survey)
    }

    async fn toggle(&mut self, owner_id: i32, id: i32) -> Result<Option<Survey>, Error> {
        let survey = query_as("UPDATE surveys SET is_active = NOT is_active, updated_at = $1 WHERE id = $2 AND user_id = $3 RETURNING *")
            .bind(Utc::now().naive_utc())
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(survey)
    }

    async fn delete(&mut self, owner_id: i32, id: i32) -> Result<bool, Error> {
        let res = query("DELETE FROM surveys WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut self.executor)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn count(&mut self) -> Result<i64, Error> {
        let n = query_scalar("SELECT COUNT(*) FROM surveys").fetch_one(&mut self.executor).await?;
        Ok(n)
    }
}

impl<E> OptionCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, option: OptionInsert) -> Result<SurveyOption, Error> {
        let option = query_as("INSERT INTO survey_options (survey_id, option_text, option_order) VALUES ($1, $2, $3) RETURNING *")
            .bind(option.survey_id)
            .bind(option.option_text)
            .bind(option.option_order)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(option)
    }

    async fn query(&mut self, query: &OptionQuery) -> Result<Vec<SurveyOption>, Error> {
        let options = query_as("SELECT * FROM survey_options WHERE survey_id = ANY($1) ORDER BY survey_id, option_order")
            .bind(&query.survey_id_in)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(options)
    }

    async fn is_belongs_to_survey(&mut self, survey_id: i32, option_id: i32) -> Result<bool, Error> {
        let res = query_scalar("SELECT EXISTS(SELECT * FROM survey_options WHERE id = $1 AND survey_id = $2)")
            .bind(option_id)
            .bind(survey_id)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(res)
    }

    async fn delete_by_survey(&mut self, survey_id: i32) -> Result<u64, Error> {
        let res = query("DELETE FROM survey_options WHERE survey_id = $1").bind(survey_id).execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }

    async fn count(&mut self, survey_id: Option<i32>) -> Result<i64, Error> {
        let n = query_scalar("SELECT COUNT(*) FROM survey_options WHERE ($1::INT IS NULL OR survey_id = $1)")
            .bind(survey_id)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(n)
    }
}

impl<E> ResponseCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, response: ResponseInsert) -> Result<Option<SurveyResponse>, Error> {
        let response = query_as(
            "
        INSERT INTO survey_responses (survey_id, option_id, respondent_email, response_date)
        SELECT o.survey_id, o.id, $3::VARCHAR, $4::TIMESTAMP
        FROM survey_options AS o
        JOIN surveys AS s ON s.id = o.survey_id
        WHERE o.id = $2 AND o.survey_id = $1 AND s.is_active
        RETURNING *",
        )
        .bind(response.survey_id)
        .bind(response.option_id)
        .bind(response.respondent_email)
        .bind(Utc::now().naive_utc())
        .fetch_optional(&mut self.executor)
        .await?;
        Ok(response)
    }

    async fn count_by_option(&mut self, survey_id: i32) -> Result<Vec<OptionCount>, Error> {
        let counts = query_as("SELECT option_id, COUNT(*) AS count FROM survey_responses WHERE survey_id = $1 GROUP BY option_id")
            .bind(survey_id)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(counts)
    }

    async fn delete_by_survey(&mut self, survey_id: i32) -> Result<u64, Error> {
        let res = query("DELETE FROM survey_responses WHERE survey_id = $1").bind(survey_id).execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }

    async fn count(&mut self, survey_id: Option<i32>) -> Result<i64, Error> {
        let n = query_scalar("SELECT COUNT(*) FROM survey_responses WHERE ($1::INT IS NULL OR survey_id = $1)")
            .bind(survey_id)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(n)
    }
}

impl Common for PgSqlx<PoolConnection<Postgres>> {}
impl Common for PgSqlx<Transaction<'static, Postgres>> {}
impl Store for PgSqlx<PoolConnection<Postgres>> {}
impl Store for PgSqlx<Transaction<'static, Postgres>> {}

impl TxStore for PgSqlx<Transaction<'static, Postgres>> {
    async fn commit(self) -> Result<(), Error> {
        self.executor.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.executor.rollback().await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PgSqlxManager {
    pool: PgPool,
}

impl PgSqlxManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Manager for PgSqlxManager {
    type Store = PgSqlx<PoolConnection<Postgres>>;
    type Tx = PgSqlx<Transaction<'static, Postgres>>;

    async fn db(&self) -> Result<Self::Store, Error> {
        let conn = self.pool.acquire().await?;
        Ok(PgSqlx::new(conn))
    }

    async fn tx(&self) -> Result<Self::Tx, Error> {
        let tx = self.pool.begin().await?;
        Ok(PgSqlx::new(tx))
    }
}
