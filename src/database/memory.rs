use crate::core::models::{
    option::{Insert as OptionInsert, Query as OptionQuery, SurveyOption, MAX_ORDER, MIN_ORDER, OPTION_MAX_LEN},
    response::{Insert as ResponseInsert, OptionCount, SurveyResponse},
    survey::{Insert as SurveyInsert, Survey, Update as SurveyUpdate},
    user::{Insert as UserInsert, Patch as UserPatch, User},
};
use crate::core::ports::repository::{Common, Manager, OptionCommon, ResponseCommon, Store, SurveyCommon, TxStore, UserCommon};
use crate::error::Error;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default, Clone)]
struct State {
    users: Vec<User>,
    surveys: Vec<Survey>,
    options: Vec<SurveyOption>,
    responses: Vec<SurveyResponse>,
    last_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

fn violation(msg: &str) -> Error {
    Error::DatabaseError(sqlx::Error::Protocol(msg.into()))
}

/// Process-local storage with the same constraints as `schema.sql`.
///
/// A handle holds the state lock for its whole life, so transactions are
/// serialized. Transactional handles keep a snapshot that is restored on
/// rollback or when dropped uncommitted.
#[derive(Debug, Clone, Default)]
pub struct MemoryManager {
    state: Arc<Mutex<State>>,
}

impl MemoryManager {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryStore {
    state: OwnedMutexGuard<State>,
    snapshot: Option<State>,
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.state = snapshot;
        }
    }
}

impl Manager for MemoryManager {
    type Store = MemoryStore;
    type Tx = MemoryStore;

    async fn db(&self) -> Result<MemoryStore, Error> {
        let state = self.state.clone().lock_owned().await;
        Ok(MemoryStore { state, snapshot: None })
    }

    async fn tx(&self) -> Result<MemoryStore, Error> {
        let state = self.state.clone().lock_owned().await;
        let snapshot = Some(state.clone());
        Ok(MemoryStore { state, snapshot })
    }
}

impl UserCommon for MemoryStore {
    async fn insert(&mut self, user: UserInsert) -> Result<i32, Error> {
        if self.state.users.iter().any(|u| u.email == user.email) {
            return Err(Error::DuplicateEmail);
        }
        let id = self.state.next_id();
        self.state.users.push(User {
            id,
            email: user.email,
            alias: user.alias,
            password: user.password,
            salt: user.salt,
            created_at: Utc::now().naive_utc(),
            last_login: None,
        });
        Ok(id)
    }

    async fn get(&mut self, id: i32) -> Result<Option<User>, Error> {
        Ok(self.state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        Ok(self.state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn exists_email(&mut self, email: &str) -> Result<bool, Error> {
        Ok(self.state.users.iter().any(|u| u.email == email))
    }

    async fn patch(&mut self, id: i32, patch: UserPatch) -> Result<(), Error> {
        if let Some(user) = self.state.users.iter_mut().find(|u| u.id == id) {
            if let Some(alias) = patch.alias {
                user.alias = alias;
            }
            if let Some(password) = patch.password {
                user.password = password;
            }
            if let Some(salt) = patch.salt {
                user.salt = salt;
            }
            if let Some(last_login) = patch.last_login {
                user.last_login = Some(last_login);
            }
        }
        Ok(())
    }

    async fn count(&mut self) -> Result<i64, Error> {
        Ok(self.state.users.len() as i64)
    }
}

impl SurveyCommon for MemoryStore {
    async fn insert(&mut self, survey: SurveyInsert) -> Result<Survey, Error> {
        let now = Utc::now().naive_utc();
        let survey = Survey {
            id: self.state.next_id(),
            user_id: survey.user_id,
            title: survey.title,
            description: survey.description,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.surveys.push(survey.clone());
        Ok(survey)
    }

    async fn get(&mut self, owner_id: i32, id: i32) -> Result<Option<Survey>, Error> {
        Ok(self.state.surveys.iter().find(|s| s.id == id && s.user_id == owner_id).cloned())
    }

    async fn get_active(&mut self, id: i32) -> Result<Option<Survey>, Error> {
        Ok(self.state.surveys.iter().find(|s| s.id == id && s.is_active).cloned())
    }

    async fn query(&mut self, owner_id: i32) -> Result<Vec<Survey>, Error> {
        Ok(self.state.surveys.iter().filter(|s| s.user_id == owner_id).cloned().collect())
    }

    async fn update(&mut self, owner_id: i32, id: i32, update: SurveyUpdate) -> Result<Option<Survey>, Error> {
        let Some(survey) = self.state.surveys.iter_mut().find(|s| s.id == id && s.user_id == owner_id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            survey.title = title;
        }
        if let Some(description) = update.description {
            survey.description = description;
        }
        if let Some(is_active) = update.is_active {
            survey.is_active = is_active;
        }
        survey.updated_at = Utc::now().naive_utc();
        Ok(Some(survey.clone()))
    }

    async fn toggle(&mut self, owner_id: i32, id: i32) -> Result<Option<Survey>, Error> {
        let Some(survey) = self.state.surveys.iter_mut().find(|s| s.id == id && s.user_id == owner_id) else {
            return Ok(None);
        };
        survey.is_active = !survey.is_active;
        survey.updated_at = Utc::now().naive_utc();
        Ok(Some(survey.clone()))
    }

    async fn delete(&mut self, owner_id: i32, id: i32) -> Result<bool, Error> {
        let before = self.state.surveys.len();
        self.state.surveys.retain(|s| !(s.id == id && s.user_id == owner_id));
        if self.state.surveys.len() == before {
            return Ok(false);
        }
        // ON DELETE CASCADE
        self.state.options.retain(|o| o.survey_id != id);
        self.state.responses.retain(|r| r.survey_id != id);
        Ok(true)
    }

    async fn count(&mut self) -> Result<i64, Error> {
        Ok(self.state.surveys.len() as i64)
    }
}

impl OptionCommon for MemoryStore {
    async fn insert(&mut self, option: OptionInsert) -> Result<SurveyOption, Error> {
        if !(MIN_ORDER..=MAX_ORDER).contains(&option.option_order) {
            return Err(violation("check_option_order"));
        }
        if option.option_text.chars().count() > OPTION_MAX_LEN {
            return Err(violation("value too long for type character varying(200)"));
        }
        if !self.state.surveys.iter().any(|s| s.id == option.survey_id) {
            return Err(violation("survey_options_survey_id_fkey"));
        }
        if self.state.options.iter().any(|o| o.survey_id == option.survey_id && o.option_order == option.option_order) {
            return Err(violation("survey_options_survey_id_option_order_key"));
        }
        let option = SurveyOption {
            id: self.state.next_id(),
            survey_id: option.survey_id,
            option_text: option.option_text,
            option_order: option.option_order,
        };
        self.state.options.push(option.clone());
        Ok(option)
    }

    async fn query(&mut self, query: &OptionQuery) -> Result<Vec<SurveyOption>, Error> {
        let mut options: Vec<SurveyOption> = self.state.options.iter().filter(|o| query.survey_id_in.contains(&o.survey_id)).cloned().collect();
        options.sort_by_key(|o| (o.survey_id, o.option_order));
        Ok(options)
    }

    async fn is_belongs_to_survey(&mut self, survey_id: i32, option_id: i32) -> Result<bool, Error> {
        Ok(self.state.options.iter().any(|o| o.id == option_id && o.survey_id == survey_id))
    }

    async fn delete_by_survey(&mut self, survey_id: i32) -> Result<u64, Error> {
        let before = self.state.options.len();
        self.state.options.retain(|o| o.survey_id != survey_id);
        // ON DELETE CASCADE from options
        self.state.responses.retain(|r| r.survey_id != survey_id);
        Ok((before - self.state.options.len()) as u64)
    }

    async fn count(&mut self, survey_id: Option<i32>) -> Result<i64, Error> {
        Ok(self.state.options.iter().filter(|o| survey_id.map_or(true, |id| o.survey_id == id)).count() as i64)
    }
}

impl ResponseCommon for MemoryStore {
    async fn insert(&mut self, response: ResponseInsert) -> Result<Option<SurveyResponse>, Error> {
        let option_ok = self.state.options.iter().any(|o| o.id == response.option_id && o.survey_id == response.survey_id);
        let survey_ok = self.state.surveys.iter().any(|s| s.id == response.survey_id && s.is_active);
        if !option_ok || !survey_ok {
            return Ok(None);
        }
        let response = SurveyResponse {
            id: self.state.next_id(),
            survey_id: response.survey_id,
            option_id: response.option_id,
            respondent_email: response.respondent_email,
            response_date: Utc::now().naive_utc(),
        };
        self.state.responses.push(response.clone());
        Ok(Some(response))
    }

    async fn count_by_option(&mut self, survey_id: i32) -> Result<Vec<OptionCount>, Error> {
        let mut counts: BTreeMap<i32, i64> = BTreeMap::new();
        for r in self.state.responses.iter().filter(|r| r.survey_id == survey_id) {
            *counts.entry(r.option_id).or_default() += 1;
        }
        Ok(counts.into_iter().map(|(option_id, count)| OptionCount { option_id, count }).collect())
    }

    async fn delete_by_survey(&mut self, survey_id: i32) -> Result<u64, Error> {
        let before = self.state.responses.len();
        self.state.responses.retain(|r| r.survey_id != survey_id);
        Ok((before - self.state.responses.len()) as u64)
    }

    async fn count(&mut self, survey_id: Option<i32>) -> Result<i64, Error> {
        Ok(self.state.responses.iter().filter(|r| survey_id.map_or(true, |id| r.survey_id == id)).count() as i64)
    }
}

impl Common for MemoryStore {}
impl Store for MemoryStore {}

impl TxStore for MemoryStore {
    async fn commit(mut self) -> Result<(), Error> {
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), Error> {
        if let Some(snapshot) = self.snapshot.take() {
            *self.state = snapshot;
        }
        Ok(())
    }
}
