use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SurveyResponse {
    pub id: i32,
    pub survey_id: i32,
    pub option_id: i32,
    pub respondent_email: Option<String>,
    pub response_date: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Submit {
    pub option_id: Option<i32>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub survey_id: i32,
    pub option_id: i32,
    pub respondent_email: Option<String>,
}

/// Number of stored responses pointing at one option.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OptionCount {
    pub option_id: i32,
    pub count: i64,
}
