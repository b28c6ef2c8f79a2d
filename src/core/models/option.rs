use serde::Serialize;
use sqlx::FromRow;

pub const MIN_ORDER: i32 = 1;
pub const MAX_ORDER: i32 = 5;
pub const OPTION_MAX_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SurveyOption {
    pub id: i32,
    pub survey_id: i32,
    pub option_text: String,
    pub option_order: i32,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub survey_id: i32,
    pub option_text: String,
    pub option_order: i32,
}

#[derive(Debug, Default)]
pub struct Query {
    pub survey_id_in: Vec<i32>,
}
