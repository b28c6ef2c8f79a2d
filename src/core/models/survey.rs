use crate::core::models::option::SurveyOption;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

pub const TITLE_MAX_LEN: usize = 200;
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Survey {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Survey together with its options in display order.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyDetail {
    #[serde(flatten)]
    pub survey: Survey,
    pub options: Vec<SurveyOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurveyCreate {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub user_id: i32,
    pub title: String,
    pub description: Option<String>,
}

/// Partial update. `None` leaves the column untouched, `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn present<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(de).map(Some)
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicSurvey {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub options: Vec<SurveyOption>,
}

impl From<SurveyDetail> for PublicSurvey {
    fn from(SurveyDetail { survey, options }: SurveyDetail) -> Self {
        Self {
            id: survey.id,
            title: survey.title,
            description: survey.description,
            options,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_update_distinguishes_absent_and_null_description() {
        let absent: Update = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert_eq!(absent.description, None);
        assert_eq!(absent.title.as_deref(), Some("t"));

        let cleared: Update = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: Update = serde_json::from_str(r#"{"description": "d", "is_active": false}"#).unwrap();
        assert_eq!(set.description, Some(Some("d".to_owned())));
        assert_eq!(set.is_active, Some(false));
    }
}
