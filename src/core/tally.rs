use crate::core::models::{
    option::{Query as OptionQuery, SurveyOption},
    response::OptionCount,
};
use crate::core::ports::repository::{OptionCommon, ResponseCommon};
use crate::error::Error;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TallyEntry {
    pub option_id: i32,
    pub option_text: String,
    pub option_order: i32,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally {
    pub survey_id: i32,
    pub entries: Vec<TallyEntry>,
    pub total: i64,
}

/// Counts keyed by option text, serialized as a JSON object in option order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionCounts(pub Vec<(String, i64)>);

impl OptionCounts {
    pub fn sum(&self) -> i64 {
        self.0.iter().map(|(_, c)| c).sum()
    }
}

impl Serialize for OptionCounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|(text, count)| (text, count)))
    }
}

impl Tally {
    pub fn results(&self) -> OptionCounts {
        OptionCounts(self.entries.iter().map(|e| (e.option_text.clone(), e.count)).collect())
    }
}

/// Folds per-option counts onto the survey's option set.
///
/// Every option of the survey gets an entry, zero when nothing points at it.
/// Counts for options outside the set are dropped, so `total` is always the
/// sum of the entries.
pub fn tally(survey_id: i32, options: &[SurveyOption], counts: &[OptionCount]) -> Tally {
    let counts: HashMap<i32, i64> = counts.iter().map(|c| (c.option_id, c.count)).collect();
    let mut entries: Vec<TallyEntry> = options
        .iter()
        .filter(|o| o.survey_id == survey_id)
        .map(|o| TallyEntry {
            option_id: o.id,
            option_text: o.option_text.clone(),
            option_order: o.option_order,
            count: counts.get(&o.id).copied().unwrap_or(0),
        })
        .collect();
    entries.sort_by_key(|e| (e.option_order, e.option_id));
    let total = entries.iter().map(|e| e.count).sum();
    Tally { survey_id, entries, total }
}

/// Reads current options and counts; no caching, no writes.
pub async fn tally_survey<S>(store: &mut S, survey_id: i32) -> Result<Tally, Error>
where
    S: OptionCommon + ResponseCommon,
{
    let options = OptionCommon::query(
        store,
        &OptionQuery {
            survey_id_in: vec![survey_id],
            ..default::default()
        },
    )
    .await?;
    let counts = ResponseCommon::count_by_option(store, survey_id).await?;
    Ok(tally(survey_id, &options, &counts))
}
