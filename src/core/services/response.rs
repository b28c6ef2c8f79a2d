use super::{check_len, non_blank};
use crate::core::models::response::{Insert as ResponseInsert, Submit, SurveyResponse};
use crate::core::models::user::EMAIL_MAX_LEN;
use crate::core::ports::repository::{finish, OptionCommon, ResponseCommon, SurveyCommon, TxStore};
use crate::error::Error;

async fn submit_in<T>(tx: &mut T, survey_id: i32, submit: Submit) -> Result<SurveyResponse, Error>
where
    T: TxStore,
{
    let option_id = submit.option_id.ok_or(Error::MissingField("option"))?;
    let respondent_email = non_blank(submit.email);
    if let Some(email) = &respondent_email {
        check_len(email, "email", EMAIL_MAX_LEN)?;
    }
    if SurveyCommon::get_active(tx, survey_id).await?.is_none() {
        return Err(Error::SurveyInactiveOrMissing);
    }
    if !OptionCommon::is_belongs_to_survey(tx, survey_id, option_id).await? {
        return Err(Error::OptionNotInSurvey);
    }
    // the insert re-checks both conditions itself
    ResponseCommon::insert(
        tx,
        ResponseInsert {
            survey_id,
            option_id,
            respondent_email,
        },
    )
    .await?
    .ok_or(Error::SurveyInactiveOrMissing)
}

/// Records one anonymous response against an active survey.
pub async fn submit_response<T>(mut tx: T, survey_id: i32, submit: Submit) -> Result<SurveyResponse, Error>
where
    T: TxStore,
{
    let res = submit_in(&mut tx, survey_id, submit).await;
    let response = finish(tx, res).await?;
    log::info!("recorded response {} for survey {}", response.id, survey_id);
    Ok(response)
}
