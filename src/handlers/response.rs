use crate::actix_web::{
    http::StatusCode,
    web::{Data, Json, Path},
    HttpResponse,
};
use crate::core::models::response::Submit;
use crate::core::models::survey::PublicSurvey;
use crate::core::ports::repository::Manager;
use crate::core::services::{response, survey};
use crate::error::Error;
use serde_json::json;

/// Anonymous submission, no session needed.
pub async fn submit<M>(path: Path<(i32,)>, Json(body): Json<Submit>, manager: Data<M>) -> Result<HttpResponse, Error>
where
    M: Manager,
{
    let (id,) = path.into_inner();
    let recorded = response::submit_response(manager.tx().await?, id, body).await?;
    Ok(HttpResponse::build(StatusCode::CREATED).json(json!({
        "message": "response submitted",
        "response_id": recorded.id,
    })))
}

pub async fn public<M>(path: Path<(i32,)>, manager: Data<M>) -> Result<Json<PublicSurvey>, Error>
where
    M: Manager,
{
    let (id,) = path.into_inner();
    let survey = survey::public_survey(&mut manager.db().await?, id).await?;
    Ok(Json(survey))
}
