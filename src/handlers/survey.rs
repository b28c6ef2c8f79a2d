use crate::actix_web::{
    http::StatusCode,
    web::{Data, Json, Path},
    HttpRequest, HttpResponse,
};
use crate::context::{caller, UserInfo};
use crate::core::models::survey::{SurveyCreate, SurveyDetail, Update};
use crate::core::ports::repository::Manager;
use crate::core::services::survey::{self, SurveyResults};
use crate::error::Error;
use crate::response::List;
use crate::serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
pub struct SurveyView {
    #[serde(flatten)]
    detail: SurveyDetail,
    share_link: String,
}

impl SurveyView {
    fn new(req: &HttpRequest, detail: SurveyDetail) -> Self {
        let info = req.connection_info();
        let share_link = format!("{}://{}/respond/{}", info.scheme(), info.host(), detail.survey.id);
        Self { detail, share_link }
    }
}

pub async fn list<M>(user_info: Option<UserInfo>, manager: Data<M>) -> Result<Json<List<SurveyDetail>>, Error>
where
    M: Manager,
{
    let surveys = survey::list_surveys(&mut manager.db().await?, caller(user_info)).await?;
    Ok(Json(surveys.into()))
}

pub async fn create<M>(req: HttpRequest, user_info: Option<UserInfo>, Json(body): Json<SurveyCreate>, manager: Data<M>) -> Result<HttpResponse, Error>
where
    M: Manager,
{
    let detail = survey::create_survey(manager.tx().await?, caller(user_info), body).await?;
    Ok(HttpResponse::build(StatusCode::CREATED).json(json!({
        "message": "survey created",
        "survey": SurveyView::new(&req, detail),
    })))
}

pub async fn detail<M>(req: HttpRequest, user_info: Option<UserInfo>, path: Path<(i32,)>, manager: Data<M>) -> Result<Json<SurveyView>, Error>
where
    M: Manager,
{
    let (id,) = path.into_inner();
    let detail = survey::get_survey(&mut manager.db().await?, caller(user_info), id).await?;
    Ok(Json(SurveyView::new(&req, detail)))
}

pub async fn update<M>(
    req: HttpRequest,
    user_info: Option<UserInfo>,
    path: Path<(i32,)>,
    Json(body): Json<Update>,
    manager: Data<M>,
) -> Result<HttpResponse, Error>
where
    M: Manager,
{
    let (id,) = path.into_inner();
    let detail = survey::update_survey(manager.tx().await?, caller(user_info), id, body).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "survey updated",
        "survey": SurveyView::new(&req, detail),
    })))
}

pub async fn toggle<M>(req: HttpRequest, user_info: Option<UserInfo>, path: Path<(i32,)>, manager: Data<M>) -> Result<HttpResponse, Error>
where
    M: Manager,
{
    let (id,) = path.into_inner();
    let detail = survey::toggle_survey(manager.tx().await?, caller(user_info), id).await?;
    let message = if detail.survey.is_active { "survey activated" } else { "survey deactivated" };
    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "survey": SurveyView::new(&req, detail),
    })))
}

pub async fn delete<M>(user_info: Option<UserInfo>, path: Path<(i32,)>, manager: Data<M>) -> Result<HttpResponse, Error>
where
    M: Manager,
{
    let (id,) = path.into_inner();
    survey::delete_survey(manager.tx().await?, caller(user_info), id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "survey deleted" })))
}

pub async fn results<M>(user_info: Option<UserInfo>, path: Path<(i32,)>, manager: Data<M>) -> Result<Json<SurveyResults>, Error>
where
    M: Manager,
{
    let (id,) = path.into_inner();
    let results = survey::survey_results(&mut manager.db().await?, caller(user_info), id).await?;
    Ok(Json(results))
}
