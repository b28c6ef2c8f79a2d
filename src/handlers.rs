pub mod response;
pub mod survey;

use crate::actix_web::{
    cookie::{time::Duration as CookieDuration, time::OffsetDateTime, Cookie, CookieBuilder},
    http::StatusCode,
    web::{get, post, put, scope, Data, Json, JsonConfig, PathConfig, ServiceConfig},
    HttpResponse, HttpResponseBuilder,
};
use crate::context::{caller, UserInfo};
use crate::core::models::user::{Profile, ProfileUpdate, Register};
use crate::core::ports::repository::Manager;
use crate::core::ports::tokener::Tokener;
use crate::core::services::user;
use crate::error::Error;
use crate::impls::hasher::sha256::Sha256Hasher;
use crate::impls::tokener::jwt::{Claim, JWT};
use crate::middlewares::jwt::JWT_TOKEN;
use crate::serde::{Deserialize, Serialize};
use serde_json::json;

/// Session lifetime in days.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtl(pub i64);

pub fn configure<M>(cfg: &mut ServiceConfig)
where
    M: Manager + 'static,
{
    // extractor failures answer with the same JSON error body as the services
    cfg.app_data(JsonConfig::default().error_handler(|err, _| Error::MalformedRequest(err.to_string()).into()))
        .app_data(PathConfig::default().error_handler(|_, _| Error::NotFound.into()));
    cfg.service(
        scope("/auth")
            .route("/register", post().to(register::<M>))
            .route("/login", post().to(login::<M>))
            .route("/logout", post().to(logout))
            .route("/profile", get().to(profile::<M>))
            .route("/profile", put().to(update_profile::<M>)),
    )
    .service(
        scope("/api/surveys")
            .route("", get().to(survey::list::<M>))
            .route("", post().to(survey::create::<M>))
            .service(
                scope("/{id}")
                    .route("", get().to(survey::detail::<M>))
                    .route("", put().to(survey::update::<M>))
                    .route("", actix_web::web::delete().to(survey::delete::<M>))
                    .route("/toggle", post().to(survey::toggle::<M>))
                    .route("/results", get().to(survey::results::<M>))
                    .route("/respond", post().to(response::submit::<M>)),
            ),
    )
    .route("/respond/{id}", get().to(response::public::<M>));
}

pub async fn register<M>(Json(body): Json<Register>, manager: Data<M>, hasher: Data<Sha256Hasher>) -> Result<HttpResponse, Error>
where
    M: Manager,
{
    let id = user::register(manager.tx().await?, hasher.get_ref(), body).await?;
    Ok(HttpResponse::build(StatusCode::CREATED).json(json!({ "message": "registration successful", "id": id })))
}

#[derive(Debug, Deserialize)]
pub struct Login {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    user: Profile,
}

pub async fn login<M>(
    Json(Login { email, password }): Json<Login>,
    manager: Data<M>,
    hasher: Data<Sha256Hasher>,
    tokener: Data<JWT>,
    ttl: Data<TokenTtl>,
) -> Result<HttpResponse, Error>
where
    M: Manager,
{
    let email = email.ok_or(Error::MissingField("email"))?;
    let password = password.ok_or(Error::MissingField("password"))?;
    let user = user::login(manager.tx().await?, hasher.get_ref(), &email, &password).await?;
    let token = tokener.gen_token(&Claim::new(user.id, ttl.0))?;
    log::info!("user {} logged in", user.id);
    Ok(HttpResponse::build(StatusCode::OK)
        .cookie(Cookie::build(JWT_TOKEN, token.clone()).path("/").http_only(true).max_age(CookieDuration::days(ttl.0)).finish())
        .json(LoginResponse { token, user: user.into() }))
}

pub async fn logout() -> HttpResponse {
    HttpResponseBuilder::new(StatusCode::OK)
        .cookie(CookieBuilder::new(JWT_TOKEN, "").path("/").expires(OffsetDateTime::now_utc()).finish())
        .json(json!({ "message": "logged out" }))
}

pub async fn profile<M>(user_info: Option<UserInfo>, manager: Data<M>) -> Result<Json<Profile>, Error>
where
    M: Manager,
{
    let profile = user::profile(&mut manager.db().await?, caller(user_info)).await?;
    Ok(Json(profile))
}

pub async fn update_profile<M>(user_info: Option<UserInfo>, Json(body): Json<ProfileUpdate>, manager: Data<M>, hasher: Data<Sha256Hasher>) -> Result<Json<Profile>, Error>
where
    M: Manager,
{
    let profile = user::update_profile(manager.tx().await?, hasher.get_ref(), caller(user_info), body).await?;
    Ok(Json(profile))
}
