use crate::actix_web::FromRequest;
use crate::actix_web::{self, Error, HttpMessage};
use std::future::{ready, Ready};

/// Identity attached by the JWT middleware. Extract as `Option<UserInfo>`
/// on routes that also serve anonymous callers.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: i32,
}

impl FromRequest for UserInfo {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<Self>() {
            ready(Ok(user.clone()))
        } else {
            ready(Err(actix_web::error::ErrorUnauthorized("")))
        }
    }
}

pub fn caller(user: Option<UserInfo>) -> Option<i32> {
    user.map(|u| u.id)
}
