use crate::actix_web::http::StatusCode;
use crate::actix_web::{HttpResponse, ResponseError};
use crate::jsonwebtoken::errors::Error as JsonWebTokenError;
use crate::serde::Serialize;
use crate::sqlx::Error as SqlxError;
use crate::thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("survey title is required")]
    MissingTitle,

    #[error("survey must have between 2 and 5 options, got {0}")]
    InvalidOptionCount(usize),

    #[error("survey options must not be blank")]
    BlankOption,

    #[error("duplicate survey option: {0}")]
    DuplicateOption(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("invalid option for this survey")]
    OptionNotInSurvey,

    #[error("survey not found")]
    NotFound,

    #[error("survey not found or inactive")]
    SurveyInactiveOrMissing,

    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("token error: {0}")]
    TokenError(#[from] JsonWebTokenError),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    fn class(&self) -> (StatusCode, &'static str) {
        match self {
            Error::MissingTitle
            | Error::InvalidOptionCount(_)
            | Error::BlankOption
            | Error::DuplicateOption(_)
            | Error::MissingField(_)
            | Error::TooLong(..)
            | Error::PasswordMismatch
            | Error::MalformedRequest(_)
            | Error::OptionNotInSurvey => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Error::NotFound | Error::SurveyInactiveOrMissing => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::Unauthenticated | Error::InvalidCredentials => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            Error::DuplicateEmail => (StatusCode::CONFLICT, "CONFLICT"),
            Error::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            Error::TokenError(_) | Error::ConfigError(_) | Error::IoError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn kind(&self) -> &'static str {
        self.class().1
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        self.class().0
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("{}", self);
            "internal server error".to_owned()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ErrorBody { error: self.kind(), message })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_inactive_survey_reads_as_not_found() {
        assert_eq!(Error::SurveyInactiveOrMissing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::SurveyInactiveOrMissing.kind(), Error::NotFound.kind());
    }

    #[test]
    fn test_status_classes() {
        assert_eq!(Error::InvalidOptionCount(6).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::PasswordMismatch.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::DuplicateEmail.status_code(), StatusCode::CONFLICT);
        assert_eq!(Error::DatabaseError(SqlxError::RowNotFound).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(Error::DatabaseError(SqlxError::RowNotFound).kind(), "STORAGE_ERROR");
        assert_eq!(Error::MalformedRequest("bad json".into()).kind(), "VALIDATION_ERROR");
        assert_eq!(Error::ConfigError("x".into()).kind(), "INTERNAL_ERROR");
    }
}
