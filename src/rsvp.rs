pub mod form;
pub mod notifier;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use crate::endpoints::api::schema::ErrorResponse;

#[derive(thiserror::Error, Debug)]
pub enum RsvpError {
    #[error("{0}")]
    Invalid(String),

    #[error("RSVP is closed")]
    Disabled,

    #[error("RSVP notifications are not configured")]
    NotConfigured,

    #[error("webhook delivery failed: {0}")]
    Webhook(String),
}

impl RsvpError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

impl From<reqwest::Error> for RsvpError {
    fn from(err: reqwest::Error) -> Self {
        Self::Webhook(err.to_string())
    }
}

impl ResponseError for RsvpError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Disabled => StatusCode::NOT_FOUND,
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::Webhook(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            Self::Invalid(msg) => msg.clone(),
            Self::Disabled => self.to_string(),
            // Details stay in the log.
            Self::NotConfigured | Self::Webhook(_) => {
                "An error occurred while sending your RSVP. Please try again.".to_string()
            }
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse { error })
    }
}
