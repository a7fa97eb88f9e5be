use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(what) => AppError::NotFound(what),
            DomainError::InvalidInput(msg) => AppError::BadRequest(msg),
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            e @ (DomainError::DuplicateCode(_)
            | DomainError::CouponUnavailable
            | DomainError::InvalidTransition { .. }) => AppError::Conflict(e.to_string()),
            e @ DomainError::CodeSpaceExhausted { .. } => AppError::Unavailable(e.to_string()),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<BlockingError> for AppError {
    fn from(e: BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::Validation(errors) => builder.json(serde_json::json!({
                "error": self.to_string(),
                "details": errors
            })),
            AppError::Internal(msg) => {
                log::error!("{}", msg);
                builder.json(serde_json::json!({
                    "error": "Internal server error"
                }))
            }
            AppError::Unavailable(msg) => {
                log::warn!("{}", msg);
                builder.json(serde_json::json!({
                    "error": self.to_string()
                }))
            }
            _ => builder.json(serde_json::json!({
                "error": self.to_string()
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use actix_web::ResponseError;

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound("Order").error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_display() {
        assert_eq!(AppError::NotFound("Seller").to_string(), "Seller not found");
    }

    #[test]
    fn validation_errors_return_400() {
        let err = AppError::Validation(ValidationErrors::new());
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn domain_not_found_maps_to_app_not_found() {
        let app_err: AppError = DomainError::NotFound("Product").into();
        assert!(matches!(app_err, AppError::NotFound("Product")));
    }

    #[test]
    fn domain_invalid_input_maps_to_bad_request() {
        let app_err: AppError = DomainError::InvalidInput("bad value".to_string()).into();
        assert!(matches!(app_err, AppError::BadRequest(_)));
    }

    #[test]
    fn domain_conflicts_map_to_409() {
        let cases = [
            DomainError::DuplicateCode("ABC123".to_string()),
            DomainError::CouponUnavailable,
            DomainError::Conflict("in use".to_string()),
            DomainError::InvalidTransition {
                from: OrderStatus::Completed,
                to: OrderStatus::Pending,
            },
        ];
        for case in cases {
            let app_err: AppError = case.into();
            assert_eq!(app_err.status_code(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn exhausted_code_space_is_503() {
        let app_err: AppError = DomainError::CodeSpaceExhausted { attempts: 100 }.into();
        assert_eq!(app_err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(app_err.to_string().contains("100 attempts"));
    }

    #[test]
    fn domain_internal_maps_to_app_internal() {
        let app_err: AppError = DomainError::Internal("oops".to_string()).into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }
}
