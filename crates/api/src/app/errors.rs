use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use staffroom_commands::{ProcessError, ValidationError};
use staffroom_core::DomainError;
use staffroom_infra::commands::HandlerError;
use staffroom_infra::repository::RepositoryError;
use staffroom_infra::session::SessionError;

use crate::constants::ERRORS;

pub fn process_error_to_response(err: ProcessError) -> Response {
    if let Some(handler) = err.handler_error::<HandlerError>() {
        return match handler {
            HandlerError::Domain(e) => domain_error_to_response(e),
            HandlerError::Repository(e) => repository_error_to_response(e),
            HandlerError::Session(e) => session_error_to_response(e),
        };
    }
    tracing::error!(error = %err, "command pipeline misconfigured");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "pipeline_error", err.to_string())
}

pub fn domain_error_to_response(err: &DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone()),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg.clone())
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg.clone()),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg.clone()),
    }
}

pub fn repository_error_to_response(err: &RepositoryError) -> Response {
    match err {
        RepositoryError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        RepositoryError::Session(e) => session_error_to_response(e),
        RepositoryError::Domain(e) => domain_error_to_response(e),
    }
}

pub fn session_error_to_response(err: &SessionError) -> Response {
    match err {
        SessionError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        SessionError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg.clone()),
        _ => {
            tracing::error!(error = %err, "session failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "session_error", err.to_string())
        }
    }
}

/// 422 carrying every failed rule as `{property, message}`.
pub fn validation_failed(errors: &[ValidationError]) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        axum::Json(json!({
            "error": "validation_failed",
            "message": format!("{} validation error(s)", errors.len()),
            ERRORS: errors,
        })),
    )
        .into_response()
}

pub fn invalid_id(what: &str, raw: &str) -> Response {
    json_error(
        StatusCode::BAD_REQUEST,
        "invalid_id",
        format!("invalid {what} id '{raw}'"),
    )
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffroom_core::EntityId;

    #[test]
    fn repository_failures_map_to_statuses() {
        let missing = RepositoryError::NotFound {
            entity: "employees",
            id: EntityId::new(3),
        };
        assert_eq!(repository_error_to_response(&missing).status(), StatusCode::NOT_FOUND);

        let conflict = RepositoryError::Session(SessionError::Conflict("stale".into()));
        assert_eq!(repository_error_to_response(&conflict).status(), StatusCode::CONFLICT);

        let poisoned = RepositoryError::Session(SessionError::Poisoned);
        assert_eq!(
            repository_error_to_response(&poisoned).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn domain_failures_map_to_statuses() {
        let cases = [
            (DomainError::validation("x"), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::invariant("x"), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::invalid_id("x"), StatusCode::BAD_REQUEST),
            (DomainError::not_found(), StatusCode::NOT_FOUND),
            (DomainError::conflict("x"), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(domain_error_to_response(&err).status(), status, "{err}");
        }
    }

    #[test]
    fn pipeline_misconfiguration_is_a_server_error() {
        let err = ProcessError::MissingConfiguration("Unregistered");
        assert_eq!(
            process_error_to_response(err).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
