use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use tracing::Instrument;

use staffroom_core::EntityId;
use staffroom_infra::session::SessionError;
use staffroom_infra::{SessionProvider, UnitOfWorkError, unit_of_work};

use crate::app::errors::json_error;
use crate::constants::CURRENT_EMPLOYEE_HEADER;
use crate::context::CurrentEmployee;

/// Bind a session to the request and wrap the request in a unit of work.
///
/// The unit of work is committed when the response is a success or redirect and
/// rolled back on any error status. A commit that lost a write conflict to another
/// request answers 409; any other failed commit answers 500.
pub async fn unit_of_work_middleware(
    State(sessions): State<SessionProvider>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    sessions
        .scope(async move {
            let mut uow = match unit_of_work::start() {
                Ok(uow) => uow,
                Err(err) => {
                    tracing::error!(error = %err, "could not start unit of work");
                    return json_error(StatusCode::INTERNAL_SERVER_ERROR, "unit_of_work_error", err.to_string());
                }
            };
            let uow_id = uow.id();
            let span = tracing::info_span!("request", %method, %path, %uow_id);

            let response = next.run(req).instrument(span).await;
            let status = response.status();

            if status.is_client_error() || status.is_server_error() {
                if let Err(err) = uow.rollback() {
                    tracing::error!(%uow_id, error = %err, "rollback failed");
                }
                tracing::info!(%uow_id, status = status.as_u16(), "request rolled back");
                return response;
            }

            match uow.commit() {
                Ok(()) => {
                    tracing::debug!(%uow_id, status = status.as_u16(), "request committed");
                    response
                }
                Err(UnitOfWorkError::Session(SessionError::Conflict(msg))) => {
                    tracing::info!(%uow_id, conflict = %msg, "request lost a write conflict");
                    json_error(StatusCode::CONFLICT, "conflict", msg)
                }
                Err(err) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "commit_failed", err.to_string()),
            }
        })
        .await
}

/// Resolve the acting employee from the request headers.
pub async fn current_employee_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    match extract_current_employee(req.headers()) {
        Ok(current) => {
            req.extensions_mut().insert(current);
            next.run(req).await
        }
        Err(message) => json_error(StatusCode::BAD_REQUEST, "invalid_current_employee", message),
    }
}

fn extract_current_employee(headers: &HeaderMap) -> Result<CurrentEmployee, String> {
    let Some(header) = headers.get(CURRENT_EMPLOYEE_HEADER) else {
        return Ok(CurrentEmployee::default());
    };
    let raw = header
        .to_str()
        .map_err(|_| format!("{CURRENT_EMPLOYEE_HEADER} must be ASCII"))?
        .trim();
    let id: EntityId = raw.parse().map_err(|e| format!("{CURRENT_EMPLOYEE_HEADER}: {e}"))?;
    if id.is_transient() {
        return Err(format!("{CURRENT_EMPLOYEE_HEADER} must name a saved employee"));
    }
    Ok(CurrentEmployee::new(Some(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn current_employee_header_is_optional_but_must_be_valid() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_current_employee(&headers), Ok(CurrentEmployee::default()));

        headers.insert(CURRENT_EMPLOYEE_HEADER, HeaderValue::from_static(" 7 "));
        assert_eq!(
            extract_current_employee(&headers).unwrap().employee_id(),
            Some(EntityId::new(7))
        );

        headers.insert(CURRENT_EMPLOYEE_HEADER, HeaderValue::from_static("0"));
        assert!(extract_current_employee(&headers).is_err());

        headers.insert(CURRENT_EMPLOYEE_HEADER, HeaderValue::from_static("seven"));
        assert!(extract_current_employee(&headers).is_err());
    }
}
