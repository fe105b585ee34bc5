use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Value, json};

use staffroom_infra::repository::Repository;
use staffroom_staff::Employee;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::constants::CURRENT_EMPLOYEE;
use crate::context::CurrentEmployee;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// The employee named by the request header, or `null` for anonymous requests.
pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentEmployee>,
) -> Response {
    let Some(employee_id) = current.employee_id() else {
        return Json(json!({ CURRENT_EMPLOYEE: Value::Null })).into_response();
    };
    match services
        .repository::<Employee>()
        .and_then(|repo| repo.load(employee_id))
    {
        Ok(employee) => Json(json!({ CURRENT_EMPLOYEE: dto::employee_to_json(&employee) })).into_response(),
        Err(e) => errors::repository_error_to_response(&e),
    }
}
