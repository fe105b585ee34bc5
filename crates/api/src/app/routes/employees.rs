use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use staffroom_core::EntityId;
use staffroom_infra::commands::{
    CreateEmployeeCommandMessage, DeleteEmployeeCommandMessage, UpdateEmployeeCommandMessage,
};
use staffroom_infra::repository::EmployeeRepository;
use staffroom_staff::Employee;

use crate::app::dto::{self, EmployeeRequest, Identified, PageQuery};
use crate::app::errors;
use crate::app::routes::common::{command_response, parse_id};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_employee).get(list_employees))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

pub async fn create_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<EmployeeRequest>,
) -> Response {
    let outcome = services.process::<EmployeeRequest, CreateEmployeeCommandMessage, Employee>(&body);
    command_response(outcome, StatusCode::CREATED, "employee created", |employee| {
        dto::employee_to_json(&employee)
    })
}

pub async fn list_employees(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let request = match services.page_request(query.page_index, query.page_size) {
        Ok(request) => request,
        Err(e) => return errors::domain_error_to_response(&e),
    };
    let page = match services
        .repository::<Employee>()
        .and_then(|repo| repo.get_paged(request))
    {
        Ok(page) => page,
        Err(e) => return errors::repository_error_to_response(&e),
    };
    (StatusCode::OK, Json(dto::page_to_json(page, |e| dto::employee_to_json(&e)))).into_response()
}

pub async fn get_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id("employee", &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let view = services
        .repository::<Employee>()
        .and_then(|repo| repo.get_with_teams_and_items(id));
    match view {
        Ok(Some(view)) => (StatusCode::OK, Json(dto::employee_view_to_json(view))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("employee {id} not found")),
        Err(e) => errors::repository_error_to_response(&e),
    }
}

pub async fn update_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<EmployeeRequest>,
) -> Response {
    let id = match parse_id("employee", &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let form = Identified::new(id, body);
    let outcome =
        services.process::<Identified<EmployeeRequest>, UpdateEmployeeCommandMessage, Employee>(&form);
    command_response(outcome, StatusCode::OK, "employee updated", |employee| {
        dto::employee_to_json(&employee)
    })
}

pub async fn delete_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let employee_id = match parse_id("employee", &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let outcome = services.process_command::<_, EntityId>(&DeleteEmployeeCommandMessage { employee_id });
    command_response(outcome, StatusCode::OK, "employee deleted", |id| json!({ "id": id }))
}
