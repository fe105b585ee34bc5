use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use staffroom_infra::commands::{
    LendItemCommandMessage, RegisterLoanedItemCommandMessage, ReturnItemCommandMessage,
};
use staffroom_infra::repository::LoanedItemRepository;
use staffroom_staff::LoanedItem;

use crate::app::dto::{self, Identified, LoanQuery, LoanRequest};
use crate::app::errors;
use crate::app::routes::common::{command_response, parse_id};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(register_item))
        .route("/:id/lend", post(lend_item))
        .route("/:id/return", post(return_item))
}

pub async fn register_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterLoanedItemCommandMessage>,
) -> Response {
    let outcome = services
        .process::<RegisterLoanedItemCommandMessage, RegisterLoanedItemCommandMessage, LoanedItem>(&body);
    command_response(outcome, StatusCode::CREATED, "item registered", |item| {
        dto::loaned_item_to_json(&item)
    })
}

/// Items on the shelf, or the items one employee currently holds.
pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<LoanQuery>,
) -> Response {
    let items = services.repository::<LoanedItem>().and_then(|repo| match query.employee_id {
        Some(employee_id) => repo.get_loaned_to(employee_id),
        None => repo.get_available(),
    });
    match items {
        Ok(items) => {
            let items = items.iter().map(dto::loaned_item_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(json!({ "items": items }))).into_response()
        }
        Err(e) => errors::repository_error_to_response(&e),
    }
}

pub async fn lend_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<LoanRequest>,
) -> Response {
    let item_id = match parse_id("item", &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let form = Identified::new(item_id, body);
    let outcome = services.process::<Identified<LoanRequest>, LendItemCommandMessage, LoanedItem>(&form);
    command_response(outcome, StatusCode::OK, "item lent", |item| dto::loaned_item_to_json(&item))
}

pub async fn return_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<LoanRequest>,
) -> Response {
    let item_id = match parse_id("item", &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let form = Identified::new(item_id, body);
    let outcome = services.process::<Identified<LoanRequest>, ReturnItemCommandMessage, LoanedItem>(&form);
    command_response(outcome, StatusCode::OK, "item returned", |item| dto::loaned_item_to_json(&item))
}
