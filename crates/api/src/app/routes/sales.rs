use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use staffroom_consumer_protection::{Article, Salesman, SalesmanArticle};
use staffroom_core::{Entity, EntityId};
use staffroom_infra::commands::{
    RecordSaleCommandMessage, RegisterArticleCommandMessage, RegisterSalesmanCommandMessage,
};
use staffroom_infra::repository::{Repository, SalesmanArticleRepository};

use crate::app::dto::{Identified, SaleRequest};
use crate::app::errors;
use crate::app::routes::common::{command_response, parse_id};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/articles", post(register_article))
        .route("/salesmen", post(register_salesman))
        .route("/salesmen/:id/sales", post(record_sale).get(list_sales))
        .route("/salesmen/:id/report", get(salesman_report))
        .route("/report", get(full_report))
}

pub async fn register_article(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterArticleCommandMessage>,
) -> Response {
    let outcome = services
        .process::<RegisterArticleCommandMessage, RegisterArticleCommandMessage, Article>(&body);
    command_response(outcome, StatusCode::CREATED, "article registered", |article| {
        json!({
            "id": article.id(),
            "description": article.description(),
            "unit_price": article.unit_price(),
        })
    })
}

pub async fn register_salesman(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterSalesmanCommandMessage>,
) -> Response {
    let outcome = services
        .process::<RegisterSalesmanCommandMessage, RegisterSalesmanCommandMessage, Salesman>(&body);
    command_response(outcome, StatusCode::CREATED, "salesman registered", |salesman| {
        json!({ "id": salesman.id(), "name": salesman.name() })
    })
}

pub async fn record_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<SaleRequest>,
) -> Response {
    let salesman_id = match parse_id("salesman", &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let form = Identified::new(salesman_id, body);
    let outcome =
        services.process::<Identified<SaleRequest>, RecordSaleCommandMessage, SalesmanArticle>(&form);
    command_response(outcome, StatusCode::CREATED, "sale recorded", |sale| sale_to_json(&sale))
}

pub async fn list_sales(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let salesman_id = match parse_id("salesman", &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let sales = services.repository::<Salesman>().and_then(|salesmen| {
        salesmen.load(salesman_id)?;
        services
            .repository::<SalesmanArticle>()?
            .get_for_salesman(salesman_id)
    });
    match sales {
        Ok(sales) => {
            let items = sales.iter().map(sale_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(json!({ "items": items }))).into_response()
        }
        Err(e) => errors::repository_error_to_response(&e),
    }
}

pub async fn salesman_report(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let salesman_id = match parse_id("salesman", &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    if let Err(e) = services
        .repository::<Salesman>()
        .and_then(|salesmen| salesmen.load(salesman_id))
    {
        return errors::repository_error_to_response(&e);
    }
    report(&services, Some(salesman_id))
}

pub async fn full_report(Extension(services): Extension<Arc<AppServices>>) -> Response {
    report(&services, None)
}

fn report(services: &AppServices, salesman_id: Option<EntityId>) -> Response {
    match services
        .repository::<SalesmanArticle>()
        .and_then(|repo| repo.grouped_by_month_and_description(salesman_id))
    {
        Ok(rows) => (StatusCode::OK, Json(json!({ "rows": rows }))).into_response(),
        Err(e) => errors::repository_error_to_response(&e),
    }
}

fn sale_to_json(sale: &SalesmanArticle) -> serde_json::Value {
    json!({
        "id": sale.id(),
        "salesman_id": sale.salesman_id(),
        "article_id": sale.article_id(),
        "sold_on": sale.sold_on(),
        "amount": sale.amount(),
        "cost": sale.cost(),
    })
}
