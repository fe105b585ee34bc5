use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::json;

use staffroom_infra::commands::{
    AssignEmployeeToTeamCommandMessage, CreateTeamCommandMessage,
    RemoveEmployeeFromTeamCommandMessage, UpdateTeamEmployeeCommandMessage,
};
use staffroom_infra::repository::{Repository, TeamEmployeeRepository, TeamRepository};
use staffroom_staff::{Employee, Team, TeamEmployee};

use crate::app::dto::{self, Identified, MembershipRequest, PageQuery, TeamRequest, UpdateMembershipRequest};
use crate::app::errors;
use crate::app::routes::common::{command_response, parse_id};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route("/:id", get(get_team))
        .route("/:id/members", get(list_members).post(assign_member))
        .route(
            "/:id/members/:employee_id",
            put(update_member).delete(remove_member),
        )
}

pub async fn create_team(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<TeamRequest>,
) -> Response {
    let outcome = services.process::<TeamRequest, CreateTeamCommandMessage, Team>(&body);
    command_response(outcome, StatusCode::CREATED, "team created", |team| dto::team_to_json(&team))
}

pub async fn list_teams(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let request = match services.page_request(query.page_index, query.page_size) {
        Ok(request) => request,
        Err(e) => return errors::domain_error_to_response(&e),
    };
    match services
        .repository::<Team>()
        .and_then(|repo| repo.get_paged(request))
    {
        Ok(page) => (StatusCode::OK, Json(dto::page_to_json(page, |t| dto::team_to_json(&t)))).into_response(),
        Err(e) => errors::repository_error_to_response(&e),
    }
}

pub async fn get_team(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id("team", &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services
        .repository::<Team>()
        .and_then(|repo| repo.get_with_employees(id))
    {
        Ok(Some(view)) => (StatusCode::OK, Json(dto::team_view_to_json(view))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("team {id} not found")),
        Err(e) => errors::repository_error_to_response(&e),
    }
}

/// Paged membership records of one team, each with its employee.
pub async fn list_members(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let team_id = match parse_id("team", &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let request = match services.page_request(query.page_index, query.page_size) {
        Ok(request) => request,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    let page = services.repository::<Team>().and_then(|teams| {
        teams.load(team_id)?;
        let memberships = services.repository::<TeamEmployee>()?;
        let employees = services.repository::<Employee>()?;
        let page = memberships.get_paged_for_team(team_id, request)?;
        let mut members = page
            .items
            .iter()
            .map(|m| employees.get_by_id(m.employee_id()))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();
        Ok(page.map(|m| dto::membership_to_json(&m, members.next().flatten().as_ref())))
    });

    match page {
        Ok(page) => (StatusCode::OK, Json(dto::page_to_json(page, |m| m))).into_response(),
        Err(e) => errors::repository_error_to_response(&e),
    }
}

pub async fn assign_member(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<MembershipRequest>,
) -> Response {
    let team_id = match parse_id("team", &id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let form = Identified::new(team_id, body);
    let outcome = services
        .process::<Identified<MembershipRequest>, AssignEmployeeToTeamCommandMessage, TeamEmployee>(&form);
    command_response(outcome, StatusCode::CREATED, "employee assigned to team", |membership| {
        dto::membership_to_json(&membership, None)
    })
}

pub async fn update_member(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, employee_id)): Path<(String, String)>,
    Json(body): Json<UpdateMembershipRequest>,
) -> Response {
    let (team_id, employee_id) = match (parse_id("team", &id), parse_id("employee", &employee_id)) {
        (Ok(team_id), Ok(employee_id)) => (team_id, employee_id),
        (Err(response), _) | (_, Err(response)) => return response,
    };
    let command = UpdateTeamEmployeeCommandMessage {
        team_id,
        employee_id,
        role: body.role,
        joined_on: body.joined_on,
    };
    let outcome = services.process_command::<_, TeamEmployee>(&command);
    command_response(outcome, StatusCode::OK, "membership updated", |membership| {
        dto::membership_to_json(&membership, None)
    })
}

pub async fn remove_member(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, employee_id)): Path<(String, String)>,
) -> Response {
    let (team_id, employee_id) = match (parse_id("team", &id), parse_id("employee", &employee_id)) {
        (Ok(team_id), Ok(employee_id)) => (team_id, employee_id),
        (Err(response), _) | (_, Err(response)) => return response,
    };
    let command = RemoveEmployeeFromTeamCommandMessage { team_id, employee_id };
    let outcome = services.process_command::<_, ()>(&command);
    command_response(outcome, StatusCode::OK, "employee removed from team", |()| {
        json!({ "team_id": team_id, "employee_id": employee_id })
    })
}
