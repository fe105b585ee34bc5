use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

use staffroom_core::{Entity, EntityId, Page};
use staffroom_infra::repository::{EmployeeView, TeamView};
use staffroom_staff::{Employee, LoanedItem, Team, TeamEmployee};

use crate::constants::{LOANED_ITEMS, PAGE_INDEX, PAGE_SIZE, TEAMS};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub hired_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembershipRequest {
    pub employee_id: EntityId,
    pub role: Option<String>,
    pub joined_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMembershipRequest {
    pub role: String,
    pub joined_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoanRequest {
    pub employee_id: EntityId,
    pub on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleRequest {
    pub article_id: EntityId,
    pub amount: i32,
    pub sold_on: Option<NaiveDate>,
    pub cost: Option<i64>,
}

/// A request body addressed to the entity named in the path.
#[derive(Debug, Clone)]
pub struct Identified<T> {
    pub id: EntityId,
    pub body: T,
}

impl<T> Identified<T> {
    pub fn new(id: EntityId, body: T) -> Self {
        Self { id, body }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page_index: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoanQuery {
    pub employee_id: Option<EntityId>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn page_to_json<T>(page: Page<T>, item: impl Fn(T) -> Value) -> Value {
    let total_pages = page.total_pages();
    let has_previous = page.has_previous();
    let has_next = page.has_next();
    json!({
        PAGE_INDEX: page.index,
        PAGE_SIZE: page.size,
        "total_count": page.total_count,
        "total_pages": total_pages,
        "has_previous": has_previous,
        "has_next": has_next,
        "items": page.items.into_iter().map(item).collect::<Vec<_>>(),
    })
}

pub fn employee_to_json(employee: &Employee) -> Value {
    json!({
        "id": employee.id(),
        "first_name": employee.first_name(),
        "last_name": employee.last_name(),
        "full_name": employee.full_name(),
        "email": employee.email(),
        "hired_on": employee.hired_on(),
    })
}

pub fn employee_view_to_json(view: EmployeeView) -> Value {
    let mut body = employee_to_json(&view.employee);
    body[TEAMS] = view.teams.iter().map(team_to_json).collect();
    body[LOANED_ITEMS] = view.loaned_items.iter().map(loaned_item_to_json).collect();
    body
}

pub fn team_to_json(team: &Team) -> Value {
    json!({
        "id": team.id(),
        "name": team.name(),
        "description": team.description(),
        "member_count": team.employees().len(),
    })
}

pub fn team_view_to_json(view: TeamView) -> Value {
    let mut body = team_to_json(&view.team);
    body["members"] = view
        .memberships
        .iter()
        .map(|membership| {
            let employee = view
                .employees
                .iter()
                .find(|e| e.id() == membership.employee_id());
            membership_to_json(membership, employee)
        })
        .collect();
    body
}

pub fn membership_to_json(membership: &TeamEmployee, employee: Option<&Employee>) -> Value {
    json!({
        "id": membership.id(),
        "team_id": membership.team_id(),
        "employee_id": membership.employee_id(),
        "employee": employee.map(employee_to_json),
        "role": membership.role(),
        "joined_on": membership.joined_on(),
    })
}

pub fn loaned_item_to_json(item: &LoanedItem) -> Value {
    json!({
        "id": item.id(),
        "title": item.title(),
        "kind": item.kind(),
        "state": item.state(),
        "last_returned_on": item.last_returned_on(),
    })
}
