//! Employee, team and membership commands.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;

use staffroom_commands::{CommandConfiguration, CommandHandler, CommandMessage, CommandRegistry, PredicateRule};
use staffroom_core::{DomainError, Entity, EntityId};
use staffroom_staff::{Employee, LoanedItem, Team, TeamEmployee};

use super::HandlerError;
use super::rules::{SessionRule, exists, max_length, required};
use crate::repository::{
    EmployeeRepository, Repository, RepositoryError, SessionRepository, TeamEmployeeRepository,
    TeamRepository,
};
use crate::session::{Session, SessionProvider};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmployeeCommandMessage {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub hired_on: Option<NaiveDate>,
}

impl CommandMessage for CreateEmployeeCommandMessage {}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEmployeeCommandMessage {
    pub employee_id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub hired_on: Option<NaiveDate>,
}

impl CommandMessage for UpdateEmployeeCommandMessage {}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteEmployeeCommandMessage {
    pub employee_id: EntityId,
}

impl CommandMessage for DeleteEmployeeCommandMessage {}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamCommandMessage {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CommandMessage for CreateTeamCommandMessage {}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignEmployeeToTeamCommandMessage {
    pub team_id: EntityId,
    pub employee_id: EntityId,
    #[serde(default)]
    pub role: String,
    pub joined_on: NaiveDate,
}

impl CommandMessage for AssignEmployeeToTeamCommandMessage {}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveEmployeeFromTeamCommandMessage {
    pub team_id: EntityId,
    pub employee_id: EntityId,
}

impl CommandMessage for RemoveEmployeeFromTeamCommandMessage {}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTeamEmployeeCommandMessage {
    pub team_id: EntityId,
    pub employee_id: EntityId,
    pub role: String,
    #[serde(default)]
    pub joined_on: Option<NaiveDate>,
}

impl CommandMessage for UpdateTeamEmployeeCommandMessage {}

const NAME_MAX: usize = 100;
const ROLE_MAX: usize = 50;

fn email_is_plausible(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}

/// No other employee may hold `email` (case-insensitive).
fn email_is_free(session: &Arc<Session>, email: &str, owner: Option<EntityId>) -> Result<bool, RepositoryError> {
    let holder = SessionRepository::<Employee>::new(Arc::clone(session)).find_by_email(email)?;
    Ok(holder.is_none_or(|h| Some(h.id()) == owner))
}

fn is_member(session: &Arc<Session>, team_id: EntityId, employee_id: EntityId) -> Result<bool, RepositoryError> {
    Ok(SessionRepository::<TeamEmployee>::new(Arc::clone(session))
        .find(team_id, employee_id)?
        .is_some())
}

pub(super) fn configure(registry: &mut CommandRegistry, sessions: &SessionProvider) {
    registry.register(
        CommandConfiguration::new(CreateEmployeeHandler::new(sessions))
            .rule(required("first_name", "first name is required", |m: &CreateEmployeeCommandMessage| m.first_name.as_str()))
            .rule(max_length("first_name", NAME_MAX, |m: &CreateEmployeeCommandMessage| m.first_name.as_str()))
            .rule(required("last_name", "last name is required", |m: &CreateEmployeeCommandMessage| m.last_name.as_str()))
            .rule(max_length("last_name", NAME_MAX, |m: &CreateEmployeeCommandMessage| m.last_name.as_str()))
            .rule(
                PredicateRule::new("email", "email address is not valid", |m: &CreateEmployeeCommandMessage| {
                    email_is_plausible(&m.email)
                })
                .stop_on_failure(),
            )
            .rule(SessionRule::new(
                "email",
                "email address is already in use",
                sessions,
                |m: &CreateEmployeeCommandMessage, s: &Arc<Session>| email_is_free(s, &m.email, None),
            )),
    );

    registry.register(
        CommandConfiguration::new(UpdateEmployeeHandler::new(sessions))
            .rule(exists::<_, Employee>("employee_id", "employee does not exist", sessions, |m: &UpdateEmployeeCommandMessage| m.employee_id))
            .rule(required("first_name", "first name is required", |m: &UpdateEmployeeCommandMessage| m.first_name.as_str()))
            .rule(max_length("first_name", NAME_MAX, |m: &UpdateEmployeeCommandMessage| m.first_name.as_str()))
            .rule(required("last_name", "last name is required", |m: &UpdateEmployeeCommandMessage| m.last_name.as_str()))
            .rule(max_length("last_name", NAME_MAX, |m: &UpdateEmployeeCommandMessage| m.last_name.as_str()))
            .rule(
                PredicateRule::new("email", "email address is not valid", |m: &UpdateEmployeeCommandMessage| {
                    email_is_plausible(&m.email)
                })
                .stop_on_failure(),
            )
            .rule(SessionRule::new(
                "email",
                "email address is already in use",
                sessions,
                |m: &UpdateEmployeeCommandMessage, s: &Arc<Session>| email_is_free(s, &m.email, Some(m.employee_id)),
            )),
    );

    registry.register(
        CommandConfiguration::new(DeleteEmployeeHandler::new(sessions)).rule(exists::<_, Employee>(
            "employee_id",
            "employee does not exist",
            sessions,
            |m: &DeleteEmployeeCommandMessage| m.employee_id,
        )),
    );

    registry.register(
        CommandConfiguration::new(CreateTeamHandler::new(sessions))
            .rule(required("name", "team name is required", |m: &CreateTeamCommandMessage| m.name.as_str()).stop_on_failure())
            .rule(max_length("name", NAME_MAX, |m: &CreateTeamCommandMessage| m.name.as_str()))
            .rule(SessionRule::new(
                "name",
                "a team with this name already exists",
                sessions,
                |m: &CreateTeamCommandMessage, s: &Arc<Session>| {
                    Ok(SessionRepository::<Team>::new(Arc::clone(s))
                        .find_by_name(&m.name)?
                        .is_none())
                },
            )),
    );

    registry.register(
        CommandConfiguration::new(AssignEmployeeToTeamHandler::new(sessions))
            .rule(exists::<_, Team>("team_id", "team does not exist", sessions, |m: &AssignEmployeeToTeamCommandMessage| m.team_id))
            .rule(exists::<_, Employee>("employee_id", "employee does not exist", sessions, |m: &AssignEmployeeToTeamCommandMessage| m.employee_id))
            .rule(SessionRule::new(
                "employee_id",
                "employee is already a member of this team",
                sessions,
                |m: &AssignEmployeeToTeamCommandMessage, s: &Arc<Session>| {
                    Ok(!is_member(s, m.team_id, m.employee_id)?)
                },
            ))
            .rule(max_length("role", ROLE_MAX, |m: &AssignEmployeeToTeamCommandMessage| m.role.as_str())),
    );

    registry.register(
        CommandConfiguration::new(RemoveEmployeeFromTeamHandler::new(sessions))
            .rule(exists::<_, Team>("team_id", "team does not exist", sessions, |m: &RemoveEmployeeFromTeamCommandMessage| m.team_id))
            .rule(exists::<_, Employee>("employee_id", "employee does not exist", sessions, |m: &RemoveEmployeeFromTeamCommandMessage| m.employee_id))
            .rule(SessionRule::new(
                "employee_id",
                "employee is not a member of this team",
                sessions,
                |m: &RemoveEmployeeFromTeamCommandMessage, s: &Arc<Session>| is_member(s, m.team_id, m.employee_id),
            )),
    );

    registry.register(
        CommandConfiguration::new(UpdateTeamEmployeeHandler::new(sessions))
            .rule(
                SessionRule::new(
                    "employee_id",
                    "employee is not a member of this team",
                    sessions,
                    |m: &UpdateTeamEmployeeCommandMessage, s: &Arc<Session>| is_member(s, m.team_id, m.employee_id),
                )
                .stop_on_failure(),
            )
            .rule(required("role", "role is required", |m: &UpdateTeamEmployeeCommandMessage| m.role.as_str()))
            .rule(max_length("role", ROLE_MAX, |m: &UpdateTeamEmployeeCommandMessage| m.role.as_str())),
    );
}

pub struct CreateEmployeeHandler {
    sessions: SessionProvider,
}

impl CreateEmployeeHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<CreateEmployeeCommandMessage> for CreateEmployeeHandler {
    type Output = Employee;
    type Error = HandlerError;

    fn handle(&self, message: &CreateEmployeeCommandMessage) -> Result<Employee, HandlerError> {
        let employees = SessionRepository::<Employee>::new(self.sessions.current()?);
        let mut employee = Employee::new(&message.first_name, &message.last_name, &message.email)?;
        employee.set_hired_on(message.hired_on);
        employees.save_or_update(&mut employee)?;
        tracing::info!(employee_id = %employee.id(), "employee created");
        Ok(employee)
    }
}

pub struct UpdateEmployeeHandler {
    sessions: SessionProvider,
}

impl UpdateEmployeeHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<UpdateEmployeeCommandMessage> for UpdateEmployeeHandler {
    type Output = Employee;
    type Error = HandlerError;

    fn handle(&self, message: &UpdateEmployeeCommandMessage) -> Result<Employee, HandlerError> {
        let employees = SessionRepository::<Employee>::new(self.sessions.current()?);
        let mut employee = employees.load(message.employee_id)?;
        employee.rename(&message.first_name, &message.last_name)?;
        employee.set_email(&message.email);
        employee.set_hired_on(message.hired_on);
        employees.save_or_update(&mut employee)?;
        tracing::info!(employee_id = %employee.id(), "employee updated");
        Ok(employee)
    }
}

/// Deletes an employee after detaching it from its teams and loaned items.
pub struct DeleteEmployeeHandler {
    sessions: SessionProvider,
}

impl DeleteEmployeeHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<DeleteEmployeeCommandMessage> for DeleteEmployeeHandler {
    type Output = EntityId;
    type Error = HandlerError;

    fn handle(&self, message: &DeleteEmployeeCommandMessage) -> Result<EntityId, HandlerError> {
        let session = self.sessions.current()?;
        let employees = SessionRepository::<Employee>::new(Arc::clone(&session));
        let teams = SessionRepository::<Team>::new(Arc::clone(&session));
        let memberships = SessionRepository::<TeamEmployee>::new(Arc::clone(&session));
        let items = SessionRepository::<LoanedItem>::new(session);

        let mut employee = employees.load(message.employee_id)?;

        let team_ids: Vec<EntityId> = employee.teams().iter().copied().collect();
        for team_id in team_ids {
            if let Some(mut team) = teams.get_by_id(team_id)? {
                employee.leave_team(&mut team)?;
                teams.save_or_update(&mut team)?;
            }
        }
        for membership in memberships.get_for_employee(employee.id())? {
            memberships.delete(&membership)?;
        }
        for item_id in employee.loaned_items().clone() {
            if let Some(mut item) = items.get_by_id(item_id)? {
                item.release();
                items.save_or_update(&mut item)?;
            }
        }
        employee.clear_associations();
        employees.delete(&employee)?;

        tracing::info!(employee_id = %employee.id(), "employee deleted");
        Ok(employee.id())
    }
}

pub struct CreateTeamHandler {
    sessions: SessionProvider,
}

impl CreateTeamHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<CreateTeamCommandMessage> for CreateTeamHandler {
    type Output = Team;
    type Error = HandlerError;

    fn handle(&self, message: &CreateTeamCommandMessage) -> Result<Team, HandlerError> {
        let teams = SessionRepository::<Team>::new(self.sessions.current()?);
        let mut team = Team::new(&message.name, &message.description)?;
        teams.save_or_update(&mut team)?;
        tracing::info!(team_id = %team.id(), "team created");
        Ok(team)
    }
}

pub struct AssignEmployeeToTeamHandler {
    sessions: SessionProvider,
}

impl AssignEmployeeToTeamHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<AssignEmployeeToTeamCommandMessage> for AssignEmployeeToTeamHandler {
    type Output = TeamEmployee;
    type Error = HandlerError;

    fn handle(&self, message: &AssignEmployeeToTeamCommandMessage) -> Result<TeamEmployee, HandlerError> {
        let session = self.sessions.current()?;
        let employees = SessionRepository::<Employee>::new(Arc::clone(&session));
        let teams = SessionRepository::<Team>::new(Arc::clone(&session));
        let memberships = SessionRepository::<TeamEmployee>::new(session);

        let mut team = teams.load(message.team_id)?;
        let mut employee = employees.load(message.employee_id)?;
        employee.join_team(&mut team)?;
        employees.save_or_update(&mut employee)?;
        teams.save_or_update(&mut team)?;

        let mut membership = TeamEmployee::new(&team, &employee, &message.role, message.joined_on)?;
        memberships.save_or_update(&mut membership)?;
        tracing::info!(
            team_id = %team.id(),
            employee_id = %employee.id(),
            membership_id = %membership.id(),
            "employee assigned to team"
        );
        Ok(membership)
    }
}

pub struct RemoveEmployeeFromTeamHandler {
    sessions: SessionProvider,
}

impl RemoveEmployeeFromTeamHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<RemoveEmployeeFromTeamCommandMessage> for RemoveEmployeeFromTeamHandler {
    type Output = ();
    type Error = HandlerError;

    fn handle(&self, message: &RemoveEmployeeFromTeamCommandMessage) -> Result<(), HandlerError> {
        let session = self.sessions.current()?;
        let employees = SessionRepository::<Employee>::new(Arc::clone(&session));
        let teams = SessionRepository::<Team>::new(Arc::clone(&session));
        let memberships = SessionRepository::<TeamEmployee>::new(session);

        let mut team = teams.load(message.team_id)?;
        let mut employee = employees.load(message.employee_id)?;
        employee.leave_team(&mut team)?;
        employees.save_or_update(&mut employee)?;
        teams.save_or_update(&mut team)?;

        if let Some(membership) = memberships.find(team.id(), employee.id())? {
            memberships.delete(&membership)?;
        }
        tracing::info!(team_id = %team.id(), employee_id = %employee.id(), "employee removed from team");
        Ok(())
    }
}

pub struct UpdateTeamEmployeeHandler {
    sessions: SessionProvider,
}

impl UpdateTeamEmployeeHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<UpdateTeamEmployeeCommandMessage> for UpdateTeamEmployeeHandler {
    type Output = TeamEmployee;
    type Error = HandlerError;

    fn handle(&self, message: &UpdateTeamEmployeeCommandMessage) -> Result<TeamEmployee, HandlerError> {
        let memberships = SessionRepository::<TeamEmployee>::new(self.sessions.current()?);
        let mut membership = memberships
            .find(message.team_id, message.employee_id)?
            .ok_or_else(DomainError::not_found)?;
        membership.set_role(&message.role);
        if let Some(joined_on) = message.joined_on {
            membership.set_joined_on(joined_on);
        }
        memberships.save_or_update(&mut membership)?;
        Ok(membership)
    }
}
