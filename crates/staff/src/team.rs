use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use staffroom_core::{DomainError, DomainResult, Entity, EntityId};

use crate::employee::Employee;

/// Entity: Team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    id: EntityId,
    name: String,
    description: String,
    employees: BTreeSet<EntityId>,
}

staffroom_core::impl_entity!(Team);

impl Team {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("team name cannot be empty"));
        }
        Ok(Self {
            id: EntityId::TRANSIENT,
            name,
            description: description.into(),
            employees: BTreeSet::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn employees(&self) -> &BTreeSet<EntityId> {
        &self.employees
    }

    pub fn has_employee(&self, employee_id: EntityId) -> bool {
        self.employees.contains(&employee_id)
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Mirror of `Employee::join_team`.
    pub fn add_employee(&mut self, employee: &mut Employee) -> DomainResult<bool> {
        employee.join_team(self)
    }

    /// Mirror of `Employee::leave_team`.
    pub fn remove_employee(&mut self, employee: &mut Employee) -> DomainResult<bool> {
        employee.leave_team(self)
    }

    pub(crate) fn link_employee(&mut self, employee_id: EntityId) {
        self.employees.insert(employee_id);
    }

    pub(crate) fn unlink_employee(&mut self, employee_id: EntityId) {
        self.employees.remove(&employee_id);
    }
}

/// Entity: explicit join between a team and one of its employees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamEmployee {
    id: EntityId,
    team_id: EntityId,
    employee_id: EntityId,
    role: String,
    joined_on: NaiveDate,
}

staffroom_core::impl_entity!(TeamEmployee);

impl TeamEmployee {
    /// Record membership of `employee` in `team`.
    ///
    /// The association itself must already be in place on both sides.
    pub fn new(
        team: &Team,
        employee: &Employee,
        role: impl Into<String>,
        joined_on: NaiveDate,
    ) -> DomainResult<Self> {
        if !team.has_employee(employee.id()) || !employee.is_member_of(team.id()) {
            return Err(DomainError::invariant(format!(
                "employee {} is not a member of team {}",
                employee.id(),
                team.id()
            )));
        }
        Ok(Self {
            id: EntityId::TRANSIENT,
            team_id: team.id(),
            employee_id: employee.id(),
            role: role.into().trim().to_string(),
            joined_on,
        })
    }

    pub fn team_id(&self) -> EntityId {
        self.team_id
    }

    pub fn employee_id(&self) -> EntityId {
        self.employee_id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn joined_on(&self) -> NaiveDate {
        self.joined_on
    }

    pub fn set_role(&mut self, role: impl Into<String>) {
        self.role = role.into().trim().to_string();
    }

    pub fn set_joined_on(&mut self, joined_on: NaiveDate) {
        self.joined_on = joined_on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_pair() -> (Employee, Team) {
        let mut employee = Employee::new("Linus", "Torvalds", "").unwrap();
        employee.set_id(EntityId::new(3));
        let mut team = Team::new("Kernel", "core team").unwrap();
        team.set_id(EntityId::new(30));
        employee.join_team(&mut team).unwrap();
        (employee, team)
    }

    #[test]
    fn new_rejects_blank_name() {
        let err = Team::new("   ", "x").unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for blank team name"),
        }
    }

    #[test]
    fn team_employee_requires_membership() {
        let mut employee = Employee::new("Linus", "Torvalds", "").unwrap();
        employee.set_id(EntityId::new(3));
        let mut team = Team::new("Kernel", "").unwrap();
        team.set_id(EntityId::new(30));

        let joined = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let err = TeamEmployee::new(&team, &employee, "lead", joined).unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation for non-member"),
        }
    }

    #[test]
    fn team_employee_captures_both_ids() {
        let (employee, team) = member_pair();
        let joined = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut link = TeamEmployee::new(&team, &employee, " lead ", joined).unwrap();

        assert!(link.is_transient());
        assert_eq!(link.team_id(), team.id());
        assert_eq!(link.employee_id(), employee.id());
        assert_eq!(link.role(), "lead");

        link.set_role("reviewer");
        assert_eq!(link.role(), "reviewer");
    }
}
