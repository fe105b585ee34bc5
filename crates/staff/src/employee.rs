use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use staffroom_core::{DomainError, DomainResult, Entity, EntityId};

use crate::loaned_item::LoanedItem;
use crate::team::Team;

/// Entity: Employee.
///
/// Holds the ids of the teams the employee belongs to (many-to-many, mirrored on
/// `Team`) and of the items currently borrowed (one-to-many, mirrored by the
/// item's loan state).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    id: EntityId,
    first_name: String,
    last_name: String,
    email: String,
    hired_on: Option<NaiveDate>,
    teams: BTreeSet<EntityId>,
    loaned_items: BTreeSet<EntityId>,
}

staffroom_core::impl_entity!(Employee);

impl Employee {
    /// Create a transient employee.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> DomainResult<Self> {
        let mut employee = Self {
            id: EntityId::TRANSIENT,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            hired_on: None,
            teams: BTreeSet::new(),
            loaned_items: BTreeSet::new(),
        };
        employee.rename(first_name, last_name)?;
        employee.email = email.into().trim().to_string();
        Ok(employee)
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn hired_on(&self) -> Option<NaiveDate> {
        self.hired_on
    }

    pub fn teams(&self) -> &BTreeSet<EntityId> {
        &self.teams
    }

    pub fn loaned_items(&self) -> &BTreeSet<EntityId> {
        &self.loaned_items
    }

    pub fn rename(
        &mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> DomainResult<()> {
        let first_name = first_name.into().trim().to_string();
        let last_name = last_name.into().trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(DomainError::validation("employee name cannot be empty"));
        }
        self.first_name = first_name;
        self.last_name = last_name;
        Ok(())
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into().trim().to_string();
    }

    pub fn set_hired_on(&mut self, hired_on: Option<NaiveDate>) {
        self.hired_on = hired_on;
    }

    pub fn is_member_of(&self, team_id: EntityId) -> bool {
        self.teams.contains(&team_id)
    }

    /// Add this employee to `team`, updating both sides.
    ///
    /// Returns `false` when the employee already was a member.
    pub fn join_team(&mut self, team: &mut Team) -> DomainResult<bool> {
        require_persisted(self.id, team.id())?;
        let added = self.teams.insert(team.id());
        team.link_employee(self.id);
        Ok(added)
    }

    /// Remove this employee from `team`, updating both sides.
    ///
    /// Returns `false` when the employee was not a member.
    pub fn leave_team(&mut self, team: &mut Team) -> DomainResult<bool> {
        require_persisted(self.id, team.id())?;
        let removed = self.teams.remove(&team.id());
        team.unlink_employee(self.id);
        Ok(removed)
    }

    /// Borrow `item`, linking it to this employee.
    pub fn borrow(&mut self, item: &mut LoanedItem, on: NaiveDate) -> DomainResult<()> {
        require_persisted(self.id, item.id())?;
        item.lend_to(self.id, on)?;
        self.loaned_items.insert(item.id());
        Ok(())
    }

    /// Hand `item` back; it must currently be on loan to this employee.
    pub fn give_back(&mut self, item: &mut LoanedItem, on: NaiveDate) -> DomainResult<()> {
        if item.borrower() != Some(self.id) {
            return Err(DomainError::invariant(format!(
                "item {} is not on loan to employee {}",
                item.id(),
                self.id
            )));
        }
        item.mark_returned(on)?;
        self.loaned_items.remove(&item.id());
        Ok(())
    }

    /// Drop every association held by this side only (used before deletion).
    pub fn clear_associations(&mut self) {
        self.teams.clear();
        self.loaned_items.clear();
    }
}

fn require_persisted(left: EntityId, right: EntityId) -> DomainResult<()> {
    if left.is_transient() || right.is_transient() {
        return Err(DomainError::validation(
            "both sides of an association must be saved first",
        ));
    }
    Ok(())
}
