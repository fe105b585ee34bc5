use serde::Serialize;

use staffroom_core::{Entity, EntityId, Page, PageRequest};
use staffroom_staff::{Employee, Team, TeamEmployee};

use super::{Repository, RepositoryError, SessionRepository};
use crate::session::Mapped;

/// Team loaded together with its members and their membership records.
#[derive(Debug, Clone, Serialize)]
pub struct TeamView {
    pub team: Team,
    pub employees: Vec<Employee>,
    pub memberships: Vec<TeamEmployee>,
}

pub trait TeamRepository: Repository<Team> {
    fn get_with_employees(&self, id: EntityId) -> Result<Option<TeamView>, RepositoryError>;

    /// Teams ordered by name, then id.
    fn get_paged(&self, request: PageRequest) -> Result<Page<Team>, RepositoryError>;

    fn find_by_name(&self, name: &str) -> Result<Option<Team>, RepositoryError>;
}

impl TeamRepository for SessionRepository<Team> {
    fn get_with_employees(&self, id: EntityId) -> Result<Option<TeamView>, RepositoryError> {
        let view = self.session().read(|tables| {
            let team = Team::table(tables).get(id)?.clone();
            let employees = Employee::table(tables);
            Some(TeamView {
                employees: team
                    .employees()
                    .iter()
                    .filter_map(|employee_id| employees.get(*employee_id).cloned())
                    .collect(),
                memberships: TeamEmployee::table(tables)
                    .iter()
                    .filter(|m| m.team_id() == id)
                    .cloned()
                    .collect(),
                team,
            })
        })?;
        Ok(view)
    }

    fn get_paged(&self, request: PageRequest) -> Result<Page<Team>, RepositoryError> {
        let mut teams = self.get_all()?;
        teams.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(&b.id())));
        Ok(Page::from_ordered(teams, request))
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Team>, RepositoryError> {
        let name = name.trim();
        let found = self.session().read(|tables| {
            Team::table(tables)
                .iter()
                .find(|t| t.name().eq_ignore_ascii_case(name))
                .cloned()
        })?;
        Ok(found)
    }
}

pub trait TeamEmployeeRepository: Repository<TeamEmployee> {
    /// Membership records of one team, ordered by id.
    fn get_paged_for_team(
        &self,
        team_id: EntityId,
        request: PageRequest,
    ) -> Result<Page<TeamEmployee>, RepositoryError>;

    fn find(&self, team_id: EntityId, employee_id: EntityId) -> Result<Option<TeamEmployee>, RepositoryError>;

    fn get_for_employee(&self, employee_id: EntityId) -> Result<Vec<TeamEmployee>, RepositoryError>;
}

impl TeamEmployeeRepository for SessionRepository<TeamEmployee> {
    fn get_paged_for_team(
        &self,
        team_id: EntityId,
        request: PageRequest,
    ) -> Result<Page<TeamEmployee>, RepositoryError> {
        let page = self.session().read(|tables| {
            Page::from_ordered(
                TeamEmployee::table(tables)
                    .iter()
                    .filter(|m| m.team_id() == team_id)
                    .cloned(),
                request,
            )
        })?;
        Ok(page)
    }

    fn find(&self, team_id: EntityId, employee_id: EntityId) -> Result<Option<TeamEmployee>, RepositoryError> {
        let found = self.session().read(|tables| {
            TeamEmployee::table(tables)
                .iter()
                .find(|m| m.team_id() == team_id && m.employee_id() == employee_id)
                .cloned()
        })?;
        Ok(found)
    }

    fn get_for_employee(&self, employee_id: EntityId) -> Result<Vec<TeamEmployee>, RepositoryError> {
        let found = self.session().read(|tables| {
            TeamEmployee::table(tables)
                .iter()
                .filter(|m| m.employee_id() == employee_id)
                .cloned()
                .collect()
        })?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Database, Session};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn joined_on() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn staff_team(session: &Arc<Session>, name: &str, members: usize) -> Team {
        let mut team = Team::new(name, "").unwrap();
        session.insert(&mut team).unwrap();
        for n in 0..members {
            let mut e = Employee::new(format!("E{n}"), name, format!("{name}{n}@example.com")).unwrap();
            session.insert(&mut e).unwrap();
            e.join_team(&mut team).unwrap();
            session.update(&e).unwrap();
            let mut membership = TeamEmployee::new(&team, &e, "member", joined_on()).unwrap();
            session.insert(&mut membership).unwrap();
        }
        session.update(&team).unwrap();
        team
    }

    #[test]
    fn teams_page_by_name() {
        let session = Database::new().open_session();
        for name in ["Ops", "Dev", "QA"] {
            staff_team(&session, name, 0);
        }
        let repo = SessionRepository::<Team>::new(session);
        let page = repo.get_paged(PageRequest::new(0, 2).unwrap()).unwrap();
        let names: Vec<_> = page.items.iter().map(Team::name).collect();
        assert_eq!(names, ["Dev", "Ops"]);
        assert_eq!(page.total_pages(), 2);
    }

    #[test]
    fn team_view_loads_members_and_memberships() {
        let session = Database::new().open_session();
        let team = staff_team(&session, "Ops", 2);
        staff_team(&session, "Dev", 1);

        let repo = SessionRepository::<Team>::new(session);
        let view = repo.get_with_employees(team.id()).unwrap().unwrap();
        assert_eq!(view.employees.len(), 2);
        assert_eq!(view.memberships.len(), 2);
        assert!(view.memberships.iter().all(|m| m.team_id() == team.id()));
        assert!(repo.find_by_name("ops").unwrap().is_some());
    }

    #[test]
    fn memberships_page_within_one_team() {
        let session = Database::new().open_session();
        let ops = staff_team(&session, "Ops", 5);
        staff_team(&session, "Dev", 3);

        let repo = SessionRepository::<TeamEmployee>::new(session);
        let last = repo
            .get_paged_for_team(ops.id(), PageRequest::new(2, 2).unwrap())
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.total_count, 5);
        assert!(last.has_previous());
        assert!(!last.has_next());

        let member = *ops.employees().iter().next().unwrap();
        let found = repo.find(ops.id(), member).unwrap().unwrap();
        assert_eq!(found.employee_id(), member);
        assert_eq!(repo.get_for_employee(member).unwrap().len(), 1);
    }
}
