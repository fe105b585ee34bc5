use serde::Serialize;

use staffroom_core::{Entity, EntityId, Page, PageRequest};
use staffroom_staff::{Employee, LoanedItem, Team};

use super::{Repository, RepositoryError, SessionRepository};
use crate::session::Mapped;

/// Employee loaded together with its teams and borrowed items.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeView {
    pub employee: Employee,
    pub teams: Vec<Team>,
    pub loaned_items: Vec<LoanedItem>,
}

pub trait EmployeeRepository: Repository<Employee> {
    /// Eager load of both associations.
    fn get_with_teams_and_items(&self, id: EntityId) -> Result<Option<EmployeeView>, RepositoryError>;

    /// Employees ordered by last name, first name, then id.
    fn get_paged(&self, request: PageRequest) -> Result<Page<Employee>, RepositoryError>;

    /// Case-insensitive lookup by email address.
    fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepositoryError>;
}

impl EmployeeRepository for SessionRepository<Employee> {
    fn get_with_teams_and_items(&self, id: EntityId) -> Result<Option<EmployeeView>, RepositoryError> {
        let view = self.session().read(|tables| {
            let employee = Employee::table(tables).get(id)?.clone();
            let teams = Team::table(tables);
            let items = LoanedItem::table(tables);
            Some(EmployeeView {
                teams: employee
                    .teams()
                    .iter()
                    .filter_map(|team_id| teams.get(*team_id).cloned())
                    .collect(),
                loaned_items: employee
                    .loaned_items()
                    .iter()
                    .filter_map(|item_id| items.get(*item_id).cloned())
                    .collect(),
                employee,
            })
        })?;
        Ok(view)
    }

    fn get_paged(&self, request: PageRequest) -> Result<Page<Employee>, RepositoryError> {
        let mut employees = self.get_all()?;
        employees.sort_by(|a, b| {
            a.last_name()
                .cmp(b.last_name())
                .then_with(|| a.first_name().cmp(b.first_name()))
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(Page::from_ordered(employees, request))
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepositoryError> {
        let email = email.trim();
        let found = self.session().read(|tables| {
            Employee::table(tables)
                .iter()
                .find(|e| e.email().eq_ignore_ascii_case(email))
                .cloned()
        })?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Database;
    use chrono::NaiveDate;
    use staffroom_staff::LoanedItemKind;

    fn seeded() -> SessionRepository<Employee> {
        let session = Database::new().open_session();
        for (first, last) in [("Zoe", "Adams"), ("Ann", "Baker"), ("Bob", "Adams"), ("Cid", "Clark")] {
            let mut e = Employee::new(first, last, format!("{first}@example.com")).unwrap();
            session.insert(&mut e).unwrap();
        }
        SessionRepository::new(session)
    }

    fn names(page: &Page<Employee>) -> Vec<String> {
        page.items.iter().map(Employee::full_name).collect()
    }

    #[test]
    fn pages_are_ordered_by_last_then_first_name() {
        let repo = seeded();
        let first = repo.get_paged(PageRequest::new(0, 3).unwrap()).unwrap();
        assert_eq!(names(&first), ["Bob Adams", "Zoe Adams", "Ann Baker"]);
        assert_eq!(first.total_count, 4);
        assert!(first.has_next());

        let second = repo.get_paged(PageRequest::new(1, 3).unwrap()).unwrap();
        assert_eq!(names(&second), ["Cid Clark"]);
        assert!(!second.has_next());
    }

    #[test]
    fn page_past_the_end_is_empty_but_counts() {
        let repo = seeded();
        let page = repo.get_paged(PageRequest::new(5, 2).unwrap()).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 4);
        assert_eq!(page.total_pages(), 2);
    }

    #[test]
    fn find_by_email_ignores_case() {
        let repo = seeded();
        let found = repo.find_by_email(" ANN@example.com ").unwrap().unwrap();
        assert_eq!(found.first_name(), "Ann");
        assert!(repo.find_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn eager_view_resolves_associations() {
        let session = Database::new().open_session();
        let mut employee = Employee::new("Ann", "Baker", "ann@example.com").unwrap();
        let mut team = Team::new("Ops", "").unwrap();
        let mut item = LoanedItem::new(
            "Rust in Action",
            LoanedItemKind::Book {
                author: "T. McNamara".into(),
                isbn: "9781617294556".into(),
            },
        )
        .unwrap();
        session.insert(&mut employee).unwrap();
        session.insert(&mut team).unwrap();
        session.insert(&mut item).unwrap();

        employee.join_team(&mut team).unwrap();
        employee
            .borrow(&mut item, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .unwrap();
        session.update(&employee).unwrap();
        session.update(&team).unwrap();
        session.update(&item).unwrap();

        let repo = SessionRepository::<Employee>::new(session);
        let view = repo.get_with_teams_and_items(employee.id()).unwrap().unwrap();
        assert_eq!(view.teams.len(), 1);
        assert_eq!(view.teams[0].name(), "Ops");
        assert_eq!(view.loaned_items.len(), 1);
        assert_eq!(view.loaned_items[0].borrower(), Some(employee.id()));

        assert!(repo.get_with_teams_and_items(EntityId::new(99)).unwrap().is_none());
    }
}
