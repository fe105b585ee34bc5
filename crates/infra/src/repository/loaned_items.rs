use staffroom_core::{Entity, EntityId, Page, PageRequest};
use staffroom_staff::LoanedItem;

use super::{Repository, RepositoryError, SessionRepository};
use crate::session::Mapped;

pub trait LoanedItemRepository: Repository<LoanedItem> {
    /// Items currently on loan to `employee_id`.
    fn get_loaned_to(&self, employee_id: EntityId) -> Result<Vec<LoanedItem>, RepositoryError>;

    fn get_available(&self) -> Result<Vec<LoanedItem>, RepositoryError>;

    /// Items ordered by title, then id.
    fn get_paged(&self, request: PageRequest) -> Result<Page<LoanedItem>, RepositoryError>;
}

impl LoanedItemRepository for SessionRepository<LoanedItem> {
    fn get_loaned_to(&self, employee_id: EntityId) -> Result<Vec<LoanedItem>, RepositoryError> {
        self.filtered(|item| item.borrower() == Some(employee_id))
    }

    fn get_available(&self) -> Result<Vec<LoanedItem>, RepositoryError> {
        self.filtered(LoanedItem::is_available)
    }

    fn get_paged(&self, request: PageRequest) -> Result<Page<LoanedItem>, RepositoryError> {
        let mut items = self.get_all()?;
        items.sort_by(|a, b| a.title().cmp(b.title()).then_with(|| a.id().cmp(&b.id())));
        Ok(Page::from_ordered(items, request))
    }
}

impl SessionRepository<LoanedItem> {
    fn filtered(&self, keep: impl Fn(&LoanedItem) -> bool) -> Result<Vec<LoanedItem>, RepositoryError> {
        let items = self.session().read(|tables| {
            LoanedItem::table(tables)
                .iter()
                .filter(|item| keep(item))
                .cloned()
                .collect()
        })?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Database;
    use chrono::NaiveDate;
    use staffroom_staff::{Employee, LoanedItemKind};

    fn magazine(title: &str, issue: u32) -> LoanedItem {
        LoanedItem::new(
            title,
            LoanedItemKind::Magazine {
                issue,
                publisher: "ACM".into(),
            },
        )
        .unwrap()
    }

    #[test]
    fn splits_items_by_loan_state() {
        let session = Database::new().open_session();
        let mut ann = Employee::new("Ann", "Baker", "ann@example.com").unwrap();
        session.insert(&mut ann).unwrap();

        let mut lent = magazine("Queue", 3);
        let mut free = magazine("Communications", 7);
        session.insert(&mut lent).unwrap();
        session.insert(&mut free).unwrap();
        ann.borrow(&mut lent, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap())
            .unwrap();
        session.update(&lent).unwrap();

        let repo = SessionRepository::<LoanedItem>::new(session);
        let loaned: Vec<_> = repo.get_loaned_to(ann.id()).unwrap();
        assert_eq!(loaned.len(), 1);
        assert_eq!(loaned[0].title(), "Queue");

        let available = repo.get_available().unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].title(), "Communications");
    }

    #[test]
    fn pages_by_title() {
        let session = Database::new().open_session();
        for (title, issue) in [("Wired", 1), ("Byte", 2), ("Linux Journal", 3)] {
            session.insert(&mut magazine(title, issue)).unwrap();
        }
        let repo = SessionRepository::<LoanedItem>::new(session);
        let page = repo.get_paged(PageRequest::new(0, 10).unwrap()).unwrap();
        let titles: Vec<_> = page.items.iter().map(LoanedItem::title).collect();
        assert_eq!(titles, ["Byte", "Linux Journal", "Wired"]);
        assert_eq!(page.total_pages(), 1);
    }
}
