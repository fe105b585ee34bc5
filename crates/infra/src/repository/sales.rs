use staffroom_consumer_protection::{
    Article, SalesmanArticle, SalesmanArticleGroupedByMonthAndDescription,
    group_by_month_and_description,
};
use staffroom_core::EntityId;

use super::{Repository, RepositoryError, SessionRepository};
use crate::session::Mapped;

pub trait SalesmanArticleRepository: Repository<SalesmanArticle> {
    /// Sales of one salesman, oldest first.
    fn get_for_salesman(&self, salesman_id: EntityId) -> Result<Vec<SalesmanArticle>, RepositoryError>;

    /// Monthly report for one salesman, or for everyone when `salesman_id` is `None`.
    fn grouped_by_month_and_description(
        &self,
        salesman_id: Option<EntityId>,
    ) -> Result<Vec<SalesmanArticleGroupedByMonthAndDescription>, RepositoryError>;
}

impl SalesmanArticleRepository for SessionRepository<SalesmanArticle> {
    fn get_for_salesman(&self, salesman_id: EntityId) -> Result<Vec<SalesmanArticle>, RepositoryError> {
        let mut sales: Vec<SalesmanArticle> = self.session().read(|tables| {
            SalesmanArticle::table(tables)
                .iter()
                .filter(|s| s.salesman_id() == salesman_id)
                .cloned()
                .collect()
        })?;
        sales.sort_by_key(SalesmanArticle::sold_on);
        Ok(sales)
    }

    fn grouped_by_month_and_description(
        &self,
        salesman_id: Option<EntityId>,
    ) -> Result<Vec<SalesmanArticleGroupedByMonthAndDescription>, RepositoryError> {
        let rows = self.session().read(|tables| {
            group_by_month_and_description(
                SalesmanArticle::table(tables)
                    .iter()
                    .filter(|s| salesman_id.is_none_or(|id| s.salesman_id() == id)),
                Article::table(tables).iter(),
            )
        })??;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Database;
    use chrono::NaiveDate;
    use staffroom_consumer_protection::Salesman;
    use staffroom_core::{DomainError, Entity};
    use std::sync::Arc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn report_filters_by_salesman_and_groups_by_month() {
        let session = Database::new().open_session();
        let mut sam = Salesman::new("Sam").unwrap();
        let mut kim = Salesman::new("Kim").unwrap();
        let mut kettle = Article::new("Kettle", 2_500).unwrap();
        session.insert(&mut sam).unwrap();
        session.insert(&mut kim).unwrap();
        session.insert(&mut kettle).unwrap();

        for (who, on, amount) in [
            (&sam, day(2024, 2, 20), 1),
            (&sam, day(2024, 1, 3), 2),
            (&sam, day(2024, 1, 28), 3),
            (&kim, day(2024, 1, 5), 4),
        ] {
            let mut sale = SalesmanArticle::record(who, &kettle, on, amount, 100).unwrap();
            session.insert(&mut sale).unwrap();
        }

        let repo = SessionRepository::<SalesmanArticle>::new(session);

        let history = repo.get_for_salesman(sam.id()).unwrap();
        let dates: Vec<_> = history.iter().map(SalesmanArticle::sold_on).collect();
        assert_eq!(dates, [day(2024, 1, 3), day(2024, 1, 28), day(2024, 2, 20)]);

        let report = repo.grouped_by_month_and_description(Some(sam.id())).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!((report[0].month, report[0].total_amount, report[0].transactions), (1, 5, 2));
        assert_eq!((report[1].month, report[1].total_amount), (2, 1));

        let everyone = repo.grouped_by_month_and_description(None).unwrap();
        assert_eq!(everyone.len(), 3);
    }

    #[test]
    fn overflowing_report_fails_without_breaking_the_session() {
        let session = Database::new().open_session();
        let mut sam = Salesman::new("Sam").unwrap();
        let mut kettle = Article::new("Kettle", 2_500).unwrap();
        session.insert(&mut sam).unwrap();
        session.insert(&mut kettle).unwrap();

        session.begin().unwrap();
        for cost in [i64::MAX, 1] {
            let mut sale = SalesmanArticle::record(&sam, &kettle, day(2024, 5, 2), 1, cost).unwrap();
            session.insert(&mut sale).unwrap();
        }

        let repo = SessionRepository::<SalesmanArticle>::new(Arc::clone(&session));
        match repo.grouped_by_month_and_description(Some(sam.id())) {
            Err(RepositoryError::Domain(DomainError::Validation(_))) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }

        assert_eq!(repo.get_for_salesman(sam.id()).unwrap().len(), 2);
        session.rollback().unwrap();
        assert!(repo.get_for_salesman(sam.id()).unwrap().is_empty());
    }
}
