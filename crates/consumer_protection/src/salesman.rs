use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use staffroom_core::{DomainError, DomainResult, Entity, EntityId};

use crate::article::Article;

/// Entity: Salesman.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salesman {
    id: EntityId,
    name: String,
}

staffroom_core::impl_entity!(Salesman);

impl Salesman {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("salesman name cannot be empty"));
        }
        Ok(Self {
            id: EntityId::TRANSIENT,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Entity: a dated sale of an article by a salesman.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesmanArticle {
    id: EntityId,
    salesman_id: EntityId,
    article_id: EntityId,
    sold_on: NaiveDate,
    amount: i32,
    /// Cost in smallest currency unit.
    cost: i64,
}

staffroom_core::impl_entity!(SalesmanArticle);

impl SalesmanArticle {
    /// Record a sale; both the salesman and the article must be persisted.
    pub fn record(
        salesman: &Salesman,
        article: &Article,
        sold_on: NaiveDate,
        amount: i32,
        cost: i64,
    ) -> DomainResult<Self> {
        if salesman.is_transient() || article.is_transient() {
            return Err(DomainError::validation(
                "salesman and article must be saved before recording a sale",
            ));
        }
        if amount <= 0 {
            return Err(DomainError::validation("amount must be positive"));
        }
        if cost < 0 {
            return Err(DomainError::validation("cost cannot be negative"));
        }
        Ok(Self {
            id: EntityId::TRANSIENT,
            salesman_id: salesman.id(),
            article_id: article.id(),
            sold_on,
            amount,
            cost,
        })
    }

    pub fn salesman_id(&self) -> EntityId {
        self.salesman_id
    }

    pub fn article_id(&self) -> EntityId {
        self.article_id
    }

    pub fn sold_on(&self) -> NaiveDate {
        self.sold_on
    }

    pub fn amount(&self) -> i32 {
        self.amount
    }

    pub fn cost(&self) -> i64 {
        self.cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persisted_salesman() -> Salesman {
        let mut s = Salesman::new("Willy Loman").unwrap();
        s.set_id(EntityId::new(1));
        s
    }

    fn persisted_article() -> Article {
        let mut a = Article::new("Vacuum cleaner", 19_900).unwrap();
        a.set_id(EntityId::new(2));
        a
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 14).unwrap()
    }

    #[test]
    fn record_links_salesman_and_article() {
        let sale = SalesmanArticle::record(&persisted_salesman(), &persisted_article(), day(), 3, 59_700)
            .unwrap();
        assert_eq!(sale.salesman_id(), EntityId::new(1));
        assert_eq!(sale.article_id(), EntityId::new(2));
        assert_eq!(sale.amount(), 3);
        assert!(sale.is_transient());
    }

    #[test]
    fn record_rejects_non_positive_amount() {
        let err = SalesmanArticle::record(&persisted_salesman(), &persisted_article(), day(), 0, 0)
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for zero amount"),
        }
    }

    #[test]
    fn record_rejects_transient_article() {
        let article = Article::new("Toaster", 2_500).unwrap();
        let err = SalesmanArticle::record(&persisted_salesman(), &article, day(), 1, 2_500)
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for transient article"),
        }
    }
}
