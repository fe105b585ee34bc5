use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use staffroom_core::{DomainError, DomainResult, EntityId};

/// What kind of item is on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LoanedItemKind {
    Book { author: String, isbn: String },
    Magazine { issue: u32, publisher: String },
}

impl LoanedItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            LoanedItemKind::Book { .. } => "book",
            LoanedItemKind::Magazine { .. } => "magazine",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoanState {
    Available,
    OnLoan { employee_id: EntityId, since: NaiveDate },
}

/// Entity: an item employees can borrow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanedItem {
    id: EntityId,
    title: String,
    kind: LoanedItemKind,
    state: LoanState,
    last_returned_on: Option<NaiveDate>,
}

staffroom_core::impl_entity!(LoanedItem);

impl LoanedItem {
    pub fn new(title: impl Into<String>, kind: LoanedItemKind) -> DomainResult<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("item title cannot be empty"));
        }
        if let LoanedItemKind::Magazine { issue: 0, .. } = kind {
            return Err(DomainError::validation("magazine issue must be positive"));
        }
        Ok(Self {
            id: EntityId::TRANSIENT,
            title,
            kind,
            state: LoanState::Available,
            last_returned_on: None,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> &LoanedItemKind {
        &self.kind
    }

    pub fn state(&self) -> LoanState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, LoanState::Available)
    }

    pub fn borrower(&self) -> Option<EntityId> {
        match self.state {
            LoanState::OnLoan { employee_id, .. } => Some(employee_id),
            LoanState::Available => None,
        }
    }

    pub fn last_returned_on(&self) -> Option<NaiveDate> {
        self.last_returned_on
    }

    /// Release the item without a return date (borrower was removed).
    pub fn release(&mut self) {
        self.state = LoanState::Available;
    }

    pub(crate) fn lend_to(&mut self, employee_id: EntityId, on: NaiveDate) -> DomainResult<()> {
        if let LoanState::OnLoan { employee_id: holder, .. } = self.state {
            return Err(DomainError::conflict(format!(
                "item {} is already on loan to employee {holder}",
                self.id
            )));
        }
        self.state = LoanState::OnLoan {
            employee_id,
            since: on,
        };
        Ok(())
    }

    pub(crate) fn mark_returned(&mut self, on: NaiveDate) -> DomainResult<()> {
        match self.state {
            LoanState::OnLoan { since, .. } if on < since => Err(DomainError::validation(
                format!("return date {on} precedes loan date {since}"),
            )),
            LoanState::OnLoan { .. } => {
                self.state = LoanState::Available;
                self.last_returned_on = Some(on);
                Ok(())
            }
            LoanState::Available => Err(DomainError::invariant(format!(
                "item {} is not on loan",
                self.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_is_available() {
        let item = LoanedItem::new(
            "Wired",
            LoanedItemKind::Magazine {
                issue: 12,
                publisher: "Condé Nast".to_string(),
            },
        )
        .unwrap();
        assert!(item.is_available());
        assert_eq!(item.kind().label(), "magazine");
        assert_eq!(item.borrower(), None);
    }

    #[test]
    fn magazine_issue_zero_is_rejected() {
        let err = LoanedItem::new(
            "Wired",
            LoanedItemKind::Magazine {
                issue: 0,
                publisher: "x".to_string(),
            },
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for issue 0"),
        }
    }

    #[test]
    fn return_before_loan_date_is_rejected() {
        let mut item = LoanedItem::new(
            "SICP",
            LoanedItemKind::Book {
                author: "Abelson".to_string(),
                isbn: "0262510871".to_string(),
            },
        )
        .unwrap();
        let loaned = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        item.lend_to(EntityId::new(1), loaned).unwrap();

        let err = item.mark_returned(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for early return"),
        }
        assert!(!item.is_available());
    }
}
