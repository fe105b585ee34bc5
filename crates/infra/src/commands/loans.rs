//! Loaned item commands: registering items, lending and returning them.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;

use staffroom_commands::{CommandConfiguration, CommandHandler, CommandMessage, CommandRegistry, PredicateRule};
use staffroom_core::{Entity, EntityId};
use staffroom_staff::{Employee, LoanState, LoanedItem, LoanedItemKind};

use super::HandlerError;
use super::rules::{SessionRule, exists, required};
use crate::repository::{Repository, RepositoryError, SessionRepository};
use crate::session::{Session, SessionProvider};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterLoanedItemCommandMessage {
    pub title: String,
    pub kind: LoanedItemKind,
}

impl CommandMessage for RegisterLoanedItemCommandMessage {}

#[derive(Debug, Clone, Deserialize)]
pub struct LendItemCommandMessage {
    pub item_id: EntityId,
    pub employee_id: EntityId,
    pub on: NaiveDate,
}

impl CommandMessage for LendItemCommandMessage {}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnItemCommandMessage {
    pub item_id: EntityId,
    pub employee_id: EntityId,
    pub on: NaiveDate,
}

impl CommandMessage for ReturnItemCommandMessage {}

/// ISBN-10 or ISBN-13, hyphens and spaces ignored.
fn isbn_is_plausible(isbn: &str) -> bool {
    let digits: Vec<char> = isbn.chars().filter(|c| !matches!(c, '-' | ' ')).collect();
    match digits.len() {
        13 => digits.iter().all(char::is_ascii_digit),
        10 => {
            digits[..9].iter().all(char::is_ascii_digit)
                && (digits[9].is_ascii_digit() || digits[9] == 'X' || digits[9] == 'x')
        }
        _ => false,
    }
}

fn item(session: &Arc<Session>, id: EntityId) -> Result<Option<LoanedItem>, RepositoryError> {
    SessionRepository::<LoanedItem>::new(Arc::clone(session)).get_by_id(id)
}

pub(super) fn configure(registry: &mut CommandRegistry, sessions: &SessionProvider) {
    registry.register(
        CommandConfiguration::new(RegisterLoanedItemHandler::new(sessions))
            .rule(required("title", "title is required", |m: &RegisterLoanedItemCommandMessage| m.title.as_str()))
            .rule(PredicateRule::new(
                "kind.isbn",
                "isbn is not valid",
                |m: &RegisterLoanedItemCommandMessage| match &m.kind {
                    LoanedItemKind::Book { isbn, .. } => isbn_is_plausible(isbn),
                    LoanedItemKind::Magazine { .. } => true,
                },
            ))
            .rule(PredicateRule::new(
                "kind.issue",
                "issue number must be positive",
                |m: &RegisterLoanedItemCommandMessage| !matches!(m.kind, LoanedItemKind::Magazine { issue: 0, .. }),
            )),
    );

    registry.register(
        CommandConfiguration::new(LendItemHandler::new(sessions))
            .rule(exists::<_, LoanedItem>("item_id", "item does not exist", sessions, |m: &LendItemCommandMessage| m.item_id))
            .rule(exists::<_, Employee>("employee_id", "employee does not exist", sessions, |m: &LendItemCommandMessage| m.employee_id))
            .rule(SessionRule::new(
                "item_id",
                "item is already on loan",
                sessions,
                |m: &LendItemCommandMessage, s: &Arc<Session>| {
                    Ok(item(s, m.item_id)?.is_some_and(|i| i.is_available()))
                },
            )),
    );

    registry.register(
        CommandConfiguration::new(ReturnItemHandler::new(sessions))
            .rule(exists::<_, LoanedItem>("item_id", "item does not exist", sessions, |m: &ReturnItemCommandMessage| m.item_id))
            .rule(exists::<_, Employee>("employee_id", "employee does not exist", sessions, |m: &ReturnItemCommandMessage| m.employee_id))
            .rule(
                SessionRule::new(
                    "item_id",
                    "item is not on loan to this employee",
                    sessions,
                    |m: &ReturnItemCommandMessage, s: &Arc<Session>| {
                        Ok(item(s, m.item_id)?.is_some_and(|i| i.borrower() == Some(m.employee_id)))
                    },
                )
                .stop_on_failure(),
            )
            .rule(SessionRule::new(
                "on",
                "return date precedes the loan date",
                sessions,
                |m: &ReturnItemCommandMessage, s: &Arc<Session>| {
                    Ok(item(s, m.item_id)?.is_some_and(|i| match i.state() {
                        LoanState::OnLoan { since, .. } => m.on >= since,
                        LoanState::Available => true,
                    }))
                },
            )),
    );
}

pub struct RegisterLoanedItemHandler {
    sessions: SessionProvider,
}

impl RegisterLoanedItemHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<RegisterLoanedItemCommandMessage> for RegisterLoanedItemHandler {
    type Output = LoanedItem;
    type Error = HandlerError;

    fn handle(&self, message: &RegisterLoanedItemCommandMessage) -> Result<LoanedItem, HandlerError> {
        let items = SessionRepository::<LoanedItem>::new(self.sessions.current()?);
        let mut item = LoanedItem::new(&message.title, message.kind.clone())?;
        items.save_or_update(&mut item)?;
        tracing::info!(item_id = %item.id(), kind = item.kind().label(), "loaned item registered");
        Ok(item)
    }
}

pub struct LendItemHandler {
    sessions: SessionProvider,
}

impl LendItemHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<LendItemCommandMessage> for LendItemHandler {
    type Output = LoanedItem;
    type Error = HandlerError;

    fn handle(&self, message: &LendItemCommandMessage) -> Result<LoanedItem, HandlerError> {
        let session = self.sessions.current()?;
        let employees = SessionRepository::<Employee>::new(Arc::clone(&session));
        let items = SessionRepository::<LoanedItem>::new(session);

        let mut employee = employees.load(message.employee_id)?;
        let mut item = items.load(message.item_id)?;
        employee.borrow(&mut item, message.on)?;
        employees.save_or_update(&mut employee)?;
        items.save_or_update(&mut item)?;
        tracing::info!(item_id = %item.id(), employee_id = %employee.id(), "item lent");
        Ok(item)
    }
}

pub struct ReturnItemHandler {
    sessions: SessionProvider,
}

impl ReturnItemHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<ReturnItemCommandMessage> for ReturnItemHandler {
    type Output = LoanedItem;
    type Error = HandlerError;

    fn handle(&self, message: &ReturnItemCommandMessage) -> Result<LoanedItem, HandlerError> {
        let session = self.sessions.current()?;
        let employees = SessionRepository::<Employee>::new(Arc::clone(&session));
        let items = SessionRepository::<LoanedItem>::new(session);

        let mut employee = employees.load(message.employee_id)?;
        let mut item = items.load(message.item_id)?;
        employee.give_back(&mut item, message.on)?;
        employees.save_or_update(&mut employee)?;
        items.save_or_update(&mut item)?;
        tracing::info!(item_id = %item.id(), employee_id = %employee.id(), "item returned");
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isbn_shapes() {
        assert!(isbn_is_plausible("978-1-61729-455-6"));
        assert!(isbn_is_plausible("0-306-40615-X"));
        assert!(!isbn_is_plausible("12345"));
        assert!(!isbn_is_plausible("97816172945AB"));
    }
}
