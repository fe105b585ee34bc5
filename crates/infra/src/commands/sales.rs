//! Consumer protection commands.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;

use staffroom_commands::{CommandConfiguration, CommandHandler, CommandMessage, CommandRegistry, PredicateRule};
use staffroom_consumer_protection::{Article, Salesman, SalesmanArticle};
use staffroom_core::{DomainError, Entity, EntityId};

use super::HandlerError;
use super::rules::{exists, max_length, required};
use crate::repository::{Repository, SessionRepository};
use crate::session::SessionProvider;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterArticleCommandMessage {
    pub description: String,
    pub unit_price: i64,
}

impl CommandMessage for RegisterArticleCommandMessage {}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterSalesmanCommandMessage {
    pub name: String,
}

impl CommandMessage for RegisterSalesmanCommandMessage {}

/// Record a sale. Without an explicit `cost` the article's unit price times the
/// amount is charged.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSaleCommandMessage {
    pub salesman_id: EntityId,
    pub article_id: EntityId,
    pub sold_on: NaiveDate,
    pub amount: i32,
    #[serde(default)]
    pub cost: Option<i64>,
}

impl CommandMessage for RecordSaleCommandMessage {}

pub(super) fn configure(registry: &mut CommandRegistry, sessions: &SessionProvider) {
    registry.register(
        CommandConfiguration::new(RegisterArticleHandler::new(sessions))
            .rule(required("description", "description is required", |m: &RegisterArticleCommandMessage| m.description.as_str()))
            .rule(max_length("description", 200, |m: &RegisterArticleCommandMessage| m.description.as_str()))
            .rule(PredicateRule::new(
                "unit_price",
                "unit price cannot be negative",
                |m: &RegisterArticleCommandMessage| m.unit_price >= 0,
            )),
    );

    registry.register(
        CommandConfiguration::new(RegisterSalesmanHandler::new(sessions))
            .rule(required("name", "name is required", |m: &RegisterSalesmanCommandMessage| m.name.as_str())),
    );

    registry.register(
        CommandConfiguration::new(RecordSaleHandler::new(sessions))
            .rule(exists::<_, Salesman>("salesman_id", "salesman does not exist", sessions, |m: &RecordSaleCommandMessage| m.salesman_id))
            .rule(exists::<_, Article>("article_id", "article does not exist", sessions, |m: &RecordSaleCommandMessage| m.article_id))
            .rule(PredicateRule::new(
                "amount",
                "amount must be positive",
                |m: &RecordSaleCommandMessage| m.amount > 0,
            ))
            .rule(PredicateRule::new(
                "cost",
                "cost cannot be negative",
                |m: &RecordSaleCommandMessage| m.cost.is_none_or(|c| c >= 0),
            )),
    );
}

pub struct RegisterArticleHandler {
    sessions: SessionProvider,
}

impl RegisterArticleHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<RegisterArticleCommandMessage> for RegisterArticleHandler {
    type Output = Article;
    type Error = HandlerError;

    fn handle(&self, message: &RegisterArticleCommandMessage) -> Result<Article, HandlerError> {
        let articles = SessionRepository::<Article>::new(self.sessions.current()?);
        let mut article = Article::new(&message.description, message.unit_price)?;
        articles.save_or_update(&mut article)?;
        tracing::info!(article_id = %article.id(), "article registered");
        Ok(article)
    }
}

pub struct RegisterSalesmanHandler {
    sessions: SessionProvider,
}

impl RegisterSalesmanHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<RegisterSalesmanCommandMessage> for RegisterSalesmanHandler {
    type Output = Salesman;
    type Error = HandlerError;

    fn handle(&self, message: &RegisterSalesmanCommandMessage) -> Result<Salesman, HandlerError> {
        let salesmen = SessionRepository::<Salesman>::new(self.sessions.current()?);
        let mut salesman = Salesman::new(&message.name)?;
        salesmen.save_or_update(&mut salesman)?;
        tracing::info!(salesman_id = %salesman.id(), "salesman registered");
        Ok(salesman)
    }
}

pub struct RecordSaleHandler {
    sessions: SessionProvider,
}

impl RecordSaleHandler {
    pub fn new(sessions: &SessionProvider) -> Self {
        Self {
            sessions: sessions.clone(),
        }
    }
}

impl CommandHandler<RecordSaleCommandMessage> for RecordSaleHandler {
    type Output = SalesmanArticle;
    type Error = HandlerError;

    fn handle(&self, message: &RecordSaleCommandMessage) -> Result<SalesmanArticle, HandlerError> {
        let session = self.sessions.current()?;
        let salesman = SessionRepository::<Salesman>::new(Arc::clone(&session)).load(message.salesman_id)?;
        let article = SessionRepository::<Article>::new(Arc::clone(&session)).load(message.article_id)?;
        let sales = SessionRepository::<SalesmanArticle>::new(session);

        let cost = match message.cost {
            Some(cost) => cost,
            None => article
                .unit_price()
                .checked_mul(i64::from(message.amount))
                .ok_or_else(|| DomainError::validation("sale cost overflows"))?,
        };
        let mut sale = SalesmanArticle::record(&salesman, &article, message.sold_on, message.amount, cost)?;
        sales.save_or_update(&mut sale)?;
        tracing::info!(
            sale_id = %sale.id(),
            salesman_id = %salesman.id(),
            article_id = %article.id(),
            cost,
            "sale recorded"
        );
        Ok(sale)
    }
}
