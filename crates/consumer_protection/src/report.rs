//! Read-only monthly sales report.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use staffroom_core::{DomainError, DomainResult, Entity, EntityId};

use crate::article::Article;
use crate::salesman::SalesmanArticle;

/// Sales of one salesman, summed per calendar month and article description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesmanArticleGroupedByMonthAndDescription {
    pub salesman_id: EntityId,
    pub year: i32,
    pub month: u32,
    pub description: String,
    pub total_amount: i64,
    pub total_cost: i64,
    pub transactions: usize,
}

/// Group `sales` by (salesman, year, month, article description).
///
/// Rows come out ordered by salesman, year, month, then description. Sales whose
/// article is missing from `articles` are skipped. A group whose amount or cost
/// total does not fit in an `i64` is a validation error.
pub fn group_by_month_and_description<'a>(
    sales: impl IntoIterator<Item = &'a SalesmanArticle>,
    articles: impl IntoIterator<Item = &'a Article>,
) -> DomainResult<Vec<SalesmanArticleGroupedByMonthAndDescription>> {
    let descriptions: HashMap<EntityId, &str> = articles
        .into_iter()
        .map(|a| (a.id(), a.description()))
        .collect();

    let mut groups: BTreeMap<(EntityId, i32, u32, String), (i64, i64, usize)> = BTreeMap::new();
    for sale in sales {
        let Some(description) = descriptions.get(&sale.article_id()) else {
            continue;
        };
        let key = (
            sale.salesman_id(),
            sale.sold_on().year(),
            sale.sold_on().month(),
            (*description).to_string(),
        );
        let entry = groups.entry(key).or_insert((0, 0, 0));
        entry.0 = entry
            .0
            .checked_add(i64::from(sale.amount()))
            .ok_or_else(|| total_overflow("amount", sale))?;
        entry.1 = entry
            .1
            .checked_add(sale.cost())
            .ok_or_else(|| total_overflow("cost", sale))?;
        entry.2 += 1;
    }

    Ok(groups
        .into_iter()
        .map(
            |((salesman_id, year, month, description), (total_amount, total_cost, transactions))| {
                SalesmanArticleGroupedByMonthAndDescription {
                    salesman_id,
                    year,
                    month,
                    description,
                    total_amount,
                    total_cost,
                    transactions,
                }
            },
        )
        .collect())
}

fn total_overflow(total: &str, sale: &SalesmanArticle) -> DomainError {
    DomainError::validation(format!(
        "monthly {total} total of salesman {} for {} overflows",
        sale.salesman_id(),
        sale.sold_on().format("%Y-%m")
    ))
}
