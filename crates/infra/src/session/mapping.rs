//! Entity-to-table mapping.

use std::collections::HashMap;

use staffroom_consumer_protection::{Article, Salesman, SalesmanArticle};
use staffroom_core::{Entity, EntityId};
use staffroom_staff::{Employee, LoanedItem, Team, TeamEmployee};

use super::Table;

/// An entity type the session knows how to store.
pub trait Mapped: Entity + Clone + Send + Sync + 'static {
    /// Table name, used in logs, errors and as the identity sequence key.
    const TABLE: &'static str;

    fn table(tables: &Tables) -> &Table<Self>;
    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;
}

/// Every mapped table.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    employees: Table<Employee>,
    teams: Table<Team>,
    team_employees: Table<TeamEmployee>,
    loaned_items: Table<LoanedItem>,
    articles: Table<Article>,
    salesmen: Table<Salesman>,
    salesman_articles: Table<SalesmanArticle>,
    versions: HashMap<(&'static str, EntityId), u64>,
}

impl Tables {
    /// Number of writes a row has seen; zero for a row never written.
    pub fn version(&self, table: &'static str, id: EntityId) -> u64 {
        self.versions.get(&(table, id)).copied().unwrap_or(0)
    }

    pub(super) fn bump(&mut self, table: &'static str, id: EntityId) {
        *self.versions.entry((table, id)).or_insert(0) += 1;
    }
}

macro_rules! map_table {
    ($t:ty, $field:ident) => {
        impl Mapped for $t {
            const TABLE: &'static str = stringify!($field);

            fn table(tables: &Tables) -> &Table<Self> {
                &tables.$field
            }

            fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
                &mut tables.$field
            }
        }
    };
}

map_table!(Employee, employees);
map_table!(Team, teams);
map_table!(TeamEmployee, team_employees);
map_table!(LoanedItem, loaned_items);
map_table!(Article, articles);
map_table!(Salesman, salesmen);
map_table!(SalesmanArticle, salesman_articles);
