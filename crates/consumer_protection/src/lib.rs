//! Consumer protection domain module: articles, salesmen and their dated sales.

pub mod article;
pub mod report;
pub mod salesman;

pub use article::Article;
pub use report::{SalesmanArticleGroupedByMonthAndDescription, group_by_month_and_description};
pub use salesman::{Salesman, SalesmanArticle};
