use serde::{Deserialize, Serialize};

use staffroom_core::{DomainError, DomainResult, EntityId};

/// Entity: an article that salesmen sell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    id: EntityId,
    description: String,
    /// Price in smallest currency unit (e.g. cents).
    unit_price: i64,
}

staffroom_core::impl_entity!(Article);

impl Article {
    pub fn new(description: impl Into<String>, unit_price: i64) -> DomainResult<Self> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(DomainError::validation("article description cannot be empty"));
        }
        if unit_price < 0 {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        Ok(Self {
            id: EntityId::TRANSIENT,
            description,
            unit_price,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn unit_price(&self) -> i64 {
        self.unit_price
    }
}
