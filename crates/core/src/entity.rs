//! Entity trait: identity + continuity across state changes.
//!
//! Entities are identified by an integer key assigned by the persistence session
//! on first save. Until then the entity is *transient* (`EntityId::TRANSIENT`).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Integer identity of a persisted entity.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    /// Identity of an entity that has never been saved.
    pub const TRANSIENT: EntityId = EntityId(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    pub const fn is_transient(self) -> bool {
        self.0 == 0
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<EntityId> for i64 {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl FromStr for EntityId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = i64::from_str(s.trim())
            .map_err(|e| DomainError::invalid_id(format!("EntityId: {e}")))?;
        if value < 0 {
            return Err(DomainError::invalid_id(format!(
                "EntityId: negative identity {value}"
            )));
        }
        Ok(Self(value))
    }
}

/// Entity marker + minimal interface.
pub trait Entity {
    /// Returns the entity identifier (`EntityId::TRANSIENT` until persisted).
    fn id(&self) -> EntityId;

    /// Assigns the identity. Only the persistence session should call this.
    fn set_id(&mut self, id: EntityId);

    fn is_transient(&self) -> bool {
        self.id().is_transient()
    }
}

/// Identity equality shared by every entity type.
///
/// Two persisted entities are equal when their ids are equal, whatever their other
/// fields hold. As soon as one side is transient only the very same instance is
/// equal to itself.
pub fn same_identity<E: Entity + ?Sized>(a: &E, b: &E) -> bool {
    let (left, right) = (a.id(), b.id());
    if left.is_transient() || right.is_transient() {
        return core::ptr::eq(a as *const E as *const (), b as *const E as *const ());
    }
    left == right
}

/// Implements `Entity`, `PartialEq` and `Eq` for a struct with an `id: EntityId` field.
#[macro_export]
macro_rules! impl_entity {
    ($t:ty) => {
        impl $crate::Entity for $t {
            fn id(&self) -> $crate::EntityId {
                self.id
            }

            fn set_id(&mut self, id: $crate::EntityId) {
                self.id = id;
            }
        }

        impl PartialEq for $t {
            fn eq(&self, other: &Self) -> bool {
                $crate::same_identity(self, other)
            }
        }

        impl Eq for $t {}
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    struct Widget {
        id: EntityId,
        label: String,
    }

    crate::impl_entity!(Widget);

    fn widget(id: i64, label: &str) -> Widget {
        Widget {
            id: EntityId::new(id),
            label: label.to_string(),
        }
    }

    #[test]
    fn persisted_entities_with_same_id_are_equal() {
        assert_eq!(widget(7, "left"), widget(7, "right"));
    }

    #[test]
    fn persisted_entities_with_different_ids_differ() {
        assert_ne!(widget(7, "same"), widget(8, "same"));
    }

    #[test]
    fn transient_entity_equals_only_itself() {
        let a = widget(0, "same");
        let b = widget(0, "same");
        assert_eq!(a, a);
        assert_ne!(a, b);
        assert_ne!(a, a.clone());
    }

    #[test]
    fn transient_never_equals_persisted() {
        let transient = widget(0, "x");
        let persisted = widget(1, "x");
        assert_ne!(transient, persisted);
        assert_ne!(persisted, transient);
    }

    #[test]
    fn set_id_makes_entity_persisted() {
        let mut w = widget(0, "x");
        assert!(w.is_transient());
        w.set_id(EntityId::new(3));
        assert!(!w.is_transient());
        assert_eq!(w.label, "x");
    }

    #[test]
    fn parse_rejects_negative_and_garbage() {
        assert_eq!("42".parse::<EntityId>().unwrap(), EntityId::new(42));
        assert!(matches!("-1".parse::<EntityId>(), Err(DomainError::InvalidId(_))));
        assert!(matches!("abc".parse::<EntityId>(), Err(DomainError::InvalidId(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Equality of persisted entities depends on the id only.
        #[test]
        fn equality_follows_non_zero_ids(
            a in 1i64..10_000,
            b in 1i64..10_000,
            la in "[a-z]{0,8}",
            lb in "[a-z]{0,8}",
        ) {
            prop_assert_eq!(widget(a, &la) == widget(b, &lb), a == b);
        }
    }
}
