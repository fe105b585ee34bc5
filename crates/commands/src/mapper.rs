//! Pluggable mapping from UI messages to command messages.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Maps a source message onto a destination type.
///
/// The interface is type-erased so a mapper can sit behind a trait object; use
/// [`map_message`] for the typed call.
pub trait MessageMapper: Send + Sync {
    /// Map `source` to an instance of `destination`, or `None` when no mapping
    /// between the two types is known.
    fn map_erased(
        &self,
        source: &(dyn Any + Send + Sync),
        destination: TypeId,
    ) -> Option<Box<dyn Any + Send>>;
}

/// Typed helper over [`MessageMapper::map_erased`].
pub fn map_message<S, D, Mp>(mapper: &Mp, source: &S) -> Option<D>
where
    S: Any + Send + Sync,
    D: Any + Send,
    Mp: MessageMapper + ?Sized,
{
    mapper
        .map_erased(source, TypeId::of::<D>())
        .and_then(|mapped| mapped.downcast::<D>().ok())
        .map(|mapped| *mapped)
}

type MapFn = Box<dyn Fn(&(dyn Any + Send + Sync)) -> Option<Box<dyn Any + Send>> + Send + Sync>;

/// Mapper backed by registered conversion functions.
#[derive(Default)]
pub struct MappingRegistry {
    mappings: HashMap<(TypeId, TypeId), MapFn>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the conversion from `S` to `D`.
    pub fn register<S, D>(&mut self, map: impl Fn(&S) -> D + Send + Sync + 'static) -> &mut Self
    where
        S: Any + Send + Sync,
        D: Any + Send,
    {
        let erased: MapFn = Box::new(move |source: &(dyn Any + Send + Sync)| {
            source
                .downcast_ref::<S>()
                .map(|s| Box::new(map(s)) as Box<dyn Any + Send>)
        });
        self.mappings
            .insert((TypeId::of::<S>(), TypeId::of::<D>()), erased);
        self
    }

    /// Register the identity mapping for messages posted as-is.
    pub fn register_identity<T>(&mut self) -> &mut Self
    where
        T: Any + Clone + Send + Sync,
    {
        self.register::<T, T>(T::clone)
    }

    pub fn contains<S: Any, D: Any>(&self) -> bool {
        self.mappings.contains_key(&(TypeId::of::<S>(), TypeId::of::<D>()))
    }
}

impl MessageMapper for MappingRegistry {
    fn map_erased(
        &self,
        source: &(dyn Any + Send + Sync),
        destination: TypeId,
    ) -> Option<Box<dyn Any + Send>> {
        let source_type = (*source).type_id();
        let map = self.mappings.get(&(source_type, destination))?;
        map(source)
    }
}

impl core::fmt::Debug for MappingRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MappingRegistry")
            .field("mappings", &self.mappings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Form {
        name: String,
    }

    #[derive(Debug, PartialEq)]
    struct Command {
        name: String,
    }

    #[test]
    fn registered_mapping_converts_message() {
        let mut mapper = MappingRegistry::new();
        mapper.register::<Form, Command>(|f| Command {
            name: f.name.trim().to_string(),
        });

        let mapped: Option<Command> = map_message(&mapper, &Form {
            name: " Ops ".to_string(),
        });
        assert_eq!(
            mapped,
            Some(Command {
                name: "Ops".to_string()
            })
        );
    }

    #[test]
    fn unknown_pair_yields_none() {
        let mut mapper = MappingRegistry::new();
        mapper.register_identity::<Form>();

        let mapped: Option<Command> = map_message(&mapper, &Form {
            name: "x".to_string(),
        });
        assert!(mapped.is_none());
        assert!(mapper.contains::<Form, Form>());
    }
}
