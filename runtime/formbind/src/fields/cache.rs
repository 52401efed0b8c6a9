use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use super::{Destination, FieldMetadata, derive};

static GLOBAL: LazyLock<Arc<FieldCache>> = LazyLock::new(|| Arc::new(FieldCache::new()));

#[derive(Debug, Default)]
/// A thread-safe cache of [`FieldMetadata`], keyed by destination type.
///
/// Metadata is computed the first time a type is seen and never invalidated.
/// Concurrent first requests for the same type may both compute it, but they
/// all end up sharing the same cached value.
pub struct FieldCache {
    entries: RwLock<HashMap<TypeId, Arc<[FieldMetadata]>>>,
}

impl FieldCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache, used by decoders unless you provide your own.
    pub fn global() -> Arc<FieldCache> {
        GLOBAL.clone()
    }

    /// The bindable fields of `D`.
    pub fn fields<D: Destination>(&self) -> Arc<[FieldMetadata]> {
        let key = TypeId::of::<D>();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(fields) = entries.get(&key) {
                return fields.clone();
            }
        }

        let fields: Arc<[FieldMetadata]> = derive::<D>().into();
        tracing::debug!(
            destination = type_name::<D>(),
            n_fields = fields.len(),
            "Computed field metadata"
        );
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.entry(key).or_insert(fields).clone()
    }

    /// Returns `true` if the metadata for `D` has already been computed.
    pub fn contains<D: Destination>(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<D>())
    }

    /// The number of destination types in the cache.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
