//! Capability trait implemented by every collection type, and the per-type descriptor cache.
//!
//! A collection is a marker type that declares its domain fields. The resolved
//! [`EntityDescriptor`] is built once per type; its input/output schemas are in turn built
//! once per descriptor, so every caller sees the same schema `Arc`.

use crate::case::tableize;
use crate::config::{EntityDescriptor, FieldDef};
use crate::error::ConfigError;
use crate::schema::Schema;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

pub trait Collection: 'static {
    /// Type name, e.g. "Severity". Table and path names are derived from it.
    const NAME: &'static str;

    /// Domain fields. Base fields (`id`, timestamps) are added by the descriptor.
    fn fields() -> Vec<FieldDef>;

    /// Declared fields hidden from responses and list filters, besides `deleted_at`.
    fn excluded() -> &'static [&'static str] {
        &[]
    }

    fn table_name() -> String {
        tableize(Self::NAME)
    }

    /// Resolved descriptor, built on first call and shared afterwards.
    fn descriptor() -> Result<Arc<EntityDescriptor>, ConfigError> {
        descriptor_of::<Self>()
    }

    fn input_schema() -> Result<Arc<Schema>, ConfigError> {
        Ok(Self::descriptor()?.input_schema())
    }

    fn output_schema() -> Result<Arc<Schema>, ConfigError> {
        Ok(Self::descriptor()?.output_schema())
    }
}

fn cache() -> &'static RwLock<HashMap<TypeId, Arc<EntityDescriptor>>> {
    static DESCRIPTORS: OnceLock<RwLock<HashMap<TypeId, Arc<EntityDescriptor>>>> = OnceLock::new();
    DESCRIPTORS.get_or_init(|| RwLock::new(HashMap::new()))
}

fn descriptor_of<C: Collection + ?Sized>() -> Result<Arc<EntityDescriptor>, ConfigError> {
    let key = TypeId::of::<C>();
    if let Some(found) = cache()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(&key)
    {
        return Ok(found.clone());
    }
    let built = Arc::new(EntityDescriptor::with_exclusions(
        C::NAME,
        C::fields(),
        C::excluded(),
    )?);
    let mut guard = cache().write().unwrap_or_else(|poisoned| poisoned.into_inner());
    // Another thread may have won the race; keep the first one so identities stay stable.
    Ok(guard.entry(key).or_insert(built).clone())
}
