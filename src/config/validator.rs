//! Descriptor validation: field names and collection registry consistency.

use crate::config::resolved::{base_fields, EntityDescriptor};
use crate::config::types::FieldDef;
use crate::error::ConfigError;
use std::collections::HashSet;
use std::sync::Arc;

/// Check one entity declaration before it is resolved.
pub fn validate_descriptor(
    name: &str,
    domain_fields: &[FieldDef],
    exclude: &[&str],
) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::EmptyName);
    }
    let reserved: HashSet<String> = base_fields().into_iter().map(|f| f.name).collect();
    let mut seen = HashSet::new();
    for f in domain_fields {
        if reserved.contains(&f.name) {
            return Err(ConfigError::ReservedField {
                entity: name.to_string(),
                field: f.name.clone(),
            });
        }
        if !seen.insert(f.name.as_str()) {
            return Err(ConfigError::DuplicateField {
                entity: name.to_string(),
                field: f.name.clone(),
            });
        }
    }
    for ex in exclude {
        if !seen.contains(ex) && !reserved.contains(*ex) {
            return Err(ConfigError::UnknownExclusion {
                entity: name.to_string(),
                field: ex.to_string(),
            });
        }
    }
    Ok(())
}

/// Check a set of collections served together: unique paths and resolvable foreign keys.
/// `known_tables` are tables served elsewhere that foreign keys may also point at.
pub fn validate_collections(
    prefix: &str,
    collections: &[Arc<EntityDescriptor>],
    known_tables: &HashSet<String>,
) -> Result<(), ConfigError> {
    let mut paths = HashSet::new();
    let mut tables: HashSet<&str> = known_tables.iter().map(String::as_str).collect();
    for c in collections {
        tables.insert(c.table_name());
    }
    for c in collections {
        let path = format!("{}/{}", prefix.trim_end_matches('/'), c.path_segment());
        if !paths.insert(path.clone()) {
            return Err(ConfigError::DuplicatePath(path));
        }
        for f in c.fields() {
            if let Some(table) = f.references.as_deref() {
                if !tables.contains(table) {
                    return Err(ConfigError::UnknownForeignKey {
                        entity: c.name().to_string(),
                        field: f.name.clone(),
                        table: table.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}
