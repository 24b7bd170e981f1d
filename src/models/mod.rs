//! Built-in collections, grouped the way they are served.

pub mod process;
pub mod projects;
pub mod reference;

use crate::config::{FieldDef, FieldType};
use crate::error::ConfigError;
use crate::routes::CollectionsRouter;

pub use process::{Cause, Effect, Failure};
pub use projects::{Project, ProjectTeamLink, Role, Team, User, UserTeamLink};
pub use reference::{Detection, Impact, Likelihood, Severity};

/// `name` plus optional `description`, shared by simple descriptor collections.
pub fn descriptor_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::required("name", FieldType::Text),
        FieldDef::optional("description", FieldType::Text),
    ]
}

/// `/reference`: rank scales used to score failure modes.
pub fn reference_router() -> Result<CollectionsRouter, ConfigError> {
    CollectionsRouter::new("/reference", &["Reference"])
        .add_collection::<Severity>()?
        .add_collection::<Likelihood>()?
        .add_collection::<Detection>()?
        .add_collection::<Impact>()
}

/// `/projects`: organisation collections and their links.
pub fn projects_router() -> Result<CollectionsRouter, ConfigError> {
    CollectionsRouter::new("/projects", &["Projects"])
        .add_collection::<User>()?
        .add_collection::<Team>()?
        .add_collection::<Project>()?
        .add_collection::<Role>()?
        .add_collection::<UserTeamLink>()?
        .add_collection::<ProjectTeamLink>()
}

/// `/process`: failure modes, their causes and effects.
pub fn process_router() -> Result<CollectionsRouter, ConfigError> {
    CollectionsRouter::new("/process", &["Process"])
        .add_collection::<Failure>()?
        .add_collection::<Cause>()?
        .add_collection::<Effect>()
}

/// Every built-in router, in serving order.
pub fn builtin_routers() -> Result<Vec<CollectionsRouter>, ConfigError> {
    Ok(vec![reference_router()?, projects_router()?, process_router()?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_routers_validate_together() {
        let routers = builtin_routers().unwrap();
        let tables: HashSet<String> = routers
            .iter()
            .flat_map(|r| r.collections())
            .map(|c| c.table_name().to_string())
            .collect();
        assert_eq!(tables.len(), 13);
        for r in &routers {
            r.validate(&tables).unwrap();
        }
        let paths: Vec<String> = routers[0]
            .collections()
            .iter()
            .map(|c| routers[0].collection_path(c))
            .collect();
        assert_eq!(
            paths,
            ["/reference/severities", "/reference/likelihoods", "/reference/detections", "/reference/impacts"]
        );
    }
}
