//! Rank scales used to score failure modes.

use crate::collection::Collection;
use crate::config::{FieldDef, FieldType};

/// Fields of a rank scale entry: every rank has a name, an explanation, a numeric value and an example.
pub fn rank_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::required("name", FieldType::Text),
        FieldDef::required("description", FieldType::Text),
        FieldDef::required("value", FieldType::Integer),
        FieldDef::required("example", FieldType::Text),
    ]
}

pub struct Severity;

impl Collection for Severity {
    const NAME: &'static str = "Severity";

    fn fields() -> Vec<FieldDef> {
        rank_fields()
    }
}

pub struct Likelihood;

impl Collection for Likelihood {
    const NAME: &'static str = "Likelihood";

    fn fields() -> Vec<FieldDef> {
        rank_fields()
    }
}

pub struct Detection;

impl Collection for Detection {
    const NAME: &'static str = "Detection";

    fn fields() -> Vec<FieldDef> {
        rank_fields()
    }
}

pub struct Impact;

impl Collection for Impact {
    const NAME: &'static str = "Impact";

    fn fields() -> Vec<FieldDef> {
        rank_fields()
    }
}
