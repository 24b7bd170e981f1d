//! Failure mode analysis vocabulary.

use super::descriptor_fields;
use crate::collection::Collection;
use crate::config::FieldDef;

pub struct Failure;

impl Collection for Failure {
    const NAME: &'static str = "Failure";

    fn fields() -> Vec<FieldDef> {
        descriptor_fields()
    }
}

pub struct Cause;

impl Collection for Cause {
    const NAME: &'static str = "Cause";

    fn fields() -> Vec<FieldDef> {
        descriptor_fields()
    }
}

pub struct Effect;

impl Collection for Effect {
    const NAME: &'static str = "Effect";

    fn fields() -> Vec<FieldDef> {
        descriptor_fields()
    }
}
