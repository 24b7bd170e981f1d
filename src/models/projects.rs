//! Organisation: users, teams, projects, roles and the links between them.

use super::descriptor_fields;
use crate::collection::Collection;
use crate::config::{FieldDef, FieldType};
use serde_json::json;

pub struct Team;

impl Collection for Team {
    const NAME: &'static str = "Team";

    fn fields() -> Vec<FieldDef> {
        descriptor_fields()
    }
}

pub struct Project;

impl Collection for Project {
    const NAME: &'static str = "Project";

    fn fields() -> Vec<FieldDef> {
        descriptor_fields()
    }
}

pub struct User;

impl Collection for User {
    const NAME: &'static str = "User";

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::required("name", FieldType::Text),
            FieldDef::required("email", FieldType::Text),
            FieldDef::optional("last_login", FieldType::Timestamp),
            FieldDef::required("is_admin", FieldType::Boolean).with_default(json!(false)),
        ]
    }
}

pub struct Role;

impl Collection for Role {
    const NAME: &'static str = "Role";

    fn fields() -> Vec<FieldDef> {
        let mut fields = descriptor_fields();
        fields.push(FieldDef::optional("short_name", FieldType::Text));
        fields.push(FieldDef::optional("external_roles", FieldType::Text));
        fields
    }
}

/// Membership of a user in a team, optionally with a role.
pub struct UserTeamLink;

impl Collection for UserTeamLink {
    const NAME: &'static str = "UserTeamLink";

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::optional("user_id", FieldType::Integer).references("users"),
            FieldDef::optional("team_id", FieldType::Integer).references("teams"),
            FieldDef::optional("role_id", FieldType::Integer).references("roles"),
        ]
    }
}

pub struct ProjectTeamLink;

impl Collection for ProjectTeamLink {
    const NAME: &'static str = "ProjectTeamLink";

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::optional("project_id", FieldType::Integer).references("projects"),
            FieldDef::optional("team_id", FieldType::Integer).references("teams"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_tables_and_paths() {
        let d = UserTeamLink::descriptor().unwrap();
        assert_eq!(d.table_name(), "user_team_links");
        assert_eq!(d.path_segment(), "user-team-links");
        assert_eq!(d.referenced_tables().collect::<Vec<_>>(), ["users", "teams", "roles"]);
    }

    #[test]
    fn role_extends_descriptor_fields() {
        let input = Role::input_schema().unwrap();
        assert_eq!(
            input.field_names().collect::<Vec<_>>(),
            ["name", "description", "short_name", "external_roles"]
        );
    }
}
