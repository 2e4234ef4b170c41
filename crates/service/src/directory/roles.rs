use models::{azure_group_mapping, Role};

/// First active mapping whose group the user belongs to; `staff` otherwise.
pub fn resolve_role(user_group_ids: &[String], mappings: &[azure_group_mapping::Model]) -> Role {
    mappings
        .iter()
        .filter(|m| m.is_active)
        .find(|m| user_group_ids.iter().any(|g| g == &m.azure_group_id))
        .map(|m| m.role())
        .unwrap_or(Role::Staff)
}
