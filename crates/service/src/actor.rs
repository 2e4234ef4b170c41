use uuid::Uuid;

use models::Role;

use crate::errors::ServiceError;

/// The authenticated caller of a service operation.
#[derive(Clone, Debug)]
pub struct Actor {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() { Ok(()) } else { Err(ServiceError::Forbidden("admin role required".into())) }
    }

    pub fn require_reviewer(&self) -> Result<(), ServiceError> {
        if self.role.can_review() { Ok(()) } else { Err(ServiceError::Forbidden("approver or admin role required".into())) }
    }
}
