use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminClaims {
    pub sub: String, // Staff user ID (Subject)
    pub name: Option<String>,
    pub roles: Option<Vec<String>>,
    pub exp: usize, // Expiration time (UNIX timestamp)
}

impl AdminClaims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles
            .as_deref()
            .is_some_and(|roles| roles.iter().any(|r| r == role))
    }
}

/// Authenticated staff member, inserted into request extensions by the admin
/// auth middleware.
#[derive(Clone, Debug)]
pub struct StaffContext {
    pub user_id: String,
    pub claims: AdminClaims,
}
