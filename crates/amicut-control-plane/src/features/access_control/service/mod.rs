use std::collections::HashSet;

use crate::shared::error::{ControlPlaneError, ControlPlaneResult};

/// Decides whether a caller may run an action such as `ami.build`.
///
/// Authentication itself happens upstream; by the time a command arrives
/// here the user name is trusted.
pub trait PermissionGate: Send + Sync {
    fn authorize(&self, user: &str, action: &str) -> ControlPlaneResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllGate;

impl PermissionGate for AllowAllGate {
    fn authorize(&self, _user: &str, _action: &str) -> ControlPlaneResult<()> {
        Ok(())
    }
}

/// Grants every action to a fixed set of users.
#[derive(Debug, Clone)]
pub struct StaticPermissionGate {
    users: HashSet<String>,
}

impl StaticPermissionGate {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
        }
    }
}

impl PermissionGate for StaticPermissionGate {
    fn authorize(&self, user: &str, action: &str) -> ControlPlaneResult<()> {
        if self.users.contains(user) {
            Ok(())
        } else {
            Err(ControlPlaneError::PermissionDenied(format!(
                "{user} may not run {action}"
            )))
        }
    }
}
