use shared::domain::{Role, UserId};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: UserId::new(user_id),
            role,
        }
    }
}

/// Holds the caller identity injected by the (out-of-scope) auth layer.
/// Stores read it for their authorization prechecks.
#[derive(Default)]
pub struct Session {
    identity: RwLock<Option<Identity>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sign_in(&self, identity: Identity) {
        info!(user = %identity.user_id, role = ?identity.role, "session established");
        *self.identity.write().await = Some(identity);
    }

    pub async fn sign_out(&self) {
        *self.identity.write().await = None;
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.identity.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<UserId> {
        self.identity
            .read()
            .await
            .as_ref()
            .map(|identity| identity.user_id.clone())
    }

    pub(crate) async fn require_identity(&self) -> Result<Identity, StoreError> {
        self.identity().await.ok_or(StoreError::NotAuthorized)
    }

    pub(crate) async fn require_admin(&self) -> Result<Identity, StoreError> {
        let identity = self.require_identity().await?;
        if identity.role == Role::Admin {
            Ok(identity)
        } else {
            Err(StoreError::NotAuthorized)
        }
    }
}
