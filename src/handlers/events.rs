//! Account status event handling
//!
//! When a platform account is blocked, every chat bound to it must stop
//! working for both login and handshake confirmation. Blocking appends a
//! `Blocked` snapshot per bound chat; any other status change is a no-op.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::database::repositories::ChatBindingStore;
use crate::models::binding::{ChatBindingStatus, NewChatBinding};
use crate::utils::errors::Result;

/// Emitted by account administration when an account's standing changes
#[derive(Debug, Clone, PartialEq)]
pub struct AccountStatusChanged {
    pub account_id: Uuid,
    pub blocked: bool,
}

#[derive(Clone)]
pub struct BanPropagationHandler {
    bindings: Arc<dyn ChatBindingStore>,
}

impl BanPropagationHandler {
    pub fn new(bindings: Arc<dyn ChatBindingStore>) -> Self {
        Self { bindings }
    }

    /// Propagate an account block onto its chat bindings.
    ///
    /// Only the blocked direction propagates; an unblock never reactivates
    /// bindings, the chat re-proves ownership through registration.
    pub async fn handle(&self, event: &AccountStatusChanged) -> Result<()> {
        if !event.blocked {
            debug!(account_id = %event.account_id, "Ignoring non-blocked account status");
            return Ok(());
        }

        let bindings = self.bindings.find_by_account(event.account_id).await?;
        if bindings.is_empty() {
            debug!(account_id = %event.account_id, "No chat bindings for account");
            return Ok(());
        }

        for binding in &bindings {
            if binding.is_blocked() {
                continue;
            }
            let snapshot =
                NewChatBinding::from_snapshot(binding).with_status(ChatBindingStatus::Blocked);
            self.bindings.save(snapshot).await?;
        }

        info!(
            account_id = %event.account_id,
            chats = bindings.len(),
            "Blocked chat bindings for account"
        );
        Ok(())
    }
}
