use super::{BridgeError, BridgeRequest, BridgeResponse, MessageBridge};
use crate::engine::{prune_ban_table, ActiveBlockedState, UserPreferences};
use crate::store::PreferenceStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Serves bridge requests from a `PreferenceStore` on behalf of one user at
/// one active location.
pub struct StoreBridge {
    store: Arc<dyn PreferenceStore>,
    user_id: String,
    location: String,
}

impl StoreBridge {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        user_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            location: location.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

#[async_trait]
impl MessageBridge for StoreBridge {
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        debug!(request = request.kind(), user = %self.user_id, "bridge request");

        match request {
            BridgeRequest::GetBlockedDomains => {
                let table = self.store.load_ban_table()?;
                let preferences = self.store.load_user_preferences(&self.user_id)?;
                Ok(BridgeResponse::BlockedDomains(ActiveBlockedState::derive(
                    self.location.clone(),
                    table,
                    preferences,
                )))
            }
            BridgeRequest::UpdateUserPreferences {
                user_blocked_domains,
                override_domains,
            } => {
                let preferences = UserPreferences {
                    user_blocked_domains,
                    override_domains,
                };
                self.store
                    .save_user_preferences(&self.user_id, &preferences)?;
                info!(
                    "Saved preferences for '{}': {} blocked, {} overridden",
                    self.user_id,
                    preferences.user_blocked_domains.len(),
                    preferences.override_domains.len()
                );
                Ok(BridgeResponse::Ack)
            }
            BridgeRequest::UpdateBannedDomains { banned_domains } => {
                let banned_domains = prune_ban_table(banned_domains);
                self.store.save_ban_table(&banned_domains)?;
                info!(
                    "Saved ban table with {} location(s)",
                    banned_domains.len()
                );
                Ok(BridgeResponse::Ack)
            }
        }
    }
}
