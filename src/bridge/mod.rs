//! Request/response channel between the scanner, the preferences panel and
//! the preference store.

mod router;

pub use router::StoreBridge;

use crate::engine::{ActiveBlockedState, DomainList, LocationBanTable};
use crate::store::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeRequest {
    GetBlockedDomains,
    #[serde(rename_all = "camelCase")]
    UpdateUserPreferences {
        user_blocked_domains: DomainList,
        override_domains: DomainList,
    },
    #[serde(rename_all = "camelCase")]
    UpdateBannedDomains { banned_domains: LocationBanTable },
}

impl BridgeRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeRequest::GetBlockedDomains => "GET_BLOCKED_DOMAINS",
            BridgeRequest::UpdateUserPreferences { .. } => "UPDATE_USER_PREFERENCES",
            BridgeRequest::UpdateBannedDomains { .. } => "UPDATE_BANNED_DOMAINS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    BlockedDomains(ActiveBlockedState),
    Ack,
}

impl BridgeResponse {
    fn kind(&self) -> &'static str {
        match self {
            BridgeResponse::BlockedDomains(_) => "blocked domains",
            BridgeResponse::Ack => "ack",
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{request} answered with unexpected {response}")]
    UnexpectedResponse {
        request: &'static str,
        response: &'static str,
    },
    #[error("message bridge unavailable: {0}")]
    Unavailable(String),
}

/// The message channel. Implementations route each request to whatever
/// holds the preferences.
#[async_trait]
pub trait MessageBridge: Send + Sync {
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError>;

    async fn get_blocked_domains(&self) -> Result<ActiveBlockedState, BridgeError> {
        match self.send(BridgeRequest::GetBlockedDomains).await? {
            BridgeResponse::BlockedDomains(state) => Ok(state),
            other => Err(BridgeError::UnexpectedResponse {
                request: "GET_BLOCKED_DOMAINS",
                response: other.kind(),
            }),
        }
    }

    async fn update_user_preferences(
        &self,
        user_blocked_domains: DomainList,
        override_domains: DomainList,
    ) -> Result<(), BridgeError> {
        let request = BridgeRequest::UpdateUserPreferences {
            user_blocked_domains,
            override_domains,
        };
        expect_ack(request.kind(), self.send(request).await?)
    }

    async fn update_banned_domains(
        &self,
        banned_domains: LocationBanTable,
    ) -> Result<(), BridgeError> {
        let request = BridgeRequest::UpdateBannedDomains { banned_domains };
        expect_ack(request.kind(), self.send(request).await?)
    }
}

fn expect_ack(request: &'static str, response: BridgeResponse) -> Result<(), BridgeError> {
    match response {
        BridgeResponse::Ack => Ok(()),
        other => Err(BridgeError::UnexpectedResponse {
            request,
            response: other.kind(),
        }),
    }
}
