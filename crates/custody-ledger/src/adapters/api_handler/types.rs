//! # API Handler Types
//!
//! Request parameter and response shapes.

use crate::domain::entities::TransferToNext;
use crate::domain::identity::ItemId;
use serde::{Deserialize, Serialize};
use shared_types::PartyId;
use uuid::Uuid;

/// One JSON method call. Travels as the payload of an `AuthenticatedCall`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Params naming a single item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemParams {
    pub item_id: ItemId,
}

/// Params naming a party. Absent means "the caller".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartyParams {
    #[serde(default)]
    pub party: Option<PartyId>,
}

/// Params of `custody_transferToNext`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    pub item_id: ItemId,
    #[serde(flatten)]
    pub request: TransferToNext,
}

/// Error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub kind: String,
    pub message: String,
}

/// Response to one call, echoing its correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl ApiResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
