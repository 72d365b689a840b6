//! # API Gateway Handler
//!
//! Core handler struct and method dispatch.

use super::types::{ApiErrorBody, ApiRequest, ApiResponse, ItemParams, PartyParams, TransferParams};
use crate::domain::entities::RegisterItem;
use crate::domain::errors::LedgerError;
use crate::ports::inbound::CustodyLedgerApi;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{AuthenticatedCall, PartyId};
use thiserror::Error;
use tracing::debug;

/// API Gateway handler for the custody ledger.
///
/// Wraps a `CustodyLedgerApi` implementation and answers JSON method calls.
pub struct ApiGatewayHandler<A: CustodyLedgerApi> {
    service: A,
}

impl<A: CustodyLedgerApi> ApiGatewayHandler<A> {
    /// Create a new API Gateway handler.
    pub fn new(service: A) -> Self {
        Self { service }
    }

    /// Get reference to underlying service
    pub fn service(&self) -> &A {
        &self.service
    }

    /// Handle `ping` - health check.
    pub fn handle_ping(&self) -> Value {
        json!({
            "status": "pong",
            "component": "custody-ledger",
            "envelopeVersion": AuthenticatedCall::<()>::CURRENT_VERSION,
        })
    }

    /// Answer one enveloped call.
    ///
    /// Never fails: every error becomes the `error` member of the response.
    pub fn handle_call(&self, call: &AuthenticatedCall<ApiRequest>) -> ApiResponse {
        let outcome = if call.is_supported_version() {
            handle_api_query(
                self,
                call.caller.as_ref(),
                &call.payload.method,
                &call.payload.params,
            )
        } else {
            Err(ApiQueryError::UnsupportedVersion(call.version))
        };

        match outcome {
            Ok(result) => ApiResponse {
                id: call.correlation_id,
                result: Some(result),
                error: None,
            },
            Err(err) => {
                debug!(
                    method = %call.payload.method,
                    kind = err.kind(),
                    "[custody] Call failed: {}",
                    err
                );
                ApiResponse {
                    id: call.correlation_id,
                    result: None,
                    error: Some(err.to_body()),
                }
            }
        }
    }
}

/// API query error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiQueryError {
    /// Unknown method
    #[error("Unknown method: {0}")]
    UnknownMethod(String),
    /// Invalid parameters
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    /// Mutating method called without a caller in the envelope
    #[error("Method {0} requires an authenticated caller")]
    MissingCaller(String),
    /// Envelope version this handler cannot read
    #[error("Unsupported envelope version {0}")]
    UnsupportedVersion(u16),
    /// The ledger rejected the call
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ApiQueryError {
    /// Wire name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownMethod(_) => "UnknownMethod",
            Self::InvalidParams(_) => "InvalidParams",
            Self::MissingCaller(_) => "MissingCaller",
            Self::UnsupportedVersion(_) => "UnsupportedVersion",
            Self::Ledger(e) => e.kind().as_str(),
        }
    }

    pub fn to_body(&self) -> ApiErrorBody {
        ApiErrorBody {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }

    /// `{"error": {"kind", "message"}}`
    pub fn to_json(&self) -> Value {
        json!({ "error": self.to_body() })
    }
}

fn parse<T: DeserializeOwned>(params: &Value) -> Result<T, ApiQueryError> {
    serde_json::from_value(params.clone()).map_err(|e| ApiQueryError::InvalidParams(e.to_string()))
}

fn render<T: Serialize>(value: T) -> Result<Value, ApiQueryError> {
    serde_json::to_value(value).map_err(|e| LedgerError::Serialization(e.to_string()).into())
}

fn require_caller<'a>(
    caller: Option<&'a PartyId>,
    method: &str,
) -> Result<&'a PartyId, ApiQueryError> {
    caller.ok_or_else(|| ApiQueryError::MissingCaller(method.to_string()))
}

fn party_or_caller(params: &Value, caller: Option<&PartyId>, method: &str) -> Result<PartyId, ApiQueryError> {
    let params: PartyParams = if params.is_null() {
        PartyParams::default()
    } else {
        parse(params)?
    };
    match params.party {
        Some(party) => Ok(party),
        None => require_caller(caller, method).cloned(),
    }
}

/// Handle an API query.
///
/// Dispatches to the service based on the method name and returns the
/// `result` payload.
pub fn handle_api_query<A: CustodyLedgerApi>(
    handler: &ApiGatewayHandler<A>,
    caller: Option<&PartyId>,
    method: &str,
    params: &Value,
) -> Result<Value, ApiQueryError> {
    let service = &handler.service;

    match method {
        "custody_register" => {
            let caller = require_caller(caller, method)?;
            let request: RegisterItem = parse(params)?;
            render(service.register(caller, request)?)
        }

        "custody_confirmReceipt" => {
            let caller = require_caller(caller, method)?;
            let ItemParams { item_id } = parse(params)?;
            render(service.confirm_receipt(caller, &item_id)?)
        }

        "custody_transferToNext" => {
            let caller = require_caller(caller, method)?;
            let TransferParams { item_id, request } = parse(params)?;
            render(service.transfer_to_next(caller, &item_id, request)?)
        }

        "custody_getItem" => {
            let ItemParams { item_id } = parse(params)?;
            render(service.get_item(&item_id)?)
        }

        "custody_getTail" => {
            let ItemParams { item_id } = parse(params)?;
            render(service.get_tail(&item_id)?)
        }

        "custody_getHistory" => {
            let ItemParams { item_id } = parse(params)?;
            render(service.get_history(&item_id)?)
        }

        "custody_verifyHistory" => {
            let ItemParams { item_id } = parse(params)?;
            let head = service.verify_history(&item_id)?;
            Ok(json!({
                "itemId": item_id,
                "headHash": hex::encode(head),
            }))
        }

        "custody_listHeldBy" => {
            let party = party_or_caller(params, caller, method)?;
            render(service.list_held_by(&party))
        }

        "custody_listManufacturedBy" => {
            let party = party_or_caller(params, caller, method)?;
            render(service.list_manufactured_by(&party))
        }

        "custody_listIncoming" => {
            let party = party_or_caller(params, caller, method)?;
            render(service.list_incoming(&party))
        }

        "ping" => Ok(handler.handle_ping()),

        _ => Err(ApiQueryError::UnknownMethod(method.to_string())),
    }
}
