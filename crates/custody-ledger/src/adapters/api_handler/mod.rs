//! # API Gateway Handler for the Custody Ledger
//!
//! JSON method dispatch over `CustodyLedgerApi`, for hosts that speak JSON
//! (the `custody-node` stdin loop, an HTTP gateway, tests).
//!
//! ## Supported Methods
//!
//! | Method | Params | Caller |
//! |--------|--------|--------|
//! | `custody_register` | RegisterItem fields | required (manufacturer) |
//! | `custody_confirmReceipt` | `itemId` | required |
//! | `custody_transferToNext` | `itemId`, TransferToNext fields | required |
//! | `custody_getItem` | `itemId` | - |
//! | `custody_getTail` | `itemId` | - |
//! | `custody_getHistory` | `itemId` | - |
//! | `custody_verifyHistory` | `itemId` | - |
//! | `custody_listHeldBy` | `party` (defaults to caller) | - |
//! | `custody_listManufacturedBy` | `party` (defaults to caller) | - |
//! | `custody_listIncoming` | `party` (defaults to caller) | - |
//! | `ping` | - | - |
//!
//! Failures are rendered as `{"error": {"kind": ..., "message": ...}}`.

mod handler;
mod types;


pub use handler::{handle_api_query, ApiGatewayHandler, ApiQueryError};
pub use types::{ApiErrorBody, ApiRequest, ApiResponse, ItemParams, PartyParams, TransferParams};
