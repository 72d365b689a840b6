//! # Node Runtime
//!
//! Wires the file-backed ledger to the JSON gateway and serves a stream of
//! JSON-lines envelopes.
//!
//! ## Wire Format
//!
//! Each input line is an `AuthenticatedCall<ApiRequest>`:
//!
//! ```text
//! {"caller":"acme","payload":{"method":"custody_register","params":{...}}}
//! ```
//!
//! Each output line is the matching `ApiResponse`. Blank lines are skipped.
//! A line that is not a valid envelope gets an `InvalidRequest` error with a
//! nil correlation id.

use crate::config::{ClockKind, NodeConfig};
use anyhow::{Context, Result};
use custody_ledger::{
    ApiGatewayHandler, ApiRequest, ApiResponse, BincodeRecordSerializer, CustodyDependencies,
    CustodyService, FileBackedKVStore, KvCustodyStore, LedgerErrorKind, LogicalClock,
    SystemTimeSource, TimeSource,
};
use custody_ledger::adapters::api_handler::ApiErrorBody;
use shared_types::AuthenticatedCall;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Ledger service as deployed by the node.
pub type NodeService = CustodyService<
    KvCustodyStore<FileBackedKVStore, BincodeRecordSerializer>,
    Box<dyn TimeSource>,
>;

/// A running custody node.
pub struct NodeRuntime {
    handler: ApiGatewayHandler<Arc<NodeService>>,
    max_conflict_retries: u32,
}

impl NodeRuntime {
    /// Open the ledger file named by `config` and build the service.
    ///
    /// A missing file starts an empty ledger. Stored chains are verified
    /// when `config.ledger.verify_chain_on_load` is set.
    pub fn open(config: &NodeConfig) -> Result<Self> {
        let kv = FileBackedKVStore::open(&config.data_file).with_context(|| {
            format!("opening ledger file {}", config.data_file.display())
        })?;
        let store = KvCustodyStore::open(kv, BincodeRecordSerializer, &config.ledger)
            .context("loading custody history")?;

        let time_source: Box<dyn TimeSource> = match config.clock {
            ClockKind::Logical => match store.last_timestamp() {
                Some(last) => Box::new(LogicalClock::starting_after(last)),
                None => Box::new(LogicalClock::new()),
            },
            ClockKind::System => Box::new(SystemTimeSource),
        };

        info!(
            path = %config.data_file.display(),
            items = store.item_count(),
            clock = ?config.clock,
            "[custody] Ledger opened"
        );

        let service = CustodyService::new(
            CustodyDependencies { store, time_source },
            config.ledger.clone(),
        );

        Ok(Self {
            handler: ApiGatewayHandler::new(Arc::new(service)),
            max_conflict_retries: config.max_conflict_retries,
        })
    }

    /// Shared handle to the service, e.g. for in-process callers.
    pub fn service(&self) -> Arc<NodeService> {
        Arc::clone(self.handler.service())
    }

    /// Run one call, re-running it while it loses append races.
    ///
    /// Each attempt re-reads the tail, so a retried transition is rebuilt
    /// against the state that beat it.
    pub fn dispatch(&self, call: &AuthenticatedCall<ApiRequest>) -> ApiResponse {
        let mut attempt = 0;
        loop {
            let response = self.handler.handle_call(call);
            if !is_conflict(&response) || attempt >= self.max_conflict_retries {
                if attempt > 0 {
                    debug!(
                        method = %call.payload.method,
                        attempts = attempt + 1,
                        conflicted = is_conflict(&response),
                        "[custody] Conflict retries finished"
                    );
                }
                return response;
            }
            attempt += 1;
        }
    }

    /// Answer one input line. `None` for blank lines.
    pub fn answer_line(&self, line: &str) -> Option<ApiResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_str::<AuthenticatedCall<ApiRequest>>(line) {
            Ok(call) => Some(self.dispatch(&call)),
            Err(e) => {
                warn!("[custody] Unreadable request line: {}", e);
                Some(ApiResponse {
                    id: Uuid::nil(),
                    result: None,
                    error: Some(ApiErrorBody {
                        kind: "InvalidRequest".to_string(),
                        message: e.to_string(),
                    }),
                })
            }
        }
    }

    /// Serve JSON lines from `reader` until end of input.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut served = 0u64;

        while let Some(line) = lines.next_line().await.context("reading request")? {
            let Some(response) = self.answer_line(&line) else {
                continue;
            };
            let mut rendered = serde_json::to_vec(&response).context("encoding response")?;
            rendered.push(b'\n');
            writer.write_all(&rendered).await.context("writing response")?;
            writer.flush().await.context("flushing response")?;
            served += 1;
        }

        info!(served, "[custody] Input closed");
        Ok(())
    }
}

fn is_conflict(response: &ApiResponse) -> bool {
    response
        .error
        .as_ref()
        .is_some_and(|e| e.kind == LedgerErrorKind::SequenceConflict.as_str())
}
