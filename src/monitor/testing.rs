//! Scripted collaborators for driving the monitor without a network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::error::{MonitorError, MonitorResult};
use crate::ledger::{
    block_time_to_utc,
    LedgerClient,
    MintBalance,
    ParsedTransaction,
    ProgramAddress,
    SignatureRecord,
};
use crate::metadata::{MetadataResolver, TokenInfo};
use crate::monitor::{MonitorConfig, NoveltyPolicy};

pub const PROGRAM_A: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";
pub const PROGRAM_B: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";

pub fn fast_config(novelty: NoveltyPolicy) -> MonitorConfig {
    MonitorConfig {
        fetch_delay: Duration::ZERO,
        novelty,
        ..MonitorConfig::default()
    }
}

/// A transfer paying `paid` of `paid_mint` for `received` of `received_mint`.
pub fn swap(signature: &str, paid_mint: &str, paid: f64, received_mint: &str, received: f64) -> ParsedTransaction {
    ParsedTransaction {
        signature: signature.to_string(),
        block_time: block_time_to_utc(1_700_000_000).unwrap(),
        succeeded: true,
        pre_balances: vec![
            MintBalance::new(paid_mint, Some(paid)),
            MintBalance::new(received_mint, Some(0.0)),
        ],
        post_balances: vec![
            MintBalance::new(paid_mint, Some(0.0)),
            MintBalance::new(received_mint, Some(received)),
        ],
        top_level_program: Some(PROGRAM_A.to_string()),
    }
}

#[derive(Clone)]
pub enum Scripted {
    Ready(ParsedTransaction),
    Pending,
    Fail,
}

struct Gate {
    entered: Notify,
    release: Notify,
}

#[derive(Default)]
pub struct ScriptedLedger {
    signatures: Mutex<Vec<String>>,
    transactions: Mutex<HashMap<String, Scripted>>,
    list_failure: Mutex<bool>,
    list_calls: AtomicUsize,
    fetched: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Gate>>>,
}

impl ScriptedLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Signatures returned by the next listings, newest first.
    pub fn set_signatures(&self, signatures: &[&str]) {
        *self.signatures.lock().unwrap() = signatures.iter().map(|s| s.to_string()).collect();
    }

    pub fn script(&self, signature: &str, response: Scripted) {
        self.transactions
            .lock()
            .unwrap()
            .insert(signature.to_string(), response);
    }

    pub fn fail_listing(&self, fail: bool) {
        *self.list_failure.lock().unwrap() = fail;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Signatures fetched since the last call, in order.
    pub fn take_fetched(&self) -> Vec<String> {
        std::mem::take(&mut *self.fetched.lock().unwrap())
    }

    /// Makes listings block until `open_gate` is called.
    pub fn close_gate(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Gate {
            entered: Notify::new(),
            release: Notify::new(),
        }));
    }

    /// Resolves once a listing is parked on the gate.
    pub async fn wait_until_listing(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notified().await;
        }
    }

    pub fn open_gate(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.release.notify_one();
        }
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn list_recent_signatures(
        &self,
        _address: &ProgramAddress,
        limit: usize,
    ) -> MonitorResult<Vec<SignatureRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if *self.list_failure.lock().unwrap() {
            return Err(MonitorError::Transport("503 Service Unavailable".to_string()));
        }

        Ok(self
            .signatures
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .map(|signature| SignatureRecord {
                signature: signature.clone(),
                slot_time: None,
            })
            .collect())
    }

    async fn fetch_parsed_transaction(
        &self,
        signature: &str,
    ) -> MonitorResult<Option<ParsedTransaction>> {
        self.fetched.lock().unwrap().push(signature.to_string());

        let scripted = self.transactions.lock().unwrap().get(signature).cloned();
        match scripted {
            Some(Scripted::Ready(tx)) => Ok(Some(tx)),
            Some(Scripted::Pending) | None => Ok(None),
            Some(Scripted::Fail) => Err(MonitorError::Transport("connection reset".to_string())),
        }
    }
}

/// Resolves every mint to `<mint>-SYM` unless taken offline, and records
/// each lookup.
#[derive(Default)]
pub struct RecordingResolver {
    lookups: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl RecordingResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataResolver for RecordingResolver {
    async fn resolve(&self, mint: &str) -> Option<TokenInfo> {
        self.lookups.lock().unwrap().push(mint.to_string());
        if self.offline.load(Ordering::SeqCst) {
            return None;
        }
        Some(TokenInfo::new(mint, format!("{}-SYM", mint), format!("{} Token", mint)))
    }
}
