use std::collections::{HashMap, HashSet};

use super::types::TransactionRecord;
use crate::metadata::TokenInfo;

/// Signatures and mints seen while monitoring one address. Only grows;
/// a new address gets a fresh ledger.
#[derive(Clone, Debug, Default)]
pub struct DedupLedger {
    seen_signatures: HashSet<String>,
    seen_mints: HashMap<String, TokenInfo>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_signature(&self, signature: &str) -> bool {
        self.seen_signatures.contains(signature)
    }

    pub fn has_mint(&self, mint: &str) -> bool {
        self.seen_mints.contains_key(mint)
    }

    pub fn token_info(&self, mint: &str) -> Option<&TokenInfo> {
        self.seen_mints.get(mint)
    }

    pub fn signature_count(&self) -> usize {
        self.seen_signatures.len()
    }

    pub fn mint_count(&self) -> usize {
        self.seen_mints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen_signatures.is_empty() && self.seen_mints.is_empty()
    }

    /// Folds a finished cycle into the ledger. Entries already present are
    /// left untouched.
    pub fn absorb(&mut self, signatures: Vec<String>, mints: HashMap<String, TokenInfo>) {
        self.seen_signatures.extend(signatures);
        for (mint, info) in mints {
            self.seen_mints.entry(mint).or_insert(info);
        }
    }
}

/// Everything a cycle produced before it is committed to the session.
#[derive(Debug, Default)]
pub struct CycleDraft {
    signatures: Vec<String>,
    mints: HashMap<String, TokenInfo>,
    records: Vec<TransactionRecord>,
}

impl CycleDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_signature(&mut self, signature: impl Into<String>) {
        self.signatures.push(signature.into());
    }

    pub fn remember_mint(&mut self, info: TokenInfo) {
        self.mints.entry(info.mint.clone()).or_insert(info);
    }

    pub fn has_mint(&self, mint: &str) -> bool {
        self.mints.contains_key(mint)
    }

    pub fn token_info(&self, mint: &str) -> Option<&TokenInfo> {
        self.mints.get(mint)
    }

    pub fn push_record(&mut self, record: TransactionRecord) {
        self.records.push(record);
    }

    pub fn into_parts(self) -> (Vec<String>, HashMap<String, TokenInfo>, Vec<TransactionRecord>) {
        (self.signatures, self.mints, self.records)
    }
}
