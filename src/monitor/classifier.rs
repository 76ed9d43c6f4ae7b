use log::debug;
use std::collections::HashSet;

use super::config::NoveltyPolicy;
use super::session::{CycleDraft, DedupLedger};
use super::types::{TokenLeg, TransactionRecord, UNKNOWN_PROGRAM};
use crate::dex::DexProtocol;
use crate::error::{MonitorError, MonitorResult};
use crate::ledger::{MintBalance, ParsedTransaction, TxStatus};
use crate::metadata::MetadataResolver;

/// Balance change of one mint across a transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct MintDelta {
    pub mint: String,
    pub pre_amount: f64,
    pub post_amount: f64,
}

impl MintDelta {
    pub fn delta(&self) -> f64 {
        self.post_amount - self.pre_amount
    }
}

fn first_amount(balances: &[MintBalance], mint: &str) -> f64 {
    balances
        .iter()
        .find(|b| b.mint == mint)
        .and_then(|b| b.ui_amount)
        .unwrap_or(0.0)
}

/// Per-mint deltas in first-appearance order, pre balances first.
pub fn balance_deltas(tx: &ParsedTransaction) -> Vec<MintDelta> {
    let mut seen = HashSet::new();

    tx.pre_balances
        .iter()
        .chain(tx.post_balances.iter())
        .filter(|b| !b.mint.is_empty())
        .filter(|b| seen.insert(b.mint.as_str()))
        .map(|b| MintDelta {
            mint: b.mint.clone(),
            pre_amount: first_amount(&tx.pre_balances, &b.mint),
            post_amount: first_amount(&tx.post_balances, &b.mint),
        })
        .collect()
}

/// Turns balance snapshots into a single paid/received pair.
#[derive(Clone, Debug, Default)]
pub struct DiffClassifier {
    policy: NoveltyPolicy,
}

impl DiffClassifier {
    pub fn new(policy: NoveltyPolicy) -> Self {
        Self { policy }
    }

    /// Classifies `tx` against the committed ledger plus whatever the current
    /// cycle already learned. Newly resolved mints are recorded in `draft`.
    ///
    /// `Ok(None)` means there is nothing to report. When token balances moved
    /// but no mint could be resolved, `MetadataUnavailable` is returned so the
    /// signature is tried again later.
    pub async fn classify<R>(
        &self,
        tx: &ParsedTransaction,
        known: &DedupLedger,
        draft: &mut CycleDraft,
        resolver: &R,
    ) -> MonitorResult<Option<TransactionRecord>>
    where
        R: MetadataResolver + ?Sized,
    {
        let mut deltas = balance_deltas(tx);
        if self.policy == NoveltyPolicy::PerMint {
            deltas.retain(|d| !known.has_mint(&d.mint) && !draft.has_mint(&d.mint));
        }

        if deltas.is_empty() {
            debug!("No new token balances in {}, skipping", tx.signature);
            return Ok(None);
        }

        let mut legs = Vec::with_capacity(deltas.len());
        for delta in &deltas {
            let cached = known
                .token_info(&delta.mint)
                .or_else(|| draft.token_info(&delta.mint))
                .cloned();

            let info = match cached {
                Some(info) => info,
                None => match resolver.resolve(&delta.mint).await {
                    Some(info) => {
                        draft.remember_mint(info.clone());
                        info
                    }
                    None => {
                        debug!("Dropping leg for {} in {}: no metadata", delta.mint, tx.signature);
                        continue;
                    }
                },
            };

            legs.push(TokenLeg::from_delta(&info, delta.delta()));
        }

        if legs.is_empty() {
            let mints: Vec<&str> = deltas.iter().map(|d| d.mint.as_str()).collect();
            return Err(MonitorError::MetadataUnavailable(mints.join(", ")));
        }

        let (input_leg, output_leg, discarded) = select_pair(legs);
        if discarded > 0 {
            debug!("Discarded {} extra legs in {}", discarded, tx.signature);
        }

        let program_name = tx
            .top_level_program
            .clone()
            .unwrap_or_else(|| UNKNOWN_PROGRAM.to_string());

        Ok(Some(TransactionRecord {
            signature: tx.signature.clone(),
            timestamp: tx.block_time,
            status: if tx.succeeded { TxStatus::Success } else { TxStatus::Failed },
            input_leg,
            output_leg,
            protocol: DexProtocol::identify(&program_name),
            program_name,
        }))
    }
}

/// First leg of each polarity wins; the count of dropped legs is returned too.
fn select_pair(legs: Vec<TokenLeg>) -> (Option<TokenLeg>, Option<TokenLeg>, usize) {
    let mut input = None;
    let mut output = None;
    let mut discarded = 0;

    for leg in legs {
        let slot = if leg.is_input { &mut input } else { &mut output };
        if slot.is_none() {
            *slot = Some(leg);
        } else {
            discarded += 1;
        }
    }

    (input, output, discarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::block_time_to_utc;
    use crate::metadata::{MockMetadataResolver, TokenInfo};

    const JUPITER: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";

    fn info(mint: &str) -> TokenInfo {
        TokenInfo::new(mint, format!("{}-SYM", mint), format!("{} Token", mint))
    }

    fn resolving_everything() -> MockMetadataResolver {
        let mut resolver = MockMetadataResolver::new();
        resolver.expect_resolve().returning(|mint| Some(info(mint)));
        resolver
    }

    fn tx(pre: Vec<(&str, Option<f64>)>, post: Vec<(&str, Option<f64>)>) -> ParsedTransaction {
        ParsedTransaction {
            signature: "sig".to_string(),
            block_time: block_time_to_utc(1_700_000_000).unwrap(),
            succeeded: true,
            pre_balances: pre.into_iter().map(|(m, a)| MintBalance::new(m, a)).collect(),
            post_balances: post.into_iter().map(|(m, a)| MintBalance::new(m, a)).collect(),
            top_level_program: Some(JUPITER.to_string()),
        }
    }

    #[test]
    fn deltas_follow_first_appearance_and_default_to_zero() {
        let tx = tx(
            vec![("A", Some(5.0)), ("", Some(1.0)), ("B", None)],
            vec![("C", Some(7.0)), ("A", Some(2.0)), ("B", Some(4.0))],
        );

        let deltas = balance_deltas(&tx);
        let mints: Vec<_> = deltas.iter().map(|d| d.mint.as_str()).collect();
        assert_eq!(mints, vec!["A", "B", "C"]);
        assert_eq!(deltas[0].delta(), -3.0);
        assert_eq!(deltas[1].delta(), 4.0);
        assert_eq!(deltas[2].pre_amount, 0.0);
        assert_eq!(deltas[2].delta(), 7.0);
    }

    #[test]
    fn deltas_use_first_matching_balance() {
        let tx = tx(vec![("A", Some(5.0)), ("A", Some(100.0))], vec![("A", Some(6.0))]);
        assert_eq!(balance_deltas(&tx)[0].delta(), 1.0);
    }

    #[tokio::test]
    async fn decrease_is_input_and_increase_is_output() {
        let classifier = DiffClassifier::default();
        let tx = tx(vec![("M", Some(5.0))], vec![("M", Some(2.0)), ("N", Some(7.0))]);

        let record = classifier
            .classify(&tx, &DedupLedger::new(), &mut CycleDraft::new(), &resolving_everything())
            .await
            .unwrap()
            .unwrap();

        let input = record.input_leg.unwrap();
        assert_eq!((input.mint.as_str(), input.amount, input.is_input), ("M", 3.0, true));
        let output = record.output_leg.unwrap();
        assert_eq!((output.mint.as_str(), output.amount, output.is_input), ("N", 7.0, false));
        assert_eq!(record.status, TxStatus::Success);
        assert_eq!(record.timestamp, tx.block_time);
        assert_eq!(record.program_name, JUPITER);
        assert_eq!(record.protocol, Some(DexProtocol::Jupiter));
    }

    #[tokio::test]
    async fn keeps_only_first_leg_of_each_polarity() {
        let classifier = DiffClassifier::default();
        let tx = tx(
            vec![("X", Some(5.0)), ("Y", Some(2.0))],
            vec![("X", Some(0.0)), ("Y", Some(0.0)), ("Z", Some(10.0))],
        );

        let record = classifier
            .classify(&tx, &DedupLedger::new(), &mut CycleDraft::new(), &resolving_everything())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.input_leg.unwrap().mint, "X");
        let output = record.output_leg.unwrap();
        assert_eq!((output.mint.as_str(), output.amount), ("Z", 10.0));
    }

    #[tokio::test]
    async fn one_sided_transfers_still_emit() {
        let classifier = DiffClassifier::default();
        let paid_only = tx(vec![("A", Some(4.0))], vec![("A", Some(1.0))]);

        let record = classifier
            .classify(&paid_only, &DedupLedger::new(), &mut CycleDraft::new(), &resolving_everything())
            .await
            .unwrap()
            .unwrap();
        assert!(record.input_leg.is_some());
        assert!(record.output_leg.is_none());
    }

    #[tokio::test]
    async fn missing_metadata_drops_only_that_leg() {
        let mut resolver = MockMetadataResolver::new();
        resolver
            .expect_resolve()
            .times(2)
            .returning(|mint| if mint == "A" { None } else { Some(info(mint)) });

        let classifier = DiffClassifier::default();
        let tx = tx(vec![("A", Some(4.0)), ("B", Some(0.0))], vec![("B", Some(9.0))]);
        let mut draft = CycleDraft::new();

        let record = classifier
            .classify(&tx, &DedupLedger::new(), &mut draft, &resolver)
            .await
            .unwrap()
            .unwrap();

        assert!(record.input_leg.is_none());
        assert_eq!(record.output_leg.unwrap().mint, "B");
        assert!(!draft.has_mint("A"));
        assert!(draft.has_mint("B"));
    }

    #[tokio::test]
    async fn unresolvable_transfer_is_metadata_unavailable() {
        let mut resolver = MockMetadataResolver::new();
        resolver.expect_resolve().times(2).returning(|_| None);

        let tx = tx(vec![("A", Some(4.0))], vec![("A", Some(1.0)), ("B", Some(2.0))]);
        let mut draft = CycleDraft::new();
        let err = DiffClassifier::default()
            .classify(&tx, &DedupLedger::new(), &mut draft, &resolver)
            .await
            .unwrap_err();

        assert!(matches!(&err, MonitorError::MetadataUnavailable(mints) if mints == "A, B"));
        assert!(err.is_retryable());
        assert!(!draft.has_mint("A"));
    }

    #[tokio::test]
    async fn no_token_balances_is_not_an_error() {
        let mut resolver = MockMetadataResolver::new();
        resolver.expect_resolve().never();

        let record = DiffClassifier::default()
            .classify(&tx(vec![], vec![]), &DedupLedger::new(), &mut CycleDraft::new(), &resolver)
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn failed_execution_and_unknown_program() {
        let mut tx = tx(vec![], vec![("A", Some(1.0))]);
        tx.succeeded = false;
        tx.top_level_program = None;

        let record = DiffClassifier::default()
            .classify(&tx, &DedupLedger::new(), &mut CycleDraft::new(), &resolving_everything())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.status, TxStatus::Failed);
        assert_eq!(record.program_name, UNKNOWN_PROGRAM);
        assert_eq!(record.protocol, None);
    }

    #[tokio::test]
    async fn known_mints_skip_resolution() {
        let mut known = DedupLedger::new();
        let mut seed = CycleDraft::new();
        seed.remember_mint(info("A"));
        let (signatures, mints, _) = seed.into_parts();
        known.absorb(signatures, mints);

        let mut resolver = MockMetadataResolver::new();
        resolver.expect_resolve().never();

        let tx = tx(vec![("A", Some(4.0))], vec![("A", Some(9.0))]);
        let record = DiffClassifier::new(NoveltyPolicy::PerSignature)
            .classify(&tx, &known, &mut CycleDraft::new(), &resolver)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.output_leg.unwrap().symbol, "A-SYM");
    }

    #[tokio::test]
    async fn per_mint_policy_skips_seen_mints() {
        let mut draft = CycleDraft::new();
        draft.remember_mint(info("A"));

        let mut resolver = MockMetadataResolver::new();
        resolver.expect_resolve().never();

        let tx = tx(vec![("A", Some(4.0))], vec![("A", Some(9.0))]);
        let record = DiffClassifier::new(NoveltyPolicy::PerMint)
            .classify(&tx, &DedupLedger::new(), &mut draft, &resolver)
            .await
            .unwrap();

        assert!(record.is_none());
    }
}
