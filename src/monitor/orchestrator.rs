use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::classifier::DiffClassifier;
use super::config::MonitorConfig;
use super::session::{CycleDraft, DedupLedger};
use super::types::{CycleOutcome, FeedUpdate, PollPhase, TransactionRecord};
use crate::error::{MonitorError, MonitorResult};
use crate::ledger::{LedgerClient, ProgramAddress};
use crate::metadata::MetadataResolver;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// State owned by one monitored address.
struct Session {
    address: ProgramAddress,
    epoch: u64,
    phase: PollPhase,
    dedup: Arc<DedupLedger>,
    feed: VecDeque<TransactionRecord>,
}

impl Session {
    fn new(address: ProgramAddress, epoch: u64) -> Self {
        Self {
            address,
            epoch,
            phase: PollPhase::Idle,
            dedup: Arc::new(DedupLedger::new()),
            feed: VecDeque::new(),
        }
    }
}

/// What a cycle captured from its session when it started.
struct CycleTicket {
    epoch: u64,
    address: ProgramAddress,
    dedup: Arc<DedupLedger>,
}

fn lock(session: &Mutex<Option<Session>>) -> MutexGuard<'_, Option<Session>> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Puts the session back to `Idle` however the cycle ends, including when
/// its future is dropped.
struct CycleGuard<'a> {
    session: &'a Mutex<Option<Session>>,
    epoch: u64,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if let Some(session) = lock(self.session).as_mut() {
            if session.epoch == self.epoch {
                session.phase = PollPhase::Idle;
            }
        }
    }
}

struct MonitorInner<L, M> {
    ledger: L,
    resolver: M,
    classifier: DiffClassifier,
    config: MonitorConfig,
    session: Mutex<Option<Session>>,
    next_epoch: AtomicU64,
    updates: broadcast::Sender<FeedUpdate>,
}

impl<L, M> MonitorInner<L, M>
where
    L: LedgerClient,
    M: MetadataResolver,
{
    fn is_current(&self, epoch: u64) -> bool {
        lock(&self.session)
            .as_ref()
            .map_or(false, |session| session.epoch == epoch)
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = MonitorResult<T>>,
    ) -> MonitorResult<T> {
        let limit = self.config.fetch_timeout;
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| MonitorError::Timeout(limit))?
    }

    fn begin_cycle(&self) -> Result<CycleTicket, CycleOutcome> {
        let mut guard = lock(&self.session);
        let Some(session) = guard.as_mut() else {
            return Err(CycleOutcome::Inactive);
        };

        if session.phase == PollPhase::Polling {
            debug!("Cycle for {} already running, skipping", session.address);
            return Err(CycleOutcome::Busy);
        }
        session.phase = PollPhase::Polling;

        Ok(CycleTicket {
            epoch: session.epoch,
            address: session.address.clone(),
            dedup: Arc::clone(&session.dedup),
        })
    }

    async fn run_cycle(&self) -> CycleOutcome {
        let ticket = match self.begin_cycle() {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };
        let _guard = CycleGuard {
            session: &self.session,
            epoch: ticket.epoch,
        };

        match self.poll(&ticket).await {
            Ok(draft) => self.commit(ticket, draft),
            Err(e) => {
                error!("Error in poll cycle for {}: {}", ticket.address, e);
                CycleOutcome::Failed
            }
        }
    }

    async fn poll(&self, ticket: &CycleTicket) -> MonitorResult<CycleDraft> {
        let signatures = self
            .with_timeout(
                self.ledger
                    .list_recent_signatures(&ticket.address, self.config.signature_limit),
            )
            .await?;

        let fresh: Vec<String> = signatures
            .into_iter()
            .map(|record| record.signature)
            .filter(|signature| !ticket.dedup.has_signature(signature))
            .collect();

        let mut draft = CycleDraft::new();
        if fresh.is_empty() {
            debug!("No new signatures for {}", ticket.address);
            return Ok(draft);
        }
        info!("Processing {} new signatures for {}", fresh.len(), ticket.address);

        for signature in fresh {
            if !self.is_current(ticket.epoch) {
                info!("Monitoring moved away from {}, abandoning cycle", ticket.address);
                break;
            }

            // Self-imposed rate limit against the RPC provider.
            tokio::time::sleep(self.config.fetch_delay).await;

            match self.process_signature(&signature, &ticket.dedup, &mut draft).await {
                Ok(()) => draft.mark_signature(signature),
                Err(MonitorError::NotYetConfirmed(_)) => {
                    debug!("{} not confirmed yet, retrying next cycle", signature)
                }
                Err(e) if e.is_retryable() => {
                    warn!("Error processing transaction {}: {}", signature, e)
                }
                Err(e) => error!("Error processing transaction {}: {}", signature, e),
            }
        }

        Ok(draft)
    }

    async fn process_signature(
        &self,
        signature: &str,
        known: &DedupLedger,
        draft: &mut CycleDraft,
    ) -> MonitorResult<()> {
        let tx = self
            .with_timeout(self.ledger.fetch_parsed_transaction(signature))
            .await?
            .ok_or_else(|| MonitorError::NotYetConfirmed(signature.to_string()))?;

        if let Some(record) = self
            .classifier
            .classify(&tx, known, draft, &self.resolver)
            .await?
        {
            draft.push_record(record);
        }

        Ok(())
    }

    fn commit(&self, ticket: CycleTicket, draft: CycleDraft) -> CycleOutcome {
        let CycleTicket {
            epoch,
            address,
            dedup,
        } = ticket;
        // Release the snapshot so the session's ledger can be extended in place.
        drop(dedup);

        let (signatures, mints, records) = draft.into_parts();

        let mut guard = lock(&self.session);
        let session = match guard.as_mut() {
            Some(session) if session.epoch == epoch => session,
            _ => {
                info!("Discarding results of stale cycle for {}", address);
                return CycleOutcome::Discarded;
            }
        };

        Arc::make_mut(&mut session.dedup).absorb(signatures, mints);

        let emitted = records.len();
        if emitted > 0 {
            for record in records.iter().rev() {
                session.feed.push_front(record.clone());
            }
            session.feed.truncate(self.config.feed_capacity);

            info!("Emitting {} new transactions for {}", emitted, address);
            // No subscribers is fine; the feed still holds the records.
            let _ = self.updates.send(FeedUpdate { address, records });
        }

        CycleOutcome::Completed { emitted }
    }
}

/// Polls one program address at a time and keeps the resulting swap feed.
pub struct TransactionMonitor<L, M> {
    inner: Arc<MonitorInner<L, M>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl<L, M> TransactionMonitor<L, M>
where
    L: LedgerClient + 'static,
    M: MetadataResolver + 'static,
{
    pub fn new(ledger: L, resolver: M, config: MonitorConfig) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(MonitorInner {
                ledger,
                resolver,
                classifier: DiffClassifier::new(config.novelty),
                config,
                session: Mutex::new(None),
                next_epoch: AtomicU64::new(0),
                updates,
            }),
            poller: Mutex::new(None),
        }
    }

    /// Switches to `address` with a fresh ledger and an empty feed, without
    /// scheduling any cycle. An invalid address leaves the current session
    /// untouched.
    pub fn set_address(&self, address: &str) -> MonitorResult<ProgramAddress> {
        let address = ProgramAddress::parse(address)?;
        self.cancel_poller();

        let epoch = self.inner.next_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        *lock(&self.inner.session) = Some(Session::new(address.clone(), epoch));

        info!("Monitoring {} (session {})", address, epoch);
        Ok(address)
    }

    /// Switches to `address`, runs a cycle right away and then one every
    /// poll interval until stopped or switched again.
    pub fn start(&self, address: &str) -> MonitorResult<ProgramAddress> {
        let address = self.set_address(address)?;
        self.spawn_poller();
        Ok(address)
    }

    pub fn stop(&self) {
        self.cancel_poller();
        if let Some(session) = lock(&self.inner.session).take() {
            info!("Stopped monitoring {}", session.address);
        }
    }

    /// Manual refresh. Refused while a cycle of the same session is running.
    pub async fn refresh(&self) -> CycleOutcome {
        self.inner.run_cycle().await
    }

    /// Current feed, most recent first.
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        lock(&self.inner.session)
            .as_ref()
            .map(|session| session.feed.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.inner.session)
            .as_ref()
            .map_or(false, |session| session.phase == PollPhase::Polling)
    }

    pub fn address(&self) -> Option<ProgramAddress> {
        lock(&self.inner.session)
            .as_ref()
            .map(|session| session.address.clone())
    }

    /// Committed dedup state of the current session.
    pub fn dedup(&self) -> Option<Arc<DedupLedger>> {
        lock(&self.inner.session)
            .as_ref()
            .map(|session| Arc::clone(&session.dedup))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedUpdate> {
        self.inner.updates.subscribe()
    }

    fn spawn_poller(&self) {
        let inner = Arc::clone(&self.inner);
        let period = inner.config.poll_interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // First tick completes immediately.
                ticker.tick().await;
                match inner.run_cycle().await {
                    CycleOutcome::Inactive => break,
                    outcome => debug!("Scheduled cycle finished: {:?}", outcome),
                }
            }
        });

        *self.poller.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn cancel_poller(&self) {
        if let Some(handle) = self.poller.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
        }
    }
}

impl<L, M> Drop for TransactionMonitor<L, M> {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
        }
    }
}
