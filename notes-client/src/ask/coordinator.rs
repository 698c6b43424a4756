//! QueryCoordinator: the two-phase ask cycle
//!
//! `Idle -> Rebuilding -> Querying -> {Answered | Failed}`, re-entering
//! `Rebuilding` on the next ask.
//!
//! Ask calls carry no correlation id by default. Overlapping asks all write to
//! the same session, and the cycle whose query resolves LAST wins, whichever
//! ask was issued most recently. Callers that need the newest question's
//! answer must serialize their asks (see [`QueryCoordinator::in_flight`]) or
//! opt into [`AskOrdering::DispatchOrder`].

use crate::error::RemoteResult;
use crate::remote::RemoteNotesService;
use notes_types::{QueryRequest, Reference};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AskPhase {
    #[default]
    Idle,
    Rebuilding,
    Querying,
    Answered,
    Failed,
}

/// How overlapping ask cycles are applied to the shared session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AskOrdering {
    /// Responses apply in arrival order; the last query to resolve wins
    #[default]
    ArrivalOrder,
    /// Only the most recently dispatched ask may write state; results of
    /// superseded cycles are returned to their caller but not stored
    DispatchOrder,
}

/// Outcome of the latest completed ask cycle
#[derive(Debug, Clone, PartialEq)]
pub struct AskSession {
    pub last_question: String,
    pub answer: String,
    pub references: Vec<Reference>,
}

#[derive(Debug, Default)]
struct CoordinatorState {
    phase: AskPhase,
    session: Option<AskSession>,
    last_ticket: u64,
}

/// Decrements the in-flight counter however the cycle ends
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct QueryCoordinator {
    remote: Arc<dyn RemoteNotesService>,
    top_k: Option<u32>,
    ordering: AskOrdering,
    state: Mutex<CoordinatorState>,
    in_flight: AtomicUsize,
}

impl QueryCoordinator {
    pub fn new(remote: Arc<dyn RemoteNotesService>, ordering: AskOrdering) -> Self {
        Self {
            remote,
            top_k: None,
            ordering,
            state: Mutex::new(CoordinatorState::default()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Request `k` references per query instead of the backend default
    pub fn with_top_k(mut self, k: Option<u32>) -> Self {
        self.top_k = k;
        self
    }

    /// Rebuild the index, then query it with `question`.
    ///
    /// The query is only sent once the rebuild has been acknowledged. On
    /// failure at either step the phase becomes `Failed` and the previous
    /// session is kept as-is; nothing is retried.
    pub async fn ask(&self, question: &str) -> RemoteResult<AskSession> {
        let _in_flight = InFlight::enter(&self.in_flight);
        let ticket = {
            let mut state = self.state.lock();
            state.last_ticket += 1;
            state.phase = AskPhase::Rebuilding;
            state.last_ticket
        };
        log::debug!("[ASK] #{} rebuilding index for {:?}", ticket, question);

        if let Err(e) = self.remote.rebuild_index().await {
            log::warn!("[ASK] #{} index rebuild failed: {}", ticket, e);
            self.apply(ticket, |state| state.phase = AskPhase::Failed);
            return Err(e);
        }

        self.apply(ticket, |state| state.phase = AskPhase::Querying);

        let req = QueryRequest {
            question: question.to_string(),
            k: self.top_k,
        };
        let resp = match self.remote.query(&req).await {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("[ASK] #{} query failed: {}", ticket, e);
                self.apply(ticket, |state| state.phase = AskPhase::Failed);
                return Err(e);
            }
        };

        let session = AskSession {
            last_question: question.to_string(),
            answer: resp.answer,
            references: resp.references,
        };

        let stored = self.apply(ticket, |state| {
            state.phase = AskPhase::Answered;
            state.session = Some(session.clone());
        });
        if stored {
            log::info!("[ASK] #{} answered with {} references", ticket, session.references.len());
        } else {
            log::debug!("[ASK] #{} superseded by a later ask, answer not stored", ticket);
        }

        Ok(session)
    }

    /// Apply a state change for cycle `ticket` if the ordering rule allows it
    fn apply<F: FnOnce(&mut CoordinatorState)>(&self, ticket: u64, change: F) -> bool {
        let mut state = self.state.lock();
        let allowed = match self.ordering {
            AskOrdering::ArrivalOrder => true,
            AskOrdering::DispatchOrder => ticket == state.last_ticket,
        };
        if allowed {
            change(&mut *state);
        }
        allowed
    }

    /// Return a finished cycle (`Answered` or `Failed`) to `Idle`
    pub fn dismiss(&self) {
        let mut state = self.state.lock();
        if matches!(state.phase, AskPhase::Answered | AskPhase::Failed) {
            state.phase = AskPhase::Idle;
        }
    }

    pub fn phase(&self) -> AskPhase {
        self.state.lock().phase
    }

    pub fn session(&self) -> Option<AskSession> {
        self.state.lock().session.clone()
    }

    /// Number of ask cycles currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn ordering(&self) -> AskOrdering {
        self.ordering
    }
}
