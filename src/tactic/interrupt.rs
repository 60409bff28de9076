//! Cooperative interruption and time-limited execution.
//!
//! Long-running tactics poll [`check_interrupted`] at safe points. A
//! cancelled token turns into [`Error::Interrupted`], which unwinds through
//! every combinator untouched until it reaches the scope that requested it.
//!
//! `try_for` is such a scope: the wrapped tactic runs on a worker thread
//! under a child token, and when the budget expires the child token is
//! cancelled, the worker is awaited, and the result is an ordinary failure.
//! Cancellation of the caller's own scope is never absorbed.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{ProofStateSeq, Tactic, TacticKind};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::io_state::IoState;
use crate::kernel::Environment;
use crate::proof_state::ProofState;

/// Interruption checkpoint: `Err(Interrupted)` once `token` is cancelled.
pub fn check_interrupted(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(Error::Interrupted)
    } else {
        Ok(())
    }
}

/// Run `body` with a wall-clock budget for its first result.
///
/// If `body` produces nothing within `budget` it is interrupted and the
/// combinator fails. Later results are computed on demand, outside the
/// budget.
pub fn try_for(body: &Tactic, budget: Duration) -> Tactic {
    Tactic::from_kind(TacticKind::TryFor(body.clone(), Some(budget)))
}

/// [`try_for`] with the budget read from the `tactic.try_for_ms` option at
/// application time.
pub fn try_for_default(body: &Tactic) -> Tactic {
    Tactic::from_kind(TacticKind::TryFor(body.clone(), None))
}

pub(crate) fn apply_try_for(
    body: &Tactic,
    budget: Option<Duration>,
    env: &Environment,
    io: &IoState,
    state: &ProofState,
) -> ProofStateSeq {
    let (body, env, io, state) = (body.clone(), env.clone(), io.clone(), state.clone());
    ProofStateSeq::lazy(move || {
        let config = EngineConfig::from_options(io.options());
        let budget = budget.unwrap_or_else(|| config.try_for_budget());
        match run_with_deadline(&body, budget, &config, &env, &io, &state) {
            Ok(seq) => seq,
            Err(e) => ProofStateSeq::error(e),
        }
    })
}

/// Pull the first element of `body`'s sequence on a worker, waiting at most
/// `budget` for it.
fn run_with_deadline(
    body: &Tactic,
    budget: Duration,
    config: &EngineConfig,
    env: &Environment,
    io: &IoState,
    state: &ProofState,
) -> Result<ProofStateSeq> {
    let worker_io = io.child_scope();
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| -> Result<ProofStateSeq> {
        let worker_io = &worker_io;
        let worker = config
            .worker_builder("try_for", 0)
            .spawn_scoped(scope, move || {
                let pulled = body.apply(env, worker_io, state).pull();
                // The receiver is gone only after a timeout.
                let _ = tx.send(pulled);
            })
            .map_err(Error::WorkerSpawn)?;

        let received = rx.recv_timeout(budget);
        if matches!(received, Err(RecvTimeoutError::Timeout)) {
            debug!(
                budget_ms = budget.as_millis() as u64,
                "try_for budget expired, interrupting worker"
            );
            worker_io.cancellation().cancel();
        }
        let joined = worker.join();

        match received {
            Ok(None) => Ok(ProofStateSeq::empty()),
            Ok(Some((Ok(first), rest))) => Ok(ProofStateSeq::prepend(Ok(first), rest)),
            Ok(Some((Err(e), _))) => Err(e),
            Err(RecvTimeoutError::Timeout) => {
                // Our deadline is a local failure; the caller's is not.
                io.check_interrupted()?;
                Ok(ProofStateSeq::empty())
            }
            Err(RecvTimeoutError::Disconnected) => match joined {
                Err(_) => Err(Error::WorkerPanicked),
                Ok(()) => Ok(ProofStateSeq::empty()),
            },
        }
    })
}
