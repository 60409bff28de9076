//! OR-parallel racing of alternative tactics.
//!
//! `par` starts every branch on its own worker thread against the same input
//! state. The first branch to produce a state wins; every other branch is
//! interrupted and awaited before the combinator returns, and the result is
//! the winner's sequence. Branches that fail simply drop out of the race.
//!
//! Branches share the caller's diagnostic sink through a gate: until a
//! winner is decided all writes go through, afterwards only the winner's do.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{ProofStateSeq, Tactic, TacticKind};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::io_state::{DiagnosticSink, IoState};
use crate::kernel::Environment;
use crate::proof_state::ProofState;

/// Race `first` against `second`.
pub fn par(first: &Tactic, second: &Tactic) -> Tactic {
    par_all(vec![first.clone(), second.clone()])
}

/// Race any number of branches. With no branches it always fails.
pub fn par_all(branches: Vec<Tactic>) -> Tactic {
    Tactic::from_kind(TacticKind::Par(branches))
}

/// Diagnostic sink of one `par` branch.
struct GatedSink {
    parent: Arc<dyn DiagnosticSink>,
    winner: Arc<Mutex<Option<usize>>>,
    branch: usize,
}

impl GatedSink {
    fn is_open(&self, winner: Option<usize>) -> bool {
        winner.map_or(true, |w| w == self.branch)
    }
}

impl DiagnosticSink for GatedSink {
    fn write_str(&self, text: &str) {
        // Hold the gate while writing so a decision cannot land mid-write.
        let winner = self.winner.lock();
        if self.is_open(*winner) {
            self.parent.write_str(text);
        }
    }

    fn flush(&self) {
        let winner = self.winner.lock();
        if self.is_open(*winner) {
            self.parent.flush();
        }
    }
}

pub(crate) fn apply_par(
    branches: &[Tactic],
    env: &Environment,
    io: &IoState,
    state: &ProofState,
) -> ProofStateSeq {
    let branches = branches.to_vec();
    let (env, io, state) = (env.clone(), io.clone(), state.clone());
    ProofStateSeq::lazy(move || match race(&branches, &env, &io, &state) {
        Ok(seq) => seq,
        Err(e) => ProofStateSeq::error(e),
    })
}

type Pulled = Option<(Result<ProofState>, ProofStateSeq)>;

fn race(
    branches: &[Tactic],
    env: &Environment,
    io: &IoState,
    state: &ProofState,
) -> Result<ProofStateSeq> {
    if branches.is_empty() {
        return Ok(ProofStateSeq::empty());
    }
    let config = EngineConfig::from_options(io.options());
    let winner = Arc::new(Mutex::new(None));
    let branch_ios: Vec<IoState> = (0..branches.len())
        .map(|branch| {
            let sink = GatedSink {
                parent: io.sink(),
                winner: Arc::clone(&winner),
                branch,
            };
            io.child_scope().with_sink(Arc::new(sink))
        })
        .collect();
    let tokens: Vec<CancellationToken> =
        branch_ios.iter().map(|b| b.cancellation().clone()).collect();
    let cancel_all_but = |keep: Option<usize>| {
        for (index, token) in tokens.iter().enumerate() {
            if Some(index) != keep {
                token.cancel();
            }
        }
    };

    let (tx, rx) = mpsc::channel::<(usize, Pulled)>();

    thread::scope(|scope| -> Result<ProofStateSeq> {
        let mut workers = Vec::with_capacity(branches.len());
        let mut spawn_error = None;
        for (index, (branch, branch_io)) in branches.iter().zip(&branch_ios).enumerate() {
            let tx = tx.clone();
            let spawned = config.worker_builder("par", index).spawn_scoped(scope, move || {
                let pulled = branch.apply(env, branch_io, state).pull();
                let _ = tx.send((index, pulled));
            });
            match spawned {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    cancel_all_but(None);
                    spawn_error = Some(e);
                    break;
                }
            }
        }
        drop(tx);

        // Drains until every spawned branch has reported.
        let mut outcome: Option<Result<ProofStateSeq>> = None;
        for (index, pulled) in rx {
            match pulled {
                None => trace!(branch = index, "par branch failed"),
                Some((Ok(first), rest)) if outcome.is_none() => {
                    *winner.lock() = Some(index);
                    cancel_all_but(Some(index));
                    debug!(branch = index, "par branch won");
                    outcome = Some(Ok(ProofStateSeq::prepend(Ok(first), rest)));
                }
                // A loser that finished before it observed the cancellation.
                Some((Ok(_), _)) => {}
                Some((Err(e), _)) if e.is_interrupted() && tokens[index].is_cancelled() => {
                    trace!(branch = index, "par branch interrupted");
                }
                Some((Err(e), _)) if outcome.is_none() => {
                    debug!(branch = index, error = %e, "par branch aborted");
                    cancel_all_but(None);
                    outcome = Some(Err(e));
                }
                Some((Err(_), _)) => {}
            }
        }

        let panicked = workers
            .into_iter()
            .map(|worker| worker.join())
            .filter(|joined| joined.is_err())
            .count();

        if let Some(outcome) = outcome {
            return outcome;
        }
        if let Some(e) = spawn_error {
            return Err(Error::WorkerSpawn(e));
        }
        if panicked > 0 {
            return Err(Error::WorkerPanicked);
        }
        io.check_interrupted()?;
        debug!(branches = branches.len(), "all par branches failed");
        Ok(ProofStateSeq::empty())
    })
}
