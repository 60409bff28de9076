//! Solve driver.
//!
//! Drains a tactic's result sequence until the first closed proof state and
//! assembles its proof term. Exhausting the sequence is reported as
//! [`Error::Failed`]; aborts (interruption, kernel errors) are returned as
//! they are.

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::goal::Context;
use crate::io_state::IoState;
use crate::kernel::{Environment, Expr};
use crate::proof_state::{to_proof_state, ProofState};
use crate::tactic::Tactic;

impl Tactic {
    /// Run the tactic on `state` and return the proof of the first closed
    /// state it produces.
    #[instrument(skip_all, fields(tactic = %self, goals = state.goal_count()))]
    pub fn solve(&self, env: &Environment, io: &IoState, state: &ProofState) -> Result<Expr> {
        let mut remaining_goals = state.goal_count();
        for item in self.apply(env, io, state) {
            let candidate = item.inspect_err(|e| debug!(error = %e, "solve aborted"))?;
            if candidate.is_closed() {
                let proof = candidate.to_proof()?;
                debug!("solve succeeded");
                return Ok(proof);
            }
            remaining_goals = candidate.goal_count();
        }
        debug!(remaining_goals, "solve failed");
        Err(Error::failed(remaining_goals))
    }

    /// Prove `target` under `ctx`.
    pub fn solve_goal(
        &self,
        env: &Environment,
        io: &IoState,
        ctx: &Context,
        target: Expr,
    ) -> Result<Expr> {
        let state = to_proof_state(env, ctx, target)?;
        self.solve(env, io, &state)
    }

    /// [`Tactic::solve`] on tokio's blocking pool.
    ///
    /// The search runs in a child scope of `io` that is cancelled when the
    /// returned future is dropped, so abandoning the future stops the search
    /// at its next interruption checkpoint.
    #[cfg(feature = "tokio-runtime")]
    pub async fn solve_async(
        &self,
        env: &Environment,
        io: &IoState,
        state: &ProofState,
    ) -> Result<Expr> {
        let io = io.child_scope();
        let _cancel_on_drop = io.cancellation().clone().drop_guard();
        let (tactic, env, state) = (self.clone(), env.clone(), state.clone());
        tokio::task::spawn_blocking(move || tactic.solve(&env, &io, &state))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    Error::WorkerPanicked
                } else {
                    Error::Interrupted
                }
            })?
    }
}

/// Free-function form of [`Tactic::solve`].
pub fn solve(tactic: &Tactic, env: &Environment, io: &IoState, state: &ProofState) -> Result<Expr> {
    tactic.solve(env, io, state)
}

/// Free-function form of [`Tactic::solve_goal`].
pub fn solve_goal(
    tactic: &Tactic,
    env: &Environment,
    io: &IoState,
    ctx: &Context,
    target: Expr,
) -> Result<Expr> {
    tactic.solve_goal(env, io, ctx, target)
}
