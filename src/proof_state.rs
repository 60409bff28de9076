//! Proof states and proof builders.
//!
//! A [`ProofState`] is the unit that flows through tactic application: the
//! open goals, in order, plus a [`ProofBuilder`] that turns one proof per goal
//! back into a proof of the original statement. The builder's arity always
//! equals the number of open goals; a state with no goals is closed and its
//! builder, applied to nothing, yields the final term.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::goal::{Context, Goal};
use crate::kernel::{Environment, Expr};

type BuildFn = dyn Fn(Vec<Expr>) -> Result<Expr> + Send + Sync;

/// Continuation assembling the overall proof from proofs of the open goals.
#[derive(Clone)]
pub struct ProofBuilder {
    arity: usize,
    build: Arc<BuildFn>,
}

impl ProofBuilder {
    /// Create a builder that expects exactly `arity` proofs.
    pub fn new<F>(arity: usize, build: F) -> Self
    where
        F: Fn(Vec<Expr>) -> Result<Expr> + Send + Sync + 'static,
    {
        Self {
            arity,
            build: Arc::new(build),
        }
    }

    /// Builder for a single goal whose proof is the overall proof.
    pub fn identity() -> Self {
        Self::new(1, |mut proofs| {
            proofs.pop().ok_or_else(|| Error::arity_mismatch(1, 0))
        })
    }

    /// Number of proofs this builder consumes.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Assemble the proof from one proof per open goal, in goal order.
    pub fn build(&self, proofs: Vec<Expr>) -> Result<Expr> {
        if proofs.len() != self.arity {
            return Err(Error::arity_mismatch(self.arity, proofs.len()));
        }
        (self.build)(proofs)
    }
}

impl fmt::Debug for ProofBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofBuilder")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Ordered open goals plus the continuation that assembles their proofs.
#[derive(Debug, Clone)]
pub struct ProofState {
    goals: Arc<[Goal]>,
    builder: ProofBuilder,
}

impl ProofState {
    /// Create a proof state, checking the builder arity against the goals.
    pub fn new(goals: Vec<Goal>, builder: ProofBuilder) -> Result<Self> {
        if builder.arity() != goals.len() {
            return Err(Error::arity_mismatch(goals.len(), builder.arity()));
        }
        Ok(Self {
            goals: goals.into(),
            builder,
        })
    }

    /// A closed state whose proof is `proof`.
    pub fn closed(proof: Expr) -> Self {
        Self {
            goals: Arc::from(Vec::new()),
            builder: ProofBuilder::new(0, move |_| Ok(proof.clone())),
        }
    }

    /// Open goals, in order.
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Number of open goals.
    pub fn goal_count(&self) -> usize {
        self.goals.len()
    }

    /// Whether every goal has been discharged.
    pub fn is_closed(&self) -> bool {
        self.goals.is_empty()
    }

    /// The first open goal, if any.
    pub fn first_goal(&self) -> Option<&Goal> {
        self.goals.first()
    }

    /// The proof-assembly continuation.
    pub fn proof_builder(&self) -> &ProofBuilder {
        &self.builder
    }

    /// Whether `other` has exactly the same open goals.
    pub fn same_goals(&self, other: &ProofState) -> bool {
        Arc::ptr_eq(&self.goals, &other.goals) || self.goals == other.goals
    }

    /// Assemble the final proof term of a closed state.
    pub fn to_proof(&self) -> Result<Expr> {
        if !self.is_closed() {
            return Err(Error::failed(self.goal_count()));
        }
        self.builder.build(Vec::new())
    }

    /// Replace the goal at `index` with `replacement`.
    ///
    /// `assemble` receives the proofs of the replacement goals, in order, and
    /// must produce a proof of the replaced goal. An empty `replacement`
    /// closes the goal outright.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not the index of an open goal.
    pub fn refine<F>(&self, index: usize, replacement: Vec<Goal>, assemble: F) -> ProofState
    where
        F: Fn(Vec<Expr>) -> Result<Expr> + Send + Sync + 'static,
    {
        assert!(index < self.goals.len(), "goal index {index} out of range");

        let added = replacement.len();
        let mut goals = Vec::with_capacity(self.goals.len() - 1 + added);
        goals.extend_from_slice(&self.goals[..index]);
        goals.extend(replacement);
        goals.extend_from_slice(&self.goals[index + 1..]);

        let parent = self.builder.clone();
        let builder = ProofBuilder::new(goals.len(), move |mut proofs| {
            let tail = proofs.split_off(index + added);
            let sub_proofs = proofs.split_off(index);
            proofs.push(assemble(sub_proofs)?);
            proofs.extend(tail);
            parent.build(proofs)
        });

        ProofState {
            goals: goals.into(),
            builder,
        }
    }

    /// Close the goal at `index` with a known proof.
    pub fn close_goal(&self, index: usize, proof: Expr) -> ProofState {
        self.refine(index, Vec::new(), move |_| Ok(proof.clone()))
    }
}

impl fmt::Display for ProofState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.goals.is_empty() {
            return f.write_str("no goals");
        }
        for (index, goal) in self.goals.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{goal}")?;
        }
        Ok(())
    }
}

/// Build the initial proof state for proving `target` under `ctx`.
///
/// The target is checked to be a proposition in `env`; kernel errors are
/// returned unchanged.
pub fn to_proof_state(env: &Environment, ctx: &Context, target: Expr) -> Result<ProofState> {
    match env.infer_type(ctx, &target)? {
        Expr::Bool => {}
        _ => return Err(crate::kernel::KernelError::NotAProposition(target).into()),
    }
    ProofState::new(vec![Goal::new(ctx.clone(), target)], ProofBuilder::identity())
}
