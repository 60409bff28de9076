//! Tactics and tactic combinators.
//!
//! A [`Tactic`] is an immutable description of a proof-search procedure:
//! applied to an environment, an IO state and a proof state it returns a
//! [`ProofStateSeq`] of alternative resulting states, best first. Building a
//! tactic runs nothing; work happens only as the returned sequence is pulled.
//!
//! Tactics are cheap to clone and safe to share across threads, so one value
//! can be reused by any number of (concurrent) `solve` calls.
//!
//! ## Building blocks
//!
//! - **Leaves** (`builtin.rs`): `assumption_tactic`, `now_tactic`,
//!   `fail_tactic`, `id_tactic`, `trace_tactic`, `conj_tactic`, `imp_tactic`
//! - **Sequencing and choice** (`combinators.rs`): `then`, `orelse`,
//!   `append`, `repeat`, `repeat_at_most`, `cond`, `when`
//! - **Time limits** (`interrupt.rs`): `try_for` and the interruption checkpoint
//! - **Parallel search** (`par.rs`): `par`
//! - **IO overlays** (`overlay.rs`): `suppress_trace`, `using_params`
//!
//! ## Example
//!
//! ```rust,ignore
//! use tactic_core::tactic::{assumption_tactic, conj_tactic, repeat, then};
//!
//! let t = then(&repeat(&conj_tactic()), &assumption_tactic());
//! let proof = t.solve_goal(&env, &io, &ctx, goal)?;
//! ```

pub mod builtin;
pub mod combinators;
pub mod interrupt;
pub mod overlay;
pub mod par;
mod proptest;
pub mod seq;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::io_state::IoState;
use crate::kernel::Environment;
use crate::options::Options;
use crate::proof_state::ProofState;

pub use builtin::{
    assumption_tactic, conj_tactic, fail_tactic, id_tactic, imp_tactic, now_tactic,
    trace_state_tactic, trace_tactic,
};
pub use combinators::{
    append, cond, orelse, orelse_all, repeat, repeat_at_most, then, then_all, when,
};
pub use interrupt::{check_interrupted, try_for, try_for_default};
pub use overlay::{suppress_trace, using_params};
pub use par::{par, par_all};
pub use seq::ProofStateSeq;

/// Behaviour of a user-defined tactic.
pub trait TacticFn: Send + Sync {
    /// Apply the tactic to `state`.
    fn apply(&self, env: &Environment, io: &IoState, state: &ProofState) -> ProofStateSeq;
}

impl<F> TacticFn for F
where
    F: Fn(&Environment, &IoState, &ProofState) -> ProofStateSeq + Send + Sync,
{
    fn apply(&self, env: &Environment, io: &IoState, state: &ProofState) -> ProofStateSeq {
        self(env, io, state)
    }
}

/// Side-effect-free probe used by `cond` and `when`.
pub type Predicate = Arc<dyn Fn(&Environment, &IoState, &ProofState) -> bool + Send + Sync>;

#[derive(Clone)]
pub(crate) enum TacticKind {
    Id,
    Fail,
    Assumption,
    Now,
    Conj,
    Imp,
    Trace(String),
    TraceState,
    Custom {
        name: String,
        body: Arc<dyn TacticFn>,
    },
    Then(Tactic, Tactic),
    OrElse(Tactic, Tactic),
    Repeat(Tactic),
    RepeatAtMost(Tactic, usize),
    Cond(Predicate, Tactic, Tactic),
    TryFor(Tactic, Option<Duration>),
    Par(Vec<Tactic>),
    SuppressTrace(Tactic),
    UsingParams(Tactic, Options),
}

/// A composable proof-search procedure.
#[derive(Clone)]
pub struct Tactic(Arc<TacticKind>);

impl Tactic {
    pub(crate) fn from_kind(kind: TacticKind) -> Self {
        Self(Arc::new(kind))
    }

    pub(crate) fn kind(&self) -> &TacticKind {
        &self.0
    }

    /// A tactic backed by an arbitrary function.
    pub fn custom<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Environment, &IoState, &ProofState) -> ProofStateSeq + Send + Sync + 'static,
    {
        Self::from_kind(TacticKind::Custom {
            name: name.into(),
            body: Arc::new(body),
        })
    }

    /// Apply the tactic, returning the lazy sequence of resulting states.
    pub fn apply(&self, env: &Environment, io: &IoState, state: &ProofState) -> ProofStateSeq {
        match self.0.as_ref() {
            TacticKind::Id => builtin::apply_id(state),
            TacticKind::Fail => ProofStateSeq::empty(),
            TacticKind::Assumption => builtin::apply_assumption(io, state),
            TacticKind::Now => builtin::apply_now(state),
            TacticKind::Conj => builtin::apply_conj(state),
            TacticKind::Imp => builtin::apply_imp(state),
            TacticKind::Trace(message) => builtin::apply_trace(io, state, message),
            TacticKind::TraceState => builtin::apply_trace_state(io, state),
            TacticKind::Custom { body, .. } => body.apply(env, io, state),
            TacticKind::Then(first, second) => {
                combinators::apply_then(first, second, env, io, state)
            }
            TacticKind::OrElse(first, second) => {
                combinators::apply_orelse(first, second, env, io, state)
            }
            TacticKind::Repeat(body) => combinators::apply_repeat(body, None, env, io, state),
            TacticKind::RepeatAtMost(body, limit) => {
                combinators::apply_repeat(body, Some(*limit), env, io, state)
            }
            TacticKind::Cond(predicate, then_branch, else_branch) => {
                combinators::apply_cond(predicate, then_branch, else_branch, env, io, state)
            }
            TacticKind::TryFor(body, budget) => {
                interrupt::apply_try_for(body, *budget, env, io, state)
            }
            TacticKind::Par(branches) => par::apply_par(branches, env, io, state),
            TacticKind::SuppressTrace(body) => {
                overlay::apply_suppress_trace(body, env, io, state)
            }
            TacticKind::UsingParams(body, overrides) => {
                overlay::apply_using_params(body, overrides, env, io, state)
            }
        }
    }

    /// Sequential composition: `then(self, next)`.
    pub fn then(&self, next: &Tactic) -> Tactic {
        combinators::then(self, next)
    }

    /// Choice: `orelse(self, alternative)`.
    pub fn orelse(&self, alternative: &Tactic) -> Tactic {
        combinators::orelse(self, alternative)
    }
}

/// Tactic from a function returning the full result sequence.
pub fn mk_tactic<F>(f: F) -> Tactic
where
    F: Fn(&Environment, &IoState, &ProofState) -> ProofStateSeq + Send + Sync + 'static,
{
    Tactic::custom("tactic", f)
}

/// Tactic producing exactly one state, computed when first pulled.
pub fn mk_tactic1<F>(f: F) -> Tactic
where
    F: Fn(&Environment, &IoState, &ProofState) -> Result<ProofState> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    mk_tactic(move |env, io, state| {
        let (f, env, io, state) = (Arc::clone(&f), env.clone(), io.clone(), state.clone());
        ProofStateSeq::once_with(move || f(&env, &io, &state).map(Some))
    })
}

/// Tactic producing at most one state, computed when first pulled.
pub fn mk_tactic01<F>(f: F) -> Tactic
where
    F: Fn(&Environment, &IoState, &ProofState) -> Result<Option<ProofState>>
        + Send
        + Sync
        + 'static,
{
    let f = Arc::new(f);
    mk_tactic(move |env, io, state| {
        let (f, env, io, state) = (Arc::clone(&f), env.clone(), io.clone(), state.clone());
        ProofStateSeq::once_with(move || f(&env, &io, &state))
    })
}

impl fmt::Display for Tactic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_ref() {
            TacticKind::Id => f.write_str("id"),
            TacticKind::Fail => f.write_str("fail"),
            TacticKind::Assumption => f.write_str("assumption"),
            TacticKind::Now => f.write_str("now"),
            TacticKind::Conj => f.write_str("conj"),
            TacticKind::Imp => f.write_str("imp"),
            TacticKind::Trace(message) => write!(f, "trace({message:?})"),
            TacticKind::TraceState => f.write_str("trace_state"),
            TacticKind::Custom { name, .. } => f.write_str(name),
            TacticKind::Then(a, b) => write!(f, "then({a}, {b})"),
            TacticKind::OrElse(a, b) => write!(f, "orelse({a}, {b})"),
            TacticKind::Repeat(t) => write!(f, "repeat({t})"),
            TacticKind::RepeatAtMost(t, n) => write!(f, "repeat_at_most({t}, {n})"),
            TacticKind::Cond(_, a, b) => write!(f, "cond(<predicate>, {a}, {b})"),
            TacticKind::TryFor(t, Some(budget)) => {
                write!(f, "try_for({t}, {}ms)", budget.as_millis())
            }
            TacticKind::TryFor(t, None) => write!(f, "try_for({t})"),
            TacticKind::Par(branches) => {
                f.write_str("par(")?;
                for (index, branch) in branches.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{branch}")?;
                }
                f.write_str(")")
            }
            TacticKind::SuppressTrace(t) => write!(f, "suppress_trace({t})"),
            TacticKind::UsingParams(t, options) => write!(f, "using_params({t}, {options})"),
        }
    }
}

impl fmt::Debug for Tactic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tactic({self})")
    }
}
