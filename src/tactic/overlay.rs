//! Scoped changes to the IO state seen by a sub-tactic.
//!
//! Both wrappers derive a modified [`IoState`] for the tactic they wrap and
//! leave the caller's untouched, so the override ends exactly where the
//! wrapped tactic's sequence ends, whether it succeeds, fails or aborts.

use std::sync::Arc;

use super::{ProofStateSeq, Tactic, TacticKind};
use crate::io_state::{IoState, NullSink};
use crate::kernel::Environment;
use crate::options::Options;
use crate::proof_state::ProofState;

/// Run `body` with all diagnostic output discarded.
pub fn suppress_trace(body: &Tactic) -> Tactic {
    Tactic::from_kind(TacticKind::SuppressTrace(body.clone()))
}

/// Run `body` with `overrides` layered over the current options.
pub fn using_params(body: &Tactic, overrides: &Options) -> Tactic {
    Tactic::from_kind(TacticKind::UsingParams(body.clone(), overrides.clone()))
}

pub(crate) fn apply_suppress_trace(
    body: &Tactic,
    env: &Environment,
    io: &IoState,
    state: &ProofState,
) -> ProofStateSeq {
    body.apply(env, &io.with_sink(Arc::new(NullSink)), state)
}

pub(crate) fn apply_using_params(
    body: &Tactic,
    overrides: &Options,
    env: &Environment,
    io: &IoState,
    state: &ProofState,
) -> ProofStateSeq {
    body.apply(env, &io.with_options(io.options().push(overrides)), state)
}
