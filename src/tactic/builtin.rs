//! Built-in leaf tactics.
//!
//! Every leaf does its work when its sequence is first pulled, never at
//! `apply` time, and produces at most one state.

use super::{ProofStateSeq, Tactic, TacticKind};
use crate::goal::Goal;
use crate::io_state::IoState;
use crate::kernel::{Expr, Local};
use crate::proof_state::ProofState;

/// Succeeds once, leaving the state unchanged.
pub fn id_tactic() -> Tactic {
    Tactic::from_kind(TacticKind::Id)
}

/// Always fails.
pub fn fail_tactic() -> Tactic {
    Tactic::from_kind(TacticKind::Fail)
}

/// Closes every goal whose target is the type of one of its hypotheses.
///
/// Fails when no goal can be closed this way.
pub fn assumption_tactic() -> Tactic {
    Tactic::from_kind(TacticKind::Assumption)
}

/// Closes trivially true goals and succeeds only if no goals remain.
///
/// Every open goal must be trivial (`true` or `a = a`), not just the first;
/// a state with any other goal makes `now` fail.
pub fn now_tactic() -> Tactic {
    Tactic::from_kind(TacticKind::Now)
}

/// Splits every conjunction goal into its two sides.
pub fn conj_tactic() -> Tactic {
    Tactic::from_kind(TacticKind::Conj)
}

/// Introduces the premise of every implication goal as a hypothesis.
pub fn imp_tactic() -> Tactic {
    Tactic::from_kind(TacticKind::Imp)
}

/// Writes `message` to the diagnostic sink, then succeeds unchanged.
pub fn trace_tactic(message: impl Into<String>) -> Tactic {
    Tactic::from_kind(TacticKind::Trace(message.into()))
}

/// Writes the current proof state to the diagnostic sink, then succeeds
/// unchanged.
pub fn trace_state_tactic() -> Tactic {
    Tactic::from_kind(TacticKind::TraceState)
}

pub(crate) fn apply_id(state: &ProofState) -> ProofStateSeq {
    ProofStateSeq::single(state.clone())
}

pub(crate) fn apply_assumption(io: &IoState, state: &ProofState) -> ProofStateSeq {
    let (io, state) = (io.clone(), state.clone());
    ProofStateSeq::once_with(move || {
        let mut result = state.clone();
        let mut closed = 0;
        // Walk backwards so the indices of goals not yet visited stay valid.
        for (index, goal) in state.goals().iter().enumerate().rev() {
            io.check_interrupted()?;
            if let Some(name) = goal.context().find_by_type(goal.target()) {
                result = result.close_goal(index, Local(name.clone()));
                closed += 1;
            }
        }
        Ok((closed > 0).then_some(result))
    })
}

pub(crate) fn apply_now(state: &ProofState) -> ProofStateSeq {
    let state = state.clone();
    ProofStateSeq::once_with(move || {
        let mut result = state.clone();
        for (index, goal) in state.goals().iter().enumerate().rev() {
            match trivial_proof(goal.target()) {
                Some(proof) => result = result.close_goal(index, proof),
                None => return Ok(None),
            }
        }
        Ok(Some(result))
    })
}

fn trivial_proof(target: &Expr) -> Option<Expr> {
    match target {
        Expr::True => Some(Expr::TrueIntro),
        Expr::Eq(lhs, rhs) if lhs == rhs => Some(Expr::Refl(lhs.clone())),
        _ => None,
    }
}

pub(crate) fn apply_conj(state: &ProofState) -> ProofStateSeq {
    let state = state.clone();
    ProofStateSeq::once_with(move || {
        let mut result = state.clone();
        let mut changed = false;
        for (index, goal) in state.goals().iter().enumerate().rev() {
            let Some((lhs, rhs)) = goal.target().as_and() else {
                continue;
            };
            let parts = vec![goal.with_target(lhs.clone()), goal.with_target(rhs.clone())];
            result = result.refine(index, parts, |proofs| {
                let mut proofs = proofs.into_iter();
                match (proofs.next(), proofs.next()) {
                    (Some(left), Some(right)) => Ok(Expr::and_intro(left, right)),
                    _ => Err(crate::error::Error::arity_mismatch(2, 0)),
                }
            });
            changed = true;
        }
        Ok(changed.then_some(result))
    })
}

pub(crate) fn apply_imp(state: &ProofState) -> ProofStateSeq {
    let state = state.clone();
    ProofStateSeq::once_with(move || {
        let mut result = state.clone();
        let mut changed = false;
        for (index, goal) in state.goals().iter().enumerate().rev() {
            let Some((premise, conclusion)) = goal.target().as_implies() else {
                continue;
            };
            let binder = goal.context().fresh_name("H");
            let premise = premise.clone();
            let inner = Goal::new(
                goal.context().extend(binder.clone(), premise.clone()),
                conclusion.clone(),
            );
            result = result.refine(index, vec![inner], move |mut proofs| {
                let body = proofs
                    .pop()
                    .ok_or_else(|| crate::error::Error::arity_mismatch(1, 0))?;
                Ok(Expr::lambda(binder.clone(), premise.clone(), body))
            });
            changed = true;
        }
        Ok(changed.then_some(result))
    })
}

pub(crate) fn apply_trace(io: &IoState, state: &ProofState, message: &str) -> ProofStateSeq {
    let (io, state, message) = (io.clone(), state.clone(), message.to_string());
    ProofStateSeq::once_with(move || {
        let sink = io.diagnostic();
        sink.write_str(&message);
        sink.write_str("\n");
        sink.flush();
        Ok(Some(state))
    })
}

pub(crate) fn apply_trace_state(io: &IoState, state: &ProofState) -> ProofStateSeq {
    let (io, state) = (io.clone(), state.clone());
    ProofStateSeq::once_with(move || {
        let sink = io.diagnostic();
        sink.write_str(&format!("{state}\n"));
        sink.flush();
        Ok(Some(state))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::goal::Context;
    use crate::io_state::BufferSink;
    use crate::kernel::{And, Const, Environment, Implies};
    use crate::options::Options;
    use crate::proof_state::to_proof_state;
    use std::sync::Arc;

    fn env_pq() -> Environment {
        let mut env = Environment::new();
        env.add_var("p", Expr::Bool).unwrap();
        env.add_var("q", Expr::Bool).unwrap();
        env
    }

    fn ctx_pq() -> Context {
        Context::new()
            .extend("H1", Const("p"))
            .extend("H2", Const("q"))
    }

    fn first_state(
        t: &Tactic,
        env: &Environment,
        io: &IoState,
        state: &ProofState,
    ) -> Option<ProofState> {
        t.apply(env, io, state).next().map(|r| r.unwrap())
    }

    #[test]
    fn test_fail_and_id() {
        let env = env_pq();
        let io = IoState::default();
        let state = to_proof_state(&env, &ctx_pq(), Const("p")).unwrap();
        assert!(first_state(&fail_tactic(), &env, &io, &state).is_none());
        let same = first_state(&id_tactic(), &env, &io, &state).unwrap();
        assert!(same.same_goals(&state));
    }

    #[test]
    fn test_assumption_closes_matching_goal() {
        let env = env_pq();
        let io = IoState::default();
        let state = to_proof_state(&env, &ctx_pq(), Const("q")).unwrap();
        let closed = first_state(&assumption_tactic(), &env, &io, &state).unwrap();
        assert!(closed.is_closed());
        assert_eq!(closed.to_proof().unwrap(), Local("H2"));
    }

    #[test]
    fn test_assumption_fails_without_match() {
        let env = env_pq();
        let io = IoState::default();
        let ctx = Context::new().extend("H1", Const("p"));
        let state = to_proof_state(&env, &ctx, Const("q")).unwrap();
        assert!(first_state(&assumption_tactic(), &env, &io, &state).is_none());
    }

    #[test]
    fn test_assumption_respects_interruption() {
        let env = env_pq();
        let io = IoState::default();
        let state = to_proof_state(&env, &ctx_pq(), Const("q")).unwrap();
        io.cancellation().cancel();
        assert!(matches!(
            assumption_tactic().apply(&env, &io, &state).collect_states(),
            Err(Error::Interrupted)
        ));
    }

    #[test]
    fn test_now_requires_no_open_goals() {
        let env = env_pq();
        let io = IoState::default();
        let state = to_proof_state(&env, &ctx_pq(), Const("p")).unwrap();
        assert!(first_state(&now_tactic(), &env, &io, &state).is_none());

        let done = ProofState::closed(Local("H1"));
        assert!(first_state(&now_tactic(), &env, &io, &done).unwrap().is_closed());
    }

    #[test]
    fn test_now_closes_trivial_goals() {
        let env = env_pq();
        let io = IoState::default();
        let refl_goal = Expr::equality(Const("p"), Const("p"));
        let state = to_proof_state(&env, &Context::new(), refl_goal.clone()).unwrap();
        let closed = first_state(&now_tactic(), &env, &io, &state).unwrap();
        let proof = closed.to_proof().unwrap();
        assert_eq!(env.infer_type(&Context::new(), &proof).unwrap(), refl_goal);

        let state = to_proof_state(&env, &Context::new(), Expr::True).unwrap();
        let closed = first_state(&now_tactic(), &env, &io, &state).unwrap();
        assert_eq!(closed.to_proof().unwrap(), Expr::TrueIntro);
    }

    #[test]
    fn test_conj_splits_every_conjunction() {
        let env = env_pq();
        let io = IoState::default();
        let target = And(And(Const("p"), Const("q")), Const("q"));
        let state = to_proof_state(&env, &ctx_pq(), target).unwrap();

        let once = first_state(&conj_tactic(), &env, &io, &state).unwrap();
        assert_eq!(once.goal_count(), 2);
        let twice = first_state(&conj_tactic(), &env, &io, &once).unwrap();
        assert_eq!(twice.goal_count(), 3);
        let targets: Vec<_> = twice.goals().iter().map(|g| g.target().clone()).collect();
        assert_eq!(targets, vec![Const("p"), Const("q"), Const("q")]);
        assert!(first_state(&conj_tactic(), &env, &io, &twice).is_none());
    }

    #[test]
    fn test_imp_introduces_fresh_hypothesis() {
        let env = env_pq();
        let io = IoState::default();
        let ctx = Context::new().extend("H", Const("q"));
        let state = to_proof_state(&env, &ctx, Implies(Const("p"), Const("p"))).unwrap();

        let intro = first_state(&imp_tactic(), &env, &io, &state).unwrap();
        let goal = intro.first_goal().unwrap();
        assert_eq!(goal.target(), &Const("p"));
        assert_eq!(goal.context().find_by_type(&Const("p")).unwrap().as_str(), "H1");

        let closed = first_state(&assumption_tactic(), &env, &io, &intro).unwrap();
        let proof = closed.to_proof().unwrap();
        assert_eq!(
            env.infer_type(&ctx, &proof).unwrap(),
            Implies(Const("p"), Const("p"))
        );
    }

    #[test]
    fn test_trace_writes_only_when_pulled() {
        let env = env_pq();
        let buffer = BufferSink::new();
        let io = IoState::new(Options::new(), Arc::new(buffer.clone()));
        let state = to_proof_state(&env, &ctx_pq(), Const("p")).unwrap();

        let seq = trace_tactic("hello").apply(&env, &io, &state);
        assert!(buffer.contents().is_empty());
        assert_eq!(seq.count(), 1);
        assert_eq!(buffer.contents(), "hello\n");
    }

    #[test]
    fn test_trace_state() {
        let env = env_pq();
        let buffer = BufferSink::new();
        let io = IoState::new(Options::new(), Arc::new(buffer.clone()));
        let state = to_proof_state(&env, &ctx_pq(), Const("p")).unwrap();
        assert!(first_state(&trace_state_tactic(), &env, &io, &state).is_some());
        assert_eq!(buffer.contents(), "H1 : p, H2 : q ⊢ p\n");
    }
}
