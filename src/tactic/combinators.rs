//! Sequencing, choice and repetition.
//!
//! These combinators only interpret *emptiness*. An aborting item
//! (interruption, collaborator error) passes through them untouched and ends
//! the combined sequence.

use std::ops::{Add, BitOr};
use std::sync::Arc;

use super::builtin::{fail_tactic, id_tactic};
use super::{Predicate, ProofStateSeq, Tactic, TacticKind};
use crate::error::Result;
use crate::io_state::IoState;
use crate::kernel::Environment;
use crate::proof_state::ProofState;

/// Apply `first`, then `second` to each resulting state, concatenating the
/// results in order.
pub fn then(first: &Tactic, second: &Tactic) -> Tactic {
    Tactic::from_kind(TacticKind::Then(first.clone(), second.clone()))
}

/// `first`'s results if it produces any, otherwise `second`'s.
pub fn orelse(first: &Tactic, second: &Tactic) -> Tactic {
    Tactic::from_kind(TacticKind::OrElse(first.clone(), second.clone()))
}

/// Sequential alias of [`then`].
pub fn append(first: &Tactic, second: &Tactic) -> Tactic {
    then(first, second)
}

/// Apply `body` until it fails or stops changing the goals.
pub fn repeat(body: &Tactic) -> Tactic {
    Tactic::from_kind(TacticKind::Repeat(body.clone()))
}

/// Apply `body` at most `limit` times.
pub fn repeat_at_most(body: &Tactic, limit: usize) -> Tactic {
    Tactic::from_kind(TacticKind::RepeatAtMost(body.clone(), limit))
}

/// Dispatch on `predicate`, evaluated against the incoming state.
pub fn cond<P>(predicate: P, then_branch: &Tactic, else_branch: &Tactic) -> Tactic
where
    P: Fn(&Environment, &IoState, &ProofState) -> bool + Send + Sync + 'static,
{
    let predicate: Predicate = Arc::new(predicate);
    Tactic::from_kind(TacticKind::Cond(
        predicate,
        then_branch.clone(),
        else_branch.clone(),
    ))
}

/// Run `body` when `predicate` holds, otherwise succeed unchanged.
pub fn when<P>(predicate: P, body: &Tactic) -> Tactic
where
    P: Fn(&Environment, &IoState, &ProofState) -> bool + Send + Sync + 'static,
{
    cond(predicate, body, &id_tactic())
}

/// `then` over a list, in order; the identity for an empty list.
pub fn then_all(tactics: &[Tactic]) -> Tactic {
    if tactics.is_empty() {
        return id_tactic();
    }
    balanced(tactics, then)
}

/// `orelse` over a list, in order; failure for an empty list.
pub fn orelse_all(tactics: &[Tactic]) -> Tactic {
    if tactics.is_empty() {
        return fail_tactic();
    }
    balanced(tactics, orelse)
}

/// Fold a non-empty list with an associative combinator into a tree of
/// logarithmic depth.
fn balanced(tactics: &[Tactic], combine: fn(&Tactic, &Tactic) -> Tactic) -> Tactic {
    match tactics {
        [single] => single.clone(),
        _ => {
            let (left, right) = tactics.split_at(tactics.len() / 2);
            combine(&balanced(left, combine), &balanced(right, combine))
        }
    }
}

impl Add for Tactic {
    type Output = Tactic;

    fn add(self, rhs: Tactic) -> Tactic {
        append(&self, &rhs)
    }
}

impl BitOr for Tactic {
    type Output = Tactic;

    fn bitor(self, rhs: Tactic) -> Tactic {
        orelse(&self, &rhs)
    }
}

pub(crate) fn apply_then(
    first: &Tactic,
    second: &Tactic,
    env: &Environment,
    io: &IoState,
    state: &ProofState,
) -> ProofStateSeq {
    let stages = leaves(first, second, then_parts);
    let head = stages[0].apply(env, io, state);
    ProofStateSeq::from_results(ThenChain {
        stages,
        env: env.clone(),
        io: io.clone(),
        frames: vec![head],
    })
}

pub(crate) fn apply_orelse(
    first: &Tactic,
    second: &Tactic,
    env: &Environment,
    io: &IoState,
    state: &ProofState,
) -> ProofStateSeq {
    let alternatives = leaves(first, second, orelse_parts);
    let (env, io, state) = (env.clone(), io.clone(), state.clone());
    ProofStateSeq::lazy(move || {
        for alternative in &alternatives {
            if let Some((head, rest)) = alternative.apply(&env, &io, &state).pull() {
                return ProofStateSeq::prepend(head, rest);
            }
        }
        ProofStateSeq::empty()
    })
}

fn then_parts(kind: &TacticKind) -> Option<(&Tactic, &Tactic)> {
    match kind {
        TacticKind::Then(first, second) => Some((first, second)),
        _ => None,
    }
}

fn orelse_parts(kind: &TacticKind) -> Option<(&Tactic, &Tactic)> {
    match kind {
        TacticKind::OrElse(first, second) => Some((first, second)),
        _ => None,
    }
}

/// Operands of a tree of one associative combinator, left to right.
fn leaves(
    first: &Tactic,
    second: &Tactic,
    split: fn(&TacticKind) -> Option<(&Tactic, &Tactic)>,
) -> Vec<Tactic> {
    let mut operands = Vec::new();
    let mut pending = vec![second, first];
    while let Some(tactic) = pending.pop() {
        match split(tactic.kind()) {
            Some((left, right)) => {
                pending.push(right);
                pending.push(left);
            }
            None => operands.push(tactic.clone()),
        }
    }
    operands
}

/// Depth-first driver of a `then` chain.
///
/// `frames[i]` holds the remaining results of `stages[i]` on the state most
/// recently produced by stage `i - 1`.
struct ThenChain {
    stages: Vec<Tactic>,
    env: Environment,
    io: IoState,
    frames: Vec<ProofStateSeq>,
}

impl Iterator for ThenChain {
    type Item = Result<ProofState>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let depth = self.frames.len();
            let top = self.frames.last_mut()?;
            match top.next() {
                None => {
                    self.frames.pop();
                }
                Some(Err(e)) => {
                    self.frames.clear();
                    return Some(Err(e));
                }
                Some(Ok(next)) => match self.stages.get(depth) {
                    Some(stage) => {
                        let results = stage.apply(&self.env, &self.io, &next);
                        self.frames.push(results);
                    }
                    None => return Some(Ok(next)),
                },
            }
        }
    }
}

pub(crate) fn apply_repeat(
    body: &Tactic,
    limit: Option<usize>,
    env: &Environment,
    io: &IoState,
    state: &ProofState,
) -> ProofStateSeq {
    ProofStateSeq::from_results(Repeat {
        body: body.clone(),
        env: env.clone(),
        io: io.clone(),
        pending: Some((state.clone(), limit)),
        frames: Vec::new(),
    })
}

/// One application of the body whose alternatives are still being explored.
struct RepeatFrame {
    input: ProofState,
    /// Iterations left for the states this frame produces; `None` if unbounded.
    remaining: Option<usize>,
    results: ProofStateSeq,
    produced: bool,
}

/// Shared engine of `repeat` and `repeat_at_most`.
///
/// Equivalent to `orelse(then(body, repeat(body)), id)`, unrolled onto an
/// explicit stack of frames. With no limit, a step that leaves the goals
/// unchanged is a fixed point and ends that branch.
struct Repeat {
    body: Tactic,
    env: Environment,
    io: IoState,
    /// State to run the body on next, with its iteration budget.
    pending: Option<(ProofState, Option<usize>)>,
    frames: Vec<RepeatFrame>,
}

impl Iterator for Repeat {
    type Item = Result<ProofState>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((state, limit)) = self.pending.take() {
                if limit == Some(0) {
                    return Some(Ok(state));
                }
                if let Err(e) = self.io.check_interrupted() {
                    self.frames.clear();
                    return Some(Err(e));
                }
                let results = self.body.apply(&self.env, &self.io, &state);
                self.frames.push(RepeatFrame {
                    input: state,
                    remaining: limit.map(|n| n - 1),
                    results,
                    produced: false,
                });
            }

            let frame = self.frames.last_mut()?;
            match frame.results.next() {
                None => {
                    if let Some(done) = self.frames.pop() {
                        // The body failed outright: this iteration is the result.
                        if !done.produced {
                            return Some(Ok(done.input));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.frames.clear();
                    return Some(Err(e));
                }
                Some(Ok(next)) => {
                    frame.produced = true;
                    if frame.remaining.is_none() && next.same_goals(&frame.input) {
                        return Some(Ok(next));
                    }
                    self.pending = Some((next, frame.remaining));
                }
            }
        }
    }
}

pub(crate) fn apply_cond(
    predicate: &Predicate,
    then_branch: &Tactic,
    else_branch: &Tactic,
    env: &Environment,
    io: &IoState,
    state: &ProofState,
) -> ProofStateSeq {
    let predicate = Arc::clone(predicate);
    let (then_branch, else_branch) = (then_branch.clone(), else_branch.clone());
    let (env, io, state) = (env.clone(), io.clone(), state.clone());
    ProofStateSeq::lazy(move || {
        if predicate(&env, &io, &state) {
            then_branch.apply(&env, &io, &state)
        } else {
            else_branch.apply(&env, &io, &state)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::goal::Context;
    use crate::io_state::BufferSink;
    use crate::kernel::{And, Const, Expr, Implies};
    use crate::options::Options;
    use crate::proof_state::{to_proof_state, ProofBuilder};
    use crate::tactic::{
        assumption_tactic, conj_tactic, imp_tactic, mk_tactic, mk_tactic01, mk_tactic1,
        now_tactic, trace_state_tactic, trace_tactic, try_for,
    };
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Fixture {
        env: Environment,
        io: IoState,
        buffer: BufferSink,
        ctx: Context,
    }

    fn fixture() -> Fixture {
        let mut env = Environment::new();
        env.add_var("p", Expr::Bool).unwrap();
        env.add_var("q", Expr::Bool).unwrap();
        let buffer = BufferSink::new();
        let io = IoState::new(Options::new(), Arc::new(buffer.clone()));
        let ctx = Context::new()
            .extend("H1", Const("p"))
            .extend("H2", Const("q"));
        Fixture { env, io, buffer, ctx }
    }

    impl Fixture {
        fn state(&self, target: Expr) -> ProofState {
            to_proof_state(&self.env, &self.ctx, target).unwrap()
        }

        fn run(&self, t: &Tactic, state: &ProofState) -> Vec<ProofState> {
            t.apply(&self.env, &self.io, state).collect_states().unwrap()
        }
    }

    /// Tactic that counts its invocations and passes the state through.
    fn counting(counter: &Arc<AtomicUsize>) -> Tactic {
        let counter = Arc::clone(counter);
        mk_tactic1(move |_, _, s| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(s.clone())
        })
    }

    /// Tactic producing `n` copies of the state.
    fn fan_out(n: usize) -> Tactic {
        mk_tactic(move |_, _, s| {
            let copies: Vec<_> = (0..n).map(|_| Ok(s.clone())).collect();
            ProofStateSeq::from_results(copies)
        })
    }

    #[test]
    fn test_then_fail_never_runs_second() {
        let f = fixture();
        let calls = Arc::new(AtomicUsize::new(0));
        let t = then(&fail_tactic(), &counting(&calls));
        assert!(f.run(&t, &f.state(Const("p"))).is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_then_concatenates_in_order() {
        let f = fixture();
        let t = then(&fan_out(2), &fan_out(3));
        assert_eq!(f.run(&t, &f.state(Const("p"))).len(), 6);

        let t = then(&fan_out(3), &trace_tactic("x"));
        f.run(&t, &f.state(Const("p")));
        assert_eq!(f.buffer.contents(), "x\nx\nx\n");
    }

    #[test]
    fn test_then_runs_second_only_on_demand() {
        let f = fixture();
        let calls = Arc::new(AtomicUsize::new(0));
        let t = then(&fan_out(5), &counting(&calls));
        let mut seq = t.apply(&f.env, &f.io, &f.state(Const("p")));
        assert!(seq.next().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_orelse_left_bias() {
        let f = fixture();
        let calls = Arc::new(AtomicUsize::new(0));
        let t = orelse(&fan_out(2), &counting(&calls));
        assert_eq!(f.run(&t, &f.state(Const("p"))).len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let t = orelse(&fail_tactic(), &fan_out(3));
        assert_eq!(f.run(&t, &f.state(Const("p"))).len(), 3);
    }

    #[test]
    fn test_orelse_does_not_swallow_interruption() {
        let f = fixture();
        let calls = Arc::new(AtomicUsize::new(0));
        let abort = mk_tactic(|_, _, _| ProofStateSeq::error(Error::Interrupted));
        let t = orelse(&abort, &counting(&calls));
        let result = t
            .apply(&f.env, &f.io, &f.state(Const("p")))
            .collect_states();
        assert!(matches!(result, Err(Error::Interrupted)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_append_is_then() {
        let f = fixture();
        let t = append(&trace_tactic("hello1"), &trace_tactic("hello2"));
        assert_eq!(f.run(&t, &f.state(Const("p"))).len(), 1);
        assert_eq!(f.buffer.contents(), "hello1\nhello2\n");
    }

    #[test]
    fn test_repeat_at_most_bound() {
        let f = fixture();
        let calls = Arc::new(AtomicUsize::new(0));
        let t = repeat_at_most(&counting(&calls), 5);
        let states = f.run(&t, &f.state(Const("p")));
        assert_eq!(states.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        let t = repeat_at_most(&counting(&calls), 0);
        f.run(&t, &f.state(Const("p")));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_repeat_at_most_traces_each_iteration() {
        let f = fixture();
        let body = append(&trace_tactic("hello1"), &trace_tactic("hello2"));
        let t = orelse(
            &then(&repeat_at_most(&body, 3), &fail_tactic()),
            &assumption_tactic(),
        );
        let states = f.run(&t, &f.state(Const("q")));
        assert_eq!(states.len(), 1);
        assert!(states[0].is_closed());
        assert_eq!(f.buffer.contents(), "hello1\nhello2\n".repeat(3));
    }

    #[test]
    fn test_repeat_stops_at_fixed_point() {
        let f = fixture();
        let calls = Arc::new(AtomicUsize::new(0));
        let t = repeat(&counting(&calls));
        let states = f.run(&t, &f.state(Const("p")));
        assert_eq!(states.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_repeat_conj_then_assumption() {
        let f = fixture();
        let (p, q) = (Const("p"), Const("q"));
        let goal = And(And(p.clone(), q.clone()), And(p.clone(), p.clone()));
        let t = then(&repeat(&conj_tactic()), &assumption_tactic());
        let states = f.run(&t, &f.state(goal.clone()));
        assert_eq!(states.len(), 1);
        let proof = states[0].to_proof().unwrap();
        assert_eq!(f.env.infer_type(&f.ctx, &proof).unwrap(), goal);
    }

    #[test]
    fn test_repeat_conj_or_imp() {
        let f = fixture();
        let (p, q) = (Const("p"), Const("q"));
        let goal = Implies(
            p.clone(),
            Implies(q.clone(), And(And(p.clone(), q.clone()), And(p.clone(), p.clone()))),
        );
        let t = then_all(&[
            repeat(&(conj_tactic() | imp_tactic())),
            trace_state_tactic(),
            assumption_tactic(),
        ]);
        let empty = Context::new();
        let state = to_proof_state(&f.env, &empty, goal.clone()).unwrap();
        let states = f.run(&t, &state);
        let proof = states[0].to_proof().unwrap();
        assert_eq!(f.env.infer_type(&empty, &proof).unwrap(), goal);
        assert!(f.buffer.contents().contains("⊢ p"));
    }

    #[test]
    fn test_cond_and_when() {
        let f = fixture();
        let t = then(
            &cond(
                |_, _, _| true,
                &(trace_tactic("then branch.1") + trace_tactic("then branch.2")),
                &trace_tactic("else branch"),
            ),
            &assumption_tactic(),
        );
        assert_eq!(f.run(&t, &f.state(Const("q"))).len(), 1);
        assert_eq!(f.buffer.contents(), "then branch.1\nthen branch.2\n");

        f.buffer.clear();
        let t = when(|_, _, s| s.goal_count() > 5, &trace_tactic("when branch"));
        assert_eq!(f.run(&t, &f.state(Const("q"))).len(), 1);
        assert!(f.buffer.contents().is_empty());
    }

    #[test]
    fn test_operator_chain() {
        let f = fixture();
        let t = then_all(&[
            trace_tactic("hello1.1") + trace_tactic("hello1.2"),
            trace_tactic("hello2.1"),
            trace_tactic("hello3.1") | trace_tactic("hello3.2"),
            assumption_tactic(),
        ]);
        let states = f.run(&t, &f.state(Const("q")));
        assert!(states[0].is_closed());
        assert_eq!(f.buffer.contents(), "hello1.1\nhello1.2\nhello2.1\nhello3.1\n");
    }

    #[test]
    fn test_then_all_and_orelse_all_edges() {
        let f = fixture();
        let state = f.state(Const("p"));
        assert_eq!(f.run(&then_all(&[]), &state).len(), 1);
        assert!(f.run(&orelse_all(&[]), &state).is_empty());
        let t = orelse_all(&[fail_tactic(), fail_tactic(), now_tactic(), assumption_tactic()]);
        assert!(f.run(&t, &state)[0].is_closed());
    }

    #[test]
    fn test_repeat_at_most_deep_bound() {
        let f = fixture();
        let calls = Arc::new(AtomicUsize::new(0));
        let t = repeat_at_most(&counting(&calls), 100_000);
        let states = f.run(&t, &f.state(Const("p")));
        assert_eq!(states.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 100_000);

        let states = f.run(&repeat_at_most(&id_tactic(), 100_000), &f.state(Const("p")));
        assert_eq!(states.len(), 1);
    }

    #[test]
    fn test_long_unbounded_repeat() {
        let f = fixture();
        let steps = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&steps);
        // Swaps the target between p and q, then fails after 50k swaps.
        let swap = mk_tactic01(move |_, _, s| {
            if counter.fetch_add(1, Ordering::SeqCst) >= 50_000 {
                return Ok(None);
            }
            let goal = s.first_goal().unwrap();
            let target = if *goal.target() == Const("p") {
                Const("q")
            } else {
                Const("p")
            };
            ProofState::new(vec![goal.with_target(target)], ProofBuilder::identity()).map(Some)
        });
        let states = f.run(&repeat(&swap), &f.state(Const("p")));
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].first_goal().unwrap().target(), &Const("p"));
        assert_eq!(steps.load(Ordering::SeqCst), 50_001);
    }

    #[test]
    fn test_repeat_branches_depth_first() {
        let f = fixture();
        // Two alternatives per step, two steps deep: four leaves in order.
        let t = then(&repeat_at_most(&fan_out(2), 2), &trace_tactic("leaf"));
        assert_eq!(f.run(&t, &f.state(Const("p"))).len(), 4);
        assert_eq!(f.buffer.contents(), "leaf\n".repeat(4));
    }

    #[test]
    fn test_repeat_stops_when_interrupted() {
        let f = fixture();
        f.io.cancellation().cancel();
        let result = repeat(&id_tactic())
            .apply(&f.env, &f.io, &f.state(Const("p")))
            .collect_states();
        assert!(matches!(result, Err(Error::Interrupted)));
    }

    #[test]
    fn test_deep_search_on_worker_thread() {
        let f = fixture();
        let budget = Duration::from_secs(60);
        let state = f.state(Const("p"));

        let t = try_for(&repeat_at_most(&id_tactic(), 100_000), budget);
        assert_eq!(f.run(&t, &state).len(), 1);

        let t = try_for(&then_all(&vec![id_tactic(); 100_000]), budget);
        assert_eq!(f.run(&t, &state).len(), 1);

        let mut alternatives = vec![fail_tactic(); 99_999];
        alternatives.push(assumption_tactic());
        let t = try_for(&orelse_all(&alternatives), budget);
        assert!(f.run(&t, &state)[0].is_closed());
    }

    #[test]
    fn test_hand_nested_then_chain() {
        let f = fixture();
        let left = (0..2_000).fold(id_tactic(), |acc, _| then(&acc, &trace_tactic("x")));
        let right = (0..2_000).fold(id_tactic(), |acc, _| then(&trace_tactic("x"), &acc));
        for t in [left, right] {
            f.buffer.clear();
            assert_eq!(f.run(&t, &f.state(Const("p"))).len(), 1);
            assert_eq!(f.buffer.contents().len(), 4_000);
        }
    }
}
