//! Lazy sequences of proof states.
//!
//! A [`ProofStateSeq`] is what a tactic returns: the alternatives it found,
//! best first, computed only as they are pulled. Items are `Result`s. An
//! empty sequence is ordinary tactic failure; an `Err` item is a hard abort
//! (interruption or a collaborator error) and is always the last item the
//! sequence yields.

use std::fmt;

use crate::error::{Error, Result};
use crate::proof_state::ProofState;

type BoxedIter = Box<dyn Iterator<Item = Result<ProofState>> + Send>;

/// Ordered, lazily computed, possibly infinite sequence of proof states.
pub struct ProofStateSeq {
    inner: BoxedIter,
    finished: bool,
}

impl ProofStateSeq {
    /// Wrap any sendable iterator of results.
    pub fn from_results<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Result<ProofState>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            inner: Box::new(items.into_iter()),
            finished: false,
        }
    }

    /// The empty sequence: tactic failure.
    pub fn empty() -> Self {
        Self::from_results(std::iter::empty())
    }

    /// A sequence of exactly one state.
    pub fn single(state: ProofState) -> Self {
        Self::from_results(std::iter::once(Ok(state)))
    }

    /// A sequence that aborts with `error` when pulled.
    pub fn error(error: Error) -> Self {
        Self::from_results(std::iter::once(Err(error)))
    }

    /// At most one state, computed by `f` on the first pull.
    ///
    /// `Ok(None)` means failure, `Err` an abort.
    pub fn once_with<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<Option<ProofState>> + Send + 'static,
    {
        Self::from_results(std::iter::once_with(f).filter_map(Result::transpose))
    }

    /// Defer building the whole sequence until its first element is pulled.
    pub fn lazy<F>(f: F) -> Self
    where
        F: FnOnce() -> ProofStateSeq + Send + 'static,
    {
        Self::from_results(Deferred {
            pending: Some(f),
            active: None,
        })
    }

    /// `first` followed by the remaining elements of `rest`.
    pub fn prepend(first: Result<ProofState>, rest: ProofStateSeq) -> Self {
        Self::from_results(std::iter::once(first).chain(rest))
    }

    /// This sequence followed by `other`, which is built only once this one
    /// is exhausted.
    pub fn chain_lazy<F>(self, other: F) -> Self
    where
        F: FnOnce() -> ProofStateSeq + Send + 'static,
    {
        Self::from_results(self.chain(ProofStateSeq::lazy(other)))
    }

    /// Replace every state with the sequence `f` produces for it, keeping
    /// order: all results for the first state, then the second, and so on.
    /// `f` is called on a state only when that state is reached.
    pub fn flat_map_states<F>(self, f: F) -> Self
    where
        F: Fn(ProofState) -> ProofStateSeq + Send + 'static,
    {
        Self::from_results(self.flat_map(move |item| match item {
            Ok(state) => f(state),
            Err(e) => ProofStateSeq::error(e),
        }))
    }

    /// Pull the first element, returning it together with the rest.
    pub fn pull(mut self) -> Option<(Result<ProofState>, ProofStateSeq)> {
        let first = self.next()?;
        Some((first, self))
    }

    /// Drain the sequence, stopping at the first abort.
    pub fn collect_states(self) -> Result<Vec<ProofState>> {
        self.collect()
    }
}

impl Iterator for ProofStateSeq {
    type Item = Result<ProofState>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.inner.next();
        if matches!(item, None | Some(Err(_))) {
            self.finished = true;
        }
        item
    }
}

impl fmt::Debug for ProofStateSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofStateSeq")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

struct Deferred<F> {
    pending: Option<F>,
    active: Option<ProofStateSeq>,
}

impl<F> Iterator for Deferred<F>
where
    F: FnOnce() -> ProofStateSeq,
{
    type Item = Result<ProofState>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(build) = self.pending.take() {
            self.active = Some(build());
        }
        self.active.as_mut()?.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Expr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn state() -> ProofState {
        ProofState::closed(Expr::TrueIntro)
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(ProofStateSeq::empty().count(), 0);
        assert_eq!(ProofStateSeq::single(state()).count(), 1);
    }

    #[test]
    fn test_error_terminates_sequence() {
        let seq =
            ProofStateSeq::from_results(vec![Ok(state()), Err(Error::Interrupted), Ok(state())]);
        let items: Vec<_> = seq.collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(items[1], Err(Error::Interrupted)));
    }

    #[test]
    fn test_once_with_runs_on_demand() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut seq = ProofStateSeq::once_with(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some(state()))
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(seq.next().is_some());
        assert!(seq.next().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let mut failing = ProofStateSeq::once_with(|| Ok(None));
        assert!(failing.next().is_none());
    }

    #[test]
    fn test_lazy_defers_construction() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let seq = ProofStateSeq::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            ProofStateSeq::single(state())
        });
        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert_eq!(seq.count(), 1);
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_flat_map_is_lazy_and_ordered() {
        let visited = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&visited);
        let seq = ProofStateSeq::from_results(vec![Ok(state()), Ok(state()), Ok(state())])
            .flat_map_states(move |s| {
                counter.fetch_add(1, Ordering::SeqCst);
                ProofStateSeq::from_results(vec![Ok(s.clone()), Ok(s)])
            });
        let mut seq = seq;
        assert!(seq.next().is_some());
        assert_eq!(visited.load(Ordering::SeqCst), 1);
        assert_eq!(seq.count(), 5);
        assert_eq!(visited.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_flat_map_stops_after_inner_abort() {
        let seq = ProofStateSeq::from_results(vec![Ok(state()), Ok(state())])
            .flat_map_states(|_| ProofStateSeq::error(Error::Interrupted));
        assert!(matches!(seq.collect_states(), Err(Error::Interrupted)));
    }

    #[test]
    fn test_pull_and_prepend() {
        let seq = ProofStateSeq::from_results(vec![Ok(state()), Ok(state())]);
        let (first, rest) = seq.pull().unwrap();
        assert!(first.is_ok());
        assert_eq!(ProofStateSeq::prepend(first, rest).count(), 2);
        assert!(ProofStateSeq::empty().pull().is_none());
    }
}
