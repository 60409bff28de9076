//! Local contexts and goals.
//!
//! A [`Context`] is a persistent list of hypotheses. Extending it allocates a
//! single node that points at the unchanged prefix, so goals produced by
//! splitting a common ancestor share every binding they have in common.

use std::fmt;
use std::sync::Arc;

use crate::kernel::{Expr, Name};

#[derive(Debug)]
struct Binding {
    name: Name,
    ty: Expr,
    parent: Option<Arc<Binding>>,
}

impl Drop for Binding {
    // Unlink uniquely owned ancestors one at a time so a long context does
    // not drop recursively.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(parent) = next {
            next = match Arc::try_unwrap(parent) {
                Ok(mut binding) => binding.parent.take(),
                Err(_) => None,
            };
        }
    }
}

/// Ordered sequence of `(name, type)` hypotheses.
#[derive(Debug, Clone, Default)]
pub struct Context {
    head: Option<Arc<Binding>>,
    len: usize,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new context with one more hypothesis at the end.
    pub fn extend(&self, name: impl Into<Name>, ty: Expr) -> Self {
        Self {
            head: Some(Arc::new(Binding {
                name: name.into(),
                ty,
                parent: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Number of hypotheses.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the context has no hypotheses.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate hypotheses from the most recent binding backwards.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Expr)> {
        let mut cursor = self.head.as_deref();
        std::iter::from_fn(move || {
            let binding = cursor?;
            cursor = binding.parent.as_deref();
            Some((&binding.name, &binding.ty))
        })
    }

    /// Hypotheses in the order they were added.
    pub fn bindings(&self) -> Vec<(&Name, &Expr)> {
        let mut bindings: Vec<_> = self.iter().collect();
        bindings.reverse();
        bindings
    }

    /// Type of the most recent hypothesis called `name`.
    pub fn lookup(&self, name: &Name) -> Option<&Expr> {
        self.iter().find(|(n, _)| *n == name).map(|(_, ty)| ty)
    }

    /// Name of the most recent hypothesis whose type is exactly `ty`.
    pub fn find_by_type(&self, ty: &Expr) -> Option<&Name> {
        self.iter().find(|(_, t)| *t == ty).map(|(name, _)| name)
    }

    /// A hypothesis name based on `base` that is not bound in this context.
    pub fn fresh_name(&self, base: &str) -> Name {
        let candidate = Name::new(base);
        if self.lookup(&candidate).is_none() {
            return candidate;
        }
        let mut index = 1;
        loop {
            let name = candidate.with_suffix(index);
            if self.lookup(&name).is_none() {
                return name;
            }
            index += 1;
        }
    }

    /// Whether two contexts share the same underlying node.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for Context {}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, ty)) in self.bindings().into_iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} : {ty}")?;
        }
        Ok(())
    }
}

/// A single proof obligation: prove `target` under `context`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    context: Context,
    target: Expr,
}

impl Goal {
    /// Create a goal.
    pub fn new(context: Context, target: Expr) -> Self {
        Self { context, target }
    }

    /// Hypotheses available for this goal.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Proposition to be proved.
    pub fn target(&self) -> &Expr {
        &self.target
    }

    /// Same context, different target.
    pub fn with_target(&self, target: Expr) -> Self {
        Self {
            context: self.context.clone(),
            target,
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.context.is_empty() {
            write!(f, "{} ", self.context)?;
        }
        write!(f, "⊢ {}", self.target)
    }
}
