//! Names and expressions.
//!
//! The term language is deliberately small: propositional formulas
//! (`And`, `Implies`, `Eq`, `True`) over declared constants, and the proof
//! terms that inhabit them. Subterms are shared through `Arc`, so cloning an
//! expression is cheap and goals branching from a common ancestor share their
//! targets.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A hierarchical name such as `pp.colors` or `H1`.
///
/// Serialized as its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Arc<str>);

impl Name {
    /// Create a name from its textual form.
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(Arc::from(text.as_ref()))
    }

    /// Create a dotted name from its components.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = parts
            .into_iter()
            .map(|part| part.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self::new(joined)
    }

    /// Textual form of the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Components of a dotted name.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Append a numeric suffix, used to build fresh hypothesis names.
    pub fn with_suffix(&self, index: usize) -> Self {
        Self::new(format!("{}{}", self.0, index))
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        Self(Arc::from(text))
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Name::from)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An expression: either a proposition or a proof term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// The sort of propositions.
    Bool,
    /// A constant declared in the environment.
    Const(Name),
    /// A hypothesis from the local context.
    Local(Name),
    /// Conjunction.
    And(Arc<Expr>, Arc<Expr>),
    /// Implication.
    Implies(Arc<Expr>, Arc<Expr>),
    /// Equality between two terms of the same type.
    Eq(Arc<Expr>, Arc<Expr>),
    /// The trivially true proposition.
    True,
    /// Proof of `And(a, b)` from proofs of `a` and `b`.
    AndIntro(Arc<Expr>, Arc<Expr>),
    /// Proof of `Implies(a, b)` binding a hypothesis of type `a`.
    Lambda {
        binder: Name,
        domain: Arc<Expr>,
        body: Arc<Expr>,
    },
    /// Proof of `Eq(a, a)`.
    Refl(Arc<Expr>),
    /// Proof of `True`.
    TrueIntro,
}

/// Shorthand for `Expr::Const`.
#[allow(non_snake_case)]
pub fn Const(name: impl Into<Name>) -> Expr {
    Expr::Const(name.into())
}

/// Shorthand for `Expr::Local`.
#[allow(non_snake_case)]
pub fn Local(name: impl Into<Name>) -> Expr {
    Expr::Local(name.into())
}

/// Shorthand for `Expr::And`.
#[allow(non_snake_case)]
pub fn And(lhs: Expr, rhs: Expr) -> Expr {
    Expr::And(Arc::new(lhs), Arc::new(rhs))
}

/// Shorthand for `Expr::Implies`.
#[allow(non_snake_case)]
pub fn Implies(lhs: Expr, rhs: Expr) -> Expr {
    Expr::Implies(Arc::new(lhs), Arc::new(rhs))
}

impl Expr {
    /// Split a conjunction into its two sides.
    pub fn as_and(&self) -> Option<(&Expr, &Expr)> {
        match self {
            Expr::And(lhs, rhs) => Some((&**lhs, &**rhs)),
            _ => None,
        }
    }

    /// Split an implication into premise and conclusion.
    pub fn as_implies(&self) -> Option<(&Expr, &Expr)> {
        match self {
            Expr::Implies(lhs, rhs) => Some((&**lhs, &**rhs)),
            _ => None,
        }
    }

    /// Build the proposition `lhs = rhs`.
    pub fn equality(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Eq(Arc::new(lhs), Arc::new(rhs))
    }

    /// Build a proof of `And(a, b)` from proofs of `a` and `b`.
    pub fn and_intro(left: Expr, right: Expr) -> Expr {
        Expr::AndIntro(Arc::new(left), Arc::new(right))
    }

    /// Build a proof of `Implies(domain, _)` by abstracting `binder` in `body`.
    pub fn lambda(binder: Name, domain: Expr, body: Expr) -> Expr {
        Expr::Lambda {
            binder,
            domain: Arc::new(domain),
            body: Arc::new(body),
        }
    }

    /// Build a reflexivity proof of `Eq(term, term)`.
    pub fn refl(term: Expr) -> Expr {
        Expr::Refl(Arc::new(term))
    }

    fn is_atomic(&self) -> bool {
        matches!(
            self,
            Expr::Bool | Expr::Const(_) | Expr::Local(_) | Expr::True | Expr::TrueIntro
        )
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_atomic() {
            write!(f, "{self}")
        } else {
            write!(f, "({self})")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Bool => f.write_str("Bool"),
            Expr::Const(name) | Expr::Local(name) => write!(f, "{name}"),
            Expr::And(lhs, rhs) => {
                lhs.fmt_operand(f)?;
                f.write_str(" ∧ ")?;
                rhs.fmt_operand(f)
            }
            Expr::Implies(lhs, rhs) => {
                lhs.fmt_operand(f)?;
                f.write_str(" → ")?;
                rhs.fmt_operand(f)
            }
            Expr::Eq(lhs, rhs) => {
                lhs.fmt_operand(f)?;
                f.write_str(" = ")?;
                rhs.fmt_operand(f)
            }
            Expr::True => f.write_str("true"),
            Expr::AndIntro(lhs, rhs) => {
                f.write_str("and_intro ")?;
                lhs.fmt_operand(f)?;
                f.write_str(" ")?;
                rhs.fmt_operand(f)
            }
            Expr::Lambda {
                binder,
                domain,
                body,
            } => write!(f, "fun {binder} : {domain}, {body}"),
            Expr::Refl(term) => {
                f.write_str("refl ")?;
                term.fmt_operand(f)
            }
            Expr::TrueIntro => f.write_str("trivial"),
        }
    }
}
