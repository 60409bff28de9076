//! Declaration environment and type inference.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::expr::{Expr, Name};
use super::KernelError;
use crate::goal::Context;

/// Global declaration table.
///
/// Cloning is cheap: the table is shared until the next `add_var`, so every
/// worker spawned by `try_for` or `par` can hold its own handle.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    declarations: Arc<BTreeMap<Name, Expr>>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a constant of the given type.
    pub fn add_var(&mut self, name: impl Into<Name>, ty: Expr) -> Result<(), KernelError> {
        let name = name.into();
        if self.declarations.contains_key(&name) {
            return Err(KernelError::AlreadyDeclared(name));
        }
        Arc::make_mut(&mut self.declarations).insert(name, ty);
        Ok(())
    }

    /// Look up the type of a declared constant.
    pub fn find(&self, name: &Name) -> Option<&Expr> {
        self.declarations.get(name)
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Infer the type of `expr` in `ctx`.
    pub fn infer_type(&self, ctx: &Context, expr: &Expr) -> Result<Expr, KernelError> {
        match expr {
            Expr::Bool => Ok(Expr::Bool),
            Expr::True => Ok(Expr::Bool),
            Expr::TrueIntro => Ok(Expr::True),
            Expr::Const(name) => self
                .find(name)
                .cloned()
                .ok_or_else(|| KernelError::UnknownConstant(name.clone())),
            Expr::Local(name) => ctx
                .lookup(name)
                .cloned()
                .ok_or_else(|| KernelError::UnknownLocal(name.clone())),
            Expr::And(lhs, rhs) | Expr::Implies(lhs, rhs) => {
                self.check_proposition(ctx, lhs)?;
                self.check_proposition(ctx, rhs)?;
                Ok(Expr::Bool)
            }
            Expr::Eq(lhs, rhs) => {
                let lhs_ty = self.infer_type(ctx, lhs)?;
                let rhs_ty = self.infer_type(ctx, rhs)?;
                expect_same(&lhs_ty, &rhs_ty)?;
                Ok(Expr::Bool)
            }
            Expr::AndIntro(lhs, rhs) => {
                let lhs_ty = self.infer_type(ctx, lhs)?;
                let rhs_ty = self.infer_type(ctx, rhs)?;
                Ok(Expr::And(Arc::new(lhs_ty), Arc::new(rhs_ty)))
            }
            Expr::Lambda {
                binder,
                domain,
                body,
            } => {
                self.check_proposition(ctx, domain)?;
                let inner = ctx.extend(binder.clone(), (**domain).clone());
                let body_ty = self.infer_type(&inner, body)?;
                Ok(Expr::Implies(domain.clone(), Arc::new(body_ty)))
            }
            Expr::Refl(term) => {
                self.infer_type(ctx, term)?;
                Ok(Expr::Eq(term.clone(), term.clone()))
            }
        }
    }

    fn check_proposition(&self, ctx: &Context, expr: &Expr) -> Result<(), KernelError> {
        match self.infer_type(ctx, expr)? {
            Expr::Bool => Ok(()),
            _ => Err(KernelError::NotAProposition(expr.clone())),
        }
    }
}

fn expect_same(expected: &Expr, actual: &Expr) -> Result<(), KernelError> {
    if expected == actual {
        Ok(())
    } else {
        Err(KernelError::TypeMismatch {
            expected: expected.clone(),
            actual: actual.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::expr::{And, Const, Implies, Local};

    fn env_pq() -> Environment {
        let mut env = Environment::new();
        env.add_var("p", Expr::Bool).unwrap();
        env.add_var("q", Expr::Bool).unwrap();
        env
    }

    #[test]
    fn test_add_var_rejects_duplicates() {
        let mut env = env_pq();
        assert_eq!(env.len(), 2);
        assert!(matches!(
            env.add_var("p", Expr::Bool),
            Err(KernelError::AlreadyDeclared(_))
        ));
    }

    #[test]
    fn test_clone_is_independent() {
        let env = env_pq();
        let mut extended = env.clone();
        extended.add_var("r", Expr::Bool).unwrap();
        assert!(env.find(&Name::new("r")).is_none());
        assert!(extended.find(&Name::new("r")).is_some());
    }

    #[test]
    fn test_infer_propositions() {
        let env = env_pq();
        let ctx = Context::new();
        assert_eq!(env.infer_type(&ctx, &And(Const("p"), Const("q"))).unwrap(), Expr::Bool);
        assert!(matches!(
            env.infer_type(&ctx, &Const("r")),
            Err(KernelError::UnknownConstant(_))
        ));
    }

    #[test]
    fn test_infer_proof_terms() {
        let env = env_pq();
        let ctx = Context::new()
            .extend("H1", Const("p"))
            .extend("H2", Const("q"));

        let proof = Expr::and_intro(Local("H1"), Local("H2"));
        assert_eq!(env.infer_type(&ctx, &proof).unwrap(), And(Const("p"), Const("q")));

        let lambda = Expr::lambda("H".into(), Const("q"), Local("H1"));
        assert_eq!(
            env.infer_type(&Context::new().extend("H1", Const("p")), &lambda).unwrap(),
            Implies(Const("q"), Const("p"))
        );

        assert!(matches!(
            env.infer_type(&Context::new(), &Local("H1")),
            Err(KernelError::UnknownLocal(_))
        ));
    }

    #[test]
    fn test_infer_refl_and_trivial() {
        let env = env_pq();
        let ctx = Context::new();
        assert_eq!(
            env.infer_type(&ctx, &Expr::refl(Const("p"))).unwrap(),
            Expr::equality(Const("p"), Const("p"))
        );
        assert_eq!(env.infer_type(&ctx, &Expr::TrueIntro).unwrap(), Expr::True);
    }

    #[test]
    fn test_lambda_domain_must_be_proposition() {
        let env = env_pq();
        let ctx = Context::new().extend("H1", Const("p"));
        let bad = Expr::lambda("x".into(), Local("H1"), Local("x"));
        assert!(matches!(
            env.infer_type(&ctx, &bad),
            Err(KernelError::NotAProposition(_))
        ));
    }
}
