//! Resolved-type annotation.
//!
//! Runs between parse and code generation and fills the `ty` slot of every
//! expression it can decide, so the backend can pick instruction types and
//! recognize function-typed bindings. Names introduced by `import` are bound
//! but carry no type; expressions involving them stay unannotated.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};

use crate::ast::*;

pub fn annotate(program: &mut Program) -> Result<()> {
    let mut cx = Annotator::new();
    for imp in &program.imports {
        for elem in &imp.elems {
            let name = elem.alias.as_ref().unwrap_or(&elem.name);
            cx.imported.insert(name.clone());
        }
    }
    for decl in &mut program.decls {
        cx.annotate_decl(decl)?;
    }
    Ok(())
}

struct Annotator {
    /// Innermost scope last. A binding of `None` means "in scope, type unknown".
    scopes: Vec<HashMap<String, Option<Type>>>,
    imported: HashSet<String>,
}

impl Annotator {
    fn new() -> Self {
        Annotator { scopes: vec![HashMap::new()], imported: HashSet::new() }
    }

    fn bind(&mut self, name: String, ty: Option<Type>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, ty);
        }
    }

    fn lookup(&self, name: &str) -> Option<&Option<Type>> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn annotate_decl(&mut self, decl: &mut Decl) -> Result<()> {
        self.annotate_expr(&mut decl.expr)?;
        if let (Some(declared), Some(inferred)) = (&decl.ty, &decl.expr.ty) {
            if declared != inferred {
                bail!(
                    "{}:{}: initializer of '{}' has type {:?}, declared {:?}",
                    decl.pos.row,
                    decl.pos.column,
                    decl.name,
                    inferred,
                    declared
                );
            }
        }
        let bound = decl.ty.clone().or_else(|| decl.expr.ty.clone());
        self.bind(decl.name.clone(), bound);
        Ok(())
    }

    fn annotate_expr(&mut self, expr: &mut Expr) -> Result<()> {
        let ty = match &mut expr.kind {
            ExprKind::Lit(lit) => Some(lit.ty()),
            ExprKind::Ident(name) => match self.lookup(name) {
                Some(binding) => binding.clone(),
                None if self.imported.contains(name.as_str()) => None,
                None => bail!(
                    "{}:{}: unknown identifier '{}'",
                    expr.pos.row,
                    expr.pos.column,
                    name
                ),
            },
            ExprKind::Tuple(items) => {
                for item in items.iter_mut() {
                    self.annotate_expr(item)?;
                }
                items
                    .iter()
                    .map(|i| i.ty.clone())
                    .collect::<Option<Vec<_>>>()
                    .map(Type::Tuple)
            }
            ExprKind::List(elems) => {
                for elem in elems.iter_mut() {
                    self.annotate_expr(elem)?;
                }
                elems
                    .first()
                    .and_then(|e| e.ty.clone())
                    .map(|t| Type::List(Box::new(t)))
            }
            ExprKind::Func { params, ret, body } => {
                self.scopes.push(HashMap::new());
                for p in params.iter() {
                    self.bind(p.name.clone(), Some(p.ty.clone()));
                }
                match body {
                    FnBody::Block(block) => self.annotate_block(block, ret)?,
                    FnBody::Expr(e) => {
                        self.annotate_expr(e)?;
                        check_result(e.ty.as_ref(), ret, e.pos)?;
                    }
                }
                self.scopes.pop();
                Some(func_type(params, ret))
            }
            ExprKind::Call { func, args } => {
                self.annotate_expr(func)?;
                self.annotate_expr(args)?;
                let applied = match &args.kind {
                    ExprKind::Tuple(items) if !items.is_empty() => items.len(),
                    _ => 1,
                };
                let mut ty = func.ty.clone();
                for _ in 0..applied {
                    ty = match ty {
                        Some(Type::Func { ret, .. }) => Some(*ret),
                        _ => None,
                    };
                }
                ty
            }
            ExprKind::Unary { op, rhs } => {
                self.annotate_expr(rhs)?;
                match op {
                    UnaryOp::Not => Some(Type::Bool),
                    UnaryOp::Plus | UnaryOp::Minus => rhs.ty.clone(),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.annotate_expr(lhs)?;
                self.annotate_expr(rhs)?;
                if let (Some(l), Some(r)) = (&lhs.ty, &rhs.ty) {
                    if l != r {
                        bail!(
                            "{}:{}: operands have mismatched types {:?} and {:?}",
                            expr.pos.row,
                            expr.pos.column,
                            l,
                            r
                        );
                    }
                }
                if op.yields_bool() {
                    Some(Type::Bool)
                } else {
                    lhs.ty.clone().or_else(|| rhs.ty.clone())
                }
            }
        };
        expr.ty = ty;
        Ok(())
    }

    fn annotate_block(&mut self, block: &mut Block, ret: &Type) -> Result<()> {
        self.scopes.push(HashMap::new());
        let res = (|| {
            for item in block.bodies.iter_mut() {
                match item {
                    BlockItem::Decl(decl) => self.annotate_decl(decl)?,
                    BlockItem::Expr(expr) => self.annotate_expr(expr)?,
                }
            }
            if !block.return_void {
                if let Some(BlockItem::Expr(last)) = block.bodies.last() {
                    check_result(last.ty.as_ref(), ret, last.pos)?;
                }
            }
            Ok(())
        })();
        self.scopes.pop();
        res
    }
}

/// Right-fold `p1 -> ... -> pk -> ret`; a zero-parameter literal is `void -> ret`.
fn func_type(params: &[Param], ret: &Type) -> Type {
    if params.is_empty() {
        return Type::Func { param: Box::new(Type::Void), ret: Box::new(ret.clone()) };
    }
    params.iter().rev().fold(ret.clone(), |acc, p| Type::Func {
        param: Box::new(p.ty.clone()),
        ret: Box::new(acc),
    })
}

fn check_result(found: Option<&Type>, expected: &Type, pos: Pos) -> Result<()> {
    if let Some(found) = found {
        if *expected != Type::Void && found != expected {
            bail!(
                "{}:{}: body yields {:?}, function returns {:?}",
                pos.row,
                pos.column,
                found,
                expected
            );
        }
    }
    Ok(())
}
