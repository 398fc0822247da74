//! WebAssembly text backend.
//!
//! Emission produces a flat sequence of s-expression fragments; joined with
//! single spaces they form one well-formed `(module ...)`. Constructs with no
//! wasm lowering yet (string values, aggregates, indirect calls) produce no
//! fragments and a warning.

use anyhow::{anyhow, Result};
use log::warn;

use reed_codegen::{CodeGenerator, Target, TargetFormat};
use reed_frontend::ast::{
    BinaryOp, Block, BlockItem, Decl, Expr, ExprKind, FnBody, Literal, Param, Program, Type,
    UnaryOp,
};

mod scopes;
pub use scopes::Scopes;

/// Name reserved for the synthesized initializer function. User names never
/// contain `/` at module scope, so it cannot collide.
const START_NAME: &str = "/start";

pub struct WatCodegen {
    target: Target,
    export: String,
}

impl WatCodegen {
    pub fn new(export: impl Into<String>) -> Self {
        WatCodegen {
            target: Target { format: TargetFormat::Wat },
            export: export.into(),
        }
    }
}

impl CodeGenerator for WatCodegen {
    fn target(&self) -> &Target {
        &self.target
    }

    fn generate(&mut self, program: &Program) -> Result<String> {
        let mut em = Emitter { scopes: Scopes::new() };
        em.emit_module(program, &self.export)
    }
}

struct Emitter {
    scopes: Scopes,
}

impl Emitter {
    fn emit_module(&mut self, program: &Program, export: &str) -> Result<String> {
        let mut parts = vec!["module".to_string()];
        for decl in &program.decls {
            self.emit_top_decl(decl, &mut parts);
        }
        if !self.scopes.initializers().is_empty() {
            parts.push(self.emit_start());
            parts.push(format!("(start ${START_NAME})"));
        }
        let name = self
            .scopes
            .global_name(export)
            .ok_or_else(|| anyhow!("export '{export}' is not defined at module scope"))?;
        parts.push(format!("(export \"{export}\" (func ${name}))"));
        Ok(format!("({})", parts.join(" ")))
    }

    fn emit_top_decl(&mut self, decl: &Decl, parts: &mut Vec<String>) {
        match &decl.expr.kind {
            ExprKind::Func { params, ret, body } => {
                parts.push(self.emit_function(decl, params, ret, body));
            }
            // Binding an existing function under a new name emits nothing.
            ExprKind::Ident(target) if resolved_ty(decl).is_some_and(Type::is_func) => {
                self.scopes.push_alias(&decl.name, target);
            }
            _ => self.emit_global(decl, parts),
        }
    }

    fn emit_function(&mut self, decl: &Decl, params: &[Param], ret: &Type, body: &FnBody) -> String {
        let fname = self.scopes.push_name(&decl.name);
        let mut parts = vec!["func".to_string(), format!("${fname}")];
        self.scopes.enter_function();
        for p in params {
            let pname = self.scopes.push_name(&p.name);
            match wat_type(&p.ty) {
                Some(w) => parts.push(format!("(param ${pname} {w})")),
                None => warn!(
                    "{}:{}: parameter '{}' has no wasm lowering",
                    p.pos.row, p.pos.column, p.name
                ),
            }
        }
        if let Some(w) = wat_type(ret) {
            parts.push(format!("(result {w})"));
        }
        let mut instrs = Vec::new();
        match body {
            FnBody::Block(block) => self.emit_block(block, &mut instrs),
            FnBody::Expr(expr) => self.emit_expr(expr, &mut instrs),
        }
        instrs.push("(return)".to_string());
        parts.extend(instrs);
        self.scopes.leave_function();
        format!("({})", parts.join(" "))
    }

    fn emit_global(&mut self, decl: &Decl, parts: &mut Vec<String>) {
        let Some(w) = resolved_ty(decl).and_then(wat_type) else {
            warn!(
                "{}:{}: global '{}' has no wasm lowering",
                decl.pos.row, decl.pos.column, decl.name
            );
            return;
        };
        let name = self.scopes.push_name(&decl.name);
        if let ExprKind::Lit(lit) = &decl.expr.kind {
            if let Some(value) = lit_const(lit) {
                parts.push(format!("(global ${name} {w} {value})"));
            } else {
                // String data layout is reserved; keep the slot, leave it zero.
                warn!(
                    "{}:{}: string initializer for '{}' is not lowered yet",
                    decl.pos.row, decl.pos.column, decl.name
                );
                parts.push(format!("(global ${name} (mut {w}) ({w}.const 0))"));
            }
            return;
        }
        parts.push(format!("(global ${name} (mut {w}) ({w}.const 0))"));
        self.scopes.push_initializer(&name, decl.expr.clone());
    }

    fn emit_start(&self) -> String {
        let mut parts = vec!["func".to_string(), format!("${START_NAME}")];
        let mut instrs = Vec::new();
        for (name, expr) in self.scopes.initializers() {
            self.emit_expr(expr, &mut instrs);
            instrs.push(format!("(set_global ${name})"));
        }
        parts.extend(instrs);
        format!("({})", parts.join(" "))
    }

    /// Two passes: wasm requires every `local` declaration before the first
    /// instruction, so slots are allocated up front and initializers run in
    /// source order afterwards.
    fn emit_block(&mut self, block: &Block, out: &mut Vec<String>) {
        self.scopes.enter_block();
        for item in &block.bodies {
            if let BlockItem::Decl(decl) = item {
                match decl_slot_type(decl) {
                    Some(w) => {
                        let name = self.scopes.push_name(&decl.name);
                        out.push(format!("(local ${name} {w})"));
                    }
                    None if is_alias_decl(decl) => {}
                    None => warn!(
                        "{}:{}: local '{}' has no wasm lowering",
                        decl.pos.row, decl.pos.column, decl.name
                    ),
                }
            }
        }
        for item in &block.bodies {
            match item {
                BlockItem::Decl(decl) => {
                    if is_alias_decl(decl) {
                        if let ExprKind::Ident(target) = &decl.expr.kind {
                            self.scopes.push_alias(&decl.name, target);
                        }
                    } else if decl_slot_type(decl).is_some() {
                        self.emit_expr(&decl.expr, out);
                        if let Some(name) = self.scopes.local_name(&decl.name) {
                            out.push(format!("(set_local ${name})"));
                        }
                    }
                }
                BlockItem::Expr(expr) => self.emit_expr(expr, out),
            }
        }
        self.scopes.leave_block();
    }

    /// Post-order stack-machine lowering.
    fn emit_expr(&self, expr: &Expr, out: &mut Vec<String>) {
        match &expr.kind {
            ExprKind::Lit(lit) => match lit_const(lit) {
                Some(v) => out.push(v),
                None => warn!(
                    "{}:{}: string literals are not lowered yet",
                    expr.pos.row, expr.pos.column
                ),
            },
            ExprKind::Ident(name) => {
                if let Some(n) = self.scopes.local_name(name) {
                    out.push(format!("(get_local ${n})"));
                } else if let Some(n) = self.scopes.global_name(name) {
                    out.push(format!("(get_global ${n})"));
                } else {
                    warn!(
                        "{}:{}: unresolved name '{}'",
                        expr.pos.row, expr.pos.column, name
                    );
                }
            }
            ExprKind::Call { func, args } => {
                let ExprKind::Ident(fname) = &func.kind else {
                    warn!(
                        "{}:{}: only direct calls to named functions are lowered",
                        expr.pos.row, expr.pos.column
                    );
                    return;
                };
                let Some(target) = self.scopes.global_name(fname) else {
                    warn!(
                        "{}:{}: unresolved callee '{}'",
                        expr.pos.row, expr.pos.column, fname
                    );
                    return;
                };
                match &args.kind {
                    ExprKind::Tuple(items) => {
                        for item in items {
                            self.emit_expr(item, out);
                        }
                    }
                    _ => self.emit_expr(args, out),
                }
                out.push(format!("(call ${target})"));
            }
            ExprKind::Tuple(_) | ExprKind::List(_) => warn!(
                "{}:{}: aggregate values are not lowered yet",
                expr.pos.row, expr.pos.column
            ),
            ExprKind::Func { .. } => warn!(
                "{}:{}: nested function literals are not lowered",
                expr.pos.row, expr.pos.column
            ),
            ExprKind::Unary { op, rhs } => match op {
                UnaryOp::Plus => self.emit_expr(rhs, out),
                UnaryOp::Minus if is_float(rhs) => {
                    self.emit_expr(rhs, out);
                    out.push("(f64.neg)".to_string());
                }
                UnaryOp::Minus => {
                    out.push("(i32.const 0)".to_string());
                    self.emit_expr(rhs, out);
                    out.push("(i32.sub)".to_string());
                }
                UnaryOp::Not => {
                    self.emit_expr(rhs, out);
                    out.push("(i32.eqz)".to_string());
                }
            },
            ExprKind::Binary { op, lhs, rhs } => {
                // Operands agree after annotation. Comparisons resolve to
                // bool, so only the children still carry the operand type.
                let float = if op.yields_bool() {
                    is_float(lhs)
                } else {
                    expr.ty == Some(Type::Float)
                };
                let Some(instr) = binary_instr(*op, float) else {
                    warn!(
                        "{}:{}: operator has no wasm lowering for these operands",
                        expr.pos.row, expr.pos.column
                    );
                    return;
                };
                self.emit_expr(lhs, out);
                self.emit_expr(rhs, out);
                out.push(format!("({instr})"));
            }
        }
    }
}

fn resolved_ty(decl: &Decl) -> Option<&Type> {
    decl.expr.ty.as_ref().or(decl.ty.as_ref())
}

fn is_alias_decl(decl: &Decl) -> bool {
    matches!(decl.expr.kind, ExprKind::Ident(_)) && resolved_ty(decl).is_some_and(Type::is_func)
}

fn decl_slot_type(decl: &Decl) -> Option<&'static str> {
    if is_alias_decl(decl) {
        return None;
    }
    resolved_ty(decl).and_then(wat_type)
}

fn is_float(expr: &Expr) -> bool {
    expr.ty == Some(Type::Float)
}

fn wat_type(ty: &Type) -> Option<&'static str> {
    match ty {
        Type::Int | Type::Str | Type::Bool | Type::Char => Some("i32"),
        Type::Float => Some("f64"),
        Type::Void => None,
        Type::List(_) | Type::Tuple(_) | Type::Func { .. } => None,
    }
}

fn lit_const(lit: &Literal) -> Option<String> {
    match lit {
        Literal::Int { rep, .. } => Some(format!("(i32.const {rep})")),
        Literal::Float { rep, .. } => Some(format!("(f64.const {rep})")),
        Literal::Bool { value, .. } => Some(format!("(i32.const {})", i32::from(*value))),
        Literal::Char { value, .. } => Some(format!("(i32.const {})", *value as u32)),
        Literal::Str { .. } => None,
    }
}

fn binary_instr(op: BinaryOp, float: bool) -> Option<&'static str> {
    if float {
        return match op {
            BinaryOp::Add => Some("f64.add"),
            BinaryOp::Sub => Some("f64.sub"),
            BinaryOp::Mul => Some("f64.mul"),
            BinaryOp::Div => Some("f64.div"),
            BinaryOp::Eq => Some("f64.eq"),
            BinaryOp::Ne => Some("f64.ne"),
            BinaryOp::Lt => Some("f64.lt"),
            BinaryOp::Le => Some("f64.le"),
            BinaryOp::Gt => Some("f64.gt"),
            BinaryOp::Ge => Some("f64.ge"),
            _ => None,
        };
    }
    match op {
        BinaryOp::Add => Some("i32.add"),
        BinaryOp::Sub => Some("i32.sub"),
        BinaryOp::Mul => Some("i32.mul"),
        BinaryOp::Div => Some("i32.div_s"),
        BinaryOp::Rem => Some("i32.rem_s"),
        BinaryOp::BitAnd | BinaryOp::And => Some("i32.and"),
        BinaryOp::BitOr | BinaryOp::Or => Some("i32.or"),
        BinaryOp::BitXor => Some("i32.xor"),
        BinaryOp::Eq => Some("i32.eq"),
        BinaryOp::Ne => Some("i32.ne"),
        BinaryOp::Lt => Some("i32.lt_s"),
        BinaryOp::Le => Some("i32.le_s"),
        BinaryOp::Gt => Some("i32.gt_s"),
        BinaryOp::Ge => Some("i32.ge_s"),
    }
}
