use thiserror::Error;

use crate::ast::*;
use crate::token::{Token, TokenKind, TokenStream, TokenValue};

/// Fatal syntax error at a precise source position. The first error aborts
/// the parse; there is no recovery.
#[derive(Debug, Clone, Error)]
#[error("parse error at {row}:{column}: unexpected {unexpected}{}", expected_note(.expected))]
pub struct ParseError {
    pub row: u32,
    pub column: u32,
    pub unexpected: String,
    pub expected: Option<String>,
}

fn expected_note(expected: &Option<String>) -> String {
    match expected {
        Some(e) => format!(", expected {e}"),
        None => String::new(),
    }
}

impl ParseError {
    fn at(pos: Pos, unexpected: impl Into<String>, expected: Option<&str>) -> Self {
        ParseError {
            row: pos.row,
            column: pos.column,
            unexpected: unexpected.into(),
            expected: expected.map(str::to_string),
        }
    }
}

type PResult<T> = Result<T, ParseError>;

pub struct Parser<'a> {
    toks: TokenStream<'a>,
    last_pos: Pos,
}

impl<'a> Parser<'a> {
    pub fn parse(toks: &'a [Token]) -> PResult<Program> {
        let mut p = Parser {
            toks: TokenStream::new(toks),
            last_pos: Pos { row: 1, column: 1 },
        };
        p.parse_program()
    }

    // ---- stream helpers ----

    fn peek(&self) -> Option<&'a Token> {
        self.toks.peek()
    }

    /// Position of the next token, used to stamp the node about to be parsed.
    fn pos(&self) -> Pos {
        match self.peek() {
            Some(t) => Pos { row: t.row, column: t.column },
            None => self.last_pos,
        }
    }

    fn next_token(&mut self) -> PResult<&'a Token> {
        match self.toks.next() {
            Some(t) => {
                self.last_pos = Pos { row: t.row, column: t.column };
                Ok(t)
            }
            None => Err(ParseError::at(self.last_pos, "end of token stream", None)),
        }
    }

    /// Demand a token of `kind`; cite the mismatch otherwise.
    fn expect(&mut self, kind: TokenKind) -> PResult<&'a Token> {
        let pos = self.pos();
        let t = self.next_token()?;
        if t.is(kind) {
            Ok(t)
        } else {
            Err(ParseError::at(pos, describe(t), Some(kind_name(kind))))
        }
    }

    /// Demand a token of `kind` with a specific lexeme.
    fn expect_rep(&mut self, kind: TokenKind, rep: &str) -> PResult<&'a Token> {
        let pos = self.pos();
        let t = self.next_token()?;
        if t.is_rep(kind, rep) {
            Ok(t)
        } else {
            Err(ParseError::at(pos, describe(t), Some(&format!("'{rep}'"))))
        }
    }

    fn eat_rep(&mut self, kind: TokenKind, rep: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_rep(kind, rep)) {
            let _ = self.toks.next();
            true
        } else {
            false
        }
    }

    /// Apply `f` while the next token satisfies `pred`.
    fn many_while<T>(
        &mut self,
        pred: impl Fn(&Token) -> bool,
        mut f: impl FnMut(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        let mut out = Vec::new();
        while let Some(t) = self.peek() {
            if !pred(t) {
                break;
            }
            out.push(f(self)?);
        }
        Ok(out)
    }

    /// One element, then zero or more `, element` pairs. No trailing comma.
    fn comma_separated<T>(
        &mut self,
        mut f: impl FnMut(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        let mut out = vec![f(self)?];
        while self.eat_rep(TokenKind::Punct, ",") {
            out.push(f(self)?);
        }
        Ok(out)
    }

    // ---- productions ----

    fn parse_program(&mut self) -> PResult<Program> {
        let pos = self.pos();
        let imports =
            self.many_while(|t| t.is_rep(TokenKind::Keyword, "import"), Self::parse_import)?;
        let decls = self.many_while(|t| t.is_rep(TokenKind::Keyword, "let"), Self::parse_decl)?;
        self.expect(TokenKind::Eof)?;
        Ok(Program { imports, decls, pos })
    }

    fn parse_import(&mut self) -> PResult<Import> {
        let pos = self.pos();
        self.expect_rep(TokenKind::Keyword, "import")?;
        let path_tok = self.expect(TokenKind::StrLit)?;
        let path = match &path_tok.value {
            Some(TokenValue::Str(s)) => s.clone(),
            _ => path_tok.rep.clone(),
        };
        self.expect_rep(TokenKind::Punct, "(")?;
        let elems = self.comma_separated(Self::parse_import_elem)?;
        self.expect_rep(TokenKind::Punct, ")")?;
        Ok(Import { path, elems, pos })
    }

    fn parse_import_elem(&mut self) -> PResult<ImportElem> {
        let pos = self.pos();
        let name = self.expect(TokenKind::Ident)?.rep.clone();
        let alias = if self.eat_rep(TokenKind::Keyword, "as") {
            Some(self.expect(TokenKind::Ident)?.rep.clone())
        } else {
            None
        };
        Ok(ImportElem { name, alias, pos })
    }

    fn parse_decl(&mut self) -> PResult<Decl> {
        let pos = self.pos();
        self.expect_rep(TokenKind::Keyword, "let")?;
        let name = self.expect(TokenKind::Ident)?.rep.clone();
        let ty = if self.eat_rep(TokenKind::Punct, ":") {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect_rep(TokenKind::Punct, "=")?;
        let expr = self.parse_expr(-1)?;
        Ok(Decl { name, ty, expr, pos })
    }

    fn parse_type(&mut self) -> PResult<Type> {
        let atom = self.parse_type_atom()?;
        if self.eat_rep(TokenKind::Punct, "->") {
            // Right-associative arrow.
            let ret = self.parse_type()?;
            Ok(Type::Func { param: Box::new(atom), ret: Box::new(ret) })
        } else {
            Ok(atom)
        }
    }

    fn parse_type_atom(&mut self) -> PResult<Type> {
        let pos = self.pos();
        if self.eat_rep(TokenKind::Punct, "[") {
            let elem = self.parse_type()?;
            self.expect_rep(TokenKind::Punct, "]")?;
            return Ok(Type::List(Box::new(elem)));
        }
        if self.eat_rep(TokenKind::Punct, "(") {
            if self.eat_rep(TokenKind::Punct, ")") {
                return Ok(Type::Tuple(Vec::new()));
            }
            let items = self.comma_separated(Self::parse_type)?;
            self.expect_rep(TokenKind::Punct, ")")?;
            return Ok(Type::Tuple(items));
        }
        let t = self.expect(TokenKind::Ident)?;
        match t.rep.as_str() {
            "int" => Ok(Type::Int),
            "float" => Ok(Type::Float),
            "string" => Ok(Type::Str),
            "boolean" => Ok(Type::Bool),
            "char" => Ok(Type::Char),
            "void" => Ok(Type::Void),
            other => Err(ParseError::at(
                pos,
                format!("unknown type '{other}'"),
                Some("type name"),
            )),
        }
    }

    /// Precedence climbing: one non-binary operand, then operators binding
    /// strictly tighter than `min_prec`. Recursing at the operator's own
    /// precedence keeps each class left-associative.
    fn parse_expr(&mut self, min_prec: i32) -> PResult<Expr> {
        let mut left = self.parse_non_binary()?;
        while let Some(t) = self.peek() {
            if !t.is(TokenKind::Operator) {
                break;
            }
            match BinaryOp::from_rep(&t.rep) {
                Some(op) if op.precedence() > min_prec => {
                    self.next_token()?;
                    let rhs = self.parse_expr(op.precedence())?;
                    let pos = left.pos;
                    left = Expr::new(
                        ExprKind::Binary { op, lhs: Box::new(left), rhs: Box::new(rhs) },
                        pos,
                    );
                }
                Some(_) => break,
                None => {
                    return Err(ParseError::at(
                        Pos { row: t.row, column: t.column },
                        format!("non-binary operator '{}'", t.rep),
                        None,
                    ))
                }
            }
        }
        Ok(left)
    }

    fn parse_non_binary(&mut self) -> PResult<Expr> {
        let pos = self.pos();
        if let Some(t) = self.peek() {
            if t.is(TokenKind::Operator) {
                let Some(op) = UnaryOp::from_rep(&t.rep) else {
                    return Err(ParseError::at(
                        pos,
                        format!("non-unary operator '{}'", t.rep),
                        Some("expression"),
                    ));
                };
                self.next_token()?;
                let rhs = self.parse_non_binary()?;
                return Ok(Expr::new(ExprKind::Unary { op, rhs: Box::new(rhs) }, pos));
            }
            if t.is_rep(TokenKind::Keyword, "fn") {
                return self.parse_fn_expr();
            }
        }
        self.parse_prim()
    }

    fn parse_fn_expr(&mut self) -> PResult<Expr> {
        let pos = self.pos();
        self.expect_rep(TokenKind::Keyword, "fn")?;
        self.expect_rep(TokenKind::Punct, "(")?;
        let params = if self.eat_rep(TokenKind::Punct, ")") {
            Vec::new()
        } else {
            let params = self.comma_separated(Self::parse_param)?;
            self.expect_rep(TokenKind::Punct, ")")?;
            params
        };
        let ret = self.parse_type()?;
        let body = if self.peek().is_some_and(|t| t.is_rep(TokenKind::Punct, "{")) {
            FnBody::Block(self.parse_block()?)
        } else {
            FnBody::Expr(Box::new(self.parse_expr(-1)?))
        };
        Ok(Expr::new(ExprKind::Func { params, ret, body }, pos))
    }

    fn parse_param(&mut self) -> PResult<Param> {
        let pos = self.pos();
        let name = self.expect(TokenKind::Ident)?.rep.clone();
        let ty = self.parse_type()?;
        Ok(Param { name, ty, pos })
    }

    fn parse_block(&mut self) -> PResult<Block> {
        let pos = self.pos();
        self.expect_rep(TokenKind::Punct, "{")?;
        let mut bodies = Vec::new();
        while let Some(t) = self.peek() {
            if t.is_rep(TokenKind::Punct, "}") {
                break;
            }
            if t.is_rep(TokenKind::Keyword, "let") {
                bodies.push(BlockItem::Decl(self.parse_decl()?));
            } else {
                bodies.push(BlockItem::Expr(self.parse_expr(-1)?));
            }
        }
        self.expect_rep(TokenKind::Punct, "}")?;
        let return_void = !matches!(bodies.last(), Some(BlockItem::Expr(_)));
        Ok(Block { bodies, return_void, pos })
    }

    fn parse_prim(&mut self) -> PResult<Expr> {
        let pos = self.pos();
        let Some(t) = self.peek() else {
            return Err(ParseError::at(pos, "end of token stream", Some("expression")));
        };
        let mut expr = match t.kind {
            TokenKind::IntLit
            | TokenKind::FloatLit
            | TokenKind::StrLit
            | TokenKind::BoolLit
            | TokenKind::CharLit => {
                let t = self.next_token()?;
                Expr::new(ExprKind::Lit(literal_of(t)), pos)
            }
            TokenKind::Ident => {
                let t = self.next_token()?;
                Expr::new(ExprKind::Ident(t.rep.clone()), pos)
            }
            TokenKind::Punct if t.rep == "(" => self.parse_tuple_expr()?,
            TokenKind::Punct if t.rep == "[" => self.parse_list_expr()?,
            _ => return Err(ParseError::at(pos, describe(t), Some("expression"))),
        };
        // A parenthesized argument tuple applies the expression as a callee.
        while self.peek().is_some_and(|t| t.is_rep(TokenKind::Punct, "(")) {
            let args = self.parse_tuple_expr()?;
            expr = Expr::new(
                ExprKind::Call { func: Box::new(expr), args: Box::new(args) },
                pos,
            );
        }
        Ok(expr)
    }

    fn parse_tuple_expr(&mut self) -> PResult<Expr> {
        let pos = self.pos();
        self.expect_rep(TokenKind::Punct, "(")?;
        if self.eat_rep(TokenKind::Punct, ")") {
            return Ok(Expr::new(ExprKind::Tuple(Vec::new()), pos));
        }
        let items = self.comma_separated(|p| p.parse_expr(-1))?;
        self.expect_rep(TokenKind::Punct, ")")?;
        Ok(Expr::new(ExprKind::Tuple(items), pos))
    }

    fn parse_list_expr(&mut self) -> PResult<Expr> {
        let pos = self.pos();
        self.expect_rep(TokenKind::Punct, "[")?;
        if self.eat_rep(TokenKind::Punct, "]") {
            return Ok(Expr::new(ExprKind::List(Vec::new()), pos));
        }
        let elems = self.comma_separated(|p| p.parse_expr(-1))?;
        self.expect_rep(TokenKind::Punct, "]")?;
        Ok(Expr::new(ExprKind::List(elems), pos))
    }
}

fn literal_of(t: &Token) -> Literal {
    let rep = t.rep.clone();
    match &t.value {
        Some(TokenValue::Int(v)) => Literal::Int { rep, value: *v },
        Some(TokenValue::Float(v)) => Literal::Float { rep, value: *v },
        Some(TokenValue::Str(v)) => Literal::Str { rep, value: v.clone() },
        Some(TokenValue::Bool(v)) => Literal::Bool { rep, value: *v },
        Some(TokenValue::Char(v)) => Literal::Char { rep, value: *v },
        None => Literal::Str { rep: rep.clone(), value: rep },
    }
}

fn describe(t: &Token) -> String {
    if t.is(TokenKind::Eof) {
        "end of input".to_string()
    } else {
        format!("'{}'", t.rep)
    }
}

fn kind_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Keyword => "keyword",
        TokenKind::Ident => "identifier",
        TokenKind::IntLit => "int literal",
        TokenKind::FloatLit => "float literal",
        TokenKind::StrLit => "string literal",
        TokenKind::BoolLit => "bool literal",
        TokenKind::CharLit => "char literal",
        TokenKind::Operator => "operator",
        TokenKind::Punct => "punctuation",
        TokenKind::Eof => "end of input",
    }
}
