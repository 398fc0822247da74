pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;
mod annotate;

use anyhow::Result;

pub fn parse_source(src: &str) -> Result<ast::Program> {
    let tokens = lexer::Lexer::tokenize(src)?;
    Ok(parser::Parser::parse(&tokens)?)
}

/// Parse and fill resolved types, ready for code generation.
pub fn parse_and_annotate(src: &str) -> Result<ast::Program> {
    let mut program = parse_source(src)?;
    annotate::annotate(&mut program)?;
    Ok(program)
}
