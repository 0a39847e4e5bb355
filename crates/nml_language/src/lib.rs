//! Lexer, grouper, statement assembler, and resumable VM for NML.
//!
//! The pipeline is line oriented:
//! - [`lexer`] turns one source line into [`Token`]s
//! - [`group`] folds tokens into expressions and statements, splitting verb
//!   calls around their preposition ([`preposition`])
//! - [`compiler`] assembles lines into a block-structured AST
//! - [`vm`] executes the AST one statement per step, suspending whenever it
//!   needs its host

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod compiler;
pub mod group;
pub mod lexer;
pub mod operator;
pub mod preposition;
pub mod token;
pub mod vm;


pub use ast::{AssignOp, Expr, Node, Ref, Statement, Target, Verbcall, find_ins};
pub use compiler::{code_to_ast, compile_expr};
pub use group::{parse_group, parse_statement};
pub use lexer::{Lexer, lex_line, parse_line};
pub use operator::{BinOp, OP_ORDER};
pub use preposition::{PREPOSITIONS, PrepositionMatch, find_prepositions, verbcall_from_line};
pub use token::Token;
pub use vm::{CallArgs, RETURN_LOCAL, Reply, Request, Step, Vm, VmConfig};
