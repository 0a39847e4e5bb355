//! Integration tests for Layer 1: Language
//!
//! Tests for the lexer, the grouper and statement assembler, and the VM.

mod lexer;
mod parser;
mod vm;
