//! Integration tests for the lexer
//!
//! Whole lines as a script author would write them.

use nml_foundation::ObjectId;
use nml_language::{Lexer, Token, lex_line, parse_line};

fn word(w: &str) -> Token {
    Token::Bareword(w.to_string())
}

#[test]
fn lex_assignment_line() {
    let tokens = parse_line("%score += $bonus * 2 ; reward").unwrap();
    assert_eq!(tokens.len(), 6);
    assert!(matches!(&tokens[0], Token::Prop { name, index: None } if name == "score"));
    assert_eq!(tokens[1], word("+="));
    assert!(matches!(&tokens[2], Token::Var { name, index: None } if name == "bonus"));
    assert_eq!(tokens[3], word("*"));
    assert_eq!(tokens[4], Token::Number(2.0));
    assert!(tokens[5].is_comment());
}

#[test]
fn lex_call_with_object_targets() {
    let tokens = parse_line("give 'gold coin' to ##Bob from #c0ffee").unwrap();
    assert_eq!(
        tokens,
        vec![
            word("give"),
            Token::Str("gold coin".into()),
            word("to"),
            Token::ObjectAlias("Bob".into()),
            word("from"),
            Token::Object(ObjectId(0x00c0_ffee)),
        ]
    );
}

#[test]
fn lex_nested_brackets() {
    let tokens = parse_line("$m = [[1 2] (3 + [4])]").unwrap();
    let Token::Array(outer) = &tokens[2] else {
        panic!("expected an array, got {tokens:?}");
    };
    assert_eq!(outer.len(), 2);
    assert!(matches!(&outer[0], Token::Array(inner) if inner.len() == 2));
    assert!(matches!(&outer[1], Token::Group(inner) if inner.len() == 3));
}

#[test]
fn lex_keywords_are_case_sensitive_words() {
    let tokens = parse_line("if True").unwrap();
    assert!(tokens[0].is_word("if"));
    assert_eq!(tokens[1], word("True"));
}

#[test]
fn lexer_struct_matches_helper() {
    let line = "say hi there";
    assert_eq!(
        Lexer::new(line, 4).tokenize().unwrap(),
        lex_line(line, 4).unwrap()
    );
}

#[test]
fn lex_errors_name_their_line() {
    for bad in ["say 'open", "$", "#zz", "[1 2", "(1]"] {
        let err = lex_line(bad, 12).unwrap_err();
        assert_eq!(err.line, 12, "{bad}");
    }
}

#[test]
fn lex_plain_words_numbers_and_quoted_text() {
    assert_eq!(
        parse_line("the quick brown fox").unwrap(),
        vec![word("the"), word("quick"), word("brown"), word("fox")]
    );
    assert_eq!(parse_line("4").unwrap(), vec![Token::Number(4.0)]);
    assert_eq!(
        parse_line("'the quick 4 brown fox'").unwrap(),
        vec![Token::Str("the quick 4 brown fox".into())]
    );
}
