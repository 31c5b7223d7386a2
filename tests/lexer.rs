use blue::{
    error::LexErrorKind,
    interpreter::{
        lexer::tokenize,
        token::{Token, TokenKind},
    },
};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source, "test").unwrap_or_else(|e| panic!("{source:?} failed to lex: {e}"))
                            .into_iter()
                            .map(|t| t.kind)
                            .collect()
}

fn tokens(source: &str) -> Vec<Token> {
    tokenize(source, "test").unwrap_or_else(|e| panic!("{source:?} failed to lex: {e}"))
}

#[test]
fn numeric_literal_forms() {
    assert_eq!(kinds("123 1_000 1.5 2.0e-3 0xFF 0o77 0b1010 0u42"),
               [TokenKind::Int,
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Hex,
                TokenKind::Octal,
                TokenKind::Binary,
                TokenKind::UInt]);
}

#[test]
fn keywords_and_identifiers() {
    assert_eq!(kinds("var val const fun x ?y _z"),
               [TokenKind::Var,
                TokenKind::Val,
                TokenKind::Const,
                TokenKind::Fun,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident]);
}

#[test]
fn compound_operators_are_single_tokens() {
    assert_eq!(kinds("a //= 2 ** 3 ..< 4 >>= 1"),
               [TokenKind::Ident,
                TokenKind::FloorDivAssign,
                TokenKind::Int,
                TokenKind::Pow,
                TokenKind::Int,
                TokenKind::DotDotLt,
                TokenKind::Int,
                TokenKind::ShrAssign,
                TokenKind::Int]);
}

#[test]
fn positions_are_one_indexed_and_count_characters() {
    let tokens = tokens("val é = 1\n  x");
    let x = tokens.last().unwrap();
    assert_eq!((x.position.line, x.position.column), (2, 3));
    let one = &tokens[3];
    assert_eq!(one.literal, "1");
    assert_eq!(one.position.column, 9);
}

#[test]
fn comments_are_skipped() {
    assert_eq!(kinds("1 # one\n### several\nlines ###\n2"), [TokenKind::Int, TokenKind::Int]);
}

#[test]
fn string_literals_are_unescaped() {
    let tokens = tokens(r#""a\tb\x41" 'q' """raw\n""""#);
    assert_eq!(tokens[0].literal, "a\tbA");
    assert_eq!(tokens[1].literal, "q");
    assert_eq!(tokens[2].kind, TokenKind::RawString);
    assert_eq!(tokens[2].literal, r"raw\n");
}

#[test]
fn quotes_inside_interpolations_do_not_end_the_string() {
    let tokens = tokens(r##""#{m["a"]}" 'x#{'y'}' "#{"\"#{1}"}" z"##);
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].literal, r##"#{m["a"]}"##);
    assert_eq!(tokens[1].literal, "x#{'y'}");
    assert_eq!(tokens[2].literal, r##"#{"\"#{1}"}"##);
    assert_eq!(tokens[3].kind, TokenKind::Ident);
}

#[test]
fn import_paths_are_one_token() {
    let tokens = tokens("import std.text.utils\nx");
    assert_eq!(tokens[1].kind, TokenKind::ImportPath);
    assert_eq!(tokens[1].literal, "std.text.utils");
    assert_eq!(tokens[2].kind, TokenKind::Ident);
}

#[test]
fn lex_errors_carry_kind_and_position() {
    let error = tokenize("val s = \"open", "test").unwrap_err();
    assert_eq!(error.kind, LexErrorKind::UnterminatedString);
    assert_eq!((error.position.line, error.position.column), (1, 9));

    let error = tokenize("1 $ 2", "test").unwrap_err();
    assert_eq!(error.kind, LexErrorKind::IllegalCharacter);

    let error = tokenize("import\n", "test").unwrap_err();
    assert_eq!(error.kind, LexErrorKind::MissingImportPath);
}
