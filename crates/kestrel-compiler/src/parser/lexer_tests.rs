use super::lexer::{TokenKind, lex, token_text};

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source)
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| !k.is_trivia())
        .collect()
}

#[test]
fn keywords_win_over_identifiers() {
    use TokenKind::*;
    assert_eq!(
        kinds("int integer while whiled do"),
        vec![KwInt, Ident, KwWhile, Ident, KwDo]
    );
}

#[test]
fn numbers() {
    let source = "42 1.5 7.";
    let tokens: Vec<_> = lex(source)
        .into_iter()
        .filter(|t| !t.kind.is_trivia())
        .collect();

    assert_eq!(tokens[0].kind, TokenKind::IntLit);
    assert_eq!(token_text(source, &tokens[0]), "42");
    assert_eq!(tokens[1].kind, TokenKind::FloatLit);
    assert_eq!(token_text(source, &tokens[1]), "1.5");
    assert_eq!(tokens[2].kind, TokenKind::IntLit);
    assert_eq!(tokens[3].kind, TokenKind::Garbage);
}

#[test]
fn two_char_operators() {
    use TokenKind::*;
    assert_eq!(
        kinds("a<=b != !c && d || e == f"),
        vec![
            Ident, LessEq, Ident, NotEq, Bang, Ident, AndAnd, Ident, OrOr, Ident, EqEq, Ident
        ]
    );
}

#[test]
fn comments_are_trivia() {
    use TokenKind::*;
    let tokens = lex("x = 1; // set x\n/* block\n comment */ print x;");

    assert_eq!(tokens[7].kind, LineComment);
    assert_eq!(
        kinds("x = 1; // set x\n/* block\n comment */ print x;"),
        vec![Ident, Equals, IntLit, Semicolon, KwPrint, Ident, Semicolon]
    );
}

#[test]
fn garbage_is_coalesced() {
    let source = "x = @#$ 1;";
    let tokens = lex(source);
    let garbage: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Garbage)
        .collect();

    assert_eq!(garbage.len(), 1);
    assert_eq!(token_text(source, garbage[0]), "@#$");
}
