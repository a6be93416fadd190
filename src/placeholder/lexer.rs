//! Lexer for `${...}` placeholders using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    // Escapes (longer patterns win over the bare forms)
    #[token("\\${")]
    EscapedOpen,
    #[token("\\}")]
    EscapedClose,

    #[token("${")]
    Open,
    #[token("}")]
    Close,

    // Anything that cannot start a delimiter or an escape
    #[regex(r"[^$\\}]+")]
    Text,

    #[token("$")]
    Dollar,
    #[token("\\")]
    Backslash,
}

/// Lex input into tokens with spans; `Err` marks unrecognized input
pub fn lex(input: &str) -> impl Iterator<Item = (Result<Token, ()>, Span)> + '_ {
    Token::lexer(input).spanned()
}
