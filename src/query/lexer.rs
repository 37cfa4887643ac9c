use nom::{IResult, Parser};
use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, multispace0};
use nom::combinator::value;
use crate::core::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Colon,
    Plus,
    Minus,
    Caret,
    Tilde,
    And,
    Or,
    Not,
    To,
    Term(String),
    Quoted(String),
}

/// Token with the byte offset where it starts in the query text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

fn is_term_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | ':' | '"' | '^' | '~' | '\\')
}

fn punctuation(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::LParen, char('(')),
        value(TokenKind::RParen, char(')')),
        value(TokenKind::LBracket, char('[')),
        value(TokenKind::RBracket, char(']')),
        value(TokenKind::LBrace, char('{')),
        value(TokenKind::RBrace, char('}')),
        value(TokenKind::Colon, char(':')),
        value(TokenKind::Caret, char('^')),
        value(TokenKind::Tilde, char('~')),
    ))
    .parse(input)
}

fn bare_term(input: &str) -> IResult<&str, &str> {
    take_while1(is_term_char).parse(input)
}

fn keyword_or_term(text: &str) -> TokenKind {
    match text {
        "AND" | "&&" => TokenKind::And,
        "OR" | "||" => TokenKind::Or,
        "NOT" => TokenKind::Not,
        "TO" => TokenKind::To,
        _ => TokenKind::Term(text.to_string()),
    }
}

/// `+`/`-` are occurrence prefixes except where a value is expected,
/// so `Index:-5` and `[-5 TO -1]` keep their signs.
fn sign_is_operator(previous: Option<&Token>) -> bool {
    !matches!(
        previous.map(|t| &t.kind),
        Some(TokenKind::Colon | TokenKind::LBracket | TokenKind::LBrace | TokenKind::To)
    )
}

/// Read a double-quoted string starting at `input[0] == '"'`.
/// Returns the unescaped content and the remaining input.
fn quoted(input: &str, position: usize) -> Result<(&str, String)> {
    let mut out = String::new();
    let mut escaped = false;
    for (i, c) in input.char_indices().skip(1) {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Ok((&input[i + 1..], out));
        } else {
            out.push(c);
        }
    }
    Err(Error::syntax(position, "unterminated quoted string"))
}

pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut rest = text;

    loop {
        if let Ok((remaining, _)) = multispace0::<&str, nom::error::Error<&str>>(rest) {
            rest = remaining;
        }
        if rest.is_empty() {
            break;
        }
        let position = text.len() - rest.len();

        let (remaining, kind) = if rest.starts_with('"') {
            let (remaining, content) = quoted(rest, position)?;
            (remaining, TokenKind::Quoted(content))
        } else if rest.starts_with(['+', '-']) && sign_is_operator(tokens.last()) {
            let kind = if rest.starts_with('+') { TokenKind::Plus } else { TokenKind::Minus };
            (&rest[1..], kind)
        } else if let Ok((remaining, kind)) = punctuation(rest) {
            (remaining, kind)
        } else if let Ok((remaining, term)) = bare_term(rest) {
            (remaining, keyword_or_term(term))
        } else {
            let c = rest.chars().next().unwrap_or_default();
            return Err(Error::syntax(position, format!("unexpected character '{}'", c)));
        };

        tokens.push(Token { kind, position });
        rest = remaining;
    }

    Ok(tokens)
}
