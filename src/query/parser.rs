use crate::core::context::QueryContext;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{IndexValue, IndexValueType};
use crate::query::ast::{
    LogicalClause, LogicalPredicate, Occurrence, Predicate, RangePredicate, SimplePredicate, ANY_FIELD,
};
use crate::query::lexer::{tokenize, Token, TokenKind};
use crate::query::types::ValidationConfig;

/// Field searched by terms written without `field:`
pub const DEFAULT_FIELD: &str = "_Text";

/// CQL parser for converting query text to a predicate tree
pub struct CqlParser<'a> {
    pub default_field: String,
    pub default_similarity: f32,    // bare `~`
    /// Deepest parenthesis nesting accepted
    pub max_depth: usize,
    context: Option<&'a dyn QueryContext>,
}

impl Default for CqlParser<'_> {
    fn default() -> Self {
        CqlParser::new()
    }
}

impl<'a> CqlParser<'a> {
    pub fn new() -> Self {
        CqlParser {
            default_field: DEFAULT_FIELD.to_string(),
            default_similarity: 0.5,
            max_depth: ValidationConfig::default().max_depth,
            context: None,
        }
    }

    /// Use the context's field metadata to type values of numeric and
    /// boolean fields while parsing.
    pub fn with_context(mut self, context: &'a dyn QueryContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_default_similarity(mut self, similarity: f32) -> Self {
        self.default_similarity = similarity;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Parse CQL text into a predicate tree.
    /// Examples:
    /// - "Type:Folder" -> Simple
    /// - "+Type:Folder -Name:tmp" -> Logical with Must / MustNot clauses
    /// - "Index:[1 TO *]" -> Range, open above
    /// - "Name:roam~0.7" -> fuzzy Simple
    /// - "" -> empty Logical
    pub fn parse(&self, text: &str) -> Result<Predicate> {
        let tokens = tokenize(text)?;
        let mut state = ParseState {
            parser: self,
            tokens: &tokens,
            index: 0,
            end: text.len(),
            depth: 0,
            default_field: self.default_field.clone(),
        };

        let mut clauses = state.clauses(false)?;
        if clauses.len() == 1 && clauses[0].occurrence == Occurrence::Default {
            if let Some(clause) = clauses.pop() {
                return Ok(clause.predicate);
            }
        }
        Ok(Predicate::Logical(LogicalPredicate { clauses, boost: None }))
    }

    fn typed_value(&self, field: &str, text: String, position: usize) -> Result<IndexValue> {
        if field == ANY_FIELD {
            return Ok(IndexValue::String(text));
        }
        let info = self.context.and_then(|c| c.field_info(field));
        match info {
            Some(info) if info.value_type != IndexValueType::String => {
                IndexValue::parse_as(&text, info.value_type).ok_or_else(|| {
                    Error::syntax(
                        position,
                        format!("'{}' is not a valid {:?} value for field '{}'", text, info.value_type, field),
                    )
                })
            }
            _ => Ok(IndexValue::String(text)),
        }
    }
}

/// Cursor over the token list for one `parse` call
struct ParseState<'p, 't> {
    parser: &'p CqlParser<'p>,
    tokens: &'t [Token],
    index: usize,
    end: usize,
    depth: usize,
    default_field: String,
}

impl ParseState<'_, '_> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|t| &t.kind)
    }

    fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.index + offset).map(|t| &t.kind)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.index).map(|t| t.position).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// One parenthesis level. `nested` is true inside `( ... )`; the closing
    /// parenthesis is left for the caller.
    fn clauses(&mut self, nested: bool) -> Result<Vec<LogicalClause>> {
        let mut clauses: Vec<LogicalClause> = Vec::new();
        let mut conjunction: Option<(TokenKind, usize)> = None;

        loop {
            match self.peek() {
                None if nested => {
                    return Err(Error::syntax(self.end, "unbalanced parenthesis: missing ')'"));
                }
                None => break,
                Some(TokenKind::RParen) if nested => break,
                Some(TokenKind::RParen) => {
                    return Err(Error::syntax(self.position(), "unbalanced parenthesis: unexpected ')'"));
                }
                Some(kind @ (TokenKind::And | TokenKind::Or)) => {
                    let kind = kind.clone();
                    if clauses.is_empty() || conjunction.is_some() {
                        return Err(Error::syntax(self.position(), format!("{:?} without left operand", kind)));
                    }
                    conjunction = Some((kind, self.position()));
                    self.advance();
                    continue;
                }
                _ => {}
            }

            let mut occurrence = match self.peek() {
                Some(TokenKind::Plus) => Occurrence::Must,
                Some(TokenKind::Minus | TokenKind::Not) => Occurrence::MustNot,
                _ => Occurrence::Default,
            };
            if occurrence != Occurrence::Default {
                self.advance();
            }

            let predicate = self.clause()?;

            if let Some((kind, _)) = conjunction.take() {
                if let Some(previous) = clauses.last_mut() {
                    match kind {
                        TokenKind::And => {
                            if previous.occurrence != Occurrence::MustNot {
                                previous.occurrence = Occurrence::Must;
                            }
                            if occurrence == Occurrence::Default {
                                occurrence = Occurrence::Must;
                            }
                        }
                        _ => {
                            if previous.occurrence == Occurrence::Default {
                                previous.occurrence = Occurrence::Should;
                            }
                            if occurrence == Occurrence::Default {
                                occurrence = Occurrence::Should;
                            }
                        }
                    }
                }
            }

            clauses.push(LogicalClause { predicate, occurrence });
        }

        if let Some((kind, position)) = conjunction {
            return Err(Error::syntax(position, format!("{:?} without right operand", kind)));
        }
        Ok(clauses)
    }

    fn clause(&mut self) -> Result<Predicate> {
        let position = self.position();
        let token = self
            .advance()
            .ok_or_else(|| Error::syntax(self.end, "unexpected end of query"))?;

        let predicate = match token.kind {
            TokenKind::LParen => self.group(position)?,
            TokenKind::Term(field) if self.peek() == Some(&TokenKind::Colon) => {
                self.advance();
                self.field_term(field)?
            }
            TokenKind::Term(text) | TokenKind::Quoted(text) => {
                let field = self.default_field.clone();
                self.simple(field, text, position)?
            }
            other => {
                return Err(Error::syntax(position, format!("unexpected {:?}", other)));
            }
        };

        self.boost(predicate)
    }

    /// Parenthesised clauses; `position` is that of the opening parenthesis.
    fn group(&mut self, position: usize) -> Result<Predicate> {
        if self.depth >= self.parser.max_depth {
            return Err(Error {
                position: Some(position),
                ..Error::new(
                    ErrorKind::TooComplex,
                    format!("parenthesis nesting exceeds maximum {}", self.parser.max_depth),
                )
            });
        }
        self.depth += 1;
        let clauses = self.clauses(true);
        self.depth -= 1;
        let clauses = clauses?;
        self.advance();
        Ok(Predicate::Logical(LogicalPredicate { clauses, boost: None }))
    }

    fn field_term(&mut self, field: String) -> Result<Predicate> {
        let position = self.position();
        match self.advance().map(|t| t.kind) {
            Some(TokenKind::LBracket) => self.range(field, false, position),
            Some(TokenKind::LBrace) => self.range(field, true, position),
            Some(TokenKind::LParen) => {
                // field:(a b) applies the field to every bare term inside
                let saved = std::mem::replace(&mut self.default_field, field);
                let group = self.group(position);
                self.default_field = saved;
                group
            }
            Some(TokenKind::Term(text) | TokenKind::Quoted(text)) => self.simple(field, text, position),
            _ => Err(Error::syntax(position, format!("expected a value after '{}:'", field))),
        }
    }

    fn simple(&mut self, field: String, text: String, position: usize) -> Result<Predicate> {
        let value = self.parser.typed_value(&field, text, position)?;
        let fuzzy = self.fuzzy()?;
        Ok(Predicate::Simple(SimplePredicate { field, value, fuzzy, boost: None }))
    }

    fn fuzzy(&mut self) -> Result<Option<f32>> {
        let Some(tilde) = self.tokens.get(self.index).filter(|t| t.kind == TokenKind::Tilde) else {
            return Ok(None);
        };
        let tilde_position = tilde.position;
        self.advance();

        let adjacent = self
            .tokens
            .get(self.index)
            .filter(|t| t.position == tilde_position + 1);
        let Some(Token { kind: TokenKind::Term(number), position }) = adjacent.cloned() else {
            return Ok(Some(self.parser.default_similarity));
        };
        let similarity: f32 = number
            .parse()
            .map_err(|_| Error::syntax(position, format!("invalid fuzzy similarity '{}'", number)))?;
        if !(0.0..=1.0).contains(&similarity) {
            return Err(Error::syntax(position, "fuzzy similarity must be between 0 and 1"));
        }
        self.advance();
        Ok(Some(similarity))
    }

    fn range(&mut self, field: String, min_exclusive: bool, start: usize) -> Result<Predicate> {
        let min = self.bound(&field, start)?;
        if self.peek() != Some(&TokenKind::To) {
            return Err(Error::syntax(self.position(), "malformed range: expected TO"));
        }
        self.advance();
        let max = self.bound(&field, start)?;
        let max_exclusive = match self.peek() {
            Some(TokenKind::RBracket) => false,
            Some(TokenKind::RBrace) => true,
            _ => {
                return Err(Error::syntax(self.position(), "malformed range: expected ']' or '}'"));
            }
        };
        self.advance();
        Ok(Predicate::Range(RangePredicate {
            field,
            min,
            max,
            min_exclusive,
            max_exclusive,
            boost: None,
        }))
    }

    fn bound(&mut self, field: &str, start: usize) -> Result<Option<IndexValue>> {
        let position = self.position();
        match self.advance().map(|t| t.kind) {
            Some(TokenKind::Term(text)) if text == "*" => Ok(None),
            Some(TokenKind::Term(text) | TokenKind::Quoted(text)) => {
                self.parser.typed_value(field, text, position).map(Some)
            }
            _ => Err(Error::syntax(start, "malformed range: missing bound")),
        }
    }

    fn boost(&mut self, predicate: Predicate) -> Result<Predicate> {
        if self.peek() != Some(&TokenKind::Caret) {
            return Ok(predicate);
        }
        self.advance();
        let position = self.position();
        let boost = match self.advance().map(|t| t.kind) {
            Some(TokenKind::Term(number)) => number.parse::<f32>().ok().filter(|b| b.is_finite() && *b >= 0.0),
            _ => None,
        };
        match boost {
            Some(b) => Ok(predicate.with_boost(Some(b))),
            None => Err(Error::syntax(position, "invalid boost: expected a non-negative number after '^'")),
        }
    }
}
