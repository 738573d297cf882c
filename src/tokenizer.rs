//! An eager tokenizer for chem source files.
//!
//! The whole file is consumed before the parser runs. Identifier spellings are
//! interned into a [`NameTable`] as a side effect; every later stage refers to
//! identifiers by their index in that table.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::numeral;
use crate::vocabulary::{Keyword, Symbol, ENTRY_POINT, ENTRY_POINT_ALIAS};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenList {
    pub tokens: Vec<Token>,
    pub names: NameTable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Keyword(Keyword),
    Symbol(Symbol),
    /// Index into the [`NameTable`].
    Identifier(usize),
    Number(i64),
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub absolute_i: u32,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn advance(&mut self, c: char) {
        self.absolute_i += 1;
        self.column += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        }
    }

    /// Byte offset into the source. Anything outside ASCII stops the
    /// tokenizer at that char, so every recorded position counts bytes.
    pub fn offset(&self) -> usize {
        self.absolute_i.saturating_sub(1) as usize
    }
}

impl Default for Position {
    fn default() -> Self {
        Self {
            absolute_i: 1,
            line: 1,
            column: 1,
        }
    }
}

/// Distinct identifier spellings in order of first occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameTable {
    names: Vec<String>,
}

impl NameTable {
    /// Returns the id of `spelling`, registering it on first sight.
    pub fn intern(&mut self, spelling: &str) -> usize {
        let spelling = if spelling == ENTRY_POINT_ALIAS {
            ENTRY_POINT
        } else {
            spelling
        };

        if let Some(id) = self.names.iter().position(|name| name == spelling) {
            return id;
        }
        self.names.push(spelling.to_string());
        self.names.len() - 1
    }

    pub fn get(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[derive(Debug, thiserror::Error, Serialize, Deserialize)]
#[error("syntax error: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub position: Position,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn classify_word(word: &str, names: &mut NameTable) -> Result<TokenKind, numeral::NumeralOverflow> {
    if let Some(keyword) = Keyword::lookup(word) {
        return Ok(TokenKind::Keyword(keyword));
    }
    if let Some(value) = numeral::decode(word)? {
        return Ok(TokenKind::Number(value));
    }
    Ok(TokenKind::Identifier(names.intern(word)))
}

#[tracing::instrument(level = "trace", skip_all)]
pub fn tokenize(source: &str) -> Result<TokenList, SyntaxError> {
    let mut chars = source.chars().peekable();
    let mut tokens = vec![];
    let mut names = NameTable::default();
    let mut position = Position::default();

    while let Some(c) = chars.next() {
        let start = position;
        position.advance(c);

        if c.is_ascii_whitespace() {
            continue;
        }

        let kind = if is_word_char(c) {
            let mut word = String::from(c);
            while let Some(next) = chars.next_if(|next| is_word_char(*next)) {
                word.push(next);
                position.advance(next);
            }
            classify_word(&word, &mut names).map_err(|err| SyntaxError {
                message: format!("malformed numeral: {err}"),
                position: start,
            })?
        } else if let Some(symbol) = Symbol::from_char(c) {
            TokenKind::Symbol(symbol)
        } else {
            return Err(SyntaxError {
                message: format!("unexpected char '{}'", c),
                position: start,
            });
        };

        tokens.push(Token {
            kind,
            position: start,
        });
    }

    tokens.push(Token {
        kind: TokenKind::End,
        position,
    });
    trace!(
        tokens = tokens.len(),
        identifiers = names.len(),
        "Tokenized source"
    );

    Ok(TokenList { tokens, names })
}

impl TokenList {
    /// Human-readable description used in parse errors.
    pub fn describe(&self, kind: &TokenKind) -> String {
        match kind {
            TokenKind::Keyword(keyword) => format!("keyword `{}`", keyword.spelling()),
            TokenKind::Symbol(symbol) => format!("`{}`", symbol.as_char()),
            TokenKind::Identifier(id) => match self.names.get(*id) {
                Some(name) => format!("identifier `{name}`"),
                None => format!("identifier #{id}"),
            },
            TokenKind::Number(value) => format!("number {value}"),
            TokenKind::End => "end of input".to_string(),
        }
    }

    /// Numbered listing of every token except the end marker.
    pub fn listing(&self) -> String {
        self.tokens
            .iter()
            .enumerate()
            .filter_map(|(i, token)| {
                let (class, text) = match token.kind {
                    TokenKind::Number(value) => ("NUMBER\t", value.to_string()),
                    TokenKind::Identifier(id) => {
                        ("IDENTIFIER", self.names.get(id).unwrap_or("?").to_string())
                    }
                    TokenKind::Keyword(keyword) => ("KEYWORD\t", keyword.spelling().to_string()),
                    TokenKind::Symbol(symbol) => ("SYMBOL\t", symbol.as_char().to_string()),
                    TokenKind::End => return None,
                };
                Some(format!("{i}:\t{class}\t{text}\n"))
            })
            .collect()
    }
}
