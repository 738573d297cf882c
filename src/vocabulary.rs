//! Static tables consulted by the tokenizer: keywords, special symbols and the
//! digit words of the positional numeral system.

use serde::{Deserialize, Serialize};

/// Identifiers spelled like this are interned under [`ENTRY_POINT`].
pub const ENTRY_POINT_ALIAS: &str = "main_babka_labka";
pub const ENTRY_POINT: &str = "main";

/// Digit words, most significant first within a numeral. The radix is the
/// length of this table.
///
/// Each word is a single non-lowercase letter followed by lowercase letters.
pub const DIGITS: [&str; 10] = ["E", "H", "He", "Li", "Be", "B", "C", "N", "O", "F"];

pub const RADIX: i64 = DIGITS.len() as i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    DefineFunction,
    OpenBlock,
    CloseBlock,
    Declare,
    Is,
    If,
    Else,
    While,
    Return,
    Output,
    Input,
    Explode,
    RamExplode,
    Sqrt,
    Below,
    Above,
    Equal,
    Mul,
    Div,
    Add,
    Sub,
}

impl Keyword {
    pub const ALL: [Keyword; 21] = [
        Keyword::DefineFunction,
        Keyword::OpenBlock,
        Keyword::CloseBlock,
        Keyword::Declare,
        Keyword::Is,
        Keyword::If,
        Keyword::Else,
        Keyword::While,
        Keyword::Return,
        Keyword::Output,
        Keyword::Input,
        Keyword::Explode,
        Keyword::RamExplode,
        Keyword::Sqrt,
        Keyword::Below,
        Keyword::Above,
        Keyword::Equal,
        Keyword::Mul,
        Keyword::Div,
        Keyword::Add,
        Keyword::Sub,
    ];

    pub fn spelling(self) -> &'static str {
        match self {
            Keyword::DefineFunction => "labassistant",
            Keyword::OpenBlock => "labprotocol",
            Keyword::CloseBlock => "endprotocol",
            Keyword::Declare => "testtube",
            Keyword::Is => "is",
            Keyword::If => "taste",
            Keyword::Else => "emergencyroom",
            Keyword::While => "eat",
            Keyword::Return => "synthesize",
            Keyword::Output => "report",
            Keyword::Input => "getorder",
            Keyword::Explode => "explode",
            Keyword::RamExplode => "ramexplode",
            Keyword::Sqrt => "sqrt",
            Keyword::Below => "sourer",
            Keyword::Above => "bitterer",
            Keyword::Equal => "justlike",
            Keyword::Mul => "mix",
            Keyword::Div => "steal",
            Keyword::Add => "add",
            Keyword::Sub => "filter",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(word: &str) -> Option<Keyword> {
        Self::ALL.into_iter().find(|kw| kw.spelling() == word)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    LeftParen,
    RightParen,
    Semicolon,
    Comma,
}

impl Symbol {
    pub const ALL: [Symbol; 4] = [
        Symbol::LeftParen,
        Symbol::RightParen,
        Symbol::Semicolon,
        Symbol::Comma,
    ];

    pub fn as_char(self) -> char {
        match self {
            Symbol::LeftParen => '(',
            Symbol::RightParen => ')',
            Symbol::Semicolon => ';',
            Symbol::Comma => ',',
        }
    }

    pub fn from_char(c: char) -> Option<Symbol> {
        Self::ALL.into_iter().find(|symbol| symbol.as_char() == c)
    }
}
