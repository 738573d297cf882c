//! Positional numerals written as concatenated digit words.
//!
//! `HeLi` reads as the digits 2, 3 and decodes to `2 * RADIX + 3`. Decoding is
//! attempted on every word that is not a keyword; a word that cannot be split
//! entirely into digit words is an identifier, not an error.

use crate::vocabulary::{DIGITS, RADIX};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("numeral '{word}' does not fit in a 64-bit integer")]
pub struct NumeralOverflow {
    pub word: String,
}

/// Returns `Ok(None)` when `word` is not a numeral.
pub fn decode(word: &str) -> Result<Option<i64>, NumeralOverflow> {
    let Some(digits) = split_digits(word) else {
        return Ok(None);
    };

    digits
        .into_iter()
        .try_fold(0_i64, |value, digit| {
            value.checked_mul(RADIX)?.checked_add(digit as i64)
        })
        .map(Some)
        .ok_or_else(|| NumeralOverflow {
            word: word.to_string(),
        })
}

/// Splits `word` into digit indices, most significant first.
///
/// Each digit word starts at a non-lowercase character and extends over the
/// lowercase run after it. The longest prefix of that run which names a digit
/// wins; whatever is left of the run then starts lowercase and cannot match.
fn split_digits(word: &str) -> Option<Vec<usize>> {
    let mut digits = vec![];
    let mut rest = word;

    while let Some(first) = rest.chars().next() {
        if first.is_ascii_lowercase() {
            return None;
        }
        let head = first.len_utf8();
        let run = head
            + rest[head..]
                .bytes()
                .take_while(u8::is_ascii_lowercase)
                .count();

        let (digit, len) = (head..=run)
            .rev()
            .find_map(|len| lookup_digit(&rest[..len]).map(|digit| (digit, len)))?;
        digits.push(digit);
        rest = &rest[len..];
    }

    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

fn lookup_digit(candidate: &str) -> Option<usize> {
    DIGITS.iter().position(|digit| *digit == candidate)
}
