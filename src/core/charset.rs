//! Purpose: Character classes and uniform random string generation.
//! Exports: `CharClass`, `push_random`, `random_string`.
//! Role: Lowest layer of fixture generation; every key, value and noise run comes from here.
//! Invariants: Classes are ASCII-only and never empty.
//! Invariants: Draws are uniform with replacement; length 0 yields an empty string.

use rand::Rng;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CharClass {
    chars: Vec<u8>,
}

impl CharClass {
    pub fn alphabetic() -> Self {
        Self {
            chars: [LOWERCASE, UPPERCASE].concat(),
        }
    }

    pub fn alphanumeric() -> Self {
        Self {
            chars: [LOWERCASE, UPPERCASE, DIGITS].concat(),
        }
    }

    /// ASCII punctuation minus `excluded`. Structural characters of the
    /// generated syntax go in `excluded` so noise and invalid keys never
    /// contain them.
    ///
    /// Returns `None` when nothing is left after exclusion.
    pub fn punctuation_excluding(excluded: &[char]) -> Option<Self> {
        let chars: Vec<u8> = PUNCTUATION
            .iter()
            .copied()
            .filter(|byte| !excluded.contains(&char::from(*byte)))
            .collect();
        if chars.is_empty() {
            return None;
        }
        Some(Self { chars })
    }

    pub fn contains(&self, ch: char) -> bool {
        ch.is_ascii() && self.chars.contains(&(ch as u8))
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        char::from(self.chars[rng.random_range(0..self.chars.len())])
    }
}

pub fn push_random<R: Rng + ?Sized>(rng: &mut R, len: usize, class: &CharClass, out: &mut String) {
    out.reserve(len);
    for _ in 0..len {
        out.push(class.pick(rng));
    }
}

pub fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize, class: &CharClass) -> String {
    let mut out = String::with_capacity(len);
    push_random(rng, len, class, &mut out);
    out
}
