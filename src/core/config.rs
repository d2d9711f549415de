//! Purpose: Describe one fixture-generation run as plain, validated data.
//! Exports: `GeneratorConfig`, `Probabilities`, `LengthRange`, `Syntax`, `RemainderPolicy`.
//! Role: Single configuration surface shared by the CLI, config files and tests.
//! Invariants: `Default` reproduces the full-size fixture run (10M valid, 100k invalid, 24 workers).
//! Invariants: Generation code only accepts configs that passed `validate`.
//! Notes: File configs are JSON; missing fields fall back to defaults, unknown fields are rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::charset::CharClass;
use crate::core::error::{Error, ErrorKind};

/// Inclusive length bounds for a generated string.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

impl LengthRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    fn validate(&self, field: &str) -> Result<(), Error> {
        if self.min > self.max {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!(
                    "{field}: min ({}) exceeds max ({})",
                    self.min, self.max
                ))
                .with_hint("Length ranges are inclusive; use min <= max."));
        }
        Ok(())
    }
}

/// How a total that does not divide evenly across workers is handled.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Every worker gets `total / workers` records; the remainder is dropped.
    Truncate,
    /// The first `total % workers` workers take one extra record each.
    #[default]
    Distribute,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Probabilities {
    pub noise: f64,
    pub key_quote: f64,
    pub value_quote: f64,
    pub padding: f64,
}

impl Default for Probabilities {
    fn default() -> Self {
        Self {
            noise: 0.3,
            key_quote: 0.3,
            value_quote: 0.3,
            padding: 0.4,
        }
    }
}

impl Probabilities {
    pub const fn none() -> Self {
        Self {
            noise: 0.0,
            key_quote: 0.0,
            value_quote: 0.0,
            padding: 0.0,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        let fields = [
            ("noise", self.noise),
            ("key_quote", self.key_quote),
            ("value_quote", self.value_quote),
            ("padding", self.padding),
        ];
        for (name, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("probability {name} must be within [0, 1], got {value}")));
            }
        }
        Ok(())
    }
}

/// Structural characters of the emitted KVP text.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Syntax {
    pub kv_delimiter: char,
    pub item_delimiter: char,
    pub enclosing: char,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            kv_delimiter: ':',
            item_delimiter: ',',
            enclosing: '"',
        }
    }
}

impl Syntax {
    pub const ESCAPE: char = '\\';

    /// Characters that never appear inside noise runs or invalid keys.
    pub fn reserved(&self) -> [char; 3] {
        [self.enclosing, self.kv_delimiter, Self::ESCAPE]
    }

    pub fn punctuation_class(&self) -> Result<CharClass, Error> {
        CharClass::punctuation_excluding(&self.reserved()).ok_or_else(|| {
            Error::new(ErrorKind::Usage).with_message("syntax leaves no punctuation for noise")
        })
    }

    fn validate(&self) -> Result<(), Error> {
        let fields = [
            ("kv_delimiter", self.kv_delimiter),
            ("item_delimiter", self.item_delimiter),
            ("enclosing", self.enclosing),
        ];
        for (name, ch) in fields {
            if !ch.is_ascii_punctuation() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("syntax {name} must be ASCII punctuation, got {ch:?}")));
            }
            if ch == Self::ESCAPE {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("syntax {name} cannot be the escape character")));
            }
        }
        if self.kv_delimiter == self.item_delimiter
            || self.kv_delimiter == self.enclosing
            || self.item_delimiter == self.enclosing
        {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("syntax characters must be distinct")
                .with_hint("Pick different kv_delimiter, item_delimiter and enclosing characters."));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub valid_count: u64,
    pub invalid_count: u64,
    pub workers: usize,
    pub seed: Option<u64>,
    pub remainder: RemainderPolicy,
    /// Length of the alphanumeric tail after the leading letter of a valid key.
    pub valid_key_len: LengthRange,
    /// Length of the alphanumeric tail after the leading letter of a valid value.
    pub valid_value_len: LengthRange,
    pub invalid_key_len: LengthRange,
    pub invalid_value_len: LengthRange,
    /// Length of one noise half; the written run is twice this.
    pub noise_len: LengthRange,
    pub padding_len: LengthRange,
    pub probabilities: Probabilities,
    pub syntax: Syntax,
    /// Records between progress events per worker; 0 disables them.
    pub progress_interval: u64,
    pub pretty_expected: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            valid_count: 10_000_000,
            invalid_count: 100_000,
            workers: 24,
            seed: None,
            remainder: RemainderPolicy::default(),
            valid_key_len: LengthRange::new(1, 64),
            valid_value_len: LengthRange::new(0, 64),
            invalid_key_len: LengthRange::new(1, 64),
            invalid_value_len: LengthRange::new(0, 64),
            noise_len: LengthRange::new(1, 100),
            padding_len: LengthRange::new(1, 10),
            probabilities: Probabilities::default(),
            syntax: Syntax::default(),
            progress_interval: 100_000,
            pretty_expected: false,
        }
    }
}

impl GeneratorConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read config file")
                .with_path(path)
                .with_source(err)
        })?;
        Self::from_json_str(&text).map_err(|err| err.with_path(path))
    }

    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid config: {err}"))
                .with_hint("Config files are JSON objects; see `kvpgen config` for the field names.")
        })
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.workers == 0 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("workers must be at least 1"));
        }
        self.valid_key_len.validate("valid_key_len")?;
        self.valid_value_len.validate("valid_value_len")?;
        self.invalid_key_len.validate("invalid_key_len")?;
        self.invalid_value_len.validate("invalid_value_len")?;
        self.noise_len.validate("noise_len")?;
        self.padding_len.validate("padding_len")?;
        if self.invalid_key_len.min == 0 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("invalid_key_len.min must be at least 1"));
        }
        if self.noise_len.min == 0 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("noise_len.min must be at least 1"));
        }
        if self.padding_len.min == 0 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("padding_len.min must be at least 1"));
        }
        self.probabilities.validate()?;
        self.syntax.validate()?;
        self.syntax.punctuation_class()?;
        Ok(())
    }
}
