//! Purpose: Render entries as deliberately messy KVP text.
//! Exports: `Entry`, `NoisySerializer`, `NoisyStats`.
//! Role: Produces the parser-under-test input; the canonical JSON is written elsewhere.
//! Invariants: Every entry is written exactly once, in the order given.
//! Invariants: Keys of invalid entries are never enclosed, and neither are their values.
//! Invariants: Noise and padding never contain alphanumerics or reserved syntax characters.
//! Notes: Entry layout is `[noise][pad][q]key[q]<kv>[pad][q]value[q]<item>` with no separators.

use std::io::{self, Write};

use rand::Rng;
use serde::Serialize;

use crate::core::charset::{CharClass, push_random};
use crate::core::config::{GeneratorConfig, LengthRange, Probabilities, Syntax};
use crate::core::dictionary::EntryKind;
use crate::core::error::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn new(key: String, value: String, kind: EntryKind) -> Self {
        Self { key, value, kind }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct NoisyStats {
    pub records: u64,
    pub noise_runs: u64,
    pub quoted_keys: u64,
    pub quoted_values: u64,
    pub padded_keys: u64,
    pub padded_values: u64,
    pub bytes: u64,
}

#[derive(Clone, Debug)]
pub struct NoisySerializer {
    probabilities: Probabilities,
    noise_len: LengthRange,
    padding_len: LengthRange,
    syntax: Syntax,
    noise: CharClass,
}

impl NoisySerializer {
    pub fn new(config: &GeneratorConfig) -> Result<Self, Error> {
        Ok(Self {
            probabilities: config.probabilities,
            noise_len: config.noise_len,
            padding_len: config.padding_len,
            syntax: config.syntax,
            noise: config.syntax.punctuation_class()?,
        })
    }

    pub fn write<W, R>(&self, out: &mut W, entries: &[Entry], rng: &mut R) -> io::Result<NoisyStats>
    where
        W: Write,
        R: Rng + ?Sized,
    {
        let mut stats = NoisyStats::default();
        let mut buf = String::with_capacity(512);
        for entry in entries {
            buf.clear();
            self.render(entry, rng, &mut buf, &mut stats);
            out.write_all(buf.as_bytes())?;
            stats.records += 1;
            stats.bytes += buf.len() as u64;
        }
        out.flush()?;
        Ok(stats)
    }

    fn render<R: Rng + ?Sized>(
        &self,
        entry: &Entry,
        rng: &mut R,
        buf: &mut String,
        stats: &mut NoisyStats,
    ) {
        let p = &self.probabilities;

        if rng.random_bool(p.noise) {
            let len = rng.random_range(self.noise_len.min..=self.noise_len.max);
            let start = buf.len();
            push_random(rng, len, &self.noise, buf);
            let half = buf[start..].to_string();
            buf.push_str(&half);
            stats.noise_runs += 1;
        }

        let enclosable = entry.kind == EntryKind::Valid;
        let quote_key = rng.random_bool(p.key_quote) && enclosable;
        let quote_value = rng.random_bool(p.value_quote) && enclosable;
        let key_pad = self.padding(rng);
        let value_pad = self.padding(rng);

        push_spaces(buf, key_pad);
        self.push_field(buf, &entry.key, quote_key);
        buf.push(self.syntax.kv_delimiter);
        push_spaces(buf, value_pad);
        self.push_field(buf, &entry.value, quote_value);
        buf.push(self.syntax.item_delimiter);

        stats.quoted_keys += u64::from(quote_key);
        stats.quoted_values += u64::from(quote_value);
        stats.padded_keys += u64::from(key_pad > 0);
        stats.padded_values += u64::from(value_pad > 0);
    }

    fn padding<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if rng.random_bool(self.probabilities.padding) {
            rng.random_range(self.padding_len.min..=self.padding_len.max)
        } else {
            0
        }
    }

    fn push_field(&self, buf: &mut String, text: &str, enclose: bool) {
        if enclose {
            buf.push(self.syntax.enclosing);
            buf.push_str(text);
            buf.push(self.syntax.enclosing);
        } else {
            buf.push_str(text);
        }
    }
}

fn push_spaces(buf: &mut String, count: usize) {
    buf.extend(std::iter::repeat_n(' ', count));
}

#[cfg(test)]
mod tests {
    use super::{Entry, NoisySerializer};
    use crate::core::config::{GeneratorConfig, Probabilities};
    use crate::core::dictionary::EntryKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn entries() -> Vec<Entry> {
        vec![
            Entry::new("alpha".into(), "one".into(), EntryKind::Valid),
            Entry::new("$%&".into(), "".into(), EntryKind::Invalid),
            Entry::new("b2".into(), "Z".into(), EntryKind::Valid),
        ]
    }

    fn render(config: &GeneratorConfig, entries: &[Entry], seed: u64) -> (String, super::NoisyStats) {
        let serializer = NoisySerializer::new(config).expect("serializer");
        let mut out = Vec::new();
        let stats = serializer
            .write(&mut out, entries, &mut ChaCha8Rng::seed_from_u64(seed))
            .expect("write");
        (String::from_utf8(out).expect("utf8"), stats)
    }

    #[test]
    fn zero_probabilities_give_bare_records() {
        let config = GeneratorConfig {
            probabilities: Probabilities::none(),
            ..GeneratorConfig::default()
        };
        let (text, stats) = render(&config, &entries(), 1);
        assert_eq!(text, "alpha:one,$%&:,b2:Z,");
        assert_eq!(stats.records, 3);
        assert_eq!(stats.noise_runs, 0);
        assert_eq!(stats.bytes, text.len() as u64);
    }

    #[test]
    fn certain_quoting_skips_invalid_keys() {
        let config = GeneratorConfig {
            probabilities: Probabilities {
                key_quote: 1.0,
                value_quote: 1.0,
                ..Probabilities::none()
            },
            ..GeneratorConfig::default()
        };
        let (text, stats) = render(&config, &entries(), 2);
        assert_eq!(text, "\"alpha\":\"one\",$%&:,\"b2\":\"Z\",");
        assert_eq!(stats.quoted_keys, 2);
        assert_eq!(stats.quoted_values, 2);
    }

    #[test]
    fn certain_padding_puts_spaces_before_key_and_value() {
        let config = GeneratorConfig {
            probabilities: Probabilities {
                padding: 1.0,
                ..Probabilities::none()
            },
            ..GeneratorConfig::default()
        };
        let (text, stats) = render(&config, &entries()[..1], 3);
        let (key_part, value_part) = text.split_once(':').expect("kv delimiter");
        assert_eq!(key_part.trim_start_matches(' '), "alpha");
        assert!((1..=10).contains(&(key_part.len() - "alpha".len())));
        assert_eq!(value_part.trim_start_matches(' '), "one,");
        assert!((1..=10).contains(&(value_part.len() - "one,".len())));
        assert_eq!(stats.padded_keys, 1);
        assert_eq!(stats.padded_values, 1);
    }

    #[test]
    fn certain_noise_is_a_doubled_punctuation_run() {
        let config = GeneratorConfig {
            probabilities: Probabilities {
                noise: 1.0,
                ..Probabilities::none()
            },
            ..GeneratorConfig::default()
        };
        let (text, stats) = render(&config, &entries()[..1], 4);
        let noise = text.strip_suffix("alpha:one,").expect("record suffix");
        assert_eq!(noise.len() % 2, 0);
        assert!((2..=200).contains(&noise.len()));
        let (first, second) = noise.split_at(noise.len() / 2);
        assert_eq!(first, second);
        assert!(noise.chars().all(|ch| ch.is_ascii_punctuation()));
        assert!(!noise.contains(['"', ':', '\\']));
        assert_eq!(stats.noise_runs, 1);
    }

    #[test]
    fn custom_syntax_is_honored() {
        let mut config = GeneratorConfig {
            probabilities: Probabilities {
                key_quote: 1.0,
                ..Probabilities::none()
            },
            ..GeneratorConfig::default()
        };
        config.syntax.kv_delimiter = '=';
        config.syntax.item_delimiter = ';';
        config.syntax.enclosing = '\'';
        let (text, _) = render(&config, &entries()[..1], 5);
        assert_eq!(text, "'alpha'=one;");
    }

    #[test]
    fn default_run_never_quotes_invalid_keys() {
        let config = GeneratorConfig::default();
        let invalid: Vec<Entry> = (0..500)
            .map(|i| Entry::new(format!("#{}#", "!".repeat(i % 7)), "v".into(), EntryKind::Invalid))
            .collect();
        let (text, stats) = render(&config, &invalid, 6);
        assert!(!text.contains('"'));
        assert_eq!(stats.quoted_keys, 0);
        assert_eq!(stats.records, 500);
    }
}
