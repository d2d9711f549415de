//! Reference readers for the default KVP syntax (`:` / `,` / `"`).
//!
//! `split_plain` expects input without noise runs and recovers every record.
//! `valid_pairs` tolerates noise and recovers only records whose key is
//! alphanumeric: noise never holds alphanumerics, quotes or colons, so the
//! alphanumeric run right before each colon is exactly the key.

#![allow(dead_code)]

pub fn strip_enclosing(field: &str) -> &str {
    field
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(field)
}

/// Raw `(key, value)` text per record, leading spaces removed, quotes kept.
pub fn split_plain_raw(text: &str) -> Vec<(&str, &str)> {
    let mut records = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let (key, tail) = rest.split_once(':').expect("record has a kv delimiter");
        let (value, tail) = tail.split_once(',').expect("record has an item delimiter");
        records.push((key.trim_start_matches(' '), value.trim_start_matches(' ')));
        rest = tail;
    }
    records
}

pub fn split_plain(text: &str) -> Vec<(String, String)> {
    split_plain_raw(text)
        .into_iter()
        .map(|(key, value)| {
            (
                strip_enclosing(key).to_string(),
                strip_enclosing(value).to_string(),
            )
        })
        .collect()
}

pub fn valid_pairs(text: &str) -> Vec<(String, String)> {
    let bytes = text.as_bytes();
    let mut pairs = Vec::new();
    for (colon, _) in text.match_indices(':') {
        let mut end = colon;
        if end > 0 && bytes[end - 1] == b'"' {
            end -= 1;
        }
        let mut start = end;
        while start > 0 && bytes[start - 1].is_ascii_alphanumeric() {
            start -= 1;
        }
        if start == end {
            continue;
        }
        let key = &text[start..end];

        let mut pos = colon + 1;
        while bytes[pos] == b' ' {
            pos += 1;
        }
        if bytes[pos] == b'"' {
            pos += 1;
        }
        let value_start = pos;
        while bytes[pos].is_ascii_alphanumeric() {
            pos += 1;
        }
        pairs.push((key.to_string(), text[value_start..pos].to_string()));
    }
    pairs
}
