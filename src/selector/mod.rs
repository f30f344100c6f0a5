// File selectors for partial pulls: substrings or numeric clip ranges

use std::fmt;
use std::sync::OnceLock;
use regex::Regex;
use crate::catalog::MediaFile;

/// A parsed `--files` token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorToken {
    /// Case-insensitive substring of the file name
    Substring(String),
    /// `C3317-C3351`: same prefix (ASCII case-insensitive), equal-width digit runs, start <= end
    Range {
        prefix: String,
        start: u64,
        end: u64,
        width: usize,
    },
}

impl SelectorToken {
    /// Classify a raw token. Anything that is not a well-formed range is a substring.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        parse_range(raw).unwrap_or_else(|| SelectorToken::Substring(raw.to_string()))
    }

    pub fn matches(&self, file: &MediaFile) -> bool {
        match self {
            SelectorToken::Substring(needle) => {
                file.name.to_lowercase().contains(&needle.to_lowercase())
            }
            SelectorToken::Range { prefix, start, end, width } => {
                match split_numbered_stem(file.stem()) {
                    Some((file_prefix, digits)) => {
                        file_prefix.eq_ignore_ascii_case(prefix)
                            && digits.len() == *width
                            && digits
                                .parse::<u64>()
                                .map_or(false, |n| *start <= n && n <= *end)
                    }
                    None => false,
                }
            }
        }
    }
}

impl fmt::Display for SelectorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorToken::Substring(s) => write!(f, "{}", s),
            SelectorToken::Range { prefix, start, end, width } => {
                write!(f, "{}{:0w$}-{}{:0w$}", prefix, start, prefix, end, w = *width)
            }
        }
    }
}

fn parse_range(raw: &str) -> Option<SelectorToken> {
    static RANGE: OnceLock<Option<Regex>> = OnceLock::new();
    let range_regex = RANGE
        .get_or_init(|| Regex::new(r"^(.*?)(\d+)-(.*?)(\d+)$").ok())
        .as_ref()?;
    let caps = range_regex.captures(raw)?;

    let prefix = caps.get(1)?.as_str();
    let start_digits = caps.get(2)?.as_str();
    let end_prefix = caps.get(3)?.as_str();
    let end_digits = caps.get(4)?.as_str();

    if !end_prefix.is_empty() && !end_prefix.eq_ignore_ascii_case(prefix) {
        return None;
    }
    if start_digits.len() != end_digits.len() {
        return None;
    }

    let start = start_digits.parse::<u64>().ok()?;
    let end = end_digits.parse::<u64>().ok()?;
    if start > end {
        return None;
    }

    Some(SelectorToken::Range {
        prefix: prefix.to_string(),
        start,
        end,
        width: start_digits.len(),
    })
}

/// Split `C3317` into ("C", "3317"). None when the stem has no trailing digits.
fn split_numbered_stem(stem: &str) -> Option<(&str, &str)> {
    let digit_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)?;
    Some((&stem[..digit_start], &stem[digit_start..]))
}

/// Result of applying selectors to a candidate list
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub selected: Vec<MediaFile>,
    /// Tokens that matched no candidate
    pub unmatched: Vec<SelectorToken>,
}

/// Keep candidates matching ANY token, in candidate order.
/// No tokens selects everything.
pub fn select(candidates: &[MediaFile], tokens: &[SelectorToken]) -> Selection {
    if tokens.is_empty() {
        return Selection {
            selected: candidates.to_vec(),
            unmatched: Vec::new(),
        };
    }

    let mut hit = vec![false; tokens.len()];
    let mut selected = Vec::new();

    for candidate in candidates {
        let mut keep = false;
        for (idx, token) in tokens.iter().enumerate() {
            if token.matches(candidate) {
                hit[idx] = true;
                keep = true;
            }
        }
        if keep {
            selected.push(candidate.clone());
        }
    }

    let unmatched: Vec<SelectorToken> = tokens
        .iter()
        .zip(hit)
        .filter(|(_, was_hit)| !was_hit)
        .map(|(token, _)| token.clone())
        .collect();

    Selection { selected, unmatched }
}

/// Parse raw CLI tokens
pub fn parse_tokens<S: AsRef<str>>(raw: &[S]) -> Vec<SelectorToken> {
    raw.iter()
        .map(|s| s.as_ref())
        .filter(|s| !s.trim().is_empty())
        .map(SelectorToken::parse)
        .collect()
}
