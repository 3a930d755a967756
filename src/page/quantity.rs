//! Parsing of the abbreviated numbers the game prints.

const SHORT_SUFFIXES: &[(&str, i32)] = &[
    ("k", 3),
    ("m", 6),
    ("b", 9),
    ("t", 12),
    ("qa", 15),
    ("qi", 18),
    ("sx", 21),
    ("sp", 24),
    ("oc", 27),
    ("no", 30),
    ("dc", 33),
];

const WORD_SUFFIXES: &[(&str, i32)] = &[
    ("thousand", 3),
    ("million", 6),
    ("billion", 9),
    ("trillion", 12),
    ("quadrillion", 15),
    ("quintillion", 18),
    ("sextillion", 21),
    ("septillion", 24),
    ("octillion", 27),
    ("nonillion", 30),
    ("decillion", 33),
];

/// Reads the first number in `text`, honouring thousands separators,
/// scientific notation and `K`/`M`/`million`-style suffixes.
///
/// Text without a readable number yields `0.0`.
pub fn parse_quantity(text: &str) -> f64 {
    let Some(start) = text.find(|c: char| c.is_ascii_digit()) else {
        return 0.0;
    };
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | ',' | 'e' | 'E' | '+' | '-')))
        .unwrap_or(rest.len());

    let mut token: String = rest[..end].chars().filter(|c| *c != ',').collect();
    let value = loop {
        if let Ok(value) = token.parse::<f64>() {
            break value;
        }
        // "1.5e" in "1.5e and more": drop the dangling exponent marker.
        match token.pop() {
            Some(_) if !token.is_empty() => continue,
            _ => return 0.0,
        }
    };

    let exponent = suffix_exponent(&rest[token_len(rest, &token)..]);
    let scaled = value * 10f64.powi(exponent);
    if scaled.is_finite() {
        scaled
    } else {
        0.0
    }
}

/// Byte length of `token` within `rest`, counting stripped separators.
fn token_len(rest: &str, token: &str) -> usize {
    let mut wanted = token.chars().count();
    for (idx, c) in rest.char_indices() {
        if wanted == 0 {
            return idx;
        }
        if c != ',' {
            wanted -= 1;
        }
    }
    rest.len()
}

fn suffix_exponent(after: &str) -> i32 {
    let word: String = after
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();
    if word.is_empty() {
        return 0;
    }
    WORD_SUFFIXES
        .iter()
        .chain(SHORT_SUFFIXES)
        .find(|(name, _)| *name == word)
        .map(|(_, exponent)| *exponent)
        .unwrap_or(0)
}
