/// Outcome judge: does captured output contain the expected answer?
///
/// Rules run in a fixed order and the first match wins:
/// 1. substring containment of the (non-empty) expected answer
/// 2. block-letter rendering of the expected answer (6-row glyph font)
/// 3. scientific-notation spelling of a numeric expected answer
///
/// Every fallback is derived from the expected answer; none matches a
/// literal independent of the challenge being judged.
use regex::Regex;
use std::sync::OnceLock;

const GLYPH_ROWS: usize = 6;
const GLYPH_WIDTH: usize = 4;
/// Letter width plus the one blank column between letters
const GLYPH_STRIDE: usize = GLYPH_WIDTH + 1;

/// Block-letter font used by puzzles whose answer is drawn on a pixel grid.
const GLYPHS: &[(char, [&str; GLYPH_ROWS])] = &[
    ('A', [".##.", "#..#", "#..#", "####", "#..#", "#..#"]),
    ('B', ["###.", "#..#", "###.", "#..#", "#..#", "###."]),
    ('C', [".##.", "#..#", "#...", "#...", "#..#", ".##."]),
    ('E', ["####", "#...", "###.", "#...", "#...", "####"]),
    ('F', ["####", "#...", "###.", "#...", "#...", "#..."]),
    ('G', [".##.", "#..#", "#...", "#.##", "#..#", ".###"]),
    ('H', ["#..#", "#..#", "####", "#..#", "#..#", "#..#"]),
    ('I', [".###", "..#.", "..#.", "..#.", "..#.", ".###"]),
    ('J', ["..##", "...#", "...#", "...#", "#..#", ".##."]),
    ('K', ["#..#", "#.#.", "##..", "#.#.", "#.#.", "#..#"]),
    ('L', ["#...", "#...", "#...", "#...", "#...", "####"]),
    ('O', [".##.", "#..#", "#..#", "#..#", "#..#", ".##."]),
    ('P', ["###.", "#..#", "#..#", "###.", "#...", "#..."]),
    ('R', ["###.", "#..#", "#..#", "###.", "#.#.", "#..#"]),
    ('S', [".###", "#...", "#...", ".##.", "...#", "###."]),
    ('U', ["#..#", "#..#", "#..#", "#..#", "#..#", ".##."]),
    ('Z', ["####", "...#", "..#.", ".#..", "#...", "####"]),
];

/// Characters programs commonly use for a lit pixel
fn is_lit(c: char) -> bool {
    matches!(c, '#' | '█' | '▓' | '@' | '*' | 'X' | 'o')
}

fn scientific_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([-+]?)(\d+)(?:\.(\d+))?[eE]([-+]?\d{1,3})").expect("static regex is valid")
    })
}

fn decimal_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([-+]?)(\d+)(?:\.(\d+))?$").expect("static regex is valid"))
}

/// Which rule produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Substring,
    GlyphRendering,
    NumericSpelling,
}

/// Stateless matching policy
#[derive(Debug, Clone)]
pub struct OutcomeJudge {
    fallbacks: bool,
}

impl Default for OutcomeJudge {
    fn default() -> Self {
        Self { fallbacks: true }
    }
}

impl OutcomeJudge {
    pub fn new(fallbacks: bool) -> Self {
        Self { fallbacks }
    }

    /// Substring rule only
    pub fn strict() -> Self {
        Self::new(false)
    }

    pub fn judge(&self, raw_output: &str, expected: &str) -> bool {
        self.matching_rule(raw_output, expected).is_some()
    }

    /// `expected` is matched verbatim; a blank answer never matches.
    pub fn matching_rule(&self, raw_output: &str, expected: &str) -> Option<MatchRule> {
        if expected.trim().is_empty() {
            return None;
        }
        if raw_output.contains(expected) {
            return Some(MatchRule::Substring);
        }
        if !self.fallbacks {
            return None;
        }
        if contains_rendering(raw_output, expected) {
            return Some(MatchRule::GlyphRendering);
        }
        if contains_numeric_spelling(raw_output, expected) {
            return Some(MatchRule::NumericSpelling);
        }
        None
    }
}

fn glyph(c: char) -> Option<&'static [&'static str; GLYPH_ROWS]> {
    GLYPHS.iter().find(|(g, _)| *g == c).map(|(_, rows)| rows)
}

/// Pixel rows for `text`, or `None` if some character has no glyph.
fn render(text: &str) -> Option<Vec<Vec<bool>>> {
    let glyphs = text.chars().map(glyph).collect::<Option<Vec<_>>>()?;
    let mut rows = vec![Vec::new(); GLYPH_ROWS];
    for (i, g) in glyphs.iter().enumerate() {
        for (row, pattern) in rows.iter_mut().zip(g.iter()) {
            if i > 0 {
                row.push(false);
            }
            row.extend(pattern.chars().map(|c| c == '#'));
        }
    }
    Some(rows)
}

/// True if some 6-line window of `output` draws `expected` in block letters.
fn contains_rendering(output: &str, expected: &str) -> bool {
    let Some(target) = render(expected) else {
        return false;
    };
    let width = target[0].len();
    let lines: Vec<Vec<bool>> = output
        .lines()
        .map(|line| line.chars().map(is_lit).collect())
        .collect();
    if lines.len() < GLYPH_ROWS {
        return false;
    }

    lines.windows(GLYPH_ROWS).any(|window| {
        let max_width = window.iter().map(Vec::len).max().unwrap_or(0);
        (0..=max_width).any(|offset| {
            window.iter().zip(&target).all(|(line, row)| {
                row.iter()
                    .enumerate()
                    .all(|(col, lit)| pixel(line, offset + col) == *lit)
            }) && neighbours_are_dark(window, offset, width)
        })
    })
}

fn pixel(line: &[bool], col: usize) -> bool {
    line.get(col).copied().unwrap_or(false)
}

/// One glyph slot on either side of a rendering must be dark, so a longer
/// word drawn on the same grid does not count as this one.
fn neighbours_are_dark(window: &[Vec<bool>], offset: usize, width: usize) -> bool {
    let before = offset.saturating_sub(GLYPH_STRIDE)..offset;
    let after = offset + width..offset + width + GLYPH_STRIDE;
    window
        .iter()
        .all(|line| !before.clone().chain(after.clone()).any(|col| pixel(line, col)))
}

/// True if `output` spells the numeric `expected` in scientific notation,
/// e.g. `1.234567e+06` or `1.234567e+006` for `1234567`. Values are compared
/// as exact decimal text, never through floating point.
fn contains_numeric_spelling(output: &str, expected: &str) -> bool {
    let Some(caps) = decimal_literal().captures(expected) else {
        return false;
    };
    let int = &caps[2];
    let frac = caps.get(3).map_or("", |m| m.as_str());
    let target = canonical_decimal(&caps[1] == "-", &format!("{}{}", int, frac), int.len() as i64);

    scientific_token().captures_iter(output).any(|token| {
        let int = &token[2];
        let frac = token.get(3).map_or("", |m| m.as_str());
        let Ok(exponent) = token[4].parse::<i64>() else {
            return false;
        };
        canonical_decimal(
            &token[1] == "-",
            &format!("{}{}", int, frac),
            int.len() as i64 + exponent,
        ) == target
    })
}

/// Plain decimal text for `digits` with the decimal point `point` places
/// from its start: no leading integer zeros, no trailing fraction zeros.
fn canonical_decimal(negative: bool, digits: &str, point: i64) -> String {
    let len = digits.len() as i64;
    let (int, frac) = if point <= 0 {
        (String::new(), format!("{}{}", "0".repeat((-point) as usize), digits))
    } else if point >= len {
        (format!("{}{}", digits, "0".repeat((point - len) as usize)), String::new())
    } else {
        let (i, f) = digits.split_at(point as usize);
        (i.to_string(), f.to_string())
    };

    let int = int.trim_start_matches('0');
    let frac = frac.trim_end_matches('0');
    let mut text = if int.is_empty() { "0".to_string() } else { int.to_string() };
    if !frac.is_empty() {
        text.push('.');
        text.push_str(frac);
    }
    if negative && text != "0" {
        text.insert(0, '-');
    }
    text
}
