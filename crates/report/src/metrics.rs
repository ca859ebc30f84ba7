//! Text metrics for layout
//!
//! Advance widths come from the standard Helvetica and Helvetica-Bold AFM
//! tables. Liberation Sans, the face embedded at render time, shares these
//! metrics, so layout can measure text without loading any font file.

const PT_PER_INCH: f64 = 72.0;
const MM_PER_INCH: f64 = 25.4;

/// Advance used for characters outside printable ASCII: a full em, the
/// widest Latin glyphs (dashes, ellipsis, ligatures), so wrapped lines never
/// overflow their column
const FALLBACK_ADVANCE: u16 = 1000;

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Helvetica-Bold advance widths for ASCII 32..=126, in 1/1000 em
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

/// Convert points to millimetres
pub fn pt_to_mm(pt: f64) -> f64 {
    pt * MM_PER_INCH / PT_PER_INCH
}

fn advance(c: char, bold: bool) -> u16 {
    let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
    match c as u32 {
        code @ 32..=126 => table[(code - 32) as usize],
        _ => FALLBACK_ADVANCE,
    }
}

/// Rendered width of `text` in millimetres
pub fn text_width(text: &str, font_size: u8, bold: bool) -> f64 {
    let units: u32 = text.chars().map(|c| u32::from(advance(c, bold))).sum();
    pt_to_mm(f64::from(units) / 1000.0 * f64::from(font_size))
}

/// Greedy word wrap to `max_width` millimetres.
///
/// Explicit newlines start a new line. Words wider than the column are
/// broken at character boundaries. Always returns at least one line.
pub fn wrap(text: &str, max_width: f64, font_size: u8, bold: bool) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width(&candidate, font_size, bold) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width(word, font_size, bold) <= max_width {
                current = word.to_string();
            } else {
                let mut pieces = break_word(word, max_width, font_size, bold);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Split a single word into pieces that each fit `max_width`.
/// Every piece holds at least one character so the split always advances.
fn break_word(word: &str, max_width: f64, font_size: u8, bold: bool) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if current.chars().count() > 1 && text_width(&current, font_size, bold) > max_width {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Shorten `text` with a trailing ellipsis until it fits `max_width`
pub fn truncate_to_width(text: &str, max_width: f64, font_size: u8, bold: bool) -> String {
    if text_width(text, font_size, bold) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "...";
        if text_width(&candidate, font_size, bold) <= max_width {
            return candidate;
        }
    }
    String::new()
}
