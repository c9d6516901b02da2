//! # Name Normalization
//!
//! Maps an item display name to the key used to detect duplicates.
//!
//! ```text
//!   "針１８Ｇ"      ──┐
//!   "針18G"         ──┼──► normalize_name ──► "針18g"
//!   "針 18 G"       ──┘
//! ```
//!
//! Equal keys are treated as "the same physical item". This is a heuristic:
//! distinct items can collide and typos are not caught.

/// Offset between a full-width ASCII variant and its half-width character.
const FULL_WIDTH_OFFSET: u32 = 0xFEE0;

/// Computes the normalization key of a display name.
///
/// 1. Full-width Latin letters and digits fold to half-width
/// 2. Whitespace is removed: the ideographic space U+3000 and the byte
///    order mark U+FEFF that CSV imports leave in front of a name included
/// 3. The result is lowercased
///
/// ## Example
/// ```rust
/// use medstock_core::normalize::normalize_name;
///
/// assert_eq!(normalize_name("針１８Ｇ"), normalize_name("針18G"));
/// assert_eq!(normalize_name("LT #２"), "lt#2");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(fold_full_width)
        .filter(|&c| !is_separator(c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn fold_full_width(c: char) -> char {
    match c {
        'Ａ'..='Ｚ' | 'ａ'..='ｚ' | '０'..='９' => {
            char::from_u32(c as u32 - FULL_WIDTH_OFFSET).unwrap_or(c)
        }
        _ => c,
    }
}

/// Space and line-break characters, plus U+FEFF. U+0085 (NEL) is kept.
fn is_separator(c: char) -> bool {
    c == '\u{FEFF}' || (c.is_whitespace() && c != '\u{85}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_full_width_letters_and_digits() {
        assert_eq!(normalize_name("ＡＢＣ１２３ａｂｃ"), "abc123abc");
    }

    #[test]
    fn test_strips_all_whitespace() {
        assert_eq!(normalize_name(" 経鼻AW\u{3000}6 \t"), "経鼻aw6");
    }

    #[test]
    fn test_strips_byte_order_mark() {
        assert_eq!(normalize_name("\u{FEFF}針18G"), normalize_name("針18G"));
        assert_eq!(normalize_name("\u{FEFF}三角巾\u{A0}"), "三角巾");
    }

    #[test]
    fn test_case_fold() {
        assert_eq!(normalize_name("i-GEL #5"), normalize_name("I-gel #5"));
    }

    #[test]
    fn test_leaves_other_full_width_symbols() {
        // Full-width punctuation is not part of the folded range
        assert_eq!(normalize_name("キープポア（サイズ1.2㎝）"), "キープポア（サイズ1.2㎝）");
    }

    #[test]
    fn test_needle_variants_collide() {
        assert_eq!(normalize_name("針18G"), normalize_name("針１８Ｇ"));
        assert_ne!(normalize_name("針18G"), normalize_name("針20G"));
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("\u{3000} "), "");
    }
}
