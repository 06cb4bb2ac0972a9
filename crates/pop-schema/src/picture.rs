//! PICTURE string analysis.
//!
//! Reduces a picture to its category, display length, digit count, and
//! implied scale. Repeat counts `n(k)` are expanded. `P` scaling positions
//! are supported only between the implied decimal point and the first
//! digit (`VPP99`, `PP99`), so every numeric maps onto a non-negative
//! [`pop_core::ScaledDecimal`] scale.

use serde::Serialize;

/// Category of data a picture describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PictureCategory {
    /// `X` positions, possibly mixed with `A` or `9`.
    Alphanumeric,
    /// `A` positions only.
    Alphabetic,
    /// `9`, `S`, `V`, `P` only.
    Numeric,
    /// Numeric with editing symbols (`Z`, `$`, `CR`, ...).
    NumericEdited,
    /// Alphanumeric with insertion symbols (`B`, `0`, `/`).
    AlphanumericEdited,
}

impl PictureCategory {
    /// True for edited pictures, which decode as display text.
    pub fn is_edited(&self) -> bool {
        matches!(self, Self::NumericEdited | Self::AlphanumericEdited)
    }
}

/// The analyzed form of a picture string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    /// What kind of data the picture holds.
    pub category: PictureCategory,
    /// `S` was present.
    pub signed: bool,
    /// Number of `9` positions.
    pub digits: u32,
    /// Implied fractional digits (`9` and `P` positions right of `V`).
    pub scale: u32,
    /// Characters occupied in DISPLAY usage, excluding a separate sign.
    pub display_length: usize,
}

/// Analyze a picture string. The error is a human-readable reason.
pub fn analyze_picture(picture: &str) -> Result<Picture, String> {
    let chars: Vec<char> = picture.to_ascii_uppercase().chars().collect();
    if chars.is_empty() {
        return Err("empty picture".to_string());
    }

    let mut signed = false;
    let mut seen_v = false;
    let mut leading_p = false;
    let mut frac_9 = false;
    let mut digits = 0u32;
    let mut scale = 0u32;
    let mut display_length = 0usize;
    let (mut has_9, mut has_x, mut has_a, mut has_edit, mut has_p) = (false, false, false, false, false);
    let mut position = 0usize;

    let mut i = 0;
    while i < chars.len() {
        let symbol = chars[i];
        if (symbol == 'C' && chars.get(i + 1) == Some(&'R')) || (symbol == 'D' && chars.get(i + 1) == Some(&'B')) {
            if i + 2 != chars.len() {
                return Err("CR and DB must end the picture".to_string());
            }
            has_edit = true;
            display_length += 2;
            break;
        }
        i += 1;
        let count = if chars.get(i) == Some(&'(') {
            let close = chars[i..]
                .iter()
                .position(|c| *c == ')')
                .map(|p| p + i)
                .ok_or_else(|| "unclosed repeat count".to_string())?;
            let text: String = chars[i + 1..close].iter().collect();
            let n: u32 = text
                .parse()
                .map_err(|_| format!("invalid repeat count \"{text}\""))?;
            if n == 0 {
                return Err("repeat count must be positive".to_string());
            }
            i = close + 1;
            n
        } else {
            1
        };

        match symbol {
            '9' => {
                has_9 = true;
                digits = digits.checked_add(count).ok_or("too many digits")?;
                if seen_v || leading_p {
                    frac_9 = true;
                    scale = scale.saturating_add(count);
                }
                display_length += count as usize;
            }
            'X' => {
                has_x = true;
                display_length += count as usize;
            }
            'A' => {
                has_a = true;
                display_length += count as usize;
            }
            'S' => {
                if position != 0 || count != 1 || signed {
                    return Err("S must appear once, first".to_string());
                }
                signed = true;
            }
            'V' => {
                if seen_v || count != 1 {
                    return Err("V may appear only once".to_string());
                }
                if leading_p {
                    return Err("V cannot follow leading P positions".to_string());
                }
                seen_v = true;
            }
            'P' => {
                has_p = true;
                if seen_v {
                    if frac_9 {
                        return Err("P must immediately follow V".to_string());
                    }
                    if has_9 {
                        return Err("P right of V cannot follow integer digits".to_string());
                    }
                    scale = scale.saturating_add(count);
                } else if has_9 {
                    return Err("P scaling left of the decimal point is not supported".to_string());
                } else {
                    leading_p = true;
                    scale = scale.saturating_add(count);
                }
            }
            'Z' | '*' | '+' | '-' | '$' | ',' | '.' | '/' | 'B' | '0' => {
                has_edit = true;
                display_length += count as usize;
            }
            other => return Err(format!("unknown picture symbol '{other}'")),
        }
        position += 1;
    }

    let category = if has_edit {
        if has_x || has_a {
            PictureCategory::AlphanumericEdited
        } else {
            PictureCategory::NumericEdited
        }
    } else if has_x || (has_a && has_9) {
        PictureCategory::Alphanumeric
    } else if has_a {
        PictureCategory::Alphabetic
    } else if has_9 {
        PictureCategory::Numeric
    } else {
        return Err("picture has no character or digit positions".to_string());
    };

    let numeric_symbols = signed || seen_v || has_p;
    if numeric_symbols && !matches!(category, PictureCategory::Numeric | PictureCategory::NumericEdited) {
        return Err("S, V and P are only valid in numeric pictures".to_string());
    }
    if signed && category == PictureCategory::NumericEdited {
        return Err("S is not valid in an edited picture".to_string());
    }

    Ok(Picture {
        category,
        signed,
        digits,
        scale,
        display_length,
    })
}
