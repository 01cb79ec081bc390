//! Formatter
//!
//! Turns printable values into display text and display text into frames.
//! Everything here is pure; the display applies the result under its lock.
//!
//! Decimal points do not take a digit of their own: a `.` attaches to the
//! glyph on its left. A leading `.` or a second consecutive `.` inserts a
//! blank digit to carry it.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::error::DisplayError;
use crate::frame::{Frame, Geometry, MAX_DIGITS};
use crate::glyph::GlyphTable;

/// Longest text the formatter builds (every digit followed by a dot, plus sign)
pub const TEXT_CAP: usize = 2 * MAX_DIGITS + 2;

/// Formatted display text
pub type Text = String<TEXT_CAP>;

/// Highest gauge level
pub const GAUGE_MAX_LEVEL: i32 = 3;

/// Digits a gauge needs
pub const GAUGE_MIN_DIGITS: u8 = 4;

/// Bar glyphs for a single gauge, indexed by level
const GAUGE_BARS: [&str; 4] = ["   ", "_  ", "_= ", "_=~"];

/// Stacked bar glyph for each half of a double gauge, indexed by level
const DOUBLE_GAUGE_BARS: [char; 4] = [' ', '_', '=', '~'];

/// Render display text into a frame
///
/// Text is left-aligned; unused digits are blank.
pub fn render_text(glyphs: &GlyphTable, digits: u8, text: &str) -> Result<Frame, DisplayError> {
    let mut masks: Vec<u8, MAX_DIGITS> = Vec::new();
    let mut dots: Vec<bool, MAX_DIGITS> = Vec::new();
    let mut after_dot = true;

    for ch in text.chars() {
        if ch == '.' {
            if after_dot {
                // Nothing to attach to, carry the dot on a blank digit
                push_glyph(&mut masks, &mut dots, digits, glyphs.space())?;
            }
            if let Some(dot) = dots.last_mut() {
                *dot = true;
            }
            after_dot = true;
        } else {
            let mask = glyphs
                .encode(ch)
                .ok_or(DisplayError::InvalidCharacter(ch))?;
            push_glyph(&mut masks, &mut dots, digits, mask)?;
            after_dot = false;
        }
    }

    let mut frame = Frame::new();
    for position in 0..digits as usize {
        let mask = match (masks.get(position), dots.get(position)) {
            (Some(&mask), Some(true)) => glyphs.with_dot(mask),
            (Some(&mask), _) => mask,
            (None, _) => glyphs.space(),
        };
        frame.push(mask).map_err(|_| DisplayError::TooLong)?;
    }
    Ok(frame)
}

fn push_glyph(
    masks: &mut Vec<u8, MAX_DIGITS>,
    dots: &mut Vec<bool, MAX_DIGITS>,
    digits: u8,
    mask: u8,
) -> Result<(), DisplayError> {
    if masks.len() >= digits as usize {
        return Err(DisplayError::TooLong);
    }
    masks.push(mask).map_err(|_| DisplayError::TooLong)?;
    dots.push(false).map_err(|_| DisplayError::TooLong)?;
    Ok(())
}

/// Number of decimal digits in `value`
fn decimal_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 10 {
        value /= 10;
        len += 1;
    }
    len
}

fn push_padding(text: &mut Text, count: usize, zero_pad: bool) -> Result<(), DisplayError> {
    let pad = if zero_pad { '0' } else { ' ' };
    for _ in 0..count {
        text.push(pad).map_err(|_| DisplayError::TooLong)?;
    }
    Ok(())
}

/// Format an integer
///
/// When right-aligned the sign keeps the leftmost digit and the padding
/// goes between sign and magnitude.
pub fn int_text(
    geometry: &Geometry,
    value: i32,
    right_align: bool,
    zero_pad: bool,
) -> Result<Text, DisplayError> {
    if !geometry.contains(value) {
        return Err(DisplayError::OutOfRange);
    }

    let negative = value < 0;
    let magnitude = value.unsigned_abs() as u64;
    let mut text = Text::new();

    if negative {
        text.push('-').map_err(|_| DisplayError::TooLong)?;
    }
    if right_align {
        let used = decimal_len(magnitude) + negative as usize;
        let width = geometry.digits() as usize;
        push_padding(&mut text, width.saturating_sub(used), zero_pad)?;
    }
    write!(text, "{}", magnitude).map_err(|_| DisplayError::TooLong)?;

    Ok(text)
}

/// Format a decimal number
///
/// The fraction is truncated, never rounded, and always shows exactly
/// `decimals` digits. `decimals == 0` formats the truncated integer part.
pub fn float_text(
    geometry: &Geometry,
    value: f64,
    decimals: u8,
    right_align: bool,
    zero_pad: bool,
) -> Result<Text, DisplayError> {
    if !value.is_finite() {
        return Err(DisplayError::OutOfRange);
    }
    if decimals == 0 {
        return int_text(geometry, value as i32, right_align, zero_pad);
    }
    if value < geometry.value_min() as f64 || value > geometry.value_max() as f64 {
        return Err(DisplayError::OutOfRange);
    }
    if decimals > geometry.digits() {
        return Err(DisplayError::TooManyDecimals);
    }

    let int_part = value as i32;
    let whole = int_part.unsigned_abs() as u64;
    let negative = value < 0.0;
    let int_len = decimal_len(whole) + (int_part < 0) as usize;

    // (-1, 0) has a "0" integer part but still needs the sign
    let budget = if value > -1.0 && value < 0.0 {
        geometry.digits() as usize - 1
    } else {
        geometry.digits() as usize
    };
    if decimals as usize + int_len > budget {
        return Err(DisplayError::TooLong);
    }

    let pow = 10u64.pow(decimals as u32);
    let magnitude = if negative { -value } else { value };
    let scaled = (magnitude * pow as f64) as u64;
    let fraction = scaled.saturating_sub(whole * pow).min(pow - 1);

    let mut text = Text::new();
    if negative {
        text.push('-').map_err(|_| DisplayError::TooLong)?;
    }
    if right_align {
        let used = negative as usize + decimal_len(whole) + decimals as usize;
        push_padding(&mut text, (geometry.digits() as usize).saturating_sub(used), zero_pad)?;
    }
    write!(
        text,
        "{}.{:0width$}",
        whole,
        fraction,
        width = decimals as usize
    )
    .map_err(|_| DisplayError::TooLong)?;

    Ok(text)
}

/// Text for a single bar gauge: label followed by up to three bars
pub fn gauge_text(digits: u8, level: i32, label: char) -> Result<Text, DisplayError> {
    if digits < GAUGE_MIN_DIGITS {
        return Err(DisplayError::TooFewDigits);
    }
    if !(0..=GAUGE_MAX_LEVEL).contains(&level) {
        return Err(DisplayError::InvalidLevel);
    }

    let mut text = Text::new();
    text.push(label).map_err(|_| DisplayError::TooLong)?;
    text.push_str(GAUGE_BARS[level as usize])
        .map_err(|_| DisplayError::TooLong)?;
    Ok(text)
}

/// Quantize a fraction in `0.0..=1.0` to a gauge level
pub fn gauge_level(fraction: f64) -> Result<i32, DisplayError> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(DisplayError::InvalidLevel);
    }

    let level = if fraction < 0.25 {
        0
    } else if fraction < 0.50 {
        1
    } else if fraction < 0.75 {
        2
    } else {
        3
    };
    Ok(level)
}

/// Text for two side-by-side gauges, each a label plus a stacked bar
///
/// Displays wider than four digits get blank digits between the halves.
pub fn double_gauge_text(
    digits: u8,
    left_level: i32,
    right_level: i32,
    left_label: char,
    right_label: char,
) -> Result<Text, DisplayError> {
    if digits < GAUGE_MIN_DIGITS {
        return Err(DisplayError::TooFewDigits);
    }
    let valid = 0..=GAUGE_MAX_LEVEL;
    if !valid.contains(&left_level) || !valid.contains(&right_level) {
        return Err(DisplayError::InvalidLevel);
    }

    let mut text = Text::new();
    text.push(left_label).map_err(|_| DisplayError::TooLong)?;
    text.push(DOUBLE_GAUGE_BARS[left_level as usize])
        .map_err(|_| DisplayError::TooLong)?;
    push_padding(&mut text, (digits - GAUGE_MIN_DIGITS) as usize / 2, false)?;
    text.push(right_label).map_err(|_| DisplayError::TooLong)?;
    text.push(DOUBLE_GAUGE_BARS[right_level as usize])
        .map_err(|_| DisplayError::TooLong)?;
    Ok(text)
}
