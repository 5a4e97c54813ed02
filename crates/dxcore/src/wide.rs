//! Wide character to narrow string conversion.
//!
//! libdxcore reports paths as `wchar_t` strings. Conversion here does not
//! depend on the process locale: input is cut at the first NUL, 32-bit units
//! are read as Unicode scalar values and 16-bit units as UTF-16. Output is
//! UTF-8. A unit that does not decode is rejected with
//! [`DxcoreError::InvalidWideChar`] rather than silently truncated.

use crate::error::{DxcoreError, Result};
use std::ffi::CString;

/// A wide character code unit.
pub trait WideUnit: Copy + Eq {
    const NUL: Self;

    /// Decode `units` (no NUL inside) and append the text to `out`.
    fn decode_into(units: &[Self], out: &mut String) -> Result<()>;

    /// Encode `text` as code units, without a terminator.
    fn encode(text: &str) -> Vec<Self>;
}

fn decode_scalars(units: impl Iterator<Item = u32>, out: &mut String) -> Result<()> {
    for (offset, unit) in units.enumerate() {
        let c = char::from_u32(unit).ok_or(DxcoreError::InvalidWideChar { offset, unit })?;
        out.push(c);
    }
    Ok(())
}

impl WideUnit for u32 {
    const NUL: Self = 0;

    fn decode_into(units: &[Self], out: &mut String) -> Result<()> {
        decode_scalars(units.iter().copied(), out)
    }

    fn encode(text: &str) -> Vec<Self> {
        text.chars().map(u32::from).collect()
    }
}

impl WideUnit for i32 {
    const NUL: Self = 0;

    fn decode_into(units: &[Self], out: &mut String) -> Result<()> {
        decode_scalars(units.iter().map(|&u| u as u32), out)
    }

    fn encode(text: &str) -> Vec<Self> {
        text.chars().map(|c| u32::from(c) as i32).collect()
    }
}

impl WideUnit for u16 {
    const NUL: Self = 0;

    fn decode_into(units: &[Self], out: &mut String) -> Result<()> {
        let mut offset = 0;
        for decoded in char::decode_utf16(units.iter().copied()) {
            match decoded {
                Ok(c) => {
                    out.push(c);
                    offset += c.len_utf16();
                }
                Err(e) => {
                    return Err(DxcoreError::InvalidWideChar {
                        offset,
                        unit: u32::from(e.unpaired_surrogate()),
                    })
                }
            }
        }
        Ok(())
    }

    fn encode(text: &str) -> Vec<Self> {
        text.encode_utf16().collect()
    }
}

/// Convert a wide string to an owned, NUL-terminated narrow string.
///
/// For ASCII input the allocation is exactly one byte per character plus the
/// terminator. An empty input yields an empty (but valid) string.
pub fn wide_to_narrow<W: WideUnit>(units: &[W]) -> Result<CString> {
    let end = units.iter().position(|&u| u == W::NUL).unwrap_or(units.len());

    let mut text = String::new();
    text.try_reserve_exact(end + 1)
        .map_err(|_| DxcoreError::OutOfMemory {
            what: "driver store path",
        })?;
    W::decode_into(&units[..end], &mut text)?;

    // Input was cut at the first NUL and decoding never yields one.
    CString::new(text).map_err(|e| DxcoreError::InvalidWideChar {
        offset: e.nul_position(),
        unit: 0,
    })
}

/// Encode `text` as platform wide characters, without a terminator.
pub fn encode_wide<W: WideUnit>(text: &str) -> Vec<W> {
    W::encode(text)
}
