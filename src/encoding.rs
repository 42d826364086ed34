// ── UTF-8 → UTF-16 conversion ─────────────────────────────────────────────────
//
// The application keeps every string in UTF-8.  Win32 wants null-terminated
// UTF-16.  The conversion runs in exactly one direction and only at the
// moment a string crosses into an API call (see `wide::WideArg`).
//
// Malformed UTF-8 is not rejected: each invalid sequence becomes U+FFFD.
// The only guarantee for such input is that conversion never faults.

#![allow(unsafe_code)]

use std::borrow::Cow;
use std::ffi::{c_char, CStr};

/// Convert a UTF-8 byte view into a null-terminated UTF-16 buffer.
///
/// Valid input converts exactly.  Invalid sequences are replaced with U+FFFD
/// and the replacement is reported at `debug` level.  The returned buffer
/// always ends with a single `0` terminator, so an empty view yields `[0]`.
pub fn encode_as_utf16(utf8: &[u8]) -> Vec<u16> {
    let text = String::from_utf8_lossy(utf8);
    if let Cow::Owned(_) = text {
        log::debug!(
            "malformed UTF-8 ({} bytes) replaced with U+FFFD at the UTF-16 boundary",
            utf8.len()
        );
    }
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Convert a possibly-null C string into a null-terminated UTF-16 buffer.
///
/// A null `ptr` yields an empty buffer (`[0]`).  The caller that cares about
/// the difference between "null" and "empty" has to record it separately.
///
/// # Safety
///
/// If non-null, `ptr` must point to a NUL-terminated byte string that stays
/// valid and unmodified for the duration of this call.
pub unsafe fn encode_cstr_as_utf16(ptr: *const c_char) -> Vec<u16> {
    if ptr.is_null() {
        return vec![0];
    }
    // SAFETY: non-null and NUL-terminated per this function's contract.
    let bytes = unsafe { CStr::from_ptr(ptr) }.to_bytes();
    encode_as_utf16(bytes)
}

/// `true` when the UTF-8 view has zero length.
pub fn is_empty(view: &str) -> bool {
    view.is_empty()
}

/// Number of UTF-16 code units before the first `0` terminator.
///
/// Returns `buf.len()` when no terminator is present.
pub fn wide_len(buf: &[u16]) -> usize {
    buf.iter().position(|&c| c == 0).unwrap_or(buf.len())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(buf: &[u16]) -> String {
        String::from_utf16(&buf[..wide_len(buf)]).expect("valid UTF-16")
    }

    #[test]
    fn empty_view_is_a_lone_terminator() {
        assert_eq!(encode_as_utf16(b""), vec![0]);
    }

    #[test]
    fn ascii_roundtrips_exactly() {
        for s in ["a", "Hello, Windows!", "C:\\Users\\alice\\file.txt", " \t~"] {
            let wide = encode_as_utf16(s.as_bytes());
            assert_eq!(wide.last(), Some(&0));
            assert_eq!(wide.len(), s.len() + 1);
            assert_eq!(decode(&wide), s);
        }
    }

    #[test]
    fn supplementary_plane_becomes_surrogate_pair() {
        // U+1F980 CRAB: 4 UTF-8 bytes, 2 UTF-16 code units.
        let wide = encode_as_utf16("🦀".as_bytes());
        assert_eq!(wide, vec![0xD83E, 0xDD80, 0]);
    }

    #[test]
    fn bmp_non_ascii_is_one_unit_each() {
        let wide = encode_as_utf16("żółw".as_bytes());
        assert_eq!(wide_len(&wide), 4);
        assert_eq!(decode(&wide), "żółw");
    }

    #[test]
    fn malformed_input_does_not_fault() {
        // Lone continuation byte, truncated 3-byte sequence, overlong NUL.
        let wide = encode_as_utf16(&[b'a', 0x80, b'b', 0xE2, 0x82, 0xC0, 0x80]);
        assert_eq!(wide.last(), Some(&0));
        assert_eq!(wide[0], u16::from(b'a'));
        assert!(wide.contains(&0xFFFD));
        assert!(wide.contains(&u16::from(b'b')));
    }

    #[test]
    fn null_cstr_is_empty() {
        // SAFETY: null is explicitly allowed.
        let wide = unsafe { encode_cstr_as_utf16(std::ptr::null()) };
        assert_eq!(wide, vec![0]);
    }

    #[test]
    fn cstr_stops_at_first_nul() {
        let raw = b"abc\0def\0";
        // SAFETY: `raw` is NUL-terminated and outlives the call.
        let wide = unsafe { encode_cstr_as_utf16(raw.as_ptr().cast()) };
        assert_eq!(decode(&wide), "abc");
        assert_eq!(wide.len(), 4);
    }

    #[test]
    fn is_empty_checks_length_only() {
        assert!(is_empty(""));
        assert!(!is_empty(" "));
        assert!(!is_empty("\0"));
    }

    #[test]
    fn wide_len_without_terminator() {
        assert_eq!(wide_len(&[0x41, 0x42]), 2);
        assert_eq!(wide_len(&[]), 0);
        assert_eq!(wide_len(&[0, 0x41]), 0);
    }
}
