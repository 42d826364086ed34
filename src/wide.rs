// ── Transient UTF-16 argument adapter ─────────────────────────────────────────
//
// `WideArg` owns the UTF-16 copy of one UTF-8 string for as long as a single
// Win32 call needs it.  Intended use is an unnamed temporary inside the
// argument list:
//
//     SetWindowTextW(hwnd, WideArg::new(title).as_pcwstr());
//
// Rust keeps the temporary alive until the end of the enclosing statement,
// so the pointer is valid for the whole call and gone right after it.
//
// Ownership rules:
//   • No `Clone`/`Copy`: each adapter owns exactly one buffer.
//   • `!Send` + `!Sync`: neither the adapter nor a borrow of it can reach
//     another thread, so a pointer derived from it stays on the calling
//     thread.
//   • Moving the handle is harmless: the code units live on the heap and
//     never relocate once built.
//
// "Null" and "empty" are different things.  A null source pointer yields null
// from every pointer accessor; an empty string yields a valid pointer to a
// lone terminator.

#![allow(unsafe_code)]

use std::ffi::c_char;
use std::fmt;
use std::marker::PhantomData;

#[cfg(windows)]
use windows::core::{PCWSTR, PWSTR};

use crate::encoding::{encode_as_utf16, encode_cstr_as_utf16};

/// A UTF-16 copy of a UTF-8 string, alive for the duration of one API call.
///
/// Cannot be sent to another thread:
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<widebridge::WideArg>();
/// ```
///
/// nor shared with one:
///
/// ```compile_fail
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<widebridge::WideArg>();
/// ```
///
/// The same check passes for an ordinary owned buffer:
///
/// ```
/// fn assert_send_sync<T: Send + Sync>() {}
/// assert_send_sync::<Vec<u16>>();
/// ```
#[must_use = "a WideArg exists only to be passed to a wide-string API"]
pub struct WideArg {
    /// Converted code units, always ending with exactly one `0`.
    buf: Vec<u16>,
    /// The source pointer was null (as opposed to pointing at "").
    is_null: bool,
    /// Opts out of `Send` and `Sync`.
    _not_send: PhantomData<*mut u16>,
}

impl WideArg {
    fn from_parts(buf: Vec<u16>, is_null: bool) -> Self {
        debug_assert_eq!(buf.last(), Some(&0), "buffer must be null-terminated");
        Self {
            buf,
            is_null,
            _not_send: PhantomData,
        }
    }

    /// Convert a string view.  Never null, even when `s` is empty.
    pub fn new(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    /// Convert a byte view that should hold UTF-8.
    ///
    /// Never null.  Malformed sequences are replaced with U+FFFD.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_parts(encode_as_utf16(bytes), false)
    }

    /// Convert an optional string; `None` stands in for a null pointer.
    pub fn from_opt(s: Option<&str>) -> Self {
        match s {
            Some(s) => Self::new(s),
            None => Self::null(),
        }
    }

    /// Convert a raw, possibly-null C string.
    ///
    /// The adapter is null exactly when `ptr` is null.  A non-null pointer to
    /// an empty string produces an empty, non-null adapter.
    ///
    /// # Safety
    ///
    /// If non-null, `ptr` must point to a NUL-terminated byte string that
    /// stays valid for the duration of this call.  The bytes are copied, so
    /// the source may be freed once this returns.
    pub unsafe fn from_ptr(ptr: *const c_char) -> Self {
        // SAFETY: forwarded from this function's contract.
        let buf = unsafe { encode_cstr_as_utf16(ptr) };
        Self::from_parts(buf, ptr.is_null())
    }

    /// A logically null adapter.
    pub fn null() -> Self {
        Self::from_parts(vec![0], true)
    }

    /// `true` when built from a null pointer (or `None`).
    pub fn is_null(&self) -> bool {
        self.is_null
    }

    /// Length in UTF-16 code units, not counting the terminator.
    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    /// `true` for a null adapter and for one built from an empty string.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The converted code units without the terminator.
    pub fn as_wide(&self) -> &[u16] {
        &self.buf[..self.len()]
    }

    /// Read-only pointer for `LPCWSTR` parameters.
    ///
    /// Null when [`is_null`](Self::is_null); otherwise points at the owned,
    /// null-terminated buffer.  Valid only while `self` is alive.
    pub fn as_ptr(&self) -> *const u16 {
        if self.is_null {
            std::ptr::null()
        } else {
            self.buf.as_ptr()
        }
    }

    /// Mutable pointer for APIs declared `LPWSTR` that do not actually
    /// resize the string (e.g. `CreateProcessW`'s command line).
    ///
    /// Same null behavior as [`as_ptr`](Self::as_ptr).  The callee may
    /// rewrite at most `len() + 1` code units in place.
    pub fn as_mut_ptr(&mut self) -> *mut u16 {
        if self.is_null {
            std::ptr::null_mut()
        } else {
            self.buf.as_mut_ptr()
        }
    }

    /// The buffer as a `windows` crate `PCWSTR`.
    #[cfg(windows)]
    pub fn as_pcwstr(&self) -> PCWSTR {
        PCWSTR(self.as_ptr())
    }

    /// The buffer as a `windows` crate `PWSTR`.
    #[cfg(windows)]
    pub fn as_pwstr(&mut self) -> PWSTR {
        PWSTR(self.as_mut_ptr())
    }
}

impl From<&str> for WideArg {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&String> for WideArg {
    fn from(s: &String) -> Self {
        Self::new(s)
    }
}

impl From<Option<&str>> for WideArg {
    fn from(s: Option<&str>) -> Self {
        Self::from_opt(s)
    }
}

impl fmt::Debug for WideArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null {
            f.write_str("WideArg(null)")
        } else {
            write!(f, "WideArg({:?})", String::from_utf16_lossy(self.as_wide()))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
