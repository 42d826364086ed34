// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in widebridge return `error::Result<T>`.  Only
// construction-time work can fail: creating a native lock, installing the
// global logger, and reading logger settings.  Contract violations (releasing
// an unheld lock, using a wide pointer after its adapter is gone) are not
// errors; they are ruled out by the type system or documented as `unsafe`.

/// Every error that widebridge can produce.
#[derive(Debug, thiserror::Error)]
pub enum InteropError {
    /// A Win32 API call returned a failure code.
    #[cfg(windows)]
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// A POSIX threading call returned a nonzero error number.
    #[cfg(unix)]
    #[error("{function} failed (errno {code})")]
    Posix {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The value returned by the call (pthread functions return the errno
        /// directly rather than setting `errno`).
        code: i32,
    },

    /// A standard I/O error while reading a settings file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logger settings were not valid JSON for `LogSettings`.
    #[error("invalid log settings: {0}")]
    Config(#[from] serde_json::Error),

    /// A global logger was already installed for this process.
    #[error("a global logger is already installed: {0}")]
    LoggerAlreadySet(#[from] log::SetLoggerError),
}

// Convert a windows-crate error (HRESULT) directly into an InteropError so
// that `?` can be used on `windows::core::Result<T>` in the platform module.
#[cfg(windows)]
impl From<windows::core::Error> for InteropError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        // Win32 errors appear as 0x8007xxxx HRESULTs.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InteropError>;

// ── Tests ─────────────────────────────────────────────────────────────────────
