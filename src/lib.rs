//! Interop helpers for UTF-8 applications that call UTF-16 Win32 APIs.
//!
//! * [`WideArg`] converts a UTF-8 string to null-terminated UTF-16 right at
//!   the call site and keeps the buffer alive for exactly that call:
//!
//!   ```ignore
//!   SetWindowTextW(hwnd, WideArg::new(title).as_pcwstr())?;
//!   ```
//!
//! * [`NativeMutex`] is a reentrant lock that owns one native OS lock object
//!   (`CRITICAL_SECTION` on Windows, a recursive `pthread_mutex_t` elsewhere).
//!
//! * [`logging`] is a six-level logging facade over `log` / `env_logger`.

// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32` / `platform::unix` – native lock FFI
//   • `encoding` / `wide`                  – raw C-string intake
//   • `sync`                               – the `release` contract
// Each unsafe block in those modules MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

pub mod encoding;
mod error;
pub mod logging;
mod platform;
pub mod sync;
pub mod wide;

pub use error::{InteropError, Result};
pub use sync::{NativeMutex, NativeMutexGuard};
pub use wide::WideArg;

#[doc(hidden)]
pub use log as __log;
