// ── Platform abstraction layer ────────────────────────────────────────────────
//
// This module selects the native recursive lock for the target.  No `unsafe`
// lives here; all FFI is confined to the `win32` and `unix` sub-modules and
// never leaks outward.  Both backends expose the same inherent API on a type
// named `RawRecursiveLock`:
//
//   new() -> Result<Self>   lock()   try_lock() -> bool   unsafe unlock()

#[cfg(windows)]
pub(crate) mod win32;
#[cfg(windows)]
pub(crate) use win32::critical_section::RawRecursiveLock;

#[cfg(unix)]
pub(crate) mod unix;
#[cfg(unix)]
pub(crate) use unix::pthread::RawRecursiveLock;
