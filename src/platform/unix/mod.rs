// ── POSIX platform implementation ─────────────────────────────────────────────
//
// Counterpart of `platform::win32` for non-Windows builds.  The same rule
// applies: every `unsafe` block MUST carry a `// SAFETY:` comment.

#![allow(unsafe_code)]

pub(crate) mod pthread;
