/// widebridge build script.
///
/// The native mutex has exactly two backends: `CRITICAL_SECTION` on Windows
/// and a recursive `pthread_mutex_t` on Unix.  Fail loudly on any other
/// target family rather than producing a crate with no lock implementation.
fn main() {
    let family = std::env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();
    let supported = family
        .split(',')
        .any(|f| f == "windows" || f == "unix");
    if !supported {
        panic!(
            "widebridge only builds for Windows or Unix targets \
             (CARGO_CFG_TARGET_FAMILY = {family:?})"
        );
    }

    // Only re-run the build script when it changes.
    println!("cargo:rerun-if-changed=build.rs");
}
