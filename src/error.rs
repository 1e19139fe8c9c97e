//! Fatal configuration errors
//!
//! The rasterizer core has no recoverable runtime errors: geometry that
//! cannot be drawn is silently culled, and everything else is pure
//! computation over already-validated input. The only failure mode is a
//! misconfigured renderer (zero tile count, non-positive surface size),
//! which indicates caller misuse and stops the program.

/// Log the message at error level and abort the calling frame.
///
/// A misconfigured renderer never starts; callers are not expected to
/// recover from this.
#[track_caller]
pub fn fatal(message: &str) -> ! {
    log::error!("FATAL: {message}");
    panic!("{message}");
}
