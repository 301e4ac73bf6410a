//! Process-wide transient-fault suppression.
//!
//! The protocol bridge produces a steady trickle of self-resolving transport
//! failures (stream replacements, socket timeouts, rate limiting). When one
//! of those escapes as an unhandled panic inside a task, it should not reach
//! operator-visible error logs. Everything else must.

use std::panic::PanicHookInfo;
use tracing::{debug, error};

/// Substrings of failure text known to be benign transport hiccups.
pub const IGNORABLE_FAULTS: &[&str] = &[
    "conflict",
    "not-authorized",
    "Socket connection timeout",
    "rate-overlimit",
    "Connection Closed",
    "Timed Out",
    "Intentional Logout",
    "Stream Errored",
    "statusCode: 503",
    "statusCode: 515",
];

/// Whether a failure description matches the known-benign set.
pub fn is_transient_fault(text: &str) -> bool {
    IGNORABLE_FAULTS.iter().any(|s| text.contains(s))
}

/// Register the classifying panic hook. Call once at startup.
///
/// Transient faults are logged at debug and suppressed; everything else is
/// surfaced at error. Task panics do not take down the runtime, so the
/// process keeps serving either way.
pub fn install_fault_hook() {
    std::panic::set_hook(Box::new(|info: &PanicHookInfo<'_>| {
        let text = panic_text(info);
        if is_transient_fault(&text) {
            debug!("Suppressed transient fault: {}", text);
        } else {
            error!("Unhandled failure: {}", text);
        }
    }));
}

fn panic_text(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        info.to_string()
    }
}
