//! Developer-level query traces ("level 6") with a per-thread capture buffer.
//!
//! The executor emits one `dev6!` line per dispatched query. Tests turn on capture for their
//! own thread and assert on those lines without touching the global logger.

use std::cell::RefCell;

pub const DEV_TARGET: &str = "actionlite::dev6";

thread_local! {
    static CAPTURE: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Active capture on the current thread. Capture stops when this is dropped.
pub struct TraceCapture {
    _private: (),
}

impl TraceCapture {
    /// Lines captured so far, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        CAPTURE.with(|c| c.borrow().clone().unwrap_or_default())
    }

    /// Removes and returns the captured lines.
    pub fn take(&self) -> Vec<String> {
        CAPTURE.with(|c| c.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
    }
}

impl Drop for TraceCapture {
    fn drop(&mut self) {
        CAPTURE.with(|c| *c.borrow_mut() = None);
    }
}

#[must_use]
pub fn capture() -> TraceCapture {
    CAPTURE.with(|c| *c.borrow_mut() = Some(Vec::new()));
    TraceCapture { _private: () }
}

#[doc(hidden)]
pub fn record(line: &str) {
    CAPTURE.with(|c| {
        if let Some(buf) = c.borrow_mut().as_mut() {
            buf.push(line.to_owned());
        }
    });
}

/// Emit a developer trace line: captured when a [`TraceCapture`] is active on this thread,
/// and always routed to the `actionlite::dev6` target at TRACE.
#[macro_export]
macro_rules! dev6 {
    ($($arg:tt)*) => {{
        let __line = format!($($arg)*);
        $crate::utils::devlog::record(&__line);
        log::log!(target: $crate::utils::devlog::DEV_TARGET, log::Level::Trace, "{}", __line);
    }};
}
