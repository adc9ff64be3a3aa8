// src/utils/captured_log.rs
//
// Test-only logger that keeps warnings per thread so parallel tests don't
// see each other's output.

use std::cell::RefCell;
use std::sync::Once;

use log::{Level, Log, Metadata, Record};

thread_local! {
    static WARNINGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

struct CapturedLog;

static LOGGER: CapturedLog = CapturedLog;
static INIT: Once = Once::new();

impl Log for CapturedLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            WARNINGS.with(|w| w.borrow_mut().push(record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

/// Installs the logger (once per process) and clears this thread's warnings.
pub fn start() {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Warn);
        }
    });
    WARNINGS.with(|w| w.borrow_mut().clear());
}

/// Warnings logged on this thread since `start`.
pub fn warnings() -> Vec<String> {
    WARNINGS.with(|w| w.borrow().clone())
}
