//! Logger for unit tests. Records are kept per thread, so parallel tests see only their own.

use std::cell::RefCell;
use std::sync::Once;
use log::{Level, LevelFilter, Log, Metadata, Record};

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|r| r.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Installs the logger once and clears this thread's records.
pub fn capture() {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    RECORDS.with(|r| r.borrow_mut().clear());
}

/// Records at `level` logged on this thread since `capture`.
pub fn messages(level: Level) -> Vec<String> {
    RECORDS.with(|r| {
        r.borrow().iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg.clone())
            .collect()
    })
}

/// Every record logged on this thread since `capture`, in order.
pub fn all() -> Vec<(Level, String)> {
    RECORDS.with(|r| r.borrow().clone())
}
