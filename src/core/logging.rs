//! Logging
//!
//! All modules log through the `log` facade. In the browser the records are
//! forwarded to the devtools console; elsewhere nothing is installed and the
//! host (or a test) may set its own logger.

use log::LevelFilter;

/// Install the console logger. Safe to call more than once.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    #[cfg(target_arch = "wasm32")]
    {
        static LOGGER: console::ConsoleLogger = console::ConsoleLogger;
        // Fails only if a logger is already set; keep the first one.
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(level);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    let _ = level;
}

#[cfg(target_arch = "wasm32")]
mod console {
    use log::{Level, Log, Metadata, Record};
    use wasm_bindgen::JsValue;

    pub(super) struct ConsoleLogger;

    impl Log for ConsoleLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }
            let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
            match record.level() {
                Level::Error => web_sys::console::error_1(&line),
                Level::Warn => web_sys::console::warn_1(&line),
                Level::Info => web_sys::console::log_1(&line),
                Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
            }
        }

        fn flush(&self) {}
    }
}
