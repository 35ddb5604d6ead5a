use cfg_if::cfg_if;
use std::fmt;
use std::sync::{Arc, Mutex};

pub use console::style;
pub use log::{Level, LevelFilter};

/// A log sink trait that can be installed into the log subsystem using the [`pipe`]
/// function and will receive all log messages.
pub trait Sink: Send + Sync {
    /// Receives a formatted log record. Return `true` to consume the
    /// message, `false` to let it reach the console.
    fn write(&self, target: Option<&str>, level: Level, args: &fmt::Arguments<'_>) -> bool;
}

struct SinkHandler {
    sink: Arc<dyn Sink>,
}

lazy_static::lazy_static! {
    static ref LEVEL_FILTER : Mutex<LevelFilter> = Mutex::new(LevelFilter::Info);
}

/// Returns true if messages of the given level pass
/// the currently set [`LevelFilter`]
#[inline(always)]
pub fn log_level_enabled(level: Level) -> bool {
    match LEVEL_FILTER.lock() {
        Ok(filter) => *filter >= level,
        Err(poisoned) => *poisoned.into_inner() >= level,
    }
}

/// Enable filtering of log messages using the [`LevelFilter`]
pub fn set_log_level(level: LevelFilter) {
    match LEVEL_FILTER.lock() {
        Ok(mut filter) => *filter = level,
        Err(poisoned) => *poisoned.into_inner() = level,
    }
}

/// Currently active [`LevelFilter`]
pub fn log_level() -> LevelFilter {
    match LEVEL_FILTER.lock() {
        Ok(filter) => *filter,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

cfg_if! {
    if #[cfg(feature = "sink")] {
        lazy_static::lazy_static! {
            static ref SINK : Mutex<Option<SinkHandler>> = Mutex::new(None);
        }

        /// Receives an Option with an `Arc`ed [`Sink`] trait reference
        /// and installs it as a log sink / receiver.
        /// The sink can be later disabled by invoking `pipe(None)`
        pub fn pipe(sink: Option<Arc<dyn Sink>>) {
            if let Ok(mut handler) = SINK.lock() {
                *handler = sink.map(|sink| SinkHandler { sink });
            }
        }

        #[inline(always)]
        fn to_sink(target: Option<&str>, level: Level, args: &fmt::Arguments<'_>) -> bool {
            // clone the sink out so that a sink which logs
            // does not deadlock on the handler lock
            let sink = match SINK.lock() {
                Ok(handler) => handler.as_ref().map(|handler| handler.sink.clone()),
                Err(_) => None,
            };
            match sink {
                Some(sink) => sink.write(target, level, args),
                None => false,
            }
        }
    }
}

#[cfg(feature = "external-logger")]
mod facade {
    use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

    pub struct ChartwaitLogger;

    impl log::Log for ChartwaitLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            super::log_level_enabled(metadata.level())
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                let target = Some(record.target());
                match record.metadata().level() {
                    Level::Error => super::impls::error_impl(target, record.args()),
                    Level::Warn => super::impls::warn_impl(target, record.args()),
                    Level::Info => super::impls::info_impl(target, record.args()),
                    Level::Debug => super::impls::debug_impl(target, record.args()),
                    Level::Trace => super::impls::trace_impl(target, record.args()),
                }
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: ChartwaitLogger = ChartwaitLogger;

    pub fn init() -> Result<(), SetLoggerError> {
        log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Trace))
    }
}

/// Install `chartwait-log` as the global [`log`] facade logger
#[cfg(feature = "external-logger")]
pub fn init() -> Result<(), log::SetLoggerError> {
    facade::init()
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = console)]
        pub fn log(s: &str);
        #[wasm_bindgen(js_namespace = console)]
        pub fn warn(s: &str);
        #[wasm_bindgen(js_namespace = console)]
        pub fn error(s: &str);
    }
}

pub mod impls {
    use super::*;

    fn render(target: Option<&str>, args: &fmt::Arguments<'_>) -> String {
        match target {
            Some(target) => format!("[{target}] {args}"),
            None => args.to_string(),
        }
    }

    #[inline(always)]
    fn emit(target: Option<&str>, level: Level, args: &fmt::Arguments<'_>) {
        if !log_level_enabled(level) {
            return;
        }

        #[cfg(feature = "sink")]
        {
            if to_sink(target, level, args) {
                return;
            }
        }

        let text = render(target, args);
        cfg_if! {
            if #[cfg(target_arch = "wasm32")] {
                match level {
                    Level::Error => chartwait_log::wasm::error(&text),
                    Level::Warn => chartwait_log::wasm::warn(&text),
                    _ => chartwait_log::wasm::log(&text),
                }
            } else {
                match level {
                    Level::Error => eprintln!("{}", style(text).red()),
                    Level::Warn => eprintln!("{}", style(text).yellow()),
                    _ => println!("{text}"),
                }
            }
        }
    }

    #[inline(always)]
    pub fn error_impl(target: Option<&str>, args: &fmt::Arguments<'_>) {
        emit(target, Level::Error, args)
    }

    #[inline(always)]
    pub fn warn_impl(target: Option<&str>, args: &fmt::Arguments<'_>) {
        emit(target, Level::Warn, args)
    }

    #[inline(always)]
    pub fn info_impl(target: Option<&str>, args: &fmt::Arguments<'_>) {
        emit(target, Level::Info, args)
    }

    #[inline(always)]
    pub fn debug_impl(target: Option<&str>, args: &fmt::Arguments<'_>) {
        emit(target, Level::Debug, args)
    }

    #[inline(always)]
    pub fn trace_impl(target: Option<&str>, args: &fmt::Arguments<'_>) {
        emit(target, Level::Trace, args)
    }
}

/// Format and log message with [`Level::Error`]
#[macro_export]
macro_rules! log_error {
    (target: $target:expr, $($arg:tt)+) => (
        $crate::impls::error_impl(Some($target), &format_args!($($arg)+))
    );

    ($($arg:tt)+) => (
        $crate::impls::error_impl(None, &format_args!($($arg)+))
    )
}

/// Format and log message with [`Level::Warn`]
#[macro_export]
macro_rules! log_warn {
    (target: $target:expr, $($arg:tt)+) => (
        $crate::impls::warn_impl(Some($target), &format_args!($($arg)+))
    );

    ($($arg:tt)+) => (
        $crate::impls::warn_impl(None, &format_args!($($arg)+))
    )
}

/// Format and log message with [`Level::Info`]
#[macro_export]
macro_rules! log_info {
    (target: $target:expr, $($arg:tt)+) => (
        $crate::impls::info_impl(Some($target), &format_args!($($arg)+))
    );

    ($($arg:tt)+) => (
        $crate::impls::info_impl(None, &format_args!($($arg)+))
    )
}

/// Format and log message with [`Level::Debug`]
#[macro_export]
macro_rules! log_debug {
    (target: $target:expr, $($arg:tt)+) => (
        $crate::impls::debug_impl(Some($target), &format_args!($($arg)+))
    );

    ($($arg:tt)+) => (
        $crate::impls::debug_impl(None, &format_args!($($arg)+))
    )
}

/// Format and log message with [`Level::Trace`]
#[macro_export]
macro_rules! log_trace {
    (target: $target:expr, $($arg:tt)+) => (
        $crate::impls::trace_impl(Some($target), &format_args!($($arg)+))
    );

    ($($arg:tt)+) => (
        $crate::impls::trace_impl(None, &format_args!($($arg)+))
    )
}

#[cfg(all(test, feature = "sink"))]
mod tests {
    use super::*;

    struct Capture(Mutex<Vec<(Option<String>, Level, String)>>);

    impl Sink for Capture {
        fn write(&self, target: Option<&str>, level: Level, args: &fmt::Arguments<'_>) -> bool {
            self.0
                .lock()
                .unwrap()
                .push((target.map(String::from), level, args.to_string()));
            true
        }
    }

    // level filter and sink are process globals, so a single
    // test exercises both to avoid interference between tests
    #[test]
    fn sink_receives_records_above_filter() {
        let capture = Arc::new(Capture(Mutex::new(Vec::new())));
        pipe(Some(capture.clone()));
        set_log_level(LevelFilter::Info);

        crate::log_info!(target: "waiter", "session {} started", 7);
        crate::log_debug!("filtered out");
        crate::log_error!("failed: {}", "boom");

        set_log_level(LevelFilter::Trace);
        crate::log_trace!("now visible");
        assert_eq!(log_level(), LevelFilter::Trace);

        pipe(None);
        crate::log_info!("after pipe removal");

        let records = capture.0.lock().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            (Some("waiter".to_string()), Level::Info, "session 7 started".to_string())
        );
        assert_eq!(records[1].1, Level::Error);
        assert_eq!(records[1].2, "failed: boom");
        assert_eq!(records[2].2, "now visible");
    }
}
