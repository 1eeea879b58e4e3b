// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::atomic::{AtomicUsize, Ordering},
};

static MAX_LOG_LEVEL: AtomicUsize = AtomicUsize::new(LevelFilter::Error as usize);

/// Sets the most verbose level printed by the library
pub fn set_max_level(lvl: LevelFilter) {
    MAX_LOG_LEVEL.store(lvl as usize, Ordering::Relaxed)
}

pub fn max_level() -> LevelFilter {
    match MAX_LOG_LEVEL.load(Ordering::Relaxed) {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

#[repr(usize)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd)]
#[non_exhaustive]
/// The level at which the library will log
pub enum LevelFilter {
    Off,
    #[default]
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for LevelFilter {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ]
        .into_iter()
        .find(|filter| s.eq_ignore_ascii_case(filter.as_str()))
        .ok_or("log level filter should be one of DEBUG, INFO, WARN, ERROR, OFF")
    }
}

impl LevelFilter {
    fn as_str(&self) -> &'static str {
        match self {
            LevelFilter::Debug => "DEBUG",
            LevelFilter::Info => "INFO",
            LevelFilter::Warn => "WARN",
            LevelFilter::Error => "ERROR",
            LevelFilter::Off => "OFF",
        }
    }
}

impl Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a single log line
#[repr(usize)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Level {
    // discriminants line up with `LevelFilter`
    Error = 1,
    Warn,
    Info,
    Debug,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        };
        f.write_str(level)
    }
}

impl PartialEq<LevelFilter> for Level {
    #[inline]
    fn eq(&self, other: &LevelFilter) -> bool {
        (*self as usize) == (*other as usize)
    }
}

impl PartialOrd<LevelFilter> for Level {
    #[inline]
    fn partial_cmp(&self, other: &LevelFilter) -> Option<std::cmp::Ordering> {
        Some((*self as usize).cmp(&(*other as usize)))
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_logger {
    //! Captures the output of the `dd_*!` macros for the current thread.
    //!
    //! ```no_run
    //! use dd_sampling_core::log::{test_logger, Level};
    //!
    //! let _guard = test_logger::activate_test_logger();
    //! dd_sampling_core::dd_warn!("refresh failed");
    //!
    //! // closures wrapped by `with_local_logger` log into the same capture
    //! std::thread::spawn(dd_sampling_core::log::with_local_logger(|| {
    //!     dd_sampling_core::dd_debug!("from a worker");
    //! }))
    //! .join()
    //! .unwrap();
    //!
    //! let logs = test_logger::take_test_logs().unwrap();
    //! assert_eq!(logs[0], (Level::Warn, "refresh failed".to_string()));
    //! ```
    use std::cell::RefCell;
    use std::sync::{Arc, Mutex, PoisonError};

    use super::Level;

    type Capture = Arc<Mutex<Vec<(Level, String)>>>;

    thread_local! {
        static CAPTURE: RefCell<Option<Capture>> = const { RefCell::new(None) };
    }

    fn current() -> Option<Capture> {
        CAPTURE.try_with(|c| c.borrow().clone()).ok().flatten()
    }

    pub(crate) fn record(lvl: Level, log: &std::fmt::Arguments) {
        if let Some(capture) = current() {
            capture
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((lvl, log.to_string()));
        }
    }

    /// Restores the previous capture of the thread when dropped
    pub struct LoggerGuard {
        prev: Option<Capture>,
    }

    impl Drop for LoggerGuard {
        fn drop(&mut self) {
            let prev = self.prev.take();
            let _ = CAPTURE.try_with(|c| *c.borrow_mut() = prev);
        }
    }

    fn install(capture: Option<Capture>) -> LoggerGuard {
        let prev = CAPTURE.with(|c| c.replace(capture));
        LoggerGuard { prev }
    }

    pub fn activate_test_logger() -> LoggerGuard {
        install(Some(Capture::default()))
    }

    /// Drains the logs captured so far, `None` without an active capture
    pub fn take_test_logs() -> Option<Vec<(Level, String)>> {
        current().map(|capture| {
            std::mem::take(&mut *capture.lock().unwrap_or_else(PoisonError::into_inner))
        })
    }

    pub fn with_local_logger<F: FnOnce() -> R, R>(f: F) -> impl FnOnce() -> R {
        let capture = current();
        move || {
            let _guard = install(capture);
            f()
        }
    }
}

/// Makes `f` log into the test capture of the calling thread, wherever it runs
pub fn with_local_logger<F: FnOnce() -> R, R>(f: F) -> impl FnOnce() -> R {
    #[cfg(any(test, feature = "test-utils"))]
    {
        test_logger::with_local_logger(f)
    }
    #[cfg(not(any(test, feature = "test-utils")))]
    {
        f
    }
}

fn write_log(lvl: Level, log: fmt::Arguments, file: &str, line: u32) {
    match lvl {
        Level::Error | Level::Warn => eprintln!("\x1b[91m{lvl}\x1b[0m {file}:{line} - {log}"),
        Level::Info | Level::Debug => println!("\x1b[93m{lvl}\x1b[0m {file}:{line} - {log}"),
    }
}

/// Entry point of the `dd_*!` macros.
///
/// The `test-utils` gate must be evaluated in this crate, not at the macro call site.
#[doc(hidden)]
pub fn __log(lvl: Level, log: fmt::Arguments, file: &str, line: u32) {
    #[cfg(any(test, feature = "test-utils"))]
    test_logger::record(lvl, &log);

    if lvl <= max_level() {
        write_log(lvl, log, file, line);
    }
}

#[macro_export]
macro_rules! dd_log {
    ($lvl:expr, $($arg:tt)+) => {
        $crate::log::__log($lvl, format_args!($($arg)+), file!(), line!())
    };
}

#[macro_export]
macro_rules! dd_debug {
    ($($arg:tt)+) => { $crate::dd_log!($crate::log::Level::Debug, $($arg)+) };
}

#[macro_export]
macro_rules! dd_info {
    ($($arg:tt)+) => { $crate::dd_log!($crate::log::Level::Info, $($arg)+) };
}

#[macro_export]
macro_rules! dd_warn {
    ($($arg:tt)+) => { $crate::dd_log!($crate::log::Level::Warn, $($arg)+) };
}

#[macro_export]
macro_rules! dd_error {
    ($($arg:tt)+) => { $crate::dd_log!($crate::log::Level::Error, $($arg)+) };
}
