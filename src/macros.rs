// src/macros.rs

//
// Crate-internal logging.
//
// With the `logging` feature every level forwards to `tracing`, so the host
// application's subscriber decides what is shown.
//
// Without it the client stays silent except for errors, which go to stderr
// tagged with the crate name. The lower levels still type-check their
// format arguments, so a value referenced only by a log line is never
// flagged as unused in either build.
//

#![allow(unused_macros)]

macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        tracing::error!($($arg)*);

        #[cfg(not(feature = "logging"))]
        eprintln!("[roam-rpc] error: {}", format_args!($($arg)*));
    }};
}

/// Expands a level that has no output without `logging`.
macro_rules! quiet_level {
    ($level:ident, $($arg:tt)*) => {{
        #[cfg(feature = "logging")]
        tracing::$level!($($arg)*);

        #[cfg(not(feature = "logging"))]
        if false {
            let _ = format!($($arg)*);
        };
    }};
}

macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::macros::quiet_level!(warn, $($arg)*)
    };
}

macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::macros::quiet_level!(info, $($arg)*)
    };
}

macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::macros::quiet_level!(debug, $($arg)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_error;
pub(crate) use log_info;
pub(crate) use log_warn;
pub(crate) use quiet_level;
