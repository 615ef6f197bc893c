//! Conditional logging macros gated on a module-level `ENABLE_LOGS` flag.
//!
//! The producer loops emit a line per tick, which at frame cadence drowns
//! the log; the flag lets a loop module silence its own chatter without
//! touching the global filter. Modules using these macros must define:
//!
//! ```rust
//! const ENABLE_LOGS: bool = true; // or false
//! ```

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}
