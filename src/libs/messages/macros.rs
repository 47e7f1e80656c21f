//! Convenient macros for application messaging and logging.
//!
//! The macros route every message either to the `tracing` subscriber (debug
//! mode) or to plain console output (normal mode), so library code and
//! commands share one way of talking to the user.
//!
//! ## Debug Mode Detection
//!
//! Debug mode is on when either of these environment variables is set:
//! - **`TICKETHOURS_DEBUG`**: application-specific flag
//! - **`RUST_LOG`**: standard Rust logging configuration
//!
//! The result is cached on first use.
//!
//! ## Macro Categories
//!
//! - **`msg_print!`**, **`msg_success!`**, **`msg_info!`**, **`msg_warning!`**: display
//! - **`msg_error!`**: errors on stderr
//! - **`msg_debug!`**: debug-only output
//! - **`msg_error_anyhow!`**, **`msg_bail_anyhow!`**: `anyhow` errors from messages
//!
//! ```rust
//! use tickethours::{msg_info, msg_success};
//! use tickethours::libs::messages::Message;
//!
//! msg_success!(Message::ConfigSaved);
//! msg_info!(Message::DatabaseUpToDate, true);
//! ```

use std::sync::OnceLock;

/// Global cache for debug mode detection.
static DEBUG_MODE: OnceLock<bool> = OnceLock::new();

/// Checks if debug mode is enabled, with caching for performance.
#[doc(hidden)]
pub fn is_debug_mode() -> bool {
    *DEBUG_MODE.get_or_init(|| {
        // Check for application-specific debug flag
        std::env::var("TICKETHOURS_DEBUG").is_ok() ||
        // Check for standard Rust logging configuration
        std::env::var("RUST_LOG").is_ok()
    })
}

/// Prints a general message with automatic debug mode routing.
#[macro_export]
macro_rules! msg_print {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("{}", $msg);
        } else {
            println!("{}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\n{}\n", $msg);
        } else {
            println!("\n{}\n", $msg);
        }
    };
}

/// Prints a success message with ✅ prefix and automatic routing.
#[macro_export]
macro_rules! msg_success {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("✅ {}", $msg);
        } else {
            println!("✅ {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\n✅ {}\n", $msg);
        } else {
            println!("\n✅ {}\n", $msg);
        }
    };
}

/// Prints an error message with ❌ prefix and automatic routing.
///
/// In normal mode errors go to stderr so they don't mix with exported data
/// written to stdout.
#[macro_export]
macro_rules! msg_error {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::error!("❌ {}", $msg);
        } else {
            eprintln!("❌ {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::error!("\n❌ {}\n", $msg);
        } else {
            eprintln!("\n❌ {}\n", $msg);
        }
    };
}

/// Prints a warning message with ⚠️ prefix and automatic routing.
#[macro_export]
macro_rules! msg_warning {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::warn!("⚠️ {}", $msg);
        } else {
            eprintln!("⚠️ {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::warn!("\n⚠️ {}\n", $msg);
        } else {
            eprintln!("\n⚠️ {}\n", $msg);
        }
    };
}

/// Prints an informational message with ℹ️ prefix and automatic routing.
#[macro_export]
macro_rules! msg_info {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("ℹ️ {}", $msg);
        } else {
            println!("ℹ️ {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\nℹ️ {}\n", $msg);
        } else {
            println!("\nℹ️ {}\n", $msg);
        }
    };
}

/// Debug-only message display with 🔍 prefix.
///
/// Suppressed entirely unless debug mode is on.
///
/// ```rust
/// use tickethours::msg_debug;
///
/// let ticket_id = 42;
/// msg_debug!(format!("Recomputing totals for #{}", ticket_id));
/// ```
#[macro_export]
macro_rules! msg_debug {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::debug!("🔍 {}", $msg);
        }
    };
}

/// Creates an `anyhow::Error` from a message with ❌ prefix.
#[macro_export]
macro_rules! msg_error_anyhow {
    ($msg:expr) => {
        anyhow::anyhow!("❌ {}", $msg)
    };
}

/// Early return with an error created from a message.
///
/// ```rust,ignore
/// use anyhow::Result;
/// use tickethours::{msg_bail_anyhow, libs::messages::Message};
///
/// fn ticket(id: Option<i64>) -> Result<i64> {
///     match id {
///         Some(id) => Ok(id),
///         None => msg_bail_anyhow!(Message::InvalidHours),
///     }
/// }
/// ```
#[macro_export]
macro_rules! msg_bail_anyhow {
    ($msg:expr) => {
        return Err($crate::msg_error_anyhow!($msg))
    };
}

#[cfg(test)]
mod tests {
    use crate::libs::messages::Message;

    fn route(path: &str) -> anyhow::Result<()> {
        if path == "/hours" {
            return Ok(());
        }
        crate::msg_bail_anyhow!(Message::UnknownRoute(path.to_string()))
    }

    #[test]
    fn anyhow_errors_carry_the_message() {
        assert!(route("/hours").is_ok());
        assert_eq!(route("/nope").unwrap_err().to_string(), "❌ No handler matched the request to /nope");
        assert_eq!(crate::msg_error_anyhow!(Message::InvalidHours).to_string(), "❌ Please enter a valid number of hours");
    }
}
