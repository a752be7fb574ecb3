//! Convenience macros shared by the skilld crates.

/// Log an event at a runtime-selected [`LogLevel`](crate::utils::LogLevel).
///
/// The calling crate must depend on `log`. Key/value pairs are appended
/// to the message as `key=value`.
///
/// # Examples
///
/// ```
/// use skilld_core::log_event;
/// use skilld_core::utils::LogLevel;
///
/// log_event!(LogLevel::Info, "skill added");
/// log_event!(LogLevel::Debug, "skill granted",
///     skill => "app1:iface",
///     slot => "app2:uplink",
/// );
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:expr, $message:expr) => {
        log::log!(
            $crate::utils::LogLevel::to_log_level($level),
            "[{}] {}",
            module_path!(),
            $message
        )
    };

    ($level:expr, $message:expr, $($key:ident => $value:expr),+ $(,)?) => {
        {
            let level = $crate::utils::LogLevel::to_log_level($level);
            if log::log_enabled!(level) {
                let metadata = [$(format!("{}={}", stringify!($key), $value)),+].join(" ");
                log::log!(level, "[{}] {}: {}", module_path!(), $message, metadata);
            }
        }
    };
}
