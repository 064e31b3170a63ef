/// Target used for positive findings (open ports, alive hosts, parsed targets).
pub const SUCCESS_TARGET: &str = "sweepr::success";

/// Target used for pre-rendered terminal lines that must be printed verbatim.
pub const PRINT_TARGET: &str = "sweepr::print";

/// Emits an `info` event on the success target, rendered with a `[+]` prefix.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "sweepr::success", $($arg)*)
    };
}
