//! Formatted output helpers for CLI commands.

/// Formats a MiB count into a human-readable string (e.g., "512 MiB", "2.0 GiB").
#[must_use]
pub fn format_mib(mib: u32) -> String {
    const MIB_PER_GIB: u32 = 1024;

    if mib >= MIB_PER_GIB {
        format!("{:.1} GiB", f64::from(mib) / f64::from(MIB_PER_GIB))
    } else {
        format!("{mib} MiB")
    }
}
