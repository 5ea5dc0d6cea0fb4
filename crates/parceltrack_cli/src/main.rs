//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `parceltrack_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("parceltrack_core ping={}", parceltrack_core::ping());
    println!(
        "parceltrack_core version={}",
        parceltrack_core::core_version()
    );
}
