//! Build script for the improver app.
//!
//! Only the desktop shell needs code generation; the analysis core builds
//! without Tauri.

fn main() {
    #[cfg(feature = "desktop")]
    tauri_build::build();
}
