//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn source() -> PathBuf {
        "site".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn generated() -> PathBuf {
        "src/generated.rs".into()
    }

    pub fn import_prefix() -> String {
        "crate::site".into()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        8080
    }

    pub fn static_prefix() -> String {
        "/static/".into()
    }

    pub fn fragment_header() -> String {
        "HX-Request".into()
    }

    pub fn workers() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}
