//! `[serve]` section configuration.
//!
//! Contains dispatcher settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in trellis.toml - dispatcher settings.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"          # Listen on all interfaces
/// port = 3000
/// static_prefix = "/assets/"     # Files under output/ served verbatim
/// fragment_header = "HX-Request" # `<header>: true` selects page-body.html
/// workers = 8
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 8080). Taken ports are skipped.
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// URL prefix mounting the output directory for static files.
    #[serde(default = "defaults::serve::static_prefix")]
    #[educe(Default = defaults::serve::static_prefix())]
    pub static_prefix: String,

    /// Request header whose value `true` asks for the fragment artifact.
    #[serde(default = "defaults::serve::fragment_header")]
    #[educe(Default = defaults::serve::fragment_header())]
    pub fragment_header: String,

    /// Request-handling threads (default: available parallelism).
    #[serde(default = "defaults::serve::workers")]
    #[educe(Default = defaults::serve::workers())]
    pub workers: usize,
}
