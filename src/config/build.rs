//! `[build]` section configuration.
//!
//! Paths of the convention tree, the rendered output and the generated
//! registry module, plus the Rust path the tree is mounted at.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in trellis.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// source = "site"                   # Convention tree, also a Rust module
/// output = "public"                 # Rendered artifacts
/// generated = "src/generated.rs"    # Registry module written by `build`
/// import_prefix = "crate::site"     # Where `source` is mounted in the crate
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Convention tree scanned for route directories.
    #[serde(default = "defaults::build::source")]
    #[educe(Default = defaults::build::source())]
    pub source: PathBuf,

    /// Rendered output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Destination of the generated registry module.
    #[serde(default = "defaults::build::generated")]
    #[educe(Default = defaults::build::generated())]
    pub generated: PathBuf,

    /// Rust module path of `source`; route modules are imported below it.
    #[serde(default = "defaults::build::import_prefix")]
    #[educe(Default = defaults::build::import_prefix())]
    pub import_prefix: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config() {
        let config = r#"
            [build]
            source = "pages"
            output = "dist"
            generated = "src/routes_gen.rs"
            import_prefix = "crate::pages"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.source, PathBuf::from("pages"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.build.generated, PathBuf::from("src/routes_gen.rs"));
        assert_eq!(config.build.import_prefix, "crate::pages");
    }

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert!(config.build.root.is_none());
        assert_eq!(config.build.source, PathBuf::from("site"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.generated, PathBuf::from("src/generated.rs"));
        assert_eq!(config.build.import_prefix, "crate::site");
    }

    #[test]
    fn test_build_config_partial_override() {
        let config = r#"
            [build]
            output = "out"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.output, PathBuf::from("out"));
        assert_eq!(config.build.source, PathBuf::from("site"));
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [build]
            content = "content"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);

        assert!(result.is_err());
    }
}
