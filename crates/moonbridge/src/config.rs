//! Interpreter and marshaling configuration

/// Default maximum nesting depth for pushed and decoded structures.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Limits applied while converting values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarshalConfig {
    /// Maximum table nesting depth.
    ///
    /// When pushing, anything nested deeper is replaced by nil. When
    /// decoding, a deeper table fails with `DepthLimitExceeded`, which also
    /// stops tables that contain themselves.
    pub max_depth: usize,
}

impl Default for MarshalConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MarshalConfig {
    /// Create a config with a custom depth limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

/// Configuration for a new interpreter.
#[derive(Debug, Clone)]
pub struct LuaConfig {
    /// Open the Lua standard libraries
    pub open_libs: bool,

    /// Install the bundled extension libraries (`hash`)
    pub extensions: bool,

    /// Forbid reading undefined globals
    pub strict_read: bool,

    /// Forbid assigning undeclared globals
    pub strict_write: bool,

    /// Patterns appended to `package.path`
    pub package_paths: Vec<String>,

    /// Patterns appended to `package.cpath`
    pub package_cpaths: Vec<String>,

    /// Marshaling limits
    pub marshal: MarshalConfig,
}

impl Default for LuaConfig {
    fn default() -> Self {
        Self {
            open_libs: true,
            extensions: true,
            strict_read: false,
            strict_write: false,
            package_paths: Vec::new(),
            package_cpaths: Vec::new(),
            marshal: MarshalConfig::default(),
        }
    }
}

impl LuaConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables.
    ///
    /// - `MOONBRIDGE_MAX_DEPTH`: marshaling depth limit
    /// - `MOONBRIDGE_STRICT`: `read`, `write` or `all`
    /// - `MOONBRIDGE_PATH`: `;`-separated patterns for `package.path`
    /// - `MOONBRIDGE_CPATH`: `;`-separated patterns for `package.cpath`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(depth) = lookup("MOONBRIDGE_MAX_DEPTH").and_then(|v| v.trim().parse().ok()) {
            config.marshal.max_depth = depth;
        }

        if let Some(strict) = lookup("MOONBRIDGE_STRICT") {
            match strict.trim().to_lowercase().as_str() {
                "read" => config.strict_read = true,
                "write" => config.strict_write = true,
                "all" | "1" | "true" => {
                    config.strict_read = true;
                    config.strict_write = true;
                }
                _ => {}
            }
        }

        if let Some(paths) = lookup("MOONBRIDGE_PATH") {
            config.package_paths = split_patterns(&paths);
        }

        if let Some(paths) = lookup("MOONBRIDGE_CPATH") {
            config.package_cpaths = split_patterns(&paths);
        }

        config
    }

    /// Enable both strictness checks (builder pattern)
    pub fn strict(mut self) -> Self {
        self.strict_read = true;
        self.strict_write = true;
        self
    }

    /// Append a `package.path` pattern (builder pattern)
    pub fn with_package_path(mut self, pattern: impl Into<String>) -> Self {
        self.package_paths.push(pattern.into());
        self
    }

    /// Append a `package.cpath` pattern (builder pattern)
    pub fn with_package_cpath(mut self, pattern: impl Into<String>) -> Self {
        self.package_cpaths.push(pattern.into());
        self
    }

    /// Set the marshaling depth limit (builder pattern)
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.marshal.max_depth = max_depth;
        self
    }

    /// Skip the bundled extension libraries (builder pattern)
    pub fn without_extensions(mut self) -> Self {
        self.extensions = false;
        self
    }
}

fn split_patterns(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LuaConfig::default();
        assert!(config.open_libs);
        assert!(config.extensions);
        assert!(!config.strict_read);
        assert_eq!(config.marshal.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_from_env_reads_all_variables() {
        let config = LuaConfig::from_lookup(lookup(&[
            ("MOONBRIDGE_MAX_DEPTH", "16"),
            ("MOONBRIDGE_STRICT", "write"),
            ("MOONBRIDGE_PATH", "./lua/?.lua; ;./vendor/?.lua"),
        ]));
        assert_eq!(config.marshal.max_depth, 16);
        assert!(config.strict_write);
        assert!(!config.strict_read);
        assert_eq!(config.package_paths, vec!["./lua/?.lua", "./vendor/?.lua"]);
        assert!(config.package_cpaths.is_empty());
    }

    #[test]
    fn test_from_env_ignores_garbage() {
        let config = LuaConfig::from_lookup(lookup(&[
            ("MOONBRIDGE_MAX_DEPTH", "deep"),
            ("MOONBRIDGE_STRICT", "maybe"),
        ]));
        assert_eq!(config.marshal.max_depth, DEFAULT_MAX_DEPTH);
        assert!(!config.strict_read && !config.strict_write);
    }

    #[test]
    fn test_builders() {
        let config = LuaConfig::new()
            .strict()
            .with_package_path("a/?.lua")
            .with_package_cpath("b/?.so")
            .with_max_depth(4)
            .without_extensions();
        assert!(config.strict_read && config.strict_write);
        assert_eq!(config.package_paths, vec!["a/?.lua"]);
        assert_eq!(config.package_cpaths, vec!["b/?.so"]);
        assert_eq!(config.marshal.max_depth, 4);
        assert!(!config.extensions);
    }
}
