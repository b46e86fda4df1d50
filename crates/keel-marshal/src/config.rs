use serde::{Deserialize, Serialize};

/// Configuration for a [`Deriver`](crate::Deriver).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveConfig {
    /// Consult and populate the process-wide descriptor cache.
    pub use_cache: bool,
    /// Maximum shape nesting before derivation fails with
    /// [`DeriveError::TooDeep`](crate::DeriveError::TooDeep).
    pub max_depth: usize,
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            max_depth: 256,
        }
    }
}

impl DeriveConfig {
    /// Derive every type from scratch, leaving the shared cache untouched.
    pub fn uncached() -> Self {
        Self {
            use_cache: false,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DeriveConfig::default();
        assert!(config.use_cache);
        assert_eq!(config.max_depth, 256);
        assert!(!DeriveConfig::uncached().use_cache);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: DeriveConfig = toml::from_str("max_depth = 8").unwrap();
        assert_eq!(
            config,
            DeriveConfig {
                use_cache: true,
                max_depth: 8
            }
        );
    }

    #[test]
    fn json_roundtrip() {
        let config = DeriveConfig::uncached();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<DeriveConfig>(&json).unwrap(), config);
    }
}
