//! `[engine]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! command = ["/opt/unity/Player"]   # Empty: no engine
//! args = ["UnityApp"]               # argv appended after the command
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub command: Vec<String>,
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            args: vec!["UnityApp".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_engine_defaults() {
        let config = test_parse_config("");
        assert!(config.engine.command.is_empty());
        assert_eq!(config.engine.args, vec!["UnityApp"]);
    }
}
