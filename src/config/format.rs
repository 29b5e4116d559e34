//! Configuration file formats.

use std::{fmt, path::Path};

use serde::de::DeserializeOwned;

/// The format a configuration file is written in.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum Format {
    Toml,
    Json,
    #[default]
    Yaml,
}

impl Format {
    /// Guesses the format of `path` from its extension, falling back to YAML.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Format::Toml,
            Some("json") => Format::Json,
            _ => Format::Yaml,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Format::Toml => "toml",
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }

    /// Parses `content`, reporting failures as the parser's message.
    pub fn deserialize<T: DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            Format::Toml => toml::from_str(content).map_err(|error| error.to_string()),
            Format::Yaml => serde_yaml::from_str(content).map_err(|error| error.to_string()),
            Format::Json => serde_json::from_str(content).map_err(|error| error.to_string()),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_from_extension() {
        let cases = vec![
            ("/etc/exporter/config.toml", Format::Toml),
            ("/etc/exporter/config.json", Format::Json),
            ("/etc/exporter/config.yaml", Format::Yaml),
            ("/etc/exporter/config.yml", Format::Yaml),
            // Anything else is read as YAML, the format of mounted ConfigMaps.
            ("/etc/exporter/config", Format::Yaml),
            ("/etc/exporter/config.TOML", Format::Yaml),
        ];

        for (path, expected) in cases {
            assert_eq!(Format::detect(Path::new(path)), expected, "{}", path);
        }
    }

    #[test]
    fn parse_errors_carry_the_parser_message() {
        let error = Format::Json
            .deserialize::<serde_json::Value>("{")
            .unwrap_err();
        assert!(error.contains("EOF"), "{}", error);
    }
}
