//! Output formatting for built configuration trees.

use anyhow::Result;
use serde_json::Value;

/// Output format for the merged tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: json, yaml",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Render a tree. An unbuilt tree (`None`) renders as null.
pub fn render(tree: Option<&Value>, format: OutputFormat) -> Result<String> {
    let value = tree.unwrap_or(&Value::Null);
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("YAML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("toml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_json() {
        let tree = json!({"a": {"b": 1}});
        let text = render(Some(&tree), OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn test_render_yaml() {
        let tree = json!({"level": "debug", "port": 8080});
        let text = render(Some(&tree), OutputFormat::Yaml).unwrap();
        assert!(text.contains("level: debug"));
        assert!(text.contains("port: 8080"));
    }

    #[test]
    fn test_render_unbuilt_is_null() {
        assert_eq!(render(None, OutputFormat::Json).unwrap(), "null");
    }
}
