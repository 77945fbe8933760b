//! TOML parser with helpful error messages

use super::schema::StrataConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse strata.toml with detailed error messages
pub fn parse_strata_toml(path: &Path) -> Result<StrataConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_strata_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse strata.toml content from string
pub fn parse_strata_toml_str(content: &str) -> Result<StrataConfig> {
    let config: StrataConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    validate_config(&config)?;

    Ok(config)
}

/// Enhance TOML parsing errors with the offending lines
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let error_msg = error.message().to_string();

    let line_hint = error
        .span()
        .and_then(|span| content.get(..span.start))
        .map(|before| before.matches('\n').count() + 1);

    if let Some(line_num) = line_hint {
        let context = get_line_context(content, line_num);
        anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            context,
            error_msg
        )
    } else {
        anyhow::anyhow!("TOML parsing error: {}", error_msg)
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 2).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate configuration after parsing
fn validate_config(config: &StrataConfig) -> Result<()> {
    for (name, server) in &config.servers {
        if name.trim().is_empty() {
            anyhow::bail!("Server names must not be empty");
        }
        if !server.deploy_dir.is_absolute() {
            anyhow::bail!(
                "Server '{}': deploy_dir must be an absolute path, got '{}'",
                name,
                server.deploy_dir.display()
            );
        }
        if let Some(state_dir) = &server.state_dir {
            if !state_dir.is_absolute() {
                anyhow::bail!(
                    "Server '{}': state_dir must be an absolute path, got '{}'",
                    name,
                    state_dir.display()
                );
            }
        }
    }
    Ok(())
}

/// Serialize a configuration to TOML string
pub fn to_toml(config: &StrataConfig) -> Result<String> {
    toml::to_string_pretty(config).with_context(|| "Failed to serialize configuration to TOML")
}
