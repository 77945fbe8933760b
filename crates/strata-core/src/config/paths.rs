//! Config and state path resolution helpers.

use std::path::PathBuf;

/// Default location of strata.toml: `<config_dir>/strata/strata.toml`
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(dir.join("strata").join("strata.toml"))
}

/// Default root for per-server state directories
///
/// # Returns
/// - Unix: `$XDG_STATE_HOME/strata/servers` or `~/.local/share/strata/servers`
/// - Windows: `%LOCALAPPDATA%\strata\servers`
pub fn default_state_root() -> anyhow::Result<PathBuf> {
    let base = if cfg!(unix) {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| anyhow::anyhow!("Cannot determine state directory"))?
    } else {
        dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine local app data directory"))?
    };
    Ok(base.join("strata").join("servers"))
}

/// Stable directory key for a server name
///
/// Server names are free-form, so they are hashed rather than used as
/// directory names directly.
pub fn server_key(name: &str) -> String {
    let hash = blake3::hash(name.as_bytes());
    hash.to_hex()[..32].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_key_is_stable_and_short() {
        let a = server_key("local");
        assert_eq!(a, server_key("local"));
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn server_key_differs_per_name() {
        assert_ne!(server_key("local"), server_key("Local"));
    }
}
