//! Layered configuration: TOML file, then `SERPWATCH_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use serde::Deserialize;
use serpwatch_check::CheckParams;
use serpwatch_provider::ProviderConfig;

fn default_db_path() -> PathBuf { PathBuf::from("rankings.db") }

#[derive(Debug, Deserialize)]
pub struct Settings {
  /// Domain whose rankings are tracked, e.g. `example.com`.
  #[serde(default)]
  pub target_domain: String,
  #[serde(default = "default_db_path")]
  pub db_path:       PathBuf,
  #[serde(default)]
  pub check:         CheckParams,
  #[serde(default)]
  pub provider:      ProviderConfig,
}

impl Settings {
  /// Read `path` (optional) and overlay the environment, e.g.
  /// `SERPWATCH_PROVIDER__LOGIN` sets `provider.login`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SERPWATCH")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .with_context(|| format!("failed to read config from {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  /// Settings a check cannot run without.
  pub fn ensure_checkable(&self) -> anyhow::Result<()> {
    if self.target_domain.trim().is_empty() {
      bail!("target_domain is not configured");
    }
    if !self.provider.has_credentials() {
      bail!("provider.login and provider.password must be configured");
    }
    Ok(())
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use serpwatch_core::serp::Device;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let settings = Settings::load(Path::new("/nonexistent/serpwatch.toml")).unwrap();
    assert_eq!(settings.db_path, PathBuf::from("rankings.db"));
    assert_eq!(settings.check, CheckParams::default());
    assert_eq!(settings.provider.base_url, "https://api.dataforseo.com");
    assert!(settings.ensure_checkable().is_err());
  }

  #[test]
  fn file_values_override_defaults() {
    let path = std::env::temp_dir().join(format!("serpwatch-settings-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
      file,
      r#"
target_domain = "example.com"

[check]
device = "mobile"
poll_timeout_secs = 60

[provider]
login = "me"
password = "pw"
"#
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(settings.target_domain, "example.com");
    assert_eq!(settings.check.device, Device::Mobile);
    assert_eq!(settings.check.poll_timeout_secs, 60);
    assert_eq!(settings.check.batch_size, 100);
    assert!(settings.ensure_checkable().is_ok());
  }

  #[test]
  fn tilde_is_expanded_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/r.db")), PathBuf::from(home).join("r.db"));
    assert_eq!(expand_tilde(Path::new("/abs/r.db")), PathBuf::from("/abs/r.db"));
  }
}
