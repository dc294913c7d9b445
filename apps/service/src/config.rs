use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum Error {
    ReadFailed(()),
    WriteFailed(()),
    ParseFailed(()),
    ConfigPathUnavailable,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: Monitor,
    pub influx: Influx,
    pub notify: Notify,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Monitor {
    /// Seed target list; the live registry starts from this and diverges
    pub sites: Vec<String>,
    pub timeout_seconds: u64,
    pub interval_seconds: u64,
    pub sustained_threshold_ticks: u32,
    pub realert_every_ticks: u32,
    /// Dev mode swaps the metrics sink for a no-op
    pub dev_mode: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Influx {
    pub url: String,
    pub database: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Notify {
    /// Slack-compatible incoming webhook; empty routes alerts to the log
    pub webhook_url: String,
    /// Handle prepended to down alerts, e.g. "@oncall"
    pub mention: String,
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            sites: Vec::new(),
            timeout_seconds: 30,
            interval_seconds: 60,
            sustained_threshold_ticks: 60,
            realert_every_ticks: 1,
            dev_mode: false,
        }
    }
}

impl Default for Influx {
    fn default() -> Self {
        Self { url: "http://localhost:8086".into(), database: "uptime".into() }
    }
}

impl Default for Notify {
    fn default() -> Self {
        Self { webhook_url: String::new(), mention: String::new() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { monitor: Monitor::default(), influx: Influx::default(), notify: Notify::default() }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/vakt/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("vakt/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Monitor")?;
        write_1(f, "Sites", &self.monitor.sites.join(", "))?;
        write_1(f, "Probe Timeout (s)", &self.monitor.timeout_seconds)?;
        write_1(f, "Tick Interval (s)", &self.monitor.interval_seconds)?;
        write_1(f, "Sustained Threshold (ticks)", &self.monitor.sustained_threshold_ticks)?;
        write_1(f, "Re-alert Every (ticks)", &self.monitor.realert_every_ticks)?;
        write_1(f, "Dev Mode", &self.monitor.dev_mode)?;
        write_title_1(f, "Influx")?;
        write_1(f, "URL", &self.influx.url)?;
        write_1(f, "Database", &self.influx.database)?;
        write_title_1(f, "Notify")?;
        write_1(f, "Webhook Configured", &(!self.notify.webhook_url.is_empty()))?;
        write_1(f, "Mention", &self.notify.mention)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/vakt/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string =
                fs::read_to_string(&config_path).map_err(|_err| Error::ReadFailed(()))?;
            toml::from_str(raw_string.as_str()).map_err(|_err| Error::ParseFailed(()))
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &std::path::Path) -> Result<(), Error> {
        let config_str: String =
            toml::to_string_pretty(self).map_err(|_err| Error::ParseFailed(()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_err| Error::WriteFailed(()))?;
        }

        std::fs::write(path, config_str).map_err(|_err| Error::WriteFailed(()))
    }

    /// Apply environment overrides on top of the loaded file
    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var("INFLUX_URL") {
            self.influx.url = url;
        }
        if let Ok(database) = env::var("INFLUX_DB") {
            self.influx.database = database;
        }
        if let Ok(url) = env::var("VAKT_WEBHOOK_URL") {
            self.notify.webhook_url = url;
        }
        if let Ok(dev) = env::var("VAKT_DEV") {
            self.monitor.dev_mode = dev.parse().unwrap_or(self.monitor.dev_mode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::from_config(Some(&path)).unwrap();

        assert!(path.exists());
        assert_eq!(config.monitor.interval_seconds, 60);
        assert_eq!(config.monitor.timeout_seconds, 30);
        assert_eq!(config.monitor.realert_every_ticks, 1);
        assert!(config.monitor.sites.is_empty());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[monitor]
sites = ["http://a.test", "http://b.test"]
timeout_seconds = 5
sustained_threshold_ticks = 10

[notify]
mention = "@oncall"
"#,
        )
        .unwrap();

        let config = Config::from_config(Some(&path)).unwrap();

        assert_eq!(config.monitor.sites, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.monitor.timeout_seconds, 5);
        assert_eq!(config.monitor.sustained_threshold_ticks, 10);
        // untouched sections keep their defaults
        assert_eq!(config.monitor.interval_seconds, 60);
        assert_eq!(config.influx.database, "uptime");
        assert_eq!(config.notify.mention, "@oncall");
    }

    #[test]
    fn non_toml_extension_is_normalized() {
        assert_eq!(
            normalize_toml_path(path::Path::new("/tmp/vakt/config")),
            path::PathBuf::from("/tmp/vakt/config.toml")
        );
    }
}
