use std::path::PathBuf;

use anyhow::{bail, Context};

/// How the final report is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => bail!("LEARNPATH_OUTPUT must be 'pretty' or 'json', got '{other}'"),
        }
    }
}

/// Replay configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Scenario file to replay.
    pub scenario: PathBuf,
    /// Report format (default: pretty).
    pub output: OutputFormat,
    /// Log every playback snapshot at info level instead of debug.
    pub echo_snapshots: bool,
}

impl PlayerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default    |
    /// |----------------------------|------------|
    /// | `LEARNPATH_SCENARIO`       | (required) |
    /// | `LEARNPATH_OUTPUT`         | `pretty`   |
    /// | `LEARNPATH_ECHO_SNAPSHOTS` | `false`    |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let scenario = lookup("LEARNPATH_SCENARIO")
            .filter(|v| !v.trim().is_empty())
            .context("LEARNPATH_SCENARIO environment variable is required")?;

        let output = match lookup("LEARNPATH_OUTPUT") {
            Some(value) => OutputFormat::parse(&value)?,
            None => OutputFormat::default(),
        };

        let echo_snapshots = match lookup("LEARNPATH_ECHO_SNAPSHOTS") {
            Some(value) => value
                .trim()
                .parse::<bool>()
                .context("LEARNPATH_ECHO_SNAPSHOTS must be 'true' or 'false'")?,
            None => false,
        };

        Ok(Self {
            scenario: PathBuf::from(scenario),
            output,
            echo_snapshots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_scenario_is_set() {
        let config = PlayerConfig::from_lookup(lookup(&[("LEARNPATH_SCENARIO", "demo.json")])).unwrap();
        assert_eq!(config.scenario, PathBuf::from("demo.json"));
        assert_eq!(config.output, OutputFormat::Pretty);
        assert!(!config.echo_snapshots);
    }

    #[test]
    fn scenario_is_required() {
        let err = PlayerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("LEARNPATH_SCENARIO"));
    }

    #[test]
    fn output_and_echo_are_parsed() {
        let config = PlayerConfig::from_lookup(lookup(&[
            ("LEARNPATH_SCENARIO", "demo.json"),
            ("LEARNPATH_OUTPUT", "JSON"),
            ("LEARNPATH_ECHO_SNAPSHOTS", "true"),
        ]))
        .unwrap();
        assert_eq!(config.output, OutputFormat::Json);
        assert!(config.echo_snapshots);
    }

    #[test]
    fn unknown_output_is_rejected() {
        let result = PlayerConfig::from_lookup(lookup(&[
            ("LEARNPATH_SCENARIO", "demo.json"),
            ("LEARNPATH_OUTPUT", "xml"),
        ]));
        assert!(result.is_err());
    }
}
