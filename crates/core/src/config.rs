//! Price configuration: hourly station rate, service menu and tier offers.
//!
//! The on-disk settings file keeps the field names of the original
//! application (`playstation_rate`, `2_hour_rate`, ...) so existing files
//! keep loading. Unknown fields are ignored and missing fields fall back to
//! the built-in defaults.

use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{EngineError, EngineResult},
    events::{EngineEvent, EngineEvents},
};

/// Default hourly rate for a station.
pub const DEFAULT_HOURLY_RATE: f64 = 6000.0;

static DEFAULT_SERVICES: Lazy<BTreeMap<String, f64>> = Lazy::new(|| {
    BTreeMap::from([
        ("coffee".to_string(), 2500.0),
        ("matte".to_string(), 5000.0),
        ("tea".to_string(), 2000.0),
        ("shisha".to_string(), 5000.0),
    ])
});

/// Promotional whole-session rates unlocked at the 2 h and 3 h marks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferConfig {
    /// Master switch; when off every session is billed at the normal rate.
    pub enabled: bool,
    /// Hourly rate applied to the whole session once it reaches 2 hours.
    #[serde(rename = "2_hour_rate")]
    pub tier2_rate: f64,
    /// Hourly rate applied to the whole session once it reaches 3 hours.
    #[serde(rename = "3_hour_rate")]
    pub tier3_rate: f64,
}

impl Default for OfferConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tier2_rate: 5000.0,
            tier3_rate: 4666.0,
        }
    }
}

/// Current prices used by the billing calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    /// Station rate per hour.
    #[serde(rename = "playstation_rate")]
    pub hourly_rate: f64,
    /// Service name to unit price.
    pub services: BTreeMap<String, f64>,
    /// Tier offer settings.
    pub offers: OfferConfig,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            hourly_rate: DEFAULT_HOURLY_RATE,
            services: DEFAULT_SERVICES.clone(),
            offers: OfferConfig::default(),
        }
    }
}

impl PriceConfig {
    /// Load settings from `path`, overlaying whatever parses over the
    /// defaults. A missing or malformed file is not an error: the defaults
    /// are returned and the problem is logged.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!("ignoring malformed settings {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                warn!("could not read settings {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Persist the settings as pretty JSON, creating parent directories.
    pub fn persist(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                EngineError::Persistence(format!("create {}: {err}", parent.display()))
            })?;
        }
        let serialized = serde_json::to_string_pretty(self)
            .map_err(|err| EngineError::Persistence(format!("encode settings: {err}")))?;
        fs::write(path, serialized)
            .map_err(|err| EngineError::Persistence(format!("write {}: {err}", path.display())))
    }

    /// Validate, persist and commit an edited settings form, then notify.
    ///
    /// Nothing is committed until both validation and persistence succeed:
    /// a bad field or a failed write leaves the current configuration
    /// untouched, so memory and disk never disagree.
    pub fn apply(
        &mut self,
        form: &SettingsForm,
        path: impl AsRef<Path>,
        events: &EngineEvents,
    ) -> EngineResult<()> {
        let candidate = form.parse()?;
        candidate.persist(path)?;
        *self = candidate;
        events.emit(EngineEvent::ConfigChanged);
        Ok(())
    }

    /// Restore the built-in defaults, persist them and notify. Like
    /// [`Self::apply`], the current values survive a failed write.
    pub fn reset(&mut self, path: impl AsRef<Path>, events: &EngineEvents) -> EngineResult<()> {
        let defaults = Self::default();
        defaults.persist(path)?;
        *self = defaults;
        events.emit(EngineEvent::ConfigChanged);
        Ok(())
    }

    /// Editable form pre-filled from the current values.
    pub fn to_form(&self) -> SettingsForm {
        SettingsForm {
            hourly_rate: format_rate(self.hourly_rate),
            services: self
                .services
                .iter()
                .map(|(name, price)| (name.clone(), format_rate(*price)))
                .collect(),
            offers_enabled: self.offers.enabled,
            tier2_rate: format_rate(self.offers.tier2_rate),
            tier3_rate: format_rate(self.offers.tier3_rate),
        }
    }
}

fn format_rate(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Free-text settings input as typed by the user, validated by [`SettingsForm::parse`].
#[derive(Debug, Clone, Default)]
pub struct SettingsForm {
    /// Station rate per hour.
    pub hourly_rate: String,
    /// Service name and price field pairs.
    pub services: Vec<(String, String)>,
    /// Offer master switch.
    pub offers_enabled: bool,
    /// 2+ hour whole-session rate.
    pub tier2_rate: String,
    /// 3+ hour whole-session rate.
    pub tier3_rate: String,
}

impl SettingsForm {
    /// Parse every field, failing with [`EngineError::Validation`] on the
    /// first rate that is not a positive finite number.
    pub fn parse(&self) -> EngineResult<PriceConfig> {
        let hourly_rate = parse_rate("hourly rate", &self.hourly_rate)?;
        let mut services = BTreeMap::new();
        for (name, price) in &self.services {
            services.insert(name.clone(), parse_rate(name, price)?);
        }
        Ok(PriceConfig {
            hourly_rate,
            services,
            offers: OfferConfig {
                enabled: self.offers_enabled,
                tier2_rate: parse_rate("2+ hour rate", &self.tier2_rate)?,
                tier3_rate: parse_rate("3+ hour rate", &self.tier3_rate)?,
            },
        })
    }
}

fn parse_rate(label: &str, input: &str) -> EngineResult<f64> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| EngineError::Validation(format!("{label}: '{input}' is not a number")))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::Validation(format!(
            "{label}: must be a positive number"
        )));
    }
    Ok(value)
}

/// Default location of the settings file under the user's config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lounge/config.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let config = PriceConfig::load("/nonexistent/config.json");
        assert_eq!(config, PriceConfig::default());
        assert_eq!(config.services["coffee"], 2500.0);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"playstation_rate": 7000.0, "rogue_field": 1}"#)?;

        let config = PriceConfig::load(&path);
        assert_eq!(config.hourly_rate, 7000.0);
        assert_eq!(config.services, PriceConfig::default().services);
        assert!(config.offers.enabled);
        Ok(())
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json")?;
        assert_eq!(PriceConfig::load(&path), PriceConfig::default());
        Ok(())
    }

    #[test]
    fn persist_round_trip_keeps_legacy_field_names() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        let mut config = PriceConfig::default();
        config.offers.tier2_rate = 4800.0;
        config.persist(&path)?;

        let raw = std::fs::read_to_string(&path)?;
        assert!(raw.contains("playstation_rate"));
        assert!(raw.contains("2_hour_rate"));
        assert_eq!(PriceConfig::load(&path), config);
        Ok(())
    }

    #[test]
    fn apply_rejects_non_numeric_rate_without_committing() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        let mut config = PriceConfig::default();
        let mut form = config.to_form();
        form.hourly_rate = "cheap".to_string();

        let err = config
            .apply(&form, &path, &EngineEvents::detached())
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(config, PriceConfig::default());
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn apply_with_failed_persist_leaves_config_untouched() -> anyhow::Result<()> {
        let dir = tempdir()?;
        // A directory at the settings path makes the write itself fail.
        let path = dir.path().join("config.json");
        std::fs::create_dir(&path)?;

        let mut config = PriceConfig::default();
        let mut form = config.to_form();
        form.hourly_rate = "9000".to_string();

        let err = config
            .apply(&form, &path, &EngineEvents::detached())
            .unwrap_err();
        assert!(matches!(err, EngineError::Persistence(_)));
        assert_eq!(config, PriceConfig::default());
        Ok(())
    }

    #[test]
    fn apply_rejects_negative_price() {
        let mut form = PriceConfig::default().to_form();
        form.services[0].1 = "-5".to_string();
        assert!(matches!(
            form.parse(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn apply_commits_persists_and_notifies() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        let (events, mut receiver) = EngineEvents::channel();

        let mut config = PriceConfig::default();
        let mut form = config.to_form();
        form.hourly_rate = "6500".to_string();
        config.apply(&form, &path, &events)?;

        assert_eq!(config.hourly_rate, 6500.0);
        assert_eq!(PriceConfig::load(&path).hourly_rate, 6500.0);
        assert_eq!(receiver.try_recv()?, EngineEvent::ConfigChanged);
        Ok(())
    }

    #[test]
    fn reset_restores_defaults() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        let mut config = PriceConfig::default();
        config.hourly_rate = 9999.0;
        config.reset(&path, &EngineEvents::detached())?;
        assert_eq!(config, PriceConfig::default());
        Ok(())
    }
}
