//! Translator runtime knobs.

use std::time::Duration;

use crate::errors::TranslatorError;

/// First call plus one retry.
pub const MAX_ATTEMPTS: u32 = 2;

#[derive(Clone, Debug)]
pub struct TranslatorConfig {
    /// When false the model is never called and every query falls back.
    pub enabled: bool,
    /// Budget for one model call.
    pub timeout: Duration,
    /// Total attempts, including the first one. At most one retry.
    pub max_attempts: u32,
    /// Upper bound on the rewritten phrase, in chars.
    pub max_chars: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(8),
            max_attempts: MAX_ATTEMPTS,
            max_chars: 120,
        }
    }
}

impl TranslatorConfig {
    /// Reads `TRANSLATOR_ENABLED`, `TRANSLATOR_TIMEOUT_SECS`,
    /// `TRANSLATOR_MAX_ATTEMPTS` and `TRANSLATOR_MAX_CHARS`.
    pub fn from_env() -> Result<Self, TranslatorError> {
        let d = Self::default();
        let cfg = Self {
            enabled: parse_bool("TRANSLATOR_ENABLED", d.enabled)?,
            timeout: Duration::from_secs(parse_env("TRANSLATOR_TIMEOUT_SECS", d.timeout.as_secs())?),
            max_attempts: parse_env("TRANSLATOR_MAX_ATTEMPTS", d.max_attempts)?,
            max_chars: parse_env("TRANSLATOR_MAX_CHARS", d.max_chars)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), TranslatorError> {
        if self.timeout.is_zero() {
            return Err(TranslatorError::Config("TRANSLATOR_TIMEOUT_SECS must be > 0".into()));
        }
        if !(1..=MAX_ATTEMPTS).contains(&self.max_attempts) {
            return Err(TranslatorError::Config(format!(
                "TRANSLATOR_MAX_ATTEMPTS must be between 1 and {MAX_ATTEMPTS}"
            )));
        }
        if self.max_chars < 8 {
            return Err(TranslatorError::Config("TRANSLATOR_MAX_CHARS must be >= 8".into()));
        }
        Ok(())
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, dflt: T) -> Result<T, TranslatorError> {
    match env_opt(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| TranslatorError::Config(format!("{key} has invalid value {v:?}"))),
        None => Ok(dflt),
    }
}

fn parse_bool(key: &str, dflt: bool) -> Result<bool, TranslatorError> {
    match env_opt(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(dflt),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(TranslatorError::Config(format!("{key} must be a boolean, got {v:?}"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = TranslatorConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_attempts, 2);
    }

    #[test]
    fn attempts_outside_one_retry_rejected() {
        for max_attempts in [0, 3, 10] {
            let cfg = TranslatorConfig {
                max_attempts,
                ..Default::default()
            };
            assert!(cfg.validate().is_err(), "{max_attempts} attempts accepted");
        }
        let single = TranslatorConfig {
            max_attempts: 1,
            ..Default::default()
        };
        assert!(single.validate().is_ok());
    }
}
