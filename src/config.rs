//! Naming configuration: meta-character substitutions plus the two naming knobs.
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::path_de::{self, DecodeError};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{XID_Continue}+$").unwrap());
static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\p{XID_Start}|_)\p{XID_Continue}*$").unwrap());

/// Identifier-safe stand-ins for grammar meta-characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Substitutions {
    pub dash: String,
    pub open_paren: String,
    pub close_paren: String,
    pub open_bracket: String,
    pub close_bracket: String,
    pub asterisk: String,
    pub slash: String,
    pub space: String,
    pub double_quote: String,
    pub period: String,
    pub percent: String,
}

impl Default for Substitutions {
    fn default() -> Self {
        Self {
            dash: "ⲻ".into(),
            open_paren: "Ⲥ".into(),
            close_paren: "Ↄ".into(),
            open_bracket: "꘡".into(),
            close_bracket: "꘡".into(),
            asterisk: "ж".into(),
            slash: "Ⳇ".into(),
            space: "_".into(),
            double_quote: "ʺ".into(),
            period: "ˑ".into(),
            percent: "_".into(),
        }
    }
}

impl Substitutions {
    fn slots(&self) -> [(&'static str, &str); 11] {
        [
            ("dash", self.dash.as_str()),
            ("open_paren", self.open_paren.as_str()),
            ("close_paren", self.close_paren.as_str()),
            ("open_bracket", self.open_bracket.as_str()),
            ("close_bracket", self.close_bracket.as_str()),
            ("asterisk", self.asterisk.as_str()),
            ("slash", self.slash.as_str()),
            ("space", self.space.as_str()),
            ("double_quote", self.double_quote.as_str()),
            ("period", self.period.as_str()),
            ("percent", self.percent.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub substitutions: Substitutions,
    /// Name of the declaration that collects every memoized inner type.
    pub helper_name: String,
    /// Prepended to every rule-derived declaration name.
    pub rule_prefix: String,
    /// Emit the `Visitor` declaration and `Dispatch` methods on sum types.
    pub emit_visitors: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            substitutions: Substitutions::default(),
            helper_name: "Inners".into(),
            rule_prefix: "_".into(),
            emit_visitors: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("substitution `{slot}` = {token:?} is not identifier-safe")]
    BadToken { slot: &'static str, token: String },
    #[error("helper name {0:?} is not a valid identifier")]
    BadHelperName(String),
    #[error("rule prefix {0:?} is not identifier-safe")]
    BadPrefix(String),
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode config {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: DecodeError,
    },
}

impl CompilerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (slot, token) in self.substitutions.slots() {
            if !TOKEN.is_match(token) {
                return Err(ConfigError::BadToken { slot, token: token.to_string() });
            }
        }
        if !IDENT.is_match(&self.helper_name) {
            return Err(ConfigError::BadHelperName(self.helper_name.clone()));
        }
        if !self.rule_prefix.is_empty() && !TOKEN.is_match(&self.rule_prefix) {
            return Err(ConfigError::BadPrefix(self.rule_prefix.clone()));
        }
        Ok(())
    }

    /// Load a JSON config file; missing keys keep their defaults.
    pub fn from_json_path(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let source = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: display.clone(), source })?;
        let config: CompilerConfig = path_de::from_str_with_path(&source)
            .map_err(|source| ConfigError::Decode { path: display, source })?;
        config.validate()?;
        Ok(config)
    }
}

// ------------------------------- Tests ------------------------------------ //
