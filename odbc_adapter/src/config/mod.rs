use crate::error::{AdapterError, Result};
use crate::security::Secret;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Adapter configuration.
///
/// Known keys are typed fields; anything else (vendor options such as
/// `sequence_start_value` or `login_timeout`) is kept in `options`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdapterConfig {
    pub driver: Option<String>,
    pub dialect: Option<String>,
    /// Data source name used for directory lookup.
    pub jndi: Option<String>,
    /// Full ODBC connection string.
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<Secret>,
    #[serde(flatten)]
    pub options: BTreeMap<String, JsonValue>,
}

impl AdapterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds a config from an ODBC connection string. The string itself is
    /// kept as `url`; well-known keys are lifted into typed fields.
    pub fn from_connection_string(connection_string: &str) -> Result<Self> {
        if connection_string.trim().is_empty() {
            return Err(AdapterError::EmptyConnectionString);
        }

        let mut config = Self {
            url: Some(connection_string.trim().to_string()),
            ..Self::default()
        };

        for part in split_connection_string_parts(connection_string) {
            let Some((key, raw_value)) = part.split_once('=') else {
                continue;
            };
            let value = unbrace(raw_value);
            if value.is_empty() {
                continue;
            }
            match key.trim().to_ascii_lowercase().as_str() {
                "driver" => config.driver = Some(value.to_string()),
                "dsn" => config.jndi = Some(value.to_string()),
                "uid" | "user" | "user id" | "username" => {
                    config.username = Some(value.to_string())
                }
                "pwd" | "password" => config.password = Some(Secret::from(value)),
                other => {
                    config
                        .options
                        .insert(other.to_string(), JsonValue::String(value.to_string()));
                }
            }
        }

        Ok(config)
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    pub fn with_jndi(mut self, name: impl Into<String>) -> Self {
        self.jndi = Some(name.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(Secret::from(password));
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// The string dialect matchers see: `dialect` when set, otherwise `driver`.
    pub fn dialect_key(&self) -> String {
        self.dialect
            .as_deref()
            .or(self.driver.as_deref())
            .unwrap_or_default()
            .to_string()
    }

    pub fn option(&self, key: &str) -> Option<&JsonValue> {
        self.options.get(key)
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.option(key).and_then(JsonValue::as_str)
    }

    /// Numeric option; numeric strings are accepted as well.
    pub fn option_u64(&self, key: &str) -> Option<u64> {
        match self.option(key)? {
            JsonValue::Number(n) => n.as_u64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn option_bool(&self, key: &str) -> Option<bool> {
        match self.option(key)? {
            JsonValue::Bool(b) => Some(*b),
            JsonValue::String(s) => parse_bool_flag(s),
            JsonValue::Number(n) => n.as_u64().map(|v| v != 0),
            _ => None,
        }
    }

    /// Connection string handed to the driver manager.
    pub fn connection_string(&self) -> Result<String> {
        let mut conn_str = if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty())
        {
            url.trim().to_string()
        } else if let Some(dsn) = self.jndi.as_deref().filter(|d| !d.trim().is_empty()) {
            format!("DSN={};", dsn.trim())
        } else if let Some(driver) = self.driver.as_deref().filter(|d| !d.trim().is_empty()) {
            format!("Driver={{{}}};", driver.trim())
        } else {
            return Err(AdapterError::EmptyConnectionString);
        };

        let present: Vec<String> = split_connection_string_parts(&conn_str)
            .into_iter()
            .filter_map(|p| p.split_once('=').map(|(k, _)| k.trim().to_ascii_lowercase()))
            .collect();
        let has_key = |keys: &[&str]| present.iter().any(|k| keys.contains(&k.as_str()));

        if let Some(user) = &self.username {
            if !has_key(&["uid", "user", "user id", "username"]) {
                append_part(&mut conn_str, "UID", user);
            }
        }
        if let Some(password) = &self.password {
            if !has_key(&["pwd", "password"]) {
                append_part(&mut conn_str, "PWD", &password.to_string_lossy());
            }
        }

        Ok(conn_str)
    }
}

fn append_part(conn_str: &mut String, key: &str, value: &str) {
    if !conn_str.is_empty() && !conn_str.ends_with(';') {
        conn_str.push(';');
    }
    if value.contains(';') {
        conn_str.push_str(&format!("{}={{{}}};", key, value));
    } else {
        conn_str.push_str(&format!("{}={};", key, value));
    }
}

fn unbrace(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(trimmed)
        .trim()
}

pub(crate) fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Splits on `;` outside of `{...}` blocks.
pub(crate) fn split_connection_string_parts(connection_string: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut brace_depth = 0u32;

    for (idx, ch) in connection_string.char_indices() {
        match ch {
            '{' => brace_depth = brace_depth.saturating_add(1),
            '}' => brace_depth = brace_depth.saturating_sub(1),
            ';' if brace_depth == 0 => {
                parts.push(&connection_string[start..idx]);
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&connection_string[start..]);
    parts.retain(|p| !p.trim().is_empty());
    parts
}
