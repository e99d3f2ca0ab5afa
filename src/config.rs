use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000/api";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub gateway_url: String,
    pub gateway_timeout: Duration,
    pub bind_addr: String,
    pub port: u16,
    pub events_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            gateway_timeout: Duration::from_secs(15),
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            events_capacity: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            gateway_url: lookup("GATEWAY_URL")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.gateway_url),
            gateway_timeout: parsed::<u64>(&lookup, "GATEWAY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.gateway_timeout),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            events_capacity: parsed::<usize>(&lookup, "EVENTS_CAPACITY")
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.events_capacity),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    let value = raw.trim().parse().ok();
    if value.is_none() {
        log::warn!("Ignoring invalid {key}={raw:?}");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn falls_back_to_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("GATEWAY_URL", "https://api.optica.test"),
            ("PORT", "9090"),
            ("EVENTS_CAPACITY", "0"),
            ("GATEWAY_TIMEOUT_SECS", "abc"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).map(|value| value.to_string()));
        assert_eq!(config.gateway_url, "https://api.optica.test");
        assert_eq!(config.port, 9090);
        assert_eq!(config.events_capacity, 100);
        assert_eq!(config.gateway_timeout, Duration::from_secs(15));
    }

    #[test]
    fn numeric_settings_parse_to_their_own_types() {
        let vars: HashMap<&str, &str> = [
            ("GATEWAY_TIMEOUT_SECS", " 30 "),
            ("PORT", "70000"),
            ("EVENTS_CAPACITY", "8"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).map(|value| value.to_string()));
        assert_eq!(config.gateway_timeout, Duration::from_secs(30));
        assert_eq!(config.port, 8080);
        assert_eq!(config.events_capacity, 8);
    }
}
