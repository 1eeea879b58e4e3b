// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{fmt::Display, str::FromStr};

use super::supported_configurations::SupportedConfigurations;

/// A place configuration values are read from
pub(crate) trait ConfigurationSource {
    /// Name reported along with invalid values
    fn name(&self) -> &'static str;

    fn get(&self, key: &str) -> Option<String>;
}

pub(crate) struct EnvSource;

impl ConfigurationSource for EnvSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[cfg(test)]
pub(crate) struct HashMapSource {
    name: &'static str,
    values: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl HashMapSource {
    pub(crate) fn new<K: ToString, V: ToString>(
        name: &'static str,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        HashMapSource {
            name,
            values: values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
impl ConfigurationSource for HashMapSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// A raw value rejected while looking up a key
#[derive(Debug, PartialEq)]
pub(crate) struct InvalidValue {
    pub(crate) source: &'static str,
    pub(crate) value: String,
    pub(crate) reason: String,
}

#[derive(Debug, PartialEq)]
pub(crate) struct Lookup<T> {
    pub(crate) value: Option<T>,
    /// Values of higher precedence sources that failed to parse
    pub(crate) invalid: Vec<InvalidValue>,
}

/// Sources ordered by decreasing precedence
pub(crate) struct CompositeSource {
    sources: Vec<Box<dyn ConfigurationSource>>,
}

impl CompositeSource {
    pub(crate) fn new() -> Self {
        CompositeSource {
            sources: Vec::new(),
        }
    }

    pub(crate) fn from_env() -> Self {
        let mut sources = Self::new();
        sources.add_source(EnvSource);
        sources
    }

    pub(crate) fn add_source(&mut self, source: impl ConfigurationSource + 'static) {
        self.sources.push(Box::new(source));
    }

    /// Returns the first value of `key` that parses as `T`
    pub(crate) fn lookup<T>(&self, key: SupportedConfigurations) -> Lookup<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let mut invalid = Vec::new();
        for source in &self.sources {
            let Some(raw) = source.get(key.as_str()) else {
                continue;
            };
            match raw.parse() {
                Ok(value) => {
                    return Lookup {
                        value: Some(value),
                        invalid,
                    }
                }
                Err(e) => invalid.push(InvalidValue {
                    source: source.name(),
                    value: raw,
                    reason: e.to_string(),
                }),
            }
        }
        Lookup {
            value: None,
            invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_missing_key() {
        let mut sources = CompositeSource::new();
        sources.add_source(HashMapSource::new("env", [("DD_SERVICE", "checkout")]));

        let lookup: Lookup<String> = sources.lookup(SupportedConfigurations::DD_LOG_LEVEL);
        assert_eq!(
            lookup,
            Lookup {
                value: None,
                invalid: vec![]
            }
        );
    }

    #[test]
    fn test_lookup_precedence() {
        let mut sources = CompositeSource::new();
        sources.add_source(HashMapSource::new("first", [("DD_SERVICE", "checkout")]));
        sources.add_source(HashMapSource::new(
            "second",
            [("DD_SERVICE", "unused"), ("DD_LOG_LEVEL", "debug")],
        ));

        assert_eq!(
            sources
                .lookup::<String>(SupportedConfigurations::DD_SERVICE)
                .value
                .as_deref(),
            Some("checkout")
        );
        assert_eq!(
            sources
                .lookup::<String>(SupportedConfigurations::DD_LOG_LEVEL)
                .value
                .as_deref(),
            Some("debug")
        );
    }

    #[test]
    fn test_lookup_skips_invalid_values() {
        let mut sources = CompositeSource::new();
        sources.add_source(HashMapSource::new(
            "first",
            [("DD_TRACE_SAMPLING_REFRESH_INTERVAL", "30s")],
        ));
        sources.add_source(HashMapSource::new(
            "second",
            [("DD_TRACE_SAMPLING_REFRESH_INTERVAL", "2.5")],
        ));
        sources.add_source(HashMapSource::new(
            "third",
            [("DD_TRACE_SAMPLING_REFRESH_INTERVAL", "often")],
        ));

        let lookup: Lookup<f64> =
            sources.lookup(SupportedConfigurations::DD_TRACE_SAMPLING_REFRESH_INTERVAL);
        assert_eq!(lookup.value, Some(2.5));
        assert_eq!(
            lookup.invalid,
            vec![InvalidValue {
                source: "first",
                value: "30s".to_string(),
                reason: "invalid float literal".to_string(),
            }]
        );
    }

    #[test]
    fn test_lookup_all_invalid() {
        let mut sources = CompositeSource::new();
        sources.add_source(HashMapSource::new(
            "env",
            [("DD_TRACE_SAMPLING_MAX_OPERATIONS", "-3")],
        ));

        let lookup: Lookup<usize> =
            sources.lookup(SupportedConfigurations::DD_TRACE_SAMPLING_MAX_OPERATIONS);
        assert_eq!(lookup.value, None);
        assert_eq!(lookup.invalid.len(), 1);
        assert_eq!(lookup.invalid[0].value, "-3");
    }
}
