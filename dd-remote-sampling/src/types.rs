// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Values exchanged between the samplers and their callers

use std::borrow::Cow;
use std::fmt;

/// A 128 bit trace identifier.
///
/// Only the lower 64 bits take part in probabilistic decisions, so 64 bit and 128 bit
/// trace ids produced by the same root are sampled consistently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TraceId(u128);

impl TraceId {
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// Interprets the bytes as a big-endian integer
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    pub const fn to_u128(self) -> u128 {
        self.0
    }

    pub const fn lower_64_bits(self) -> u64 {
        self.0 as u64
    }
}

impl From<u128> for TraceId {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<u64> for TraceId {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl From<opentelemetry::trace::TraceId> for TraceId {
    fn from(value: opentelemetry::trace::TraceId) -> Self {
        Self::from_bytes(value.to_bytes())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TagValue {
    String(Cow<'static, str>),
    F64(f64),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::String(s) => f.write_str(s),
            TagValue::F64(v) => write!(f, "{v}"),
        }
    }
}

/// A tag describing which sampler took a decision and how it was configured
#[derive(Clone, Debug, PartialEq)]
pub struct Tag {
    pub key: &'static str,
    pub value: TagValue,
}

impl Tag {
    pub const fn new_static(key: &'static str, value: &'static str) -> Self {
        Self {
            key,
            value: TagValue::String(Cow::Borrowed(value)),
        }
    }

    pub const fn new_f64(key: &'static str, value: f64) -> Self {
        Self {
            key,
            value: TagValue::F64(value),
        }
    }
}

/// Outcome of a sampling decision
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingResult {
    pub sampled: bool,
    pub tags: Vec<Tag>,
}

impl SamplingResult {
    pub fn new(sampled: bool, tags: &[Tag]) -> Self {
        Self {
            sampled,
            tags: tags.to_vec(),
        }
    }

    /// Returns the value of the tag with the given key, if any
    pub fn tag(&self, key: &str) -> Option<&TagValue> {
        self.tags.iter().find(|t| t.key == key).map(|t| &t.value)
    }
}
