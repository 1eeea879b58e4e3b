// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared plumbing for the remote sampling crates: configuration sources,
//! library logging, error type and background worker handles.

pub mod configuration;
pub mod constants;
pub use configuration::Config;

mod error;
pub use error::{Error, Result};

pub mod log;
pub mod utils;
