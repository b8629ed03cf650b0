// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::io::Read;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_PATIENCE: usize = 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid resolver configuration")]
    InvalidConfig {
        #[from]
        source: serde_yaml::Error,
    },
}

/// Tunables for a single resolve pass. Spec.md §4.3 treats the patience
/// limit as a hardcoded constant ("e.g. 1000"); this is made configurable
/// the way `mqpkg`'s own `Config` makes its repository list configurable,
/// rather than baked into the resolver.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ResolverConfig {
    patience: usize,
    reject_central_transitives: bool,
}

impl ResolverConfig {
    pub fn patience(&self) -> usize {
        self.patience
    }

    pub fn reject_central_transitives(&self) -> bool {
        self.reject_central_transitives
    }

    pub fn load<R: Read>(reader: R) -> Result<ResolverConfig, ConfigError> {
        Ok(serde_yaml::from_reader(reader)?)
    }
}

impl Default for ResolverConfig {
    fn default() -> ResolverConfig {
        ResolverConfig {
            patience: DEFAULT_PATIENCE,
            reject_central_transitives: true,
        }
    }
}
