// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::env::{self, VarError};

use once_cell::sync::Lazy;
use tracing::warn;

pub const ENV_HUKS_MAX_AUTH_ID_LEN: &str = "HUKS_MAX_AUTH_ID_LEN";
pub const ENV_HUKS_MAX_KEY_COUNT: &str = "HUKS_MAX_KEY_COUNT";

pub const DEFAULT_MAX_AUTH_ID_LEN: usize = 64;
pub const DEFAULT_MAX_KEY_COUNT: usize = 256;

/// Limits applied by a [`crate::KeyStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub max_auth_id_len: usize,
    pub max_key_count: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_auth_id_len: DEFAULT_MAX_AUTH_ID_LEN,
            max_key_count: DEFAULT_MAX_KEY_COUNT,
        }
    }
}

pub static ENV_CONFIG: Lazy<StoreConfig> = Lazy::new(StoreConfig::from_env);

impl StoreConfig {
    pub fn from_env() -> Self {
        Self {
            max_auth_id_len: parse_limit(
                ENV_HUKS_MAX_AUTH_ID_LEN,
                env::var(ENV_HUKS_MAX_AUTH_ID_LEN),
                DEFAULT_MAX_AUTH_ID_LEN,
            ),
            max_key_count: parse_limit(
                ENV_HUKS_MAX_KEY_COUNT,
                env::var(ENV_HUKS_MAX_KEY_COUNT),
                DEFAULT_MAX_KEY_COUNT,
            ),
        }
    }
}

fn parse_limit(name: &str, value: Result<String, VarError>, default: usize) -> usize {
    let Ok(value) = value else {
        return default;
    };
    match value.trim().parse::<usize>() {
        Ok(limit) if limit > 0 => limit,
        _ => {
            warn!(r#""{}" must be a positive integer, using {}"#, name, default);
            default
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_uses_default() {
        assert_eq!(parse_limit("X", Err(VarError::NotPresent), 64), 64);
    }

    #[test]
    fn parses_positive_values() {
        assert_eq!(parse_limit("X", Ok(" 128 ".into()), 64), 128);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert_eq!(parse_limit("X", Ok("0".into()), 64), 64);
        assert_eq!(parse_limit("X", Ok("lots".into()), 64), 64);
    }
}
