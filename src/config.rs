// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;

use crate::nal::NAL_FREE_LIST_SIZE;
use crate::threads::MAX_THREADS;
use crate::warning::MAX_WARNINGS;

/// Resource bounds of the stream core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// Hard upper bound on worker threads. Larger requests are clamped with a warning.
    pub max_threads: usize,
    /// Number of freed NAL units kept for reuse.
    pub nal_free_list_size: usize,
    /// Bound on pending warnings.
    pub max_warnings: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_threads: MAX_THREADS,
            nal_free_list_size: NAL_FREE_LIST_SIZE,
            max_warnings: MAX_WARNINGS,
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> anyhow::Result<Config> {
        serde_json::from_str(json).context("failed to parse p265 config")
    }
}
