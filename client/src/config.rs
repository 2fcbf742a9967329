// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

/// Hard upper bound on both the retry and redirect budgets.
const BUDGET_CAP: u32 = 20;

/// WebDAV client configuration.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DavConfig {
    /// Application name, prefixed to the `User-Agent` header.
    #[serde(default = "default_application_name")]
    pub application_name: String,
    /// Total send attempts per request (first try included).
    #[serde(default = "default_num_tries")]
    pub num_tries: u32,
    /// Redirect hops followed per request.
    #[serde(default = "default_num_redirects")]
    pub num_redirects: u32,
    /// URL length above which `GET` is tunneled through `POST` with
    /// `X-HTTP-Method-Override`.
    #[serde(default = "default_max_url_length")]
    pub max_url_length: usize,
    /// Ceiling on a single backoff delay, in seconds.
    #[serde(default = "default_backoff_ceiling")]
    pub backoff_ceiling_secs: u64,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_application_name() -> String {
    "vdav".to_string()
}

const fn default_num_tries() -> u32 {
    3
}

const fn default_num_redirects() -> u32 {
    10
}

const fn default_max_url_length() -> usize {
    2048
}

const fn default_backoff_ceiling() -> u64 {
    16
}

const fn default_timeout() -> u64 {
    30
}

impl Default for DavConfig {
    fn default() -> Self {
        Self {
            application_name: default_application_name(),
            num_tries: default_num_tries(),
            num_redirects: default_num_redirects(),
            max_url_length: default_max_url_length(),
            backoff_ceiling_secs: default_backoff_ceiling(),
            timeout_secs: default_timeout(),
        }
    }
}

impl DavConfig {
    /// `User-Agent` header value: application name plus library version.
    #[must_use]
    pub fn user_agent(&self) -> String {
        format!(
            "{} vdav-client/{}",
            self.application_name,
            env!("CARGO_PKG_VERSION")
        )
    }

    /// Retry budget, clamped to `1..=20`.
    #[must_use]
    pub fn tries(&self) -> u32 {
        self.num_tries.clamp(1, BUDGET_CAP)
    }

    /// Redirect budget, clamped to `0..=20`.
    #[must_use]
    pub fn redirects(&self) -> u32 {
        self.num_redirects.min(BUDGET_CAP)
    }
}
