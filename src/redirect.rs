//! Redirect-following policy, hop bookkeeping and `Location` resolution.

use url::Url;

use crate::config::RedirectConfig;
use crate::error::{HarnessError, HarnessResult};

/// How the client reacts to redirect responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectPolicy {
    /// Hop cap; `None` returns the first redirect response untouched
    pub max_hops: Option<u32>,
    /// Fail with `MaxRedirectExceeded` when the cap is hit on a redirect
    pub raise_on_exceed: bool,
    /// Zero the hop counter at the start of the next request
    pub reset_count_on_next_call: bool,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self {
            max_hops: None,
            raise_on_exceed: true,
            reset_count_on_next_call: false,
        }
    }
}

impl From<&RedirectConfig> for RedirectPolicy {
    fn from(config: &RedirectConfig) -> Self {
        Self {
            max_hops: config.max_hops,
            raise_on_exceed: config.raise_on_exceed,
            ..Default::default()
        }
    }
}

impl RedirectPolicy {
    pub fn is_following(&self) -> bool {
        self.max_hops.is_some()
    }

    /// Whether another hop is allowed after `hops` have been followed.
    pub fn allows_hop(&self, hops: u32) -> bool {
        self.max_hops.is_some_and(|max| hops < max)
    }
}

/// Hops followed so far. Only ever reset, never decremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedirectState {
    pub hops_followed: u32,
}

impl RedirectState {
    pub fn record_hop(&mut self) {
        self.hops_followed += 1;
    }

    pub fn reset(&mut self) {
        self.hops_followed = 0;
    }
}

/// Resolve `location` against the URI of the request that produced it and
/// return the path-and-query form dispatched in-process.
///
/// Absolute locations on another host are reduced to their path as well; the
/// in-process application is the only reachable target.
pub fn resolve_location(base: &Url, current_uri: &str, location: &str) -> HarnessResult<String> {
    let current = base.join(current_uri).map_err(|e| HarnessError::InvalidUri {
        uri: current_uri.to_string(),
        message: e.to_string(),
    })?;
    let target = current.join(location).map_err(|e| HarnessError::InvalidUri {
        uri: location.to_string(),
        message: e.to_string(),
    })?;

    if target.host_str() != base.host_str() {
        log::debug!(
            "Redirect target {} is off-host; dispatching its path in-process",
            target
        );
    }

    let mut resolved = target.path().to_string();
    if let Some(query) = target.query() {
        resolved.push('?');
        resolved.push_str(query);
    }
    Ok(resolved)
}
