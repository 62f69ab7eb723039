//! Expiration policy: inactivity timeout and last-access resolution.

use crate::error::SessionError;

/// Default inactivity timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60 * 60;

/// Default last-access resolution in seconds.
pub const DEFAULT_RESOLUTION_SECS: u64 = 10 * 60;

/// How long session data lives without access, and how coarsely access is
/// recorded.
///
/// A session whose recorded last access is more than `timeout` seconds in the
/// past is expired. The recorded time is only advanced when it lags `now` by
/// at least `resolution` seconds, so each active client causes at most one
/// write per resolution window.
///
/// Expiry is judged against the recorded time, not the true last access.
/// Accesses that fall inside a resolution window are not recorded, so a
/// session can expire up to `resolution` seconds sooner than `timeout`
/// after its real last access; it never outlives `timeout` past the
/// recorded time.
///
/// A `timeout` of zero disables expiry entirely; in that mode the last-access
/// time is never rewritten and `resolution` is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    timeout: u64,
    resolution: u64,
}

impl ExpirationPolicy {
    /// Build a validated policy.
    ///
    /// Rejects `resolution > timeout` when expiry is enabled.
    pub fn new(timeout: u64, resolution: u64) -> Result<Self, SessionError> {
        Self::validate(timeout, resolution)?;
        Ok(Self {
            timeout,
            resolution,
        })
    }

    /// Policy that never expires data.
    pub fn never_expire() -> Self {
        Self {
            timeout: 0,
            resolution: 0,
        }
    }

    fn validate(timeout: u64, resolution: u64) -> Result<(), SessionError> {
        if timeout > 0 && resolution > timeout {
            return Err(SessionError::InvalidConfig(format!(
                "resolution {}s exceeds timeout {}s",
                resolution, timeout
            )));
        }
        Ok(())
    }

    /// Inactivity timeout in seconds (0 = never expire).
    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    /// Last-access resolution in seconds.
    pub fn resolution(&self) -> u64 {
        self.resolution
    }

    /// Whether expiry is enabled at all.
    pub fn expires(&self) -> bool {
        self.timeout > 0
    }

    /// Return a copy with a new timeout, validated against the current resolution.
    pub fn with_timeout(self, timeout: u64) -> Result<Self, SessionError> {
        Self::new(timeout, self.resolution)
    }

    /// Return a copy with a new resolution, validated against the current timeout.
    pub fn with_resolution(self, resolution: u64) -> Result<Self, SessionError> {
        Self::new(self.timeout, resolution)
    }

    /// Whether data last accessed at `last_access` is stale at `now`.
    pub fn is_expired(&self, last_access: u64, now: u64) -> bool {
        self.expires() && now.saturating_sub(last_access) > self.timeout
    }

    /// Whether an access at `now` should rewrite a recorded `last_access`.
    pub fn needs_touch(&self, last_access: u64, now: u64) -> bool {
        self.expires() && now.saturating_sub(last_access) >= self.resolution
    }
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            resolution: DEFAULT_RESOLUTION_SECS,
        }
    }
}
