// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::StatusCode;

use crate::pipeline::{ResponseHandler, ResponseHandlerArgs};

/// Retries throttling responses with exponential backoff.
///
/// The delay for the n-th failed try is `base * 2^(n-1)`. Once the
/// delay would exceed the ceiling the handler declines, which stops
/// the retry loop even when tries remain.
#[derive(Debug, Clone)]
pub struct BackoffHandler {
    base_delay: Duration,
    ceiling: Duration,
    statuses: Vec<StatusCode>,
}

impl Default for BackoffHandler {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            ceiling: Duration::from_secs(16),
            statuses: vec![StatusCode::SERVICE_UNAVAILABLE],
        }
    }
}

impl BackoffHandler {
    /// A handler with custom timing and status set.
    #[must_use]
    pub const fn new(base_delay: Duration, ceiling: Duration, statuses: Vec<StatusCode>) -> Self {
        Self {
            base_delay,
            ceiling,
            statuses,
        }
    }

    /// The delay before retrying the given failed try, or `None` when
    /// it would exceed the ceiling.
    #[must_use]
    pub fn delay_for(&self, failed_try: u32) -> Option<Duration> {
        let factor = 1u32.checked_shl(failed_try.saturating_sub(1))?;
        let delay = self.base_delay.checked_mul(factor)?;
        (delay <= self.ceiling).then_some(delay)
    }
}

impl ResponseHandler for BackoffHandler {
    fn handle<'a>(&'a self, args: ResponseHandlerArgs<'a>) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            if !args.supports_retry || !self.statuses.contains(&args.status) {
                return false;
            }
            let Some(delay) = self.delay_for(args.current_failed_try) else {
                return false;
            };

            tracing::debug!(
                status = %args.status,
                failed_try = args.current_failed_try,
                ?delay,
                "backing off before retry"
            );
            tokio::select! {
                () = args.cancel.cancelled() => false,
                () = tokio::time::sleep(delay) => true,
            }
        })
    }
}
