// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! The HTTP execution pipeline: bounded retries, bounded redirects,
//! method-override tunneling and pluggable handlers.
//!
//! Redirects are handled here rather than in `reqwest` so WebDAV
//! methods and bodies survive the hop and credentials never leak to a
//! different origin.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use tokio_util::sync::CancellationToken;

use crate::config::DavConfig;
use crate::error::DavError;
use crate::request::DavRequest;

/// Mutates a request before each send attempt (e.g. to attach
/// freshly-read credentials).
pub trait ExecuteInterceptor: Send + Sync {
    /// Called once per attempt, with the request about to be sent and
    /// the cancellation signal for the whole execution.
    fn intercept<'a>(
        &'a self,
        request: &'a mut DavRequest,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), DavError>>;
}

/// Context for a transport-level failure.
#[derive(Debug)]
pub struct ErrorHandlerArgs<'a> {
    /// The request that failed.
    pub request: &'a DavRequest,
    /// The transport error.
    pub error: &'a reqwest::Error,
    /// Total send attempts the pipeline will make.
    pub total_tries: u32,
    /// Which attempt just failed, 1-based.
    pub current_failed_try: u32,
    /// Whether the retry budget has room for another attempt.
    pub supports_retry: bool,
    /// Cancellation signal for this request.
    pub cancel: &'a CancellationToken,
}

/// Decides whether a transport failure should be retried.
pub trait TransportErrorHandler: Send + Sync {
    /// Returns `true` to claim the failure and request another attempt.
    fn handle<'a>(&'a self, args: ErrorHandlerArgs<'a>) -> BoxFuture<'a, bool>;
}

/// Context for a non-success HTTP response.
#[derive(Debug)]
pub struct ResponseHandlerArgs<'a> {
    /// The request that produced this response.
    pub request: &'a DavRequest,
    /// Response status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: &'a HeaderMap,
    /// Total send attempts the pipeline will make.
    pub total_tries: u32,
    /// Which attempt just failed, 1-based.
    pub current_failed_try: u32,
    /// Whether the retry budget has room for another attempt.
    pub supports_retry: bool,
    /// Cancellation signal for this request.
    pub cancel: &'a CancellationToken,
}

/// Decides whether a non-success response should be retried.
pub trait ResponseHandler: Send + Sync {
    /// Returns `true` to claim the response and request another attempt.
    fn handle<'a>(&'a self, args: ResponseHandlerArgs<'a>) -> BoxFuture<'a, bool>;
}

/// Executes requests with retries, redirects and handler hooks.
///
/// Handler registries are snapshotted before iteration, so a handler
/// may register or remove handlers without deadlocking the pipeline.
pub struct HttpPipeline {
    client: reqwest::Client,
    config: DavConfig,
    interceptors: RwLock<Vec<Arc<dyn ExecuteInterceptor>>>,
    error_handlers: RwLock<Vec<Arc<dyn TransportErrorHandler>>>,
    response_handlers: RwLock<Vec<Arc<dyn ResponseHandler>>>,
}

impl std::fmt::Debug for HttpPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpPipeline {
    /// Builds a pipeline. Automatic `reqwest` redirects are disabled;
    /// the pipeline owns redirect policy.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::Transport`] when the TLS backend cannot be
    /// initialized.
    pub fn new(config: DavConfig) -> Result<Self, DavError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent())
            .build()?;
        Ok(Self {
            client,
            config,
            interceptors: RwLock::new(Vec::new()),
            error_handlers: RwLock::new(Vec::new()),
            response_handlers: RwLock::new(Vec::new()),
        })
    }

    /// The pipeline's configuration.
    #[must_use]
    pub const fn config(&self) -> &DavConfig {
        &self.config
    }

    /// Registers an execute interceptor.
    pub fn add_interceptor(&self, interceptor: Arc<dyn ExecuteInterceptor>) {
        write_lock(&self.interceptors).push(interceptor);
    }

    /// Removes a previously registered interceptor.
    pub fn remove_interceptor(&self, interceptor: &Arc<dyn ExecuteInterceptor>) {
        write_lock(&self.interceptors).retain(|i| !Arc::ptr_eq(i, interceptor));
    }

    /// Registers a transport error handler.
    pub fn add_error_handler(&self, handler: Arc<dyn TransportErrorHandler>) {
        write_lock(&self.error_handlers).push(handler);
    }

    /// Removes a previously registered transport error handler.
    pub fn remove_error_handler(&self, handler: &Arc<dyn TransportErrorHandler>) {
        write_lock(&self.error_handlers).retain(|h| !Arc::ptr_eq(h, handler));
    }

    /// Registers a response handler.
    pub fn add_response_handler(&self, handler: Arc<dyn ResponseHandler>) {
        write_lock(&self.response_handlers).push(handler);
    }

    /// Removes a previously registered response handler.
    pub fn remove_response_handler(&self, handler: &Arc<dyn ResponseHandler>) {
        write_lock(&self.response_handlers).retain(|h| !Arc::ptr_eq(h, handler));
    }

    /// Executes a request to completion.
    ///
    /// Returns the final response, success or not, once retries and
    /// redirects are exhausted; mapping status codes to errors is the
    /// caller's concern.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::Cancelled`] when the token fires, or
    /// [`DavError::Transport`] when the transport fails with no retry
    /// budget (or no handler) left.
    pub async fn execute(
        &self,
        mut request: DavRequest,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, DavError> {
        rewrite_for_method_override(&mut request, self.config.max_url_length);

        let total_tries = self.config.tries();
        let mut redirects_left = self.config.redirects();
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(DavError::Cancelled);
            }

            let mut prepared = request.clone();
            for interceptor in snapshot(&self.interceptors) {
                interceptor.intercept(&mut prepared, cancel).await?;
            }

            let mut builder = self
                .client
                .request(prepared.method.clone(), prepared.url.clone())
                .headers(prepared.headers.clone());
            if let Some(body) = prepared.body.clone() {
                builder = builder.body(body);
            }

            let sent = tokio::select! {
                () = cancel.cancelled() => return Err(DavError::Cancelled),
                sent = builder.send() => sent,
            };
            attempts += 1;
            let supports_retry = attempts < total_tries;

            match sent {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();

                    if supports_retry {
                        let mut handled = false;
                        for handler in snapshot(&self.response_handlers) {
                            let args = ResponseHandlerArgs {
                                request: &prepared,
                                status,
                                headers: response.headers(),
                                total_tries,
                                current_failed_try: attempts,
                                supports_retry,
                                cancel,
                            };
                            if handler.handle(args).await {
                                handled = true;
                                break;
                            }
                        }
                        if handled {
                            tracing::debug!(%status, attempts, "retrying after handled response");
                            continue;
                        }
                    }

                    if status.is_redirection()
                        && redirects_left > 0
                        && let Some(location) = response.headers().get(header::LOCATION)
                    {
                        follow_redirect(&mut request, status, location)?;
                        redirects_left -= 1;
                        // A redirect hop does not consume a retry.
                        attempts -= 1;
                        continue;
                    }

                    return Ok(response);
                }
                Err(error) => {
                    if supports_retry {
                        let mut handled = false;
                        for handler in snapshot(&self.error_handlers) {
                            let args = ErrorHandlerArgs {
                                request: &prepared,
                                error: &error,
                                total_tries,
                                current_failed_try: attempts,
                                supports_retry,
                                cancel,
                            };
                            if handler.handle(args).await {
                                handled = true;
                                break;
                            }
                        }
                        if handled {
                            tracing::debug!(%error, attempts, "retrying after transport error");
                            continue;
                        }
                    }
                    return Err(DavError::Transport(error));
                }
            }
        }
    }
}

fn snapshot<T: ?Sized>(lock: &RwLock<Vec<Arc<T>>>) -> Vec<Arc<T>> {
    lock.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn write_lock<T: ?Sized>(
    lock: &RwLock<Vec<Arc<T>>>,
) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<T>>> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Tunnels an oversized `GET` through `POST` with
/// `X-HTTP-Method-Override`, moving the query string into the body.
fn rewrite_for_method_override(request: &mut DavRequest, max_url_length: usize) {
    if request.method != Method::GET || request.url.as_str().len() <= max_url_length {
        return;
    }
    let Some(query) = request.url.query().map(ToString::to_string) else {
        return;
    };

    tracing::debug!(len = request.url.as_str().len(), "tunneling long GET as POST");
    request.method = Method::POST;
    request.url.set_query(None);
    request.body = Some(query);
    request
        .headers
        .insert("X-HTTP-Method-Override", HeaderValue::from_static("GET"));
    request.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
}

/// Rewrites a request for a redirect hop.
///
/// `303 See Other` becomes a bodiless `GET`. Credentials and
/// conditional headers never cross the hop.
fn follow_redirect(
    request: &mut DavRequest,
    status: StatusCode,
    location: &HeaderValue,
) -> Result<(), DavError> {
    let location = location
        .to_str()
        .map_err(|e| DavError::InvalidResponse(format!("bad Location header: {e}")))?;
    let target = request
        .url
        .join(location)
        .map_err(|e| DavError::InvalidResponse(format!("bad redirect target {location:?}: {e}")))?;

    tracing::debug!(%status, %target, "following redirect");
    request.url = target;

    if status == StatusCode::SEE_OTHER {
        request.method = Method::GET;
        request.body = None;
        request.headers.remove(header::CONTENT_TYPE);
    }

    request.headers.remove(header::AUTHORIZATION);
    let conditional: Vec<_> = request
        .headers
        .keys()
        .filter(|name| name.as_str().starts_with("if-"))
        .cloned()
        .collect();
    for name in conditional {
        request.headers.remove(name);
    }
    Ok(())
}
