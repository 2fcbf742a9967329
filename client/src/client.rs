// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! High-level CalDAV/CardDAV operations over the HTTP pipeline.

use std::sync::Arc;

use reqwest::Url;
use reqwest::header::ETAG;
use tokio_util::sync::CancellationToken;

use crate::auth::BasicCredential;
use crate::backoff::BackoffHandler;
use crate::config::DavConfig;
use crate::davxml::{
    AddressbookQueryRequest, CalendarQueryRequest, MkCalendarRequest, MultiGetRequest,
    PropFindRequest, PropertyUpdate, SyncCollectionRequest,
};
use crate::error::DavError;
use crate::method::DavMethod;
use crate::pipeline::HttpPipeline;
use crate::request::{DavRequest, RequestBuilder};
use crate::response::MultiStatus;
use crate::template::UriTemplate;
use crate::types::{Depth, ETag, Href, WritePolicy};

/// A CalDAV/CardDAV client bound to one server.
#[derive(Debug)]
pub struct DavClient {
    base_url: Url,
    pipeline: Arc<HttpPipeline>,
}

impl DavClient {
    /// Creates a client. A [`BackoffHandler`] with default timing is
    /// registered for throttling responses.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::Config`] when the base URL does not parse,
    /// or a transport error when the HTTP client cannot be built.
    pub fn new(base_url: &str, config: DavConfig) -> Result<Self, DavError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DavError::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        let pipeline = Arc::new(HttpPipeline::new(config)?);
        pipeline.add_response_handler(Arc::new(BackoffHandler::default()));
        Ok(Self { base_url, pipeline })
    }

    /// Attaches a credential: it signs every attempt and recovers a 401
    /// after an out-of-band secret refresh.
    pub fn set_credential(&self, credential: Arc<BasicCredential>) {
        self.pipeline.add_interceptor(credential.clone());
        self.pipeline.add_response_handler(credential);
    }

    /// The underlying pipeline, for registering custom handlers.
    #[must_use]
    pub const fn pipeline(&self) -> &Arc<HttpPipeline> {
        &self.pipeline
    }

    /// The server base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Reads properties of a resource or collection.
    ///
    /// # Errors
    ///
    /// Returns pipeline errors or status mapping errors.
    pub async fn propfind(
        &self,
        href: &Href,
        depth: Depth,
        request: &PropFindRequest,
        cancel: &CancellationToken,
    ) -> Result<MultiStatus, DavError> {
        let request = self
            .builder(DavMethod::PropFind, href)
            .header("Depth", depth.as_str())?
            .header("Content-Type", "application/xml; charset=utf-8")?
            .body(request.build()?)
            .build()?;
        self.run_multistatus(request, href, cancel).await
    }

    /// Runs a `calendar-query` report.
    ///
    /// # Errors
    ///
    /// Returns pipeline errors or status mapping errors.
    pub async fn calendar_query(
        &self,
        href: &Href,
        request: &CalendarQueryRequest,
        cancel: &CancellationToken,
    ) -> Result<MultiStatus, DavError> {
        self.report(href, request.build()?, Depth::One, cancel).await
    }

    /// Runs an `addressbook-query` report.
    ///
    /// # Errors
    ///
    /// Returns pipeline errors or status mapping errors.
    pub async fn addressbook_query(
        &self,
        href: &Href,
        request: &AddressbookQueryRequest,
        cancel: &CancellationToken,
    ) -> Result<MultiStatus, DavError> {
        self.report(href, request.build()?, Depth::One, cancel).await
    }

    /// Fetches many resources by href in one round trip.
    ///
    /// # Errors
    ///
    /// Returns pipeline errors or status mapping errors.
    pub async fn multi_get(
        &self,
        href: &Href,
        request: &MultiGetRequest,
        cancel: &CancellationToken,
    ) -> Result<MultiStatus, DavError> {
        self.report(href, request.build()?, Depth::One, cancel).await
    }

    /// Runs a `sync-collection` report. The returned
    /// [`MultiStatus::sync_token`] feeds the next incremental sync.
    ///
    /// # Errors
    ///
    /// Returns pipeline errors or status mapping errors.
    pub async fn sync_collection(
        &self,
        href: &Href,
        request: &SyncCollectionRequest,
        cancel: &CancellationToken,
    ) -> Result<MultiStatus, DavError> {
        self.report(href, request.build()?, Depth::Zero, cancel).await
    }

    /// Fetches a resource body and its `ETag`.
    ///
    /// # Errors
    ///
    /// Returns pipeline errors or status mapping errors.
    pub async fn get(
        &self,
        href: &Href,
        cancel: &CancellationToken,
    ) -> Result<(String, Option<ETag>), DavError> {
        let request = self.builder(DavMethod::Get, href).build()?;
        let response = self.pipeline.execute(request, cancel).await?;
        let response = Self::check_status(response, href).await?;
        let etag = header_etag(&response);
        Ok((response.text().await?, etag))
    }

    /// Writes a resource body under the given concurrency policy.
    ///
    /// Returns the new `ETag` when the server reports one.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::PreconditionFailed`] when the policy's
    /// condition does not hold, plus the usual pipeline errors.
    pub async fn put(
        &self,
        href: &Href,
        body: String,
        content_type: &str,
        policy: &WritePolicy,
        cancel: &CancellationToken,
    ) -> Result<Option<ETag>, DavError> {
        let mut builder = self
            .builder(DavMethod::Put, href)
            .header("Content-Type", content_type)?;
        builder = match policy {
            WritePolicy::Update(etag) => builder.header("If-Match", etag.as_str())?,
            WritePolicy::CreateOnly => builder.header("If-None-Match", "*")?,
            WritePolicy::Overwrite => builder,
        };
        let request = builder.body(body).build()?;

        let response = self.pipeline.execute(request, cancel).await?;
        if response.status() == reqwest::StatusCode::PRECONDITION_FAILED {
            let etag = match policy {
                WritePolicy::Update(etag) => Some(etag.clone()),
                _ => None,
            };
            return Err(DavError::PreconditionFailed { etag });
        }
        let response = Self::check_status(response, href).await?;
        Ok(header_etag(&response))
    }

    /// Deletes a resource, optionally only when the `ETag` still holds.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::PreconditionFailed`] on a stale `ETag`, plus
    /// the usual pipeline errors.
    pub async fn delete(
        &self,
        href: &Href,
        etag: Option<&ETag>,
        cancel: &CancellationToken,
    ) -> Result<(), DavError> {
        let mut builder = self.builder(DavMethod::Delete, href);
        if let Some(etag) = etag {
            builder = builder.header("If-Match", etag.as_str())?;
        }
        let request = builder.build()?;

        let response = self.pipeline.execute(request, cancel).await?;
        if response.status() == reqwest::StatusCode::PRECONDITION_FAILED {
            return Err(DavError::PreconditionFailed {
                etag: etag.cloned(),
            });
        }
        Self::check_status(response, href).await?;
        Ok(())
    }

    /// Writes collection properties with `PROPPATCH`.
    ///
    /// # Errors
    ///
    /// Returns pipeline errors or status mapping errors.
    pub async fn proppatch(
        &self,
        href: &Href,
        update: &PropertyUpdate,
        cancel: &CancellationToken,
    ) -> Result<MultiStatus, DavError> {
        let request = self
            .builder(DavMethod::PropPatch, href)
            .header("Content-Type", "application/xml; charset=utf-8")?
            .body(update.build()?)
            .build()?;
        self.run_multistatus(request, href, cancel).await
    }

    /// Creates a calendar collection.
    ///
    /// # Errors
    ///
    /// Returns pipeline errors or status mapping errors.
    pub async fn mkcalendar(
        &self,
        href: &Href,
        request: &MkCalendarRequest,
        cancel: &CancellationToken,
    ) -> Result<(), DavError> {
        let request = self
            .builder(DavMethod::MkCalendar, href)
            .header("Content-Type", "application/xml; charset=utf-8")?
            .body(request.build()?)
            .build()?;
        let response = self.pipeline.execute(request, cancel).await?;
        Self::check_status(response, href).await?;
        Ok(())
    }

    fn builder(&self, method: DavMethod, href: &Href) -> RequestBuilder {
        RequestBuilder::new(
            self.base_url.clone(),
            method,
            UriTemplate::new(href.as_str()),
        )
    }

    async fn report(
        &self,
        href: &Href,
        body: String,
        depth: Depth,
        cancel: &CancellationToken,
    ) -> Result<MultiStatus, DavError> {
        let request = self
            .builder(DavMethod::Report, href)
            .header("Depth", depth.as_str())?
            .header("Content-Type", "application/xml; charset=utf-8")?
            .body(body)
            .build()?;
        self.run_multistatus(request, href, cancel).await
    }

    async fn run_multistatus(
        &self,
        request: DavRequest,
        href: &Href,
        cancel: &CancellationToken,
    ) -> Result<MultiStatus, DavError> {
        let response = self.pipeline.execute(request, cancel).await?;
        let response = Self::check_status(response, href).await?;
        let body = response.text().await?;
        MultiStatus::from_xml(&body)
    }

    /// Maps a final non-success response to an error.
    async fn check_status(
        response: reqwest::Response,
        href: &Href,
    ) -> Result<reqwest::Response, DavError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(DavError::Auth)
            }
            reqwest::StatusCode::NOT_FOUND => Err(DavError::NotFound(href.clone())),
            reqwest::StatusCode::PRECONDITION_FAILED => {
                Err(DavError::PreconditionFailed { etag: None })
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(DavError::Protocol { status, body })
            }
        }
    }
}

fn header_etag(response: &reqwest::Response) -> Option<ETag> {
    response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(ETag::from)
}
