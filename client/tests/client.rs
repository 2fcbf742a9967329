// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Client integration tests with wiremock.

use tokio_util::sync::CancellationToken;
use vdav_client::{
    DavClient, DavConfig, DavError, Depth, ETag, Href, MkCalendarRequest, Prop, PropFindRequest,
    SyncCollectionRequest, WritePolicy,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(mock_server: &MockServer) -> DavClient {
    DavClient::new(&mock_server.uri(), DavConfig::default()).expect("client")
}

#[tokio::test]
#[ignore = "require network"]
async fn propfind_lists_collections() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PROPFIND"))
        .and(path("/calendars/user/"))
        .and(header("Depth", "1"))
        .and(body_string_contains("D:displayname"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:response>
    <D:href>/calendars/user/work/</D:href>
    <D:propstat>
      <D:prop>
        <D:displayname>Work</D:displayname>
        <D:resourcetype>
          <D:collection/>
          <C:calendar/>
        </D:resourcetype>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let mut request = PropFindRequest::new();
    request
        .add_property(Prop::DisplayName)
        .add_property(Prop::ResourceType);

    let cancel = CancellationToken::new();
    let multistatus = client
        .propfind(
            &Href::from("/calendars/user/"),
            Depth::One,
            &request,
            &cancel,
        )
        .await
        .expect("propfind");

    let (response, prop) = multistatus.successes().next().expect("one success");
    assert_eq!(response.href.as_str(), "/calendars/user/work/");
    assert_eq!(prop.display_name.as_deref(), Some("Work"));
    assert!(prop.is_calendar);
}

#[tokio::test]
#[ignore = "require network"]
async fn get_returns_body_and_etag() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/user/work/standup.ics"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"etag-7\"")
                .set_body_string("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n"),
        )
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let cancel = CancellationToken::new();
    let (body, etag) = client
        .get(&Href::from("/calendars/user/work/standup.ics"), &cancel)
        .await
        .expect("get");

    assert!(body.starts_with("BEGIN:VCALENDAR"));
    assert_eq!(etag, Some(ETag::from("\"etag-7\"")));
}

#[tokio::test]
#[ignore = "require network"]
async fn stale_update_fails_without_a_retry() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/calendars/user/work/standup.ics"))
        .and(header("If-Match", "\"stale\""))
        .respond_with(ResponseTemplate::new(412))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let cancel = CancellationToken::new();
    let result = client
        .put(
            &Href::from("/calendars/user/work/standup.ics"),
            "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n".to_string(),
            "text/calendar",
            &WritePolicy::Update(ETag::from("\"stale\"")),
            &cancel,
        )
        .await;

    assert!(matches!(
        result,
        Err(DavError::PreconditionFailed { etag: Some(etag) }) if etag.as_str() == "\"stale\""
    ));
}

#[tokio::test]
#[ignore = "require network"]
async fn create_only_put_sends_if_none_match() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/addressbooks/user/contacts/ada.vcf"))
        .and(header("If-None-Match", "*"))
        .respond_with(ResponseTemplate::new(201).insert_header("ETag", "\"fresh\""))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let cancel = CancellationToken::new();
    let etag = client
        .put(
            &Href::from("/addressbooks/user/contacts/ada.vcf"),
            "BEGIN:VCARD\r\nEND:VCARD\r\n".to_string(),
            "text/vcard",
            &WritePolicy::CreateOnly,
            &cancel,
        )
        .await
        .expect("put");

    assert_eq!(etag, Some(ETag::from("\"fresh\"")));
}

#[tokio::test]
#[ignore = "require network"]
async fn sync_collection_round_trip() {
    let mock_server = MockServer::start().await;
    Mock::given(method("REPORT"))
        .and(path("/calendars/user/work/"))
        .and(header("Depth", "0"))
        .and(body_string_contains("D:sync-collection"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/calendars/user/work/new.ics</D:href>
    <D:propstat>
      <D:prop><D:getetag>"etag-1"</D:getetag></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:sync-token>sync-2</D:sync-token>
</D:multistatus>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let cancel = CancellationToken::new();
    let multistatus = client
        .sync_collection(
            &Href::from("/calendars/user/work/"),
            &SyncCollectionRequest::new(None),
            &cancel,
        )
        .await
        .expect("sync");

    assert_eq!(
        multistatus.sync_token.as_ref().map(|t| t.as_str()),
        Some("sync-2")
    );
    assert_eq!(multistatus.responses.len(), 1);
}

#[tokio::test]
#[ignore = "require network"]
async fn missing_resource_maps_to_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/user/work/gone.ics"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let cancel = CancellationToken::new();
    let result = client
        .get(&Href::from("/calendars/user/work/gone.ics"), &cancel)
        .await;

    assert!(matches!(
        result,
        Err(DavError::NotFound(href)) if href.as_str().ends_with("gone.ics")
    ));
}

#[tokio::test]
#[ignore = "require network"]
async fn mkcalendar_creates_a_collection() {
    let mock_server = MockServer::start().await;
    Mock::given(method("MKCALENDAR"))
        .and(path("/calendars/user/new/"))
        .and(body_string_contains("D:displayname"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let cancel = CancellationToken::new();
    client
        .mkcalendar(
            &Href::from("/calendars/user/new/"),
            &MkCalendarRequest::new()
                .display_name("New calendar")
                .component("VEVENT"),
            &cancel,
        )
        .await
        .expect("mkcalendar");
}
