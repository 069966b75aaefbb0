//! Archive fetcher against a mock HTTP server.

mod common;

use common::{client, fixture, ok, unreachable_url, zip_of, TestServer};
use firds_core::{ArchiveFetcher, EtlError};

const ARCHIVE_PATH: &str = "/firds/DLTINS_20210117_01of01.zip";

#[test]
fn downloads_and_collects_records() {
    let zip = zip_of(&[("DLTINS_20210117_01of01.xml", fixture("instruments.xml").as_str())]);
    let server = TestServer::start();
    server.mount(ARCHIVE_PATH, ok(zip), 1);

    let records = ArchiveFetcher::new(client())
        .fetch_records(&format!("{}{ARCHIVE_PATH}", server.uri()))
        .unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.name == "FinInstrm"));
    assert_eq!(
        records[1].find_first("FullNm").unwrap().text(),
        "KFW 1 5/8 01/15/21"
    );
}

#[test]
fn archive_without_records_is_empty() {
    let zip = zip_of(&[("empty.xml", "<BizData><Hdr/><Pyld/></BizData>")]);
    let server = TestServer::start();
    server.mount(ARCHIVE_PATH, ok(zip), 1);

    let records = ArchiveFetcher::new(client())
        .fetch_records(&format!("{}{ARCHIVE_PATH}", server.uri()))
        .unwrap();
    assert!(records.is_empty());
}

#[test]
fn error_page_is_malformed_archive() {
    // Nothing mounted: the mock server answers 404.
    let server = TestServer::start();
    let err = ArchiveFetcher::new(client())
        .fetch_records(&format!("{}{ARCHIVE_PATH}", server.uri()))
        .unwrap_err();
    match err {
        EtlError::MalformedArchive(msg) => assert!(msg.contains("404"), "message: {msg}"),
        other => panic!("expected malformed archive, got {other:?}"),
    }
}

#[test]
fn non_zip_content_is_malformed_archive() {
    let server = TestServer::start();
    server.mount(ARCHIVE_PATH, ok("this is plain text"), 1);

    let err = ArchiveFetcher::new(client())
        .fetch_records(&format!("{}{ARCHIVE_PATH}", server.uri()))
        .unwrap_err();
    assert!(matches!(err, EtlError::MalformedArchive(_)), "got {err:?}");
}

#[test]
fn unreachable_host_is_transport_failure() {
    let err = ArchiveFetcher::new(client())
        .fetch_records(&unreachable_url(ARCHIVE_PATH))
        .unwrap_err();
    assert!(err.is_transport(), "got {err:?}");
}
