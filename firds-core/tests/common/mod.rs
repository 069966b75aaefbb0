//! Shared helpers for integration tests: fixtures, in-test ZIPs, a mock HTTP
//! server, and an in-memory object store.

#![allow(dead_code)]

use firds_core::{ObjectStore, Result};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_dir().join(name)).unwrap()
}

/// Build a ZIP holding the given `(name, content)` entries, in order.
pub fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        for (name, content) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

/// A `wiremock` server driven from synchronous tests.
///
/// The runtime only starts the server and mounts mocks; requests come from
/// the blocking client on the test thread. Expectations set with `.expect`
/// are verified when the server is dropped.
pub struct TestServer {
    server: MockServer,
    rt: tokio::runtime::Runtime,
}

impl TestServer {
    pub fn start() -> Self {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Answer `GET route` with `response`, expecting exactly `hits` requests.
    pub fn mount(&self, route: &str, response: ResponseTemplate, hits: u64) {
        self.rt.block_on(
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(response)
                .expect(hits)
                .mount(&self.server),
        );
    }
}

pub fn ok(body: impl Into<Vec<u8>>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_bytes(body)
}

pub fn status(code: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(code).set_body_string(body)
}

/// A URL on a loopback port nobody listens on.
pub fn unreachable_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}{path}")
}

pub fn client() -> reqwest::blocking::Client {
    firds_core::http::build_client(&Default::default()).unwrap()
}

/// Object store keeping uploads in memory.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryStore {
    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

impl ObjectStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }
}
