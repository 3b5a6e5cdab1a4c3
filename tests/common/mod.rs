#![allow(dead_code)]

pub mod fake_site;

use std::collections::BTreeMap;

use storefront_e2e::actions::ShopActions;
use storefront_e2e::auth::credentials::Credentials;
use storefront_e2e::auth::session_cache::SessionCache;
use storefront_e2e::fixtures::{FixtureStore, ProductFixture};
use storefront_e2e::pages::context::PageContext;
use storefront_e2e::scenario::context::{ApiSettings, SuiteResources};
use storefront_e2e::scenario::suite::{API_UI_FIXTURE, RELIABILITY_FIXTURE, WORKFLOW_FIXTURE};
use storefront_e2e::trace::logger::StepTrail;
use storefront_e2e::wait::Timeouts;

use fake_site::{FakeSite, BASE_URL, PASSWORD, SKU, USERNAME};

/// Generous bounds; the fake settles within a few polls.
pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        element_ms: 2_000,
        page_load_ms: 2_000,
        request_ms: 2_000,
        poll_interval_ms: 1,
    }
}

/// For tests that expect a timeout.
pub fn short_timeouts() -> Timeouts {
    Timeouts {
        element_ms: 50,
        page_load_ms: 50,
        request_ms: 500,
        poll_interval_ms: 1,
    }
}

/// Page context over a clone of `site`, recording into memory.
pub fn page_for(site: &FakeSite, timeouts: Timeouts) -> PageContext {
    PageContext::new(Box::new(site.clone()), BASE_URL, timeouts).with_trail(StepTrail::in_memory())
}

pub fn credentials() -> Credentials {
    Credentials::new(USERNAME, PASSWORD)
}

pub fn fixtures() -> FixtureStore {
    let mut products = BTreeMap::new();
    products.insert(
        WORKFLOW_FIXTURE.to_string(),
        ProductFixture {
            sku: SKU.into(),
            special_instructions: "Handle with care".into(),
            expected_item_description: "Bracelet".into(),
        },
    );
    products.insert(
        API_UI_FIXTURE.to_string(),
        ProductFixture {
            sku: SKU.into(),
            ..Default::default()
        },
    );
    products.insert(
        RELIABILITY_FIXTURE.to_string(),
        ProductFixture {
            sku: SKU.into(),
            ..Default::default()
        },
    );
    FixtureStore::new(products)
}

pub fn resources(api_base_url: &str, credentials: Option<Credentials>, ci: bool) -> SuiteResources {
    SuiteResources {
        actions: ShopActions::new(SessionCache::new()),
        fixtures: fixtures(),
        credentials: credentials.ok_or_else(|| "STOREFRONT_USERNAME and STOREFRONT_PASSWORD".to_string()),
        api: ApiSettings {
            base_url: api_base_url.to_string(),
            request_timeout: std::time::Duration::from_secs(5),
        },
        ci,
    }
}

/// Serve exactly one HTTP response on a local port and return the base URL.
///
/// The request head is returned through the join handle so tests can
/// inspect what was sent.
pub fn one_shot_server(status_line: &str, body: &str) -> (String, std::thread::JoinHandle<String>) {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 4096];
        let mut request = Vec::new();
        loop {
            let n = stream.read(&mut buf).unwrap();
            request.extend_from_slice(&buf[..n]);
            if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        String::from_utf8_lossy(&request).to_string()
    });
    (format!("http://{}", addr), handle)
}
