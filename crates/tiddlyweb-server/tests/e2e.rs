//! End-to-end tests: requests run through the full pipeline, router and
//! handlers over the sample store.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_NONE_MATCH, LOCATION};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use tiddlyweb_config::{ConfigLoader, WikiConfig};
use tiddlyweb_core::fixtures::sample_store;
use tiddlyweb_core::Store;
use tiddlyweb_middleware::tagging::tiddler_etag;
use tiddlyweb_middleware::{RequestContext, Response};
use tiddlyweb_server::{Server, ShutdownSignal};

fn server() -> Server {
    Server::new(WikiConfig::default(), Arc::new(sample_store().unwrap())).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(path: &str) -> http::request::Builder {
    Request::get(path)
}

#[tokio::test]
async fn test_tiddler_etag_then_not_modified() {
    let server = server();

    let request = get("/bags/alpha/tiddlers/foo")
        .header(ACCEPT, "application/json")
        .body(Bytes::new())
        .unwrap();
    let response = server.handle(request);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "application/json; charset=UTF-8"
    );
    let etag = response.headers()[ETAG].to_str().unwrap().to_string();

    let mut ctx = RequestContext::detached("/bags/alpha/tiddlers/foo");
    let store = Arc::new(sample_store().unwrap());
    let tiddler = store.get_tiddler("alpha", "foo", None).unwrap();
    ctx.set_store(store);
    assert_eq!(etag, tiddler_etag(&ctx, &tiddler).unwrap());

    let body = body_text(response).await;
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["title"], "foo");

    let revalidate = get("/bags/alpha/tiddlers/foo")
        .header(ACCEPT, "application/json")
        .header(IF_NONE_MATCH, &etag)
        .body(Bytes::new())
        .unwrap();
    let response = server.handle(revalidate);
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers()[ETAG], etag.as_str());
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn test_tiddler_etag_same_for_every_representation() {
    let server = server();

    let as_json = server.handle(get("/bags/alpha/tiddlers/foo.json").body(Bytes::new()).unwrap());
    let as_text = server.handle(get("/bags/alpha/tiddlers/foo.txt").body(Bytes::new()).unwrap());

    assert_eq!(as_json.status(), StatusCode::OK);
    assert_eq!(as_text.status(), StatusCode::OK);
    assert_eq!(as_json.headers()[ETAG], as_text.headers()[ETAG]);
    assert!(body_text(as_text).await.ends_with("\n\nHello from foo"));
}

#[tokio::test]
async fn test_write_changes_etag() {
    let server = server();
    let before = server.handle(get("/bags/alpha/tiddlers/foo.json").body(Bytes::new()).unwrap());
    let old_etag = before.headers()[ETAG].to_str().unwrap().to_string();

    let body = r#"{"text": "rewritten", "tags": ["greeting"]}"#;
    let put = Request::put("/bags/alpha/tiddlers/foo")
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_LENGTH, body.len())
        .body(Bytes::from(body))
        .unwrap();
    assert_eq!(server.handle(put).status(), StatusCode::NO_CONTENT);

    let stale = get("/bags/alpha/tiddlers/foo.json")
        .header(IF_NONE_MATCH, &old_etag)
        .body(Bytes::new())
        .unwrap();
    let response = server.handle(stale);
    assert_eq!(response.status(), StatusCode::OK);
    assert_ne!(response.headers()[ETAG], old_etag.as_str());
    assert!(body_text(response).await.contains("rewritten"));
}

#[tokio::test]
async fn test_unknown_extension_on_collection() {
    let response = server().handle(get("/bags.xml").body(Bytes::new()).unwrap());
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_default_representation_is_html_page() {
    let response = server().handle(get("/bags").body(Bytes::new()).unwrap());

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=UTF-8");
    let body = body_text(response).await;
    assert!(body.contains("<title>TiddlyWeb - Bags</title>"));
    assert!(body.contains("<a href=\"/bags/alpha/tiddlers\">alpha</a>"));
}

#[tokio::test]
async fn test_prefix_from_config_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "server_prefix = \"/wiki\"\n\n[server_host]\n\
         host = \"wiki.example.com\"\nport = 443\nscheme = \"https\""
    )
    .unwrap();
    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    let server = Server::new(config, Arc::new(sample_store().unwrap())).unwrap();

    let listing = server.handle(get("/wiki/bags.txt").body(Bytes::new()).unwrap());
    assert_eq!(listing.status(), StatusCode::OK);

    let outside = server.handle(get("/bags.txt").body(Bytes::new()).unwrap());
    assert_eq!(outside.status(), StatusCode::NOT_FOUND);

    let body = r#"{"text": "prefixed"}"#;
    let put = Request::put("/wiki/bags/alpha/tiddlers/new")
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_LENGTH, body.len())
        .body(Bytes::from(body))
        .unwrap();
    let response = server.handle(put);
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()[LOCATION],
        "https://wiki.example.com/wiki/bags/alpha/tiddlers/new"
    );
}

#[tokio::test]
async fn test_serves_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let task = tokio::spawn(Arc::new(server()).serve(listener, shutdown.clone()));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"GET /bags/alpha/tiddlers/foo.json HTTP/1.1\r\n\
              Host: localhost\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
    assert!(raw.to_ascii_lowercase().contains("etag: \"alpha/foo/2:"));
    assert!(raw.contains("Hello from foo"));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
