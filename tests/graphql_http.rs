use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cricwidget::error::FeedError;
use cricwidget::score_fetch::{GraphqlBackend, MATCH_DETAIL_QUERY, ScoreBackend};

/// Accepts one connection, records the request, answers with `status` and `body`.
fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let request = read_request(&mut stream);
        stream.write_all(response.as_bytes()).expect("write response");
        request
    });
    (format!("http://{addr}/"), handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).expect("read request");
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).expect("read body");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn request_body(raw: &str) -> serde_json::Value {
    let (_, body) = raw.split_once("\r\n\r\n").expect("request has a body");
    serde_json::from_str(body).expect("request body is json")
}

#[test]
fn detail_request_sends_match_id_as_variable() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r#"{"data":{"match":{"name":"IND vs AUS","status":"Live","score":[],"weather":null}}}"#,
    );
    let backend = GraphqlBackend::new(endpoint, Duration::from_secs(5)).expect("client");

    let hostile_id = r#"m1") { name } }"#;
    let detail = backend.get_match_detail(hostile_id).expect("detail");
    assert_eq!(detail.name, "IND vs AUS");

    let raw = server.join().expect("server thread");
    assert!(raw.starts_with("POST / HTTP/1.1"));
    let body = request_body(&raw);
    assert_eq!(body["query"], MATCH_DETAIL_QUERY);
    assert_eq!(body["variables"]["matchId"], hostile_id);
    assert!(!body["query"].as_str().unwrap_or_default().contains("m1\")"));
}

#[test]
fn list_request_has_no_variables() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r#"{"data":{"liveMatches":[{"id":"b","name":"B","status":"Live"},{"id":"a","name":"A","status":"Live"}]}}"#,
    );
    let backend = GraphqlBackend::new(endpoint, Duration::from_secs(5)).expect("client");
    let matches = backend.list_live_matches().expect("list");
    assert_eq!(matches.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), ["b", "a"]);

    let body = request_body(&server.join().expect("server thread"));
    assert!(body.get("variables").is_none());
}

#[test]
fn news_request_sends_topic_as_variable() {
    let (endpoint, server) = serve_once("200 OK", r#"{"data":{"news":[]}}"#);
    let backend = GraphqlBackend::new(endpoint, Duration::from_secs(5)).expect("client");
    assert!(backend.list_news("cricket").expect("news").is_empty());

    let body = request_body(&server.join().expect("server thread"));
    assert_eq!(body["variables"]["query"], "cricket");
}

#[test]
fn http_error_page_is_server_error() {
    let (endpoint, server) = serve_once("500 Internal Server Error", "upstream exploded");
    let backend = GraphqlBackend::new(endpoint, Duration::from_secs(5)).expect("client");
    let err = backend.list_live_matches().unwrap_err();
    assert_eq!(err, FeedError::Server("http 500".to_string()));
    server.join().expect("server thread");
}

#[test]
fn silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let _ = read_request(&mut stream);
        thread::sleep(Duration::from_secs(3));
    });

    let backend =
        GraphqlBackend::new(format!("http://{addr}/"), Duration::from_secs(1)).expect("client");
    let err = backend.get_match_detail("m1").unwrap_err();
    assert_eq!(err, FeedError::Timeout(Duration::from_secs(1)));
    server.join().expect("server thread");
}

#[test]
fn refused_connection_is_network_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        listener.local_addr().expect("local addr")
    };
    let backend =
        GraphqlBackend::new(format!("http://{addr}/"), Duration::from_secs(2)).expect("client");
    let err = backend.list_news("cricket").unwrap_err();
    assert!(matches!(err, FeedError::Network(_)), "got {err:?}");
}
