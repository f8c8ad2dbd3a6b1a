use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use crontab_explorer::{
    client::{ClientError, ToolClient},
    lib::errors::ToolError,
    server::runtime::{ParameterSchema, ToolHandler, ToolRegistry},
    tools::{register_tool, CheckServerStatus, ToolOutput, ToolStatus},
};
use serde_json::{json, Map, Value};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    time::{timeout, Instant},
};

use crate::common::{closed_port, http, CannedHost, TestServer};

struct Sleepy;

#[async_trait]
impl ToolHandler for Sleepy {
    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::default()
    }

    async fn call(&self, _params: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        Ok(ToolOutput::success().field("slept", true))
    }
}

struct Exploding;

#[async_trait]
impl ToolHandler for Exploding {
    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::default()
    }

    async fn call(&self, _params: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        panic!("boom");
    }
}

fn minimal_params(tool: &str) -> Map<String, Value> {
    let mut params = Map::new();
    if tool == "search_crontab_entries" {
        params.insert("search_term".into(), json!("sync"));
    }
    params
}

#[tokio::test]
async fn single_status_tool_is_discovered_and_online() -> Result<()> {
    let mut registry = ToolRegistry::new();
    register_tool(&mut registry, CheckServerStatus::new(1))?;
    let server = TestServer::start(registry).await?;
    let client = ToolClient::new("127.0.0.1", server.port())?;

    let tools = client.discover().await?;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "check_server_status");

    let output = client.invoke("check_server_status", &Map::new()).await?;
    assert_eq!(output.status, ToolStatus::Online);
    assert_eq!(output.get("tools_available"), Some(&json!(1)));

    server.stop().await
}

#[tokio::test]
async fn search_without_match_is_a_warning_not_an_error() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let response = http()
        .post(server.url("/tools/search_crontab_entries"))
        .json(&json!({ "search_term": "backup" }))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await?;
    assert_eq!(body["status"], json!("warning"));
    assert_eq!(body["count"], json!(0));
    assert!(body["timestamp"].is_string());

    server.stop().await
}

#[tokio::test]
async fn unregistered_tool_is_404_with_error_body() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let response = http()
        .post(server.url("/tools/frobnicate"))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({ "error": "Tool 'frobnicate' not found" }));

    let client = ToolClient::new("127.0.0.1", server.port())?;
    let err = client
        .invoke("frobnicate", &Map::new())
        .await
        .expect_err("unknown tool");
    assert_eq!(err.status(), Some(404));

    server.stop().await
}

#[tokio::test]
async fn every_discovered_tool_is_invocable() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let client = ToolClient::new("127.0.0.1", server.port())?;

    let tools = client.discover().await?;
    assert_eq!(tools.len(), 5);
    for tool in &tools {
        let output = client.invoke(&tool.name, &minimal_params(&tool.name)).await?;
        assert!(
            !output.status.is_failure(),
            "{} returned a failure envelope: {output:?}",
            tool.name
        );
    }

    server.stop().await
}

#[tokio::test]
async fn discovery_is_idempotent() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let first = http().get(server.url("/tools")).send().await?.bytes().await?;
    let second = http().get(server.url("/tools")).send().await?.bytes().await?;
    assert_eq!(first, second);

    server.stop().await
}

#[tokio::test]
async fn malformed_json_body_yields_failure_envelope() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let response = http()
        .post(server.url("/tools/search_crontab_entries"))
        .header("content-type", "application/json")
        .body("{\"search_term\": ")
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], json!("error"));
    assert_eq!(body["message"], json!("invalid parameters"));

    server.stop().await
}

#[tokio::test]
async fn missing_parameter_is_reported_in_envelope() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let client = ToolClient::new("127.0.0.1", server.port())?;
    let output = client.invoke("search_crontab_entries", &Map::new()).await?;
    assert_eq!(output.status, ToolStatus::Error);
    assert_eq!(
        output.message(),
        Some("Error: missing required parameter 'search_term'")
    );

    server.stop().await
}

#[tokio::test]
async fn request_without_content_length_is_answered_and_closed() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let mut stream = TcpStream::connect(server.addr()).await?;
    stream
        .write_all(b"POST /tools/check_server_status HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await?;

    let mut raw = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut raw)).await??;
    let response = String::from_utf8(raw)?;
    let lower = response.to_ascii_lowercase();
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(lower.contains("connection: close"), "{response}");
    assert!(lower.contains("access-control-allow-origin: *"), "{response}");
    assert!(lower.contains("content-type: application/json"), "{response}");

    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("response has a header block");
    let declared: usize = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .expect("content-length header");
    assert_eq!(declared, body.len());
    assert!(body.contains("\"status\": \"online\""), "{body}");

    server.stop().await
}

#[tokio::test]
async fn unfinished_headers_are_dropped_after_read_timeout() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let mut stream = TcpStream::connect(server.addr()).await?;
    stream
        .write_all(b"POST /tools/check_server_status HTTP/1.1\r\nHost: localhost\r\n")
        .await?;

    let mut raw = Vec::new();
    timeout(Duration::from_secs(6), stream.read_to_end(&mut raw))
        .await
        .context("server kept a connection with unfinished headers open")?
        .ok();

    let client = ToolClient::new("127.0.0.1", server.port())?;
    let output = client.invoke("check_server_status", &Map::new()).await?;
    assert_eq!(output.status, ToolStatus::Online);

    server.stop().await
}

#[tokio::test]
async fn stalled_body_gets_a_json_error_after_read_timeout() -> Result<()> {
    let server = TestServer::start_builtin(CannedHost::sample()).await?;
    let mut stream = TcpStream::connect(server.addr()).await?;
    stream
        .write_all(
            b"POST /tools/check_server_status HTTP/1.1\r\nHost: localhost\r\nContent-Length: 10\r\n\r\n{}",
        )
        .await?;

    let mut raw = Vec::new();
    timeout(Duration::from_secs(6), stream.read_to_end(&mut raw))
        .await
        .context("server never answered a stalled body")??;
    let response = String::from_utf8(raw)?;
    let lower = response.to_ascii_lowercase();
    assert!(response.starts_with("HTTP/1.1 400"), "{response}");
    assert!(lower.contains("content-type: application/json"), "{response}");
    assert!(lower.contains("connection: close"), "{response}");

    let (_, body) = response
        .split_once("\r\n\r\n")
        .expect("response has a header block");
    let body: Value = serde_json::from_str(body)?;
    assert!(body["error"].is_string(), "{body}");

    server.stop().await
}

#[tokio::test]
async fn slow_tool_does_not_block_other_connections() -> Result<()> {
    let mut registry = ToolRegistry::new();
    registry.register("sleepy", "sleeps before answering", Arc::new(Sleepy))?;
    register_tool(&mut registry, CheckServerStatus::new(2))?;
    let server = TestServer::start(registry).await?;
    let client = ToolClient::new("127.0.0.1", server.port())?;

    let slow_client = client.clone();
    let slow = tokio::spawn(async move { slow_client.invoke("sleepy", &Map::new()).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    let status = client.invoke("check_server_status", &Map::new()).await?;
    assert_eq!(status.status, ToolStatus::Online);
    assert!(started.elapsed() < Duration::from_millis(1000));

    let slept = slow.await??;
    assert_eq!(slept.get("slept"), Some(&json!(true)));

    server.stop().await
}

#[tokio::test]
async fn panicking_tool_is_contained() -> Result<()> {
    let mut registry = ToolRegistry::new();
    registry.register("explode", "always panics", Arc::new(Exploding))?;
    register_tool(&mut registry, CheckServerStatus::new(2))?;
    let server = TestServer::start(registry).await?;

    let response = http().post(server.url("/tools/explode")).send().await?;
    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({ "error": "Error calling tool: boom" }));

    let client = ToolClient::new("127.0.0.1", server.port())?;
    let output = client.invoke("check_server_status", &Map::new()).await?;
    assert_eq!(output.status, ToolStatus::Online);

    server.stop().await
}

/// Serve one canned HTTP response per connection.
async fn canned_responder(response: &'static str) -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(read) => request.extend_from_slice(&chunk[..read]),
                }
            }
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    Ok(port)
}

#[tokio::test]
async fn client_reports_each_discovery_failure_distinctly() -> Result<()> {
    let bad_json = canned_responder(
        "HTTP/1.1 200 OK\r\nContent-Length: 8\r\nConnection: close\r\n\r\nnot json",
    )
    .await?;
    let err = ToolClient::new("127.0.0.1", bad_json)?
        .discover()
        .await
        .expect_err("body is not JSON");
    assert!(matches!(err, ClientError::InvalidJson { .. }), "got {err:?}");

    let empty = canned_responder(
        "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await?;
    let err = ToolClient::new("127.0.0.1", empty)?
        .discover()
        .await
        .expect_err("body is empty");
    assert!(matches!(err, ClientError::EmptyBody), "got {err:?}");

    let unavailable = canned_responder(
        "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 4\r\nConnection: close\r\n\r\nbusy",
    )
    .await?;
    let err = ToolClient::new("127.0.0.1", unavailable)?
        .discover()
        .await
        .expect_err("status is not 200");
    assert!(
        matches!(err, ClientError::Status { status: 503, ref body } if body == "busy"),
        "got {err:?}"
    );

    let err = ToolClient::new("127.0.0.1", closed_port().await?)?
        .discover()
        .await
        .expect_err("nothing listens");
    assert!(matches!(err, ClientError::Connection { .. }), "got {err:?}");
    Ok(())
}
