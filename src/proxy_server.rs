//! Local profile proxy.
//!
//! Browser-hosted consumers cannot read steamcommunity.com directly because
//! of CORS. This server runs in the privileged process, forwards
//! `/miniprofile/{id}/json` to the community site and hands the body back
//! with permissive CORS headers.

use std::sync::Arc;
use std::thread;

use tiny_http::{Response, Server};
use url::Url;

use crate::steam::client::{fetch_profile_body, miniprofile_url};

/// CORS headers to allow cross-origin requests from a browser context
fn cors_headers() -> Vec<tiny_http::Header> {
    vec![
        tiny_http::Header::from_bytes(&b"Access-Control-Allow-Origin"[..], &b"*"[..]).unwrap(),
        tiny_http::Header::from_bytes(&b"Access-Control-Allow-Methods"[..], &b"GET, OPTIONS"[..])
            .unwrap(),
        tiny_http::Header::from_bytes(&b"Access-Control-Allow-Headers"[..], &b"Content-Type"[..])
            .unwrap(),
    ]
}

fn json_body_response(status: u16, body: String) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut response = Response::from_string(body)
        .with_header(
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
        )
        .with_status_code(status);

    for header in cors_headers() {
        response.add_header(header);
    }

    response
}

fn json_response(status: u16, body: serde_json::Value) -> Response<std::io::Cursor<Vec<u8>>> {
    json_body_response(status, body.to_string())
}

fn preflight_response() -> Response<std::io::Empty> {
    let mut response = Response::empty(204);
    for header in cors_headers() {
        response.add_header(header);
    }
    response
}

/// Splits `/miniprofile/{id}/json` into its Steam ID.
fn parse_profile_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/miniprofile/")?;
    let steam_id = rest.strip_suffix("/json")?;
    if steam_id.contains('/') {
        return None;
    }
    Some(steam_id)
}

pub struct ProfileProxy {
    pub port: u16,
    server: Arc<Server>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ProfileProxy {
    /// Bind on `127.0.0.1:{port}` (0 picks a free port) and serve on a
    /// dedicated thread. Upstream requests run on `runtime`.
    pub fn start(
        port: u16,
        community_url: &str,
        runtime: tokio::runtime::Handle,
    ) -> Result<Self, String> {
        let server = Server::http(("127.0.0.1", port))
            .map_err(|e| format!("Failed to start profile proxy: {}", e))?;

        let port = server
            .server_addr()
            .to_ip()
            .ok_or("Failed to get server address")?
            .port();

        tracing::info!("Profile proxy started on port {}", port);

        let server = Arc::new(server);
        let server_clone = Arc::clone(&server);
        let community_url = community_url.trim_end_matches('/').to_string();

        let worker = thread::spawn(move || {
            Self::run_server(&server_clone, &community_url, &runtime);
        });

        Ok(Self {
            port,
            server,
            worker: Some(worker),
        })
    }

    fn run_server(server: &Server, community_url: &str, runtime: &tokio::runtime::Handle) {
        let http = reqwest::Client::new();

        for request in server.incoming_requests() {
            if request.method() == &tiny_http::Method::Options {
                request.respond(preflight_response()).ok();
                continue;
            }

            let full_url = format!("http://127.0.0.1{}", request.url());
            let url = match Url::parse(&full_url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!("Failed to parse profile proxy URL: {}", e);
                    let response = json_response(400, serde_json::json!({"error": e.to_string()}));
                    request.respond(response).ok();
                    continue;
                }
            };

            tracing::debug!("Profile proxy received request: {}", url.path());

            if request.method() != &tiny_http::Method::Get {
                let response =
                    json_response(405, serde_json::json!({"error": "Method not allowed"}));
                request.respond(response).ok();
                continue;
            }

            let Some(steam_id) = parse_profile_path(url.path()) else {
                let response = json_response(404, serde_json::json!({"error": "Not found"}));
                request.respond(response).ok();
                continue;
            };

            if steam_id.is_empty() || !steam_id.bytes().all(|b| b.is_ascii_digit()) {
                let response =
                    json_response(400, serde_json::json!({"error": "SteamId must be a number."}));
                request.respond(response).ok();
                continue;
            }

            let upstream = miniprofile_url(community_url, steam_id);
            let response = match runtime.block_on(fetch_profile_body(&http, &upstream)) {
                Ok(body) => json_body_response(200, body),
                Err(e) => {
                    tracing::warn!("Profile proxy upstream request failed: {}", e);
                    json_response(502, serde_json::json!({"error": e.to_string()}))
                }
            };
            request.respond(response).ok();
        }

        tracing::debug!("Profile proxy stopped");
    }

    pub fn shutdown(mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for ProfileProxy {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_profile_paths() {
        assert_eq!(parse_profile_path("/miniprofile/123/json"), Some("123"));
        assert_eq!(parse_profile_path("/miniprofile/123"), None);
        assert_eq!(parse_profile_path("/miniprofile/1/2/json"), None);
        assert_eq!(parse_profile_path("/status"), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn forwards_profile_with_cors_headers() {
        let mut upstream = mockito::Server::new_async().await;
        let mock = upstream
            .mock("GET", "/miniprofile/555/json")
            .with_status(200)
            .with_body(r#"{"persona_name":"proxied"}"#)
            .create_async()
            .await;

        let proxy =
            ProfileProxy::start(0, &upstream.url(), tokio::runtime::Handle::current()).unwrap();
        let url = format!("http://127.0.0.1:{}/miniprofile/555/json", proxy.port);

        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
        assert_eq!(response.text().await.unwrap(), r#"{"persona_name":"proxied"}"#);
        mock.assert_async().await;

        tokio::task::spawn_blocking(move || proxy.shutdown())
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejects_bad_requests() {
        let upstream = mockito::Server::new_async().await;
        let proxy =
            ProfileProxy::start(0, &upstream.url(), tokio::runtime::Handle::current()).unwrap();
        let base = format!("http://127.0.0.1:{}", proxy.port);

        let status = reqwest::get(format!("{}/miniprofile/abc/json", base))
            .await
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 400);

        let status = reqwest::get(format!("{}/elsewhere", base))
            .await
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 404);

        let preflight = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, format!("{}/miniprofile/1/json", base))
            .send()
            .await
            .unwrap();
        assert_eq!(preflight.status().as_u16(), 204);

        let post = reqwest::Client::new()
            .post(format!("{}/miniprofile/1/json", base))
            .send()
            .await
            .unwrap();
        assert_eq!(post.status().as_u16(), 405);

        tokio::task::spawn_blocking(move || proxy.shutdown())
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upstream_failure_is_bad_gateway() {
        let mut upstream = mockito::Server::new_async().await;
        upstream
            .mock("GET", "/miniprofile/9/json")
            .with_status(500)
            .create_async()
            .await;

        let proxy =
            ProfileProxy::start(0, &upstream.url(), tokio::runtime::Handle::current()).unwrap();
        let status = reqwest::get(format!("http://127.0.0.1:{}/miniprofile/9/json", proxy.port))
            .await
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 502);

        tokio::task::spawn_blocking(move || proxy.shutdown())
            .await
            .unwrap();
    }
}
