//! Loopback HTTP server serving one canned response per test.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server that answers exactly one request.
pub(crate) struct CannedServer {
    /// `http://127.0.0.1:<port>`
    pub base_url: String,
    request: JoinHandle<String>,
}

impl CannedServer {
    /// Starts a server that replies with `status` (e.g. `"200 OK"`) and `body`.
    pub async fn start(status: &'static str, content_type: &'static str, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let body = body.to_string();

        let request = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                content_type,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();

            String::from_utf8_lossy(&head).into_owned()
        });

        Self { base_url, request }
    }

    /// Returns the request line, e.g. `GET /feed.ics HTTP/1.1`.
    pub async fn request_line(self) -> String {
        let head = self.request.await.unwrap();
        head.lines().next().unwrap_or_default().to_string()
    }
}
