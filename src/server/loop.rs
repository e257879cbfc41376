// Server loop module
// Accepts connections until a shutdown signal arrives

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::SignalHandler;
use crate::config::AppState;
use crate::logger;

/// Run the accept loop.
///
/// Returns once `signals` requests shutdown; the listener is dropped before
/// returning so the port is released. Connection tasks already spawned keep
/// running until they finish on their own.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    signals: Arc<SignalHandler>,
) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            _ = signals.shutdown.notified() => break,

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        if signals.is_shutdown_requested() {
                            drop(stream);
                            break;
                        }
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
        }
    }

    drop(listener);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use std::net::SocketAddr;
    use std::path::Path;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;

    const FIXED_HEADERS: [&str; 4] = [
        "access-control-allow-origin: *",
        "access-control-allow-methods: get, post, options",
        "access-control-allow-headers: *",
        "cache-control: no-store, no-cache, must-revalidate",
    ];

    struct TestServer {
        addr: SocketAddr,
        signals: Arc<SignalHandler>,
        handle: JoinHandle<()>,
    }

    fn test_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.root = root.to_string_lossy().into_owned();
        config
    }

    fn start(root: &Path) -> TestServer {
        start_with(test_config(root))
    }

    fn start_with(config: Config) -> TestServer {
        let state = Arc::new(AppState::new(config.clone()).unwrap());
        let listener = create_listener(config.get_socket_addr().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let signals = Arc::new(SignalHandler::new());
        let handle = tokio::spawn(start_server_loop(listener, state, Arc::clone(&signals)));

        TestServer {
            addr,
            signals,
            handle,
        }
    }

    /// Send a raw request and read until the server closes the connection
    async fn send(addr: SocketAddr, method: &str, target: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request =
            format!("{method} {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Read one response from a connection that stays open
    async fn read_response(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-response");
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some((head, rest)) = text.split_once("\r\n\r\n") {
                let length = head
                    .lines()
                    .find_map(|l| l.to_lowercase().strip_prefix("content-length: ")?.parse().ok())
                    .unwrap_or(0usize);
                if rest.len() >= length {
                    return text;
                }
            }
        }
    }

    fn status_line(response: &str) -> &str {
        response.lines().next().unwrap_or_default()
    }

    fn header_lines(response: &str) -> Vec<String> {
        response
            .split("\r\n\r\n")
            .next()
            .unwrap_or_default()
            .lines()
            .skip(1)
            .map(str::to_lowercase)
            .collect()
    }

    fn body(response: &str) -> &str {
        response.split_once("\r\n\r\n").map_or("", |(_, b)| b)
    }

    fn assert_fixed_headers(response: &str) {
        let headers = header_lines(response);
        for expected in FIXED_HEADERS {
            assert!(
                headers.iter().any(|h| h == expected),
                "missing `{expected}` in:\n{response}"
            );
        }
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log('app');").unwrap();
        std::fs::write(dir.path().join("style.css"), "body {}").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_get_index_html() {
        let dir = site();
        let server = start(dir.path());

        let response = send(server.addr, "GET", "/index.html").await;
        assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
        assert_fixed_headers(&response);
        assert!(header_lines(&response).contains(&"content-type: text/html".to_string()));
        assert_eq!(body(&response), "<h1>home</h1>");

        server.signals.trigger();
    }

    #[tokio::test]
    async fn test_js_content_type() {
        let dir = site();
        let server = start(dir.path());

        let response = send(server.addr, "GET", "/app.js").await;
        assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
        assert!(header_lines(&response)
            .contains(&"content-type: application/javascript".to_string()));

        let response = send(server.addr, "GET", "/style.css").await;
        assert!(header_lines(&response).contains(&"content-type: text/css".to_string()));

        server.signals.trigger();
    }

    #[tokio::test]
    async fn test_missing_file_keeps_headers() {
        let dir = site();
        let server = start(dir.path());

        let response = send(server.addr, "GET", "/missing.html").await;
        assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");
        assert_fixed_headers(&response);

        server.signals.trigger();
    }

    #[tokio::test]
    async fn test_options_request() {
        let dir = site();
        let server = start(dir.path());

        let response = send(server.addr, "OPTIONS", "/index.html").await;
        assert_eq!(status_line(&response), "HTTP/1.1 204 No Content");
        assert_fixed_headers(&response);

        let response = send(server.addr, "POST", "/index.html").await;
        assert_eq!(status_line(&response), "HTTP/1.1 405 Method Not Allowed");
        assert_fixed_headers(&response);

        server.signals.trigger();
    }

    #[tokio::test]
    async fn test_traversal_never_escapes_root() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), "top secret").unwrap();
        let root = outer.path().join("public");
        std::fs::create_dir(&root).unwrap();
        let server = start(&root);

        for target in ["/../secret.txt", "/%2e%2e/secret.txt", "/..%2fsecret.txt"] {
            let response = send(server.addr, "GET", target).await;
            assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found", "{target}");
            assert!(!response.contains("top secret"));
        }

        server.signals.trigger();
    }

    #[tokio::test]
    async fn test_head_request() {
        let dir = site();
        let server = start(dir.path());

        let response = send(server.addr, "HEAD", "/index.html").await;
        assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
        assert!(header_lines(&response).contains(&"content-length: 13".to_string()));
        assert_eq!(body(&response), "");

        server.signals.trigger();
    }

    #[tokio::test]
    async fn test_shutdown_releases_listener() {
        let dir = site();
        let server = start(dir.path());

        let response = send(server.addr, "GET", "/index.html").await;
        assert_eq!(status_line(&response), "HTTP/1.1 200 OK");

        server.signals.trigger();
        tokio::time::timeout(Duration::from_secs(5), server.handle)
            .await
            .expect("loop should stop after shutdown")
            .unwrap();

        assert!(TcpStream::connect(server.addr).await.is_err());
    }

    #[tokio::test]
    async fn test_large_file_outlives_read_timeout() {
        let dir = site();
        let data: Vec<u8> = (0..4 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(dir.path().join("big.bin"), &data).unwrap();
        let mut config = test_config(dir.path());
        config.performance.read_timeout = 1;
        let server = start_with(config);

        let mut stream = TcpStream::connect(server.addr).await.unwrap();
        stream
            .write_all(b"GET /big.bin HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        // Slow client: the response is still being written when the timeout elapses
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        let split = buf.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
        assert!(buf.starts_with(b"HTTP/1.1 200 OK"));
        assert_eq!(buf.len() - split, data.len());
        assert!(buf[split..] == data[..]);

        server.signals.trigger();
    }

    #[tokio::test]
    async fn test_default_config_writes_no_log_lines() {
        let dir = site();
        let logs = tempfile::tempdir().unwrap();
        let access_log = logs.path().join("access.log");
        let error_log = logs.path().join("error.log");

        let mut config = test_config(dir.path());
        config.performance.read_timeout = 1;
        config.logging.access_log_file = Some(access_log.to_string_lossy().into_owned());
        config.logging.error_log_file = Some(error_log.to_string_lossy().into_owned());
        crate::logger::init(&config).unwrap();
        let server = start_with(config);

        // Keep-alive: two requests on one connection, then left idle past the timeout
        let mut stream = TcpStream::connect(server.addr).await.unwrap();
        for target in ["/index.html", "/missing.html"] {
            let request = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n");
            stream.write_all(request.as_bytes()).await.unwrap();
            let response = read_response(&mut stream).await;
            assert!(response.starts_with("HTTP/1.1 "));
        }
        let mut rest = Vec::new();
        let _ = tokio::time::timeout(Duration::from_secs(3), stream.read_to_end(&mut rest)).await;
        drop(stream);

        let response = send(server.addr, "GET", "/app.js").await;
        assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
        let response = send(server.addr, "HEAD", "/style.css").await;
        assert_eq!(status_line(&response), "HTTP/1.1 200 OK");

        // Connection opened and abandoned without a request
        let idle = TcpStream::connect(server.addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(idle);
        tokio::time::sleep(Duration::from_millis(200)).await;

        server.signals.trigger();
        tokio::time::timeout(Duration::from_secs(5), server.handle)
            .await
            .expect("loop should stop after shutdown")
            .unwrap();

        assert_eq!(std::fs::read_to_string(&access_log).unwrap(), "");
        assert_eq!(std::fs::read_to_string(&error_log).unwrap(), "");
    }
}
