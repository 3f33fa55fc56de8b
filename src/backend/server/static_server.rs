//! Sequential static file server for local development.
//!
//! Connections are handled one at a time: the next client is accepted only after
//! the current response has been written.

use super::mime::content_type_for;
use crate::backend::utils::formater::format_size;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::{TcpListener, TcpStream};

const MAX_HEAD_BYTES: u64 = 16 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(10);
const DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Response statuses the server produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    MovedPermanently,
    BadRequest,
    Forbidden,
    NotFound,
    NotImplemented,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::MovedPermanently => 301,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::NotImplemented => 501,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::MovedPermanently => "Moved Permanently",
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::NotImplemented => "Not Implemented",
        }
    }
}

enum Body {
    Bytes(Vec<u8>),
    File(File),
}

struct Response {
    status: Status,
    content_type: &'static str,
    length: u64,
    location: Option<String>,
    body: Body,
}

impl Response {
    fn html(status: Status, html: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            length: html.len() as u64,
            location: None,
            body: Body::Bytes(html.into_bytes()),
        }
    }

    fn error(status: Status) -> Self {
        let title = format!("{} {}", status.code(), status.reason());
        Self::html(
            status,
            format!(
                "<!DOCTYPE html>\n<html><head><title>{title}</title></head>\
                 <body><h1>{title}</h1></body></html>\n"
            ),
        )
    }

    fn redirect(location: String) -> Self {
        let mut response = Self::error(Status::MovedPermanently);
        response.location = Some(location);
        response
    }

    async fn file(path: &Path) -> Self {
        let opened = async {
            let file = File::open(path).await?;
            let length = file.metadata().await?.len();
            Ok::<_, io::Error>((file, length))
        }
        .await;

        match opened {
            Ok((file, length)) => Self {
                status: Status::Ok,
                content_type: content_type_for(path),
                length,
                location: None,
                body: Body::File(file),
            },
            Err(e) => {
                log::debug!("Cannot open {path:?}: {e}");
                Self::error(Status::NotFound)
            }
        }
    }

    async fn write_to<W>(self, out: &mut W, send_body: bool) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut head = format!(
            "HTTP/1.0 {} {}\r\n\
             Server: wasm-assets/{}\r\n\
             Date: {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n",
            self.status.code(),
            self.status.reason(),
            env!("CARGO_PKG_VERSION"),
            chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT"),
            self.content_type,
            self.length,
        );
        if let Some(location) = &self.location {
            head.push_str(&format!("Location: {location}\r\n"));
        }
        head.push_str("\r\n");

        out.write_all(head.as_bytes()).await?;

        if send_body {
            match self.body {
                Body::Bytes(bytes) => out.write_all(&bytes).await?,
                Body::File(mut file) => {
                    tokio::io::copy(&mut file, out).await?;
                }
            }
        }

        out.flush().await
    }
}

/// A request target mapped onto the served root.
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Filesystem path under the root.
    pub path: PathBuf,
    /// Decoded URL path, always starting with `/`.
    pub url_path: String,
    /// URL path as sent by the client, without query or fragment.
    pub raw_path: String,
}

/// Maps a request target onto `root`.
///
/// Query strings and fragments are dropped. Any `..` segment is refused.
pub fn resolve_target(root: &Path, target: &str) -> Result<ResolvedTarget, Status> {
    let raw_path = target
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_string();
    if !raw_path.starts_with('/') {
        return Err(Status::BadRequest);
    }

    let url_path = urlencoding::decode(&raw_path)
        .map_err(|_| Status::BadRequest)?
        .into_owned();

    let mut path = root.to_path_buf();
    for segment in url_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(Status::Forbidden),
            s if s.contains(['\\', '\0']) => return Err(Status::Forbidden),
            s => path.push(s),
        }
    }

    Ok(ResolvedTarget {
        path,
        url_path,
        raw_path,
    })
}

fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

async fn directory_listing(dir: &Path, url_path: &str) -> io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let meta = entry.metadata().await?;
        entries.push((name, meta.is_dir(), meta.len()));
    }
    entries.sort_by_key(|(name, ..)| name.to_lowercase());

    let title = html_escape(&format!("Directory listing for {url_path}"));
    let mut html = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for (name, is_dir, len) in entries {
        let (shown, href) = if is_dir {
            (format!("{name}/"), format!("{}/", urlencoding::encode(&name)))
        } else {
            (name.clone(), urlencoding::encode(&name).into_owned())
        };
        let size = if is_dir {
            String::new()
        } else {
            format!(" ({})", format_size(len as f64))
        };
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a>{size}</li>\n",
            html_escape(&href),
            html_escape(&shown)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body></html>\n");
    Ok(html)
}

async fn respond(root: &Path, method: &str, target: &str) -> Response {
    if method != "GET" && method != "HEAD" {
        return Response::error(Status::NotImplemented);
    }

    let resolved = match resolve_target(root, target) {
        Ok(resolved) => resolved,
        Err(status) => return Response::error(status),
    };

    let meta = match fs::metadata(&resolved.path).await {
        Ok(meta) => meta,
        Err(_) => return Response::error(Status::NotFound),
    };

    if !meta.is_dir() {
        if resolved.raw_path.ends_with('/') {
            return Response::error(Status::NotFound);
        }
        return Response::file(&resolved.path).await;
    }

    if !resolved.raw_path.ends_with('/') {
        return Response::redirect(format!("{}/", resolved.raw_path));
    }

    let index = resolved.path.join("index.html");
    if fs::metadata(&index).await.is_ok_and(|m| m.is_file()) {
        return Response::file(&index).await;
    }

    match directory_listing(&resolved.path, &resolved.url_path).await {
        Ok(html) => Response::html(Status::Ok, html),
        Err(e) => {
            log::debug!("Cannot list {:?}: {e}", resolved.path);
            Response::error(Status::NotFound)
        }
    }
}

/// Reads the request line and discards the remaining header lines.
///
/// Header bytes are never decoded; a request line that is not UTF-8 is decoded lossily.
async fn read_head<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut request_line = Vec::new();
    if reader.read_until(b'\n', &mut request_line).await? == 0 {
        return Ok(None);
    }

    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).await?;
        if n == 0 || line.trim_ascii().is_empty() {
            break;
        }
    }

    let request_line = String::from_utf8_lossy(&request_line);
    Ok(Some(request_line.trim_end_matches(['\r', '\n']).to_string()))
}

fn parse_request_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let version = parts.next()?;
    if parts.next().is_some() || !version.starts_with("HTTP/") {
        return None;
    }
    Some((method, target))
}

fn log_request(peer: SocketAddr, request_line: &str, status: Status) {
    if status == Status::NotFound {
        println!("[404 ERROR] File not found: {request_line}");
    } else {
        println!("[{}] {request_line}", status.code());
    }
    eprintln!(
        "{} - - [{}] \"{request_line}\" {} -",
        peer.ip(),
        chrono::Local::now().format("%d/%b/%Y %H:%M:%S"),
        status.code()
    );
}

/// Serves files below a root directory over HTTP/1.0.
pub struct StaticServer {
    listener: TcpListener,
    root: PathBuf,
}

impl StaticServer {
    pub async fn bind(addr: SocketAddr, root: impl Into<PathBuf>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            root: root.into(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serves until the process is terminated.
    pub async fn run(self) -> io::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` completes.
    pub async fn run_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => return Ok(()),
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if let Err(e) = self.handle(stream, peer).await {
                            log::debug!("Connection from {peer} failed: {e}");
                        }
                    }
                    Err(e) => log::warn!("Failed to accept connection: {e}"),
                },
            }
        }
    }

    async fn handle(&self, mut stream: TcpStream, peer: SocketAddr) -> io::Result<()> {
        let (read_half, mut write_half) = stream.split();
        let mut reader = BufReader::new(read_half).take(MAX_HEAD_BYTES);

        let head = match tokio::time::timeout(READ_TIMEOUT, read_head(&mut reader)).await {
            Ok(head) => head?,
            Err(_) => {
                log::debug!("Timed out reading request from {peer}");
                return Ok(());
            }
        };
        let Some(request_line) = head else {
            return Ok(());
        };

        let (response, send_body) = match parse_request_line(&request_line) {
            Some((method, target)) => (
                respond(&self.root, method, target).await,
                method != "HEAD",
            ),
            None => (Response::error(Status::BadRequest), true),
        };

        log_request(peer, &request_line, response.status);
        response.write_to(&mut write_half, send_body).await?;
        write_half.shutdown().await?;

        // Unread request bodies would turn the close into a reset.
        let mut rest = reader.into_inner();
        let _ = tokio::time::timeout(DRAIN_TIMEOUT, async {
            let mut buf = [0u8; 4096];
            while let Ok(n) = rest.read(&mut buf).await {
                if n == 0 {
                    break;
                }
            }
        })
        .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_nested_paths() {
        let root = Path::new("/srv/site");
        let resolved = resolve_target(root, "/lib/ffmpeg-core.wasm?v=2#x").unwrap();
        assert_eq!(resolved.path, root.join("lib").join("ffmpeg-core.wasm"));
        assert_eq!(resolved.url_path, "/lib/ffmpeg-core.wasm");
        assert_eq!(resolved.raw_path, "/lib/ffmpeg-core.wasm");
    }

    #[test]
    fn decodes_percent_escapes() {
        let root = Path::new("/srv/site");
        let resolved = resolve_target(root, "/my%20clip.mp4").unwrap();
        assert_eq!(resolved.path, root.join("my clip.mp4"));
        assert_eq!(resolved.raw_path, "/my%20clip.mp4");
    }

    #[test]
    fn refuses_traversal() {
        let root = Path::new("/srv/site");
        assert_eq!(resolve_target(root, "/../etc/passwd"), Err(Status::Forbidden));
        assert_eq!(resolve_target(root, "/lib/%2e%2e/%2e%2e/x"), Err(Status::Forbidden));
        assert_eq!(resolve_target(root, "relative"), Err(Status::BadRequest));
    }

    #[test]
    fn malformed_escapes_stay_literal() {
        let root = Path::new("/srv/site");
        assert_eq!(resolve_target(root, "/100%").unwrap().path, root.join("100%"));
        assert_eq!(resolve_target(root, "/%41%42.js").unwrap().url_path, "/AB.js");
        assert_eq!(resolve_target(root, "/%ff.js"), Err(Status::BadRequest));
    }

    #[test]
    fn escapes_names() {
        assert_eq!(html_escape("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
    }

    #[test]
    fn request_line_parsing() {
        assert_eq!(
            parse_request_line("GET /index.html HTTP/1.1"),
            Some(("GET", "/index.html"))
        );
        assert_eq!(parse_request_line("GET /index.html"), None);
        assert_eq!(parse_request_line("garbage"), None);
    }

    #[tokio::test]
    async fn read_head_skips_headers() {
        let raw: &[u8] = b"GET / HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\nignored";
        let mut reader = BufReader::new(raw);
        let line = read_head(&mut reader).await.unwrap();
        assert_eq!(line.as_deref(), Some("GET / HTTP/1.1"));

        let mut rest = String::new();
        reader.read_to_string(&mut rest).await.unwrap();
        assert_eq!(rest, "ignored");
    }

    #[tokio::test]
    async fn read_head_tolerates_latin1_bytes() {
        let raw: &[u8] = b"GET /caf\xe9.html HTTP/1.1\r\nUser-Agent: caf\xe9\r\n\r\n";
        let mut reader = BufReader::new(raw);
        let line = read_head(&mut reader).await.unwrap().unwrap();
        assert_eq!(line, "GET /caf\u{FFFD}.html HTTP/1.1");
        assert_eq!(parse_request_line(&line), Some(("GET", "/caf\u{FFFD}.html")));
    }
}
