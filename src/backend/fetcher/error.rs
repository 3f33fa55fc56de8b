use std::io;

/// Why a single fetch or a registry lookup failed.
#[derive(Debug)]
pub enum FetchError {
    /// Connection, DNS, timeout or body read failure.
    Network(reqwest::Error),
    /// The server answered with a non-success status.
    HttpStatus(u16),
    /// Creating, writing or renaming a local file failed.
    Filesystem(io::Error),
    /// The registry listing was not in the expected shape.
    Parse(serde_json::Error),
}

impl FetchError {
    /// Short reason for a console status line.
    pub fn short_reason(&self) -> String {
        match self {
            FetchError::HttpStatus(404) => "not found".to_string(),
            FetchError::HttpStatus(code) => format!("HTTP {code}"),
            FetchError::Network(err) if err.is_timeout() => "timed out".to_string(),
            FetchError::Network(err) if err.is_connect() => "connection failed".to_string(),
            FetchError::Network(_) => "network error".to_string(),
            FetchError::Filesystem(err) => format!("write failed: {}", err.kind()),
            FetchError::Parse(_) => "unexpected response format".to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        FetchError::Network(error)
    }
}

impl From<io::Error> for FetchError {
    fn from(error: io::Error) -> Self {
        FetchError::Filesystem(error)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::Parse(error)
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(err) => write!(f, "Request error: {err}"),
            FetchError::HttpStatus(code) => write!(f, "HTTP error: {code}"),
            FetchError::Filesystem(err) => write!(f, "IO error: {err}"),
            FetchError::Parse(err) => write!(f, "Parse error: {err}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Network(err) => Some(err),
            FetchError::HttpStatus(_) => None,
            FetchError::Filesystem(err) => Some(err),
            FetchError::Parse(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_reasons() {
        assert_eq!(FetchError::HttpStatus(404).short_reason(), "not found");
        assert_eq!(FetchError::HttpStatus(503).short_reason(), "HTTP 503");
        let io = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(
            FetchError::from(io).short_reason(),
            "write failed: permission denied"
        );
    }

    #[test]
    fn display_includes_status() {
        assert_eq!(FetchError::HttpStatus(500).to_string(), "HTTP error: 500");
    }
}
