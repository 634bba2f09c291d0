use log::debug;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct SurfaceviewHttpClient {
    agent: ureq::Agent,
}

#[derive(Debug)]
pub enum HttpJsonPostError {
    /// The server answered with something other than 200.
    Status {
        url: String,
        status: u16,
        body: String,
    },
    Ureq(Box<ureq::Error>),
    IO(Box<std::io::Error>),
}

impl std::fmt::Display for HttpJsonPostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpJsonPostError::Status { url, status, body } => write!(
                f,
                "Problem posting data to: {}: status {}: {}",
                url, status, body
            ),
            HttpJsonPostError::Ureq(e) => write!(f, "{}", e),
            HttpJsonPostError::IO(e) => write!(f, "failed to read response: {}", e),
        }
    }
}

impl std::error::Error for HttpJsonPostError {}

impl SurfaceviewHttpClient {
    pub fn new() -> Self {
        Self::with_agent(ureq::AgentBuilder::new().build())
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    /// POSTs `obj` as JSON and returns the decoded JSON body of a 200 response.
    pub fn http_json_post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        obj: &T,
    ) -> Result<serde_json::Value, HttpJsonPostError> {
        debug!("POST {}", url);
        let res = match self.agent.post(url).send_json(obj) {
            Ok(res) => res,
            Err(ureq::Error::Status(status, res)) => {
                return Err(status_error(url, status, res));
            }
            Err(e) => return Err(HttpJsonPostError::Ureq(Box::new(e))),
        };

        let status = res.status();
        if status != 200 {
            return Err(status_error(url, status, res));
        }

        let value: serde_json::Value = res
            .into_json()
            .map_err(|e| HttpJsonPostError::IO(Box::new(e)))?;
        Ok(value)
    }
}

impl Default for SurfaceviewHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn status_error(url: &str, status: u16, res: ureq::Response) -> HttpJsonPostError {
    let body = res.into_string().unwrap_or_else(|e| {
        debug!("failed to read error body from {}: {}", url, e);
        String::new()
    });
    HttpJsonPostError::Status {
        url: url.to_string(),
        status,
        body,
    }
}

/// Single-shot POST with a fresh agent.
pub fn http_json_post<T: Serialize + ?Sized>(
    url: &str,
    obj: &T,
) -> Result<serde_json::Value, HttpJsonPostError> {
    SurfaceviewHttpClient::new().http_json_post(url, obj)
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    use super::*;

    // Answers one request with `response`, then closes the connection.
    fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/run", listener.local_addr().unwrap());
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();
            let mut stream = reader.into_inner();
            stream.write_all(response).unwrap();
        });
        url
    }

    #[test]
    fn test_status_error_with_truncated_body() {
        let url = serve_once(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial",
        );
        let res = http_json_post(&url, &serde_json::json!({"a": 1}));
        match res {
            Err(HttpJsonPostError::Status { status, body, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_url_is_transport_error() {
        let res = http_json_post("not a url", &serde_json::json!({"a": 1}));
        assert!(matches!(res, Err(HttpJsonPostError::Ureq(_))));
    }

    #[test]
    fn test_status_error_message_contains_url() {
        let e = HttpJsonPostError::Status {
            url: "http://localhost:8080/api/run".to_string(),
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Problem posting data to: http://localhost:8080/api/run: status 500: boom"
        );
    }
}
