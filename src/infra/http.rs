use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::infra::interrupt::Interrupt;
use crate::infra::retry::{RetryDecision, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Html(String),
    /// The server answered with the pagination boundary status.
    Boundary,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("interrupted by user")]
    Interrupted,
    #[error("giving up on {url} after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

/// Where listing pages come from.
pub trait PageSource {
    /// Fetches `url`. With `allow_boundary` set, the boundary status is
    /// returned as [`Page::Boundary`] instead of being retried.
    fn fetch(&mut self, url: &Url, allow_boundary: bool) -> Result<Page, FetchError>;
}

/// Blocking HTTP page source with a polite delay after every successful request.
pub struct HttpPageSource {
    client: Client,
    retry: RetryPolicy,
    request_delay: Duration,
    boundary_status: StatusCode,
    interrupt: Interrupt,
}

impl HttpPageSource {
    pub fn new(config: &Config, interrupt: Interrupt) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        let boundary_status = StatusCode::from_u16(config.boundary_status)
            .with_context(|| format!("Invalid boundary_status {}", config.boundary_status))?;

        Ok(Self {
            client,
            retry: RetryPolicy::new(
                config.max_attempts,
                config.request_delay(),
                config.backoff_factor,
            ),
            request_delay: config.request_delay(),
            boundary_status,
            interrupt,
        })
    }

    /// One request. `Err` carries a description of a transient failure.
    fn attempt(&self, url: &Url, allow_boundary: bool) -> Result<Page, String> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|e| format!("network error ({e})"))?;

        let status = response.status();
        if allow_boundary && status == self.boundary_status {
            return Ok(Page::Boundary);
        }
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        response
            .text()
            .map(Page::Html)
            .map_err(|e| format!("failed to read body ({e})"))
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&mut self, url: &Url, allow_boundary: bool) -> Result<Page, FetchError> {
        let mut attempt = 1u32;
        loop {
            if self.interrupt.is_triggered() {
                return Err(FetchError::Interrupted);
            }

            tracing::info!("GET {url}");
            match self.attempt(url, allow_boundary) {
                Ok(Page::Boundary) => {
                    tracing::debug!("{url} returned {}, no more pages", self.boundary_status);
                    return Ok(Page::Boundary);
                }
                Ok(page) => {
                    // An interrupt here is picked up by the next fetch; this page is still good.
                    self.interrupt.sleep(self.request_delay);
                    return Ok(page);
                }
                Err(reason) => match self.retry.decide(attempt) {
                    RetryDecision::NoRetry => {
                        return Err(FetchError::RetriesExhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            last_error: reason,
                        });
                    }
                    RetryDecision::RetryAfter(delay) => {
                        tracing::warn!(
                            "{reason} on {url}, retrying in {:.1}s (attempt {attempt})",
                            delay.as_secs_f64()
                        );
                        if !self.interrupt.sleep(delay) {
                            return Err(FetchError::Interrupted);
                        }
                        attempt = attempt.saturating_add(1);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use std::time::Instant;

    /// Serves one canned response per connection, then stops.
    fn serve(responses: Vec<(u16, &'static str)>) -> (Url, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = stream.read(&mut buf).unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                let response = format!(
                    "HTTP/1.1 {status} Status\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
        });
        let url = Url::parse(&format!("http://{addr}/series")).unwrap();
        (url, handle)
    }

    fn test_source(max_attempts: u32) -> HttpPageSource {
        delayed_source(max_attempts, 0)
    }

    fn delayed_source(max_attempts: u32, request_delay_ms: u64) -> HttpPageSource {
        let config = Config {
            request_delay_ms,
            backoff_factor: 0,
            timeout_secs: 5,
            max_attempts,
            ..Config::default()
        };
        HttpPageSource::new(&config, Interrupt::new()).unwrap()
    }

    #[test]
    fn test_success_returns_body() {
        let (url, handle) = serve(vec![(200, "<ul></ul>")]);
        let page = test_source(3).fetch(&url, false).unwrap();
        assert_eq!(page, Page::Html("<ul></ul>".to_string()));
        handle.join().unwrap();
    }

    #[test]
    fn test_success_waits_request_delay() {
        let (url, handle) = serve(vec![(200, "slow")]);
        let mut source = delayed_source(3, 300);

        let start = Instant::now();
        let page = source.fetch(&url, false).unwrap();
        assert_eq!(page, Page::Html("slow".to_string()));
        assert!(start.elapsed() >= Duration::from_millis(300));
        handle.join().unwrap();
    }

    #[test]
    fn test_boundary_skips_request_delay() {
        let (url, handle) = serve(vec![(400, "")]);
        let mut source = delayed_source(3, 5000);

        let start = Instant::now();
        assert_eq!(source.fetch(&url, true).unwrap(), Page::Boundary);
        assert!(start.elapsed() < Duration::from_millis(2500));
        handle.join().unwrap();
    }

    #[test]
    fn test_refused_connection_exhausts_retries() {
        // Bind then drop to get a port nothing listens on.
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let url = Url::parse(&format!("http://{addr}/series")).unwrap();

        match test_source(2).fetch(&url, true).unwrap_err() {
            FetchError::RetriesExhausted {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("network error"), "{last_error}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_server_error_is_retried() {
        let (url, handle) = serve(vec![(500, ""), (503, ""), (200, "third time")]);
        let page = test_source(5).fetch(&url, false).unwrap();
        assert_eq!(page, Page::Html("third time".to_string()));
        handle.join().unwrap();
    }

    #[test]
    fn test_boundary_status_short_circuits() {
        let (url, handle) = serve(vec![(400, "bad page")]);
        let page = test_source(5).fetch(&url, true).unwrap();
        assert_eq!(page, Page::Boundary);
        handle.join().unwrap();
    }

    #[test]
    fn test_boundary_status_retried_when_not_allowed() {
        let (url, handle) = serve(vec![(400, ""), (400, "")]);
        let err = test_source(2).fetch(&url, false).unwrap_err();
        match err {
            FetchError::RetriesExhausted {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("400"));
            }
            other => panic!("unexpected error: {other}"),
        }
        handle.join().unwrap();
    }

    #[test]
    fn test_interrupt_stops_before_request() {
        let config = Config {
            request_delay_ms: 0,
            ..Config::default()
        };
        let interrupt = Interrupt::new();
        interrupt.trigger();
        let mut source = HttpPageSource::new(&config, interrupt).unwrap();

        // Nothing listens here; an attempted request would fail with a network error.
        let url = Url::parse("http://127.0.0.1:9/series").unwrap();
        assert!(matches!(
            source.fetch(&url, true),
            Err(FetchError::Interrupted)
        ));
    }

    #[test]
    fn test_invalid_boundary_status_rejected() {
        let config = Config {
            boundary_status: 42,
            ..Config::default()
        };
        assert!(HttpPageSource::new(&config, Interrupt::new()).is_err());
    }
}
