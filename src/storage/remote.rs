//! The remote restaurant collection.
//!
//! [`Remote`] is the seam the [`Store`](crate::Store) talks through;
//! [`HttpRemote`] is the blocking reqwest implementation used in production.

use std::{error::Error as StdError, time::Duration};

use reqwest::{StatusCode, blocking::Client};
use url::Url;

use crate::{
    Config,
    domain::{NewRestaurant, Restaurant},
};

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The authoritative source of restaurants.
///
/// Each call is one request with no retries.
pub trait Remote {
    /// Fetch the full restaurant collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote cannot be reached, answers with a
    /// non-success status, or sends a body that does not decode.
    fn fetch_restaurants(&self) -> Result<Vec<Restaurant>, RemoteError>;

    /// Ask the remote to create a restaurant.
    ///
    /// The created record is not returned; callers fetch the collection
    /// again to see the server-derived fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote cannot be reached or answers with a
    /// non-success status.
    fn create_restaurant(&self, new: &NewRestaurant) -> Result<(), RemoteError>;
}

impl<R: Remote + ?Sized> Remote for &R {
    fn fetch_restaurants(&self) -> Result<Vec<Restaurant>, RemoteError> {
        (**self).fetch_restaurants()
    }

    fn create_restaurant(&self, new: &NewRestaurant) -> Result<(), RemoteError> {
        (**self).create_restaurant(new)
    }
}

/// A failed call to the remote collection.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The request never got an answer: connection failure or timeout.
    #[error("{url} is unreachable: {source}")]
    Unreachable {
        /// The endpoint that was called.
        url: String,
        /// The transport failure.
        source: BoxError,
    },
    /// The remote answered with a non-success status.
    #[error("{url} rejected the request with status {status}")]
    Rejected {
        /// The endpoint that was called.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
    /// The remote answered, but the body did not decode.
    #[error("{url} sent a malformed response: {source}")]
    Malformed {
        /// The endpoint that was called.
        url: String,
        /// The decode failure.
        source: BoxError,
    },
}

impl RemoteError {
    /// Whether the failure happened before any response arrived.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// A blocking HTTP client for `<base>/restaurants`.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    collection: Url,
}

impl HttpRemote {
    /// Build a client for the remote named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL cannot have a path appended or
    /// the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, RemoteSetupError> {
        Self::with_timeout(config.remote_url(), config.timeout(), &config.user_agent)
    }

    /// Build a client for `base` with an explicit timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` cannot have a path appended or the HTTP
    /// client cannot be built.
    pub fn with_timeout(
        base: &Url,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, RemoteSetupError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(RemoteSetupError::Client)?;

        Self::with_client(client, base)
    }

    /// Use a preconfigured client against `base`.
    ///
    /// Timeouts, proxies and headers are whatever `client` was built with.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` cannot have a path appended.
    pub fn with_client(client: Client, base: &Url) -> Result<Self, RemoteSetupError> {
        let collection = collection_url(base)?;
        Ok(Self { client, collection })
    }

    /// The collection endpoint, `<base>/restaurants`.
    #[must_use]
    pub const fn collection_url(&self) -> &Url {
        &self.collection
    }

    fn unreachable(&self, e: reqwest::Error) -> RemoteError {
        tracing::warn!(url = %self.collection, error = %e, "Remote request failed");
        RemoteError::Unreachable {
            url: self.collection.to_string(),
            source: Box::new(e),
        }
    }

    fn check_status(&self, status: StatusCode) -> Result<(), RemoteError> {
        if status.is_success() {
            return Ok(());
        }
        tracing::warn!(url = %self.collection, %status, "Remote rejected request");
        Err(RemoteError::Rejected {
            url: self.collection.to_string(),
            status: status.as_u16(),
        })
    }
}

impl Remote for HttpRemote {
    fn fetch_restaurants(&self) -> Result<Vec<Restaurant>, RemoteError> {
        tracing::debug!(url = %self.collection, "HTTP GET start");
        let response = self
            .client
            .get(self.collection.clone())
            .send()
            .map_err(|e| self.unreachable(e))?;
        self.check_status(response.status())?;

        let body = response.bytes().map_err(|e| self.unreachable(e))?;
        let restaurants: Vec<Restaurant> =
            serde_json::from_slice(&body).map_err(|e| RemoteError::Malformed {
                url: self.collection.to_string(),
                source: Box::new(e),
            })?;

        tracing::debug!(count = restaurants.len(), "HTTP GET done");
        Ok(restaurants)
    }

    fn create_restaurant(&self, new: &NewRestaurant) -> Result<(), RemoteError> {
        tracing::debug!(url = %self.collection, maps_url = %new.maps_url(), "HTTP POST start");
        let response = self
            .client
            .post(self.collection.clone())
            .json(new)
            .send()
            .map_err(|e| self.unreachable(e))?;
        self.check_status(response.status())?;

        tracing::debug!(status = %response.status(), "HTTP POST done");
        Ok(())
    }
}

/// A remote client that could not be constructed.
#[derive(Debug, thiserror::Error)]
pub enum RemoteSetupError {
    /// The base URL cannot have path segments (e.g. `mailto:`).
    #[error("'{0}' cannot be used as an API base URL")]
    BaseUrl(Url),
    /// The HTTP client failed to initialise.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

fn collection_url(base: &Url) -> Result<Url, RemoteSetupError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| RemoteSetupError::BaseUrl(base.clone()))?
        .pop_if_empty()
        .push("restaurants");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::{
        io::{BufRead, BufReader, Read, Write},
        net::TcpListener,
        thread::{self, JoinHandle},
        time::Instant,
    };

    use super::*;
    use crate::domain::{RestaurantId, Tier};

    /// Serve exactly one HTTP exchange and hand back the raw request.
    fn serve_once(status_line: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = Url::parse(&format!("http://{}/api", listener.local_addr().unwrap())).unwrap();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();

            head + &String::from_utf8(request_body).unwrap()
        });

        (base, handle)
    }

    fn remote(base: &Url) -> HttpRemote {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpRemote::with_client(client, base).unwrap()
    }

    #[test]
    fn collection_url_appends_segment() {
        let cases = [
            ("http://host:1988/api", "http://host:1988/api/restaurants"),
            ("http://host:1988/api/", "http://host:1988/api/restaurants"),
            ("http://host:1988", "http://host:1988/restaurants"),
        ];
        for (base, expected) in cases {
            let url = collection_url(&Url::parse(base).unwrap()).unwrap();
            assert_eq!(url.as_str(), expected);
        }
    }

    #[test]
    fn collection_url_rejects_cannot_be_a_base() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        assert!(matches!(
            collection_url(&base),
            Err(RemoteSetupError::BaseUrl(_))
        ));
    }

    #[test]
    fn fetch_decodes_collection() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"[{"id": 3, "mapsUrl": "https://maps.example/3", "rating": 3, "name": "Ramen",
                "address": "3 Side St", "phone": "123", "createdAt": "2024-12-17T00:00:00Z",
                "openingHours": []}]"#,
        );

        let restaurants = remote(&base).fetch_restaurants().unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("GET /api/restaurants HTTP/1.1"));
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].id, RestaurantId::new(3));
        assert_eq!(restaurants[0].rating, Tier::Three);
    }

    #[test]
    fn fetch_non_success_status_is_rejected() {
        let (base, server) = serve_once("HTTP/1.1 503 Service Unavailable", "{}");

        let error = remote(&base).fetch_restaurants().unwrap_err();
        server.join().unwrap();

        assert!(matches!(error, RemoteError::Rejected { status: 503, .. }));
    }

    #[test]
    fn fetch_undecodable_body_is_malformed() {
        let (base, server) = serve_once("HTTP/1.1 200 OK", r#"{"not": "a list"}"#);

        let error = remote(&base).fetch_restaurants().unwrap_err();
        server.join().unwrap();

        assert!(matches!(error, RemoteError::Malformed { .. }));
    }

    #[test]
    fn create_posts_json_body() {
        let (base, server) = serve_once("HTTP/1.1 201 Created", "{}");
        let new = NewRestaurant::new("https://maps.example/new", Tier::Two).unwrap();

        remote(&base).create_restaurant(&new).unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("POST /api/restaurants HTTP/1.1"));
        assert!(
            request
                .to_ascii_lowercase()
                .contains("content-type: application/json")
        );
        assert!(request.ends_with(r#"{"mapsUrl":"https://maps.example/new","rating":2}"#));
    }

    #[test]
    fn create_non_success_status_is_rejected() {
        let (base, server) = serve_once("HTTP/1.1 400 Bad Request", "{}");
        let new = NewRestaurant::new("https://maps.example/new", Tier::One).unwrap();

        let error = remote(&base).create_restaurant(&new).unwrap_err();
        server.join().unwrap();

        assert!(matches!(error, RemoteError::Rejected { status: 400, .. }));
    }

    #[test]
    fn fetch_accepts_timestamps_without_offset() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"[{"id": 1, "mapsUrl": "https://maps.example/1", "rating": 1, "name": "Dumplings",
                "address": "1 Main St", "phone": "123", "createdAt": "2024-12-17T08:30:00",
                "openingHours": []}]"#,
        );

        let restaurants = remote(&base).fetch_restaurants().unwrap();
        server.join().unwrap();

        assert_eq!(restaurants.len(), 1);
        assert_eq!(
            restaurants[0].created_at.to_rfc3339(),
            "2024-12-17T08:30:00+00:00"
        );
    }

    #[test]
    fn timed_out_request_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = Url::parse(&format!("http://{}/api", listener.local_addr().unwrap())).unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(3));
            drop(stream);
        });
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        let remote = HttpRemote::with_client(client, &base).unwrap();

        let started = Instant::now();
        let error = remote.fetch_restaurants().unwrap_err();

        assert!(error.is_unreachable(), "{error}");
        assert!(started.elapsed() < Duration::from_secs(3));
        server.join().unwrap();
    }

    #[test]
    fn closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = Url::parse(&format!("http://{}/api", listener.local_addr().unwrap())).unwrap();
        drop(listener);

        let error = remote(&base).fetch_restaurants().unwrap_err();

        assert!(error.is_unreachable());
    }
}
