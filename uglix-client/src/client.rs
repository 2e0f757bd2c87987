//! UGLIX connection implementation

use crate::error::UglixError;
use crate::payload::{APPLICATION_JSON, Payload};
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderValue, SET_COOKIE, USER_AGENT};
use serde::Serialize;
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

/// Address of the UGLIX system used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "http://isec.fil.cool/uglix";

/// `User-Agent` sent with every request unless overridden
pub const DEFAULT_USER_AGENT: &str = "UGLIX official client v2.1 (c) sysprog";

/// Body attached to an outgoing request
struct RequestBody<'a> {
    data: Vec<u8>,
    content_type: Option<&'a str>,
}

/// A session-keeping connection to UGLIX
///
/// Every request targets `base_url + path`. The session cookie handed out by
/// the server through `Set-Cookie` is remembered and sent back on every
/// following request, until [`Connection::close_session`] is called.
///
/// # Example
///
/// ```no_run
/// use uglix_client::{Connection, Payload};
/// use serde_json::json;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut c = Connection::new()?;
///
/// if let Payload::Text(usage) = c.get("/bin/echo")? {
///     println!("{}", usage);
/// }
///
/// let echoed = c.post("/bin/echo", &json!({"string_example": "toto"}))?;
/// println!("{}", echoed);
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    client: reqwest::blocking::Client,
    base_url: String,
    user_agent: HeaderValue,
    session: Option<Zeroizing<String>>,
}

impl Connection {
    /// Create a connection to the default UGLIX address
    ///
    /// # Errors
    ///
    /// Returns `UglixError::ClientInit` if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, UglixError> {
        Self::builder().build()
    }

    /// Create a connection to a custom base URL
    ///
    /// ```no_run
    /// use uglix_client::Connection;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let c = Connection::with_base_url("http://localhost:5000/uglix")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_base_url(url: impl reqwest::IntoUrl) -> Result<Self, UglixError> {
        Self::builder().base_url(url)?.build()
    }

    /// Create a builder for configuring the connection
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Base URL every path is appended to (no trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Currently stored session cookie, if any
    pub fn session(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.as_str())
    }

    /// Send a GET request
    ///
    /// # Errors
    ///
    /// * `UglixError::Request` - Network error
    /// * `UglixError::Server` - Non-2xx status, with the decoded body
    /// * `UglixError::Json` / `UglixError::Encoding` - Body does not match its content type
    pub fn get(&mut self, path: &str) -> Result<Payload, UglixError> {
        self.query(Method::GET, path, None)
    }

    /// Send a POST request whose body is the JSON encoding of `fields`
    ///
    /// `fields` is typically a map or a struct. When it serializes to an
    /// empty object (or `null`) the request carries no body at all.
    ///
    /// ```no_run
    /// use uglix_client::Connection;
    /// use serde_json::json;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut c = Connection::new()?;
    /// let reply = c.post(
    ///     "/bin/echo",
    ///     &json!({"string_example": "toto", "list_example": [true, 42, {"foo": "bar"}]}),
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn post<T: Serialize + ?Sized>(
        &mut self,
        path: &str,
        fields: &T,
    ) -> Result<Payload, UglixError> {
        let value = serde_json::to_value(fields)?;
        let body = match &value {
            serde_json::Value::Null => None,
            serde_json::Value::Object(map) if map.is_empty() => None,
            _ => Some(RequestBody {
                data: serde_json::to_vec(&value)?,
                content_type: Some(APPLICATION_JSON),
            }),
        };
        self.query(Method::POST, path, body)
    }

    /// Send a PUT request with `content` as the body
    ///
    /// Strings are sent as their UTF-8 encoding.
    pub fn put(&mut self, path: &str, content: impl Into<Vec<u8>>) -> Result<Payload, UglixError> {
        let body = RequestBody {
            data: content.into(),
            content_type: None,
        };
        self.query(Method::PUT, path, Some(body))
    }

    /// Send a POST request with a raw body and explicit content type
    ///
    /// Meant for data that is not JSON, such as encrypted binary blobs.
    /// [`OCTET_STREAM`](crate::OCTET_STREAM) is the usual content type.
    pub fn post_raw(
        &mut self,
        path: &str,
        data: impl Into<Vec<u8>>,
        content_type: &str,
    ) -> Result<Payload, UglixError> {
        let body = RequestBody {
            data: data.into(),
            content_type: Some(content_type),
        };
        self.query(Method::POST, path, Some(body))
    }

    /// Read a user's mailbox
    ///
    /// Without a message number this lists `/home/<user>/INBOX`; with one it
    /// fetches `/home/<user>/INBOX/<number><suffix>` (the suffix selects an
    /// action on the message, e.g. `/reply`).
    pub fn mail(
        &mut self,
        user: &str,
        message: Option<u32>,
        suffix: &str,
    ) -> Result<Payload, UglixError> {
        let mut path = format!("/home/{}/INBOX", user);
        if let Some(number) = message {
            path.push_str(&format!("/{}{}", number, suffix));
        }
        self.get(&path)
    }

    /// Forget the current session cookie
    pub fn close_session(&mut self) {
        self.session = None;
    }

    fn cookie_header(session: &str) -> Result<HeaderValue, UglixError> {
        let mut value = HeaderValue::from_str(session)
            .map_err(|_| UglixError::InvalidHeader("session cookie".to_string()))?;
        value.set_sensitive(true);
        Ok(value)
    }

    fn query(
        &mut self,
        method: Method,
        path: &str,
        body: Option<RequestBody<'_>>,
    ) -> Result<Payload, UglixError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "sending request");

        let mut request = self
            .client
            .request(method, url.as_str())
            .header(USER_AGENT, self.user_agent.clone());
        if let Some(session) = &self.session {
            request = request.header(COOKIE, Self::cookie_header(session)?);
        }
        if let Some(body) = body {
            if let Some(content_type) = body.content_type {
                request = request.header(CONTENT_TYPE, content_type);
            }
            request = request.body(body.data);
        }

        let response = request.send()?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if !status.is_success() {
            let body = response.bytes()?.to_vec();
            // An undecodable error page is still a server error
            let message = Payload::decode(content_type.as_deref(), body.clone())
                .unwrap_or_else(|_| Payload::Bytes(body));
            debug!(code = status.as_u16(), "server returned an error");
            return Err(UglixError::Server {
                code: status.as_u16(),
                message,
            });
        }

        // Last Set-Cookie wins
        if let Some(cookie) = response.headers().get_all(SET_COOKIE).iter().last() {
            let cookie = cookie
                .to_str()
                .map_err(|_| UglixError::InvalidHeader("Set-Cookie".to_string()))?;
            debug!("session cookie updated");
            self.session = Some(Zeroizing::new(cookie.to_owned()));
        }

        let body = response.bytes()?.to_vec();
        Payload::decode(content_type.as_deref(), body)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("session", &self.session.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Builder for configuring a [`Connection`]
///
/// # Example
///
/// ```no_run
/// use uglix_client::Connection;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let c = Connection::builder()
///     .base_url("http://localhost:1234/uglix")?
///     .client_builder(
///         reqwest::blocking::Client::builder()
///             .timeout(Duration::from_secs(10))
///     )
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionBuilder {
    base_url: Option<reqwest::Url>,
    user_agent: Option<String>,
    session: Option<Zeroizing<String>>,
    client_builder: Option<reqwest::blocking::ClientBuilder>,
}

impl ConnectionBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            base_url: None,
            user_agent: None,
            session: None,
            client_builder: None,
        }
    }

    /// Set the base URL paths are appended to
    ///
    /// The URL is parsed and validated at builder time.
    pub fn base_url(mut self, url: impl reqwest::IntoUrl) -> Result<Self, UglixError> {
        self.base_url = Some(url.into_url()?);
        Ok(self)
    }

    /// Override the `User-Agent` header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Start with an existing session cookie
    pub fn session(mut self, cookie: impl Into<String>) -> Self {
        self.session = Some(Zeroizing::new(cookie.into()));
        self
    }

    /// Set a custom HTTP client builder (timeouts, proxies, ...)
    pub fn client_builder(mut self, builder: reqwest::blocking::ClientBuilder) -> Self {
        self.client_builder = Some(builder);
        self
    }

    /// Build the connection
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized or the
    /// user agent is not a valid header value.
    pub fn build(self) -> Result<Connection, UglixError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => reqwest::Url::parse(DEFAULT_BASE_URL)
                .map_err(|e| UglixError::ClientInit(e.to_string()))?,
        };
        let base_url = base_url.as_str().trim_end_matches('/').to_string();

        let user_agent = self
            .user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT);
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|_| UglixError::InvalidHeader("User-Agent".to_string()))?;

        let client = self
            .client_builder
            .unwrap_or_else(|| reqwest::blocking::Client::builder().use_rustls_tls())
            .build()
            .map_err(|e| UglixError::ClientInit(e.to_string()))?;

        Ok(Connection {
            client,
            base_url,
            user_agent,
            session: self.session,
        })
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
