use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, trace};
use reqwest::{Client, StatusCode};

use crate::domains::catalog::{ObjectDescriptor, ObjectSummary};
use crate::errors::{SessionError, SessionResult};
use crate::session::envelope::{self, QueryPage, XmlNode};
use crate::session::pager::{self, PageSource};
use crate::session::{RecordStream, Session};

/// Partner API version used when the configuration does not name one
pub const DEFAULT_API_VERSION: &str = "59.0";

/// Session on the partner SOAP API
pub struct SoapSession {
    client: Client,
    server_url: String,
    session_id: String,
}

impl std::fmt::Debug for SoapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoapSession")
            .field("server_url", &self.server_url)
            .field("session_id", &"<redacted>")
            .finish()
    }
}

fn build_client() -> SessionResult<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(600))
        .connect_timeout(Duration::from_secs(30))
        .build()?)
}

/// POST one envelope and return the operation response element.
async fn post(client: &Client, url: &str, action: &str, body: String) -> SessionResult<XmlNode> {
    let started = Instant::now();

    let response = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=UTF-8")
        .header("SOAPAction", format!("\"{}\"", action))
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    debug!("{} took {} ms ({} bytes)", action, started.elapsed().as_millis(), text.len());
    trace!("{} response: {}", action, text);

    decode_response(status, text)
}

/// Map a raw response to the operation response element.
fn decode_response(status: StatusCode, text: String) -> SessionResult<XmlNode> {
    // Faults arrive with status 500 and still carry a SOAP body
    match XmlNode::parse(&text).and_then(envelope::response_body) {
        Ok(node) if status.is_success() => Ok(node),
        Err(fault @ SessionError::Fault { .. }) => Err(fault),
        _ if !status.is_success() => Err(SessionError::Status {
            status: status.as_u16(),
            body: text,
        }),
        other => other,
    }
}

impl SoapSession {
    /// Log in with username and password (security token appended) against
    /// the login endpoint, e.g. `https://login.salesforce.com`.
    pub async fn login(
        login_url: &str,
        username: &str,
        password: &str,
        api_version: &str,
    ) -> SessionResult<Self> {
        let client = build_client()?;
        let url = format!("{}/services/Soap/u/{}", login_url.trim_end_matches('/'), api_version);
        debug!("Logging in as {} at {}", username, url);

        let body = envelope::envelope(None, &envelope::login_body(username, password));
        let response = post(&client, &url, "login", body).await?;
        let (server_url, session_id) = envelope::decode_login(&response)?;

        info!("Logged in as {}", username);
        Ok(Self {
            client,
            server_url,
            session_id,
        })
    }

    async fn call(&self, action: &str, body: &str) -> SessionResult<XmlNode> {
        let envelope = envelope::envelope(Some(&self.session_id), body);
        trace!("{} request: {}", action, body);
        post(&self.client, &self.server_url, action, envelope).await
    }

    async fn query_more(&self, locator: &str) -> SessionResult<QueryPage> {
        let response = self
            .call("queryMore", &envelope::query_more_body(locator))
            .await?;
        envelope::decode_query(&response)
    }
}

#[async_trait]
impl Session for SoapSession {
    async fn describe_global(&self) -> SessionResult<Vec<ObjectSummary>> {
        let response = self
            .call("describeGlobal", &envelope::describe_global_body())
            .await?;
        envelope::decode_global(&response)
    }

    async fn describe_sobjects(&self, names: &[String]) -> SessionResult<Vec<ObjectDescriptor>> {
        let response = self
            .call("describeSObjects", &envelope::describe_sobjects_body(names))
            .await?;
        envelope::decode_sobjects(&response)
    }

    async fn query<'a>(&'a self, soql: &str) -> SessionResult<RecordStream<'a>> {
        debug!("Executing {}", soql);
        let response = self.call("query", &envelope::query_body(soql)).await?;
        let first = envelope::decode_query(&response)?;

        Ok(pager::record_stream(self, first))
    }
}

#[async_trait]
impl PageSource for SoapSession {
    async fn next_page(&self, locator: &str) -> SessionResult<QueryPage> {
        self.query_more(locator).await
    }
}
