//! Page retrieval with an optional MediaWiki bot-password session.
//!
//! # Architecture
//!
//! - [`MarkupFetcher`]: Core trait, "give me the HTML behind this URL"
//! - [`WikiSession`]: reqwest client with a cookie jar, optionally logged in
//!   through `action=login`
//! - [`LocalPage`]: Reads a saved page from disk (offline runs, fixtures)
//! - [`RetryFetch`]: Decorator that adds backoff retries to any fetcher
//!
//! # Login Handshake
//!
//! 1. `GET api.php?action=query&meta=tokens&type=login` for a login token
//! 2. `POST api.php` with `action=login`, `lgname`, `lgpassword`, `lgtoken`
//! 3. `GET api.php?action=query&meta=userinfo` to confirm the session
//!
//! Session cookies from step 2 are carried into the page request.

use crate::config::SourceSettings;
use crate::errors::FetchError;
use rand::{Rng, rng};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Trait for anything that can produce page markup for a URL.
pub trait MarkupFetcher {
    /// Fetch the raw HTML at `url`.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl FetchError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`MarkupFetcher`].
///
/// # Backoff Strategy
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
/// ```
///
/// Only transient failures (timeouts, connection errors, 429 and 5xx) are
/// retried.
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
    max_jitter_ms: u64,
}

impl<T> RetryFetch<T>
where
    T: MarkupFetcher,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
            max_jitter_ms: 250,
        }
    }

    #[cfg(test)]
    pub fn with_max_jitter(mut self, max_jitter: StdDuration) -> Self {
        self.max_jitter_ms = max_jitter.as_millis() as u64;
        self
    }

    #[cfg(test)]
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> MarkupFetcher for RetryFetch<T>
where
    T: MarkupFetcher,
{
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !e.is_transient() || attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "fetch() giving up"
                        );
                        return Err(e);
                    }

                    // Exponent capped at 31 so the shift cannot overflow.
                    let factor = 1u32 << (attempt - 1).min(31);
                    let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
                    let jitter_ms: u64 = rng().random_range(0..=self.max_jitter_ms);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    query: TokenQuery,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    tokens: Tokens,
}

#[derive(Debug, Deserialize)]
struct Tokens {
    logintoken: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    login: LoginOutcome,
}

#[derive(Debug, Deserialize)]
struct LoginOutcome {
    result: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    lgusername: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    query: UserInfoQuery,
}

#[derive(Debug, Deserialize)]
struct UserInfoQuery {
    userinfo: UserInfo,
}

/// The account the session is acting as.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub editcount: Option<u64>,
    /// Present (as an empty string) only for anonymous sessions.
    #[serde(default)]
    pub anon: Option<serde_json::Value>,
}

impl UserInfo {
    pub fn is_anonymous(&self) -> bool {
        self.anon.is_some()
    }
}

fn parse_login_token(body: &str) -> Result<String, FetchError> {
    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Api(format!("login token response: {e}")))?;
    Ok(parsed.query.tokens.logintoken)
}

fn parse_login_outcome(body: &str) -> Result<String, FetchError> {
    let parsed: LoginResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Api(format!("login response: {e}")))?;
    let outcome = parsed.login;
    if outcome.result != "Success" {
        return Err(FetchError::LoginRejected {
            result: outcome.result,
            reason: outcome.reason.unwrap_or_default(),
        });
    }
    Ok(outcome.lgusername.unwrap_or_default())
}

fn parse_user_info(body: &str) -> Result<UserInfo, FetchError> {
    let parsed: UserInfoResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Api(format!("userinfo response: {e}")))?;
    Ok(parsed.query.userinfo)
}

/// HTTP session against a MediaWiki site.
#[derive(Debug, Clone)]
pub struct WikiSession {
    client: reqwest::Client,
    api_url: Url,
}

impl WikiSession {
    /// Build an anonymous session with a cookie jar.
    pub fn new(settings: &SourceSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(settings.user_agent.as_str())
            .timeout(StdDuration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: Url::parse(&settings.api_url)?,
        })
    }

    /// Build a session and log in when both credentials are configured.
    #[instrument(level = "info", skip_all, fields(api_url = %settings.api_url))]
    pub async fn connect(settings: &SourceSettings) -> Result<Self, FetchError> {
        let session = Self::new(settings)?;
        match (&settings.username, &settings.password) {
            (Some(username), Some(password)) => {
                session.bot_login(username, password).await?;
                let user = session.user_info().await?;
                info!(
                    user = %user.name,
                    groups = ?user.groups,
                    editcount = ?user.editcount,
                    "Session verified"
                );
            }
            _ => info!("No bot credentials configured; fetching anonymously"),
        }
        Ok(session)
    }

    async fn get_api(&self, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(self.api_url.clone())
            .query(params)
            .send()
            .await?;
        read_body(resp).await
    }

    pub async fn login_token(&self) -> Result<String, FetchError> {
        let body = self
            .get_api(&[
                ("action", "query"),
                ("meta", "tokens"),
                ("type", "login"),
                ("format", "json"),
            ])
            .await?;
        parse_login_token(&body)
    }

    /// Log in with a bot password (`action=login`).
    #[instrument(level = "info", skip(self, password))]
    pub async fn bot_login(&self, username: &str, password: &str) -> Result<(), FetchError> {
        let token = self.login_token().await?;
        let form = [
            ("action", "login"),
            ("format", "json"),
            ("lgname", username),
            ("lgpassword", password),
            ("lgtoken", token.as_str()),
        ];
        let resp = self
            .client
            .post(self.api_url.clone())
            .form(&form)
            .send()
            .await?;
        let body = read_body(resp).await?;
        match parse_login_outcome(&body) {
            Ok(name) => {
                info!(%name, "Bot login succeeded");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Bot login failed");
                Err(e)
            }
        }
    }

    pub async fn user_info(&self) -> Result<UserInfo, FetchError> {
        let body = self
            .get_api(&[
                ("action", "query"),
                ("meta", "userinfo"),
                ("uiprop", "groups|rights|editcount"),
                ("format", "json"),
            ])
            .await?;
        let user = parse_user_info(&body)?;
        if user.is_anonymous() {
            warn!("Session is anonymous after login");
        }
        Ok(user)
    }
}

async fn read_body(resp: reqwest::Response) -> Result<String, FetchError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: resp.url().to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp.text().await?)
}

impl MarkupFetcher for WikiSession {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let resp = self.client.get(Url::parse(url)?).send().await?;
        let body = read_body(resp).await?;
        info!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Fetched page"
        );
        Ok(body)
    }
}

/// A page saved on disk. The requested URL is ignored.
#[derive(Debug, Clone)]
pub struct LocalPage {
    pub path: PathBuf,
}

impl MarkupFetcher for LocalPage {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::LocalFile {
                path: self.path.display().to_string(),
                source,
            })?;
        info!(bytes = body.len(), "Read local page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Flaky {
        failures: usize,
        status: u16,
        calls: AtomicUsize,
    }

    impl MarkupFetcher for Flaky {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: self.status,
                })
            } else {
                Ok("<html></html>".to_string())
            }
        }
    }

    fn flaky(failures: usize, status: u16) -> RetryFetch<Flaky> {
        let inner = Flaky {
            failures,
            status,
            calls: AtomicUsize::new(0),
        };
        RetryFetch::new(inner, 3, StdDuration::from_millis(1)).with_max_jitter(StdDuration::ZERO)
    }

    #[tokio::test]
    async fn test_retry_recovers_from_server_errors() {
        let fetcher = flaky(2, 503);
        let body = fetcher.fetch("https://example.org/").await.unwrap();
        assert_eq!(body, "<html></html>");
        assert_eq!(fetcher.into_inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max() {
        let fetcher = flaky(10, 500);
        let err = fetcher.fetch("https://example.org/").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert_eq!(fetcher.into_inner().calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_long_retry_budget_does_not_overflow_backoff() {
        let inner = Flaky {
            failures: usize::MAX,
            status: 503,
            calls: AtomicUsize::new(0),
        };
        let fetcher =
            RetryFetch::new(inner, 40, StdDuration::ZERO).with_max_jitter(StdDuration::ZERO);

        let err = fetcher.fetch("https://example.org/").await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 503, .. }));
        assert_eq!(fetcher.into_inner().calls.load(Ordering::SeqCst), 41);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let fetcher = flaky(10, 404);
        assert!(fetcher.fetch("https://example.org/").await.is_err());
        assert_eq!(fetcher.into_inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_local_page_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portal.html");
        std::fs::write(&path, "<h2 id=\"3月5日\">3月5日</h2>").unwrap();

        let page = LocalPage { path };
        let body = page.fetch("ignored").await.unwrap();
        assert!(body.contains("3月5日"));
    }

    #[tokio::test]
    async fn test_local_page_missing_file() {
        let page = LocalPage {
            path: PathBuf::from("/no/such/portal.html"),
        };
        let err = page.fetch("ignored").await.unwrap_err();
        assert!(matches!(err, FetchError::LocalFile { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_parse_login_token() {
        let body = r#"{"batchcomplete":"","query":{"tokens":{"logintoken":"abc123+\\"}}}"#;
        assert_eq!(parse_login_token(body).unwrap(), "abc123+\\");
    }

    #[test]
    fn test_parse_login_token_rejects_error_payload() {
        let body = r#"{"error":{"code":"badvalue","info":"Unrecognized value"}}"#;
        assert!(matches!(parse_login_token(body), Err(FetchError::Api(_))));
    }

    #[test]
    fn test_parse_login_success() {
        let body = r#"{"login":{"result":"Success","lguserid":42,"lgusername":"Bot"}}"#;
        assert_eq!(parse_login_outcome(body).unwrap(), "Bot");
    }

    #[test]
    fn test_parse_login_failure_carries_reason() {
        let body = r#"{"login":{"result":"Failed","reason":"Incorrect username or password entered."}}"#;
        match parse_login_outcome(body) {
            Err(FetchError::LoginRejected { result, reason }) => {
                assert_eq!(result, "Failed");
                assert!(reason.contains("Incorrect"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_user_info() {
        let body = r#"{"query":{"userinfo":{"id":1,"name":"Bot","groups":["*","user"],"editcount":7}}}"#;
        let user = parse_user_info(body).unwrap();
        assert_eq!(user.name, "Bot");
        assert_eq!(user.groups, vec!["*", "user"]);
        assert!(!user.is_anonymous());

        let anon = r#"{"query":{"userinfo":{"id":0,"name":"127.0.0.1","anon":""}}}"#;
        assert!(parse_user_info(anon).unwrap().is_anonymous());
    }
}
