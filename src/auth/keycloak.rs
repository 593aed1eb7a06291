// Keycloak-flavoured identity client.
//
// Login and registration use the authorization code flow with PKCE. The
// provider sends the browser back to a loopback listener; the code is then
// exchanged and the token set saved to a JSON file that `init` reads on the
// next start.

use crate::auth::{IdentityClient, Redirect, SessionError};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use log::{debug, info, warn};
use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// How long the loopback listener waits for the browser to come back.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    pub url: String,
    pub realm: String,
    pub client_id: String,
    pub token_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    id_token: Option<String>,
}

/// A started browser flow waiting for its callback.
struct PendingLogin {
    listener: TcpListener,
    redirect_uri: Url,
    verifier: PkceCodeVerifier,
    csrf: CsrfToken,
}

/// What the provider sent back to the loopback listener.
#[derive(Debug, PartialEq, Eq)]
enum Callback {
    Code { code: String, state: String },
    Denied(String),
}

pub struct KeycloakClient {
    config: KeycloakConfig,
    http: reqwest::Client,
    tokens: RwLock<Option<TokenSet>>,
    authenticated: RwLock<Option<bool>>,
    pending: Mutex<Option<PendingLogin>>,
}

impl KeycloakClient {
    pub fn new(config: KeycloakConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            tokens: RwLock::new(None),
            authenticated: RwLock::new(None),
            pending: Mutex::new(None),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/{name}",
            self.config.url.trim_end_matches('/'),
            self.config.realm
        )
    }

    fn current(&self) -> Option<TokenSet> {
        self.tokens.read().ok().and_then(|t| t.clone())
    }

    fn store(&self, tokens: Option<TokenSet>) {
        let authenticated = tokens.is_some();
        if let Ok(mut guard) = self.tokens.write() {
            *guard = tokens;
        }
        if let Ok(mut guard) = self.authenticated.write() {
            *guard = Some(authenticated);
        }
    }

    fn persist(&self, tokens: &TokenSet) -> Result<(), SessionError> {
        let path = &self.config.token_file;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SessionError::Storage(format!("create {}: {e}", parent.display())))?;
        }
        let payload = serde_json::to_string_pretty(tokens)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        std::fs::write(path, payload)
            .map_err(|e| SessionError::Storage(format!("write {}: {e}", path.display())))
    }

    fn read_token_file(&self) -> Result<Option<TokenSet>, SessionError> {
        let path = &self.config.token_file;
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SessionError::Handshake(format!("read {}: {e}", path.display())));
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| SessionError::Handshake(format!("invalid token file {}: {e}", path.display())))
    }

    /// POST a grant to the token endpoint.
    async fn token_grant(&self, form: &[(&str, &str)]) -> Result<TokenResponse, String> {
        let url = self.endpoint("token");
        let response = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(10))
            .form(form)
            .send()
            .await
            .map_err(|e| format!("{url}: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("token endpoint answered {}", response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| format!("invalid token response: {e}"))
    }

    async fn refresh(&self, tokens: &TokenSet) -> Result<TokenSet, SessionError> {
        let Some(refresh_token) = tokens.refresh_token.as_deref() else {
            return Err(SessionError::Refresh("no refresh token".into()));
        };

        let raw = self
            .token_grant(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("refresh_token", refresh_token),
            ])
            .await
            .map_err(SessionError::Refresh)?;

        Ok(TokenSet {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token.or_else(|| tokens.refresh_token.clone()),
            id_token: raw.id_token.or_else(|| tokens.id_token.clone()),
        })
    }

    /// Start a PKCE code flow against `endpoint` (`auth` or `registrations`).
    /// The callback listener is bound before the URL is handed out.
    async fn start_code_flow(&self, endpoint: &str, redirect_uri: &str) -> Result<Redirect, SessionError> {
        let (listener, redirect_uri) = bind_loopback(redirect_uri).await?;

        let auth_url = AuthUrl::new(self.endpoint(endpoint)).map_err(|e| SessionError::Redirect(e.to_string()))?;
        let redirect_url =
            RedirectUrl::new(redirect_uri.to_string()).map_err(|e| SessionError::Redirect(e.to_string()))?;
        let client = BasicClient::new(ClientId::new(self.config.client_id.clone()))
            .set_auth_uri(auth_url)
            .set_redirect_uri(redirect_url);

        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (url, csrf) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".into()))
            .set_pkce_challenge(challenge)
            .url();

        let pending = PendingLogin { listener, redirect_uri, verifier, csrf };
        self.pending
            .lock()
            .map_err(|_| SessionError::Redirect("login state poisoned".into()))?
            .replace(pending);
        Ok(Redirect { url: url.to_string() })
    }

    async fn exchange_code(&self, code: &str, pending: &PendingLogin) -> Result<TokenSet, SessionError> {
        let redirect_uri = pending.redirect_uri.to_string();
        let raw = self
            .token_grant(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri.as_str()),
                ("code_verifier", pending.verifier.secret().as_str()),
            ])
            .await
            .map_err(SessionError::Login)?;

        Ok(TokenSet {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token,
            id_token: raw.id_token,
        })
    }

    fn redirect_to(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Redirect, SessionError> {
        let url = Url::parse_with_params(&self.endpoint(endpoint), params)
            .map_err(|e| SessionError::Redirect(e.to_string()))?;
        Ok(Redirect { url: url.to_string() })
    }
}

#[async_trait]
impl IdentityClient for KeycloakClient {
    async fn init(&self) -> Result<bool, SessionError> {
        let Some(tokens) = self.read_token_file()? else {
            debug!("no stored session at {}", self.config.token_file.display());
            self.store(None);
            return Ok(false);
        };

        if seconds_left(&tokens.access_token) > 0 {
            self.store(Some(tokens));
            return Ok(true);
        }

        match self.refresh(&tokens).await {
            Ok(fresh) => {
                if let Err(e) = self.persist(&fresh) {
                    warn!("{e}");
                }
                self.store(Some(fresh));
                Ok(true)
            }
            Err(e) => {
                warn!("stored session expired: {e}");
                self.store(None);
                Ok(false)
            }
        }
    }

    async fn login(&self, redirect_uri: &str) -> Result<Redirect, SessionError> {
        self.start_code_flow("auth", redirect_uri).await
    }

    async fn register(&self, redirect_uri: &str) -> Result<Redirect, SessionError> {
        self.start_code_flow("registrations", redirect_uri).await
    }

    async fn complete_login(&self) -> Result<bool, SessionError> {
        let pending = self
            .pending
            .lock()
            .map_err(|_| SessionError::Login("login state poisoned".into()))?
            .take();
        let Some(pending) = pending else {
            return Ok(false);
        };

        let code = tokio::time::timeout(LOGIN_TIMEOUT, await_callback(&pending))
            .await
            .map_err(|_| SessionError::Login("timed out waiting for the browser".into()))??;

        let tokens = self.exchange_code(&code, &pending).await?;
        self.persist(&tokens)?;
        self.store(Some(tokens));
        info!("login completed");
        Ok(true)
    }

    async fn logout(&self, redirect_uri: &str) -> Result<Redirect, SessionError> {
        let id_token = self.current().and_then(|t| t.id_token);
        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("post_logout_redirect_uri", redirect_uri),
        ];
        if let Some(hint) = id_token.as_deref() {
            params.push(("id_token_hint", hint));
        }
        let redirect = self.redirect_to("logout", &params)?;

        match std::fs::remove_file(&self.config.token_file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(SessionError::Storage(e.to_string())),
        }
        self.store(None);
        Ok(redirect)
    }

    fn authenticated(&self) -> Option<bool> {
        self.authenticated.read().ok().and_then(|a| *a)
    }

    async fn update_token(&self, min_validity_secs: i64) -> Result<bool, SessionError> {
        let tokens = self.current().ok_or(SessionError::NotInitialized)?;
        if seconds_left(&tokens.access_token) >= min_validity_secs {
            return Ok(false);
        }

        let fresh = self.refresh(&tokens).await?;
        self.persist(&fresh)?;
        self.store(Some(fresh));
        Ok(true)
    }

    fn token(&self) -> Option<String> {
        self.current().map(|t| t.access_token)
    }

    fn claim(&self, name: &str) -> Option<String> {
        let tokens = self.current()?;
        tokens
            .id_token
            .as_deref()
            .and_then(decode_claims)
            .and_then(|c| c.get(name).and_then(Value::as_str).map(str::to_owned))
            .or_else(|| {
                decode_claims(&tokens.access_token)?
                    .get(name)
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            })
    }
}

/// Bind the listener the provider redirects back to. Only loopback hosts are
/// accepted; port 0 picks a free port, which is written back into the URI.
async fn bind_loopback(redirect_uri: &str) -> Result<(TcpListener, Url), SessionError> {
    let mut uri = Url::parse(redirect_uri).map_err(|e| SessionError::Redirect(format!("{redirect_uri}: {e}")))?;
    let host = uri.host_str().unwrap_or_default().trim_matches(['[', ']']).to_string();
    if !matches!(host.as_str(), "localhost" | "127.0.0.1" | "::1") {
        return Err(SessionError::Redirect(format!("redirect URI must point at this machine, got {uri}")));
    }
    let port = uri.port_or_known_default().unwrap_or(80);

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| SessionError::Redirect(format!("listen on {host}:{port}: {e}")))?;
    if port == 0 {
        let actual = listener
            .local_addr()
            .map_err(|e| SessionError::Redirect(e.to_string()))?
            .port();
        uri.set_port(Some(actual))
            .map_err(|_| SessionError::Redirect(format!("cannot set port on {uri}")))?;
    }
    debug!("waiting for login callback on {uri}");
    Ok((listener, uri))
}

/// Serve the loopback listener until the provider's callback arrives.
/// Other requests get a 404 and are ignored.
async fn await_callback(pending: &PendingLogin) -> Result<String, SessionError> {
    loop {
        let (mut stream, _) = pending
            .listener
            .accept()
            .await
            .map_err(|e| SessionError::Login(e.to_string()))?;

        let mut request_line = String::new();
        BufReader::new(&mut stream)
            .read_line(&mut request_line)
            .await
            .map_err(|e| SessionError::Login(e.to_string()))?;

        match parse_callback(&request_line, pending.redirect_uri.path()) {
            None => respond(&mut stream, "404 Not Found", "Not found.").await,
            Some(Callback::Denied(error)) => {
                respond(&mut stream, "200 OK", "Login was cancelled. You can close this tab.").await;
                return Err(SessionError::Login(format!("provider answered {error}")));
            }
            Some(Callback::Code { state, .. }) if state != *pending.csrf.secret() => {
                respond(&mut stream, "400 Bad Request", "Login state did not match.").await;
                return Err(SessionError::Login("state mismatch in callback".into()));
            }
            Some(Callback::Code { code, .. }) => {
                respond(&mut stream, "200 OK", "Login complete, return to the terminal.").await;
                return Ok(code);
            }
        }
    }
}

/// `GET <path>?code=..&state=.. HTTP/1.1`, or an `error` redirect.
fn parse_callback(request_line: &str, path: &str) -> Option<Callback> {
    let mut parts = request_line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    let target = Url::parse(&format!("http://localhost{}", parts.next()?)).ok()?;
    if target.path() != path {
        return None;
    }

    let param = |name: &str| {
        target
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };
    if let Some(error) = param("error") {
        return Some(Callback::Denied(error));
    }
    Some(Callback::Code { code: param("code")?, state: param("state")? })
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!("callback response not delivered: {e}");
    }
}

/// Payload segment of a JWT. The signature is not checked; the backend does that.
pub fn decode_claims(jwt: &str) -> Option<Map<String, Value>> {
    let payload = jwt.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Seconds until the token's `exp`. Tokens without `exp` count as expired.
fn seconds_left(jwt: &str) -> i64 {
    decode_claims(jwt)
        .and_then(|c| c.get("exp").and_then(Value::as_i64))
        .map(|exp| exp - Utc::now().timestamp())
        .unwrap_or(i64::MIN)
}
