use crate::auth::session::SessionAdapter;
use crate::state::messages::{NetworkRequest, NetworkResponse};
use bet_api::client::BetApi;
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

pub const TOKEN_UNAVAILABLE: &str = "Could not get authentication token.";

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Everything a single request task needs. Cloned into each task.
#[derive(Clone)]
pub struct WorkerContext {
    api: Arc<BetApi>,
    session: Arc<SessionAdapter>,
    responses: mpsc::Sender<NetworkResponse>,
    in_flight: Arc<AtomicUsize>,
    /// Bumped each time a spinner starts; older tickers see the change and stop.
    spinner_epoch: Arc<AtomicU64>,
}

pub struct NetworkWorker {
    context: WorkerContext,
    requests: mpsc::Receiver<NetworkRequest>,
}

impl NetworkWorker {
    pub fn new(
        api: Arc<BetApi>,
        session: Arc<SessionAdapter>,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            context: WorkerContext {
                api,
                session,
                responses,
                in_flight: Arc::new(AtomicUsize::new(0)),
                spinner_epoch: Arc::new(AtomicU64::new(0)),
            },
            requests,
        }
    }

    /// Requests run concurrently; ordering between their answers is the
    /// view-model's concern.
    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let context = self.context.clone();
            tokio::spawn(async move {
                context.start_loading_animation().await;
                let response = context.execute(request).await;
                debug!("network request complete");
                context.stop_loading_animation(!response.is_failure()).await;

                if let Err(e) = context.responses.send(response).await {
                    error!("Failed to send network response: {e}");
                }
            });
        }
    }
}

impl WorkerContext {
    pub async fn execute(&self, request: NetworkRequest) -> NetworkResponse {
        match request {
            NetworkRequest::InitSession => self.handle_init_session().await,
            NetworkRequest::LoadMatches { generation, query } => {
                debug!("loading matches page {} ({generation})", query.page);
                match self.api.list_matches(&query).await {
                    Ok(page) => NetworkResponse::MatchesLoaded { generation, page },
                    Err(e) => {
                        error!("{e}");
                        NetworkResponse::MatchesFailed { generation, message: e.user_message() }
                    }
                }
            }
            NetworkRequest::CreateMatch { submission, payload } => {
                let token = match self.session.token().await {
                    Ok(token) => token,
                    Err(_) => {
                        let message = TOKEN_UNAVAILABLE.into();
                        return NetworkResponse::CreateFailed { submission, message };
                    }
                };
                match self.api.create_match(&payload, &token).await {
                    Ok(record) => NetworkResponse::MatchCreated { submission, submitted: payload, record },
                    Err(e) => {
                        error!("{e}");
                        NetworkResponse::CreateFailed { submission, message: e.user_message() }
                    }
                }
            }
            NetworkRequest::UpdateMatch { submission, match_id, payload } => {
                let token = match self.session.token().await {
                    Ok(token) => token,
                    Err(_) => {
                        let message = TOKEN_UNAVAILABLE.into();
                        return NetworkResponse::UpdateFailed { submission, message };
                    }
                };
                match self.api.update_match(&match_id, &payload, &token).await {
                    Ok(record) => NetworkResponse::MatchUpdated { submission, record },
                    Err(e) => {
                        error!("{e}");
                        NetworkResponse::UpdateFailed { submission, message: e.user_message() }
                    }
                }
            }
            NetworkRequest::DeleteMatch { match_id } => {
                let token = match self.session.token().await {
                    Ok(token) => token,
                    Err(_) => return NetworkResponse::DeleteFailed { message: TOKEN_UNAVAILABLE.into() },
                };
                match self.api.delete_match(&match_id, &token).await {
                    Ok(()) => NetworkResponse::MatchDeleted { match_id },
                    Err(e) => {
                        error!("{e}");
                        NetworkResponse::DeleteFailed { message: e.user_message() }
                    }
                }
            }
            NetworkRequest::Login => redirect_response(self.session.login().await),
            NetworkRequest::Register => redirect_response(self.session.register().await),
            NetworkRequest::Logout => redirect_response(self.session.logout().await),
        }
    }

    async fn handle_init_session(&self) -> NetworkResponse {
        match self.session.initialize().await {
            Ok(authenticated) => NetworkResponse::SessionInitialized {
                authenticated,
                username: self.session.username(),
            },
            Err(e) => NetworkResponse::SessionFailed { message: e.to_string() },
        }
    }

    /// Only the first of several overlapping requests starts the spinner.
    async fn start_loading_animation(&self) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            return;
        }
        let epoch = self.spinner_epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let mut loading_state = LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let ticker = self.clone();
        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !ticker.spinner_running(epoch) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = ticker
                    .responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    fn spinner_running(&self, epoch: u64) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0 && self.spinner_epoch.load(Ordering::SeqCst) == epoch
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) > 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(15)).await;
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return;
        }

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}

fn redirect_response(result: Result<crate::auth::Redirect, crate::auth::SessionError>) -> NetworkResponse {
    match result {
        Ok(redirect) => NetworkResponse::Redirecting { url: redirect.url },
        Err(e) => NetworkResponse::AuthFlowFailed { message: e.to_string() },
    }
}

impl NetworkResponse {
    fn is_failure(&self) -> bool {
        matches!(
            self,
            NetworkResponse::SessionFailed { .. }
                | NetworkResponse::MatchesFailed { .. }
                | NetworkResponse::CreateFailed { .. }
                | NetworkResponse::UpdateFailed { .. }
                | NetworkResponse::DeleteFailed { .. }
                | NetworkResponse::AuthFlowFailed { .. }
        )
    }
}
