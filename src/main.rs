mod app;
mod auth;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::auth::keycloak::KeycloakClient;
use crate::auth::session::SessionAdapter;
use crate::state::app_settings::AppSettings;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use bet_api::client::BetApi;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::{error, info};
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();

    let settings = AppSettings::load();

    setup_panic_hook();
    tui_logger::init_logger(log::LevelFilter::Error)?;
    tui_logger::set_default_level(log::LevelFilter::Error);

    let identity = Arc::new(KeycloakClient::new(settings.keycloak()));
    let session = Arc::new(SessionAdapter::new(identity, settings.redirect_uri.clone()));
    let api = Arc::new(BetApi::new(settings.api_url.clone()));
    info!("match service at {}", api.base_url());

    loop {
        let redirect = run_ui(settings.clone(), api.clone(), session.clone()).await?;
        cleanup_terminal();

        let Some(url) = redirect else {
            return Ok(());
        };
        println!("Continue in your browser:\n  {url}");

        // Login and registration come back to the loopback listener; logout doesn't.
        match session.complete_login().await {
            Ok(true) => println!("Logged in, reopening betdesk..."),
            Ok(false) => return Ok(()),
            Err(e) => {
                eprintln!("{e}");
                return Ok(());
            }
        }
    }
}

/// One UI session: runs until a redirect flow starts or the channels close.
async fn run_ui(
    settings: AppSettings,
    api: Arc<BetApi>,
    session: Arc<SessionAdapter>,
) -> anyhow::Result<Option<String>> {
    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;
    setup_terminal();

    let app = Arc::new(Mutex::new(App::new(settings)));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(api, session, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    let redirect = main_ui_loop(terminal, app, ui_event_rx, network_req_tx, network_resp_rx).await;

    input_handler.abort();
    network_task.abort();
    Ok(redirect)
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("betdesk {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "betdesk - terminal client for the match betting service

Usage:
  betdesk
  betdesk --help
  betdesk --version

Environment:
  BETDESK_API_URL       Match service base URL (default http://localhost:8888)
  BETDESK_PAGE_SIZE     Matches per page (default 5)
  BETDESK_IDP_URL       Identity provider URL (default http://localhost:8188)
  BETDESK_IDP_REALM     Identity provider realm (default my-quarkus-app)
  BETDESK_IDP_CLIENT    Identity provider client id (default frontend)
  BETDESK_REDIRECT_URI  Where login/logout flows return to
  BETDESK_TOKEN_FILE    Saved token set (default ~/.config/betdesk/tokens.json)
  BETDESK_LOG           Log level: error, warn, info, debug, trace"
}

/// Runs until a redirect flow starts; returns its target.
async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) -> Option<String> {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &network_requests, &mut loading).await;
                let mut app_guard = app.lock().await;
                if let Some(url) = app_guard.state.redirect.take() {
                    return Some(url);
                }
                if should_redraw {
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            else => return None,
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let request = app.lock().await.on_app_started();
            let _ = network_requests.send(request).await;
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests).await;
            true
        }
        UiEvent::Resize => true,
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    loading: &mut LoadingState,
) -> bool {
    if let NetworkResponse::LoadingStateChanged { loading_state } = response {
        *loading = loading_state;
        return true;
    }

    let mut guard = app.lock().await;
    let follow_up = match response {
        NetworkResponse::LoadingStateChanged { .. } => None,
        NetworkResponse::SessionInitialized { authenticated, username } => {
            Some(guard.on_session_initialized(authenticated, username))
        }
        NetworkResponse::SessionFailed { message } => {
            error!("Session error: {message}");
            Some(guard.on_session_failed(message))
        }
        NetworkResponse::MatchesLoaded { generation, page } => guard.on_matches_loaded(generation, page),
        NetworkResponse::MatchesFailed { generation, message } => {
            error!("Network error: {message}");
            guard.on_matches_failed(generation, message);
            None
        }
        NetworkResponse::MatchCreated { submission, submitted, record } => {
            Some(guard.on_match_created(submission, submitted, record))
        }
        NetworkResponse::CreateFailed { submission, message } => {
            guard.on_create_failed(submission, message);
            None
        }
        NetworkResponse::MatchUpdated { submission, record } => Some(guard.on_match_updated(submission, record)),
        NetworkResponse::UpdateFailed { submission, message } => {
            guard.on_update_failed(submission, message);
            None
        }
        NetworkResponse::MatchDeleted { match_id } => Some(guard.on_match_deleted(match_id)),
        NetworkResponse::DeleteFailed { message } => {
            guard.on_delete_failed(message);
            None
        }
        NetworkResponse::Redirecting { url } => {
            guard.on_redirect(url);
            None
        }
        NetworkResponse::AuthFlowFailed { message } => {
            error!("Auth flow error: {message}");
            guard.on_auth_flow_failed(message);
            None
        }
    };
    drop(guard);

    if let Some(request) = follow_up {
        let _ = network_requests.send(request).await;
    }
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::Hide);
    let _ = execute!(stdout, terminal::EnterAlternateScreen);
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = terminal::enable_raw_mode();
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
