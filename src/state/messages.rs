use crate::state::network::LoadingState;
use bet_api::{Match, MatchPage, MatchQuery, SaveMatchRequest};
use crossterm::event::KeyEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkRequest {
    InitSession,
    /// `generation` lets the view-model drop answers to superseded loads.
    LoadMatches { generation: u64, query: MatchQuery },
    /// `submission` identifies the form that sent it; answers carry it back.
    CreateMatch { submission: u64, payload: SaveMatchRequest },
    UpdateMatch { submission: u64, match_id: String, payload: SaveMatchRequest },
    DeleteMatch { match_id: String },
    Login,
    Register,
    Logout,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    SessionInitialized { authenticated: bool, username: Option<String> },
    SessionFailed { message: String },
    MatchesLoaded { generation: u64, page: MatchPage },
    MatchesFailed { generation: u64, message: String },
    MatchCreated { submission: u64, submitted: SaveMatchRequest, record: Match },
    CreateFailed { submission: u64, message: String },
    MatchUpdated { submission: u64, record: Match },
    UpdateFailed { submission: u64, message: String },
    MatchDeleted { match_id: String },
    DeleteFailed { message: String },
    /// A login/register/logout flow started; the app hands over to the browser.
    Redirecting { url: String },
    AuthFlowFailed { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
