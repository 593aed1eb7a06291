use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, LoadOutcome, MatchEdit};
use crate::state::form::MatchForm;
use crate::state::messages::NetworkRequest;
use bet_api::{Match, MatchPage, SaveMatchRequest, SortField, Specifier, Sport};
use log::debug;

pub const LOGIN_REQUIRED_SAVE: &str = "You must be logged in to save a match.";
pub const LOGIN_REQUIRED_UPDATE: &str = "You must be logged in to update a match.";
pub const LOGIN_REQUIRED_DELETE: &str = "You must be logged in to delete a match.";
pub const MATCH_DELETED: &str = "Match deleted successfully.";

/// Match view-model. Every action returns the outbound request it wants
/// sent, if any; responses come back through the `on_*` handlers.
pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let app = Self {
            state: AppState::new(settings.page_size),
            settings,
        };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Startup and session
    // -----------------------------------------------------------------------

    pub fn on_app_started(&self) -> NetworkRequest {
        NetworkRequest::InitSession
    }

    /// The list loads whether or not a session exists.
    pub fn on_session_initialized(&mut self, authenticated: bool, username: Option<String>) -> NetworkRequest {
        self.state.session.initialized = true;
        self.state.session.logged_in = authenticated;
        self.state.session.username = if authenticated { username } else { None };
        self.load_matches()
    }

    pub fn on_session_failed(&mut self, message: String) -> NetworkRequest {
        debug!("continuing without session: {message}");
        self.state.session.initialized = false;
        self.state.session.logged_in = false;
        self.state.session.username = None;
        self.load_matches()
    }

    pub fn login(&self) -> NetworkRequest {
        NetworkRequest::Login
    }

    pub fn register(&self) -> NetworkRequest {
        NetworkRequest::Register
    }

    pub fn logout(&self) -> NetworkRequest {
        NetworkRequest::Logout
    }

    pub fn on_redirect(&mut self, url: String) {
        self.state.redirect = Some(url);
    }

    pub fn on_auth_flow_failed(&mut self, message: String) {
        self.state.error_message = Some(message);
    }

    // -----------------------------------------------------------------------
    // Paginated list
    // -----------------------------------------------------------------------

    pub fn load_matches(&mut self) -> NetworkRequest {
        let (generation, query) = self.state.list.begin_load();
        NetworkRequest::LoadMatches { generation, query }
    }

    pub fn on_matches_loaded(&mut self, generation: u64, page: MatchPage) -> Option<NetworkRequest> {
        match self.state.list.apply_page(generation, page) {
            LoadOutcome::Applied => None,
            LoadOutcome::Stale => {
                debug!("dropping stale page for generation {generation}");
                None
            }
            LoadOutcome::Clamped => Some(self.load_matches()),
        }
    }

    pub fn on_matches_failed(&mut self, generation: u64, message: String) {
        if self.state.list.apply_failure(generation, message) == LoadOutcome::Stale {
            debug!("dropping stale list error for generation {generation}");
        }
    }

    /// Out-of-range targets are ignored.
    pub fn go_to_page(&mut self, page: usize) -> Option<NetworkRequest> {
        if !self.state.list.can_go_to(page) {
            return None;
        }
        self.state.list.current_page = page;
        self.state.list.selected = 0;
        Some(self.load_matches())
    }

    pub fn next_page(&mut self) -> Option<NetworkRequest> {
        self.go_to_page(self.state.list.current_page + 1)
    }

    pub fn prev_page(&mut self) -> Option<NetworkRequest> {
        let page = self.state.list.current_page.checked_sub(1)?;
        self.go_to_page(page)
    }

    pub fn set_sorting(&mut self, field: SortField) -> NetworkRequest {
        self.state.list.toggle_sort(field);
        self.load_matches()
    }

    /// Restrict the list to the logged-in user's matches, or lift that filter.
    pub fn toggle_my_matches(&mut self) -> Option<NetworkRequest> {
        let list = &mut self.state.list;
        if list.owner_filter.is_some() {
            list.owner_filter = None;
        } else {
            list.owner_filter = Some(self.state.session.username.clone()?);
        }
        list.current_page = 0;
        Some(self.load_matches())
    }

    /// All sports, then each sport in enumeration order.
    pub fn cycle_sport_filter(&mut self) -> NetworkRequest {
        let list = &mut self.state.list;
        list.sport_filter = match list.sport_filter {
            None => Some(Sport::ALL[0]),
            Some(sport) => Sport::ALL
                .iter()
                .position(|s| *s == sport)
                .and_then(|i| Sport::ALL.get(i + 1).copied()),
        };
        list.current_page = 0;
        self.load_matches()
    }

    pub fn select_next(&mut self) {
        self.state.list.select_next();
    }

    pub fn select_prev(&mut self) {
        self.state.list.select_prev();
    }

    pub fn is_own_match(&self, record: &Match) -> bool {
        self.state.session.username.as_deref() == Some(record.match_owner.as_str())
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    pub fn open_add_match_modal(&mut self) {
        self.state.show_add_match_modal = true;
    }

    pub fn close_add_match_modal(&mut self) {
        self.state.show_add_match_modal = false;
        self.state.create_error = None;
        self.state.success_message = None;
        self.state.pending_create = None;
        self.state.create_form = MatchForm::new(SaveMatchRequest::default(), true);
    }

    pub fn save_match(&mut self) -> Option<NetworkRequest> {
        if !self.state.session.logged_in {
            self.state.create_error = Some(LOGIN_REQUIRED_SAVE.to_string());
            return None;
        }
        if let Some(spec) = self.state.create_form.invalid_odd() {
            self.state.create_error = Some(invalid_odd_message(spec));
            return None;
        }
        let submission = self.state.next_submission();
        self.state.pending_create = Some(submission);
        Some(NetworkRequest::CreateMatch { submission, payload: self.state.create_form.draft.clone() })
    }

    /// The list always reloads; the form is only reset if it is still the
    /// one that submitted.
    pub fn on_match_created(
        &mut self,
        submission: u64,
        submitted: SaveMatchRequest,
        record: Match,
    ) -> NetworkRequest {
        debug!("match {} created", record.match_id);
        let message = format!(
            "Match between {} and {} saved successfully!",
            submitted.team_a, submitted.team_b
        );

        if self.state.pending_create == Some(submission) {
            self.state.pending_create = None;
            self.state.create_error = None;
            self.state.create_form = MatchForm::new(SaveMatchRequest::default(), true);
            self.state.show_add_match_modal = false;
            self.state.success_message = Some(message);
        } else if !self.state.show_add_match_modal {
            self.state.success_message = Some(message);
        } else {
            debug!("create {submission} finished after its form was replaced");
        }
        self.load_matches()
    }

    /// The form stays open and populated.
    pub fn on_create_failed(&mut self, submission: u64, message: String) {
        if self.state.pending_create == Some(submission) {
            self.state.pending_create = None;
            self.state.success_message = None;
            self.state.create_error = Some(message);
        } else {
            debug!("create {submission} failed after its form closed: {message}");
        }
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    pub fn open_update_popup(&mut self) {
        let Some(record) = self.state.list.selected_match() else {
            return;
        };
        self.state.match_to_update = Some(MatchEdit::snapshot(record));
        self.state.update_error = None;
        self.state.is_update_popup_open = true;
    }

    pub fn close_update_popup(&mut self) {
        self.state.update_error = None;
        self.state.is_update_popup_open = false;
        self.state.match_to_update = None;
    }

    pub fn update_match(&mut self) -> Option<NetworkRequest> {
        self.state.match_to_update.as_ref()?;
        self.state.update_error = None;

        if !self.state.session.logged_in {
            self.state.update_error = Some(LOGIN_REQUIRED_UPDATE.to_string());
            return None;
        }

        let submission = self.state.next_submission();
        let edit = self.state.match_to_update.as_mut()?;
        if let Some(spec) = edit.form.invalid_odd() {
            self.state.update_error = Some(invalid_odd_message(spec));
            return None;
        }

        let mut payload = edit.form.draft.clone();
        payload.match_time = minute_precision(&payload.match_time);
        payload.upsert_odds();
        edit.pending = Some(submission);

        Some(NetworkRequest::UpdateMatch { submission, match_id: edit.match_id.clone(), payload })
    }

    /// Owns the popup only while it is still waiting on `submission`.
    fn owns_update_popup(&self, submission: u64) -> bool {
        self.state.is_update_popup_open
            && self
                .state
                .match_to_update
                .as_ref()
                .is_some_and(|edit| edit.pending == Some(submission))
    }

    pub fn on_match_updated(&mut self, submission: u64, record: Match) -> NetworkRequest {
        debug!("match {} updated", record.match_id);
        if self.owns_update_popup(submission) {
            self.close_update_popup();
        }
        self.load_matches()
    }

    /// The edit surface stays open with the user's edits intact.
    pub fn on_update_failed(&mut self, submission: u64, message: String) {
        if !self.owns_update_popup(submission) {
            debug!("update {submission} failed after its popup closed: {message}");
            return;
        }
        if let Some(edit) = self.state.match_to_update.as_mut() {
            edit.pending = None;
        }
        self.state.update_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Ask for confirmation before deleting the selected match.
    pub fn request_delete(&mut self) {
        if !self.state.session.logged_in {
            self.state.error_message = Some(LOGIN_REQUIRED_DELETE.to_string());
            return;
        }
        self.state.pending_delete = self
            .state
            .list
            .selected_match()
            .map(|m| m.match_id.clone());
    }

    pub fn confirm_delete(&mut self) -> Option<NetworkRequest> {
        let match_id = self.state.pending_delete.take()?;
        Some(NetworkRequest::DeleteMatch { match_id })
    }

    pub fn cancel_delete(&mut self) {
        self.state.pending_delete = None;
    }

    pub fn on_match_deleted(&mut self, match_id: String) -> NetworkRequest {
        debug!("match {match_id} deleted");
        self.state.success_message = Some(MATCH_DELETED.to_string());
        self.state.error_message = None;
        self.load_matches()
    }

    pub fn on_delete_failed(&mut self, message: String) {
        self.state.error_message = Some(message);
        self.state.success_message = None;
    }

    // -----------------------------------------------------------------------
    // Chrome
    // -----------------------------------------------------------------------

    pub fn toggle_help(&mut self) {
        self.state.show_help = !self.state.show_help;
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn dismiss_messages(&mut self) {
        self.state.error_message = None;
        self.state.success_message = None;
    }
}

fn invalid_odd_message(spec: Specifier) -> String {
    format!("Odd {} is not a number.", spec.label())
}

/// "17:13:00" becomes "17:13"; anything shorter passes through.
fn minute_precision(time: &str) -> String {
    let trimmed = time.trim();
    match trimmed.char_indices().nth(5) {
        Some((idx, _)) if trimmed.as_bytes().get(2) == Some(&b':') => trimmed[..idx].to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::app_state::ListStatus;
    use crate::state::form::FormField;
    use bet_api::{MatchOdds, MatchQuery, SortDirection, Specifier};
    use chrono::{NaiveDate, NaiveTime};

    fn record(id: &str) -> Match {
        Match {
            match_id: id.into(),
            match_owner: "alice".into(),
            description: Some("Derby".into()),
            match_date: NaiveDate::from_ymd_opt(2025, 7, 17).unwrap(),
            match_time: NaiveTime::from_hms_opt(17, 13, 0).unwrap(),
            team_a: "PAO".into(),
            team_b: "OSFP".into(),
            sport: Sport::Basketball,
            odds: vec![MatchOdds { specifier: Specifier::Win, odd: 1.5 }],
        }
    }

    fn app() -> App {
        App::new(AppSettings::default())
    }

    fn logged_in_app() -> App {
        let mut app = app();
        app.on_session_initialized(true, Some("alice".into()));
        app
    }

    /// Complete the outstanding list load with `total_pages` and one row.
    fn finish_load(app: &mut App, request: NetworkRequest, total_pages: usize) {
        let NetworkRequest::LoadMatches { generation, .. } = request else {
            panic!("expected a list load, got {request:?}");
        };
        let page = MatchPage { items: vec![record("1"), record("2")], total_pages };
        assert!(app.on_matches_loaded(generation, page).is_none());
    }

    fn submission_of(request: Option<NetworkRequest>) -> u64 {
        match request {
            Some(NetworkRequest::UpdateMatch { submission, .. }) => submission,
            other => panic!("expected an update, got {other:?}"),
        }
    }

    fn query_of(request: &NetworkRequest) -> &MatchQuery {
        match request {
            NetworkRequest::LoadMatches { query, .. } => query,
            other => panic!("expected a list load, got {other:?}"),
        }
    }

    #[test]
    fn startup_inits_session_then_loads_unconditionally() {
        let mut app = app();
        assert_eq!(app.on_app_started(), NetworkRequest::InitSession);

        let request = app.on_session_failed("idp down".into());
        let query = query_of(&request);
        assert_eq!(query.page, 0);
        assert_eq!(query.sort_by, SortField::MatchDate);
        assert_eq!(query.direction, SortDirection::Desc);
        assert_eq!(app.state.list.status, ListStatus::Loading);
        assert!(!app.state.session.logged_in);
    }

    #[test]
    fn valid_page_navigation_loads_with_active_sort() {
        let mut app = app();
        let initial = app.on_session_initialized(false, None);
        finish_load(&mut app, initial, 4);
        app.set_sorting(SortField::Owner);

        for page in 0..4 {
            let request = app.go_to_page(page).expect("page in range");
            let query = query_of(&request);
            assert_eq!(query.page, page);
            assert_eq!(query.sort_by, SortField::Owner);
            assert_eq!(query.direction, SortDirection::Asc);
            assert_eq!(app.state.list.current_page, page);
        }
    }

    #[test]
    fn out_of_range_navigation_is_a_no_op() {
        let mut app = app();
        let initial = app.on_session_initialized(false, None);
        finish_load(&mut app, initial, 3);
        app.go_to_page(1);

        assert!(app.go_to_page(3).is_none());
        assert!(app.go_to_page(usize::MAX).is_none());
        assert_eq!(app.state.list.current_page, 1);

        app.go_to_page(0);
        assert!(app.prev_page().is_none());
        assert_eq!(app.state.list.current_page, 0);
    }

    #[test]
    fn no_pages_means_no_navigation() {
        let mut app = app();
        assert!(app.go_to_page(0).is_none());
        assert!(app.next_page().is_none());
    }

    #[test]
    fn reselecting_active_sort_field_flips_direction() {
        let mut app = app();
        let initial = app.on_session_initialized(false, None);
        finish_load(&mut app, initial, 5);
        app.go_to_page(2);

        let request = app.set_sorting(SortField::MatchDate);
        let query = query_of(&request);
        assert_eq!(query.sort_by, SortField::MatchDate);
        assert_eq!(query.direction, SortDirection::Asc);
        assert_eq!(query.page, 0);

        let request = app.set_sorting(SortField::MatchDate);
        assert_eq!(query_of(&request).direction, SortDirection::Desc);
    }

    #[test]
    fn new_sort_field_starts_ascending_on_first_page() {
        let mut app = app();
        let initial = app.on_session_initialized(false, None);
        finish_load(&mut app, initial, 5);
        app.go_to_page(3);
        app.set_sorting(SortField::MatchDate);

        let request = app.set_sorting(SortField::Sport);
        let query = query_of(&request);
        assert_eq!(query.sort_by, SortField::Sport);
        assert_eq!(query.direction, SortDirection::Asc);
        assert_eq!(app.state.list.current_page, 0);
    }

    #[test]
    fn unauthenticated_mutations_stay_local() {
        let mut app = app();
        let initial = app.on_session_initialized(false, None);
        finish_load(&mut app, initial, 1);

        app.open_add_match_modal();
        assert!(app.save_match().is_none());
        assert_eq!(app.state.create_error.as_deref(), Some(LOGIN_REQUIRED_SAVE));

        app.open_update_popup();
        assert!(app.update_match().is_none());
        assert_eq!(app.state.update_error.as_deref(), Some(LOGIN_REQUIRED_UPDATE));

        app.request_delete();
        assert!(app.state.pending_delete.is_none());
        assert!(app.confirm_delete().is_none());
        assert_eq!(app.state.error_message.as_deref(), Some(LOGIN_REQUIRED_DELETE));
    }

    #[test]
    fn successful_create_resets_form_and_reloads_once() {
        let mut app = logged_in_app();
        app.open_add_match_modal();
        app.state.create_form.draft.team_a = "pao".into();
        app.state.create_form.draft.team_b = "osfp".into();
        app.state.create_form.draft.sport = Sport::Basketball;
        app.state.create_form.draft.set_odd_value(Specifier::Win, 1.5);

        let request = app.save_match().expect("create request");
        let NetworkRequest::CreateMatch { submission, payload } = request else {
            panic!("expected create");
        };
        assert_eq!(payload.team_a, "pao");

        // the stored record comes back upper-cased; the message uses what was typed
        let follow_up = app.on_match_created(submission, payload, record("3"));
        assert!(matches!(follow_up, NetworkRequest::LoadMatches { .. }));
        assert!(!app.state.show_add_match_modal);
        assert_eq!(app.state.create_form.draft, SaveMatchRequest::default());
        assert_eq!(app.state.create_form.draft.sport, Sport::ALL[0]);
        assert_eq!(
            app.state.success_message.as_deref(),
            Some("Match between pao and osfp saved successfully!")
        );
    }

    #[test]
    fn late_create_success_leaves_reopened_form_alone() {
        let mut app = logged_in_app();
        app.open_add_match_modal();
        app.state.create_form.draft.team_a = "PAO".into();
        let Some(NetworkRequest::CreateMatch { submission, payload }) = app.save_match() else {
            panic!("expected create");
        };
        app.close_add_match_modal();
        app.open_add_match_modal();
        app.state.create_form.draft.team_a = "AEK".into();

        let follow_up = app.on_match_created(submission, payload, record("3"));
        assert!(matches!(follow_up, NetworkRequest::LoadMatches { .. }));
        assert!(app.state.show_add_match_modal);
        assert_eq!(app.state.create_form.draft.team_a, "AEK");
        assert!(app.state.success_message.is_none());
    }

    #[test]
    fn late_create_failure_is_dropped() {
        let mut app = logged_in_app();
        app.open_add_match_modal();
        let Some(NetworkRequest::CreateMatch { submission, .. }) = app.save_match() else {
            panic!("expected create");
        };
        app.close_add_match_modal();
        app.open_add_match_modal();

        app.on_create_failed(submission, "Match with id 1 already exists".into());
        assert!(app.state.create_error.is_none());
    }

    #[test]
    fn unparseable_odd_blocks_submission() {
        let mut app = logged_in_app();
        app.open_add_match_modal();
        while app.state.create_form.focused() != FormField::Odd(Specifier::Win) {
            app.state.create_form.next_field();
        }
        app.state.create_form.push_char('.');

        assert!(app.save_match().is_none());
        assert_eq!(app.state.create_error.as_deref(), Some("Odd WIN is not a number."));
        assert!(app.state.pending_create.is_none());
    }

    #[test]
    fn failed_create_keeps_form_open_and_populated() {
        let mut app = logged_in_app();
        app.open_add_match_modal();
        app.state.create_form.draft.team_a = "PAO".into();
        let Some(NetworkRequest::CreateMatch { submission, .. }) = app.save_match() else {
            panic!("expected create");
        };

        app.on_create_failed(submission, "Team A and Team B must be different".into());
        assert!(app.state.show_add_match_modal);
        assert_eq!(app.state.create_form.draft.team_a, "PAO");
        assert_eq!(
            app.state.create_error.as_deref(),
            Some("Team A and Team B must be different")
        );
        assert!(app.state.update_error.is_none());
        assert!(app.state.list.error.is_none());
    }

    #[test]
    fn update_trims_seconds_and_upserts_odds() {
        let mut app = logged_in_app();
        let initial = app.load_matches();
        finish_load(&mut app, initial, 1);
        app.open_update_popup();

        let edit = app.state.match_to_update.as_mut().unwrap();
        edit.form.draft.odds.push(MatchOdds { specifier: Specifier::Win, odd: 2.1 });

        let Some(NetworkRequest::UpdateMatch { match_id, payload, .. }) = app.update_match() else {
            panic!("expected update");
        };
        assert_eq!(match_id, "1");
        assert_eq!(payload.match_time, "17:13");
        assert_eq!(payload.odds, vec![MatchOdds { specifier: Specifier::Win, odd: 2.1 }]);
        // the snapshot itself is not rewritten
        let edit = app.state.match_to_update.as_ref().unwrap();
        assert_eq!(edit.form.draft.match_time, "17:13:00");
    }

    #[test]
    fn editing_snapshot_leaves_list_row_untouched() {
        let mut app = logged_in_app();
        let initial = app.load_matches();
        finish_load(&mut app, initial, 1);
        app.open_update_popup();

        let edit = app.state.match_to_update.as_mut().unwrap();
        while edit.form.focused() != FormField::TeamA {
            edit.form.next_field();
        }
        edit.form.push_char('!');

        assert_eq!(app.state.list.matches[0].team_a, "PAO");
        assert_eq!(app.state.match_to_update.as_ref().unwrap().form.draft.team_a, "PAO!");
    }

    #[test]
    fn failed_update_keeps_edits_and_popup() {
        let mut app = logged_in_app();
        let initial = app.load_matches();
        finish_load(&mut app, initial, 1);
        app.open_update_popup();
        app.state.match_to_update.as_mut().unwrap().form.draft.team_b = "AEK".into();
        let submission = submission_of(app.update_match());

        app.on_update_failed(submission, "You do not have permission to update this match".into());
        assert!(app.state.is_update_popup_open);
        let edit = app.state.match_to_update.as_ref().unwrap();
        assert_eq!(edit.form.draft.team_b, "AEK");
        assert_eq!(
            app.state.update_error.as_deref(),
            Some("You do not have permission to update this match")
        );
        assert!(app.state.create_error.is_none());
    }

    #[test]
    fn successful_update_closes_popup_without_message() {
        let mut app = logged_in_app();
        let initial = app.load_matches();
        finish_load(&mut app, initial, 1);
        app.open_update_popup();
        let submission = submission_of(app.update_match());

        let follow_up = app.on_match_updated(submission, record("1"));
        assert!(matches!(follow_up, NetworkRequest::LoadMatches { .. }));
        assert!(!app.state.is_update_popup_open);
        assert!(app.state.match_to_update.is_none());
        assert!(app.state.success_message.is_none());
    }

    #[test]
    fn late_update_failure_does_not_reopen_closed_popup() {
        let mut app = logged_in_app();
        let initial = app.load_matches();
        finish_load(&mut app, initial, 1);
        app.open_update_popup();
        let submission = submission_of(app.update_match());
        app.close_update_popup();

        app.on_update_failed(submission, "late".into());
        assert!(app.state.update_error.is_none());
        assert!(!app.state.is_update_popup_open);
    }

    /// Submit an update for row 1, then move on to editing row 2.
    fn switch_to_second_row(app: &mut App) -> u64 {
        let initial = app.load_matches();
        finish_load(app, initial, 1);
        app.open_update_popup();
        let submission = submission_of(app.update_match());
        app.close_update_popup();
        app.select_next();
        app.open_update_popup();
        app.state.match_to_update.as_mut().unwrap().form.draft.team_b = "AEK".into();
        submission
    }

    #[test]
    fn late_update_success_keeps_other_popup() {
        let mut app = logged_in_app();
        let submission = switch_to_second_row(&mut app);

        let follow_up = app.on_match_updated(submission, record("1"));
        assert!(matches!(follow_up, NetworkRequest::LoadMatches { .. }));
        assert!(app.state.is_update_popup_open);
        let edit = app.state.match_to_update.as_ref().unwrap();
        assert_eq!(edit.match_id, "2");
        assert_eq!(edit.form.draft.team_b, "AEK");
    }

    #[test]
    fn late_update_failure_stays_off_other_popup() {
        let mut app = logged_in_app();
        let submission = switch_to_second_row(&mut app);

        app.on_update_failed(submission, "You do not have permission to update this match".into());
        assert!(app.state.update_error.is_none());
        assert_eq!(app.state.match_to_update.as_ref().unwrap().match_id, "2");
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = logged_in_app();
        let initial = app.load_matches();
        finish_load(&mut app, initial, 1);
        app.select_next();

        app.request_delete();
        assert_eq!(app.state.pending_delete.as_deref(), Some("2"));
        app.cancel_delete();
        assert!(app.confirm_delete().is_none());

        app.request_delete();
        assert_eq!(
            app.confirm_delete(),
            Some(NetworkRequest::DeleteMatch { match_id: "2".into() })
        );

        let follow_up = app.on_match_deleted("2".into());
        assert!(matches!(follow_up, NetworkRequest::LoadMatches { .. }));
        assert_eq!(app.state.success_message.as_deref(), Some(MATCH_DELETED));
    }

    #[test]
    fn delete_failure_shows_server_message() {
        let mut app = logged_in_app();
        app.state.success_message = Some("old".into());
        app.on_delete_failed("Match not_found".into());
        assert_eq!(app.state.error_message.as_deref(), Some("Match not_found"));
        assert!(app.state.success_message.is_none());
    }

    #[test]
    fn list_failure_preserves_rows_and_uses_own_slot() {
        let mut app = app();
        let initial = app.on_session_initialized(false, None);
        finish_load(&mut app, initial, 2);

        let NetworkRequest::LoadMatches { generation, .. } = app.next_page().unwrap() else {
            panic!("expected load");
        };
        app.on_matches_failed(generation, "Invalid sort field".into());
        assert_eq!(app.state.list.matches.len(), 2);
        assert_eq!(app.state.list.error.as_deref(), Some("Invalid sort field"));
        assert!(app.state.error_message.is_none());
        assert!(app.state.create_error.is_none());
    }

    #[test]
    fn older_response_does_not_overwrite_newer() {
        let mut app = app();
        let initial = app.on_session_initialized(false, None);
        finish_load(&mut app, initial, 5);

        let NetworkRequest::LoadMatches { generation: first, .. } = app.go_to_page(1).unwrap() else {
            panic!();
        };
        let NetworkRequest::LoadMatches { generation: second, .. } = app.go_to_page(2).unwrap() else {
            panic!();
        };

        let newer = MatchPage { items: vec![record("20")], total_pages: 5 };
        app.on_matches_loaded(second, newer);
        let older = MatchPage { items: vec![record("10")], total_pages: 5 };
        app.on_matches_loaded(first, older);

        assert_eq!(app.state.list.matches[0].match_id, "20");
    }

    #[test]
    fn my_matches_filter_needs_username() {
        let mut app = app();
        assert!(app.toggle_my_matches().is_none());

        let mut app = logged_in_app();
        let request = app.toggle_my_matches().unwrap();
        assert_eq!(query_of(&request).owner.as_deref(), Some("alice"));
        let request = app.toggle_my_matches().unwrap();
        assert_eq!(query_of(&request).owner, None);
    }

    #[test]
    fn sport_filter_cycles_back_to_all() {
        let mut app = app();
        assert_eq!(query_of(&app.cycle_sport_filter()).sport, Some(Sport::Football));
        assert_eq!(query_of(&app.cycle_sport_filter()).sport, Some(Sport::Basketball));
        assert_eq!(query_of(&app.cycle_sport_filter()).sport, None);
    }

    #[test]
    fn minute_precision_only_trims_seconds() {
        assert_eq!(minute_precision("17:13:00"), "17:13");
        assert_eq!(minute_precision("17:13"), "17:13");
        assert_eq!(minute_precision(" 09:05:59 "), "09:05");
        assert_eq!(minute_precision(""), "");
    }
}
