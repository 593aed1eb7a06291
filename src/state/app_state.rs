use crate::state::form::MatchForm;
use bet_api::{Match, MatchPage, MatchQuery, SaveMatchRequest, SortDirection, SortField, Sport};

// ---------------------------------------------------------------------------
// Paginated list state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// What became of a list response once it reached the view-model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was issued after this one; ignored.
    Stale,
    /// The page index fell past the end of a shrunken collection and was
    /// clamped; a reload is needed.
    Clamped,
}

#[derive(Debug)]
pub struct MatchListState {
    pub matches: Vec<Match>,
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub sort_by: SortField,
    pub sort_direction: SortDirection,
    pub owner_filter: Option<String>,
    pub sport_filter: Option<Sport>,
    pub status: ListStatus,
    pub error: Option<String>,
    /// Highlighted row on the visible page.
    pub selected: usize,
    generation: u64,
}

impl Default for MatchListState {
    fn default() -> Self {
        let query = MatchQuery::default();
        Self {
            matches: Vec::new(),
            current_page: query.page,
            page_size: query.size,
            total_pages: 0,
            sort_by: query.sort_by,
            sort_direction: query.direction,
            owner_filter: None,
            sport_filter: None,
            status: ListStatus::Idle,
            error: None,
            selected: 0,
            generation: 0,
        }
    }
}

impl MatchListState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self { page_size, ..Self::default() }
    }

    pub fn query(&self) -> MatchQuery {
        MatchQuery {
            page: self.current_page,
            size: self.page_size,
            sort_by: self.sort_by,
            direction: self.sort_direction,
            owner: self.owner_filter.clone(),
            sport: self.sport_filter,
            match_date: None,
        }
    }

    /// Enter `Loading` and tag the request with a fresh generation.
    pub fn begin_load(&mut self) -> (u64, MatchQuery) {
        self.generation += 1;
        self.status = ListStatus::Loading;
        (self.generation, self.query())
    }

    pub fn apply_page(&mut self, generation: u64, page: MatchPage) -> LoadOutcome {
        if generation != self.generation {
            return LoadOutcome::Stale;
        }
        self.error = None;
        self.matches = page.items;
        self.total_pages = page.total_pages;
        self.selected = self.selected.min(self.matches.len().saturating_sub(1));

        if self.total_pages == 0 {
            self.current_page = 0;
        } else if self.current_page >= self.total_pages {
            self.current_page = self.total_pages - 1;
            return LoadOutcome::Clamped;
        }
        self.status = ListStatus::Loaded;
        LoadOutcome::Applied
    }

    /// Keep the stale page visible and record the error.
    pub fn apply_failure(&mut self, generation: u64, message: String) -> LoadOutcome {
        if generation != self.generation {
            return LoadOutcome::Stale;
        }
        self.status = ListStatus::Failed;
        self.error = Some(message);
        LoadOutcome::Applied
    }

    pub fn can_go_to(&self, page: usize) -> bool {
        page < self.total_pages
    }

    /// Same field flips the direction; a new field starts ascending.
    /// Either way the list restarts at page 0.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_by == field {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_by = field;
            self.sort_direction = SortDirection::Asc;
        }
        self.current_page = 0;
    }

    pub fn select_next(&mut self) {
        let max = self.matches.len().saturating_sub(1);
        if self.selected < max {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_match(&self) -> Option<&Match> {
        self.matches.get(self.selected)
    }
}

// ---------------------------------------------------------------------------
// Session view
// ---------------------------------------------------------------------------

/// What the view-model has observed of the session. Owned by the identity
/// provider; only mirrored here.
#[derive(Debug, Default)]
pub struct SessionView {
    pub initialized: bool,
    pub logged_in: bool,
    pub username: Option<String>,
}

// ---------------------------------------------------------------------------
// Update surface
// ---------------------------------------------------------------------------

/// Deep copy of the record being edited. Edits never touch the list row.
#[derive(Debug, Clone)]
pub struct MatchEdit {
    pub match_id: String,
    pub owner: String,
    pub form: MatchForm,
    /// Submission this popup is waiting on, if any.
    pub pending: Option<u64>,
}

impl MatchEdit {
    pub fn snapshot(record: &Match) -> Self {
        Self {
            match_id: record.match_id.clone(),
            owner: record.match_owner.clone(),
            form: MatchForm::new(SaveMatchRequest::from_match(record), false),
            pending: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AppState {
    pub session: SessionView,
    pub list: MatchListState,

    pub create_form: MatchForm,
    pub show_add_match_modal: bool,
    pub create_error: Option<String>,
    /// Submission the open add form is waiting on, if any.
    pub pending_create: Option<u64>,

    pub match_to_update: Option<MatchEdit>,
    pub is_update_popup_open: bool,
    pub update_error: Option<String>,

    /// Match awaiting a y/n answer before the delete is sent.
    pub pending_delete: Option<String>,
    pub error_message: Option<String>,
    pub success_message: Option<String>,

    pub show_help: bool,
    pub show_logs: bool,
    /// Set once a redirect flow started; the UI loop exits on it.
    pub redirect: Option<String>,
    submissions: u64,
}

impl AppState {
    pub fn new(page_size: usize) -> Self {
        Self {
            list: MatchListState::with_page_size(page_size),
            create_form: MatchForm::new(SaveMatchRequest::default(), true),
            ..Self::default()
        }
    }

    /// Fresh token for a create/update submission.
    pub fn next_submission(&mut self) -> u64 {
        self.submissions += 1;
        self.submissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn record(id: &str) -> Match {
        Match {
            match_id: id.into(),
            match_owner: "alice".into(),
            description: None,
            match_date: NaiveDate::from_ymd_opt(2025, 7, 17).unwrap(),
            match_time: NaiveTime::from_hms_opt(17, 13, 0).unwrap(),
            team_a: "PAO".into(),
            team_b: "OSFP".into(),
            sport: Sport::Football,
            odds: vec![],
        }
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut list = MatchListState::default();
        let (first, _) = list.begin_load();
        let (second, _) = list.begin_load();

        let page = MatchPage { items: vec![record("1")], total_pages: 1 };
        assert_eq!(list.apply_page(first, page), LoadOutcome::Stale);
        assert!(list.matches.is_empty());
        assert_eq!(list.status, ListStatus::Loading);

        let page = MatchPage { items: vec![record("2")], total_pages: 1 };
        assert_eq!(list.apply_page(second, page), LoadOutcome::Applied);
        assert_eq!(list.matches[0].match_id, "2");
        assert_eq!(list.status, ListStatus::Loaded);
    }

    #[test]
    fn failure_keeps_previous_page() {
        let mut list = MatchListState::default();
        let (generation, _) = list.begin_load();
        list.apply_page(generation, MatchPage { items: vec![record("1")], total_pages: 2 });

        let (generation, _) = list.begin_load();
        list.apply_failure(generation, "boom".into());
        assert_eq!(list.status, ListStatus::Failed);
        assert_eq!(list.error.as_deref(), Some("boom"));
        assert_eq!(list.matches.len(), 1);
        assert_eq!(list.total_pages, 2);
    }

    #[test]
    fn shrunken_collection_clamps_page() {
        let mut list = MatchListState { current_page: 3, ..Default::default() };
        let (generation, _) = list.begin_load();
        let outcome = list.apply_page(generation, MatchPage { items: vec![], total_pages: 2 });
        assert_eq!(outcome, LoadOutcome::Clamped);
        assert_eq!(list.current_page, 1);
    }

    #[test]
    fn emptied_collection_resets_to_first_page() {
        let mut list = MatchListState { current_page: 2, ..Default::default() };
        let (generation, _) = list.begin_load();
        let outcome = list.apply_page(generation, MatchPage { items: vec![], total_pages: 0 });
        assert_eq!(outcome, LoadOutcome::Applied);
        assert_eq!(list.current_page, 0);
        assert_eq!(list.query().page, 0);
    }

    #[test]
    fn submissions_are_unique() {
        let mut state = AppState::new(5);
        let first = state.next_submission();
        assert_ne!(first, state.next_submission());
    }

    #[test]
    fn edit_snapshot_is_independent_of_row() {
        let row = record("5");
        let mut edit = MatchEdit::snapshot(&row);
        edit.form.draft.team_a = "AEK".into();
        assert_eq!(row.team_a, "PAO");
        assert_eq!(edit.form.draft.match_time, "17:13:00");
        assert_eq!(edit.match_id, "5");
    }
}
