use crate::app::App;
use crate::state::form::MatchForm;
use crate::state::messages::NetworkRequest;
use bet_api::SortField;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Outcome of a key press inside an open form.
enum FormAction {
    Submit,
    Cancel,
    Edited,
}

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;

    if let (Char('c'), KeyModifiers::CONTROL) = (key_event.code, key_event.modifiers) {
        crate::cleanup_terminal();
        std::process::exit(0);
    }

    let request = if guard.state.show_help {
        if matches!(key_event.code, KeyCode::Esc | Char('?') | Char('q')) {
            guard.toggle_help();
        }
        None
    } else if guard.state.pending_delete.is_some() {
        match key_event.code {
            Char('y') | KeyCode::Enter => guard.confirm_delete(),
            _ => {
                guard.cancel_delete();
                None
            }
        }
    } else if guard.state.is_update_popup_open {
        let action = match guard.state.match_to_update.as_mut() {
            Some(edit) => form_key(&mut edit.form, key_event),
            None => FormAction::Cancel,
        };
        match action {
            FormAction::Submit => guard.update_match(),
            FormAction::Cancel => {
                guard.close_update_popup();
                None
            }
            FormAction::Edited => None,
        }
    } else if guard.state.show_add_match_modal {
        match form_key(&mut guard.state.create_form, key_event) {
            FormAction::Submit => guard.save_match(),
            FormAction::Cancel => {
                guard.close_add_match_modal();
                None
            }
            FormAction::Edited => None,
        }
    } else {
        list_key(&mut guard, key_event)
    };

    drop(guard);
    if let Some(request) = request {
        let _ = network_requests.send(request).await;
    }
}

fn list_key(app: &mut App, key_event: KeyEvent) -> Option<NetworkRequest> {
    match key_event.code {
        Char('q') => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }
        Char('?') => {
            app.toggle_help();
            None
        }
        Char('"') => {
            app.toggle_show_logs();
            None
        }
        KeyCode::Esc => {
            app.dismiss_messages();
            None
        }

        Char('j') | KeyCode::Down => {
            app.select_next();
            None
        }
        Char('k') | KeyCode::Up => {
            app.select_prev();
            None
        }
        Char('l') | KeyCode::Right | KeyCode::PageDown => app.next_page(),
        Char('h') | KeyCode::Left | KeyCode::PageUp => app.prev_page(),
        Char('g') | KeyCode::Home => app.go_to_page(0),
        Char('G') | KeyCode::End => {
            let last = app.state.list.total_pages.checked_sub(1)?;
            app.go_to_page(last)
        }
        Char('r') => Some(app.load_matches()),

        Char(c @ '1'..='3') => {
            let index = c.to_digit(10)? as usize - 1;
            let field = SortField::ALL.get(index).copied()?;
            Some(app.set_sorting(field))
        }
        Char('m') => app.toggle_my_matches(),
        Char('s') => Some(app.cycle_sport_filter()),

        Char('n') => {
            app.open_add_match_modal();
            None
        }
        Char('e') | KeyCode::Enter => {
            app.open_update_popup();
            None
        }
        Char('x') | KeyCode::Delete => {
            app.request_delete();
            None
        }

        Char('L') => Some(app.login()),
        Char('R') => Some(app.register()),
        Char('O') => Some(app.logout()),

        _ => None,
    }
}

fn form_key(form: &mut MatchForm, key_event: KeyEvent) -> FormAction {
    match key_event.code {
        KeyCode::Esc => return FormAction::Cancel,
        KeyCode::Enter => return FormAction::Submit,
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Left | KeyCode::Right => form.cycle_sport(),
        KeyCode::Backspace => form.pop_char(),
        Char(c) => form.push_char(c),
        _ => {}
    }
    FormAction::Edited
}
