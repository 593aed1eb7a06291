use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::App;
use crate::state::app_state::ListStatus;
use crate::state::form::{FormField, MatchForm};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::{LayoutAreas, centered};
use bet_api::{Match, SortDirection, SortField, Specifier};

const FORM_WIDTH: u16 = 56;

/// Table columns and the sort key each one offers, if the backend sorts by it.
const COLUMNS: [(&str, Option<SortField>); 7] = [
    ("Date", Some(SortField::MatchDate)),
    ("Time", None),
    ("Team A", None),
    ("Team B", None),
    ("Sport", Some(SortField::Sport)),
    ("Owner", Some(SortField::Owner)),
    ("Odds", None),
];
const HELP_TEXT: &[(&str, &str)] = &[
    ("j/k  ↑/↓", "select match"),
    ("h/l  ←/→", "previous / next page"),
    ("g / G", "first / last page"),
    ("1-3", "sort by date / owner / sport (again to flip)"),
    ("m", "only my matches"),
    ("s", "cycle sport filter"),
    ("r", "reload page"),
    ("n", "add match"),
    ("e / Enter", "edit selected match"),
    ("x / Del", "delete selected match"),
    ("L / R / O", "login / register / logout"),
    ("\"", "toggle log pane"),
    ("Esc", "dismiss messages"),
    ("q", "quit"),
];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let _ = terminal.draw(|f| {
        layout.update(f.area(), app.state.show_logs);

        draw_header(f, layout.header, app);
        draw_match_table(f, layout.main, app);
        if app.state.show_logs {
            draw_logs(f, layout.logs);
        }
        draw_footer(f, layout.footer, app);

        if app.state.show_add_match_modal {
            draw_form(
                f,
                " Add Match ",
                &app.state.create_form,
                app.state.create_error.as_deref(),
                app.state.success_message.as_deref(),
            );
        } else if app.state.is_update_popup_open
            && let Some(edit) = app.state.match_to_update.as_ref()
        {
            let title = format!(" Update Match {} ({}) ", edit.match_id, edit.owner);
            draw_form(f, &title, &edit.form, app.state.update_error.as_deref(), None);
        }

        if let Some(match_id) = app.state.pending_delete.as_deref() {
            draw_confirm_delete(f, match_id);
        }
        if app.state.show_help {
            draw_help(f);
        }

        draw_loading_spinner(f, f.area(), loading);
    });
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_header(f: &mut Frame, header: [Rect; 2], app: &App) {
    let list = &app.state.list;
    let mut filters = vec![Span::styled(" Matches ", Style::default().add_modifier(Modifier::BOLD))];
    if let Some(owner) = list.owner_filter.as_deref() {
        filters.push(Span::styled(format!(" owner:{owner} "), Style::default().fg(Color::Cyan)));
    }
    if let Some(sport) = list.sport_filter {
        filters.push(Span::styled(format!(" sport:{} ", sport.label()), Style::default().fg(Color::Cyan)));
    }
    f.render_widget(
        Paragraph::new(Line::from(filters)).block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(BorderType::Rounded),
        ),
        header[0],
    );

    let session = &app.state.session;
    let who = match (session.logged_in, session.username.as_deref()) {
        (true, Some(name)) => Span::styled(format!("● {name} "), Style::default().fg(Color::Green)),
        (true, None) => Span::styled("● logged in ", Style::default().fg(Color::Green)),
        (false, _) if !session.initialized => Span::styled("○ offline ", Style::default().fg(Color::DarkGray)),
        (false, _) => Span::styled("○ guest (L to log in) ", Style::default().fg(Color::Yellow)),
    };
    f.render_widget(
        Paragraph::new(Line::from(who))
            .alignment(Alignment::Right)
            .block(
                Block::default()
                    .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                    .border_type(BorderType::Rounded),
            ),
        header[1],
    );
}

fn draw_match_table(f: &mut Frame, area: Rect, app: &App) {
    let list = &app.state.list;
    let block = default_border(Color::White).title(" Matches ");

    if list.matches.is_empty() {
        let text = match list.status {
            ListStatus::Idle | ListStatus::Loading => "Loading matches...",
            ListStatus::Failed => "Could not load matches.",
            ListStatus::Loaded => "No matches found.",
        };
        f.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::DarkGray)).block(block),
            area,
        );
        return;
    }

    let header_cells: Vec<Cell> = column_titles(list.sort_by, list.sort_direction)
        .into_iter()
        .map(Cell::from)
        .collect();
    let header = Row::new(header_cells)
        .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow));

    let rows = list.matches.iter().map(|record| {
        let style = if app.is_own_match(record) {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        Row::new(match_cells(record)).style(style)
    });

    let widths = [
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Length(20),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut table_state = TableState::default().with_selected(Some(list.selected));
    f.render_stateful_widget(table, area, &mut table_state);
}

/// Sortable columns carry their key number; the active one its direction.
fn column_titles(sort_by: SortField, direction: SortDirection) -> Vec<String> {
    COLUMNS
        .iter()
        .map(|(title, key)| {
            let Some(field) = key else {
                return title.to_string();
            };
            let number = SortField::ALL.iter().position(|f| f == field).map_or(0, |i| i + 1);
            let mut label = format!("{number} {title}");
            if *field == sort_by {
                label.push_str(match direction {
                    SortDirection::Asc => " ▲",
                    SortDirection::Desc => " ▼",
                });
            }
            label
        })
        .collect()
}

fn match_cells(record: &Match) -> Vec<Cell<'static>> {
    let odds = Specifier::ALL
        .iter()
        .filter_map(|spec| record.odd_value(*spec).map(|odd| format!("{} {odd:.2}", &spec.label()[..1])))
        .collect::<Vec<_>>()
        .join(" ");
    vec![
        Cell::from(record.match_date.format("%Y-%m-%d").to_string()),
        Cell::from(record.match_time.format("%H:%M").to_string()),
        Cell::from(record.team_a.clone()),
        Cell::from(record.team_b.clone()),
        Cell::from(record.sport.label()),
        Cell::from(record.match_owner.clone()),
        Cell::from(odds),
    ]
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let list = &app.state.list;
    let page_info = if list.total_pages == 0 {
        "Page 0 of 0".to_string()
    } else {
        format!("Page {} of {}", list.current_page + 1, list.total_pages)
    };

    let mut spans = vec![Span::raw(format!(" {page_info}  "))];
    let errors = footer_errors(app);
    if !errors.is_empty() {
        spans.push(Span::styled(errors.join("  "), Style::default().fg(Color::Red)));
    } else if let Some(message) = app.state.success_message.as_deref().filter(|_| !app.state.show_add_match_modal) {
        spans.push(Span::styled(message.to_string(), Style::default().fg(Color::Green)));
    } else {
        spans.push(Span::styled("? for help", Style::default().fg(Color::DarkGray)));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).block(default_border(Color::DarkGray)),
        area,
    );
}

/// List and action errors live in separate slots; both are shown.
fn footer_errors(app: &App) -> Vec<&str> {
    [app.state.list.error.as_deref(), app.state.error_message.as_deref()]
        .into_iter()
        .flatten()
        .collect()
}

fn draw_form(f: &mut Frame, title: &str, form: &MatchForm, error: Option<&str>, success: Option<&str>) {
    let height = FormField::ORDER.len() as u16 + 6;
    let area = centered(f.area(), FORM_WIDTH, height);
    f.render_widget(Clear, area);

    let block = default_border(Color::Yellow).title(title.to_string());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [fields_area, status_area, hint_area] = Layout::vertical([
        Constraint::Length(FormField::ORDER.len() as u16),
        Constraint::Length(2),
        Constraint::Length(1),
    ])
    .areas(inner);

    let focused = form.focused();
    let lines: Vec<Line> = FormField::ORDER
        .iter()
        .map(|field| {
            let editable = *field != FormField::MatchId || form.id_editable;
            let label_style = if *field == focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if editable {
                Style::default().fg(Color::Gray)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let mut value = form.field_text(*field);
            if *field == focused {
                value.push(if *field == FormField::Sport { ' ' } else { '▏' });
            }
            if *field == FormField::Sport {
                value = format!("◀ {} ▶", value.trim_end());
            }
            Line::from(vec![
                Span::styled(format!("{:>18}: ", field.label()), label_style),
                Span::raw(value),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), fields_area);

    let status = match (error, success) {
        (Some(e), _) => Line::from(Span::styled(e.to_string(), Style::default().fg(Color::Red))),
        (None, Some(s)) => Line::from(Span::styled(s.to_string(), Style::default().fg(Color::Green))),
        (None, None) => Line::from(""),
    };
    f.render_widget(Paragraph::new(status).wrap(Wrap { trim: true }), status_area);

    f.render_widget(
        Paragraph::new("Tab/↑↓ move  ←→ sport  Enter save  Esc cancel")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        hint_area,
    );
}

fn draw_confirm_delete(f: &mut Frame, match_id: &str) {
    let area = centered(f.area(), 44, 5);
    f.render_widget(Clear, area);
    let text = vec![
        Line::from(format!("Delete match {match_id}?")),
        Line::from(""),
        Line::from(Span::styled("y to confirm, any other key to cancel", Style::default().fg(Color::DarkGray))),
    ];
    f.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(default_border(Color::Red).title(" Confirm ")),
        area,
    );
}

fn draw_help(f: &mut Frame) {
    let area = centered(f.area(), 60, HELP_TEXT.len() as u16 + 2);
    f.render_widget(Clear, area);
    let lines: Vec<Line> = HELP_TEXT
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:>12}  "), Style::default().fg(Color::Yellow)),
                Span::raw(*what),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(default_border(Color::White).title(" Help ")),
        area,
    );
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let widget = TuiLoggerWidget::default()
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(Style::default().fg(Color::Gray))
        .block(default_border(Color::DarkGray).title(" Logs "));
    f.render_widget(widget, area);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    f.render_widget(spinner, Rect::new(area.width.saturating_sub(3), 1, 1, 1));
}
