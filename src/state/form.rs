use bet_api::{SaveMatchRequest, Specifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    MatchId,
    Description,
    MatchDate,
    MatchTime,
    TeamA,
    TeamB,
    Sport,
    Odd(Specifier),
}

impl FormField {
    pub const ORDER: [FormField; 10] = [
        FormField::MatchId,
        FormField::Description,
        FormField::MatchDate,
        FormField::MatchTime,
        FormField::TeamA,
        FormField::TeamB,
        FormField::Sport,
        FormField::Odd(Specifier::Win),
        FormField::Odd(Specifier::Draw),
        FormField::Odd(Specifier::Lose),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::MatchId => "Match ID",
            FormField::Description => "Description",
            FormField::MatchDate => "Date (YYYY-MM-DD)",
            FormField::MatchTime => "Time (HH:MM)",
            FormField::TeamA => "Team A",
            FormField::TeamB => "Team B",
            FormField::Sport => "Sport",
            FormField::Odd(Specifier::Win) => "Odd WIN",
            FormField::Odd(Specifier::Draw) => "Odd DRAW",
            FormField::Odd(Specifier::Lose) => "Odd LOSE",
        }
    }
}

/// Editable create/update payload plus the cursor over its fields.
///
/// Odds are typed as text; every keystroke that leaves a parseable number
/// upserts that value into the payload.
#[derive(Debug, Clone, Default)]
pub struct MatchForm {
    pub draft: SaveMatchRequest,
    pub focus: usize,
    /// When false the identifier is fixed (update mode).
    pub id_editable: bool,
    odd_inputs: [String; 3],
}

impl MatchForm {
    pub fn new(draft: SaveMatchRequest, id_editable: bool) -> Self {
        let odd_inputs = Specifier::ALL.map(|spec| {
            draft
                .odd_value(spec)
                .map(|v| v.to_string())
                .unwrap_or_default()
        });
        Self { draft, focus: if id_editable { 0 } else { 1 }, id_editable, odd_inputs }
    }

    pub fn focused(&self) -> FormField {
        FormField::ORDER[self.focus]
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % FormField::ORDER.len();
        if !self.id_editable && self.focused() == FormField::MatchId {
            self.next_field();
        }
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + FormField::ORDER.len() - 1) % FormField::ORDER.len();
        if !self.id_editable && self.focused() == FormField::MatchId {
            self.prev_field();
        }
    }

    pub fn push_char(&mut self, c: char) {
        match self.focused() {
            FormField::Sport => {}
            FormField::Odd(spec) => {
                let input = &mut self.odd_inputs[odd_slot(spec)];
                if c.is_ascii_digit() || (c == '.' && !input.contains('.')) {
                    input.push(c);
                    self.commit_odd(spec);
                }
            }
            field => {
                if let Some(text) = self.text_mut(field) {
                    text.push(c);
                }
            }
        }
    }

    pub fn pop_char(&mut self) {
        match self.focused() {
            FormField::Sport => {}
            FormField::Odd(spec) => {
                self.odd_inputs[odd_slot(spec)].pop();
                self.commit_odd(spec);
            }
            field => {
                if let Some(text) = self.text_mut(field) {
                    text.pop();
                }
            }
        }
    }

    pub fn cycle_sport(&mut self) {
        if self.focused() == FormField::Sport {
            self.draft.sport = self.draft.sport.next();
        }
    }

    /// Display text for a field.
    pub fn field_text(&self, field: FormField) -> String {
        match field {
            FormField::MatchId => self.draft.match_id.clone(),
            FormField::Description => self.draft.description.clone(),
            FormField::MatchDate => self.draft.match_date.clone(),
            FormField::MatchTime => self.draft.match_time.clone(),
            FormField::TeamA => self.draft.team_a.clone(),
            FormField::TeamB => self.draft.team_b.clone(),
            FormField::Sport => self.draft.sport.label().to_string(),
            FormField::Odd(spec) => self.odd_inputs[odd_slot(spec)].clone(),
        }
    }

    /// First odds field whose text is not a number, if any.
    pub fn invalid_odd(&self) -> Option<Specifier> {
        Specifier::ALL.into_iter().find(|spec| {
            let input = self.odd_inputs[odd_slot(*spec)].trim();
            !input.is_empty() && input.parse::<f64>().is_err()
        })
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::MatchId if self.id_editable => Some(&mut self.draft.match_id),
            FormField::Description => Some(&mut self.draft.description),
            FormField::MatchDate => Some(&mut self.draft.match_date),
            FormField::MatchTime => Some(&mut self.draft.match_time),
            FormField::TeamA => Some(&mut self.draft.team_a),
            FormField::TeamB => Some(&mut self.draft.team_b),
            _ => None,
        }
    }

    fn commit_odd(&mut self, spec: Specifier) {
        let input = self.odd_inputs[odd_slot(spec)].trim();
        if input.is_empty() {
            self.draft.remove_odd(spec);
        } else if let Ok(value) = input.parse::<f64>() {
            self.draft.set_odd_value(spec, value);
        }
    }
}

fn odd_slot(spec: Specifier) -> usize {
    match spec {
        Specifier::Win => 0,
        Specifier::Draw => 1,
        Specifier::Lose => 2,
    }
}
