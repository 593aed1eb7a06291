use tui::layout::{Constraint, Flex, Layout, Rect, Size};

pub const HEADER_HEIGHT: u16 = 3;
pub const FOOTER_HEIGHT: u16 = 3;
const LOG_PANE_HEIGHT: u16 = 10;

/// Pre-computed layout areas for the main draw loop.
pub struct LayoutAreas {
    pub header: [Rect; 2],
    pub main: Rect,
    pub footer: Rect,
    pub logs: Rect,
}

impl LayoutAreas {
    pub fn new(size: Size) -> Self {
        let rect = Rect::new(0, 0, size.width, size.height);
        Self::from_rect(rect, false)
    }

    pub fn update(&mut self, area: Rect, show_logs: bool) {
        *self = Self::from_rect(area, show_logs);
    }

    fn from_rect(area: Rect, show_logs: bool) -> Self {
        let log_height = if show_logs { LOG_PANE_HEIGHT } else { 0 };
        let [header, main, logs, footer] = Layout::vertical([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Fill(1),
            Constraint::Length(log_height),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .areas(area);

        LayoutAreas {
            header: Self::split_header(header),
            main,
            footer,
            logs,
        }
    }

    fn split_header(area: Rect) -> [Rect; 2] {
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area)
    }
}

/// Rectangle of `width` x `height` cells centered in `area`, clipped to it.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_pane_only_takes_space_when_shown() {
        let area = Rect::new(0, 0, 100, 40);
        let hidden = LayoutAreas::from_rect(area, false);
        assert_eq!(hidden.logs.height, 0);
        assert_eq!(hidden.main.height, 40 - HEADER_HEIGHT - FOOTER_HEIGHT);

        let shown = LayoutAreas::from_rect(area, true);
        assert_eq!(shown.logs.height, LOG_PANE_HEIGHT);
        assert_eq!(shown.footer.y, 40 - FOOTER_HEIGHT);
    }

    #[test]
    fn centered_rect_is_clipped() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered(area, 50, 4);
        assert_eq!(rect.width, 20);
        assert_eq!(rect.height, 4);
        assert_eq!(rect.y, 3);
    }
}
