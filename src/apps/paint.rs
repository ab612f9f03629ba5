use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{AppContent, AppRequest};
use crate::ui::{dim_style, sel_style};

const PALETTE: [Color; 8] = [
    Color::White,
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::Black,
];

/// Width of one palette swatch on the toolbar row, e.g. `1██ `.
const SWATCH_W: u16 = 4;

/// Cell canvas. Row 0 is the toolbar; painting starts on row 1.
#[derive(Debug, Clone, Default)]
pub struct Paint {
    cells: HashMap<(u16, u16), Color>,
    color: usize,
}

impl Paint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self) -> Color {
        PALETTE[self.color]
    }

    pub fn painted(&self, col: u16, row: u16) -> Option<Color> {
        self.cells.get(&(col, row)).copied()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    fn dab(&mut self, col: u16, row: u16) {
        if row == 0 {
            return;
        }
        self.cells.insert((col, row - 1), PALETTE[self.color]);
    }

    fn toolbar(&self) -> Line<'static> {
        let mut spans = Vec::new();
        for (i, c) in PALETTE.iter().enumerate() {
            let label = if i == self.color { sel_style() } else { dim_style() };
            spans.push(Span::styled(format!("{}", i + 1), label));
            spans.push(Span::styled("██ ", Style::default().fg(*c)));
        }
        spans.push(Span::styled("[c]lear", dim_style()));
        Line::from(spans)
    }
}

impl AppContent for Paint {
    fn render(&self, f: &mut Frame, area: Rect, _focused: bool) {
        if area.height < 2 {
            return;
        }
        f.render_widget(Paragraph::new(self.toolbar()), Rect { height: 1, ..area });

        let canvas = Rect {
            y: area.y + 1,
            height: area.height - 1,
            ..area
        };
        let lines: Vec<Line> = (0..canvas.height)
            .map(|row| {
                let spans: Vec<Span> = (0..canvas.width)
                    .map(|col| match self.cells.get(&(col, row)) {
                        Some(c) => Span::styled("█", Style::default().fg(*c)),
                        None => Span::raw(" "),
                    })
                    .collect();
                Line::from(spans)
            })
            .collect();
        f.render_widget(Paragraph::new(lines), canvas);
    }

    fn handle_key(&mut self, key: KeyEvent) -> AppRequest {
        match key.code {
            KeyCode::Char('c') => self.clear(),
            KeyCode::Char(d @ '1'..='8') => self.color = (d as usize) - ('1' as usize),
            _ => {}
        }
        AppRequest::None
    }

    fn handle_click(&mut self, col: u16, row: u16) -> AppRequest {
        if row == 0 {
            let swatch = (col / SWATCH_W) as usize;
            if swatch < PALETTE.len() {
                self.color = swatch;
            } else if col >= SWATCH_W * PALETTE.len() as u16 {
                self.clear();
            }
        } else {
            self.dab(col, row);
        }
        AppRequest::None
    }

    fn handle_drag(&mut self, col: u16, row: u16) {
        self.dab(col, row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn click_and_drag_paint_in_current_colour() {
        let mut paint = Paint::new();
        paint.handle_click(3, 2);
        paint.handle_drag(4, 2);
        assert_eq!(paint.painted(3, 1), Some(Color::White));
        assert_eq!(paint.painted(4, 1), Some(Color::White));
        assert_eq!(paint.painted(5, 1), None);
    }

    #[test]
    fn palette_by_key_and_toolbar_click() {
        let mut paint = Paint::new();
        paint.handle_key(KeyEvent::new(KeyCode::Char('2'), KeyModifiers::NONE));
        assert_eq!(paint.color(), Color::Red);
        paint.handle_click(SWATCH_W * 6 + 1, 0);
        assert_eq!(paint.color(), Color::Cyan);
    }

    #[test]
    fn clear_wipes_canvas() {
        let mut paint = Paint::new();
        paint.handle_click(1, 1);
        paint.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE));
        assert_eq!(paint.painted(1, 0), None);
    }
}
