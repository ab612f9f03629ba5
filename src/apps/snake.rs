use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use rand::Rng;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{AppContent, AppRequest};
use crate::ui::{dim_style, title_style};

pub const GRID: i32 = 20;
const STEP: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    fn is_opposite(self, other: Dir) -> bool {
        let (ax, ay) = self.delta();
        let (bx, by) = other.delta();
        ax == -bx && ay == -by
    }
}

#[derive(Debug, Clone)]
pub struct Snake {
    body: VecDeque<Cell>,
    food: Cell,
    dir: Dir,
    queued: Dir,
    score: u32,
    over: bool,
    last_step: Instant,
}

impl Snake {
    pub fn new(now: Instant) -> Self {
        Self {
            body: VecDeque::from([Cell { x: 10, y: 10 }]),
            food: Cell { x: 15, y: 15 },
            dir: Dir::Right,
            queued: Dir::Right,
            score: 0,
            over: false,
            last_step: now,
        }
    }

    pub fn restart(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn head(&self) -> Cell {
        self.body.front().copied().unwrap_or(Cell { x: 0, y: 0 })
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    fn steer(&mut self, dir: Dir) {
        // Compared against the last direction actually moved so two quick
        // presses cannot fold the snake back onto itself.
        if !dir.is_opposite(self.dir) {
            self.queued = dir;
        }
    }

    /// Advance one cell.
    pub fn step(&mut self) {
        if self.over {
            return;
        }
        self.dir = self.queued;
        let (dx, dy) = self.dir.delta();
        let head = self.head();
        let next = Cell {
            x: head.x + dx,
            y: head.y + dy,
        };
        let out = next.x < 0 || next.x >= GRID || next.y < 0 || next.y >= GRID;
        if out || self.body.contains(&next) {
            self.over = true;
            return;
        }
        self.body.push_front(next);
        if next == self.food {
            self.score += 1;
            self.food = self.random_free_cell();
        } else {
            self.body.pop_back();
        }
    }

    fn random_free_cell(&self) -> Cell {
        let mut rng = rand::thread_rng();
        loop {
            let cell = Cell {
                x: rng.gen_range(0..GRID),
                y: rng.gen_range(0..GRID),
            };
            if !self.body.contains(&cell) || self.body.len() >= (GRID * GRID) as usize {
                return cell;
            }
        }
    }
}

impl AppContent for Snake {
    fn render(&self, f: &mut Frame, area: Rect, _focused: bool) {
        if area.height == 0 {
            return;
        }
        let mut lines = vec![Line::from(Span::styled(
            format!("Score: {}", self.score),
            title_style(),
        ))];
        for y in 0..GRID {
            let mut spans = Vec::with_capacity(GRID as usize);
            for x in 0..GRID {
                let cell = Cell { x, y };
                if self.body.contains(&cell) {
                    spans.push(Span::styled("██", Style::default().fg(Color::Green)));
                } else if cell == self.food {
                    spans.push(Span::styled("██", Style::default().fg(Color::Red)));
                } else {
                    spans.push(Span::styled("··", dim_style()));
                }
            }
            lines.push(Line::from(spans));
        }
        if self.over {
            lines.push(Line::from(Span::styled("GAME OVER  [r] restart", title_style())));
        }
        f.render_widget(Paragraph::new(lines), area);
    }

    fn handle_key(&mut self, key: KeyEvent) -> AppRequest {
        match key.code {
            KeyCode::Up => self.steer(Dir::Up),
            KeyCode::Down => self.steer(Dir::Down),
            KeyCode::Left => self.steer(Dir::Left),
            KeyCode::Right => self.steer(Dir::Right),
            KeyCode::Char('r') => self.restart(Instant::now()),
            _ => {}
        }
        AppRequest::None
    }

    fn tick(&mut self, now: Instant) {
        if now.duration_since(self.last_step) >= STEP {
            self.last_step = now;
            self.step();
        }
    }
}
