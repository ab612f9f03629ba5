use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    Terminal,
};

use crate::config::current_theme_color;

pub type Term = Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>;

// ── Color helpers ─────────────────────────────────────────────────────────────

pub fn normal_style()   -> Style { Style::default().fg(current_theme_color()) }
pub fn sel_style()      -> Style { Style::default().fg(Color::Black).bg(current_theme_color()).add_modifier(Modifier::BOLD) }
pub fn title_style()    -> Style { Style::default().fg(current_theme_color()).add_modifier(Modifier::BOLD) }
pub fn dim_style()      -> Style { Style::default().fg(current_theme_color()).add_modifier(Modifier::DIM) }

/// Terminals have no alpha, so anything short of fully opaque is drawn dim.
pub fn fade(buf: &mut Buffer, area: Rect, opacity: f32) {
    if opacity < 1.0 {
        buf.set_style(area, Style::default().add_modifier(Modifier::DIM));
    }
}

// ── Text buffers ──────────────────────────────────────────────────────────────

pub fn write_text(buf: &mut [char], start: usize, text: &str) {
    for (i, ch) in text.chars().enumerate() {
        let idx = start + i;
        if idx >= buf.len() {
            break;
        }
        buf[idx] = ch;
    }
}

pub fn write_text_in_area(buf: &mut [char], area: Rect, x: u16, text: &str) {
    if x < area.x {
        return;
    }
    let start = (x - area.x) as usize;
    write_text(buf, start, text);
}

pub fn point_in_rect(x: u16, y: u16, r: Rect) -> bool {
    x >= r.x && x < r.x.saturating_add(r.width) && y >= r.y && y < r.y.saturating_add(r.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_text_clips_at_buffer_end() {
        let mut buf = vec![' '; 5];
        write_text(&mut buf, 3, "abc");
        assert_eq!(buf.iter().collect::<String>(), "   ab");
    }

    #[test]
    fn write_text_in_area_is_relative() {
        let mut buf = vec!['.'; 4];
        let area = Rect::new(10, 0, 4, 1);
        write_text_in_area(&mut buf, area, 11, "xy");
        write_text_in_area(&mut buf, area, 2, "zz");
        assert_eq!(buf.iter().collect::<String>(), ".xy.");
    }

    #[test]
    fn translucent_areas_are_dimmed() {
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        fade(&mut buf, Rect::new(0, 0, 2, 1), 0.0);
        assert!(buf[(1, 0)].modifier.contains(Modifier::DIM));
        assert!(!buf[(3, 1)].modifier.contains(Modifier::DIM));

        let mut opaque = Buffer::empty(area);
        fade(&mut opaque, area, 1.0);
        assert!(!opaque[(0, 0)].modifier.contains(Modifier::DIM));
    }
}
