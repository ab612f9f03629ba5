use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{clip, AppContent, AppRequest, ShellProps};
use crate::config::WALLPAPERS;
use crate::ui::{dim_style, normal_style, sel_style, title_style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    System,
    Personalization,
}

/// Wallpaper picker. The chosen index is written through the shared
/// [`ShellProps`] handle; the desktop picks it up on the next frame.
#[derive(Debug, Clone)]
pub struct SettingsApp {
    props: ShellProps,
    tab: Tab,
    selected: usize,
}

impl SettingsApp {
    pub fn new(props: ShellProps) -> Self {
        let selected = props.wallpaper().min(WALLPAPERS.len() - 1);
        Self {
            props,
            tab: Tab::Personalization,
            selected,
        }
    }

    fn apply(&mut self) {
        tracing::debug!(wallpaper = WALLPAPERS[self.selected].0, "wallpaper picked");
        self.props.set_wallpaper(self.selected);
    }
}

impl AppContent for SettingsApp {
    fn render(&self, f: &mut Frame, area: Rect, focused: bool) {
        let width = area.width as usize;
        let tab_style = |tab: Tab| if self.tab == tab { sel_style() } else { dim_style() };
        let mut lines = vec![
            Line::from(vec![
                Span::styled(" System ", tab_style(Tab::System)),
                Span::raw(" "),
                Span::styled(" Personalization ", tab_style(Tab::Personalization)),
            ]),
            Line::from(Span::styled("-".repeat(width), dim_style())),
        ];

        match self.tab {
            Tab::System => {
                lines.push(Line::from(Span::styled("System", title_style())));
                lines.push(Line::from(Span::styled(
                    format!("deskshell {}", env!("CARGO_PKG_VERSION")),
                    normal_style(),
                )));
                lines.push(Line::from(Span::styled(
                    format!("{} / {}", std::env::consts::OS, std::env::consts::ARCH),
                    normal_style(),
                )));
            }
            Tab::Personalization => {
                lines.push(Line::from(Span::styled("Background", title_style())));
                let current = self.props.wallpaper();
                for (i, (name, glyph, color)) in WALLPAPERS.iter().enumerate() {
                    let marker = if i == current { "(*)" } else { "( )" };
                    let style = if i == self.selected && focused {
                        sel_style()
                    } else {
                        normal_style()
                    };
                    lines.push(Line::from(vec![
                        Span::styled(clip(&format!("{marker} {name:<14}"), width), style),
                        Span::styled(glyph.to_string().repeat(6), Style::default().fg(*color)),
                    ]));
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "[Up/Down] choose  [Enter] apply  [Tab] switch page",
                    dim_style(),
                )));
            }
        }
        f.render_widget(Paragraph::new(lines), area);
    }

    fn handle_key(&mut self, key: KeyEvent) -> AppRequest {
        match key.code {
            KeyCode::Tab => {
                self.tab = match self.tab {
                    Tab::System => Tab::Personalization,
                    Tab::Personalization => Tab::System,
                }
            }
            KeyCode::Up if self.tab == Tab::Personalization => {
                self.selected = self.selected.saturating_sub(1)
            }
            KeyCode::Down if self.tab == Tab::Personalization => {
                self.selected = (self.selected + 1).min(WALLPAPERS.len() - 1)
            }
            KeyCode::Enter if self.tab == Tab::Personalization => self.apply(),
            _ => {}
        }
        AppRequest::None
    }

    /// Row 0 holds the tabs, wallpaper rows start at 3.
    fn handle_click(&mut self, col: u16, row: u16) -> AppRequest {
        if row == 0 {
            self.tab = if col < 9 { Tab::System } else { Tab::Personalization };
        } else if self.tab == Tab::Personalization {
            if let Some(idx) = (row as usize).checked_sub(3) {
                if idx < WALLPAPERS.len() {
                    self.selected = idx;
                    self.apply();
                }
            }
        }
        AppRequest::None
    }
}
