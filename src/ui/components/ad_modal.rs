use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};

use crate::ui::theme::Theme;

/// The interstitial shown between question blocks. The content itself is
/// opaque; only the dismiss countdown matters.
pub struct AdModal<'a> {
    secs_left: u64,
    theme: &'a Theme,
}

impl<'a> AdModal<'a> {
    pub fn new(secs_left: u64, theme: &'a Theme) -> Self {
        Self { secs_left, theme }
    }
}

impl Widget for AdModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Clear.render(area, buf);

        let block = Block::bordered()
            .title(" Publicidade ")
            .border_style(Style::default().fg(colors.accent_dim()))
            .style(Style::default().bg(colors.bg()));

        let footer = if self.secs_left == 0 {
            Line::from(Span::styled(
                "[Enter] Continuar simulado",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(
                format!("Aguarde {}s para continuar", self.secs_left),
                Style::default().fg(colors.text_muted()),
            ))
        };

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Intervalo",
                Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "O cronômetro está pausado.",
                Style::default().fg(colors.text_muted()),
            )),
            Line::from(""),
            footer,
        ];

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block)
            .render(area, buf);
    }
}
