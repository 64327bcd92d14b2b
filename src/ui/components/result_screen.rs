use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::quiz::score::Score;
use crate::ui::theme::Theme;

pub struct ResultScreen<'a> {
    pub score: &'a Score,
    pub pass_threshold: u32,
    pub theme: &'a Theme,
}

impl<'a> ResultScreen<'a> {
    pub fn new(score: &'a Score, pass_threshold: u32, theme: &'a Theme) -> Self {
        Self {
            score,
            pass_threshold,
            theme,
        }
    }
}

impl Widget for ResultScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let verdict_color = if self.score.passed {
            colors.success()
        } else {
            colors.error()
        };

        let block = Block::bordered()
            .title(" Simulado Finalizado ")
            .border_style(Style::default().fg(verdict_color))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let verdict = if self.score.passed {
            "APROVADO"
        } else {
            "REPROVADO"
        };
        Paragraph::new(Line::from(Span::styled(
            verdict,
            Style::default()
                .fg(verdict_color)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(layout[0], buf);

        let pct_line = Line::from(vec![Span::styled(
            format!("{}%", self.score.percentage),
            Style::default()
                .fg(verdict_color)
                .add_modifier(Modifier::BOLD),
        )]);
        let detail_line = Line::from(Span::styled(
            format!(
                "{} de {} questões corretas",
                self.score.correct, self.score.total
            ),
            Style::default().fg(colors.fg()),
        ));
        Paragraph::new(vec![pct_line, detail_line])
            .alignment(Alignment::Center)
            .render(layout[1], buf);

        Paragraph::new(Line::from(Span::styled(
            format!("Mínimo para aprovação: {}%", self.pass_threshold),
            Style::default().fg(colors.text_muted()),
        )))
        .alignment(Alignment::Center)
        .render(layout[2], buf);

        Paragraph::new(Line::from(Span::styled(
            self.score.share_text(),
            Style::default().fg(colors.accent()),
        )))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(layout[3], buf);

        Paragraph::new(Line::from(vec![
            Span::styled("  [r] Revisar respostas  ", Style::default().fg(colors.accent())),
            Span::styled("[Esc/q] Início", Style::default().fg(colors.accent())),
        ]))
        .render(layout[5], buf);
    }
}
