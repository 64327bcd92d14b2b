use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::quiz::Question;
use crate::quiz::question::option_letter;
use crate::ui::theme::Theme;

/// How a single option is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionMark {
    Plain,
    /// The pending choice while playing.
    Selected,
    /// The right answer, shown in review.
    Correct,
    /// The player's wrong answer, shown in review.
    WrongPick,
}

/// Mark each option. `revealed` is true in review, where `choice` is the
/// committed answer instead of the pending selection.
pub fn option_marks(question: &Question, choice: Option<usize>, revealed: bool) -> Vec<OptionMark> {
    (0..question.options.len())
        .map(|i| {
            if revealed {
                if i == question.correct_answer {
                    OptionMark::Correct
                } else if choice == Some(i) {
                    OptionMark::WrongPick
                } else {
                    OptionMark::Plain
                }
            } else if choice == Some(i) {
                OptionMark::Selected
            } else {
                OptionMark::Plain
            }
        })
        .collect()
}

pub struct QuestionCard<'a> {
    question: &'a Question,
    index: usize,
    total: usize,
    choice: Option<usize>,
    revealed: bool,
    theme: &'a Theme,
}

impl<'a> QuestionCard<'a> {
    pub fn new(question: &'a Question, index: usize, total: usize, theme: &'a Theme) -> Self {
        Self {
            question,
            index,
            total,
            choice: None,
            revealed: false,
            theme,
        }
    }

    pub fn choice(mut self, choice: Option<usize>) -> Self {
        self.choice = choice;
        self
    }

    pub fn revealed(mut self, revealed: bool) -> Self {
        self.revealed = revealed;
        self
    }
}

impl Widget for QuestionCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let marks = option_marks(self.question, self.choice, self.revealed);

        let mut lines: Vec<Line> = vec![
            Line::from(Span::styled(
                self.question.category_label().to_uppercase(),
                Style::default().fg(colors.accent()),
            )),
            Line::from(""),
            Line::from(Span::styled(
                self.question.text.as_str(),
                Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];

        for (i, (option, mark)) in self.question.options.iter().zip(&marks).enumerate() {
            let letter = option_letter(i);
            let (style, suffix) = match mark {
                OptionMark::Plain => (Style::default().fg(colors.fg()), ""),
                OptionMark::Selected => (
                    Style::default()
                        .fg(colors.option_selected_fg())
                        .bg(colors.option_selected_bg())
                        .add_modifier(Modifier::BOLD),
                    "",
                ),
                OptionMark::Correct => (
                    Style::default()
                        .fg(colors.correct())
                        .add_modifier(Modifier::BOLD),
                    "  \u{2713}",
                ),
                OptionMark::WrongPick => (
                    Style::default()
                        .fg(colors.incorrect())
                        .add_modifier(Modifier::CROSSED_OUT),
                    "  \u{2717}",
                ),
            };
            lines.push(Line::from(Span::styled(
                format!(" {letter}) {option}{suffix}"),
                style,
            )));
            lines.push(Line::from(""));
        }

        if self.revealed {
            if self.choice.is_none() {
                lines.push(Line::from(Span::styled(
                    " Você não respondeu esta questão.",
                    Style::default().fg(colors.warning()),
                )));
            }
            if let Some(ref explanation) = self.question.explanation {
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    Span::styled(
                        " Explicação: ",
                        Style::default()
                            .fg(colors.accent())
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(explanation.as_str(), Style::default().fg(colors.fg())),
                ]));
            }
        }

        let title = format!(" Questão {} de {} ", self.index + 1, self.total);
        let border = if self.revealed {
            colors.border()
        } else {
            colors.border_focused()
        };
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
