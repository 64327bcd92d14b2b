use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::app::Capabilities;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    StartStandard,
    StartAi,
    Quit,
}

pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub description: String,
    pub action: MenuAction,
}

pub struct Menu<'a> {
    pub items: Vec<MenuItem>,
    pub selected: usize,
    /// Shown under the title when sessions carry ad breaks.
    pub notice: Option<String>,
    pub theme: &'a Theme,
}

/// The menu together with the message left by the last failed start.
pub struct MenuView<'m> {
    menu: &'m Menu<'m>,
    error: Option<&'m str>,
}

impl<'a> Menu<'a> {
    /// Entries depend on what is usable: the generated exam only shows up
    /// when a generator is available.
    pub fn new(theme: &'a Theme, capabilities: Capabilities, standard_len: usize) -> Self {
        let mut items = vec![MenuItem {
            key: "1".to_string(),
            label: "Simulado Padrão".to_string(),
            description: format!(
                "{standard_len} questões do banco oficial, distribuídas como na prova"
            ),
            action: MenuAction::StartStandard,
        }];
        if capabilities.ai_available {
            items.push(MenuItem {
                key: "2".to_string(),
                label: "Simulado com IA".to_string(),
                description: "Questões inéditas geradas na hora".to_string(),
                action: MenuAction::StartAi,
            });
        }
        items.push(MenuItem {
            key: "q".to_string(),
            label: "Sair".to_string(),
            description: String::new(),
            action: MenuAction::Quit,
        });

        let notice = capabilities
            .ads_enabled
            .then(|| "A prova é pausada por intervalos comerciais.".to_string());

        Self {
            items,
            selected: 0,
            notice,
            theme,
        }
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len() - 1;
        }
    }

    pub fn selected_action(&self) -> Option<MenuAction> {
        self.items.get(self.selected).map(|i| i.action)
    }

    pub fn action_for_key(&self, key: char) -> Option<MenuAction> {
        self.items
            .iter()
            .find(|i| i.key.chars().eq(std::iter::once(key)))
            .map(|i| i.action)
    }

    pub fn view<'m>(&'m self, error: Option<&'m str>) -> MenuView<'m> {
        MenuView { menu: self, error }
    }
}

impl Widget for MenuView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let menu = self.menu;
        let colors = &menu.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let mut title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Simulado DETRAN",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Prova teórica de legislação de trânsito",
                Style::default().fg(colors.fg()),
            )),
        ];
        match menu.notice {
            Some(ref notice) => title_lines.push(Line::from(Span::styled(
                notice.as_str(),
                Style::default().fg(colors.text_muted()),
            ))),
            None => title_lines.push(Line::from("")),
        }

        let title = Paragraph::new(title_lines).alignment(Alignment::Center);
        title.render(layout[0], buf);

        let menu_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                menu.items
                    .iter()
                    .map(|_| Constraint::Length(3))
                    .collect::<Vec<_>>(),
            )
            .split(layout[2]);

        for (i, item) in menu.items.iter().enumerate() {
            let is_selected = i == menu.selected;
            let indicator = if is_selected { ">" } else { " " };

            let label_text = format!(" {indicator} [{key}] {label}", key = item.key, label = item.label);
            let desc_text = format!("     {}", item.description);

            let lines = vec![
                Line::from(Span::styled(
                    &*label_text,
                    Style::default()
                        .fg(if is_selected {
                            colors.accent()
                        } else {
                            colors.fg()
                        })
                        .add_modifier(if is_selected {
                            Modifier::BOLD
                        } else {
                            Modifier::empty()
                        }),
                )),
                Line::from(Span::styled(
                    &*desc_text,
                    Style::default().fg(colors.text_muted()),
                )),
            ];

            let p = Paragraph::new(lines);
            if i < menu_layout.len() {
                p.render(menu_layout[i], buf);
            }
        }

        if let Some(error) = self.error {
            let p = Paragraph::new(Line::from(Span::styled(
                format!(" {error}"),
                Style::default().fg(colors.error()),
            )))
            .wrap(Wrap { trim: true });
            p.render(layout[3], buf);
        }
    }
}
