use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use simulado::app::App;
use simulado::config::Config;
use simulado::event::{AppEvent, EventHandler};
use simulado::quiz::QuizStatus;
use simulado::quiz::timer::format_clock;
use simulado::source::bank::QuestionBank;
use simulado::source::remote::RemoteGenerator;
use simulado::ui::components::ad_modal::AdModal;
use simulado::ui::components::confirm_dialog::ConfirmDialog;
use simulado::ui::components::progress_bar::ProgressBar;
use simulado::ui::components::question_card::QuestionCard;
use simulado::ui::components::result_screen::ResultScreen;
use simulado::ui::layout::{AppLayout, centered_rect, pack_hint_lines, question_hints};

#[derive(Parser)]
#[command(name = "simulado", version, about = "Simulado da prova teórica do DETRAN no terminal")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Questions between ad breaks (0 disables ads)")]
    ad_frequency: Option<usize>,

    #[arg(short, long, help = "Exam duration in minutes")]
    minutes: Option<u32>,

    #[arg(short, long, help = "Path to a JSON question bank")]
    bank: Option<PathBuf>,

    #[arg(long, help = "Number of questions to request from the generator")]
    ai_count: Option<usize>,

    #[arg(long, help = "Write the effective settings to the config file and exit")]
    save_config: bool,
}

fn init_logging() -> Result<()> {
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("simulado");
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let log_path = dir.join("simulado.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;

    let filter = EnvFilter::try_from_env("SIMULADO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    // The terminal belongs to the TUI, so logs only ever go to the file.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = init_logging() {
        eprintln!("Warning: logging disabled: {err:?}");
    }

    let mut config = Config::load().unwrap_or_else(|err| {
        error!(error = %err, "config unreadable, using defaults");
        Config::default()
    });
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(freq) = cli.ad_frequency {
        config.ad_frequency = freq;
    }
    if let Some(minutes) = cli.minutes {
        config.session_duration_secs = minutes.saturating_mul(60);
    }
    if let Some(count) = cli.ai_count {
        config.ai_question_count = count;
    }
    if let Some(ref bank) = cli.bank {
        config.bank_path = Some(bank.display().to_string());
    }
    config.normalize();

    if cli.save_config {
        config.save()?;
        info!(path = %Config::config_path().display(), "config saved");
        println!("Configuração salva em {}", Config::config_path().display());
        return Ok(());
    }

    let bank_path = config.bank_path.as_ref().map(PathBuf::from);
    let bank = QuestionBank::load(bank_path.as_deref())?;
    info!(questions = bank.len(), "question bank loaded");

    let generator = RemoteGenerator::from_env(config.generator.clone(), config.ai_question_count);
    let events = EventHandler::new(Duration::from_millis(100));

    let mut app = App::new(
        config,
        bank,
        Arc::new(generator),
        events.sender(),
        SmallRng::from_entropy(),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!(error = ?err, "event loop failed");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => {
                // Expire the exam before a late key can act on it.
                app.on_tick(Instant::now());
                handle_key(app, key);
            }
            AppEvent::Tick => app.on_tick(Instant::now()),
            AppEvent::Generated(done) => app.on_generated(done, Instant::now()),
            AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            info!("quitting");
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.session.status() {
        QuizStatus::Idle => handle_menu_key(app, key),
        QuizStatus::LoadingAi => {
            if key.code == KeyCode::Esc {
                app.request_exit();
            }
        }
        QuizStatus::Playing => handle_playing_key(app, key),
        QuizStatus::PausedForAd => handle_ad_key(app, key),
        QuizStatus::Finished => handle_result_key(app, key),
        QuizStatus::Review => handle_review_key(app, key),
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    let now = Instant::now();
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => {
            app.session.dismiss_error();
            app.menu.prev();
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.session.dismiss_error();
            app.menu.next();
        }
        KeyCode::Enter => app.activate_menu(now),
        KeyCode::Char(ch) => {
            if let Some(action) = app.menu.action_for_key(ch) {
                app.run_menu_action(action, now);
            }
        }
        _ => {}
    }
}

fn option_for_key(ch: char) -> Option<usize> {
    match ch.to_ascii_lowercase() {
        'a' | '1' => Some(0),
        'b' | '2' => Some(1),
        'c' | '3' => Some(2),
        'd' | '4' => Some(3),
        _ => None,
    }
}

fn handle_playing_key(app: &mut App, key: KeyEvent) {
    // Exit confirmation takes priority
    if app.session.is_confirming_exit() {
        match key.code {
            KeyCode::Char('s') | KeyCode::Char('y') => app.confirm_exit(),
            KeyCode::Char('n') | KeyCode::Esc => app.cancel_exit(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.request_exit();
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_prev_option(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_option(),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char(' ') => {
            app.advance(Instant::now());
        }
        KeyCode::Backspace | KeyCode::Left => {
            app.go_back();
        }
        KeyCode::Char(ch) => {
            if let Some(option) = option_for_key(ch) {
                app.select_option(option);
            }
        }
        _ => {}
    }
}

fn handle_ad_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.dismiss_ad(Instant::now());
        }
        KeyCode::Esc => {
            app.request_exit();
        }
        _ => {}
    }
}

fn handle_result_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => {
            app.review();
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            app.request_exit();
        }
        _ => {}
    }
}

fn handle_review_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Right | KeyCode::Char(' ') => {
            app.advance(Instant::now());
        }
        KeyCode::Backspace | KeyCode::Left => {
            app.go_back();
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            app.request_exit();
        }
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, frame.area());

    match app.session.status() {
        QuizStatus::Idle => render_menu(frame, app),
        QuizStatus::LoadingAi => render_loading(frame, app),
        QuizStatus::Playing | QuizStatus::PausedForAd | QuizStatus::Review => {
            render_question(frame, app)
        }
        QuizStatus::Finished => render_result(frame, app),
    }
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let menu_area = centered_rect(50, 70, 56, 18, layout[0]);
    frame.render_widget(app.menu.view(app.session.error()), menu_area);

    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " [↑↓] Navegar  [Enter] Iniciar  [q/Esc] Sair ",
        Style::default().fg(colors.text_muted()),
    )]));
    frame.render_widget(footer, layout[1]);
}

fn render_loading(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let area = centered_rect(50, 30, 44, 7, frame.area());

    let block = Block::bordered()
        .title(" Simulado com IA ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Gerando questões inéditas...",
            Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "[Esc] Cancelar",
            Style::default().fg(colors.text_muted()),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(block),
        area,
    );
}

fn render_question(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let session = &app.session;
    let reviewing = session.status() == QuizStatus::Review;

    let hints = question_hints(reviewing, session.is_last_question());
    let hint_lines = pack_hint_lines(&hints, area.width as usize);
    let app_layout = AppLayout::new(area, hint_lines.len() as u16);

    let total = session.questions().len();
    let index = session.current_index();
    let header_text = if reviewing {
        let score = session.score();
        format!(
            " Revisão | {}/{} | {} de {} corretas",
            index + 1,
            total,
            score.correct,
            score.total
        )
    } else {
        format!(" Simulado DETRAN | {}/{}", index + 1, total)
    };
    let clock = format!("{} ", format_clock(session.timer().remaining_secs()));
    let clock_style = if app.is_low_time() {
        Style::default()
            .fg(colors.warning())
            .bg(colors.header_bg())
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(colors.header_fg()).bg(colors.header_bg())
    };
    let header_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(clock.chars().count() as u16)])
        .split(app_layout.header);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            &*header_text,
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        )))
        .style(Style::default().bg(colors.header_bg())),
        header_cols[0],
    );
    if !reviewing {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(&*clock, clock_style)))
                .style(Style::default().bg(colors.header_bg())),
            header_cols[1],
        );
    }

    let show_bar = !reviewing && app_layout.tier.show_time_bar(area.height);
    let mut constraints = vec![Constraint::Min(5)];
    if show_bar {
        constraints.push(Constraint::Length(3));
    }
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(app_layout.main);

    if let Some(question) = session.current_question() {
        let choice = if reviewing {
            session.answers().get(index).copied().flatten()
        } else {
            session.selection()
        };
        let card = QuestionCard::new(question, index, total, app.theme)
            .choice(choice)
            .revealed(reviewing);
        frame.render_widget(card, main_layout[0]);
    }

    if show_bar {
        let timer = session.timer();
        let bar = ProgressBar::new(
            "Tempo restante",
            format_clock(timer.remaining_secs()),
            timer.remaining_ratio(),
            app.theme,
        )
        .warning(app.is_low_time());
        frame.render_widget(bar, main_layout[1]);
    }

    let footer_lines: Vec<Line> = hint_lines
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_muted()))))
        .collect();
    frame.render_widget(Paragraph::new(footer_lines), app_layout.footer);

    if let Some(ad) = session.ad_break() {
        let popup = centered_rect(50, 40, 40, 9, area);
        let secs_left = ad.secs_until_dismiss(Instant::now());
        frame.render_widget(AdModal::new(secs_left, app.theme), popup);
    }

    if session.is_confirming_exit() {
        let popup = centered_rect(40, 25, 44, 7, area);
        frame.render_widget(
            ConfirmDialog::new("Deseja sair do simulado? O progresso será perdido.", app.theme),
            popup,
        );
    }
}

fn render_result(frame: &mut ratatui::Frame, app: &App) {
    let area = centered_rect(60, 60, 50, 15, frame.area());
    let score = app.session.score();
    let screen = ResultScreen::new(&score, app.session.settings().pass_threshold, app.theme);
    frame.render_widget(screen, area);
}
