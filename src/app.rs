use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::event::AppEvent;
use crate::quiz::{Advance, ExitRequest, QuizSession, QuizStatus};
use crate::source::QuestionSource;
use crate::source::bank::QuestionBank;
use crate::source::job::{DEADLINE_GRACE, GenerationDone, GenerationJob};
use crate::source::remote::{GenerateError, QuestionGenerator};
use crate::source::sampler::StandardSampler;
use crate::ui::components::menu::{Menu, MenuAction};
use crate::ui::theme::Theme;

/// What the start screen may offer, decided once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub ai_available: bool,
    pub ads_enabled: bool,
}

impl Capabilities {
    pub fn detect(config: &Config, generator: &dyn QuestionGenerator) -> Self {
        Self {
            ai_available: generator.is_available(),
            ads_enabled: config.ad_frequency > 0,
        }
    }
}

pub struct App {
    pub session: QuizSession,
    pub config: Config,
    pub theme: &'static Theme,
    pub menu: Menu<'static>,
    pub capabilities: Capabilities,
    pub should_quit: bool,
    sampler: StandardSampler,
    generator: Arc<dyn QuestionGenerator>,
    generation: Option<GenerationJob>,
    next_job_id: u64,
    events: mpsc::Sender<AppEvent>,
}

impl App {
    pub fn new(
        config: Config,
        bank: QuestionBank,
        generator: Arc<dyn QuestionGenerator>,
        events: mpsc::Sender<AppEvent>,
        rng: SmallRng,
    ) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let capabilities = Capabilities::detect(&config, generator.as_ref());
        let menu = Menu::new(theme, capabilities, config.standard_session_len());
        let sampler = StandardSampler::new(bank, config.pools.clone(), config.flat_count, rng);
        let session = QuizSession::new(config.session_settings());

        info!(
            bank = sampler.bank().len(),
            ai = capabilities.ai_available,
            ads = capabilities.ads_enabled,
            "app initialised"
        );

        Self {
            session,
            config,
            theme,
            menu,
            capabilities,
            should_quit: false,
            sampler,
            generator,
            generation: None,
            next_job_id: 1,
            events,
        }
    }

    /// Run whatever the highlighted menu entry stands for.
    pub fn activate_menu(&mut self, now: Instant) {
        if let Some(action) = self.menu.selected_action() {
            self.run_menu_action(action, now);
        }
    }

    pub fn run_menu_action(&mut self, action: MenuAction, now: Instant) {
        match action {
            MenuAction::StartStandard => self.start_standard(now),
            MenuAction::StartAi => {
                self.start_ai(now);
            }
            MenuAction::Quit => self.should_quit = true,
        }
    }

    pub fn start_standard(&mut self, now: Instant) {
        if self.session.status() != QuizStatus::Idle {
            return;
        }
        let questions = self.sampler.draw();
        if let Err(err) = self.session.start(questions, now) {
            warn!(%err, "could not start standard session");
            self.session
                .set_error("Nenhuma questão disponível no banco de questões.");
        }
    }

    /// Kick off a background generation. Returns false when generation is
    /// unavailable or a session is already running.
    pub fn start_ai(&mut self, now: Instant) -> bool {
        if !self.capabilities.ai_available {
            debug!("ai session requested without a usable generator");
            return false;
        }
        if !self.session.begin_loading() {
            return false;
        }

        let id = self.next_job_id;
        self.next_job_id += 1;
        let deadline = self.generation_deadline();
        let mut source = Arc::clone(&self.generator);
        let tx = self.events.clone();

        info!(job_id = id, "starting question generation");
        self.generation = Some(GenerationJob::spawn(
            id,
            deadline,
            now,
            move || Ok(source.draw()),
            move |done| {
                let _ = tx.send(AppEvent::Generated(done));
            },
        ));
        true
    }

    fn generation_deadline(&self) -> Duration {
        self.config.generator.timeout() + DEADLINE_GRACE
    }

    pub fn generation_in_flight(&self) -> bool {
        self.generation.is_some()
    }

    pub fn on_generated(&mut self, done: GenerationDone, now: Instant) {
        let current = self.generation.as_ref().map(GenerationJob::id);
        if current != Some(done.job_id) {
            debug!(job_id = done.job_id, "dropping stale generation result");
            return;
        }
        self.generation = None;
        self.session.finish_loading(done.outcome, now);
    }

    pub fn on_tick(&mut self, now: Instant) {
        if let Some(job) = &self.generation {
            if job.is_overdue(now) {
                warn!(job_id = job.id(), "generation exceeded its deadline");
                job.cancel();
                self.generation = None;
                self.session
                    .finish_loading::<GenerateError>(Err(GenerateError::TimedOut), now);
            }
        }
        self.session.tick(now);
    }

    pub fn select_option(&mut self, option: usize) {
        self.session.select(option);
    }

    pub fn select_next_option(&mut self) {
        let Some(question) = self.session.current_question() else {
            return;
        };
        let count = question.options.len();
        if count == 0 {
            return;
        }
        let next = match self.session.selection() {
            Some(i) => (i + 1) % count,
            None => 0,
        };
        self.session.select(next);
    }

    pub fn select_prev_option(&mut self) {
        let Some(question) = self.session.current_question() else {
            return;
        };
        let count = question.options.len();
        if count == 0 {
            return;
        }
        let prev = match self.session.selection() {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        };
        self.session.select(prev);
    }

    pub fn advance(&mut self, now: Instant) -> Advance {
        self.session.advance(now)
    }

    pub fn go_back(&mut self) -> bool {
        self.session.go_back()
    }

    pub fn review(&mut self) -> bool {
        self.session.review()
    }

    pub fn dismiss_ad(&mut self, now: Instant) -> bool {
        self.session.dismiss_ad(now)
    }

    /// Leaving while a batch is generating cancels it; its result will be
    /// dropped when it arrives.
    pub fn request_exit(&mut self) -> ExitRequest {
        if let Some(job) = self.generation.take() {
            info!(job_id = job.id(), "cancelling question generation");
            job.cancel();
        }
        self.session.request_exit()
    }

    pub fn confirm_exit(&mut self) {
        self.session.confirm_exit();
    }

    pub fn cancel_exit(&mut self) {
        self.session.cancel_exit();
    }

    pub fn is_low_time(&self) -> bool {
        self.session.status() == QuizStatus::Playing
            && self.session.timer().remaining_secs() <= self.config.low_time_warning_secs
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::quiz::Question;
    use crate::quiz::question::sample;

    struct Stub {
        available: bool,
        outcome: fn() -> Result<Vec<Question>, GenerateError>,
    }

    impl QuestionGenerator for Stub {
        fn try_generate(&self) -> Result<Vec<Question>, GenerateError> {
            (self.outcome)()
        }

        fn is_available(&self) -> bool {
            self.available
        }
    }

    fn two_questions() -> Result<Vec<Question>, GenerateError> {
        Ok(vec![sample(1, "Legislação", 0), sample(2, "Mecânica", 1)])
    }

    fn failing() -> Result<Vec<Question>, GenerateError> {
        Err(GenerateError::EmptyResponse)
    }

    fn app_with(stub: Stub) -> (App, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        let bank = QuestionBank::from_questions(
            (0..40)
                .map(|i| sample(i, if i % 2 == 0 { "Legislação" } else { "Direção Defensiva" }, 0))
                .collect(),
        );
        let app = App::new(
            Config::default(),
            bank,
            Arc::new(stub),
            tx,
            SmallRng::seed_from_u64(7),
        );
        (app, rx)
    }

    fn wait_generated(rx: &mpsc::Receiver<AppEvent>) -> GenerationDone {
        loop {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                AppEvent::Generated(done) => return done,
                _ => continue,
            }
        }
    }

    #[test]
    fn capabilities_follow_generator_and_config() {
        let (app, _rx) = app_with(Stub {
            available: false,
            outcome: failing,
        });
        assert!(!app.capabilities.ai_available);
        assert!(app.capabilities.ads_enabled);
    }

    #[test]
    fn standard_start_begins_playing() {
        let (mut app, _rx) = app_with(Stub {
            available: false,
            outcome: failing,
        });
        app.start_standard(Instant::now());
        assert_eq!(app.session.status(), QuizStatus::Playing);
        assert!(!app.session.questions().is_empty());
    }

    #[test]
    fn empty_bank_reports_error_and_stays_idle() {
        let (tx, _rx) = mpsc::channel();
        let mut app = App::new(
            Config::default(),
            QuestionBank::default(),
            Arc::new(Stub {
                available: false,
                outcome: failing,
            }),
            tx,
            SmallRng::seed_from_u64(1),
        );
        app.start_standard(Instant::now());
        assert_eq!(app.session.status(), QuizStatus::Idle);
        assert!(app.session.error().is_some());
    }

    #[test]
    fn ai_unavailable_does_not_load() {
        let (mut app, _rx) = app_with(Stub {
            available: false,
            outcome: two_questions,
        });
        assert!(!app.start_ai(Instant::now()));
        assert_eq!(app.session.status(), QuizStatus::Idle);
    }

    #[test]
    fn ai_success_starts_session() {
        let (mut app, rx) = app_with(Stub {
            available: true,
            outcome: two_questions,
        });
        let t0 = Instant::now();
        assert!(app.start_ai(t0));
        assert_eq!(app.session.status(), QuizStatus::LoadingAi);
        let done = wait_generated(&rx);
        app.on_generated(done, t0);
        assert_eq!(app.session.status(), QuizStatus::Playing);
        assert_eq!(app.session.questions().len(), 2);
        assert!(!app.generation_in_flight());
    }

    #[test]
    fn ai_failure_returns_to_idle_with_message() {
        let (mut app, rx) = app_with(Stub {
            available: true,
            outcome: failing,
        });
        let t0 = Instant::now();
        app.start_ai(t0);
        let done = wait_generated(&rx);
        app.on_generated(done, t0);
        assert_eq!(app.session.status(), QuizStatus::Idle);
        assert!(app.session.questions().is_empty());
        assert!(app.session.error().is_some());
    }

    #[test]
    fn exit_while_loading_drops_late_result() {
        let (mut app, rx) = app_with(Stub {
            available: true,
            outcome: two_questions,
        });
        let t0 = Instant::now();
        app.start_ai(t0);
        assert_eq!(app.request_exit(), ExitRequest::Exited);
        let done = wait_generated(&rx);
        app.on_generated(done, t0);
        assert_eq!(app.session.status(), QuizStatus::Idle);
        assert!(app.session.error().is_none());
    }

    #[test]
    fn overdue_generation_times_out() {
        let (mut app, _rx) = app_with(Stub {
            available: true,
            outcome: two_questions,
        });
        let t0 = Instant::now();
        app.start_ai(t0);
        let late = t0 + app.generation_deadline() + Duration::from_secs(1);
        app.on_tick(late);
        assert_eq!(app.session.status(), QuizStatus::Idle);
        assert!(app.session.error().is_some());
        assert!(!app.generation_in_flight());
    }

    #[test]
    fn option_cycling_wraps() {
        let (mut app, _rx) = app_with(Stub {
            available: false,
            outcome: failing,
        });
        app.start_standard(Instant::now());
        app.select_prev_option();
        assert_eq!(app.session.selection(), Some(3));
        app.select_next_option();
        assert_eq!(app.session.selection(), Some(0));
    }

    #[test]
    fn low_time_only_while_playing() {
        let (mut app, _rx) = app_with(Stub {
            available: false,
            outcome: failing,
        });
        app.config.low_time_warning_secs = u32::MAX;
        assert!(!app.is_low_time());
        app.start_standard(Instant::now());
        assert!(app.is_low_time());
    }
}
