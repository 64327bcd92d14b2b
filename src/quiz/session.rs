use std::fmt::Display;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::quiz::ad::{AdBreak, should_pause_for_ad};
use crate::quiz::question::Question;
use crate::quiz::score::Score;
use crate::quiz::timer::Countdown;

pub const AI_FAILURE_MESSAGE: &str = "Não foi possível gerar questões com IA no momento.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizStatus {
    Idle,
    Playing,
    PausedForAd,
    LoadingAi,
    Finished,
    Review,
}

impl QuizStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QuizStatus::Idle => "idle",
            QuizStatus::Playing => "playing",
            QuizStatus::PausedForAd => "paused_for_ad",
            QuizStatus::LoadingAi => "loading_ai",
            QuizStatus::Finished => "finished",
            QuizStatus::Review => "review",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("cannot start a session with no questions")]
    EmptyQuestionList,
    #[error("cannot start a session while {}", .0.as_str())]
    NotIdle(QuizStatus),
}

/// Per-session tunables, copied out of the app config at construction.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub ad_frequency: usize,
    pub duration_secs: u32,
    pub pass_threshold: u32,
    pub ad_dismiss_after: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ad_frequency: 10,
            duration_secs: 40 * 60,
            pass_threshold: 70,
            ad_dismiss_after: Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the given index.
    Moved(usize),
    /// Answer committed; an ad break now stands between play and this index.
    AdBreak(usize),
    Finished,
    /// Left review and returned to the results screen.
    BackToResults,
    /// Nothing happened (no selection, wrong status, exit pending).
    Blocked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitRequest {
    Exited,
    NeedsConfirmation,
    AlreadyIdle,
}

/// The quiz state machine.
///
/// `selection` is the pending choice for the question on screen. It only
/// reaches `answers` when the player advances forward; backing out of a
/// question drops it.
#[derive(Clone, Debug)]
pub struct QuizSession {
    settings: SessionSettings,
    status: QuizStatus,
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    current: usize,
    selection: Option<usize>,
    timer: Countdown,
    ad: Option<AdBreak>,
    confirming_exit: bool,
    error: Option<String>,
}

impl QuizSession {
    pub fn new(settings: SessionSettings) -> Self {
        let timer = Countdown::new(settings.duration_secs);
        Self {
            settings,
            status: QuizStatus::Idle,
            questions: Vec::new(),
            answers: Vec::new(),
            current: 0,
            selection: None,
            timer,
            ad: None,
            confirming_exit: false,
            error: None,
        }
    }

    pub fn start(&mut self, questions: Vec<Question>, now: Instant) -> Result<(), QuizError> {
        if self.status != QuizStatus::Idle {
            return Err(QuizError::NotIdle(self.status));
        }
        self.begin_playing(questions, now)
    }

    fn begin_playing(&mut self, questions: Vec<Question>, now: Instant) -> Result<(), QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuestionList);
        }
        info!(questions = questions.len(), "session started");
        self.answers = vec![None; questions.len()];
        self.questions = questions;
        self.current = 0;
        self.selection = None;
        self.ad = None;
        self.confirming_exit = false;
        self.error = None;
        self.timer.reset(self.settings.duration_secs);
        self.timer.arm(now);
        self.status = QuizStatus::Playing;
        Ok(())
    }

    /// Enter the loading state while a generated batch is awaited.
    pub fn begin_loading(&mut self) -> bool {
        if self.status != QuizStatus::Idle {
            return false;
        }
        self.error = None;
        self.status = QuizStatus::LoadingAi;
        true
    }

    /// Resolve a pending generation. An error or an empty batch puts the
    /// session back to idle with a user-facing message. Returns true when
    /// play started.
    pub fn finish_loading<E: Display>(
        &mut self,
        outcome: Result<Vec<Question>, E>,
        now: Instant,
    ) -> bool {
        if self.status != QuizStatus::LoadingAi {
            debug!("generation result arrived outside loading state, dropped");
            return false;
        }
        match outcome {
            Ok(questions) if !questions.is_empty() => {
                self.status = QuizStatus::Idle;
                self.begin_playing(questions, now).is_ok()
            }
            Ok(_) => {
                warn!("generator returned no questions");
                self.fail_loading();
                false
            }
            Err(err) => {
                warn!(error = %err, "question generation failed");
                self.fail_loading();
                false
            }
        }
    }

    fn fail_loading(&mut self) {
        self.clear();
        self.error = Some(AI_FAILURE_MESSAGE.to_string());
    }

    pub fn select(&mut self, option: usize) {
        if self.status != QuizStatus::Playing || self.confirming_exit {
            return;
        }
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        if option < question.options.len() {
            self.selection = Some(option);
        }
    }

    pub fn can_advance(&self) -> bool {
        match self.status {
            QuizStatus::Review => true,
            QuizStatus::Playing => self.selection.is_some() && !self.confirming_exit,
            _ => false,
        }
    }

    pub fn advance(&mut self, now: Instant) -> Advance {
        if !self.can_advance() {
            return Advance::Blocked;
        }
        let next = self.current + 1;

        if self.status == QuizStatus::Review {
            if next < self.questions.len() {
                self.move_to(next);
                return Advance::Moved(next);
            }
            self.status = QuizStatus::Finished;
            return Advance::BackToResults;
        }

        // A commit that arrives after the deadline is discarded.
        if self.tick(now) {
            return Advance::Finished;
        }

        self.answers[self.current] = self.selection;

        if next >= self.questions.len() {
            self.finish("last question answered");
            return Advance::Finished;
        }

        if should_pause_for_ad(next, self.settings.ad_frequency) {
            debug!(resume_index = next, "pausing for ad");
            self.timer.disarm();
            self.ad = Some(AdBreak::new(next, self.settings.ad_dismiss_after, now));
            self.status = QuizStatus::PausedForAd;
            return Advance::AdBreak(next);
        }

        self.move_to(next);
        Advance::Moved(next)
    }

    pub fn can_dismiss_ad(&self, now: Instant) -> bool {
        self.status == QuizStatus::PausedForAd
            && self.ad.as_ref().is_some_and(|ad| ad.can_dismiss(now))
    }

    pub fn dismiss_ad(&mut self, now: Instant) -> bool {
        if !self.can_dismiss_ad(now) {
            return false;
        }
        let Some(ad) = self.ad.take() else {
            return false;
        };
        self.status = QuizStatus::Playing;
        self.move_to(ad.resume_index);
        self.timer.arm(now);
        true
    }

    pub fn go_back(&mut self) -> bool {
        let navigable = matches!(self.status, QuizStatus::Playing | QuizStatus::Review);
        if !navigable || self.confirming_exit || self.current == 0 {
            return false;
        }
        self.move_to(self.current - 1);
        true
    }

    fn move_to(&mut self, index: usize) {
        self.current = index;
        self.selection = self.answers.get(index).copied().flatten();
    }

    /// Feed the event loop clock. Returns true when time ran out on this tick.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.status != QuizStatus::Playing {
            return false;
        }
        if self.timer.tick(now) {
            self.finish("time expired");
            return true;
        }
        false
    }

    fn finish(&mut self, reason: &str) {
        self.timer.disarm();
        self.selection = None;
        self.confirming_exit = false;
        self.status = QuizStatus::Finished;
        let score = self.score();
        info!(
            reason,
            correct = score.correct,
            total = score.total,
            percentage = score.percentage,
            "session finished"
        );
    }

    pub fn review(&mut self) -> bool {
        if self.status != QuizStatus::Finished {
            return false;
        }
        self.status = QuizStatus::Review;
        self.move_to(0);
        true
    }

    pub fn request_exit(&mut self) -> ExitRequest {
        match self.status {
            QuizStatus::Idle => ExitRequest::AlreadyIdle,
            QuizStatus::Playing => {
                self.confirming_exit = true;
                ExitRequest::NeedsConfirmation
            }
            _ => {
                self.exit();
                ExitRequest::Exited
            }
        }
    }

    pub fn confirm_exit(&mut self) {
        if self.confirming_exit {
            self.exit();
        }
    }

    pub fn cancel_exit(&mut self) {
        self.confirming_exit = false;
    }

    fn exit(&mut self) {
        info!(from = self.status.as_str(), "session exited");
        self.clear();
    }

    fn clear(&mut self) {
        self.status = QuizStatus::Idle;
        self.questions.clear();
        self.answers.clear();
        self.current = 0;
        self.selection = None;
        self.ad = None;
        self.confirming_exit = false;
        self.error = None;
        self.timer.reset(self.settings.duration_secs);
    }

    /// Surface a message on the idle screen.
    pub fn set_error(&mut self, message: impl Into<String>) {
        if self.status == QuizStatus::Idle {
            self.error = Some(message.into());
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn score(&self) -> Score {
        Score::compute(&self.questions, &self.answers, self.settings.pass_threshold)
    }

    pub fn status(&self) -> QuizStatus {
        self.status
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn is_last_question(&self) -> bool {
        !self.questions.is_empty() && self.current + 1 == self.questions.len()
    }

    pub fn timer(&self) -> &Countdown {
        &self.timer
    }

    pub fn ad_break(&self) -> Option<&AdBreak> {
        self.ad.as_ref()
    }

    pub fn is_confirming_exit(&self) -> bool {
        self.confirming_exit
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
