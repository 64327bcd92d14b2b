pub mod bank;
pub mod job;
pub mod remote;
pub mod sampler;

use crate::quiz::Question;

/// Something that can hand the state machine a fresh question list.
/// An empty list means the source could not produce a session.
pub trait QuestionSource {
    fn draw(&mut self) -> Vec<Question>;
}
