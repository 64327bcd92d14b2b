pub mod ad;
pub mod question;
pub mod score;
pub mod session;
pub mod timer;

pub use question::Question;
pub use session::{Advance, ExitRequest, QuizError, QuizSession, QuizStatus, SessionSettings};
