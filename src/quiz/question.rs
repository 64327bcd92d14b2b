use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OPTION_COUNT: usize = 4;
pub const DEFAULT_CATEGORY: &str = "Geral";

const OPTION_LETTERS: [char; OPTION_COUNT] = ['A', 'B', 'C', 'D'];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u64,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvalidQuestion {
    #[error("question text is blank")]
    BlankText,
    #[error("expected 4 options, found {0}")]
    OptionCount(usize),
    #[error("correct answer index {0} is out of range")]
    CorrectOutOfRange(usize),
}

impl Question {
    pub fn category_label(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_answer)
    }

    pub fn validate(&self) -> Result<(), InvalidQuestion> {
        if self.text.trim().is_empty() {
            return Err(InvalidQuestion::BlankText);
        }
        if self.options.len() != OPTION_COUNT {
            return Err(InvalidQuestion::OptionCount(self.options.len()));
        }
        if self.correct_answer >= self.options.len() {
            return Err(InvalidQuestion::CorrectOutOfRange(self.correct_answer));
        }
        Ok(())
    }
}

/// Letter shown next to an option ("A" for index 0).
pub fn option_letter(index: usize) -> char {
    OPTION_LETTERS.get(index).copied().unwrap_or('?')
}

#[cfg(test)]
pub(crate) fn sample(id: u64, category: &str, correct: usize) -> Question {
    Question {
        id,
        text: format!("Questão {id}"),
        options: (0..OPTION_COUNT).map(|i| format!("opção {i}")).collect(),
        correct_answer: correct,
        category: Some(category.to_string()),
        explanation: None,
    }
}
