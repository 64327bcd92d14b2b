use crate::quiz::question::Question;

pub const DEFAULT_PASS_THRESHOLD: u32 = 70;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
    pub percentage: u32,
    pub passed: bool,
}

impl Score {
    pub fn compute(questions: &[Question], answers: &[Option<usize>], pass_threshold: u32) -> Self {
        let correct = questions
            .iter()
            .zip(answers.iter())
            .filter(|(q, a)| q.is_correct(**a))
            .count();
        let total = questions.len();
        let percentage = percentage(correct, total);
        Self {
            correct,
            total,
            percentage,
            passed: percentage >= pass_threshold,
        }
    }

    pub fn share_text(&self) -> String {
        format!(
            "Acabei de fazer o Simulado Detran e acertei {} de {} questões ({}%)!",
            self.correct, self.total, self.percentage
        )
    }
}

/// `round(100 * correct / total)`, with half rounding away from zero.
pub fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (correct as f64 * 100.0 / total as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::question::sample;

    fn thirty() -> Vec<Question> {
        (0..30).map(|i| sample(i, "Legislação", (i % 4) as usize)).collect()
    }

    fn answers_with_correct(questions: &[Question], correct: usize) -> Vec<Option<usize>> {
        questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                if i < correct {
                    Some(q.correct_answer)
                } else {
                    Some((q.correct_answer + 1) % 4)
                }
            })
            .collect()
    }

    #[test]
    fn twenty_one_of_thirty_passes() {
        let qs = thirty();
        let score = Score::compute(&qs, &answers_with_correct(&qs, 21), DEFAULT_PASS_THRESHOLD);
        assert_eq!(score.correct, 21);
        assert_eq!(score.percentage, 70);
        assert!(score.passed);
    }

    #[test]
    fn twenty_of_thirty_fails() {
        let qs = thirty();
        let score = Score::compute(&qs, &answers_with_correct(&qs, 20), DEFAULT_PASS_THRESHOLD);
        assert_eq!(score.percentage, 67);
        assert!(!score.passed);
    }

    #[test]
    fn unanswered_never_counts() {
        let qs = thirty();
        let answers = vec![None; qs.len()];
        let score = Score::compute(&qs, &answers, DEFAULT_PASS_THRESHOLD);
        assert_eq!(score.correct, 0);
        assert_eq!(score.percentage, 0);
    }

    #[test]
    fn short_answer_list_scores_missing_as_wrong() {
        let qs = thirty();
        let answers: Vec<Option<usize>> = qs.iter().take(10).map(|q| Some(q.correct_answer)).collect();
        let score = Score::compute(&qs, &answers, DEFAULT_PASS_THRESHOLD);
        assert_eq!(score.correct, 10);
        assert_eq!(score.total, 30);
        assert_eq!(score.percentage, 33);
    }

    #[test]
    fn empty_session_is_zero_percent() {
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn share_text_mentions_numbers() {
        let qs = thirty();
        let score = Score::compute(&qs, &answers_with_correct(&qs, 21), DEFAULT_PASS_THRESHOLD);
        let text = score.share_text();
        assert!(text.contains("21 de 30"));
        assert!(text.contains("70%"));
    }
}
