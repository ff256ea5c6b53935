pub use crate::config::*;

/// A builder for collecting the answers of a question.
///
/// Raw responses (one per respondent, or one per line of an export) can be added
/// directly: responses with exactly the same text are aggregated into a single answer.
///
/// ```
/// pub use survey_ranking::builder::Builder;
///
/// let mut builder = Builder::new("Name a Sanskrit word for a number.");
///
/// builder.add_answer_simple("eka");
/// builder.add_answer_simple("eka");
/// builder.add_answer("dva", 3, true);
///
/// let question = builder.build();
/// assert_eq!(question.answers.len(), 2);
/// assert_eq!(question.answers[0].response_count, 2);
/// ```
pub struct Builder {
    pub(crate) _text: String,
    pub(crate) _answers: Vec<AnswerRecord>,
}

impl Builder {
    pub fn new(question: &str) -> Builder {
        Builder {
            _text: question.to_string(),
            _answers: Vec::new(),
        }
    }

    /// Adds the answer of a single respondent.
    pub fn add_answer_simple(&mut self, text: &str) {
        self.add_answer(text, 1, false)
    }

    /// Adds an answer given by `count` respondents.
    ///
    /// If an answer with exactly the same text was already added, the count is added
    /// to it (saturating at `u64::MAX`), and it becomes correct if `is_correct` is set.
    /// Otherwise a new answer is created at the end of the list.
    pub fn add_answer(&mut self, text: &str, count: u64, is_correct: bool) {
        if let Some(existing) = self._answers.iter_mut().find(|a| a.text == text) {
            existing.response_count = existing.response_count.saturating_add(count);
            existing.is_correct |= is_correct;
        } else {
            self._answers.push(AnswerRecord {
                is_correct,
                ..AnswerRecord::new(text, count)
            });
        }
    }

    /// Adds an answer record that was already aggregated (for example by a database).
    ///
    /// The record is kept as is, even if an answer with the same text is present.
    pub fn add_answer_record(&mut self, answer: &AnswerRecord) {
        self._answers.push(answer.clone());
    }

    /// Marks as correct all the answers for which the predicate holds.
    pub fn mark_correct<F>(&mut self, is_correct: F)
    where
        F: Fn(&str) -> bool,
    {
        for a in self._answers.iter_mut() {
            if is_correct(&a.text) {
                a.is_correct = true;
            }
        }
    }

    pub fn build(self) -> QuestionRecord {
        QuestionRecord {
            text: self._text,
            answers: self._answers,
        }
    }
}
