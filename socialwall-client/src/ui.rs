use std::collections::VecDeque;

/// Blocking dialogs the wall needs from whatever front end drives it.
pub trait Ui {
    /// Shows a modal message and returns once it was dismissed.
    fn alert(&mut self, message: &str);

    /// Asks a yes/no question.
    fn confirm(&mut self, question: &str) -> bool;
}

/// Headless front end: records every dialog and answers confirmations from
/// a queue, declining once the queue runs dry.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct RecordingUi {
    alerts: Vec<String>,
    questions: Vec<String>,
    answers: VecDeque<bool>,
}

impl RecordingUi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn answering(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn push_answer(&mut self, answer: bool) {
        self.answers.push_back(answer);
    }

    #[must_use]
    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    #[must_use]
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    #[must_use]
    pub fn last_alert(&self) -> Option<&str> {
        self.alerts.last().map(String::as_str)
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }
}

impl Ui for RecordingUi {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_owned());
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_owned());
        self.answers.pop_front().unwrap_or(false)
    }
}
