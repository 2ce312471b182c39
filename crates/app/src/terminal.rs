use std::fmt::Write as _;

use quiz_core::model::{Quiz, QuizSession, SessionStatus, format_remaining};
use services::{AppServices, SubmittedQuiz};

/// One line of user input, interpreted against the session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Select(usize),
    Next,
    Previous,
    GoTo(usize),
    Submit,
    Confirm,
    Cancel,
    Time,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Empty,
    Unknown(String),
    InvalidQuestion(String),
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::Empty => write!(f, "type a command (h for help)"),
            InputError::Unknown(raw) => write!(f, "unknown command: {raw} (h for help)"),
            InputError::InvalidQuestion(raw) => write!(f, "invalid question number: {raw}"),
        }
    }
}

impl std::error::Error for InputError {}

pub const HELP: &str = "\
Commands:
  a-f or 1-9   choose an answer for the current question
               (letters g, h, n, p, q, s, t are commands; use digits past F)
  n / p        next / previous question
  g <number>   jump to a question
  s            submit (asks for confirmation)
  t            show remaining time
  q            exit without submitting
  h            this help";

pub fn parse_input(line: &str, status: SessionStatus) -> Result<Input, InputError> {
    let trimmed = line.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    if status == SessionStatus::PendingConfirmation {
        return match trimmed.as_str() {
            "y" | "yes" => Ok(Input::Confirm),
            "n" | "no" => Ok(Input::Cancel),
            _ => Err(InputError::Unknown(trimmed)),
        };
    }

    let mut parts = trimmed.split_whitespace();
    let head = parts.next().unwrap_or_default();
    match head {
        "n" | "next" => Ok(Input::Next),
        "p" | "prev" | "previous" => Ok(Input::Previous),
        "s" | "submit" => Ok(Input::Submit),
        "t" | "time" => Ok(Input::Time),
        "h" | "help" | "?" => Ok(Input::Help),
        "q" | "quit" | "exit" => Ok(Input::Quit),
        "g" | "go" => {
            let raw = parts.next().unwrap_or_default();
            raw.parse::<usize>()
                .ok()
                .and_then(|number| number.checked_sub(1))
                .map(Input::GoTo)
                .ok_or_else(|| InputError::InvalidQuestion(raw.to_string()))
        }
        _ => parse_option(head)
            .map(Input::Select)
            .ok_or_else(|| InputError::Unknown(trimmed.clone())),
    }
}

fn parse_option(raw: &str) -> Option<usize> {
    let mut chars = raw.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match first {
        'a'..='z' => Some(first as usize - 'a' as usize),
        '1'..='9' => Some(first as usize - '1' as usize),
        _ => None,
    }
}

pub fn option_label(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|index| *index < 26)
        .map_or('?', |index| char::from(b'A' + index))
}

pub fn render_header(quiz: &Quiz) -> String {
    format!(
        "{}\nTopic: {} | Difficulty: {}\n",
        quiz.title(),
        quiz.topic(),
        quiz.difficulty()
    )
}

pub fn render_question(session: &QuizSession) -> String {
    let mut out = String::new();
    let question = session.current_question();
    let _ = writeln!(
        out,
        "\nQuestion {} of {}  ({} answered, {} left)",
        session.current_index() + 1,
        session.question_count(),
        session.answered_count(),
        format_remaining(session.remaining_secs())
    );
    let _ = writeln!(out, "{}", question.prompt());
    for (index, option) in question.options().iter().enumerate() {
        let marker = if session.current_answer() == Some(index) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(out, " {marker} {}. {option}", option_label(index));
    }
    out
}

pub fn render_confirmation(session: &QuizSession) -> String {
    format!(
        "You have answered {} out of {} questions. Submit your quiz? (y/n)",
        session.answered_count(),
        session.question_count()
    )
}

pub fn render_result(quiz: &Quiz, submitted: &SubmittedQuiz) -> String {
    let result = &submitted.result;
    let mut out = String::new();
    if result.timed_out() {
        let _ = writeln!(out, "\nTime is up!");
    }
    let _ = writeln!(out, "\nQuiz complete: {}%", result.score());
    let _ = writeln!(out, "{}", result.band().message());
    if let Some(feedback) = submitted.attempt.as_ref().and_then(|a| a.feedback.as_deref()) {
        let _ = writeln!(out, "{feedback}");
    }
    let _ = writeln!(
        out,
        "{} of {} correct in {}",
        result.correct_count(),
        result.question_count(),
        format_remaining(result.time_spent_secs())
    );

    for (index, (question, answer)) in quiz.questions().iter().zip(result.answers()).enumerate() {
        let verdict = match answer {
            None => "unanswered",
            Some(_) if question.is_correct(*answer) => "correct",
            Some(_) => "wrong",
        };
        let _ = write!(
            out,
            "\n{}. [{verdict}] {}\n   correct answer: {}",
            index + 1,
            question.prompt(),
            option_label(question.correct_answer())
        );
        if let Some(choice) = answer {
            let _ = write!(out, ", yours: {}", option_label(*choice));
        }
        if let Some(explanation) = question.explanation() {
            let _ = write!(out, "\n   {explanation}");
        }
        out.push('\n');
    }
    out
}

pub fn render_progress(services: &AppServices) -> String {
    let progress = services.progress().own_progress(services.user());
    let mut out = format!(
        "\n{}: {} quiz(zes), average {:.0}%",
        progress.user_name, progress.total_quizzes, progress.average_score
    );
    for (topic, average) in &progress.topic_progress {
        let _ = write!(out, "\n  {topic}: {average:.0}%");
    }
    out
}
