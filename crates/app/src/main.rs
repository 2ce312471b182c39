mod terminal;

use std::fmt;

use quiz_core::Clock;
use quiz_core::model::{Difficulty, Role, User, UserId, format_remaining};
use services::{
    ActiveQuiz, ApiConfig, AppServices, GenerateQuizRequest, QuizLoopService, QuizServiceError,
    SubmittedQuiz, TickOutcome,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use terminal::{HELP, Input, parse_input};

const MAX_QUESTIONS: u32 = 20;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDifficulty { raw: String },
    InvalidQuestions { raw: String },
    InvalidSeed { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value: {raw} (easy, medium, hard)")
            }
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  quiz [--topic <text>] [--difficulty easy|medium|hard] [--questions <n>] [--api-url <url>] [--seed <n>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --topic General Knowledge");
    eprintln!("  --difficulty medium");
    eprintln!("  --questions 5 (1..={MAX_QUESTIONS})");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_TOPIC, QUIZ_DIFFICULTY, QUIZ_API_BASE_URL, QUIZ_API_TOKEN, QUIZ_API_TIMEOUT_SECS");
    eprintln!("  RUST_LOG (log filter, default info)");
}

#[derive(Debug)]
struct Args {
    topic: String,
    difficulty: Difficulty,
    questions: u32,
    api_url: Option<String>,
    seed: Option<u64>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut topic = std::env::var("QUIZ_TOPIC")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "General Knowledge".into());
        let mut difficulty = std::env::var("QUIZ_DIFFICULTY")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        let mut questions = 5;
        let mut api_url = None;
        let mut seed = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--topic" => topic = require_value(args, "--topic")?,
                "--difficulty" => {
                    let value = require_value(args, "--difficulty")?;
                    difficulty = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: value.clone() })?;
                }
                "--questions" => {
                    let value = require_value(args, "--questions")?;
                    let parsed: u32 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidQuestions { raw: value.clone() })?;
                    questions = parsed.clamp(1, MAX_QUESTIONS);
                }
                "--api-url" => api_url = Some(require_value(args, "--api-url")?),
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    seed = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?,
                    );
                }
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(Self {
            topic,
            difficulty,
            questions,
            api_url,
            seed,
        }))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn signed_in_user() -> User {
    let id = std::env::var("QUIZ_USER_ID").unwrap_or_else(|_| "student1".into());
    let name = std::env::var("QUIZ_USER_NAME").unwrap_or_else(|_| "Demo Student".into());
    User::new(UserId::new(id), "student@demo.com", name, Role::Student)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let Some(args) = Args::parse(&mut argv).inspect_err(|err| {
        eprintln!("{err}");
        print_usage();
    })?
    else {
        print_usage();
        return Ok(());
    };

    init_tracing();

    let config = match args.api_url.as_deref() {
        Some(url) => {
            Some(ApiConfig::new(url)?.with_token(std::env::var("QUIZ_API_TOKEN").ok()))
        }
        None => ApiConfig::from_env()?,
    };
    let clock = Clock::system();
    let services = AppServices::from_config(clock, signed_in_user(), config, args.seed)?;
    let quiz_loop = services.quiz_loop();

    let request = GenerateQuizRequest::new(args.topic, args.difficulty, args.questions)
        .for_user(services.user().id.clone());
    println!("Generating your quiz...");
    let mut active = quiz_loop.start_quiz(&request).await?;

    println!("{}", terminal::render_header(active.session().quiz()));
    println!("{HELP}");
    println!("{}", terminal::render_question(active.session()));

    let mut lines = spawn_stdin_reader();
    let Some(submitted) = drive(&quiz_loop, &mut active, &mut lines).await? else {
        active.exit();
        println!("Quiz exited. Nothing was submitted.");
        return Ok(());
    };

    let quiz = active.session().quiz_arc();
    println!("{}", terminal::render_result(&quiz, &submitted));
    if active.upload_pending() {
        retry_upload(&quiz_loop, &mut active).await;
    }
    services
        .progress()
        .record(&services.user().id, quiz.topic(), &submitted.result);
    println!("{}", terminal::render_progress(&services));
    Ok(())
}

enum Step {
    Continue,
    Submitted(SubmittedQuiz),
    Exit,
}

/// Stdin is read on a plain thread; a read still pending when the attempt
/// ends must not keep the runtime from shutting down.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Feed input lines and timer ticks into the session until it is submitted
/// or the user leaves. Returns `None` when the user exits.
async fn drive(
    quiz_loop: &QuizLoopService,
    active: &mut ActiveQuiz,
    lines: &mut mpsc::UnboundedReceiver<String>,
) -> Result<Option<SubmittedQuiz>, QuizServiceError> {
    loop {
        let step = tokio::select! {
            ticked = active.next_tick(), if active.timer_running() => {
                if !ticked {
                    continue;
                }
                match quiz_loop.apply_tick(active).await? {
                    TickOutcome::TimedOut(submitted) => Step::Submitted(submitted),
                    TickOutcome::Running { remaining_secs } => {
                        announce_time(remaining_secs);
                        Step::Continue
                    }
                }
            }
            line = lines.recv() => match line {
                Some(line) => handle_line(quiz_loop, active, &line).await?,
                None => Step::Exit,
            },
        };

        match step {
            Step::Continue => {}
            Step::Submitted(submitted) => return Ok(Some(submitted)),
            Step::Exit => return Ok(None),
        }
    }
}

async fn handle_line(
    quiz_loop: &QuizLoopService,
    active: &mut ActiveQuiz,
    line: &str,
) -> Result<Step, QuizServiceError> {
    let input = match parse_input(line, active.session().status()) {
        Ok(input) => input,
        Err(err) => {
            println!("{err}");
            return Ok(Step::Continue);
        }
    };

    let outcome = match input {
        Input::Select(option) => active.select_answer(option),
        Input::Next => active.go_to_next(),
        Input::Previous => active.go_to_previous(),
        Input::GoTo(index) => active.go_to_question(index),
        Input::Submit => {
            active.request_submit_confirmation()?;
            println!("{}", terminal::render_confirmation(active.session()));
            return Ok(Step::Continue);
        }
        Input::Confirm => {
            return match quiz_loop.submit(active).await {
                Ok(submitted) => Ok(Step::Submitted(submitted)),
                Err(QuizServiceError::SubmissionFailed(err)) => {
                    println!("Could not submit: {err}. Answer y to try again or n to keep going.");
                    Ok(Step::Continue)
                }
                Err(err) => Err(err),
            };
        }
        Input::Cancel => active.cancel_submit_confirmation(),
        Input::Time => {
            println!("{} left", format_remaining(active.session().remaining_secs()));
            return Ok(Step::Continue);
        }
        Input::Help => {
            println!("{HELP}");
            return Ok(Step::Continue);
        }
        Input::Quit => return Ok(Step::Exit),
    };

    match outcome {
        Ok(()) => println!("{}", terminal::render_question(active.session())),
        Err(err) => println!("{err}"),
    }
    Ok(Step::Continue)
}

fn announce_time(remaining_secs: u32) {
    if remaining_secs == 60 || remaining_secs == 10 || (remaining_secs % 300 == 0) {
        println!("{} left", format_remaining(remaining_secs));
    }
}

async fn retry_upload(quiz_loop: &QuizLoopService, active: &mut ActiveQuiz) {
    for attempt in 1..=3 {
        match quiz_loop.finalize_submission(active).await {
            Ok(_) => {
                println!("Result uploaded.");
                return;
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "could not upload result");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }
    println!("Result could not be uploaded; it is shown above but was not saved remotely.");
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quiz_core::model::{Question, QuestionId, Quiz, QuizId, SessionStatus};
    use quiz_core::time::{fixed_clock, fixed_now};
    use services::MockQuizApi;

    use super::*;

    fn one_minute_service() -> (QuizLoopService, ActiveQuiz) {
        let question = Question::new(
            QuestionId::new("q1"),
            "Pick B",
            vec!["A".into(), "B".into()],
            1,
            None,
        )
        .unwrap();
        let quiz = Quiz::new(
            QuizId::new("short"),
            "Short Quiz",
            "Timing",
            Difficulty::Easy,
            vec![question],
            Some(1),
            fixed_now(),
        )
        .unwrap();
        let api = Arc::new(MockQuizApi::seeded(fixed_clock(), 1));
        api.register(Arc::new(quiz.clone()));
        let service = QuizLoopService::new(fixed_clock(), api);
        let active = service.begin(quiz).unwrap();
        (service, active)
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_ends_the_attempt_while_input_is_pending() {
        let (service, mut active) = one_minute_service();
        let (_stdin, mut lines) = mpsc::unbounded_channel();

        let submitted = drive(&service, &mut active, &mut lines)
            .await
            .unwrap()
            .expect("timeout should submit");

        assert!(submitted.result.timed_out());
        assert_eq!(submitted.result.score(), 0);
        assert_eq!(active.session().status(), SessionStatus::Submitted);
        assert!(!active.timer_running());
    }

    #[tokio::test(start_paused = true)]
    async fn answers_and_confirmation_come_from_input_lines() {
        let (service, mut active) = one_minute_service();
        let (stdin, mut lines) = mpsc::unbounded_channel();
        for line in ["b", "s", "y"] {
            stdin.send(line.to_string()).unwrap();
        }

        let submitted = drive(&service, &mut active, &mut lines)
            .await
            .unwrap()
            .expect("confirmed submit");

        assert_eq!(submitted.result.score(), 100);
        assert!(!submitted.result.timed_out());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_input_exits_without_a_result() {
        let (service, mut active) = one_minute_service();
        let (stdin, mut lines) = mpsc::unbounded_channel::<String>();
        drop(stdin);

        assert!(drive(&service, &mut active, &mut lines).await.unwrap().is_none());
        assert!(active.session().result().is_none());
    }
}
