use std::fmt;

use training_core::model::{Difficulty, QuestionId, SubjectName, UserId};

use storage::repository::{QuestionRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    per_subject: u32,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidPerSubject { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidPerSubject { raw } => {
                write!(f, "invalid --per-subject value: {raw}")
            }
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("TRAINING_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut user_id = UserId::new(
            std::env::var("TRAINING_USER_ID").unwrap_or_else(|_| "demo-student".into()),
        );
        let mut per_subject = std::env::var("TRAINING_PER_SUBJECT")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(6);

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = UserId::new(value);
                }
                "--per-subject" => {
                    let value = require_value(&mut args, "--per-subject")?;
                    per_subject = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidPerSubject { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            per_subject,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --user <id>               User to seed diagnostic scores for (default: demo-student)");
    eprintln!("  --per-subject <n>         Questions per subject per difficulty (default: 6)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  TRAINING_DB_URL, TRAINING_USER_ID, TRAINING_PER_SUBJECT");
}

const SUBJECTS: [(&str, f64); 5] = [
    ("algebra", 35.0),
    ("calculus", 80.0),
    ("geometry", 55.0),
    ("prob&stat", 90.0),
    ("trig", 20.0),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    let mut question_count = 0_u32;
    for (subject_name, grade) in SUBJECTS {
        let subject = SubjectName::new(subject_name)?;
        storage
            .scores
            .upsert_score(&args.user_id, &subject, grade)
            .await?;

        for difficulty in Difficulty::ALL {
            for i in 0..args.per_subject {
                let id = format!("{subject_name}-{}-{}", difficulty.as_str(), i + 1);
                let record = QuestionRecord {
                    id: QuestionId::new(id),
                    subject: subject.clone(),
                    question_text: Some(format!(
                        "Sample {subject_name} question {} ({})",
                        i + 1,
                        difficulty.as_str()
                    )),
                    question: None,
                    question_text_legacy: None,
                    correct_answer: "correct option".into(),
                    incorrect_answers: vec![
                        "distractor one".into(),
                        "distractor two".into(),
                        "distractor three".into(),
                    ],
                    explanation: Some(format!(
                        "Why the correct option is right for {subject_name} sample {}",
                        i + 1
                    )),
                    difficulty,
                };
                storage.questions.upsert_question(&record).await?;
                question_count += 1;
            }
        }
    }

    println!(
        "Seeded {} questions across {} subjects and scores for user {} into {}",
        question_count,
        SUBJECTS.len(),
        args.user_id,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
