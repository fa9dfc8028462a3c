//! hamprep CLI: study, mock exams, and logbook exchange from the terminal.

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};

use hamprep_core::model::{FilterKind, Level, QuestionId};

mod commands;

use commands::logbook::Format;

#[derive(Parser)]
#[command(name = "hamprep", version, about = "Amateur-radio licence exam trainer")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and sample question bank
    Init,

    /// Check a question bank for problems
    Validate {
        /// Bank file or directory (defaults to the configured bank)
        #[arg(long)]
        bank: Option<PathBuf>,
    },

    /// Record study progress and drill questions
    Study {
        #[command(subcommand)]
        action: StudyAction,
    },

    /// Show study and exam statistics
    Stats {
        #[arg(long)]
        level: Option<Level>,
    },

    /// Draw, score, and review mock exams
    Exam {
        #[command(subcommand)]
        action: ExamAction,
    },

    /// Import or export the contact logbook
    Logbook {
        #[command(subcommand)]
        action: LogbookAction,
    },
}

#[derive(Subcommand)]
enum StudyAction {
    /// Answer a question and record the outcome
    Answer {
        #[arg(long)]
        question: QuestionId,

        /// Selected option labels, e.g. "AC"
        #[arg(long)]
        selected: String,
    },

    /// Mark a question as learned
    Learn {
        #[arg(long)]
        question: QuestionId,
    },

    /// Toggle the mastered flag
    Master {
        #[arg(long)]
        question: QuestionId,
    },

    /// Toggle the favorite flag
    Favorite {
        #[arg(long)]
        question: QuestionId,
    },

    /// List questions of a level
    List {
        #[arg(long)]
        level: Option<Level>,

        /// all, learned, unlearned, wrong, favorite
        #[arg(long, default_value = "all")]
        filter: FilterKind,
    },

    /// Find questions by keyword
    Search {
        #[arg(long)]
        level: Option<Level>,

        #[arg(long)]
        keyword: String,
    },

    /// Show the random-practice queue
    Random {
        #[arg(long)]
        level: Option<Level>,

        /// Mark a question done before showing the queue
        #[arg(long)]
        done: Option<QuestionId>,

        /// Start over, keeping the shuffle order
        #[arg(long, conflicts_with = "full_reset")]
        reset: bool,

        /// Start over with a fresh shuffle
        #[arg(long)]
        full_reset: bool,
    },

    /// Delete study records
    Clear {
        /// Only this level (default: every level)
        #[arg(long)]
        level: Option<Level>,
    },
}

#[derive(Subcommand)]
enum ExamAction {
    /// Draw the questions of a new exam
    Start {
        #[arg(long)]
        level: Option<Level>,

        /// Write a session file to fill in and submit
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Score a finished exam session file
    Submit {
        #[arg(long)]
        level: Option<Level>,

        /// Session JSON file
        #[arg(long)]
        answers: PathBuf,
    },

    /// List past exams, newest first
    History {
        #[arg(long)]
        level: Option<Level>,

        /// Max rows (defaults to the configured history limit)
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
enum LogbookAction {
    /// Write the stored logbook to a file
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: Format,

        #[arg(long)]
        file: PathBuf,
    },

    /// Append contacts from a file to the stored logbook
    Import {
        #[arg(long, value_enum, default_value = "json")]
        format: Format,

        #[arg(long)]
        file: PathBuf,
    },
}

fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "hamprep=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(config),
        Commands::Validate { bank } => commands::validate::execute(bank, config),
        Commands::Study { action } => study(action, config).await,
        Commands::Stats { level } => stats(level, config).await,
        Commands::Exam { action } => exam(action, config).await,
        Commands::Logbook { action } => match action {
            LogbookAction::Export { format, file } => {
                commands::logbook::export(format, file, config)
            }
            LogbookAction::Import { format, file } => {
                commands::logbook::import(format, file, config)
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn study(action: StudyAction, config: Option<PathBuf>) -> Result<()> {
    let ctx = commands::App::open(config.as_deref())?;
    match action {
        StudyAction::Answer { question, selected } => {
            commands::study::answer(&ctx, question, &selected).await
        }
        StudyAction::Learn { question } => commands::study::learn(&ctx, question).await,
        StudyAction::Master { question } => commands::study::master(&ctx, question).await,
        StudyAction::Favorite { question } => commands::study::favorite(&ctx, question).await,
        StudyAction::List { level, filter } => commands::study::list(&ctx, level, filter).await,
        StudyAction::Search { level, keyword } => {
            commands::study::search(&ctx, level, &keyword).await
        }
        StudyAction::Random {
            level,
            done,
            reset,
            full_reset,
        } => commands::study::random(&ctx, level, done, reset, full_reset).await,
        StudyAction::Clear { level } => commands::study::clear(&ctx, level).await,
    }
}

async fn stats(level: Option<Level>, config: Option<PathBuf>) -> Result<()> {
    let ctx = commands::App::open(config.as_deref())?;
    commands::stats::execute(&ctx, level).await
}

async fn exam(action: ExamAction, config: Option<PathBuf>) -> Result<()> {
    let ctx = commands::App::open(config.as_deref())?;
    match action {
        ExamAction::Start { level, output } => commands::exam::start(&ctx, level, output).await,
        ExamAction::Submit { level, answers } => {
            commands::exam::submit(&ctx, level, answers).await
        }
        ExamAction::History { level, limit } => commands::exam::history(&ctx, level, limit).await,
    }
}
