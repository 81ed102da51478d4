use std::time::Duration;

use quiz_core::model::{
    Question, QuestionKind, SessionSource, Stats, Verdict, index_to_letter, letter_to_index,
};
use services::{Advance, Clock, QuestionBankService, SessionController, SessionError};
use storage::{HttpRepository, Storage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

mod args;

use args::{Args, Command, print_usage};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn spawn_heartbeat(repo: HttpRepository, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = repo.heartbeat().await {
                tracing::debug!(error = %e, "heartbeat failed");
            }
        }
    })
}

fn print_stats(stats: &Stats) {
    println!(
        "Answered {} | correct {} | accuracy {}% | wrong book {}",
        stats.total_answered,
        stats.correct_answered,
        stats.accuracy_percent(),
        stats.wrong_count
    );
    for row in stats.category_breakdown() {
        println!(
            "  {:<24} {:>3}% ({}/{})",
            row.category, row.percent, row.correct, row.total
        );
    }
}

fn print_question(index: usize, total: usize, question: &Question) {
    println!();
    println!(
        "[{}/{}] {} · {}",
        index + 1,
        total,
        question.kind().display_name(),
        question.category()
    );
    println!("{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        let letter = index_to_letter(i).unwrap_or('?');
        println!("  {letter}. {option}");
    }
    match question.kind() {
        QuestionKind::TrueFalse => println!("(t/f, :n next, :p previous, :r remove, :q quit)"),
        _ => println!("(:n next, :p previous, :r remove, :q quit)"),
    }
}

/// Translate typed shorthand into the value the evaluator compares.
fn submission(question: &Question, input: &str) -> String {
    match question.kind() {
        QuestionKind::Choice => letter_to_index(&input.to_ascii_uppercase())
            .and_then(|i| question.options().get(i).cloned())
            .unwrap_or_else(|| input.to_string()),
        QuestionKind::TrueFalse => match input.to_ascii_lowercase().as_str() {
            "t" | "true" => Verdict::True.symbol().to_string(),
            "f" | "false" => Verdict::False.symbol().to_string(),
            _ => input.to_string(),
        },
        QuestionKind::Fill | QuestionKind::ShortAnswer => input.to_string(),
    }
}

async fn practice(
    mut controller: SessionController,
    source: SessionSource,
) -> Result<(), Box<dyn std::error::Error>> {
    controller.start(source).await?;
    if controller.questions().is_empty() {
        println!("No questions match this selection.");
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(question) = controller.current_question().cloned() else {
            break;
        };
        print_question(
            controller.current_index(),
            controller.questions().len(),
            &question,
        );

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        let step = match input {
            ":q" => break,
            ":p" => {
                controller.retreat();
                continue;
            }
            ":r" => {
                controller.remove_from_wrong_book(question.id()).await?;
                if !controller.is_active() {
                    println!("Wrong book is empty.");
                    break;
                }
                continue;
            }
            ":n" => controller.advance().await,
            _ => {
                let feedback = match controller
                    .submit_answer(&submission(&question, input))
                    .await
                {
                    Ok(feedback) => feedback,
                    Err(SessionError::AlreadyAnswered(_)) => {
                        println!("Already answered, use :n to move on.");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                if feedback.correct {
                    println!("Correct.");
                } else {
                    println!("Wrong. Answer: {}", question.key().as_text());
                }
                if let Some(explanation) = question.explanation() {
                    println!("{explanation}");
                }
                if let Some(message) = controller.message() {
                    println!("{message}");
                }
                controller.advance().await
            }
        };

        if let Advance::Finished(report) = step {
            println!();
            println!(
                "Session finished: {}/{} correct ({}%) in {}s",
                report.correct,
                report.answered,
                report.accuracy_percent(),
                (report.finished_at - report.started_at).num_seconds()
            );
            break;
        }
    }

    if let Some(stats) = controller.stats() {
        print_stats(stats);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if args.command == Command::Help {
        print_usage();
        return Ok(());
    }

    let repo = HttpRepository::connect(&args.store)?;
    tracing::debug!(base = %repo.base_url(), "using question store");
    let storage = Storage::from_http(repo.clone());

    match args.command {
        Command::Filters => {
            let bank = QuestionBankService::new(storage.questions.clone());
            let filters = bank.filters().await?;
            println!("Categories:");
            for item in &filters.categories {
                println!("  {}", item.name);
            }
            println!("Types:");
            for item in &filters.types {
                println!("  {:<14} {}", item.id, item.name);
            }
        }
        Command::Stats => {
            let stats = storage.progress.stats().await?;
            print_stats(&stats);
        }
        Command::Import { path } => {
            let text = tokio::fs::read_to_string(&path).await?;
            let bank = QuestionBankService::new(storage.questions.clone());
            let count = bank.import_json(&text).await?;
            println!("Imported {count} questions from {}", path.display());
        }
        Command::Practice { source } => {
            let heartbeat = spawn_heartbeat(repo, args.heartbeat);
            let controller = SessionController::new(
                Clock::default(),
                storage.questions.clone(),
                storage.progress.clone(),
            )
            .with_batch_limit(args.limit);
            let result = practice(controller, source).await;
            heartbeat.abort();
            result?;
        }
        Command::Help => print_usage(),
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
