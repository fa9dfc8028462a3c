//! The `hamprep study` commands.

use anyhow::{bail, Result};

use hamprep_core::answer::split_labels;
use hamprep_core::model::{FilterKind, Level, QuestionId, StudyRecord};
use hamprep_core::StudyItem;

use super::App;

/// Queue entries shown by `study random`.
const QUEUE_PREVIEW: usize = 10;

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn print_record(record: &StudyRecord) {
    println!(
        "Question {} [{}]: learned={} mastered={} wrong={} ({}x) favorite={}",
        record.question_id,
        record.level,
        flag(record.is_learned),
        flag(record.is_mastered),
        flag(record.is_wrong),
        record.wrong_count,
        flag(record.is_favorite),
    );
}

pub async fn answer(app: &App, question_id: QuestionId, selected: &str) -> Result<()> {
    let question = app.question(question_id).await?;
    let labels = split_labels(&selected.replace(',', "").to_ascii_uppercase());
    if labels.is_empty() {
        bail!("no option selected");
    }
    if let Some(unknown) = labels
        .iter()
        .find(|l| !question.options.iter().any(|o| &o.label == *l))
    {
        bail!("question {question_id} has no option {unknown}");
    }

    let correct = question.check(&labels);
    let record = app
        .study
        .record_answer(question.id, question.level, correct)
        .await?;
    if correct {
        println!("Correct.");
    } else {
        println!("Wrong. The answer is {}.", question.answer);
    }
    print_record(&record);
    Ok(())
}

pub async fn learn(app: &App, question_id: QuestionId) -> Result<()> {
    let question = app.question(question_id).await?;
    let record = app.study.mark_learned(question.id, question.level).await?;
    print_record(&record);
    Ok(())
}

pub async fn master(app: &App, question_id: QuestionId) -> Result<()> {
    let question = app.question(question_id).await?;
    let record = app
        .study
        .toggle_mastered(question.id, question.level)
        .await?;
    print_record(&record);
    Ok(())
}

pub async fn favorite(app: &App, question_id: QuestionId) -> Result<()> {
    let question = app.question(question_id).await?;
    let record = app
        .study
        .toggle_favorite(question.id, question.level)
        .await?;
    print_record(&record);
    Ok(())
}

fn print_items(items: &[StudyItem]) {
    for item in items {
        let mut marks = String::new();
        if let Some(record) = &item.record {
            if record.is_learned {
                marks.push('L');
            }
            if record.is_mastered {
                marks.push('M');
            }
            if record.is_wrong {
                marks.push('W');
            }
            if record.is_favorite {
                marks.push('*');
            }
        }
        println!(
            "{:>6}  {:<4} {}  {}",
            item.question.id, marks, item.question.question_code, item.question.text
        );
    }
}

pub async fn list(app: &App, level: Option<Level>, filter: FilterKind) -> Result<()> {
    let level = app.level(level);
    let items = app.study.filter(level, filter).await?;
    print_items(&items);
    println!("\n{} question(s), level {level}, filter {filter}", items.len());
    Ok(())
}

pub async fn search(app: &App, level: Option<Level>, keyword: &str) -> Result<()> {
    let level = app.level(level);
    let items = app.study.search(level, keyword).await?;
    print_items(&items);
    println!("\n{} match(es) for \"{keyword}\" in level {level}", items.len());
    Ok(())
}

pub async fn random(
    app: &App,
    level: Option<Level>,
    done: Option<QuestionId>,
    reset: bool,
    full_reset: bool,
) -> Result<()> {
    let level = app.level(level);

    if full_reset {
        let touched = app.study.full_reset_random_practice(level).await?;
        println!("Cleared the practice order of {touched} question(s).");
    } else if reset {
        let touched = app.study.reset_random_practice_done(level).await?;
        println!("Restarted practice for {touched} question(s).");
    }

    if let Some(question_id) = done {
        let question = app.question(question_id).await?;
        app.study
            .mark_random_practice_done(question.id, question.level)
            .await?;
        println!("Question {question_id} done.");
    }

    let queue = app.study.random_practice_queue(level).await?;
    let Some(&next) = queue.first() else {
        println!("Random practice for level {level} is complete. Use --reset to go again.");
        return Ok(());
    };

    let question = app.question(next).await?;
    println!("{} question(s) left in level {level}.", queue.len());
    println!("\nNext: [{}] {}", question.id, question.text);
    for option in &question.options {
        println!("  {}. {}", option.label, option.text);
    }

    let upcoming: Vec<String> = queue
        .iter()
        .skip(1)
        .take(QUEUE_PREVIEW)
        .map(|id| id.to_string())
        .collect();
    if !upcoming.is_empty() {
        println!("\nUp next: {}", upcoming.join(", "));
    }
    Ok(())
}

pub async fn clear(app: &App, level: Option<Level>) -> Result<()> {
    match level {
        Some(level) => {
            let removed = app.study.clear_records(Some(level)).await?;
            println!("Removed {removed} study record(s) for level {level}.");
        }
        None => {
            let removed = app.study.clear_all_records().await?;
            println!("Removed {removed} study record(s).");
        }
    }
    Ok(())
}
