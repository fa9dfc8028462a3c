//! The `hamprep stats` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use hamprep_core::model::Level;

use super::App;

pub async fn execute(app: &App, level: Option<Level>) -> Result<()> {
    let level = app.level(level);
    let study = app.study.stats(level).await?;
    let exams = app.exam.stats(level).await?;

    let mut table = Table::new();
    table.set_header(vec!["Level", "Metric", "Value"]);

    let level_name = level.to_string();
    let rows: Vec<(&str, String)> = vec![
        ("Questions", study.total.to_string()),
        ("Learned", study.learned.to_string()),
        ("Unlearned", study.unlearned().to_string()),
        ("Mastered", study.mastered.to_string()),
        ("Wrong", study.wrong.to_string()),
        ("Favorite", study.favorite.to_string()),
        (
            "Learn progress",
            format!("{:.1}%", study.learn_progress() * 100.0),
        ),
        (
            "Mastery progress",
            format!("{:.1}%", study.mastery_progress() * 100.0),
        ),
        ("Exams taken", exams.total_count.to_string()),
        ("Exams passed", exams.passed_count.to_string()),
        ("Pass rate", format!("{:.1}%", exams.pass_rate() * 100.0)),
        ("Highest score", format!("{:.2}", exams.highest_score)),
        ("Average score", format!("{:.2}", exams.average_score)),
        (
            "Fastest pass",
            exams
                .fastest_pass_time()
                .map(format_duration)
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];

    for (metric, value) in rows {
        table.add_row(vec![
            Cell::new(&level_name),
            Cell::new(metric),
            Cell::new(value),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// `mm:ss`, or `h:mm:ss` past an hour.
pub fn format_duration(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds().max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(chrono::Duration::seconds(75)), "01:15");
        assert_eq!(format_duration(chrono::Duration::minutes(125)), "2:05:00");
        assert_eq!(format_duration(chrono::Duration::seconds(-3)), "00:00");
    }
}
