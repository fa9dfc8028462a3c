//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

/// A `hamprep` command isolated inside `dir`.
fn hamprep(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("hamprep").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("HAMPREP_DATA_DIR")
        .env_remove("HAMPREP_QUESTION_BANK")
        .env_remove("RUST_LOG");
    cmd
}

fn init(dir: &Path) {
    hamprep(dir).arg("init").assert().success();
}

/// Write a level A bank of `n` questions; odd ids answer "AC", even ids "B".
fn write_bank(dir: &Path, n: i64) {
    let questions: Vec<Value> = (1..=n)
        .map(|id| {
            json!({
                "id": id,
                "questionCode": format!("T{id:04}"),
                "text": format!("Question {id}"),
                "options": [
                    {"label": "A", "text": "alpha"},
                    {"label": "B", "text": "bravo"},
                    {"label": "C", "text": "charlie"},
                    {"label": "D", "text": "delta"}
                ],
                "answer": if id % 2 == 1 { "AC" } else { "B" },
                "level": "A"
            })
        })
        .collect();
    let data = dir.join("hamprep-data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("questions.json"),
        serde_json::to_string(&questions).unwrap(),
    )
    .unwrap();
}

fn correct_labels(id: i64) -> &'static str {
    if id % 2 == 1 {
        "CA"
    } else {
        "B"
    }
}

// --- Basics ---

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    hamprep(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Amateur-radio licence exam trainer"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    hamprep(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hamprep"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    hamprep(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created hamprep.toml"))
        .stdout(predicate::str::contains("questions.json"));

    assert!(dir.path().join("hamprep.toml").exists());
    assert!(dir.path().join("hamprep-data/questions.json").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();
    init(dir.path());

    hamprep(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn missing_bank_points_at_init() {
    let dir = TempDir::new().unwrap();
    hamprep(dir.path())
        .args(["stats", "--level", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("hamprep init"));
}

#[test]
fn unknown_level_is_rejected() {
    let dir = TempDir::new().unwrap();
    init(dir.path());
    hamprep(dir.path())
        .args(["stats", "--level", "D"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("D"));
}

// --- Validate ---

#[test]
fn validate_sample_bank() {
    let dir = TempDir::new().unwrap();
    init(dir.path());

    hamprep(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("4 questions; A: 3, B: 1, C: 0"))
        .stdout(predicate::str::contains("All questions valid."));
}

#[test]
fn validate_reports_problems() {
    let dir = TempDir::new().unwrap();
    let bank = dir.path().join("bad.json");
    std::fs::write(
        &bank,
        r#"[
  {"id": 1, "text": "ok", "options": [{"label": "A", "text": "x"}], "answer": "E", "level": "A"},
  {"id": 1, "text": "", "options": [], "answer": "A", "level": "B"}
]"#,
    )
    .unwrap();

    hamprep(dir.path())
        .arg("validate")
        .arg("--bank")
        .arg(&bank)
        .assert()
        .success()
        .stdout(predicate::str::contains("[1] WARNING: answer label E"))
        .stdout(predicate::str::contains("duplicate question ID"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();
    hamprep(dir.path())
        .args(["validate", "--bank", "nonexistent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

// --- Study ---

#[test]
fn study_answers_accumulate() {
    let dir = TempDir::new().unwrap();
    init(dir.path());

    hamprep(dir.path())
        .args(["study", "answer", "--question", "2", "--selected", "AC"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The answer is ACD"))
        .stdout(predicate::str::contains("wrong=yes (1x)"));

    // Order and case of the selection do not matter.
    hamprep(dir.path())
        .args(["study", "answer", "--question", "2", "--selected", "d,c,a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Correct."))
        .stdout(predicate::str::contains("wrong=yes (1x)"));

    hamprep(dir.path())
        .args(["study", "list", "--level", "A", "--filter", "wrong"])
        .assert()
        .success()
        .stdout(predicate::str::contains("LK0002"))
        .stdout(predicate::str::contains("1 question(s)"));

    hamprep(dir.path())
        .args(["study", "list", "--level", "A", "--filter", "unlearned"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 question(s)"));

    hamprep(dir.path())
        .args(["stats", "--level", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Learned"))
        .stdout(predicate::str::contains("33.3%"));
}

#[test]
fn study_answer_needs_a_selection() {
    let dir = TempDir::new().unwrap();
    init(dir.path());
    hamprep(dir.path())
        .args(["study", "answer", "--question", "1"])
        .assert()
        .failure();
}

#[test]
fn study_answer_is_checked_against_the_bank() {
    let dir = TempDir::new().unwrap();
    init(dir.path());

    hamprep(dir.path())
        .args(["study", "answer", "--question", "1", "--selected", "B"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrong. The answer is A."));

    hamprep(dir.path())
        .args(["study", "answer", "--question", "1", "--selected", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Correct."))
        .stdout(predicate::str::contains("wrong=yes (1x)"));

    hamprep(dir.path())
        .args(["study", "answer", "--question", "1", "--selected", "Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("question 1 has no option Z"));
}

#[test]
fn study_unknown_question() {
    let dir = TempDir::new().unwrap();
    init(dir.path());
    hamprep(dir.path())
        .args(["study", "favorite", "--question", "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("question 999 not found"));
}

#[test]
fn study_toggles_and_clear() {
    let dir = TempDir::new().unwrap();
    init(dir.path());

    hamprep(dir.path())
        .args(["study", "favorite", "--question", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("favorite=yes"));
    hamprep(dir.path())
        .args(["study", "master", "--question", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("learned=yes mastered=yes"));
    hamprep(dir.path())
        .args(["study", "favorite", "--question", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("favorite=no"));

    hamprep(dir.path())
        .args(["study", "clear", "--level", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 study record(s) for level A."));
}

#[test]
fn study_search_by_keyword() {
    let dir = TempDir::new().unwrap();
    init(dir.path());

    hamprep(dir.path())
        .args(["study", "search", "--level", "A", "--keyword", "q-code"])
        .assert()
        .success()
        .stdout(predicate::str::contains("LK0003"))
        .stdout(predicate::str::contains("1 match(es)"));
}

#[test]
fn random_practice_walks_the_queue() {
    let dir = TempDir::new().unwrap();
    init(dir.path());

    hamprep(dir.path())
        .args(["study", "random", "--level", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 question(s) left in level A."));

    for id in ["1", "2", "3"] {
        hamprep(dir.path())
            .args(["study", "random", "--level", "A", "--done", id])
            .assert()
            .success();
    }
    hamprep(dir.path())
        .args(["study", "random", "--level", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete"));

    hamprep(dir.path())
        .args(["study", "random", "--level", "A", "--reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restarted practice for 3 question(s)."))
        .stdout(predicate::str::contains("3 question(s) left"));
}

// --- Exams ---

#[test]
fn exam_start_with_small_pool_fails() {
    let dir = TempDir::new().unwrap();
    init(dir.path());

    hamprep(dir.path())
        .args(["exam", "start", "--level", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("40 requested"));
}

#[test]
fn exam_submit_scores_session() {
    let dir = TempDir::new().unwrap();
    write_bank(dir.path(), 45);
    let session_path = dir.path().join("session.json");

    hamprep(dir.path())
        .args(["exam", "start", "--level", "A", "--output"])
        .arg(&session_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("40 questions, pass with 30 correct"));

    let mut session: Value =
        serde_json::from_str(&std::fs::read_to_string(&session_path).unwrap()).unwrap();
    let ids: Vec<i64> = session["questionIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    assert_eq!(ids.len(), 40);

    // 30 right, 5 wrong, 5 left blank.
    let mut answers = serde_json::Map::new();
    for (i, id) in ids.iter().enumerate() {
        if i < 30 {
            answers.insert(id.to_string(), json!(correct_labels(*id)));
        } else if i < 35 {
            answers.insert(id.to_string(), json!("D"));
        }
    }
    session["answers"] = Value::Object(answers);
    session["endTime"] = json!("2030-01-01T00:00:00Z");
    session["startTime"] = json!("2029-12-31T23:35:00Z");
    std::fs::write(&session_path, session.to_string()).unwrap();

    hamprep(dir.path())
        .args(["exam", "submit", "--level", "A", "--answers"])
        .arg(&session_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 75.00 (30/40) PASSED"))
        .stdout(predicate::str::contains("Time: 25:00"));

    hamprep(dir.path())
        .args(["exam", "history", "--level", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30/40"))
        .stdout(predicate::str::contains("pass"));

    hamprep(dir.path())
        .args(["stats", "--level", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fastest pass"))
        .stdout(predicate::str::contains("25:00"));
}

#[test]
fn exam_submit_uses_the_session_level() {
    let dir = TempDir::new().unwrap();
    write_bank(dir.path(), 40);
    let session_path = dir.path().join("session.json");

    hamprep(dir.path())
        .args(["exam", "start", "--level", "A", "--output"])
        .arg(&session_path)
        .assert()
        .success();

    let mut session: Value =
        serde_json::from_str(&std::fs::read_to_string(&session_path).unwrap()).unwrap();
    assert_eq!(session["level"], json!("A"));

    hamprep(dir.path())
        .args(["exam", "submit", "--level", "B", "--answers"])
        .arg(&session_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("drawn for level A, not B"));

    // Relabelling the session does not make the level A draw a level B exam.
    session["level"] = json!("B");
    std::fs::write(&session_path, session.to_string()).unwrap();
    hamprep(dir.path())
        .args(["exam", "submit", "--answers"])
        .arg(&session_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("level B exam needs 60 distinct questions"));

    hamprep(dir.path())
        .args(["exam", "history", "--level", "B"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No level B exams yet."));
}

#[test]
fn exam_history_empty() {
    let dir = TempDir::new().unwrap();
    init(dir.path());
    hamprep(dir.path())
        .args(["exam", "history", "--level", "B"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No level B exams yet."));
}

// --- Logbook ---

#[test]
fn logbook_csv_import_then_json_export() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("contacts.csv");
    std::fs::write(
        &csv_path,
        "contactTime,mode,frequency,cqZone,myCallsign,theirCallsign,rstSent,rstReceived,myPower,theirPower,theirQth,equipment,antenna,notes\n\
         1700000000000,SSB,14.270,24,BG1AAA,JA1XYZ,59,57,100W,,Tokyo,,,\n\
         garbage,SSB,14.270,,BG1AAA,JA1XYZ,59,57,,,,,,\n\
         1700000600000,FT8,7.074,,BG1AAA,VK2ABC,-08,-15,,,,,,\"QSL, direct\"\n",
    )
    .unwrap();

    hamprep(dir.path())
        .args(["logbook", "import", "--format", "csv", "--file"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 contact(s), skipped 1."));

    assert!(dir.path().join("hamprep-data/contacts.json").exists());

    let json_path = dir.path().join("export.json");
    hamprep(dir.path())
        .args(["logbook", "export", "--format", "json", "--file"])
        .arg(&json_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 contact(s)"));

    let exported: Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(exported["version"], 1);
    assert!(exported["exportTime"].as_str().unwrap().ends_with('Z'));
    assert_eq!(exported["logs"][0]["theirQth"], "Tokyo");
    assert_eq!(exported["logs"][1]["notes"], "QSL, direct");
}

#[test]
fn logbook_export_csv_round_trips() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("in.json");
    std::fs::write(
        &source,
        r#"{"version": 1, "exportTime": "2024-01-01T00:00:00.000Z", "logs": [
            {"contactTime": 1, "mode": "CW", "frequency": "7.025", "myCallsign": "A",
             "theirCallsign": "B", "rstSent": "599", "rstReceived": "579"}
        ]}"#,
    )
    .unwrap();

    hamprep(dir.path())
        .args(["logbook", "import", "--file"])
        .arg(&source)
        .assert()
        .success();

    let csv_path = dir.path().join("out.csv");
    hamprep(dir.path())
        .args(["logbook", "export", "--format", "csv", "--file"])
        .arg(&csv_path)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("contactTime,mode,frequency,cqZone"));
    assert_eq!(lines.next().unwrap(), "1,CW,7.025,,A,B,599,579,,,,,,");
}
