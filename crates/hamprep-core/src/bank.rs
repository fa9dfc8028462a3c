//! Question bank loader.
//!
//! Loads question banks from JSON files and directories, and validates them.
//! Options are decoded once here into typed label/text pairs.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Level, Question, QuestionId, QuestionOption, QuestionType};

/// Intermediate structure for one question row.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    id: QuestionId,
    #[serde(default)]
    question_code: String,
    #[serde(default)]
    chapter_code: String,
    #[serde(default)]
    bank_code: String,
    #[serde(alias = "question")]
    text: String,
    #[serde(default)]
    options: RawOptions,
    answer: String,
    #[serde(default, rename = "type")]
    question_type: Option<String>,
    level: String,
}

/// Options arrive either as a typed list or as a JSON-encoded string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOptions {
    List(Vec<QuestionOption>),
    Encoded(String),
}

impl Default for RawOptions {
    fn default() -> Self {
        RawOptions::List(Vec::new())
    }
}

/// Decode a JSON-encoded option list.
///
/// Accepts `[{"label":"A","text":"..."}]` or the legacy
/// `[{"key":"A","value":"..."}]` form. Corrupt input yields an empty list.
pub fn decode_options(encoded: &str) -> Vec<QuestionOption> {
    #[derive(Deserialize)]
    struct LegacyOption {
        #[serde(alias = "label")]
        key: String,
        #[serde(alias = "text")]
        value: String,
    }

    match serde_json::from_str::<Vec<LegacyOption>>(encoded) {
        Ok(options) => options
            .into_iter()
            .map(|o| QuestionOption {
                label: o.key,
                text: o.value,
            })
            .collect(),
        Err(e) => {
            tracing::warn!("discarding corrupt options field: {e}");
            Vec::new()
        }
    }
}

/// Parse a bank file.
pub fn parse_bank(path: &Path) -> Result<Vec<Question>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a bank from a JSON string (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<Vec<Question>> {
    let rows: Vec<RawQuestion> = serde_json::from_str(content)
        .with_context(|| format!("failed to parse question bank: {}", source_path.display()))?;

    rows.into_iter()
        .map(|row| {
            let level: Level = row
                .level
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", row.id, e))?;

            let question_type = match row.question_type {
                Some(t) => t
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!("question {}: {}", row.id, e))?,
                None => QuestionType::for_answer(&row.answer),
            };

            let options = match row.options {
                RawOptions::List(options) => options,
                RawOptions::Encoded(encoded) => decode_options(&encoded),
            };

            Ok(Question {
                id: row.id,
                question_code: row.question_code,
                chapter_code: row.chapter_code,
                bank_code: row.bank_code,
                text: row.text,
                options,
                answer: row.answer.split_whitespace().collect(),
                question_type,
                level,
            })
        })
        .collect()
}

/// Recursively load all `.json` banks from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<Question>> {
    let mut questions = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            questions.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            match parse_bank(&path) {
                Ok(bank) => questions.extend(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(questions)
}

/// Load a bank from a file or a directory of files.
pub fn load_bank(path: &Path) -> Result<Vec<Question>> {
    if path.is_dir() {
        load_bank_directory(path)
    } else {
        parse_bank(path)
    }
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct BankWarning {
    /// The question ID (if applicable).
    pub question_id: Option<QuestionId>,
    /// Warning message.
    pub message: String,
}

/// Validate a bank for common issues.
pub fn validate_bank(questions: &[Question]) -> Vec<BankWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for q in questions {
        if !seen_ids.insert(q.id) {
            warnings.push(BankWarning {
                question_id: Some(q.id),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in questions {
        if q.text.trim().is_empty() {
            warnings.push(BankWarning {
                question_id: Some(q.id),
                message: "question text is empty".into(),
            });
        }

        if q.options.is_empty() {
            warnings.push(BankWarning {
                question_id: Some(q.id),
                message: "question has no options".into(),
            });
        } else {
            let labels: HashSet<String> = q.options.iter().map(|o| o.label.clone()).collect();
            for label in crate::answer::split_labels(&q.answer) {
                if !labels.contains(&label) {
                    warnings.push(BankWarning {
                        question_id: Some(q.id),
                        message: format!("answer label {label} is not among the options"),
                    });
                }
            }
        }

        if q.answer.is_empty() {
            warnings.push(BankWarning {
                question_id: Some(q.id),
                message: "answer is empty".into(),
            });
        } else if q.question_type != QuestionType::for_answer(&q.answer) {
            warnings.push(BankWarning {
                question_id: Some(q.id),
                message: format!(
                    "type is {} but answer \"{}\" implies {}",
                    q.question_type,
                    q.answer,
                    QuestionType::for_answer(&q.answer)
                ),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_BANK: &str = r#"[
  {
    "id": 1,
    "questionCode": "MC1-0001",
    "chapterCode": "1.1",
    "bankCode": "A",
    "question": "Which body issues amateur radio licences?",
    "options": [
      {"label": "A", "text": "The radio regulator"},
      {"label": "B", "text": "The post office"}
    ],
    "answer": "A",
    "type": "single",
    "level": "A"
  },
  {
    "id": 2,
    "questionCode": "MC2-0002",
    "question": "Which bands are HF?",
    "options": "[{\"key\":\"A\",\"value\":\"20m\"},{\"key\":\"B\",\"value\":\"2m\"},{\"key\":\"C\",\"value\":\"40m\"}]",
    "answer": "AC",
    "level": "b"
  }
]"#;

    #[test]
    fn parse_valid_bank() {
        let bank = parse_bank_str(VALID_BANK, &PathBuf::from("bank.json")).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank[0].level, Level::A);
        assert_eq!(bank[0].options.len(), 2);
        assert_eq!(bank[0].options[0].label, "A");
        assert!(!bank[0].is_multiple());
    }

    #[test]
    fn encoded_options_are_decoded_once() {
        let bank = parse_bank_str(VALID_BANK, &PathBuf::from("bank.json")).unwrap();
        let q = &bank[1];
        assert_eq!(q.level, Level::B);
        assert_eq!(q.question_type, QuestionType::Multiple);
        let labels: Vec<&str> = q.options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        assert_eq!(q.options[2].text, "40m");
    }

    #[test]
    fn corrupt_options_become_empty() {
        assert!(decode_options("not json [").is_empty());
        let bank = r#"[{"id": 5, "question": "q", "options": "{{broken", "answer": "A", "level": "A"}]"#;
        let parsed = parse_bank_str(bank, &PathBuf::from("bank.json")).unwrap();
        assert!(parsed[0].options.is_empty());
        let warnings = validate_bank(&parsed);
        assert!(warnings.iter().any(|w| w.message.contains("no options")));
    }

    #[test]
    fn unknown_level_is_an_error() {
        let bank = r#"[{"id": 1, "question": "q", "answer": "A", "level": "Z"}]"#;
        let err = parse_bank_str(bank, &PathBuf::from("bank.json")).unwrap_err();
        assert!(err.to_string().contains("unknown level"));
    }

    #[test]
    fn validate_flags_problems() {
        let bank = r#"[
          {"id": 1, "question": "q1", "options": [{"label":"A","text":"x"}], "answer": "B", "level": "A"},
          {"id": 1, "question": " ", "options": [{"label":"A","text":"x"},{"label":"B","text":"y"}], "answer": "AB", "type": "single", "level": "A"}
        ]"#;
        let parsed = parse_bank_str(bank, &PathBuf::from("bank.json")).unwrap();
        let warnings = validate_bank(&parsed);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message.contains("not among")));
        assert!(warnings.iter().any(|w| w.message.contains("empty")));
        assert!(warnings.iter().any(|w| w.message.contains("implies multiple")));
    }

    #[test]
    fn parse_malformed_json() {
        let result = parse_bank_str("this is not [valid json }{", &PathBuf::from("bad.json"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bank.json"), VALID_BANK).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let questions = load_bank_directory(dir.path()).unwrap();
        assert_eq!(questions.len(), 2);
    }
}
