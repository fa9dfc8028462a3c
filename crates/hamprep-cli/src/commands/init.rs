//! The `hamprep init` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let target = config_path.unwrap_or_else(|| PathBuf::from("hamprep.toml"));
    if target.exists() {
        println!("{} already exists, skipping.", target.display());
    } else {
        std::fs::write(&target, SAMPLE_CONFIG)
            .with_context(|| format!("failed to write {}", target.display()))?;
        println!("Created {}", target.display());
    }

    let config = hamprep_store::load_config_from(Some(&target))?;
    let bank = config.question_bank_path();
    if bank.exists() {
        println!("{} already exists, skipping.", bank.display());
    } else {
        write_sample_bank(&bank)?;
        println!("Created {}", bank.display());
    }

    println!("\nNext steps:");
    println!("  1. Replace {} with a full question bank", bank.display());
    println!("  2. Run: hamprep validate");
    println!("  3. Run: hamprep study random --level A");

    Ok(())
}

fn write_sample_bank(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, SAMPLE_BANK)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# hamprep configuration

# Records and the contact logbook live here.
data_dir = "./hamprep-data"

# Bank file or directory, relative to data_dir.
question_bank = "questions.json"

default_level = "A"
history_limit = 20
"#;

const SAMPLE_BANK: &str = r#"[
  {
    "id": 1,
    "questionCode": "LK0001",
    "chapterCode": "1.1",
    "bankCode": "A",
    "text": "Which agency issues amateur radio operator certificates?",
    "options": [
      {"label": "A", "text": "The radio regulatory authority"},
      {"label": "B", "text": "The local police station"},
      {"label": "C", "text": "The national broadcaster"},
      {"label": "D", "text": "Any amateur radio club"}
    ],
    "answer": "A",
    "level": "A"
  },
  {
    "id": 2,
    "questionCode": "LK0002",
    "chapterCode": "1.2",
    "bankCode": "A",
    "text": "Which of these are valid signal report components in the RST system?",
    "options": [
      {"label": "A", "text": "Readability"},
      {"label": "B", "text": "Range"},
      {"label": "C", "text": "Strength"},
      {"label": "D", "text": "Tone"}
    ],
    "answer": "ACD",
    "level": "A"
  },
  {
    "id": 3,
    "questionCode": "LK0003",
    "chapterCode": "2.1",
    "bankCode": "A",
    "text": "What does the Q-code QTH mean?",
    "options": "[{\"key\":\"A\",\"value\":\"My location is\"},{\"key\":\"B\",\"value\":\"I am busy\"},{\"key\":\"C\",\"value\":\"Stop sending\"},{\"key\":\"D\",\"value\":\"Your signals are fading\"}]",
    "answer": "A",
    "level": "A"
  },
  {
    "id": 101,
    "questionCode": "LK0101",
    "chapterCode": "3.1",
    "bankCode": "B",
    "text": "A half-wave dipole for 14.1 MHz is roughly how long?",
    "options": [
      {"label": "A", "text": "5 m"},
      {"label": "B", "text": "10 m"},
      {"label": "C", "text": "20 m"},
      {"label": "D", "text": "40 m"}
    ],
    "answer": "B",
    "level": "B"
  }
]
"#;
