//! Core data model types for hamprep.
//!
//! Questions are immutable and owned by the question store. Study records
//! and exam records are owned by the engines and persisted by the record
//! store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a question in the bank.
pub type QuestionId = i64;

/// Exam tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    /// Entry level.
    A,
    /// Intermediate level.
    B,
    /// Advanced level.
    C,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::A, Level::B, Level::C];

    pub(crate) fn index(self) -> usize {
        match self {
            Level::A => 0,
            Level::B => 1,
            Level::C => 2,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::A => write!(f, "A"),
            Level::B => write!(f, "B"),
            Level::C => write!(f, "C"),
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Level::A),
            "B" => Ok(Level::B),
            "C" => Ok(Level::C),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// Whether a question has one or several correct options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Single,
    Multiple,
}

impl QuestionType {
    /// The type implied by a correct-answer string.
    pub fn for_answer(answer: &str) -> Self {
        if answer.chars().filter(|c| !c.is_whitespace()).count() > 1 {
            QuestionType::Multiple
        } else {
            QuestionType::Single
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Single => write!(f, "single"),
            QuestionType::Multiple => write!(f, "multiple"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(QuestionType::Single),
            "multiple" | "multi" => Ok(QuestionType::Multiple),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// One labelled choice of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Option label, e.g. "A".
    pub label: String,
    /// Option text.
    pub text: String,
}

/// A multiple-choice question from the bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    /// Official question code, e.g. "MC1-0001".
    pub question_code: String,
    #[serde(default)]
    pub chapter_code: String,
    #[serde(default)]
    pub bank_code: String,
    /// Question text.
    pub text: String,
    /// Ordered options.
    pub options: Vec<QuestionOption>,
    /// Correct option labels concatenated, e.g. "AC".
    pub answer: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub level: Level,
}

impl Question {
    pub fn is_multiple(&self) -> bool {
        self.question_type == QuestionType::Multiple
    }

    /// Check a set of selected labels against this question's answer.
    pub fn check(&self, selected: &[String]) -> bool {
        crate::answer::check_answer(&self.answer, selected)
    }
}

/// Mutable per-question study state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyRecord {
    pub id: Uuid,
    pub question_id: QuestionId,
    pub is_learned: bool,
    pub is_mastered: bool,
    pub is_wrong: bool,
    pub is_favorite: bool,
    /// Number of wrong answers; only reset by clearing records.
    pub wrong_count: u32,
    #[serde(default)]
    pub last_study_time: Option<DateTime<Utc>>,
    /// Copy of the question's level for per-level aggregation.
    pub level: Level,
    /// Position in the current random-practice shuffle, if one is assigned.
    #[serde(default)]
    pub random_practice_order: Option<u32>,
    #[serde(default)]
    pub random_practice_done: bool,
}

impl StudyRecord {
    /// A fresh record with every flag cleared.
    pub fn new(question_id: QuestionId, level: Level) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_id,
            is_learned: false,
            is_mastered: false,
            is_wrong: false,
            is_favorite: false,
            wrong_count: 0,
            last_study_time: None,
            level,
            random_practice_order: None,
            random_practice_done: false,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.last_study_time = Some(Utc::now());
    }
}

/// Study list filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    All,
    Learned,
    Unlearned,
    Wrong,
    Favorite,
}

impl FilterKind {
    /// Whether a question with this record (or none) passes the filter.
    ///
    /// An absent record behaves as a record with every flag cleared.
    pub fn matches(self, record: Option<&StudyRecord>) -> bool {
        match self {
            FilterKind::All => true,
            FilterKind::Learned => record.is_some_and(|r| r.is_learned),
            FilterKind::Unlearned => !record.is_some_and(|r| r.is_learned),
            FilterKind::Wrong => record.is_some_and(|r| r.is_wrong),
            FilterKind::Favorite => record.is_some_and(|r| r.is_favorite),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::All => write!(f, "all"),
            FilterKind::Learned => write!(f, "learned"),
            FilterKind::Unlearned => write!(f, "unlearned"),
            FilterKind::Wrong => write!(f, "wrong"),
            FilterKind::Favorite => write!(f, "favorite"),
        }
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(FilterKind::All),
            "learned" => Ok(FilterKind::Learned),
            "unlearned" => Ok(FilterKind::Unlearned),
            "wrong" => Ok(FilterKind::Wrong),
            "favorite" | "favourite" => Ok(FilterKind::Favorite),
            other => Err(format!("unknown filter: {other}")),
        }
    }
}

/// The labels a candidate selected for one exam question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamAnswer {
    pub question_id: QuestionId,
    pub selected: Vec<String>,
}

/// A completed exam. Written once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRecord {
    pub id: Uuid,
    pub level: Level,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_questions: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    /// Percentage correct, 0 to 100.
    pub score: f64,
    pub is_passed: bool,
    pub pause_count: u32,
    pub question_ids: Vec<QuestionId>,
    pub answers: Vec<ExamAnswer>,
}

impl ExamRecord {
    /// Wall-clock time between start and end.
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Fraction of questions answered correctly, 0 to 1.
    pub fn accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            0.0
        } else {
            self.correct_count as f64 / self.total_questions as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_display_and_parse() {
        assert_eq!(Level::A.to_string(), "A");
        assert_eq!("b".parse::<Level>().unwrap(), Level::B);
        assert_eq!(" C ".parse::<Level>().unwrap(), Level::C);
        assert!("D".parse::<Level>().is_err());
    }

    #[test]
    fn question_type_follows_answer_length() {
        assert_eq!(QuestionType::for_answer("A"), QuestionType::Single);
        assert_eq!(QuestionType::for_answer("AC"), QuestionType::Multiple);
        assert_eq!(QuestionType::for_answer(" B "), QuestionType::Single);
    }

    #[test]
    fn new_record_is_blank() {
        let record = StudyRecord::new(7, Level::B);
        assert_eq!(record.question_id, 7);
        assert!(!record.is_learned && !record.is_mastered);
        assert!(!record.is_wrong && !record.is_favorite);
        assert_eq!(record.wrong_count, 0);
        assert_eq!(record.random_practice_order, None);
        assert!(!record.random_practice_done);
    }

    #[test]
    fn unlearned_filter_treats_missing_record_as_unlearned() {
        let mut record = StudyRecord::new(1, Level::A);
        assert!(FilterKind::Unlearned.matches(None));
        assert!(FilterKind::Unlearned.matches(Some(&record)));
        assert!(!FilterKind::Learned.matches(None));
        assert!(!FilterKind::Wrong.matches(None));

        record.is_learned = true;
        assert!(!FilterKind::Unlearned.matches(Some(&record)));
        assert!(FilterKind::Learned.matches(Some(&record)));
        assert!(FilterKind::All.matches(Some(&record)));
    }

    #[test]
    fn exam_record_duration_and_accuracy() {
        let start = Utc::now();
        let record = ExamRecord {
            id: Uuid::nil(),
            level: Level::A,
            start_time: start,
            end_time: start + Duration::minutes(25),
            total_questions: 40,
            correct_count: 30,
            wrong_count: 10,
            score: 75.0,
            is_passed: true,
            pause_count: 0,
            question_ids: vec![],
            answers: vec![],
        };
        assert_eq!(record.duration(), Duration::minutes(25));
        assert!((record.accuracy() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn study_record_serde_roundtrip() {
        let mut record = StudyRecord::new(42, Level::C);
        record.random_practice_order = Some(3);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"randomPracticeOrder\":3"));
        let back: StudyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
