//! hamprep-core: study progress, exam scoring, and answer checking.
//!
//! This crate defines the data model, the storage traits, and the two
//! engines that the rest of hamprep builds on.

pub mod answer;
pub mod bank;
pub mod error;
pub mod exam;
pub mod model;
pub mod session;
pub mod statistics;
pub mod study;
pub mod traits;

pub use error::{EngineError, StoreError};
pub use exam::{ExamConfig, ExamEngine, ExamSubmission};
pub use session::{ExamSession, SessionState};
pub use study::{StudyItem, StudyProgressEngine};
