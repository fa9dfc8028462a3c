//! Answer comparison.
//!
//! The only authority on correctness: study updates and exam scoring both
//! go through [`check_answer`].

/// Split a concatenated answer string such as `"AC"` into labels.
///
/// Whitespace is ignored.
pub fn split_labels(answer: &str) -> Vec<String> {
    answer
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(String::from)
        .collect()
}

/// Compare a correct-answer string against the labels a learner selected.
///
/// Selection order does not matter. There is no partial credit: a missing
/// or an extra label both fail.
pub fn check_answer<S: AsRef<str>>(correct: &str, submitted: &[S]) -> bool {
    let mut expected = split_labels(correct);
    let mut given: Vec<String> = submitted
        .iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if expected.len() != given.len() {
        return false;
    }

    expected.sort_unstable();
    given.sort_unstable();
    expected == given
}
