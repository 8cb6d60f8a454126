//! Separates survey question columns from administrative ones.

use log::info;

/// Column names that are never questions unless they contain a `?`.
pub const EXCLUDED_HEADERS: [&str; 10] = [
    "id",
    "nome",
    "cognome",
    "email",
    "e-mail",
    "timestamp",
    "data",
    "ora",
    "indirizzo",
    "telefono",
];

const MIN_QUESTION_WORDS: usize = 3;
const MIN_QUESTION_CHARS: usize = 12;

/// Lexical test for a single column name.
pub fn is_question(name: &str) -> bool {
    let s = name.trim();
    if s.contains('?') {
        return true;
    }
    let lower = s.to_lowercase();
    if EXCLUDED_HEADERS.contains(&lower.as_str()) {
        return false;
    }
    s.split_whitespace().count() >= MIN_QUESTION_WORDS && s.chars().count() > MIN_QUESTION_CHARS
}

/// Keeps the question columns, or every column when none qualifies.
pub fn filter_questions(columns: &[String]) -> Vec<String> {
    let questions: Vec<String> = columns.iter().filter(|c| is_question(c)).cloned().collect();
    if questions.is_empty() {
        info!(
            "no column looks like a question; keeping all {} columns",
            columns.len()
        );
        return columns.to_vec();
    }
    questions
}

/// Applies the `maxQuestionsToShow` limit.
pub fn truncate_questions(mut questions: Vec<String>, limit: Option<usize>) -> Vec<String> {
    if let Some(limit) = limit.filter(|&n| n > 0) {
        questions.truncate(limit);
    }
    questions
}

/// Case-insensitive substring search over question names.
pub fn search_questions<'a>(questions: &'a [String], term: &str) -> Vec<&'a str> {
    let term = term.to_lowercase();
    questions
        .iter()
        .filter(|q| q.to_lowercase().contains(&term))
        .map(String::as_str)
        .collect()
}
