/// Id of question `index` of page `page` in the question-bank index.
pub fn question_id(page: &str, index: usize) -> String {
    format!("{page}_{index}")
}

/// Recovers the owning page from a question-bank id by stripping the
/// trailing `_{index}`. Returns `None` when the id has no numeric suffix.
pub fn page_id_from_question_id(id: &str) -> Option<&str> {
    let (page, index) = id.rsplit_once('_')?;
    if page.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(page)
}
