/// Count maximal runs of non-whitespace characters in `text`.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
