/// Derive the URL slug of a blog title.
///
/// Anything that is not alphanumeric or `_` becomes a separator, runs of
/// separators collapse, and the remaining words are lower-cased and joined
/// with `-`. Feeding a slug back in returns it unchanged.
pub fn generate_slug(title: &str) -> String {
    title
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
