/// Validates a user-supplied API key name.
/// Rules:
/// - 1-100 characters after trimming surrounding whitespace
pub fn is_valid_key_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name.chars().count() <= 100
}
