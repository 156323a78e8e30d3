use serde::Serialize;

/// A text field decoded from the record form. Serializes as a bare string or list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ListOrScalar {
    Scalar(String),
    List(Vec<String>),
}

/// Render a list as `[a, b, c]`.
pub fn encode<S: AsRef<str>>(items: &[S]) -> String {
    let joined = items
        .iter()
        .map(|item| item.as_ref())
        .collect::<Vec<&str>>()
        .join(", ");
    format!("[{}]", joined)
}

/// Parse `[a, b]` into a list, anything else stays a scalar.
/// Items cannot contain `,`, `[` or `]`; there is no escaping.
pub fn decode(value: &str) -> ListOrScalar {
    let trimmed = value.trim();

    if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
        let inner = &trimmed[1..trimmed.len() - 1];
        if inner.trim().is_empty() {
            return ListOrScalar::List(Vec::new());
        }
        let items = inner.split(',').map(|item| item.trim().to_string()).collect();
        return ListOrScalar::List(items);
    }

    ListOrScalar::Scalar(value.to_string())
}
