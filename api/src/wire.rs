/// Backend wire shapes that do not map one-to-one onto the domain types.
use crate::Match;
use serde::Deserialize;
use serde_json::Value;

/// Spring-style page envelope returned by `GET /bet/matches`. Only the fields
/// the client reads are declared.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    #[serde(default)]
    pub content: Vec<Match>,
    #[serde(default)]
    pub total_pages: usize,
}

/// Pull the human-readable message out of an error body.
///
/// The backend answers either `{"error": "..."}` or, for bean validation
/// failures, a map of field name to message. Returns `None` when the body
/// carries neither.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    if let Some(Value::String(msg)) = object.get("error") {
        return Some(msg.clone());
    }

    let mut fields: Vec<(&String, &str)> = object
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k, s)))
        .collect();
    if fields.is_empty() {
        return None;
    }
    fields.sort_by(|a, b| a.0.cmp(b.0));
    Some(
        fields
            .into_iter()
            .map(|(_, msg)| msg)
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_is_taken_verbatim() {
        let body = r#"{"error": "Match with id 3 already exists"}"#;
        assert_eq!(error_message(body).as_deref(), Some("Match with id 3 already exists"));
    }

    #[test]
    fn field_map_is_joined_in_key_order() {
        let body = r#"{"teamB": "Team B is required", "matchDate": "Match date is required"}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Match date is required; Team B is required")
        );
    }

    #[test]
    fn non_json_or_empty_body_has_no_message() {
        assert_eq!(error_message(""), None);
        assert_eq!(error_message("<html>bad gateway</html>"), None);
        assert_eq!(error_message("{}"), None);
    }

    #[test]
    fn page_envelope_ignores_extra_fields() {
        let body = r#"{"content": [], "totalPages": 4, "number": 0, "size": 5}"#;
        let page: PageResponse = serde_json::from_str(body).unwrap();
        assert_eq!(page.total_pages, 4);
        assert!(page.content.is_empty());
    }
}
