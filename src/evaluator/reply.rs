//! Pulling structured JSON out of free-form model replies

use serde::de::DeserializeOwned;

use super::EvaluatorError;

/// Find the first balanced `{...}` object in `text`.
///
/// String literals are tracked so braces inside quoted values do not
/// confuse the depth count. Markdown fences around the object are ignored
/// because only the object itself is returned.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Extract and deserialize the first JSON object in a reply
pub fn parse_reply<T: DeserializeOwned>(text: &str) -> Result<T, EvaluatorError> {
    let object = extract_json_object(text).ok_or(EvaluatorError::MalformedReply)?;
    serde_json::from_str(object).map_err(|_| EvaluatorError::MalformedReply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        a: String,
    }

    #[test]
    fn finds_object_inside_markdown_fence() {
        let text = "Here you go:\n```json\n{\"a\": \"x\"}\n```\nGood luck!";
        assert_eq!(extract_json_object(text), Some("{\"a\": \"x\"}"));
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let text = r#"{"a": "open { and close } \" quote"} trailing {"b": 1}"#;
        let sample: Sample = parse_reply(text).unwrap();
        assert_eq!(sample.a, "open { and close } \" quote");
    }

    #[test]
    fn handles_nested_objects() {
        let text = r#"prefix {"a": "v", "n": {"m": {}}} suffix"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": "v", "n": {"m": {}}}"#));
    }

    #[test]
    fn unbalanced_or_missing_object_is_malformed() {
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("{\"a\": ").is_none());
        assert!(matches!(
            parse_reply::<Sample>("{\"b\": 1}"),
            Err(EvaluatorError::MalformedReply)
        ));
    }
}
