//! Storage key layout for conversation attachments.
//!
//! Originals live at `conversations/{conversation_id}/{file_id}/original/{file_name}`
//! and derived thumbnails next to them under `thumbnail/`.

const ORIGINAL_SEGMENT: &str = "/original/";
const THUMBNAIL_SEGMENT: &str = "/thumbnail/";

/// Build the key of an uploaded original.
///
/// Every segment is sanitized, so the result always has exactly five
/// `/`-separated parts regardless of input.
#[must_use]
pub fn storage_key(conversation_id: &str, file_id: &str, file_name: &str) -> String {
    format!(
        "conversations/{}/{}/original/{}",
        sanitize_segment(conversation_id),
        sanitize_segment(file_id),
        sanitize_segment(file_name)
    )
}

/// Key for the PNG thumbnail derived from `original_key`.
#[must_use]
pub fn thumbnail_key(original_key: &str) -> String {
    match original_key.rsplit_once(ORIGINAL_SEGMENT) {
        Some((prefix, file_name)) => {
            let stem = file_name
                .rsplit_once('.')
                .map_or(file_name, |(stem, _)| stem);
            format!("{prefix}{THUMBNAIL_SEGMENT}{stem}.png")
        }
        None => format!("{original_key}.thumbnail.png"),
    }
}

/// Sanitize a key segment.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
/// A segment made only of dots would be a path traversal and is replaced.
fn sanitize_segment(segment: &str) -> String {
    let sanitized: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        "_".repeat(sanitized.len().max(1))
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_storage_key_layout() {
        assert_eq!(
            storage_key("c1", "f1", "photo.png"),
            "conversations/c1/f1/original/photo.png"
        );
    }

    #[rstest]
    #[case("invoice.pdf", "invoice.pdf")]
    #[case("my file (1).pdf", "my_file__1_.pdf")]
    #[case("test@#$%.doc", "test____.doc")]
    #[case("日本語.pdf", "___.pdf")]
    #[case("../../etc/passwd", ".._.._etc_passwd")]
    #[case("..", "__")]
    #[case("", "_")]
    fn test_sanitize_segment(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_segment(input), expected);
    }

    #[rstest]
    #[case("conversations/c1/f1/original/photo.png", "conversations/c1/f1/thumbnail/photo.png")]
    #[case("conversations/c1/f1/original/photo.final.jpg", "conversations/c1/f1/thumbnail/photo.final.png")]
    #[case("conversations/c1/f1/original/noext", "conversations/c1/f1/thumbnail/noext.png")]
    #[case("elsewhere/photo.png", "elsewhere/photo.png.thumbnail.png")]
    fn test_thumbnail_key(#[case] original: &str, #[case] expected: &str) {
        assert_eq!(thumbnail_key(original), expected);
    }

    proptest! {
        #[test]
        fn prop_storage_key_has_fixed_shape(
            conversation_id in ".*",
            file_id in ".*",
            file_name in ".*",
        ) {
            let key = storage_key(&conversation_id, &file_id, &file_name);
            let parts: Vec<&str> = key.split('/').collect();

            prop_assert_eq!(parts.len(), 5);
            prop_assert_eq!(parts[0], "conversations");
            prop_assert_eq!(parts[3], "original");
            for part in &parts {
                prop_assert!(!part.is_empty());
                prop_assert!(part.chars().any(|c| c != '.'));
            }
        }

        #[test]
        fn prop_storage_key_is_deterministic(
            conversation_id in "[a-zA-Z0-9_-]{1,20}",
            file_id in "[a-zA-Z0-9_-]{1,20}",
            file_name in "[a-zA-Z0-9_-]{1,30}\\.[a-z]{2,4}",
        ) {
            let first = storage_key(&conversation_id, &file_id, &file_name);
            let second = storage_key(&conversation_id, &file_id, &file_name);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(
                first,
                format!("conversations/{conversation_id}/{file_id}/original/{file_name}")
            );
        }

        #[test]
        fn prop_sanitized_segment_safe_chars(segment in ".*") {
            let sanitized = sanitize_segment(&segment);
            for c in sanitized.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in sanitized segment: {}", c);
            }
        }
    }
}
