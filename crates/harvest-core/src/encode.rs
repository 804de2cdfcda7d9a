//! Batch encoders: delimited text and pretty JSON.

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::AppError;
use crate::models::PostRecord;

/// Header row of the delimited-text export. Flair is not a column.
pub const CSV_HEADER: &str = "Post ID,Title,Content,Votes,Comments";

/// Encode records as delimited text: fixed header, then one fully quoted
/// row per record with embedded quotes doubled.
pub fn encode_csv(records: &[PostRecord]) -> Result<String, AppError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for r in records {
        writer
            .write_record([
                &r.post_id,
                &r.title,
                &r.content,
                &r.score,
                &r.comment_count,
            ])
            .map_err(|e| AppError::EncodeError(e.to_string()))?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| AppError::EncodeError(e.to_string()))?;
    let body = String::from_utf8(body).map_err(|e| AppError::EncodeError(e.to_string()))?;

    Ok(format!("{CSV_HEADER}\n{body}"))
}

/// Encode records as a pretty-printed JSON array (2-space indent).
pub fn encode_json(records: &[PostRecord]) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn decode_json(text: &str) -> Result<Vec<PostRecord>, AppError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NO_FLAIR, NOT_FOUND};

    fn sample() -> Vec<PostRecord> {
        let mut a = PostRecord::bare("t3_a");
        a.title = r#"He said "hi""#.into();
        a.content = "first paragraph\n\nsecond, with comma".into();
        a.score = "42".into();
        a.comment_count = "7".into();
        a.flair = Some("Vent".into());

        let mut b = PostRecord::bare("t3_b");
        b.title = "Grüße, 你好".into();
        b.flair = Some(NO_FLAIR.into());

        vec![a, b]
    }

    #[test]
    fn csv_header_and_quoting() {
        let text = encode_csv(&sample()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some(r#""t3_a","He said ""hi""","first paragraph"#)
        );
        assert!(text.ends_with('\n'));
        assert!(!text.contains("Vent"), "flair must not be exported as a column");
    }

    #[test]
    fn csv_parses_back_with_standard_reader() {
        let records = sample();
        let text = encode_csv(&records).unwrap();

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            ["Post ID", "Title", "Content", "Votes", "Comments"]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], r#"He said "hi""#);
        assert_eq!(&rows[0][2], "first paragraph\n\nsecond, with comma");
        assert_eq!(&rows[1][1], "Grüße, 你好");
        assert_eq!(&rows[1][3], NOT_FOUND);
    }

    #[test]
    fn empty_batch_is_header_only() {
        assert_eq!(encode_csv(&[]).unwrap(), format!("{CSV_HEADER}\n"));
        assert_eq!(encode_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn json_round_trip_preserves_order_and_fields() {
        let records = sample();
        let text = encode_json(&records).unwrap();
        assert!(text.contains("\n  {\n    \"postId\": \"t3_a\""));
        assert_eq!(decode_json(&text).unwrap(), records);
    }
}
