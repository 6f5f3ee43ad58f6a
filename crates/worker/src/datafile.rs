//! Newline-delimited data-file parsing.
//!
//! Each line is a JSON record `{text, meta}`. The entity name is
//! resolved from the metadata (`meta.domain`, falling back to
//! `meta.name`); lines without one are skipped and counted, never
//! fatal.

use serde::Deserialize;

use labelforge_core::annotation::ContextMeta;

/// One raw data-file record.
#[derive(Debug, Deserialize)]
struct DataRecord {
    #[serde(default)]
    text: String,
    #[serde(default)]
    meta: serde_json::Value,
}

/// A parsed, entity-resolved line of a data file.
#[derive(Debug, Clone)]
pub struct DataLine {
    pub fname: String,
    /// Zero-based position within the file.
    pub line_number: usize,
    pub entity: String,
    pub text: String,
    pub meta: serde_json::Value,
}

/// Entity name for a metadata blob: the domain when present, otherwise
/// the name. Whitespace-only values count as absent.
fn resolve_entity(meta: &serde_json::Value) -> Option<String> {
    let parsed: ContextMeta = serde_json::from_value(meta.clone()).ok()?;
    parsed
        .domain
        .or(parsed.name)
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}

/// Parse a file's contents into entity-resolved lines.
///
/// Returns the surviving lines and the number skipped. A line is
/// skipped when it is blank, fails to parse as JSON, or carries no
/// resolvable entity name.
pub fn parse_lines(fname: &str, contents: &str) -> (Vec<DataLine>, usize) {
    let mut lines = Vec::new();
    let mut skipped = 0;

    for (line_number, raw) in contents.lines().enumerate() {
        if raw.trim().is_empty() {
            skipped += 1;
            continue;
        }
        let record: DataRecord = match serde_json::from_str(raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(fname, line_number, error = %e, "Skipping unparseable line");
                skipped += 1;
                continue;
            }
        };
        let Some(entity) = resolve_entity(&record.meta) else {
            tracing::debug!(fname, line_number, "Skipping line without an entity name");
            skipped += 1;
            continue;
        };
        lines.push(DataLine {
            fname: fname.to_string(),
            line_number,
            entity,
            text: record.text,
            meta: record.meta,
        });
    }

    (lines, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_lines_resolve_entities() {
        let contents = concat!(
            r#"{"text": "Acme sells anvils.", "meta": {"domain": "acme.com"}}"#,
            "\n",
            r#"{"text": "Fox things.", "meta": {"name": "Fox Inc"}}"#,
        );
        let (lines, skipped) = parse_lines("a.jsonl", contents);
        assert_eq!(skipped, 0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].entity, "acme.com");
        assert_eq!(lines[0].line_number, 0);
        assert_eq!(lines[1].entity, "Fox Inc");
    }

    #[test]
    fn domain_takes_precedence_over_name() {
        let contents = r#"{"text": "t", "meta": {"name": "Acme", "domain": "acme.com"}}"#;
        let (lines, _) = parse_lines("a.jsonl", contents);
        assert_eq!(lines[0].entity, "acme.com");
    }

    #[test]
    fn lines_without_an_entity_are_skipped_and_counted() {
        let contents = concat!(
            r#"{"text": "no meta at all"}"#,
            "\n",
            r#"{"text": "blank domain", "meta": {"domain": "   "}}"#,
            "\n",
            r#"{"text": "kept", "meta": {"domain": "kept.com"}}"#,
        );
        let (lines, skipped) = parse_lines("a.jsonl", contents);
        assert_eq!(skipped, 2);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_number, 2);
    }

    #[test]
    fn garbage_and_blank_lines_are_skipped() {
        let contents = "not json\n\n   \n{\"text\": \"x\", \"meta\": {\"name\": \"n\"}}";
        let (lines, skipped) = parse_lines("a.jsonl", contents);
        assert_eq!(skipped, 3);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn missing_text_defaults_to_empty() {
        let contents = r#"{"meta": {"domain": "acme.com"}}"#;
        let (lines, skipped) = parse_lines("a.jsonl", contents);
        assert_eq!(skipped, 0);
        assert_eq!(lines[0].text, "");
    }
}
