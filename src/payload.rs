//! Form payloads for the REDCap API.
//!
//! Every REDCap call is a form-encoded POST to a single endpoint. The
//! `content` field selects the operation, and array parameters are flattened
//! into indexed keys (`records[0]`, `fields[1]`, ...).

use crate::config::Configuration;
use crate::record::Record;
use crate::{Error, Result};
use std::fmt;

/// Field that identifies a row in every REDCap project.
pub const RECORD_ID: &str = "record_id";

/// The `content` parameter of a REDCap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Content {
    Project,
    Metadata,
    Record,
    SurveyLink,
}

impl Content {
    pub fn as_str(&self) -> &'static str {
        match self {
            Content::Project => "project",
            Content::Metadata => "metadata",
            Content::Record => "record",
            Content::SurveyLink => "surveyLink",
        }
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a record import reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnContent {
    /// `{"count": n}` with the number of rows written.
    Count,
    /// A JSON array with the ids of the rows written.
    Ids,
}

impl ReturnContent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnContent::Count => "count",
            ReturnContent::Ids => "ids",
        }
    }
}

/// An ordered list of form fields.
///
/// Equal payloads hash equally, which is what the response memo cache keys on.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Payload {
    pairs: Vec<(String, String)>,
}

impl Payload {
    /// Starts a payload with the `token`, `format` and `content` fields.
    pub fn new(config: &Configuration, content: Content) -> Self {
        let mut payload = Self::default();
        payload.push("token", config.token());
        payload.push("format", config.format().as_str());
        payload.push("content", content.as_str());
        payload
    }

    /// Appends a field, keeping insertion order.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Appends `name[0]`, `name[1]`, ... for each value.
    pub fn push_indexed<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (index, value) in values.into_iter().enumerate() {
            self.push(format!("{}[{}]", name, index), value);
        }
    }

    /// Returns the value of the first field named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.pairs {
            if key == "token" {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// Returns `fields` with `record_id` guaranteed present exactly once.
///
/// An empty list stays empty, meaning "all fields". When `record_id` is
/// missing it is put first.
pub fn with_record_id(fields: &[String]) -> Vec<String> {
    if fields.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(fields.len() + 1);
    out.push(RECORD_ID.to_string());
    for field in fields {
        if !out.contains(field) {
            out.push(field.clone());
        }
    }
    out
}

/// Builds an export payload.
///
/// Record ids and field names are expanded into indexed keys in the order
/// given. A non-empty field list always carries `record_id`. A filter is sent
/// verbatim as `filterLogic`.
///
/// # Examples
///
/// ```
/// use redcap::payload::{build, Content};
/// use redcap::Configuration;
///
/// let config = Configuration::new("https://x.test", "T1");
/// let payload = build(&config, Content::Record, &[], &["name".to_string()], None);
/// assert_eq!(payload.get("fields[0]"), Some("record_id"));
/// assert_eq!(payload.get("fields[1]"), Some("name"));
/// ```
pub fn build(
    config: &Configuration,
    content: Content,
    records: &[String],
    fields: &[String],
    filter: Option<&str>,
) -> Payload {
    let mut payload = Payload::new(config, content);
    payload.push_indexed("records", records.iter().cloned());
    payload.push_indexed("fields", with_record_id(fields));
    if let Some(filter) = filter {
        payload.push("filterLogic", filter);
    }
    payload
}

/// Builds a payload addressing one record of one instrument.
pub fn build_record(
    config: &Configuration,
    content: Content,
    record_id: &str,
    instrument: &str,
) -> Payload {
    let mut payload = Payload::new(config, content);
    payload.push("instrument", instrument);
    payload.push("record", record_id);
    payload
}

/// Builds a flat record import with normal overwrite behaviour.
pub fn build_import(
    config: &Configuration,
    data: &[Record],
    return_content: ReturnContent,
) -> Result<Payload> {
    let data =
        serde_json::to_string(data).map_err(|e| Error::SerializationFailed(e.to_string()))?;
    let mut payload = Payload::new(config, Content::Record);
    payload.push("overwriteBehavior", "normal");
    payload.push("type", "flat");
    payload.push("returnContent", return_content.as_str());
    payload.push("data", data);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;

    fn config() -> Configuration {
        Configuration::new("https://x.test", "T1")
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_base_fields_come_first() {
        let payload = build(&config(), Content::Project, &[], &[], None);
        assert_eq!(
            payload.pairs(),
            &[
                ("token".to_string(), "T1".to_string()),
                ("format".to_string(), "json".to_string()),
                ("content".to_string(), "project".to_string()),
            ]
        );
    }

    #[test]
    fn test_records_are_indexed() {
        let payload = build(&config(), Content::Record, &strings(&["101", "102"]), &[], None);
        assert_eq!(payload.get("records[0]"), Some("101"));
        assert_eq!(payload.get("records[1]"), Some("102"));
        assert_eq!(payload.get("records"), None);
        assert_eq!(payload.len(), 5);
    }

    #[test]
    fn test_record_id_added_once() {
        let payload = build(&config(), Content::Record, &[], &strings(&["name", "age"]), None);
        let fields: Vec<_> = payload
            .pairs()
            .iter()
            .filter(|(k, _)| k.starts_with("fields["))
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(fields, vec!["record_id", "name", "age"]);
    }

    #[test]
    fn test_record_id_not_duplicated() {
        assert_eq!(
            with_record_id(&strings(&["name", "record_id"])),
            strings(&["record_id", "name"])
        );
        assert_eq!(
            with_record_id(&strings(&["record_id"])),
            strings(&["record_id"])
        );
        assert!(with_record_id(&[]).is_empty());
    }

    #[test]
    fn test_filter_logic_verbatim() {
        let payload = build(&config(), Content::Record, &[], &[], Some("[age] > 5"));
        assert_eq!(payload.get("filterLogic"), Some("[age] > 5"));
    }

    #[test]
    fn test_survey_link_payload() {
        let payload = build_record(&config(), Content::SurveyLink, "7", "intake");
        assert_eq!(payload.get("content"), Some("surveyLink"));
        assert_eq!(payload.get("instrument"), Some("intake"));
        assert_eq!(payload.get("record"), Some("7"));
        assert_eq!(payload.get("records[0]"), None);
    }

    #[test]
    fn test_import_payload() {
        let record: Record = [
            ("record_id".to_string(), Value::from("3")),
            ("age".to_string(), Value::Integer(40)),
        ]
        .into_iter()
        .collect();

        let payload = build_import(&config(), &[record], ReturnContent::Ids).unwrap();
        assert_eq!(payload.get("overwriteBehavior"), Some("normal"));
        assert_eq!(payload.get("type"), Some("flat"));
        assert_eq!(payload.get("returnContent"), Some("ids"));
        assert_eq!(payload.get("data"), Some(r#"[{"record_id":"3","age":40}]"#));
    }

    #[test]
    fn test_debug_redacts_token() {
        let payload = build(&config(), Content::Project, &[], &[], None);
        let debug = format!("{:?}", payload);
        assert!(!debug.contains("T1"));
        assert!(debug.contains("project"));
    }
}
