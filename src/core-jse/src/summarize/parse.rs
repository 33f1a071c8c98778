use data_model_jse::models::JobType;
use serde::Deserialize;
use serde_json::Value;

/// The fixed record every summarizer response is normalized into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredSummary {
    pub job_type: JobType,
    pub skills: Vec<String>,
    pub description: String,
}

/// The shapes a model's `skills` field shows up in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SkillsField {
    /// `["Go", "SQL"]`
    List(Vec<Value>),
    /// `{"Go": "expert", "SQL": 3}`: the keys are the skills, in document order.
    Map(serde_json::Map<String, Value>),
    /// `"Go"`
    Single(String),
    Other(Value),
}

impl Default for SkillsField {
    fn default() -> Self {
        SkillsField::Other(Value::Null)
    }
}

impl SkillsField {
    pub fn into_skills(self) -> Vec<String> {
        match self {
            SkillsField::List(items) => items.into_iter().map(value_text).collect(),
            SkillsField::Map(map) => map.into_iter().map(|(key, _)| key.trim().to_string()).collect(),
            SkillsField::Single(skill) => vec![skill.trim().to_string()],
            SkillsField::Other(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSummary {
    #[serde(default)]
    job_type: Value,
    #[serde(default)]
    skills: SkillsField,
    #[serde(default)]
    description: Value,
}

impl From<RawSummary> for StructuredSummary {
    fn from(raw: RawSummary) -> Self {
        StructuredSummary {
            job_type: JobType::parse_lenient(&value_text(raw.job_type)),
            skills: raw.skills.into_skills(),
            description: value_text(raw.description),
        }
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// The text from the first `{` to the last `}`, if there is one.
pub fn json_block(output: &str) -> Option<&str> {
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    if end > start { Some(&output[start..=end]) } else { None }
}

/// Structures free-form model output.
///
/// The JSON object embedded in the output wins. Without one (or when it doesn't
/// parse) the `Job Type:` / `Skills Required:` / `Description:` markers are tried.
/// `None` when neither yields anything.
pub fn parse_summary(output: &str) -> Option<StructuredSummary> {
    if let Some(block) = json_block(output) {
        match serde_json::from_str::<RawSummary>(block) {
            Ok(raw) => return Some(raw.into()),
            Err(e) => tracing::debug!("Summary JSON did not parse, trying markers: {}", e),
        }
    }
    fallback_summary(output)
}

const JOB_TYPE_MARKER: &str = "Job Type:";
const SKILLS_MARKER: &str = "Skills Required:";
const DESCRIPTION_MARKER: &str = "Description:";

/// Line-based extraction for output that isn't JSON.
pub fn fallback_summary(output: &str) -> Option<StructuredSummary> {
    let job_type = text_after(output, JOB_TYPE_MARKER, Some('\n'));
    let skills = text_after(output, SKILLS_MARKER, Some('\n'));
    let description = text_after(output, DESCRIPTION_MARKER, None);

    if job_type.is_none() && skills.is_none() && description.is_none() {
        return None;
    }

    Some(StructuredSummary {
        job_type: JobType::parse_lenient(job_type.unwrap_or_default()),
        skills: skills.map(split_skill_list).unwrap_or_default(),
        description: description.unwrap_or_default().to_string(),
    })
}

/// Trimmed text following `marker`, up to `end` (or the end of the text).
fn text_after<'a>(text: &'a str, marker: &str, end: Option<char>) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let value = match end.and_then(|c| rest.find(c)) {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(value.trim())
}

fn split_skill_list(raw: &str) -> Vec<String> {
    raw.replace('•', "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills_of(json: &str) -> Vec<String> {
        serde_json::from_str::<SkillsField>(json).unwrap().into_skills()
    }

    #[test]
    fn test_skills_shapes_keep_cardinality() {
        assert_eq!(skills_of(r#"["Go", "SQL", "Docker"]"#), vec!["Go", "SQL", "Docker"]);
        assert_eq!(skills_of(r#"[]"#).len(), 0);
        assert_eq!(skills_of(r#"["Go", 5, true]"#).len(), 3);

        assert_eq!(
            skills_of(r#"{"Rust": "expert", "Kubernetes": 3, "AWS": null}"#),
            vec!["Rust", "Kubernetes", "AWS"]
        );
        assert_eq!(skills_of(r#"{}"#).len(), 0);

        assert_eq!(skills_of(r#""Python""#), vec!["Python"]);
    }

    #[test]
    fn test_other_skills_shapes_are_empty() {
        for json in ["42", "true", "null", "3.5"] {
            assert!(skills_of(json).is_empty(), "{json} should yield no skills");
        }
    }

    #[test]
    fn test_parse_summary_from_embedded_json() {
        let output = indoc::indoc! {r#"
            Sure! Here is the JSON you asked for:
            {"job_type": "remote", "skills": ["Go", "SQL"], "description": "Great role"}
            Let me know if you need anything else.
        "#};
        let summary = parse_summary(output).unwrap();
        assert_eq!(
            summary,
            StructuredSummary {
                job_type: JobType::Remote,
                skills: vec!["Go".to_string(), "SQL".to_string()],
                description: "Great role".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_summary_missing_fields_default() {
        let summary = parse_summary(r#"{"description": "Only text"}"#).unwrap();
        assert_eq!(summary.job_type, JobType::Unknown);
        assert!(summary.skills.is_empty());
        assert_eq!(summary.description, "Only text");
    }

    #[test]
    fn test_parse_summary_falls_back_to_markers() {
        let output = "Job Type: Hybrid\nSkills Required: • Rust, • Tokio,, SQL\nDescription: Build services.\nShip often.";
        let summary = parse_summary(output).unwrap();
        assert_eq!(summary.job_type, JobType::Hybrid);
        assert_eq!(summary.skills, vec!["Rust", "Tokio", "SQL"]);
        assert_eq!(summary.description, "Build services.\nShip often.");
    }

    #[test]
    fn test_broken_json_falls_back_to_markers() {
        let output = "{ not json } Job Type: On-site\nDescription: Office based";
        let summary = parse_summary(output).unwrap();
        assert_eq!(summary.job_type, JobType::OnSite);
        assert_eq!(summary.description, "Office based");
    }

    #[test]
    fn test_unstructured_output_is_none() {
        assert_eq!(parse_summary("I cannot help with that."), None);
        assert_eq!(parse_summary("} backwards {"), None);
    }

    #[test]
    fn test_json_block() {
        assert_eq!(json_block("x {\"a\": {\"b\": 1}} y"), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(json_block("no braces"), None);
        assert_eq!(json_block("} {"), None);
    }
}
