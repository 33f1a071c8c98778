use std::collections::HashMap;

use indoc::indoc;
use subst::substitute;

const SUMMARIZE_JOB_POSTING: &str = indoc! { r#"
  Extract and return the following from this job posting as JSON:
  {
    "job_type": "One word like Remote, On-site, or Hybrid",
    "skills": ["List at least 5 key technical skills or tools"],
    "description": "Professional summary of the role in full sentences (20 lines or 500 words)"
  }

  Only return valid JSON. No extra text.

  Job posting:
  "${JOB_POSTING}"
"# };

// Completion models may repeat their input, so this one carries no braces and no line markers.
const LIST_JOB_FIELDS: &str = indoc! { r#"
  Extract structured job details from the following job posting and return them in JSON format with the fields:
  - job_type (remote, part time, full time, unknown)
  - skills
  - description

  Job posting:
  "${JOB_POSTING}"
"# };

/// How a backend wants to be asked for a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    /// Shows the model the JSON object to fill in. Suits chat and instruction models.
    #[default]
    Template,
    /// Names the fields in prose. Suits completion endpoints that echo the prompt.
    FieldList,
}

impl PromptStyle {
    pub fn prompt(&self, job_posting: &str) -> Result<String, subst::Error> {
        match self {
            PromptStyle::Template => prompt_summarize_job_posting(job_posting),
            PromptStyle::FieldList => prompt_list_job_fields(job_posting),
        }
    }
}

/// Creates the structured-summary prompt for a normalized job description.
pub fn prompt_summarize_job_posting(job_posting: &str) -> Result<String, subst::Error> {
    fill(SUMMARIZE_JOB_POSTING, job_posting)
}

/// Creates the field-list prompt for a normalized job description.
pub fn prompt_list_job_fields(job_posting: &str) -> Result<String, subst::Error> {
    fill(LIST_JOB_FIELDS, job_posting)
}

fn fill(template: &str, job_posting: &str) -> Result<String, subst::Error> {
    substitute(template, &{
        let mut v = HashMap::new();
        v.insert("JOB_POSTING".to_string(), job_posting.to_string());
        v
    })
}
