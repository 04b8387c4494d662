use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;

/// Resume text beyond this many characters is not sent to the model.
pub const MAX_RESUME_CHARS: usize = 30_000;

const RESUME_SCHEMA: &str = r#"{
  "personal_info": {
    "name": "Full Name",
    "email": "Email Address",
    "phone_number": "Phone Number",
    "location": "City, Country",
    "linkedin_url": "URL",
    "github_url": "URL",
    "portfolio_url": "URL",
    "profile_description": "Summary or About Me section (max 500 chars)",
    "is_fresher": "boolean, true if less than 1 year of experience"
  },
  "skills": ["Skill 1", "Skill 2"],
  "experience": [
    {
      "company": "Company Name",
      "title": "Job Title",
      "location": "Location",
      "startDate": "YYYY-MM-DD or MM/YYYY",
      "endDate": "YYYY-MM-DD or MM/YYYY or Present",
      "current": "boolean",
      "description": "Key responsibilities and achievements"
    }
  ],
  "education": [
    {
      "school": "Institution Name",
      "degree": "Degree Name",
      "fieldOfStudy": "Major/Field",
      "startDate": "YYYY",
      "endDate": "YYYY",
      "grade": "CGPA or Percentage"
    }
  ],
  "projects": [
    {
      "title": "Project Title",
      "description": "Project description",
      "technologies": ["Tech 1", "Tech 2"],
      "link": "Project URL"
    }
  ],
  "achievements": [
    {
      "title": "Achievement or Certification Name",
      "date": "Date",
      "description": "Details"
    }
  ]
}"#;

pub fn resume_extraction_prompt(resume_text: &str) -> String {
    let text = truncate_chars(resume_text, MAX_RESUME_CHARS);
    format!(
        "You are an expert resume parser. Extract the information from the resume text \
         below and return it as a single JSON object matching this schema:\n\n\
         {RESUME_SCHEMA}\n\n\
         {NO_INVENTION_INSTRUCTION}\n\n\
         RESUME TEXT:\n{text}"
    )
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_and_schema() {
        let prompt = resume_extraction_prompt("Asha Rao\nRust developer");
        assert!(prompt.contains("\"fieldOfStudy\""));
        assert!(prompt.ends_with("Asha Rao\nRust developer"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
