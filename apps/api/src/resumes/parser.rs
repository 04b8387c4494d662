//! Resume parsing: extracted text goes to the model once, the JSON answer is
//! shaped into [`ParsedResume`], and can optionally be merged into the profile.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;

use crate::candidates::dates::parse_loose_date;
use crate::candidates::profile::sync_primary;
use crate::errors::AppError;
use crate::llm_client::{prompts::JSON_ONLY_SYSTEM, LlmClient};
use crate::resumes::prompts::resume_extraction_prompt;

/// Accepts strings, numbers and booleans; anything empty becomes `None`.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Treats an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keeps only string entries of a list, dropping blanks.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<Value> = nullable(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect())
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedPersonalInfo {
    #[serde(deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub phone_number: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub location: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub linkedin_url: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub github_url: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub portfolio_url: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub profile_description: Option<String>,
    pub is_fresher: Option<bool>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedExperience {
    #[serde(deserialize_with = "loose_string")]
    pub company: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub location: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub current: bool,
    #[serde(deserialize_with = "loose_string")]
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedEducation {
    #[serde(deserialize_with = "loose_string")]
    pub school: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub degree: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub field_of_study: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub grade: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedProject {
    #[serde(deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "string_list")]
    pub technologies: Vec<String>,
    #[serde(deserialize_with = "loose_string")]
    pub link: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedAchievement {
    #[serde(deserialize_with = "loose_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub date: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub description: Option<String>,
}

/// Structured resume as returned by the model. Every field is optional.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedResume {
    #[serde(deserialize_with = "nullable")]
    pub personal_info: ParsedPersonalInfo,
    #[serde(deserialize_with = "string_list")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub experience: Vec<ParsedExperience>,
    #[serde(deserialize_with = "nullable")]
    pub education: Vec<ParsedEducation>,
    #[serde(deserialize_with = "nullable")]
    pub projects: Vec<ParsedProject>,
    #[serde(deserialize_with = "nullable")]
    pub achievements: Vec<ParsedAchievement>,
    #[serde(rename = "rawText", skip_deserializing)]
    pub raw_text: String,
}

/// One model call over the extracted text. No retries beyond the client's
/// own transport-level handling.
pub async fn parse_resume_text(llm: &LlmClient, text: String) -> Result<ParsedResume, AppError> {
    let prompt = resume_extraction_prompt(&text);
    let mut parsed: ParsedResume = llm
        .call_json(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("AI resume parsing failed: {e}")))?;
    parsed.raw_text = text;
    Ok(parsed)
}

/// Where the uploaded file was stored for the profile.
pub struct StoredResume<'a> {
    pub key: &'a str,
    pub mime: &'a str,
}

/// Merges a parsed resume into a candidate profile inside the given
/// transaction. Scalar fields are only overwritten by non-empty parsed values
/// and detail sections are only filled when they are currently empty.
pub async fn save_parsed_resume(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    parsed: &ParsedResume,
    file: StoredResume<'_>,
) -> Result<(), AppError> {
    let info = &parsed.personal_info;

    let skills = (!parsed.skills.is_empty()).then(|| parsed.skills.clone());
    sqlx::query(
        r#"
        UPDATE candidates SET
            name = COALESCE($2, name),
            phone_number = COALESCE($3, phone_number),
            location = COALESCE($4, location),
            github_url = COALESCE($5, github_url),
            linkedin_url = COALESCE($6, linkedin_url),
            portfolio_url = COALESCE($7, portfolio_url),
            profile_description = COALESCE($8, profile_description),
            skills = COALESCE($9, skills),
            is_fresher = COALESCE($10, is_fresher),
            resume_key = $11,
            resume_mime = $12,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(candidate_id)
    .bind(&info.name)
    .bind(&info.phone_number)
    .bind(&info.location)
    .bind(&info.github_url)
    .bind(&info.linkedin_url)
    .bind(&info.portfolio_url)
    .bind(&info.profile_description)
    .bind(skills)
    .bind(info.is_fresher)
    .bind(file.key)
    .bind(file.mime)
    .execute(&mut *conn)
    .await?;

    let imported = import_sections(&mut *conn, candidate_id, parsed).await?;
    sync_primary(&mut *conn, candidate_id).await?;

    info!("Merged parsed resume into candidate {candidate_id} ({imported} entries imported)");
    Ok(())
}

async fn section_is_empty(
    conn: &mut PgConnection,
    table: &str,
    candidate_id: Uuid,
) -> Result<bool, AppError> {
    let (exists,): (bool,) = sqlx::query_as(&format!(
        "SELECT EXISTS (SELECT 1 FROM {table} WHERE candidate_id = $1)"
    ))
    .bind(candidate_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(!exists)
}

async fn import_sections(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    parsed: &ParsedResume,
) -> Result<usize, AppError> {
    let mut imported = 0;

    if section_is_empty(conn, "candidate_education", candidate_id).await? {
        for e in parsed.education.iter().filter(|e| e.school.is_some()) {
            sqlx::query(
                r#"
                INSERT INTO candidate_education
                    (candidate_id, institution, degree, field_of_study, start_date, end_date, grade_or_cgpa)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(candidate_id)
            .bind(&e.school)
            .bind(&e.degree)
            .bind(&e.field_of_study)
            .bind(e.start_date.as_deref().and_then(parse_loose_date))
            .bind(e.end_date.as_deref().and_then(parse_loose_date))
            .bind(&e.grade)
            .execute(&mut *conn)
            .await?;
            imported += 1;
        }
    }

    if section_is_empty(conn, "candidate_experience", candidate_id).await? {
        for e in parsed
            .experience
            .iter()
            .filter(|e| e.company.is_some() && e.title.is_some())
        {
            let end_date = e.end_date.as_deref().and_then(parse_loose_date);
            let is_current = e.current || is_present(e.end_date.as_deref());
            sqlx::query(
                r#"
                INSERT INTO candidate_experience
                    (candidate_id, company_name, job_title, location, start_date, end_date,
                     is_current, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(candidate_id)
            .bind(&e.company)
            .bind(&e.title)
            .bind(&e.location)
            .bind(e.start_date.as_deref().and_then(parse_loose_date))
            .bind(end_date)
            .bind(is_current)
            .bind(&e.description)
            .execute(&mut *conn)
            .await?;
            imported += 1;
        }
    }

    if section_is_empty(conn, "candidate_projects", candidate_id).await? {
        for p in parsed.projects.iter().filter(|p| p.title.is_some()) {
            sqlx::query(
                r#"
                INSERT INTO candidate_projects
                    (candidate_id, project_title, project_description, technologies_used, project_link)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(candidate_id)
            .bind(&p.title)
            .bind(&p.description)
            .bind(&p.technologies)
            .bind(&p.link)
            .execute(&mut *conn)
            .await?;
            imported += 1;
        }
    }

    if section_is_empty(conn, "candidate_achievements", candidate_id).await? {
        for a in parsed.achievements.iter().filter(|a| a.title.is_some()) {
            sqlx::query(
                r#"
                INSERT INTO candidate_achievements (candidate_id, title, date, description)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(candidate_id)
            .bind(&a.title)
            .bind(a.date.as_deref().and_then(parse_loose_date))
            .bind(&a.description)
            .execute(&mut *conn)
            .await?;
            imported += 1;
        }
    }

    Ok(imported)
}

fn is_present(end_date: Option<&str>) -> bool {
    end_date.is_some_and(|d| {
        let d = d.trim();
        d.eq_ignore_ascii_case("present") || d.eq_ignore_ascii_case("current")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::strip_json_fences;

    #[test]
    fn test_full_model_answer() {
        let raw = r#"```json
        {
          "personal_info": {"name": "Asha Rao", "email": "asha@example.com", "is_fresher": false},
          "skills": ["Rust", "  ", "PostgreSQL"],
          "experience": [{"company": "Acme", "title": "SDE", "startDate": "01/2021", "endDate": "Present", "current": null}],
          "education": [{"school": "IIT", "degree": "B.Tech", "endDate": 2020, "grade": 8.6}],
          "projects": [{"title": "Hireboard", "technologies": ["Rust", 3]}],
          "achievements": []
        }
        ```"#;
        let parsed: ParsedResume = serde_json::from_str(strip_json_fences(raw)).unwrap();
        assert_eq!(parsed.personal_info.name.as_deref(), Some("Asha Rao"));
        assert_eq!(parsed.skills, vec!["Rust", "PostgreSQL"]);
        assert!(!parsed.experience[0].current);
        assert_eq!(parsed.education[0].end_date.as_deref(), Some("2020"));
        assert_eq!(parsed.education[0].grade.as_deref(), Some("8.6"));
        assert_eq!(parsed.projects[0].technologies, vec!["Rust"]);
    }

    #[test]
    fn test_missing_and_null_sections() {
        let parsed: ParsedResume =
            serde_json::from_str(r#"{"personal_info": null, "skills": null}"#).unwrap();
        assert!(parsed.personal_info.name.is_none());
        assert!(parsed.skills.is_empty());
        assert!(parsed.education.is_empty());
    }

    #[test]
    fn test_blank_strings_become_none() {
        let parsed: ParsedPersonalInfo =
            serde_json::from_str(r#"{"name": "  ", "phone_number": 9876543210}"#).unwrap();
        assert_eq!(parsed.name, None);
        assert_eq!(parsed.phone_number.as_deref(), Some("9876543210"));
    }

    #[test]
    fn test_raw_text_is_serialized_but_not_read() {
        let parsed: ParsedResume = serde_json::from_str(r#"{"rawText": "injected"}"#).unwrap();
        assert_eq!(parsed.raw_text, "");
        let json = serde_json::to_value(ParsedResume {
            raw_text: "text".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(json["rawText"], "text");
    }

    #[test]
    fn test_present_end_date() {
        assert!(is_present(Some(" Present ")));
        assert!(!is_present(Some("2022-01")));
        assert!(!is_present(None));
    }
}
