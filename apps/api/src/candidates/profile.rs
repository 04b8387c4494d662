//! Candidate profile persistence shared by the profile, resume and
//! application endpoints.

use chrono::Datelike;
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::{EducationRow, ExperienceRow};

pub async fn find_candidate_id(db: &PgPool, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM candidates WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|(id,)| id))
}

/// Returns the user's candidate id, creating the row from their credentials
/// when it does not exist yet. `name_hint` wins over the stored account name.
pub async fn ensure_candidate(
    conn: &mut PgConnection,
    user_id: Uuid,
    name_hint: Option<&str>,
) -> Result<Uuid, AppError> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM candidates WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let (email, account_name): (String, Option<String>) =
        sqlx::query_as("SELECT email, name FROM credentials WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound("User credentials not found".into()))?;

    let name = name_hint
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or(account_name)
        .unwrap_or_else(|| email.split('@').next().unwrap_or("Candidate").to_string());

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO candidates (user_id, name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE SET updated_at = candidates.updated_at
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(&name)
    .bind(&email)
    .fetch_one(&mut *conn)
    .await?;

    debug!("Created candidate {id} for user {user_id}");
    Ok(id)
}

/// Most recent education: open-ended entries first, then latest end date,
/// then latest start date.
pub fn latest_education(rows: &[EducationRow]) -> Option<&EducationRow> {
    rows.iter().max_by_key(|e| {
        (
            e.end_date.is_none(),
            e.end_date,
            e.start_date.is_none(),
            e.start_date,
        )
    })
}

/// Current position first, otherwise the same recency order as education.
pub fn latest_experience(rows: &[ExperienceRow]) -> Option<&ExperienceRow> {
    rows.iter().max_by_key(|e| {
        (
            e.is_current,
            e.end_date.is_none(),
            e.end_date,
            e.start_date.is_none(),
            e.start_date,
        )
    })
}

/// Leading numeric part of a grade such as `"8.6 CGPA"` or `"3.7/4"`.
pub fn parse_gpa(grade: &str) -> Option<f64> {
    let grade = grade.trim();
    let end = grade
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-')))
        .map_or(grade.len(), |(i, _)| i);
    grade[..end].parse::<f64>().ok().filter(|g| g.is_finite())
}

/// Copies the most recent education and experience into the denormalized
/// columns on the candidate row.
pub async fn sync_primary(conn: &mut PgConnection, candidate_id: Uuid) -> Result<(), AppError> {
    let education = sqlx::query_as::<_, EducationRow>(
        "SELECT * FROM candidate_education WHERE candidate_id = $1",
    )
    .bind(candidate_id)
    .fetch_all(&mut *conn)
    .await?;
    let experience = sqlx::query_as::<_, ExperienceRow>(
        "SELECT * FROM candidate_experience WHERE candidate_id = $1",
    )
    .bind(candidate_id)
    .fetch_all(&mut *conn)
    .await?;

    let edu = latest_education(&education);
    let exp = latest_experience(&experience);

    sqlx::query(
        r#"
        UPDATE candidates SET
            degree = $2,
            institution = $3,
            graduation_year = $4,
            gpa = $5,
            job_title = $6,
            company_name = $7,
            experience_location = $8,
            exp_start_date = $9,
            exp_end_date = $10,
            is_current = $11,
            experience_description = $12,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(candidate_id)
    .bind(edu.and_then(|e| e.degree.clone()))
    .bind(edu.map(|e| e.institution.clone()))
    .bind(edu.and_then(|e| e.end_date).map(|d| d.year()))
    .bind(edu.and_then(|e| e.grade_or_cgpa.as_deref()).and_then(parse_gpa))
    .bind(exp.map(|e| e.job_title.clone()))
    .bind(exp.map(|e| e.company_name.clone()))
    .bind(exp.and_then(|e| e.location.clone()))
    .bind(exp.and_then(|e| e.start_date))
    .bind(exp.and_then(|e| e.end_date))
    .bind(exp.is_some_and(|e| e.is_current))
    .bind(exp.and_then(|e| e.description.clone()))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Profile completion percentage shown on the dashboard: 20 points for basic
/// info plus 20 for each filled section.
pub fn profile_completion(
    experience_years: i32,
    profile_description: Option<&str>,
    skills: &[String],
    has_resume: bool,
) -> u8 {
    let mut score = 20;
    if experience_years > 0 {
        score += 20;
    }
    if profile_description.is_some_and(|d| !d.trim().is_empty()) {
        score += 20;
    }
    if !skills.is_empty() {
        score += 20;
    }
    if has_resume {
        score += 20;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, 1)
    }

    fn edu(institution: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) -> EducationRow {
        EducationRow {
            id: Uuid::new_v4(),
            candidate_id: Uuid::nil(),
            institution: institution.to_string(),
            degree: None,
            field_of_study: None,
            start_date: start,
            end_date: end,
            grade_or_cgpa: None,
            description: None,
        }
    }

    fn exp(company: &str, current: bool, end: Option<NaiveDate>) -> ExperienceRow {
        ExperienceRow {
            id: Uuid::new_v4(),
            candidate_id: Uuid::nil(),
            company_name: company.to_string(),
            job_title: "Engineer".to_string(),
            employment_type: None,
            location: None,
            start_date: date(2015, 1),
            end_date: end,
            is_current: current,
            description: None,
        }
    }

    #[test]
    fn test_ongoing_education_wins() {
        let rows = vec![
            edu("BSc", date(2014, 8), date(2018, 5)),
            edu("MSc", date(2019, 8), None),
            edu("School", date(2010, 1), date(2014, 5)),
        ];
        assert_eq!(latest_education(&rows).unwrap().institution, "MSc");
    }

    #[test]
    fn test_latest_end_date_then_start_date() {
        let rows = vec![
            edu("A", date(2014, 8), date(2018, 5)),
            edu("B", date(2016, 8), date(2018, 5)),
            edu("C", date(2012, 8), date(2016, 5)),
        ];
        assert_eq!(latest_education(&rows).unwrap().institution, "B");
        assert!(latest_education(&[]).is_none());
    }

    #[test]
    fn test_current_job_beats_recent_end() {
        let rows = vec![
            exp("Old", false, date(2024, 1)),
            exp("Now", true, date(2020, 1)),
        ];
        assert_eq!(latest_experience(&rows).unwrap().company_name, "Now");
    }

    #[test]
    fn test_parse_gpa() {
        assert_eq!(parse_gpa("8.6 CGPA"), Some(8.6));
        assert_eq!(parse_gpa("3.7/4"), Some(3.7));
        assert_eq!(parse_gpa(" 92 "), Some(92.0));
        assert_eq!(parse_gpa("First class"), None);
        assert_eq!(parse_gpa(""), None);
    }

    #[test]
    fn test_profile_completion() {
        assert_eq!(profile_completion(0, None, &[], false), 20);
        assert_eq!(profile_completion(0, Some("  "), &[], true), 40);
        assert_eq!(
            profile_completion(3, Some("Backend dev"), &["Rust".to_string()], true),
            100
        );
    }
}
