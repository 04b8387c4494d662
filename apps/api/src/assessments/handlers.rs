use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{FromRow, PgConnection};
use tracing::info;
use uuid::Uuid;

use crate::assessments::schedule::{parse_date, parse_time, TestWindow};
use crate::auth::validation::require;
use crate::auth::Recruiter;
use crate::errors::AppError;
use crate::models::assessment::{TestQuestionRow, TestRow};
use crate::models::{ApplicationTestStatus, AssessmentQuestionType, TestStatus};
use crate::notifications::{notify_all, NewNotification, TEST_ASSIGNED};
use crate::state::AppState;

const MAX_OBJECTIVE_OPTIONS: usize = 4;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestQuestionInput {
    pub question_text: Option<String>,
    pub question_type: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub expected_answer: Option<String>,
}

/// Body of both create and update. On update every field is optional and
/// missing ones keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRequest {
    pub job_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub questions: Option<Vec<TestQuestionInput>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestResponse {
    pub message: &'static str,
    pub test_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TestSummaryRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub test: TestRow,
    pub job_title: Option<String>,
    pub question_count: i64,
    pub submission_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TestListResponse {
    pub count: usize,
    pub data: Vec<TestSummaryRow>,
}

#[derive(Debug, Serialize)]
pub struct TestDetailResponse {
    #[serde(flatten)]
    pub test: TestRow,
    pub job_title: Option<String>,
    pub questions: Vec<TestQuestionRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub message: String,
    pub assigned: u64,
    pub notified: usize,
}

/// One candidate's attempt as listed on the results page.
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptResultRow {
    pub attempt_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub auto_submitted: bool,
    pub time_taken_seconds: Option<i32>,
    pub total_score: Option<i32>,
    pub max_score: Option<i32>,
    pub attempt_status: String,
    pub violation_count: i32,
    pub candidate_name: String,
    pub candidate_email: String,
    pub application_id: Option<Uuid>,
}

/// A stored answer next to the question it answers.
#[derive(Debug, Serialize, FromRow)]
pub struct AnswerDetailRow {
    #[serde(skip)]
    pub attempt_id: Uuid,
    pub candidate_answer: String,
    pub is_correct: Option<bool>,
    pub question_text: String,
    pub question_type: String,
    pub expected_answer: String,
    pub options: Option<Value>,
    pub question_order: i32,
}

#[derive(Debug, Serialize)]
pub struct AttemptResult {
    #[serde(flatten)]
    pub attempt: AttemptResultRow,
    pub answers: Vec<AnswerDetailRow>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ResultsTestInfo {
    pub id: Uuid,
    pub title: String,
    pub results_published: bool,
}

#[derive(Debug, Serialize)]
pub struct TestResultsResponse {
    pub test: ResultsTestInfo,
    pub results: Vec<AttemptResult>,
}

/// A validated assessment question ready for insertion.
#[derive(Debug, PartialEq)]
pub(crate) struct NewTestQuestion {
    text: String,
    kind: AssessmentQuestionType,
    options: Option<Vec<String>>,
    expected_answer: String,
}

/// Schedule fields after parsing.
#[derive(Debug, Clone, PartialEq)]
struct Schedule {
    start_date: NaiveDate,
    start_time: NaiveTime,
    end_date: NaiveDate,
    end_time: NaiveTime,
    duration_minutes: i32,
}

impl Schedule {
    fn window(&self) -> TestWindow {
        TestWindow::new(self.start_date, self.start_time, self.end_date, self.end_time)
    }

    fn from_row(test: &TestRow) -> Self {
        Self {
            start_date: test.start_date,
            start_time: test.start_time,
            end_date: test.end_date,
            end_time: test.end_time,
            duration_minutes: test.duration_minutes,
        }
    }

    /// Overlays whatever the request supplies onto `base` and validates the result.
    fn merge(base: Option<&Schedule>, req: &TestRequest) -> Result<Schedule, AppError> {
        let date = |raw: Option<&str>, stored: Option<NaiveDate>, field: &str| match raw {
            Some(raw) => parse_date(raw)
                .ok_or_else(|| AppError::Validation(format!("{field} must be YYYY-MM-DD"))),
            None => stored.ok_or_else(|| AppError::Validation(format!("{field} is required"))),
        };
        let time = |raw: Option<&str>, stored: Option<NaiveTime>, field: &str| match raw {
            Some(raw) => {
                parse_time(raw).ok_or_else(|| AppError::Validation(format!("{field} must be HH:MM")))
            }
            None => stored.ok_or_else(|| AppError::Validation(format!("{field} is required"))),
        };

        let schedule = Schedule {
            start_date: date(req.start_date.as_deref(), base.map(|b| b.start_date), "startDate")?,
            start_time: time(req.start_time.as_deref(), base.map(|b| b.start_time), "startTime")?,
            end_date: date(req.end_date.as_deref(), base.map(|b| b.end_date), "endDate")?,
            end_time: time(req.end_time.as_deref(), base.map(|b| b.end_time), "endTime")?,
            duration_minutes: req
                .duration_minutes
                .or(base.map(|b| b.duration_minutes))
                .ok_or_else(|| AppError::Validation("durationMinutes is required".into()))?,
        };

        if schedule.duration_minutes <= 0 {
            return Err(AppError::Validation(
                "durationMinutes must be greater than zero".into(),
            ));
        }
        if !schedule.window().is_valid() {
            return Err(AppError::Validation(
                "The test must end after it starts".into(),
            ));
        }
        Ok(schedule)
    }
}

fn validate_test_question(
    index: usize,
    input: &TestQuestionInput,
) -> Result<NewTestQuestion, AppError> {
    let position = index + 1;
    let text = input
        .question_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Question {position} has no text")))?;
    let kind: AssessmentQuestionType = input
        .question_type
        .as_deref()
        .unwrap_or("objective")
        .trim()
        .parse()
        .map_err(|e: String| AppError::Validation(format!("Question {position}: {e}")))?;
    let expected_answer = input
        .expected_answer
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| {
            AppError::Validation(format!("Question {position} needs an expected answer"))
        })?;

    let options = match kind {
        AssessmentQuestionType::Objective => {
            let options: Vec<String> = input
                .options
                .iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if options.len() > MAX_OBJECTIVE_OPTIONS {
                return Err(AppError::Validation(format!(
                    "Question {position}: Maximum {MAX_OBJECTIVE_OPTIONS} options allowed for objective questions"
                )));
            }
            Some(options)
        }
        AssessmentQuestionType::Descriptive => None,
    };

    Ok(NewTestQuestion {
        text: text.to_string(),
        kind,
        options,
        expected_answer: expected_answer.to_string(),
    })
}

fn validate_test_questions(inputs: &[TestQuestionInput]) -> Result<Vec<NewTestQuestion>, AppError> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, q)| validate_test_question(i, q))
        .collect()
}

async fn insert_questions(
    conn: &mut PgConnection,
    test_id: Uuid,
    questions: &[NewTestQuestion],
) -> Result<(), AppError> {
    for (i, q) in questions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO test_questions
                (test_id, question_text, question_type, options, expected_answer, question_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(test_id)
        .bind(&q.text)
        .bind(q.kind.as_str())
        .bind(q.options.as_ref().map(|o| json!(o)))
        .bind(&q.expected_answer)
        .bind(i as i32 + 1)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// The recruiter's own test, or 404.
async fn owned_test(state: &AppState, recruiter_id: Uuid, test_id: Uuid) -> Result<TestRow, AppError> {
    sqlx::query_as::<_, TestRow>("SELECT * FROM tests WHERE id = $1 AND recruiter_id = $2")
        .bind(test_id)
        .bind(recruiter_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Test not found or access denied".into()))
}

/// Drafts are always editable; a published test only until its window opens.
fn ensure_editable(test: &TestRow, now: DateTime<Utc>) -> Result<(), AppError> {
    match test.status.parse::<TestStatus>() {
        Ok(TestStatus::Draft) => Ok(()),
        Ok(TestStatus::Published) => {
            if Schedule::from_row(test).window().not_started(now) {
                Ok(())
            } else {
                Err(AppError::Validation(
                    "Cannot edit a test that has already started".into(),
                ))
            }
        }
        _ => Err(AppError::Validation("Cannot edit this test".into())),
    }
}

/// Closed tests stay closed; publishing a published test only picks up new
/// applicants.
fn ensure_publishable(test: &TestRow) -> Result<(), AppError> {
    match test.status.parse::<TestStatus>() {
        Ok(TestStatus::Closed) => Err(AppError::Validation(
            "Cannot publish a closed test".into(),
        )),
        _ => Ok(()),
    }
}

/// POST /api/tests
pub async fn handle_create_test(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Json(req): Json<TestRequest>,
) -> Result<(StatusCode, Json<CreateTestResponse>), AppError> {
    let job_id = req
        .job_id
        .ok_or_else(|| AppError::Validation("jobId is required".into()))?;
    let title = require(req.title.as_deref(), "title")?;
    let schedule = Schedule::merge(None, &req)?;
    let questions = match req.questions.as_deref() {
        Some(inputs) if !inputs.is_empty() => validate_test_questions(inputs)?,
        _ => {
            return Err(AppError::Validation(
                "At least one question is required".into(),
            ))
        }
    };

    let owns: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT jp.job_id
        FROM job_postings jp
        JOIN companies c ON c.id = jp.company_id
        WHERE jp.job_id = $1 AND c.created_by = $2 AND jp.status <> 'deleted'
        "#,
    )
    .bind(job_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;
    if owns.is_none() {
        return Err(AppError::Forbidden("Access denied or job not found".into()));
    }

    let mut tx = state.db.begin().await?;
    let (test_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO tests
            (job_id, recruiter_id, title, description, instructions,
             start_date, start_time, end_date, end_time, duration_minutes, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'draft')
        RETURNING id
        "#,
    )
    .bind(job_id)
    .bind(user.id)
    .bind(title)
    .bind(req.description.as_deref().unwrap_or_default())
    .bind(req.instructions.as_deref().unwrap_or_default())
    .bind(schedule.start_date)
    .bind(schedule.start_time)
    .bind(schedule.end_date)
    .bind(schedule.end_time)
    .bind(schedule.duration_minutes)
    .fetch_one(&mut *tx)
    .await?;
    insert_questions(&mut tx, test_id, &questions).await?;
    tx.commit().await?;

    info!(
        "Test {test_id} created for job {job_id} with {} questions",
        questions.len()
    );
    Ok((
        StatusCode::CREATED,
        Json(CreateTestResponse {
            message: "Test created successfully",
            test_id,
        }),
    ))
}

/// GET /api/tests
pub async fn handle_list_tests(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
) -> Result<Json<TestListResponse>, AppError> {
    let rows = sqlx::query_as::<_, TestSummaryRow>(
        r#"
        SELECT t.*, jp.job_title,
               (SELECT COUNT(*) FROM test_questions tq WHERE tq.test_id = t.id) AS question_count,
               (SELECT COUNT(*) FROM test_attempts ta
                 WHERE ta.test_id = t.id AND ta.status IN ('submitted', 'evaluated')) AS submission_count
        FROM tests t
        LEFT JOIN job_postings jp ON jp.job_id = t.job_id
        WHERE t.recruiter_id = $1
        ORDER BY t.created_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(TestListResponse {
        count: rows.len(),
        data: rows,
    }))
}

/// GET /api/tests/:id
pub async fn handle_get_test(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Path(test_id): Path<Uuid>,
) -> Result<Json<TestDetailResponse>, AppError> {
    let test = owned_test(&state, user.id, test_id).await?;
    let job_title = match test.job_id {
        Some(job_id) => sqlx::query_as::<_, (String,)>(
            "SELECT job_title FROM job_postings WHERE job_id = $1",
        )
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?
        .map(|(title,)| title),
        None => None,
    };
    let questions = sqlx::query_as::<_, TestQuestionRow>(
        r#"
        SELECT id, test_id, question_text, question_type, options, expected_answer, question_order
        FROM test_questions
        WHERE test_id = $1
        ORDER BY question_order
        "#,
    )
    .bind(test_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(TestDetailResponse {
        test,
        job_title,
        questions,
    }))
}

/// PUT /api/tests/:id
pub async fn handle_update_test(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Path(test_id): Path<Uuid>,
    Json(req): Json<TestRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = owned_test(&state, user.id, test_id).await?;
    ensure_editable(&existing, Utc::now())?;

    let schedule = Schedule::merge(Some(&Schedule::from_row(&existing)), &req)?;
    let title = match req.title.as_deref() {
        Some(raw) => require(Some(raw), "title")?.to_string(),
        None => existing.title.clone(),
    };
    let questions = match req.questions.as_deref() {
        Some(inputs) if !inputs.is_empty() => Some(validate_test_questions(inputs)?),
        _ => None,
    };

    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"
        UPDATE tests
        SET title = $1, description = $2, instructions = $3,
            start_date = $4, start_time = $5, end_date = $6, end_time = $7,
            duration_minutes = $8, updated_at = NOW()
        WHERE id = $9
        "#,
    )
    .bind(&title)
    .bind(req.description.as_deref().unwrap_or(&existing.description))
    .bind(req.instructions.as_deref().unwrap_or(&existing.instructions))
    .bind(schedule.start_date)
    .bind(schedule.start_time)
    .bind(schedule.end_date)
    .bind(schedule.end_time)
    .bind(schedule.duration_minutes)
    .bind(test_id)
    .execute(&mut *tx)
    .await?;

    if let Some(questions) = &questions {
        sqlx::query("DELETE FROM test_questions WHERE test_id = $1")
            .bind(test_id)
            .execute(&mut *tx)
            .await?;
        insert_questions(&mut tx, test_id, questions).await?;
    }
    tx.commit().await?;

    info!(
        "Test {test_id} updated (questions replaced: {})",
        questions.is_some()
    );
    Ok(Json(MessageResponse {
        message: "Test updated successfully".into(),
    }))
}

/// DELETE /api/tests/:id
pub async fn handle_delete_test(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Path(test_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted: Option<(Uuid,)> =
        sqlx::query_as("DELETE FROM tests WHERE id = $1 AND recruiter_id = $2 RETURNING id")
            .bind(test_id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;
    if deleted.is_none() {
        return Err(AppError::NotFound("Test not found or access denied".into()));
    }

    info!("Test {test_id} deleted by {}", user.id);
    Ok(Json(MessageResponse {
        message: "Test deleted successfully".into(),
    }))
}

/// POST /api/tests/:id/publish
pub async fn handle_publish_test(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Path(test_id): Path<Uuid>,
) -> Result<Json<PublishResponse>, AppError> {
    let test = owned_test(&state, user.id, test_id).await?;
    ensure_publishable(&test)?;

    let (question_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM test_questions WHERE test_id = $1")
            .bind(test_id)
            .fetch_one(&state.db)
            .await?;
    if question_count == 0 {
        return Err(AppError::Validation(
            "Cannot publish a test with no questions".into(),
        ));
    }

    let mut tx = state.db.begin().await?;
    sqlx::query("UPDATE tests SET status = 'published', updated_at = NOW() WHERE id = $1")
        .bind(test_id)
        .execute(&mut *tx)
        .await?;
    // Only applications assigned by this publish are notified.
    let recipients: Vec<(Uuid, String)> = sqlx::query_as(
        r#"
        UPDATE job_applications ja
        SET test_id = $1, test_status = $3
        FROM candidates c, job_postings jp
        WHERE ja.job_id = $2 AND ja.test_id IS NULL
          AND c.id = ja.candidate_id AND jp.job_id = ja.job_id
        RETURNING c.user_id, jp.job_title
        "#,
    )
    .bind(test_id)
    .bind(test.job_id)
    .bind(ApplicationTestStatus::Pending.as_str())
    .fetch_all(&mut *tx)
    .await?;
    let assigned = recipients.len() as u64;
    tx.commit().await?;

    let notifications = recipients
        .into_iter()
        .map(|(user_id, job_title)| NewNotification {
            user_id,
            kind: TEST_ASSIGNED,
            title: "New Test Assigned".to_string(),
            message: format!("A new test has been assigned to you for the position: {job_title}"),
            metadata: json!({ "testId": test_id, "jobId": test.job_id }),
        })
        .collect();
    let notified = notify_all(&state.db, notifications).await;

    info!("Test {test_id} published: {assigned} applications assigned, {notified} notified");
    Ok(Json(PublishResponse {
        message: format!("Test published! {notified} candidates notified."),
        assigned,
        notified,
    }))
}

/// GET /api/tests/:id/results
pub async fn handle_test_results(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Path(test_id): Path<Uuid>,
) -> Result<Json<TestResultsResponse>, AppError> {
    let test = sqlx::query_as::<_, ResultsTestInfo>(
        "SELECT id, title, results_published FROM tests WHERE id = $1 AND recruiter_id = $2",
    )
    .bind(test_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Test not found or access denied".into()))?;

    let attempts = sqlx::query_as::<_, AttemptResultRow>(
        r#"
        SELECT ta.id AS attempt_id, ta.started_at, ta.submitted_at, ta.auto_submitted,
               ta.time_taken_seconds, ta.total_score, ta.max_score, ta.status AS attempt_status,
               ta.violation_count, c.name AS candidate_name, c.email AS candidate_email,
               ta.application_id
        FROM test_attempts ta
        JOIN candidates c ON c.id = ta.candidate_id
        WHERE ta.test_id = $1
        ORDER BY ta.submitted_at DESC NULLS LAST
        "#,
    )
    .bind(test_id)
    .fetch_all(&state.db)
    .await?;

    let answers = sqlx::query_as::<_, AnswerDetailRow>(
        r#"
        SELECT tans.attempt_id, tans.candidate_answer, tans.is_correct,
               tq.question_text, tq.question_type, tq.expected_answer, tq.options, tq.question_order
        FROM test_answers tans
        JOIN test_questions tq ON tq.id = tans.question_id
        JOIN test_attempts ta ON ta.id = tans.attempt_id
        WHERE ta.test_id = $1
        ORDER BY tq.question_order
        "#,
    )
    .bind(test_id)
    .fetch_all(&state.db)
    .await?;

    let mut by_attempt: HashMap<Uuid, Vec<AnswerDetailRow>> = HashMap::new();
    for answer in answers {
        by_attempt.entry(answer.attempt_id).or_default().push(answer);
    }
    let results = attempts
        .into_iter()
        .map(|attempt| AttemptResult {
            answers: by_attempt.remove(&attempt.attempt_id).unwrap_or_default(),
            attempt,
        })
        .collect();

    Ok(Json(TestResultsResponse { test, results }))
}

/// POST /api/tests/:id/publish-results
pub async fn handle_publish_results(
    State(state): State<AppState>,
    Recruiter(user): Recruiter,
    Path(test_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let updated: Option<(Uuid,)> = sqlx::query_as(
        r#"
        UPDATE tests SET results_published = TRUE, updated_at = NOW()
        WHERE id = $1 AND recruiter_id = $2
        RETURNING id
        "#,
    )
    .bind(test_id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;
    if updated.is_none() {
        return Err(AppError::NotFound("Test not found or access denied".into()));
    }

    info!("Results of test {test_id} published");
    Ok(Json(MessageResponse {
        message: "Results published to candidates".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn question(kind: &str, options: &[&str]) -> TestQuestionInput {
        TestQuestionInput {
            question_text: Some("Which runtime?".into()),
            question_type: Some(kind.into()),
            options: options.iter().map(|o| o.to_string()).collect(),
            expected_answer: Some(" tokio ".into()),
        }
    }

    fn request() -> TestRequest {
        TestRequest {
            job_id: Some(1),
            title: Some("Rust screening".into()),
            start_date: Some("2025-03-10".into()),
            start_time: Some("09:00".into()),
            end_date: Some("2025-03-10".into()),
            end_time: Some("11:00".into()),
            duration_minutes: Some(45),
            ..Default::default()
        }
    }

    fn stored(status: &str) -> TestRow {
        let schedule = Schedule::merge(None, &request()).unwrap();
        let now = Utc::now();
        TestRow {
            id: Uuid::nil(),
            job_id: Some(1),
            recruiter_id: Uuid::nil(),
            title: "Rust screening".into(),
            description: String::new(),
            instructions: String::new(),
            start_date: schedule.start_date,
            start_time: schedule.start_time,
            end_date: schedule.end_date,
            end_time: schedule.end_time,
            duration_minutes: schedule.duration_minutes,
            status: status.into(),
            results_published: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_objective_option_limit() {
        let five = ["a", "b", "c", "d", "e"];
        let err = validate_test_question(1, &question("objective", &five)).unwrap_err();
        assert!(err.to_string().contains("Question 2"));
        let q = validate_test_question(0, &question("objective", &five[..4])).unwrap();
        assert_eq!(q.options.map(|o| o.len()), Some(4));
    }

    #[test]
    fn test_descriptive_drops_options() {
        let q = validate_test_question(0, &question("descriptive", &["x"])).unwrap();
        assert_eq!(q.options, None);
        assert_eq!(q.expected_answer, "tokio");
    }

    #[test]
    fn test_expected_answer_required() {
        let mut q = question("objective", &["a"]);
        q.expected_answer = Some("  ".into());
        assert!(validate_test_question(0, &q).is_err());
    }

    #[test]
    fn test_schedule_must_end_after_start() {
        let mut req = request();
        req.end_time = Some("08:00".into());
        assert!(Schedule::merge(None, &req).is_err());
    }

    #[test]
    fn test_schedule_duration_positive() {
        let mut req = request();
        req.duration_minutes = Some(0);
        assert!(Schedule::merge(None, &req).is_err());
    }

    #[test]
    fn test_update_keeps_stored_fields() {
        let base = Schedule::merge(None, &request()).unwrap();
        let patch = TestRequest {
            end_time: Some("12:15".into()),
            ..Default::default()
        };
        let merged = Schedule::merge(Some(&base), &patch).unwrap();
        assert_eq!(merged.start_time, base.start_time);
        assert_eq!(merged.end_time, NaiveTime::from_hms_opt(12, 15, 0).unwrap());
        assert_eq!(merged.duration_minutes, 45);
    }

    #[test]
    fn test_create_needs_every_schedule_field() {
        let req = TestRequest {
            start_date: None,
            ..request()
        };
        let err = Schedule::merge(None, &req).unwrap_err();
        assert!(err.to_string().contains("startDate"));
    }

    #[test]
    fn test_editability() {
        let before = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        let during = Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap();
        assert!(ensure_editable(&stored("draft"), during).is_ok());
        assert!(ensure_editable(&stored("published"), before).is_ok());
        assert!(ensure_editable(&stored("published"), during).is_err());
        assert!(ensure_editable(&stored("closed"), before).is_err());
    }

    #[test]
    fn test_closed_test_cannot_be_published() {
        let err = ensure_publishable(&stored("closed")).unwrap_err();
        assert!(err.to_string().contains("closed"), "{err}");
        assert!(ensure_publishable(&stored("draft")).is_ok());
        assert!(ensure_publishable(&stored("published")).is_ok());
    }
}
