use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use crate::assessments::grading::{grade, percentage, AnswerKey};
use crate::assessments::handlers::AnswerDetailRow;
use crate::assessments::schedule::{categorize, Category, TestWindow};
use crate::auth::JobSeeker;
use crate::candidates::profile::find_candidate_id;
use crate::errors::AppError;
use crate::models::assessment::{AttemptRow, TestAnswerRow};
use crate::models::{ApplicationTestStatus, AttemptStatus};
use crate::state::AppState;

/// A published test assigned to the candidate, with their attempt if any.
#[derive(Debug, Serialize, FromRow)]
pub struct MyTestRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_date: NaiveDate,
    pub end_time: NaiveTime,
    pub duration_minutes: i32,
    pub test_status: String,
    pub results_published: bool,
    pub job_title: String,
    pub company_name: String,
    pub application_id: Uuid,
    pub my_test_status: String,
    pub attempt_id: Option<Uuid>,
    pub attempt_status: Option<String>,
    pub total_score: Option<i32>,
    pub max_score: Option<i32>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl MyTestRow {
    fn window(&self) -> TestWindow {
        TestWindow::new(self.start_date, self.start_time, self.end_date, self.end_time)
    }
}

#[derive(Debug, Serialize)]
pub struct MyTestEntry {
    #[serde(flatten)]
    pub test: MyTestRow,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub expired: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct MyTestsResponse {
    pub upcoming: Vec<MyTestEntry>,
    pub ongoing: Vec<MyTestEntry>,
    pub completed: Vec<MyTestEntry>,
}

/// Test details shown while taking it.
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptTestView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_date: NaiveDate,
    pub end_time: NaiveTime,
    pub duration_minutes: i32,
}

/// A question without its expected answer.
#[derive(Debug, Serialize, FromRow)]
pub struct CandidateQuestionRow {
    pub id: Uuid,
    pub question_text: String,
    pub question_type: String,
    pub options: Option<Value>,
    pub question_order: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResponse {
    pub test: AttemptTestView,
    pub questions: Vec<CandidateQuestionRow>,
    pub attempt_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// When the attempt must be handed in: the duration or the window end, whichever is first.
    pub deadline: DateTime<Utc>,
    pub existing_answers: Vec<TestAnswerRow>,
    pub resumed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    #[serde(default)]
    pub candidate_answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProgressRequest {
    pub attempt_id: Uuid,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub attempt_id: Uuid,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
    #[serde(default)]
    pub auto_submitted: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub message: &'static str,
    pub total_score: i32,
    pub max_score: i32,
    pub score_percentage: f64,
    pub time_taken_seconds: i32,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MyResultResponse {
    #[serde(rename_all = "camelCase")]
    Pending {
        title: String,
        results_published: bool,
        message: &'static str,
    },
    #[serde(rename_all = "camelCase")]
    Published {
        title: String,
        results_published: bool,
        total_score: i32,
        max_score: i32,
        score_percentage: f64,
        time_taken_seconds: Option<i32>,
        submitted_at: Option<DateTime<Utc>>,
        auto_submitted: bool,
        answers: Vec<AnswerDetailRow>,
    },
}

fn sort_into(response: &mut MyTestsResponse, row: MyTestRow, now: DateTime<Utc>) {
    let attempt = row
        .attempt_status
        .as_deref()
        .and_then(|s| s.parse::<AttemptStatus>().ok());
    let (category, expired) = categorize(&row.window(), attempt, now);
    let entry = MyTestEntry { test: row, expired };
    match category {
        Category::Upcoming => response.upcoming.push(entry),
        Category::Ongoing => response.ongoing.push(entry),
        Category::Completed => response.completed.push(entry),
    }
}

fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i32 {
    i32::try_from((now - started_at).num_seconds().max(0)).unwrap_or(i32::MAX)
}

async fn require_candidate(state: &AppState, user_id: Uuid) -> Result<Uuid, AppError> {
    find_candidate_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Candidate profile not found".into()))
}

/// Keeps answers to the test's own questions, one per question. A repeated
/// question keeps its last answer in the position of its first.
fn latest_answers(known: &[Uuid], answers: Vec<SubmittedAnswer>) -> Vec<(Uuid, String)> {
    let mut slots: HashMap<Uuid, usize> = HashMap::new();
    let mut kept: Vec<(Uuid, String)> = Vec::new();
    for answer in answers {
        if !known.contains(&answer.question_id) {
            continue;
        }
        match slots.get(&answer.question_id) {
            Some(&slot) => kept[slot].1 = answer.candidate_answer,
            None => {
                slots.insert(answer.question_id, kept.len());
                kept.push((answer.question_id, answer.candidate_answer));
            }
        }
    }
    kept
}

async fn answers_for_test(
    state: &AppState,
    test_id: Uuid,
    answers: Vec<SubmittedAnswer>,
) -> Result<Vec<(Uuid, String)>, AppError> {
    let known: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM test_questions WHERE test_id = $1")
        .bind(test_id)
        .fetch_all(&state.db)
        .await?;
    Ok(latest_answers(&known, answers))
}

/// GET /api/tests/my-tests
pub async fn handle_my_tests(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
) -> Result<Json<MyTestsResponse>, AppError> {
    let Some(candidate_id) = find_candidate_id(&state.db, user.id).await? else {
        return Ok(Json(MyTestsResponse::default()));
    };

    let rows = sqlx::query_as::<_, MyTestRow>(
        r#"
        SELECT t.id, t.title, t.description, t.instructions,
               t.start_date, t.start_time, t.end_date, t.end_time,
               t.duration_minutes, t.status AS test_status, t.results_published,
               jp.job_title, comp.name AS company_name,
               ja.id AS application_id, ja.test_status AS my_test_status,
               ta.id AS attempt_id, ta.status AS attempt_status,
               ta.total_score, ta.max_score, ta.submitted_at
        FROM job_applications ja
        JOIN tests t ON t.id = ja.test_id
        JOIN job_postings jp ON jp.job_id = ja.job_id
        JOIN companies comp ON comp.id = jp.company_id
        LEFT JOIN test_attempts ta ON ta.test_id = t.id AND ta.candidate_id = $1
        WHERE ja.candidate_id = $1 AND t.status = 'published'
        ORDER BY t.start_date, t.start_time
        "#,
    )
    .bind(candidate_id)
    .fetch_all(&state.db)
    .await?;

    let now = Utc::now();
    let mut response = MyTestsResponse::default();
    for row in rows {
        sort_into(&mut response, row, now);
    }
    Ok(Json(response))
}

/// GET /api/tests/:id/attempt
pub async fn handle_start_attempt(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(test_id): Path<Uuid>,
) -> Result<Json<AttemptResponse>, AppError> {
    let candidate_id = require_candidate(&state, user.id).await?;

    let assignment: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM job_applications WHERE test_id = $1 AND candidate_id = $2",
    )
    .bind(test_id)
    .bind(candidate_id)
    .fetch_optional(&state.db)
    .await?;
    let (application_id,) = assignment
        .ok_or_else(|| AppError::Forbidden("You are not assigned to this test".into()))?;

    let test = sqlx::query_as::<_, AttemptTestView>(
        r#"
        SELECT id, title, description, instructions,
               start_date, start_time, end_date, end_time, duration_minutes
        FROM tests
        WHERE id = $1 AND status = 'published'
        "#,
    )
    .bind(test_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Test not found".into()))?;

    let window = TestWindow::new(test.start_date, test.start_time, test.end_date, test.end_time);
    let now = Utc::now();
    if window.not_started(now) {
        return Err(AppError::ForbiddenWithDetail {
            message: format!(
                "Test will start at {}",
                window.start.format("%Y-%m-%d %H:%M UTC")
            ),
            detail: json!({ "notStarted": true, "startTime": window.start }),
        });
    }
    if window.has_ended(now) {
        return Err(AppError::ForbiddenWithDetail {
            message: "Test has expired".into(),
            detail: json!({ "expired": true }),
        });
    }

    let existing = sqlx::query_as::<_, AttemptRow>(
        "SELECT * FROM test_attempts WHERE test_id = $1 AND candidate_id = $2",
    )
    .bind(test_id)
    .bind(candidate_id)
    .fetch_optional(&state.db)
    .await?;
    if let Some(attempt) = &existing {
        if attempt
            .status
            .parse::<AttemptStatus>()
            .is_ok_and(AttemptStatus::is_finished)
        {
            return Err(AppError::Validation(
                "You have already submitted this test. Reattempts are not allowed.".into(),
            ));
        }
    }

    let questions = sqlx::query_as::<_, CandidateQuestionRow>(
        r#"
        SELECT id, question_text, question_type, options, question_order
        FROM test_questions
        WHERE test_id = $1
        ORDER BY question_order
        "#,
    )
    .bind(test_id)
    .fetch_all(&state.db)
    .await?;

    let (attempt_id, started_at, existing_answers, resumed) = match existing {
        Some(attempt) => {
            sqlx::query("UPDATE test_attempts SET last_active_at = NOW() WHERE id = $1")
                .bind(attempt.id)
                .execute(&state.db)
                .await?;
            let answers = sqlx::query_as::<_, TestAnswerRow>(
                "SELECT question_id, candidate_answer, is_correct FROM test_answers WHERE attempt_id = $1",
            )
            .bind(attempt.id)
            .fetch_all(&state.db)
            .await?;
            info!("Candidate {candidate_id} resumed attempt {} of test {test_id}", attempt.id);
            (attempt.id, attempt.started_at, answers, true)
        }
        None => {
            // A concurrent start lands on the same row.
            let (id, started_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
                r#"
                INSERT INTO test_attempts (test_id, candidate_id, application_id, status)
                VALUES ($1, $2, $3, 'in_progress')
                ON CONFLICT (test_id, candidate_id) DO UPDATE SET last_active_at = NOW()
                RETURNING id, started_at
                "#,
            )
            .bind(test_id)
            .bind(candidate_id)
            .bind(application_id)
            .fetch_one(&state.db)
            .await?;
            info!("Candidate {candidate_id} started attempt {id} of test {test_id}");
            (id, started_at, Vec::new(), false)
        }
    };

    Ok(Json(AttemptResponse {
        deadline: window.deadline_for(started_at, test.duration_minutes),
        test,
        questions,
        attempt_id,
        started_at,
        existing_answers,
        resumed,
    }))
}

/// POST /api/tests/:id/save-progress
pub async fn handle_save_progress(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(test_id): Path<Uuid>,
    Json(req): Json<SaveProgressRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let candidate_id = require_candidate(&state, user.id).await?;

    let attempt: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM test_attempts
        WHERE id = $1 AND candidate_id = $2 AND test_id = $3 AND status = 'in_progress'
        "#,
    )
    .bind(req.attempt_id)
    .bind(candidate_id)
    .bind(test_id)
    .fetch_optional(&state.db)
    .await?;
    if attempt.is_none() {
        return Err(AppError::Forbidden("Invalid or completed attempt".into()));
    }

    let answers = answers_for_test(&state, test_id, req.answers).await?;

    let mut tx = state.db.begin().await?;
    sqlx::query("DELETE FROM test_answers WHERE attempt_id = $1")
        .bind(req.attempt_id)
        .execute(&mut *tx)
        .await?;
    for (question_id, answer) in &answers {
        sqlx::query(
            r#"
            INSERT INTO test_answers (attempt_id, question_id, candidate_answer)
            VALUES ($1, $2, $3)
            ON CONFLICT (attempt_id, question_id)
            DO UPDATE SET candidate_answer = EXCLUDED.candidate_answer
            "#,
        )
        .bind(req.attempt_id)
        .bind(question_id)
        .bind(answer)
        .execute(&mut *tx)
        .await?;
    }
    sqlx::query("UPDATE test_attempts SET last_active_at = NOW() WHERE id = $1")
        .bind(req.attempt_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Json(MessageResponse {
        message: "Progress saved",
    }))
}

/// POST /api/tests/:id/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(test_id): Path<Uuid>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let candidate_id = require_candidate(&state, user.id).await?;

    let attempt = sqlx::query_as::<_, AttemptRow>(
        "SELECT * FROM test_attempts WHERE id = $1 AND candidate_id = $2 AND test_id = $3",
    )
    .bind(req.attempt_id)
    .bind(candidate_id)
    .bind(test_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::Forbidden("Invalid attempt".into()))?;
    if attempt
        .status
        .parse::<AttemptStatus>()
        .is_ok_and(AttemptStatus::is_finished)
    {
        return Err(AppError::Validation("Test already submitted".into()));
    }

    let (start_date, start_time, end_date, end_time): (NaiveDate, NaiveTime, NaiveDate, NaiveTime) =
        sqlx::query_as("SELECT start_date, start_time, end_date, end_time FROM tests WHERE id = $1")
            .bind(test_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Test not found".into()))?;
    let window = TestWindow::new(start_date, start_time, end_date, end_time);
    let now = Utc::now();
    if !window.accepts_submission(now, req.auto_submitted) {
        return Err(AppError::Validation("Submission window has closed".into()));
    }

    let mut tx = state.db.begin().await?;
    let key: Vec<(Uuid, String)> =
        sqlx::query_as("SELECT id, expected_answer FROM test_questions WHERE test_id = $1 ORDER BY question_order")
            .bind(test_id)
            .fetch_all(&mut *tx)
            .await?;
    let key: Vec<AnswerKey> = key
        .into_iter()
        .map(|(question_id, expected_answer)| AnswerKey {
            question_id,
            expected_answer,
        })
        .collect();
    let submitted: Vec<(Uuid, String)> = req
        .answers
        .into_iter()
        .map(|a| (a.question_id, a.candidate_answer))
        .collect();
    let result = grade(&key, &submitted);
    let time_taken_seconds = elapsed_seconds(attempt.started_at, now);

    let closed = sqlx::query(
        r#"
        UPDATE test_attempts
        SET status = 'submitted', submitted_at = NOW(), auto_submitted = $1,
            time_taken_seconds = $2, total_score = $3, max_score = $4, last_active_at = NOW()
        WHERE id = $5 AND status = 'in_progress'
        "#,
    )
    .bind(req.auto_submitted)
    .bind(time_taken_seconds)
    .bind(result.total_score)
    .bind(result.max_score)
    .bind(attempt.id)
    .execute(&mut *tx)
    .await?;
    if closed.rows_affected() == 0 {
        return Err(AppError::Validation("Test already submitted".into()));
    }

    sqlx::query("DELETE FROM test_answers WHERE attempt_id = $1")
        .bind(attempt.id)
        .execute(&mut *tx)
        .await?;
    for answer in &result.answers {
        sqlx::query(
            r#"
            INSERT INTO test_answers (attempt_id, question_id, candidate_answer, is_correct)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (attempt_id, question_id)
            DO UPDATE SET candidate_answer = EXCLUDED.candidate_answer,
                          is_correct = EXCLUDED.is_correct
            "#,
        )
        .bind(attempt.id)
        .bind(answer.question_id)
        .bind(&answer.candidate_answer)
        .bind(answer.is_correct)
        .execute(&mut *tx)
        .await?;
    }

    let score_percentage = result.percentage();
    sqlx::query(
        r#"
        UPDATE job_applications
        SET test_score = $1, test_status = $3, test_attempted_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(score_percentage)
    .bind(attempt.application_id)
    .bind(ApplicationTestStatus::Completed.as_str())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(
        "Attempt {} of test {test_id} submitted: {}/{} (auto: {})",
        attempt.id, result.total_score, result.max_score, req.auto_submitted
    );
    Ok(Json(SubmitResponse {
        message: "Test submitted successfully",
        total_score: result.total_score,
        max_score: result.max_score,
        score_percentage,
        time_taken_seconds,
    }))
}

/// GET /api/tests/:id/my-result
pub async fn handle_my_result(
    State(state): State<AppState>,
    JobSeeker(user): JobSeeker,
    Path(test_id): Path<Uuid>,
) -> Result<Json<MyResultResponse>, AppError> {
    let candidate_id = require_candidate(&state, user.id).await?;

    let (title, results_published): (String, bool) =
        sqlx::query_as("SELECT title, results_published FROM tests WHERE id = $1")
            .bind(test_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Test not found".into()))?;

    let attempt = sqlx::query_as::<_, AttemptRow>(
        r#"
        SELECT * FROM test_attempts
        WHERE test_id = $1 AND candidate_id = $2 AND status IN ('submitted', 'evaluated')
        "#,
    )
    .bind(test_id)
    .bind(candidate_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("No submission found".into()))?;

    if !results_published {
        return Ok(Json(MyResultResponse::Pending {
            title,
            results_published: false,
            message: "Results have not been published yet. Please check back later.",
        }));
    }

    let answers = sqlx::query_as::<_, AnswerDetailRow>(
        r#"
        SELECT tans.attempt_id, tans.candidate_answer, tans.is_correct,
               tq.question_text, tq.question_type, tq.expected_answer, tq.options, tq.question_order
        FROM test_answers tans
        JOIN test_questions tq ON tq.id = tans.question_id
        WHERE tans.attempt_id = $1
        ORDER BY tq.question_order
        "#,
    )
    .bind(attempt.id)
    .fetch_all(&state.db)
    .await?;

    let total_score = attempt.total_score.unwrap_or(0);
    let max_score = attempt.max_score.unwrap_or(0);
    Ok(Json(MyResultResponse::Published {
        title,
        results_published: true,
        total_score,
        max_score,
        score_percentage: percentage(total_score, max_score),
        time_taken_seconds: attempt.time_taken_seconds,
        submitted_at: attempt.submitted_at,
        auto_submitted: attempt.auto_submitted,
        answers,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn row(attempt_status: Option<&str>) -> MyTestRow {
        MyTestRow {
            id: Uuid::nil(),
            title: "Rust screening".into(),
            description: String::new(),
            instructions: String::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            duration_minutes: 30,
            test_status: "published".into(),
            results_published: false,
            job_title: "Backend Engineer".into(),
            company_name: "Acme".into(),
            application_id: Uuid::nil(),
            my_test_status: "pending".into(),
            attempt_id: None,
            attempt_status: attempt_status.map(str::to_string),
            total_score: None,
            max_score: None,
            submitted_at: None,
        }
    }

    #[test]
    fn test_sort_into_buckets() {
        let after = Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap();
        let mut response = MyTestsResponse::default();
        sort_into(&mut response, row(None), after);
        sort_into(&mut response, row(Some("submitted")), after);
        assert_eq!(response.completed.len(), 2);
        assert!(response.completed[0].expired);
        assert!(!response.completed[1].expired);
    }

    #[test]
    fn test_in_progress_attempt_stays_ongoing() {
        let during = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();
        let mut response = MyTestsResponse::default();
        sort_into(&mut response, row(Some("in_progress")), during);
        assert_eq!(response.ongoing.len(), 1);
    }

    #[test]
    fn test_expired_flag_only_serialized_when_set() {
        let entry = MyTestEntry {
            test: row(None),
            expired: false,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("expired").is_none());
        assert_eq!(json["job_title"], "Backend Engineer");
    }

    #[test]
    fn test_elapsed_seconds_never_negative() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        assert_eq!(elapsed_seconds(start, start + Duration::seconds(95)), 95);
        assert_eq!(elapsed_seconds(start, start - Duration::seconds(5)), 0);
    }

    fn submitted(n: u128, text: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: Uuid::from_u128(n),
            candidate_answer: text.to_string(),
        }
    }

    #[test]
    fn test_repeated_question_keeps_last_answer() {
        let known = [Uuid::from_u128(1), Uuid::from_u128(2)];
        let kept = latest_answers(
            &known,
            vec![submitted(1, "A"), submitted(2, "x"), submitted(1, "B")],
        );
        assert_eq!(
            kept,
            vec![
                (Uuid::from_u128(1), "B".to_string()),
                (Uuid::from_u128(2), "x".to_string()),
            ]
        );
    }

    #[test]
    fn test_answers_outside_test_dropped() {
        let known = [Uuid::from_u128(1)];
        let kept = latest_answers(&known, vec![submitted(9, "stray"), submitted(1, "A")]);
        assert_eq!(kept, vec![(Uuid::from_u128(1), "A".to_string())]);
    }

    #[test]
    fn test_pending_result_shape() {
        let json = serde_json::to_value(MyResultResponse::Pending {
            title: "Rust screening".into(),
            results_published: false,
            message: "later",
        })
        .unwrap();
        assert_eq!(json["resultsPublished"], false);
        assert!(json.get("totalScore").is_none());
    }
}
