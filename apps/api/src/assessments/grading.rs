use std::collections::HashMap;

use uuid::Uuid;

/// A question's id and the answer it expects.
#[derive(Debug, Clone)]
pub struct AnswerKey {
    pub question_id: Uuid,
    pub expected_answer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradedAnswer {
    pub question_id: Uuid,
    pub candidate_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub total_score: i32,
    pub max_score: i32,
    pub answers: Vec<GradedAnswer>,
}

impl Grade {
    pub fn percentage(&self) -> f64 {
        percentage(self.total_score, self.max_score)
    }
}

/// Objective and descriptive answers are both compared this way.
pub fn answers_match(given: &str, expected: &str) -> bool {
    given.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// Scores one point per correct answer out of one per question. Answers to
/// questions outside the key are dropped; a repeated question keeps its last
/// answer.
pub fn grade(key: &[AnswerKey], submitted: &[(Uuid, String)]) -> Grade {
    let expected: HashMap<Uuid, &str> = key
        .iter()
        .map(|k| (k.question_id, k.expected_answer.as_str()))
        .collect();

    let mut latest: HashMap<Uuid, &str> = HashMap::new();
    for (question_id, answer) in submitted {
        if expected.contains_key(question_id) {
            latest.insert(*question_id, answer.as_str());
        }
    }

    let answers: Vec<GradedAnswer> = key
        .iter()
        .filter_map(|k| {
            latest.get(&k.question_id).map(|given| GradedAnswer {
                question_id: k.question_id,
                candidate_answer: given.to_string(),
                is_correct: answers_match(given, &k.expected_answer),
            })
        })
        .collect();

    Grade {
        total_score: answers.iter().filter(|a| a.is_correct).count() as i32,
        max_score: key.len() as i32,
        answers,
    }
}

/// Percentage rounded to two decimals; zero when there is nothing to score.
pub fn percentage(total: i32, max: i32) -> f64 {
    if max <= 0 {
        return 0.0;
    }
    (f64::from(total) / f64::from(max) * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u128, expected: &str) -> AnswerKey {
        AnswerKey {
            question_id: Uuid::from_u128(n),
            expected_answer: expected.to_string(),
        }
    }

    fn answer(n: u128, text: &str) -> (Uuid, String) {
        (Uuid::from_u128(n), text.to_string())
    }

    #[test]
    fn test_match_is_trimmed_and_case_insensitive() {
        assert!(answers_match("  Paris ", "paris"));
        assert!(answers_match("O(N LOG N)", "o(n log n)"));
        assert!(!answers_match("Pari", "Paris"));
    }

    #[test]
    fn test_grade_counts_correct_answers() {
        let keys = [key(1, "B"), key(2, "tokio"), key(3, "42")];
        let grade = grade(&keys, &[answer(1, "b"), answer(2, "async-std")]);
        assert_eq!(grade.total_score, 1);
        assert_eq!(grade.max_score, 3);
        assert_eq!(grade.answers.len(), 2);
        assert_eq!(grade.percentage(), 33.33);
    }

    #[test]
    fn test_unknown_questions_ignored() {
        let keys = [key(1, "yes")];
        let grade = grade(&keys, &[answer(7, "yes"), answer(1, "YES")]);
        assert_eq!(grade.total_score, 1);
        assert_eq!(grade.answers.len(), 1);
        assert_eq!(grade.answers[0].question_id, Uuid::from_u128(1));
    }

    #[test]
    fn test_repeated_answer_scored_once() {
        let keys = [key(1, "a"), key(2, "b")];
        let grade = grade(&keys, &[answer(1, "a"), answer(1, "a")]);
        assert_eq!(grade.total_score, 1);
        assert_eq!(grade.percentage(), 50.0);
    }

    #[test]
    fn test_percentage_without_questions_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(grade(&[], &[answer(1, "x")]).percentage(), 0.0);
        assert_eq!(percentage(2, 3), 66.67);
    }
}
