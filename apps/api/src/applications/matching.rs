//! Applicant-to-job matching.
//!
//! The score is the TF-IDF cosine similarity between the job text and what is
//! known about the candidate, over a two-document corpus, scaled to 0..=100.
//! Pure and deterministic: no model call, no I/O.
//!
//! Alongside the score, `explain` breaks the job's required skills into those
//! found and those missing, so a recruiter can see why an applicant ranked
//! where they did.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// Words that carry no signal for matching.
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "do", "for", "from", "has", "have", "he", "her", "his", "i", "if", "in",
    "into", "is", "it", "its", "me", "my", "no", "not", "of", "on", "or", "our", "she", "so",
    "such", "that", "the", "their", "them", "then", "there", "these", "they", "this", "to", "up",
    "was", "we", "were", "what", "when", "which", "who", "will", "with", "would", "you", "your",
];

/// Skill names kept in an explanation, per list.
const MAX_LISTED_SKILLS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchExplanation {
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub summary: String,
}

/// Lowercases, strips punctuation and drops stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned
        .split_whitespace()
        .filter(|t| !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

fn term_counts(text: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

/// Cosine similarity of the two texts' TF-IDF vectors, as a rounded
/// percentage. Zero when either side has no usable terms.
pub fn match_score(job_text: &str, candidate_text: &str) -> i32 {
    let docs = [term_counts(job_text), term_counts(candidate_text)];
    if docs.iter().any(HashMap::is_empty) {
        return 0;
    }

    let terms: HashSet<&str> = docs
        .iter()
        .flat_map(|d| d.keys().map(String::as_str))
        .collect();

    let (mut dot, mut job_norm, mut candidate_norm) = (0.0_f64, 0.0_f64, 0.0_f64);
    for term in terms {
        let containing = docs.iter().filter(|d| d.contains_key(term)).count();
        let idf = 1.0 + (docs.len() as f64 / (1 + containing) as f64).ln();
        let weight =
            |doc: &HashMap<String, u32>| f64::from(doc.get(term).copied().unwrap_or(0)) * idf;
        let (job, candidate) = (weight(&docs[0]), weight(&docs[1]));
        dot += job * candidate;
        job_norm += job * job;
        candidate_norm += candidate * candidate;
    }

    if job_norm == 0.0 || candidate_norm == 0.0 {
        return 0;
    }
    let similarity = dot / (job_norm.sqrt() * candidate_norm.sqrt());
    (similarity * 100.0).round().clamp(0.0, 100.0) as i32
}

/// The job side of the comparison.
pub fn job_text(description: &str, required_skills: &str) -> String {
    if required_skills.trim().is_empty() {
        return description.to_string();
    }
    format!("{description}\n\nRequired Skills: {required_skills}")
}

/// The candidate side: profile skills and education first, then the resume.
pub fn candidate_text(
    skills: &[String],
    degree: Option<&str>,
    institution: Option<&str>,
    resume_text: &str,
) -> String {
    let mut parts = Vec::new();
    if !skills.is_empty() {
        parts.push(format!("Skills: {}", skills.join(", ")));
    }
    let education: Vec<&str> = [degree, institution]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if !education.is_empty() {
        parts.push(format!("Education: {}", education.join(" from ")));
    }
    if !resume_text.trim().is_empty() {
        parts.push(resume_text.to_string());
    }
    parts.join("\n\n")
}

/// Splits a free-text skills requirement such as `"Rust, SQL / Docker"`.
pub fn required_skills(raw: &str) -> Vec<String> {
    raw.split([',', ';', '|', '/'])
        .map(|s| s.trim().to_lowercase())
        .filter(|s| s.len() > 1)
        .collect()
}

/// A skill counts as found when a profile skill overlaps it or the candidate
/// text mentions it.
pub fn explain(
    required: &str,
    candidate_skills: &[String],
    candidate_text: &str,
    score: i32,
) -> MatchExplanation {
    let owned: Vec<String> = candidate_skills.iter().map(|s| s.to_lowercase()).collect();
    let text = candidate_text.to_lowercase();

    let (matched, missing): (Vec<String>, Vec<String>) =
        required_skills(required).into_iter().partition(|skill| {
            owned
                .iter()
                .any(|s| !s.is_empty() && (s.contains(skill.as_str()) || skill.contains(s.as_str())))
                || text.contains(skill.as_str())
        });

    let mut summary = Vec::new();
    let total = matched.len() + missing.len();
    if total > 0 {
        summary.push(format!("{} of {total} required skills detected.", matched.len()));
    } else {
        summary.push("No specific skills listed in the job requirements.".to_string());
    }
    if !missing.is_empty() {
        let shown: Vec<&str> = missing.iter().take(3).map(String::as_str).collect();
        let more = if missing.len() > 3 { "..." } else { "" };
        summary.push(format!("Missing: {}{more}", shown.join(", ")));
    }
    summary.push(
        match score {
            s if s < 40 => "Low overall keyword overlap with the job description.",
            s if s < 70 => "Moderate overlap with the job requirements.",
            _ => "Strong alignment with the job.",
        }
        .to_string(),
    );

    MatchExplanation {
        matched_skills: matched.into_iter().take(MAX_LISTED_SKILLS).collect(),
        missing_skills: missing.into_iter().take(MAX_LISTED_SKILLS).collect(),
        summary: summary.join("\n"),
    }
}

/// Positions (into a list already sorted best first) of the applicants to
/// promote: the first `top` with a non-zero score, skipping any that have
/// already moved past `applied`.
pub fn pick_shortlist(ranked: &[(i32, bool)], top: usize) -> Vec<usize> {
    ranked
        .iter()
        .enumerate()
        .filter(|(_, (score, _))| *score > 0)
        .take(top)
        .filter(|(_, (_, promotable))| *promotable)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stopwords_and_punctuation() {
        assert_eq!(
            tokenize("The Rust, and PostgreSQL!"),
            vec!["rust".to_string(), "postgresql".to_string()]
        );
    }

    #[test]
    fn test_identical_texts_score_full() {
        let text = "Backend engineer with Rust and Postgres experience";
        assert_eq!(match_score(text, text), 100);
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        assert_eq!(match_score("rust tokio axum", "watercolor painting"), 0);
    }

    #[test]
    fn test_empty_side_scores_zero() {
        assert_eq!(match_score("rust developer", ""), 0);
        assert_eq!(match_score("the and of", "rust"), 0);
    }

    #[test]
    fn test_closer_candidate_scores_higher() {
        let job = job_text("Build backend services in Rust", "Rust, Postgres, Docker");
        let strong = candidate_text(
            &["Rust".into(), "Postgres".into(), "Docker".into()],
            Some("BSc Computer Science"),
            None,
            "Built backend services in Rust",
        );
        let weak = candidate_text(&["Photoshop".into()], None, None, "Graphic design portfolio");
        let (strong, weak) = (match_score(&job, &strong), match_score(&job, &weak));
        assert!(strong > weak, "{strong} <= {weak}");
        assert!((0..=100).contains(&strong));
    }

    #[test]
    fn test_candidate_text_layout() {
        let text = candidate_text(&["Go".into()], Some("BSc"), Some("MIT"), "resume body");
        assert_eq!(text, "Skills: Go\n\nEducation: BSc from MIT\n\nresume body");
        assert_eq!(candidate_text(&[], None, Some("  "), ""), "");
    }

    #[test]
    fn test_required_skills_split() {
        assert_eq!(
            required_skills("Rust, SQL / Docker;k8s | x"),
            vec!["rust", "sql", "docker", "k8s"]
        );
    }

    #[test]
    fn test_explain_matches_profile_and_text() {
        let explanation = explain(
            "Rust, Kubernetes, GraphQL",
            &["rust".into()],
            "deployed on kubernetes clusters",
            55,
        );
        assert_eq!(explanation.matched_skills, vec!["rust", "kubernetes"]);
        assert_eq!(explanation.missing_skills, vec!["graphql"]);
        assert!(explanation.summary.contains("2 of 3 required skills"));
        assert!(explanation.summary.contains("Missing: graphql"));
        assert!(explanation.summary.contains("Moderate"));
    }

    #[test]
    fn test_pick_shortlist_takes_top_scored() {
        let ranked = [(90, true), (80, false), (60, true), (40, true), (0, true)];
        assert_eq!(pick_shortlist(&ranked, 3), vec![0, 2]);
        assert_eq!(pick_shortlist(&ranked, 10), vec![0, 2, 3]);
        assert!(pick_shortlist(&ranked, 0).is_empty());
    }
}
