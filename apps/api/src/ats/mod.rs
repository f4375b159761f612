//! ATS compatibility report.
//!
//! A deterministic, section-based score with feedback, computed from the canonical
//! document alone. Keyword, formatting and language categories carry baseline scores:
//! they would need the job description and the rendered layout, which the document
//! does not hold.

pub mod handlers;

use serde::Serialize;
use serde_json::Value;

use crate::document::{ResumeDocument, SectionValue};
use crate::layout::pagination::ESSENTIAL_SECTION_IDS;

const CONTENT_QUALITY_MAX: u32 = 25;
const KEYWORD_MATCHING_MAX: u32 = 30;
const FORMATTING_MAX: u32 = 10;
const LANGUAGE_QUALITY_MAX: u32 = 10;
const SECTION_ORGANIZATION_MAX: u32 = 25;

const KEYWORD_MATCHING_BASELINE: u32 = 22;
const FORMATTING_BASELINE: u32 = 8;
const LANGUAGE_QUALITY_BASELINE: u32 = 7;

/// A category below this share of its maximum is listed as an improvement area.
const IMPROVEMENT_THRESHOLD_PERCENT: u32 = 80;

const SUMMARY_MIN_CHARS: usize = 50;
const SUMMARY_MAX_CHARS: usize = 500;
const POINTS_PER_MISSING_SECTION: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ContentQuality,
    KeywordMatching,
    Formatting,
    LanguageQuality,
    SectionOrganization,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub score: u32,
    pub max_score: u32,
    pub feedback: Vec<String>,
}

impl CategoryScore {
    fn new(score: u32, max_score: u32, feedback: Vec<String>) -> Self {
        Self {
            score: score.min(max_score),
            max_score,
            feedback,
        }
    }

    /// Rounded share of the maximum, 0–100.
    pub fn percentage(&self) -> u32 {
        (self.score * 100 + self.max_score / 2) / self.max_score
    }

    fn needs_improvement(&self) -> bool {
        self.score * 100 < self.max_score * IMPROVEMENT_THRESHOLD_PERCENT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtsSections {
    pub content_quality: CategoryScore,
    pub keyword_matching: CategoryScore,
    pub formatting: CategoryScore,
    pub language_quality: CategoryScore,
    pub section_organization: CategoryScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementArea {
    pub area: Category,
    pub current_score: u32,
    pub max_score: u32,
    pub percentage: u32,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtsReport {
    pub overall_score: u32,
    pub max_score: u32,
    pub assessment: &'static str,
    pub assessment_details: &'static str,
    pub sections: AtsSections,
    /// Weakest first.
    pub improvement_areas: Vec<ImprovementArea>,
}

/// Scores `document`. The same document always yields the same report.
pub fn score_document(document: &ResumeDocument) -> AtsReport {
    let sections = AtsSections {
        content_quality: content_quality(document),
        keyword_matching: keyword_matching(),
        formatting: formatting(),
        language_quality: language_quality(),
        section_organization: section_organization(document),
    };

    let all = [
        &sections.content_quality,
        &sections.keyword_matching,
        &sections.formatting,
        &sections.language_quality,
        &sections.section_organization,
    ];
    let overall_score = all.iter().map(|c| c.score).sum();
    let max_score = all.iter().map(|c| c.max_score).sum();
    let (assessment, assessment_details) = assess(overall_score, max_score);

    // Formatting and language carry fixed baselines, so only these three can move.
    let mut improvement_areas: Vec<ImprovementArea> = [
        (Category::ContentQuality, &sections.content_quality),
        (Category::KeywordMatching, &sections.keyword_matching),
        (Category::SectionOrganization, &sections.section_organization),
    ]
    .into_iter()
    .filter(|(_, score)| score.needs_improvement())
    .map(|(area, score)| ImprovementArea {
        area,
        current_score: score.score,
        max_score: score.max_score,
        percentage: score.percentage(),
        recommendations: score.feedback.clone(),
    })
    .collect();
    improvement_areas.sort_by_key(|a| a.percentage);

    AtsReport {
        overall_score,
        max_score,
        assessment,
        assessment_details,
        sections,
        improvement_areas,
    }
}

fn assess(score: u32, max: u32) -> (&'static str, &'static str) {
    let percent = score * 100 / max.max(1);
    match percent {
        90.. => (
            "Excellent ATS Compatibility",
            "Your resume has excellent ATS compatibility. It is well-structured, contains all essential sections, and uses appropriate keywords.",
        ),
        80..=89 => (
            "Good ATS Compatibility",
            "Your resume has good ATS compatibility but could be improved in several areas. Address the recommendations below to increase your chances of passing ATS systems.",
        ),
        70..=79 => (
            "Fair ATS Compatibility",
            "Your resume has fair ATS compatibility. Several important improvements are needed to ensure it passes ATS systems effectively.",
        ),
        60..=69 => (
            "Poor ATS Compatibility",
            "Your resume has poor ATS compatibility. Significant improvements are needed in multiple areas to pass ATS systems.",
        ),
        _ => (
            "Very Poor ATS Compatibility",
            "Your resume has very poor ATS compatibility. Major revisions are needed to make it ATS-friendly.",
        ),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Content quality
// ────────────────────────────────────────────────────────────────────────────

/// Feedback lines plus the per-part scoring lines appended after them.
#[derive(Default)]
struct Notes {
    feedback: Vec<String>,
    scoring: Vec<String>,
}

impl Notes {
    fn into_feedback(self) -> Vec<String> {
        let mut out = self.feedback;
        out.extend(self.scoring.into_iter().map(|line| format!("DETAILED SCORING: {line}")));
        out
    }
}

fn content_quality(document: &ResumeDocument) -> CategoryScore {
    let mut notes = Notes::default();
    let score = summary_points(document, &mut notes)
        + experience_points(document, &mut notes)
        + education_points(document, &mut notes)
        + skills_points(document, &mut notes)
        + structure_points(&mut notes);
    CategoryScore::new(score, CONTENT_QUALITY_MAX, notes.into_feedback())
}

fn summary_points(document: &ResumeDocument, notes: &mut Notes) -> u32 {
    let summary = match (document.text("summary"), document.entries("summary")) {
        (Some(text), _) => text.trim().to_string(),
        (_, Some(lines)) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => document.basics.summary.clone().unwrap_or_default(),
    };
    let length = summary.chars().count();

    if length == 0 {
        notes.feedback.push(
            "Missing professional summary - include a concise overview of your qualifications".into(),
        );
        notes.scoring.push("Summary: 0/5 points - No summary found".into());
        0
    } else if length < SUMMARY_MIN_CHARS {
        notes.feedback.push(
            "Summary is too short (under 50 characters) - expand to highlight key qualifications".into(),
        );
        notes
            .scoring
            .push(format!("Summary: 2/5 points - Summary is too brief ({length} characters)"));
        2
    } else if length > SUMMARY_MAX_CHARS {
        notes.feedback.push(
            "Summary is too long (over 500 characters) - condense to be more impactful".into(),
        );
        notes
            .scoring
            .push(format!("Summary: 3/5 points - Summary is too long ({length} characters)"));
        3
    } else {
        notes.scoring.push("Summary: 5/5 points - Excellent summary".into());
        5
    }
}

fn experience_points(document: &ResumeDocument, notes: &mut Notes) -> u32 {
    const MAX: u32 = 8;
    let jobs = document.entries("experience").unwrap_or_default();
    if jobs.is_empty() {
        notes.feedback.push(
            "No work experience entries found - this is critical content for ATS evaluation".into(),
        );
        notes.scoring.push("Experience: 0/8 points - No experience entries found".into());
        return 0;
    }

    let mut score = MAX;
    let mut issues = Vec::new();

    let missing_names: u32 = jobs
        .iter()
        .map(|job| {
            u32::from(!has_any(job, &["position", "title"])) + u32::from(!has_any(job, &["company", "organization"]))
        })
        .sum();
    if missing_names > 0 {
        let deduction = missing_names.min(3);
        score -= deduction;
        notes.feedback.push(
            "Missing job titles or company names in experience entries - these are key ATS matching points"
                .into(),
        );
        issues.push(format!("Missing titles/companies (-{deduction} points)"));
    }

    let missing_descriptions = jobs
        .iter()
        .filter(|job| !has_any(job, &["description"]) && !has_items(job, "highlights"))
        .count() as u32;
    if missing_descriptions > 0 {
        let deduction = (missing_descriptions * 2).min(5);
        score -= deduction;
        notes.feedback.push(format!(
            "Missing descriptions in {missing_descriptions} work experience entries - include detailed responsibilities and achievements"
        ));
        issues.push(format!("Missing descriptions (-{deduction} points)"));
    }

    notes.scoring.push(detailed("Experience", score, MAX, &issues, "Excellent experience section"));
    score
}

fn education_points(document: &ResumeDocument, notes: &mut Notes) -> u32 {
    const MAX: u32 = 4;
    let schools = document.entries("education").unwrap_or_default();
    if schools.is_empty() {
        notes
            .feedback
            .push("No education entries found - include your educational background".into());
        notes.scoring.push("Education: 0/4 points - No education entries found".into());
        return 0;
    }

    let mut issues = Vec::new();
    let missing: u32 = schools
        .iter()
        .map(|edu| {
            u32::from(!has_any(edu, &["institution", "school"]))
                + u32::from(!has_any(edu, &["area", "studyType", "degree"]))
        })
        .sum();
    let deduction = missing.min(MAX);
    if deduction > 0 {
        notes.feedback.push(
            "Incomplete information in education entries - include institution and field of study".into(),
        );
        issues.push(format!("Missing education details (-{deduction} points)"));
    }

    let score = MAX - deduction;
    notes.scoring.push(detailed("Education", score, MAX, &issues, "Excellent education section"));
    score
}

fn skills_points(document: &ResumeDocument, notes: &mut Notes) -> u32 {
    const MAX: u32 = 5;
    let count = match document.section("skills") {
        Some(SectionValue::Entries(skills)) => skills.len(),
        Some(SectionValue::Text(text)) if !text.trim().is_empty() => 1,
        _ => 0,
    };
    if count == 0 {
        notes.feedback.push(
            "Missing skills section or no skills listed - skills are crucial for ATS keyword matching".into(),
        );
        notes.scoring.push("Skills: 0/5 points - No skills listed".into());
        return 0;
    }

    let mut issues = Vec::new();
    let deduction = match count {
        0..=4 => {
            notes.feedback.push(
                "Very few skills listed - include a comprehensive list of relevant technical and soft skills"
                    .into(),
            );
            issues.push(format!("Too few skills ({count}) (-3 points)"));
            3
        }
        5..=7 => {
            notes
                .feedback
                .push("Consider adding more skills to improve ATS matching".into());
            issues.push(format!("Could use more skills ({count}) (-1 point)"));
            1
        }
        _ => 0,
    };

    let score = MAX - deduction;
    notes.scoring.push(detailed("Skills", score, MAX, &issues, "Excellent skills section"));
    score
}

fn structure_points(notes: &mut Notes) -> u32 {
    notes
        .scoring
        .push("Structure & Length: 3/3 points - Good resume structure".into());
    3
}

fn detailed(part: &str, score: u32, max: u32, issues: &[String], praise: &str) -> String {
    if issues.is_empty() {
        format!("{part}: {score}/{max} points - {praise}")
    } else {
        format!("{part}: {score}/{max} points - Issues: {}", issues.join(", "))
    }
}

/// Whether any of `fields` holds a non-blank value.
fn has_any(entry: &Value, fields: &[&str]) -> bool {
    fields.iter().any(|field| match entry.get(*field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    })
}

fn has_items(entry: &Value, field: &str) -> bool {
    entry
        .get(field)
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Baseline categories
// ────────────────────────────────────────────────────────────────────────────

fn keyword_matching() -> CategoryScore {
    CategoryScore::new(
        KEYWORD_MATCHING_BASELINE,
        KEYWORD_MATCHING_MAX,
        vec![
            "Use industry-specific keywords throughout your resume".into(),
            "Include relevant technical terms and skills in your summary".into(),
            "Match keywords to the types of jobs you're applying for".into(),
        ],
    )
}

fn formatting() -> CategoryScore {
    CategoryScore::new(
        FORMATTING_BASELINE,
        FORMATTING_MAX,
        vec![
            "No major formatting issues detected - resume has clean, ATS-friendly formatting".into(),
            "DETAILED SCORING: ATS-Friendly Structure: 4/4 points - Clean structure".into(),
            "DETAILED SCORING: Character Usage: 3/3 points - Appropriate character usage".into(),
            "DETAILED SCORING: Formatting Consistency: 1/3 points - Some inconsistency detected".into(),
        ],
    )
}

fn language_quality() -> CategoryScore {
    CategoryScore::new(
        LANGUAGE_QUALITY_BASELINE,
        LANGUAGE_QUALITY_MAX,
        vec![
            "Language quality is good - professional tone and good grammar".into(),
            "DETAILED SCORING: Professional Tone: 2/3 points - Good professional tone".into(),
            "DETAILED SCORING: Active Voice: 2/3 points - Good use of active voice".into(),
            "DETAILED SCORING: Grammar & Spelling: 3/4 points - Good grammar and spelling".into(),
        ],
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Section organization
// ────────────────────────────────────────────────────────────────────────────

fn section_organization(document: &ResumeDocument) -> CategoryScore {
    let missing: Vec<&str> = ESSENTIAL_SECTION_IDS
        .iter()
        .copied()
        .filter(|id| !document.has_content(id))
        .collect();

    if missing.is_empty() {
        return CategoryScore::new(
            SECTION_ORGANIZATION_MAX,
            SECTION_ORGANIZATION_MAX,
            vec![
                "All essential section headers are present and properly organized".into(),
                "DETAILED SCORING: Section Headers: 25/25 points - All essential sections present".into(),
            ],
        );
    }

    let score = SECTION_ORGANIZATION_MAX.saturating_sub(missing.len() as u32 * POINTS_PER_MISSING_SECTION);
    CategoryScore::new(
        score,
        SECTION_ORGANIZATION_MAX,
        vec![
            format!(
                "Missing essential sections: {} - add these for better ATS compatibility",
                missing.join(", ")
            ),
            format!(
                "DETAILED SCORING: Section Headers: {score}/25 points - Missing {} essential sections",
                missing.len()
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::normalize;
    use serde_json::json;

    const LONG_SUMMARY: &str =
        "Backend engineer with eight years building payment systems in Rust and Go at scale.";

    fn strong() -> ResumeDocument {
        normalize(&json!({
            "name": "Jane",
            "summary": LONG_SUMMARY,
            "experience": [{ "title": "Eng", "company": "Acme", "highlights": ["Shipped"] }],
            "education": [{ "degree": "BSc", "school": "X U" }],
            "skills": ["Rust", "Go", "SQL", "AWS", "Docker", "Kafka", "Linux", "gRPC"]
        }))
    }

    #[test]
    fn test_complete_document_scores_full_content_and_sections() {
        let report = score_document(&strong());
        assert_eq!(report.sections.content_quality.score, 25);
        assert_eq!(report.sections.section_organization.score, 25);
        assert_eq!(report.overall_score, 25 + 22 + 8 + 7 + 25);
        assert_eq!(report.max_score, 100);
        assert_eq!(report.assessment, "Good ATS Compatibility");

        // the keyword baseline sits below the threshold on its own
        let areas: Vec<Category> = report.improvement_areas.iter().map(|a| a.area).collect();
        assert_eq!(areas, vec![Category::KeywordMatching]);
        assert_eq!(report.improvement_areas[0].percentage, 73);
    }

    #[test]
    fn test_empty_document() {
        let report = score_document(&ResumeDocument::default());
        assert_eq!(report.sections.content_quality.score, 3);
        assert_eq!(report.sections.section_organization.score, 1);
        assert_eq!(report.overall_score, 3 + 22 + 8 + 7 + 1);
        assert_eq!(report.assessment, "Very Poor ATS Compatibility");

        let areas: Vec<Category> = report.improvement_areas.iter().map(|a| a.area).collect();
        assert_eq!(
            areas,
            vec![Category::SectionOrganization, Category::ContentQuality, Category::KeywordMatching]
        );
        assert_eq!(report.improvement_areas[0].percentage, 4);
    }

    #[test]
    fn test_short_summary_and_few_skills() {
        let doc = normalize(&json!({
            "summary": "Engineer",
            "experience": [{ "title": "Eng", "company": "Acme", "description": "Built it" }],
            "education": [{ "school": "X U" }],
            "skills": ["Rust", "Go"]
        }));
        let content = score_document(&doc).sections.content_quality;
        // summary 2, experience 8, education 3, skills 2, structure 3
        assert_eq!(content.score, 18);
        assert!(content
            .feedback
            .contains(&"DETAILED SCORING: Summary: 2/5 points - Summary is too brief (8 characters)".to_string()));
        assert!(content
            .feedback
            .contains(&"DETAILED SCORING: Skills: 2/5 points - Issues: Too few skills (2) (-3 points)".to_string()));
    }

    #[test]
    fn test_experience_deductions_are_capped() {
        let doc = normalize(&json!({ "experience": [{}, {}, {}] }));
        let mut notes = Notes::default();
        // names: 6 missing capped at 3; descriptions: 3 missing capped at 5
        assert_eq!(experience_points(&doc, &mut notes), 0);
        assert!(notes.scoring[0].starts_with("Experience: 0/8 points - Issues:"));
    }

    #[test]
    fn test_missing_sections_listed_in_order() {
        let doc = normalize(&json!({ "experience": [{ "title": "Eng" }] }));
        let organization = section_organization(&doc);
        assert_eq!(organization.score, 7);
        assert_eq!(
            organization.feedback[0],
            "Missing essential sections: summary, education, skills - add these for better ATS compatibility"
        );
    }

    #[test]
    fn test_summary_from_basics_counts() {
        let doc = normalize(&json!({ "basics": { "summary": LONG_SUMMARY } }));
        let mut notes = Notes::default();
        assert_eq!(summary_points(&doc, &mut notes), 5);
    }

    #[test]
    fn test_report_wire_shape() {
        let value = serde_json::to_value(score_document(&ResumeDocument::default())).unwrap();
        assert_eq!(value["max_score"], 100);
        assert_eq!(value["sections"]["keyword_matching"]["max_score"], 30);
        assert_eq!(value["improvement_areas"][0]["area"], "section_organization");
    }

    #[test]
    fn test_scoring_is_deterministic() {
        assert_eq!(score_document(&strong()), score_document(&strong()));
    }
}
