//! Study recommendations
//!
//! Scores catalog resources for a learner: same grade only, skip what was
//! already completed, favour weak subjects, and nudge notes in the morning
//! and mock exams later in the day.

use chrono::{Local, Timelike};
use elimu_types::{Recommendation, Resource, ResourceKind};

/// Maximum number of recommendations returned
pub const MAX_RECOMMENDATIONS: usize = 10;

const BASE_SCORE: u8 = 50;
const WEAK_SUBJECT_BOOST: u8 = 30;
const TIME_OF_DAY_BOOST: u8 = 10;

/// Rank resources for a learner at the given local hour (0-23)
pub fn recommend(
    grade: u8,
    weak_subjects: &[String],
    completed_ids: &[String],
    resources: &[Resource],
    hour: u32,
) -> Vec<Recommendation> {
    let is_morning = hour < 12;

    let mut recommendations: Vec<Recommendation> = resources
        .iter()
        .filter(|r| r.grade == grade)
        .filter(|r| !completed_ids.contains(&r.id))
        .map(|resource| {
            let mut score = BASE_SCORE;
            let mut reason = "Recommended for your grade".to_string();

            if weak_subjects.contains(&resource.subject) {
                score += WEAK_SUBJECT_BOOST;
                reason = format!("You struggled with {}", resource.subject);
            }

            if is_morning && resource.kind == ResourceKind::Notes {
                score += TIME_OF_DAY_BOOST;
                reason = "Good for morning study".to_string();
            } else if !is_morning && resource.kind == ResourceKind::Mock {
                score += TIME_OF_DAY_BOOST;
                reason = "Good for evening revision".to_string();
            }

            Recommendation {
                resource_id: resource.id.clone(),
                score,
                reason,
            }
        })
        .collect();

    // Stable sort keeps catalog order for ties
    recommendations.sort_by(|a, b| b.score.cmp(&a.score));
    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}

/// Same as [`recommend`] using the current local hour
pub fn recommend_now(
    grade: u8,
    weak_subjects: &[String],
    completed_ids: &[String],
    resources: &[Resource],
) -> Vec<Recommendation> {
    recommend(grade, weak_subjects, completed_ids, resources, Local::now().hour())
}

#[cfg(test)]
mod tests {
    use super::*;
    use elimu_types::Curriculum;

    fn resource(id: &str, kind: ResourceKind, subject: &str, grade: u8) -> Resource {
        Resource {
            id: id.to_string(),
            title: id.to_string(),
            kind,
            subject: subject.to_string(),
            grade,
            year: None,
            curriculum: Curriculum::Kcse,
            download_url: format!("https://x/{}.pdf", id),
            file_size: 0,
            premium: false,
        }
    }

    fn catalog() -> Vec<Resource> {
        vec![
            resource("paper", ResourceKind::PastPaper, "Physics", 11),
            resource("notes", ResourceKind::Notes, "Biology", 11),
            resource("mock", ResourceKind::Mock, "Chemistry", 11),
            resource("weak", ResourceKind::Topical, "Mathematics", 11),
            resource("other-grade", ResourceKind::Notes, "Mathematics", 12),
        ]
    }

    #[test]
    fn morning_ranking() {
        let weak = vec!["Mathematics".to_string()];
        let recs = recommend(11, &weak, &[], &catalog(), 8);

        let order: Vec<_> = recs.iter().map(|r| (r.resource_id.as_str(), r.score)).collect();
        assert_eq!(
            order,
            [("weak", 80), ("notes", 60), ("paper", 50), ("mock", 50)]
        );
        assert_eq!(recs[0].reason, "You struggled with Mathematics");
        assert_eq!(recs[1].reason, "Good for morning study");
        assert_eq!(recs[2].reason, "Recommended for your grade");
    }

    #[test]
    fn evening_favours_mocks_and_skips_completed() {
        let completed = vec!["paper".to_string()];
        let recs = recommend(11, &[], &completed, &catalog(), 19);

        assert_eq!(recs[0].resource_id, "mock");
        assert_eq!(recs[0].score, 60);
        assert_eq!(recs[0].reason, "Good for evening revision");
        assert!(recs.iter().all(|r| r.resource_id != "paper"));
        assert!(recs.iter().all(|r| r.resource_id != "other-grade"));
    }

    #[test]
    fn time_of_day_reason_overrides_weak_subject() {
        let resources = vec![resource("n", ResourceKind::Notes, "Biology", 11)];
        let weak = vec!["Biology".to_string()];

        let recs = recommend(11, &weak, &[], &resources, 9);
        assert_eq!(recs[0].score, 90);
        assert_eq!(recs[0].reason, "Good for morning study");
    }

    #[test]
    fn at_most_ten() {
        let resources: Vec<_> = (0..25)
            .map(|i| resource(&format!("r{}", i), ResourceKind::Topical, "History", 7))
            .collect();

        let recs = recommend(7, &[], &[], &resources, 12);
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert_eq!(recs[0].resource_id, "r0");
    }
}
