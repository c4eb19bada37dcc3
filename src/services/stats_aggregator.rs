use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::dto::stats_dto::{
    ModuleQuestionFailures, ModuleQuizScore, ModuleStats, QuestionFailureRate, WorkshopAnalytics,
    WorkshopStats,
};
use crate::models::feedback::Feedback;
use crate::models::progress::StudentProgress;
use crate::models::quiz::{Question, Quiz, QuizScore};
use crate::models::workshop::Module;

/// A module as the aggregator sees it: substeps reduced to a count, quiz with its questions.
#[derive(Debug, Clone)]
pub struct ModuleSnapshot {
    pub module: Module,
    pub substep_count: usize,
    pub quiz: Option<QuizSnapshot>,
}

#[derive(Debug, Clone)]
pub struct QuizSnapshot {
    pub quiz: Quiz,
    pub questions: Vec<Question>,
}

/// Pure summaries over already-loaded workshop rows.
///
/// Nothing here touches storage or fails: empty input yields zero (or null) aggregates.
/// Percentages and averages are rounded to two decimals, half away from zero, in decimal
/// arithmetic.
pub struct StatsAggregator;

impl StatsAggregator {
    /// Records that do not belong to `snapshot` (other module, other quiz) are ignored.
    pub fn module_stats(
        snapshot: &ModuleSnapshot,
        progress: &[StudentProgress],
        quiz_scores: &[QuizScore],
    ) -> ModuleStats {
        let module_id = snapshot.module.id;
        let records: Vec<&StudentProgress> =
            progress.iter().filter(|p| p.module_id == module_id).collect();
        let enrolled_students = records.len();

        let avg_completion = if enrolled_students == 0 {
            Decimal::ZERO
        } else {
            // All records share one denominator, so the mean is a single division.
            let reached: i64 = records.iter().map(|p| i64::from(p.highest_substep) + 1).sum();
            let denominator =
                Decimal::from(substep_denominator(snapshot.substep_count)) * Decimal::from(enrolled_students);
            Decimal::from(reached) / denominator
        };

        let avg_quiz_score = snapshot
            .quiz
            .as_ref()
            .map(|qs| mean_quiz_ratio(qs.quiz.id, quiz_scores));

        ModuleStats {
            module_id,
            module_title: snapshot.module.title.clone(),
            avg_completion_percentage: percentage(avg_completion),
            enrolled_students,
            avg_quiz_score_percentage: avg_quiz_score.map(percentage),
        }
    }

    pub fn workshop_stats(
        workshop_id: Uuid,
        modules: &[ModuleSnapshot],
        progress: &[StudentProgress],
        quiz_scores: &[QuizScore],
        feedback: &[Feedback],
    ) -> WorkshopStats {
        let ordered = by_position(modules);

        let mut pairs: HashSet<(Uuid, Uuid)> = HashSet::new();
        let mut ratio_sum = Decimal::ZERO;
        let mut total_time: i64 = 0;
        for record in progress {
            // Progress on a module outside this workshop does not count.
            let Some(snapshot) = modules.iter().find(|m| m.module.id == record.module_id) else {
                continue;
            };
            pairs.insert((record.user_id, record.module_id));
            ratio_sum += completion_ratio(record.highest_substep, snapshot.substep_count);
            total_time += record.time_spent;
        }

        let (average_completion, average_time) = if pairs.is_empty() {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let pair_count = Decimal::from(pairs.len());
            (ratio_sum / pair_count, Decimal::from(total_time) / pair_count)
        };

        let workshop_feedback: Vec<&Feedback> =
            feedback.iter().filter(|f| f.workshop_id == workshop_id).collect();
        let stars: Vec<i32> = workshop_feedback.iter().filter_map(|f| f.stars).collect();
        let average_rating = if stars.is_empty() {
            None
        } else {
            let sum: i64 = stars.iter().map(|s| i64::from(*s)).sum();
            Some(round2(Decimal::from(sum) / Decimal::from(stars.len())))
        };

        WorkshopStats {
            workshop_id,
            average_completion_percentage: percentage(average_completion),
            average_time_spent: round2(average_time),
            modules: ordered
                .into_iter()
                .map(|m| Self::module_stats(m, progress, quiz_scores))
                .collect(),
            average_rating,
            total_feedback: workshop_feedback.len(),
        }
    }

    /// Quiz averages per module plus per-question placeholders. Failure rates stay null.
    pub fn analytics(modules: &[ModuleSnapshot], quiz_scores: &[QuizScore]) -> WorkshopAnalytics {
        let mut module_quiz_scores = Vec::new();
        let mut question_failure_rates = Vec::new();

        for snapshot in by_position(modules) {
            let Some(quiz) = snapshot.quiz.as_ref() else {
                continue;
            };
            module_quiz_scores.push(ModuleQuizScore {
                module_id: snapshot.module.id,
                module_title: snapshot.module.title.clone(),
                avg_score_percentage: percentage(mean_quiz_ratio(quiz.quiz.id, quiz_scores)),
            });
            question_failure_rates.push(ModuleQuestionFailures {
                module_id: snapshot.module.id,
                module_title: snapshot.module.title.clone(),
                questions: quiz
                    .questions
                    .iter()
                    .map(|q| QuestionFailureRate {
                        question_id: q.id,
                        question_text: q.text.clone(),
                        failure_rate_percentage: None,
                    })
                    .collect(),
            });
        }

        WorkshopAnalytics {
            module_quiz_scores,
            question_failure_rates,
        }
    }
}

fn by_position(modules: &[ModuleSnapshot]) -> Vec<&ModuleSnapshot> {
    let mut ordered: Vec<&ModuleSnapshot> = modules.iter().collect();
    ordered.sort_by_key(|m| m.module.position);
    ordered
}

fn substep_denominator(substep_count: usize) -> usize {
    substep_count.max(1)
}

fn completion_ratio(highest_substep: i32, substep_count: usize) -> Decimal {
    Decimal::from(i64::from(highest_substep) + 1) / Decimal::from(substep_denominator(substep_count))
}

fn quiz_ratio(score: &QuizScore) -> Decimal {
    if score.total_questions <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(score.score) / Decimal::from(score.total_questions)
}

fn mean_quiz_ratio(quiz_id: Uuid, quiz_scores: &[QuizScore]) -> Decimal {
    let ratios: Vec<Decimal> = quiz_scores
        .iter()
        .filter(|s| s.quiz_id == quiz_id)
        .map(quiz_ratio)
        .collect();
    if ratios.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = ratios.iter().copied().sum();
    sum / Decimal::from(ratios.len())
}

fn percentage(ratio: Decimal) -> f64 {
    round2(ratio * Decimal::ONE_HUNDRED)
}

pub(crate) fn round2(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;
    use std::collections::BTreeMap;

    fn module(position: i32, title: &str) -> Module {
        Module {
            id: Uuid::new_v4(),
            workshop_id: Uuid::nil(),
            title: title.to_string(),
            description: None,
            position,
        }
    }

    fn snapshot(position: i32, substep_count: usize, with_quiz: bool) -> ModuleSnapshot {
        let module = module(position, &format!("Module {}", position));
        let quiz = with_quiz.then(|| {
            let quiz = Quiz {
                id: Uuid::new_v4(),
                module_id: module.id,
                title: "Check".into(),
            };
            let questions = vec![question(quiz.id, "What is 2+2?"), question(quiz.id, "Capital of France?")];
            QuizSnapshot { quiz, questions }
        });
        ModuleSnapshot {
            module,
            substep_count,
            quiz,
        }
    }

    fn question(quiz_id: Uuid, text: &str) -> Question {
        let mut options = BTreeMap::new();
        options.insert("A".to_string(), "yes".to_string());
        options.insert("B".to_string(), "no".to_string());
        Question {
            id: Uuid::new_v4(),
            quiz_id,
            text: text.into(),
            options: Json(options),
            correct_answer: "A".into(),
            created_at: Utc::now(),
        }
    }

    fn progress(user_id: Uuid, module_id: Uuid, highest_substep: i32, time_spent: i64) -> StudentProgress {
        StudentProgress {
            id: Uuid::new_v4(),
            user_id,
            module_id,
            highest_substep,
            time_spent,
            updated_at: Utc::now(),
        }
    }

    fn score(quiz_id: Uuid, score: i32, total_questions: i32) -> QuizScore {
        QuizScore {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            quiz_id,
            score,
            total_questions,
            completed_at: Utc::now(),
        }
    }

    fn feedback(workshop_id: Uuid, stars: Option<i32>) -> Feedback {
        Feedback {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            workshop_id,
            stars,
            comments: None,
            created_at: Utc::now(),
        }
    }

    fn quiz_id(s: &ModuleSnapshot) -> Uuid {
        s.quiz.as_ref().unwrap().quiz.id
    }

    #[test]
    fn module_without_progress_has_zero_completion() {
        let m = snapshot(1, 3, false);
        let stats = StatsAggregator::module_stats(&m, &[], &[]);
        assert_eq!(stats.enrolled_students, 0);
        assert_eq!(stats.avg_completion_percentage, 0.0);
    }

    #[test]
    fn quiz_score_is_null_without_quiz_and_zero_without_submissions() {
        let no_quiz = snapshot(1, 2, false);
        assert_eq!(
            StatsAggregator::module_stats(&no_quiz, &[], &[]).avg_quiz_score_percentage,
            None
        );

        let with_quiz = snapshot(2, 2, true);
        assert_eq!(
            StatsAggregator::module_stats(&with_quiz, &[], &[]).avg_quiz_score_percentage,
            Some(0.0)
        );
    }

    #[test]
    fn half_way_through_four_substeps_is_fifty_percent() {
        let m = snapshot(1, 4, false);
        let records = vec![progress(Uuid::new_v4(), m.module.id, 1, 0)];
        let stats = StatsAggregator::module_stats(&m, &records, &[]);
        assert_eq!(stats.enrolled_students, 1);
        assert_eq!(stats.avg_completion_percentage, 50.0);
    }

    #[test]
    fn module_without_substeps_uses_denominator_one() {
        let m = snapshot(1, 0, false);
        let records = vec![progress(Uuid::new_v4(), m.module.id, -1, 0)];
        assert_eq!(
            StatsAggregator::module_stats(&m, &records, &[]).avg_completion_percentage,
            0.0
        );
    }

    #[test]
    fn quiz_average_is_mean_of_submission_ratios() {
        let m = snapshot(1, 1, true);
        let q = quiz_id(&m);
        let scores = vec![score(q, 3, 5), score(q, 5, 5)];
        assert_eq!(
            StatsAggregator::module_stats(&m, &[], &scores).avg_quiz_score_percentage,
            Some(80.0)
        );
    }

    #[test]
    fn quiz_with_zero_questions_counts_as_zero_ratio() {
        let m = snapshot(1, 1, true);
        let q = quiz_id(&m);
        let scores = vec![score(q, 0, 0), score(q, 4, 4)];
        assert_eq!(
            StatsAggregator::module_stats(&m, &[], &scores).avg_quiz_score_percentage,
            Some(50.0)
        );
    }

    #[test]
    fn records_of_other_modules_and_quizzes_are_ignored() {
        let m = snapshot(1, 2, true);
        let other = snapshot(2, 2, true);
        let records = vec![
            progress(Uuid::new_v4(), m.module.id, 1, 0),
            progress(Uuid::new_v4(), other.module.id, 0, 0),
        ];
        let scores = vec![score(quiz_id(&m), 1, 1), score(quiz_id(&other), 0, 1)];
        let stats = StatsAggregator::module_stats(&m, &records, &scores);
        assert_eq!(stats.enrolled_students, 1);
        assert_eq!(stats.avg_completion_percentage, 100.0);
        assert_eq!(stats.avg_quiz_score_percentage, Some(100.0));
    }

    #[test]
    fn module_stats_do_not_depend_on_record_order() {
        let m = snapshot(1, 3, true);
        let q = quiz_id(&m);
        let mut records = vec![
            progress(Uuid::new_v4(), m.module.id, 0, 5),
            progress(Uuid::new_v4(), m.module.id, 2, 7),
            progress(Uuid::new_v4(), m.module.id, 1, 9),
        ];
        let mut scores = vec![score(q, 1, 3), score(q, 2, 3), score(q, 3, 7)];

        let forward = StatsAggregator::module_stats(&m, &records, &scores);
        records.reverse();
        scores.rotate_left(1);
        let shuffled = StatsAggregator::module_stats(&m, &records, &scores);

        assert_eq!(forward, shuffled);
        assert_eq!(forward.avg_completion_percentage, 66.67);
    }

    #[test]
    fn rounding_is_half_up_at_two_decimals() {
        // 1 / 160 = 0.625% exactly: half-up gives 0.63 where half-even would give 0.62.
        let m = snapshot(1, 1, true);
        let scores = vec![score(quiz_id(&m), 1, 160)];
        assert_eq!(
            StatsAggregator::module_stats(&m, &[], &scores).avg_quiz_score_percentage,
            Some(0.63)
        );

        assert_eq!(round2(Decimal::new(125, 3)), 0.13);
        assert_eq!(round2(Decimal::new(135, 3)), 0.14);
        assert_eq!(round2(Decimal::new(-125, 3)), -0.13);
        assert_eq!(round2(Decimal::new(1234, 3)), 1.23);
    }

    #[test]
    fn average_time_divides_by_user_module_pairs() {
        let m1 = snapshot(1, 2, false);
        let m2 = snapshot(2, 2, false);
        let user = Uuid::new_v4();
        let records = vec![
            progress(user, m1.module.id, 1, 10),
            progress(user, m2.module.id, 0, 20),
        ];
        let stats = StatsAggregator::workshop_stats(
            Uuid::new_v4(),
            &[m1, m2],
            &records,
            &[],
            &[],
        );
        assert_eq!(stats.average_time_spent, 15.0);
        // (1.0 + 0.5) / 2 pairs
        assert_eq!(stats.average_completion_percentage, 75.0);
    }

    #[test]
    fn average_time_uses_half_up_rounding() {
        let m = snapshot(1, 1, false);
        let records: Vec<StudentProgress> = (0..8)
            .map(|i| progress(Uuid::new_v4(), m.module.id, 0, if i == 0 { 1 } else { 0 }))
            .collect();
        let stats = StatsAggregator::workshop_stats(Uuid::new_v4(), &[m], &records, &[], &[]);
        // 1 second over 8 pairs = 0.125
        assert_eq!(stats.average_time_spent, 0.13);
    }

    #[test]
    fn empty_workshop_yields_zeroes_and_null_rating() {
        let stats = StatsAggregator::workshop_stats(Uuid::new_v4(), &[], &[], &[], &[]);
        assert_eq!(stats.average_completion_percentage, 0.0);
        assert_eq!(stats.average_time_spent, 0.0);
        assert_eq!(stats.average_rating, None);
        assert_eq!(stats.total_feedback, 0);
        assert!(stats.modules.is_empty());
    }

    #[test]
    fn rating_ignores_missing_stars_but_counts_all_feedback() {
        let workshop_id = Uuid::new_v4();
        let fb = vec![
            feedback(workshop_id, Some(4)),
            feedback(workshop_id, Some(5)),
            feedback(workshop_id, None),
        ];
        let stats = StatsAggregator::workshop_stats(workshop_id, &[], &[], &[], &fb);
        assert_eq!(stats.average_rating, Some(4.5));
        assert_eq!(stats.total_feedback, 3);
    }

    #[test]
    fn rating_is_null_when_no_stars_given() {
        let workshop_id = Uuid::new_v4();
        let fb = vec![feedback(workshop_id, None), feedback(workshop_id, None)];
        let stats = StatsAggregator::workshop_stats(workshop_id, &[], &[], &[], &fb);
        assert_eq!(stats.average_rating, None);
        assert_eq!(stats.total_feedback, 2);
    }

    #[test]
    fn rating_is_rounded() {
        let workshop_id = Uuid::new_v4();
        let fb = vec![
            feedback(workshop_id, Some(4)),
            feedback(workshop_id, Some(4)),
            feedback(workshop_id, Some(5)),
        ];
        let stats = StatsAggregator::workshop_stats(workshop_id, &[], &[], &[], &fb);
        assert_eq!(stats.average_rating, Some(4.33));
    }

    #[test]
    fn module_entries_follow_position_order() {
        let late = snapshot(10, 1, false);
        let early = snapshot(2, 1, true);
        let middle = snapshot(5, 1, false);
        let ids = [early.module.id, middle.module.id, late.module.id];
        let stats = StatsAggregator::workshop_stats(
            Uuid::new_v4(),
            &[late, early, middle],
            &[],
            &[],
            &[],
        );
        let got: Vec<Uuid> = stats.modules.iter().map(|m| m.module_id).collect();
        assert_eq!(got, ids);
        assert_eq!(stats.modules[0].avg_quiz_score_percentage, Some(0.0));
        assert_eq!(stats.modules[1].avg_quiz_score_percentage, None);
    }

    #[test]
    fn progress_outside_workshop_modules_is_skipped() {
        let m = snapshot(1, 2, false);
        let records = vec![
            progress(Uuid::new_v4(), m.module.id, 1, 40),
            progress(Uuid::new_v4(), Uuid::new_v4(), 0, 1000),
        ];
        let stats = StatsAggregator::workshop_stats(Uuid::new_v4(), &[m], &records, &[], &[]);
        assert_eq!(stats.average_time_spent, 40.0);
        assert_eq!(stats.average_completion_percentage, 100.0);
    }

    #[test]
    fn analytics_lists_only_modules_with_quizzes() {
        let plain = snapshot(1, 1, false);
        let quizzed = snapshot(2, 1, true);
        let q = quiz_id(&quizzed);
        let scores = vec![score(q, 1, 2), score(q, 2, 2)];
        let analytics = StatsAggregator::analytics(&[plain, quizzed.clone()], &scores);

        assert_eq!(analytics.module_quiz_scores.len(), 1);
        assert_eq!(analytics.module_quiz_scores[0].module_id, quizzed.module.id);
        assert_eq!(analytics.module_quiz_scores[0].avg_score_percentage, 75.0);

        assert_eq!(analytics.question_failure_rates.len(), 1);
        let questions = &analytics.question_failure_rates[0].questions;
        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.failure_rate_percentage.is_none()));
        assert_eq!(questions[0].question_text, "What is 2+2?");
    }

    #[test]
    fn analytics_reports_zero_for_unattempted_quiz() {
        let quizzed = snapshot(1, 1, true);
        let analytics = StatsAggregator::analytics(&[quizzed], &[]);
        assert_eq!(analytics.module_quiz_scores[0].avg_score_percentage, 0.0);
    }

    #[test]
    fn stats_serialize_null_for_missing_values() {
        let m = snapshot(1, 1, false);
        let stats = StatsAggregator::workshop_stats(Uuid::nil(), &[m], &[], &[], &[]);
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json["average_rating"].is_null());
        assert!(json["modules"][0]["avg_quiz_score_percentage"].is_null());
        assert_eq!(json["modules"][0]["avg_completion_percentage"], 0.0);
    }
}
