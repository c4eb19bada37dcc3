use std::collections::HashMap;

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::dto::stats_dto::{WorkshopAnalytics, WorkshopStats};
use crate::error::Result;
use crate::models::feedback::Feedback;
use crate::models::progress::StudentProgress;
use crate::models::quiz::{Question, QuizScore};
use crate::services::stats_aggregator::{ModuleSnapshot, QuizSnapshot, StatsAggregator};
use crate::services::workshop_service::{WorkshopService, WorkshopTree};

/// Loads the rows a workshop report needs and hands them to [`StatsAggregator`].
#[derive(Clone)]
pub struct StatsService {
    pool: PgPool,
    workshops: WorkshopService,
}

struct Loaded {
    modules: Vec<ModuleSnapshot>,
    progress: Vec<StudentProgress>,
    quiz_scores: Vec<QuizScore>,
}

impl StatsService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            workshops: WorkshopService::new(pool.clone()),
            pool,
        }
    }

    #[instrument(skip(self))]
    pub async fn workshop_stats(&self, workshop_id: Uuid) -> Result<WorkshopStats> {
        let loaded = self.load(workshop_id).await?;
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT id, user_id, workshop_id, stars, comments, created_at
            FROM feedback
            WHERE workshop_id = $1
            "#,
        )
        .bind(workshop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(StatsAggregator::workshop_stats(
            workshop_id,
            &loaded.modules,
            &loaded.progress,
            &loaded.quiz_scores,
            &feedback,
        ))
    }

    #[instrument(skip(self))]
    pub async fn analytics(&self, workshop_id: Uuid) -> Result<WorkshopAnalytics> {
        let loaded = self.load(workshop_id).await?;
        Ok(StatsAggregator::analytics(&loaded.modules, &loaded.quiz_scores))
    }

    async fn load(&self, workshop_id: Uuid) -> Result<Loaded> {
        self.workshops.get(workshop_id).await?;
        let tree = self.workshops.load_tree(workshop_id).await?;

        let module_ids: Vec<Uuid> = tree.modules.iter().map(|m| m.id).collect();
        let quiz_ids: Vec<Uuid> = tree.quizzes.iter().map(|q| q.id).collect();

        let progress = sqlx::query_as::<_, StudentProgress>(
            r#"
            SELECT id, user_id, module_id, highest_substep, time_spent, updated_at
            FROM student_progress
            WHERE module_id = ANY($1)
            "#,
        )
        .bind(&module_ids)
        .fetch_all(&self.pool)
        .await?;

        let quiz_scores = sqlx::query_as::<_, QuizScore>(
            r#"
            SELECT id, user_id, quiz_id, score, total_questions, completed_at
            FROM student_quiz_scores
            WHERE quiz_id = ANY($1)
            "#,
        )
        .bind(&quiz_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(Loaded {
            modules: snapshots(tree),
            progress,
            quiz_scores,
        })
    }
}

fn snapshots(tree: WorkshopTree) -> Vec<ModuleSnapshot> {
    let mut substep_counts: HashMap<Uuid, usize> = HashMap::new();
    for s in &tree.substeps {
        *substep_counts.entry(s.module_id).or_default() += 1;
    }
    let mut questions: HashMap<Uuid, Vec<Question>> = HashMap::new();
    for q in tree.questions {
        questions.entry(q.quiz_id).or_default().push(q);
    }
    let mut quizzes: HashMap<Uuid, QuizSnapshot> = tree
        .quizzes
        .into_iter()
        .map(|quiz| {
            let questions = questions.remove(&quiz.id).unwrap_or_default();
            (quiz.module_id, QuizSnapshot { quiz, questions })
        })
        .collect();

    tree.modules
        .into_iter()
        .map(|module| ModuleSnapshot {
            substep_count: substep_counts.get(&module.id).copied().unwrap_or(0),
            quiz: quizzes.remove(&module.id),
            module,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::Quiz;
    use crate::models::workshop::{Module, Substep};

    fn module(position: i32) -> Module {
        Module {
            id: Uuid::new_v4(),
            workshop_id: Uuid::nil(),
            title: format!("M{}", position),
            description: None,
            position,
        }
    }

    fn substep(module_id: Uuid, position: i32) -> Substep {
        Substep {
            id: Uuid::new_v4(),
            module_id,
            title: "step".into(),
            content: String::new(),
            position,
        }
    }

    #[test]
    fn snapshots_count_substeps_and_attach_quizzes() {
        let first = module(1);
        let second = module(2);
        let quiz = Quiz {
            id: Uuid::new_v4(),
            module_id: second.id,
            title: "Check".into(),
        };
        let tree = WorkshopTree {
            substeps: vec![substep(first.id, 0), substep(first.id, 1), substep(second.id, 0)],
            quizzes: vec![quiz.clone()],
            questions: vec![],
            modules: vec![first.clone(), second.clone()],
        };

        let snaps = snapshots(tree);
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].module.id, first.id);
        assert_eq!(snaps[0].substep_count, 2);
        assert!(snaps[0].quiz.is_none());
        assert_eq!(snaps[1].substep_count, 1);
        assert_eq!(snaps[1].quiz.as_ref().map(|q| q.quiz.id), Some(quiz.id));
    }
}
