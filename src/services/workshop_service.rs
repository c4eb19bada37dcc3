use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dto::quiz_dto::QuizOut;
use crate::dto::workshop_dto::{
    CreateModulePayload, CreateSubstepPayload, CreateWorkshopPayload, ModuleOut,
    UpdateModulePayload, UpdateSubstepPayload, UpdateWorkshopPayload, WorkshopDetail,
};
use crate::error::{Error, Result};
use crate::models::quiz::{Question, Quiz};
use crate::models::workshop::{Module, Substep, Workshop};

const WORKSHOP_COLUMNS: &str =
    "id, title, description, start_date, end_date, created_by, created_at, updated_at";

/// Every row hanging off one workshop, loaded with four queries.
#[derive(Debug, Default)]
pub struct WorkshopTree {
    /// Ordered by position.
    pub modules: Vec<Module>,
    /// Ordered by position within each module.
    pub substeps: Vec<Substep>,
    pub quizzes: Vec<Quiz>,
    /// Ordered by creation time within each quiz.
    pub questions: Vec<Question>,
}

#[derive(Clone)]
pub struct WorkshopService {
    pool: PgPool,
}

impl WorkshopService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Workshop>> {
        let query = format!(
            "SELECT {} FROM workshops ORDER BY start_date ASC NULLS LAST, created_at ASC",
            WORKSHOP_COLUMNS
        );
        let workshops = sqlx::query_as::<_, Workshop>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(workshops)
    }

    pub async fn get(&self, id: Uuid) -> Result<Workshop> {
        let query = format!("SELECT {} FROM workshops WHERE id = $1", WORKSHOP_COLUMNS);
        sqlx::query_as::<_, Workshop>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Workshop not found".into()))
    }

    pub async fn load_tree(&self, workshop_id: Uuid) -> Result<WorkshopTree> {
        let modules = sqlx::query_as::<_, Module>(
            r#"
            SELECT id, workshop_id, title, description, position
            FROM modules
            WHERE workshop_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(workshop_id)
        .fetch_all(&self.pool)
        .await?;

        if modules.is_empty() {
            return Ok(WorkshopTree::default());
        }
        let module_ids: Vec<Uuid> = modules.iter().map(|m| m.id).collect();

        let substeps = sqlx::query_as::<_, Substep>(
            r#"
            SELECT id, module_id, title, content, position
            FROM substeps
            WHERE module_id = ANY($1)
            ORDER BY module_id, position ASC
            "#,
        )
        .bind(&module_ids)
        .fetch_all(&self.pool)
        .await?;

        let quizzes = sqlx::query_as::<_, Quiz>(
            "SELECT id, module_id, title FROM quizzes WHERE module_id = ANY($1)",
        )
        .bind(&module_ids)
        .fetch_all(&self.pool)
        .await?;

        let quiz_ids: Vec<Uuid> = quizzes.iter().map(|q| q.id).collect();
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, quiz_id, text, options, correct_answer, created_at
            FROM questions
            WHERE quiz_id = ANY($1)
            ORDER BY quiz_id, created_at ASC
            "#,
        )
        .bind(&quiz_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(WorkshopTree {
            modules,
            substeps,
            quizzes,
            questions,
        })
    }

    pub async fn detail(&self, id: Uuid) -> Result<WorkshopDetail> {
        let workshop = self.get(id).await?;
        let tree = self.load_tree(id).await?;

        let mut substeps: HashMap<Uuid, Vec<Substep>> = HashMap::new();
        for s in tree.substeps {
            substeps.entry(s.module_id).or_default().push(s);
        }
        let mut questions: HashMap<Uuid, Vec<Question>> = HashMap::new();
        for q in tree.questions {
            questions.entry(q.quiz_id).or_default().push(q);
        }
        let mut quizzes: HashMap<Uuid, QuizOut> = tree
            .quizzes
            .into_iter()
            .map(|quiz| {
                let qs = questions.remove(&quiz.id).unwrap_or_default();
                (quiz.module_id, QuizOut::new(quiz, qs))
            })
            .collect();

        let modules = tree
            .modules
            .into_iter()
            .map(|m| {
                let steps = substeps.remove(&m.id).unwrap_or_default();
                let quiz = quizzes.remove(&m.id);
                ModuleOut::new(m, steps, quiz)
            })
            .collect();

        Ok(WorkshopDetail {
            id: workshop.id,
            title: workshop.title,
            description: workshop.description,
            start_date: workshop.start_date,
            end_date: workshop.end_date,
            created_by: workshop.created_by,
            modules,
        })
    }

    /// Workshop, modules and substeps are written in one transaction.
    #[instrument(skip(self, payload), fields(title = %payload.title))]
    pub async fn create(&self, payload: CreateWorkshopPayload, created_by: Uuid) -> Result<Workshop> {
        let mut tx = self.pool.begin().await?;
        let query = format!(
            r#"
            INSERT INTO workshops (title, description, start_date, end_date, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            WORKSHOP_COLUMNS
        );
        let workshop = sqlx::query_as::<_, Workshop>(&query)
            .bind(&payload.title)
            .bind(payload.description.as_deref())
            .bind(payload.start_date)
            .bind(payload.end_date)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        for module in payload.modules.unwrap_or_default() {
            insert_module(&mut tx, workshop.id, module).await?;
        }
        tx.commit().await?;

        info!(workshop_id = %workshop.id, "workshop created");
        Ok(workshop)
    }

    #[instrument(skip(self, payload))]
    pub async fn update(&self, id: Uuid, payload: UpdateWorkshopPayload) -> Result<Workshop> {
        let current = self.get(id).await?;
        let start_date = payload.start_date.or(current.start_date);
        let end_date = payload.end_date.or(current.end_date);
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                return Err(Error::BadRequest("end_date must not be before start_date".into()));
            }
        }

        let query = format!(
            r#"
            UPDATE workshops
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                start_date = $4,
                end_date = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            WORKSHOP_COLUMNS
        );
        let workshop = sqlx::query_as::<_, Workshop>(&query)
            .bind(id)
            .bind(payload.title.as_deref())
            .bind(payload.description.as_deref())
            .bind(start_date)
            .bind(end_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(workshop)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM workshops WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Workshop not found".into()));
        }
        info!(workshop_id = %id, "workshop deleted");
        Ok(())
    }

    #[instrument(skip(self, payload))]
    pub async fn add_module(&self, workshop_id: Uuid, payload: CreateModulePayload) -> Result<Module> {
        self.get(workshop_id).await?;
        let mut tx = self.pool.begin().await?;
        let module = insert_module(&mut tx, workshop_id, payload).await?;
        tx.commit().await?;
        Ok(module)
    }

    pub async fn get_module(&self, id: Uuid) -> Result<Module> {
        let mut conn = self.pool.acquire().await?;
        fetch_module(&mut conn, id).await
    }

    #[instrument(skip(self, payload))]
    pub async fn update_module(&self, id: Uuid, payload: UpdateModulePayload) -> Result<Module> {
        sqlx::query_as::<_, Module>(
            r#"
            UPDATE modules
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                position = COALESCE($4, position)
            WHERE id = $1
            RETURNING id, workshop_id, title, description, position
            "#,
        )
        .bind(id)
        .bind(payload.title.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.position)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Module not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn delete_module(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM modules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Module not found".into()));
        }
        Ok(())
    }

    #[instrument(skip(self, payload))]
    pub async fn add_substep(&self, module_id: Uuid, payload: CreateSubstepPayload) -> Result<Substep> {
        let mut conn = self.pool.acquire().await?;
        fetch_module(&mut conn, module_id).await?;
        insert_substep(&mut conn, module_id, payload).await
    }

    #[instrument(skip(self, payload))]
    pub async fn update_substep(&self, id: Uuid, payload: UpdateSubstepPayload) -> Result<Substep> {
        sqlx::query_as::<_, Substep>(
            r#"
            UPDATE substeps
            SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                position = COALESCE($4, position)
            WHERE id = $1
            RETURNING id, module_id, title, content, position
            "#,
        )
        .bind(id)
        .bind(payload.title.as_deref())
        .bind(payload.content.as_deref())
        .bind(payload.position)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Substep not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn delete_substep(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM substeps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Substep not found".into()));
        }
        Ok(())
    }
}

pub(crate) async fn fetch_module(conn: &mut PgConnection, id: Uuid) -> Result<Module> {
    sqlx::query_as::<_, Module>(
        "SELECT id, workshop_id, title, description, position FROM modules WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| Error::NotFound("Module not found".into()))
}

async fn insert_module(
    conn: &mut PgConnection,
    workshop_id: Uuid,
    payload: CreateModulePayload,
) -> Result<Module> {
    let module = sqlx::query_as::<_, Module>(
        r#"
        INSERT INTO modules (workshop_id, title, description, position)
        VALUES ($1, $2, $3, $4)
        RETURNING id, workshop_id, title, description, position
        "#,
    )
    .bind(workshop_id)
    .bind(&payload.title)
    .bind(payload.description.as_deref())
    .bind(payload.position)
    .fetch_one(&mut *conn)
    .await?;

    for substep in payload.substeps.unwrap_or_default() {
        insert_substep(conn, module.id, substep).await?;
    }
    Ok(module)
}

async fn insert_substep(
    conn: &mut PgConnection,
    module_id: Uuid,
    payload: CreateSubstepPayload,
) -> Result<Substep> {
    let substep = sqlx::query_as::<_, Substep>(
        r#"
        INSERT INTO substeps (module_id, title, content, position)
        VALUES ($1, $2, $3, $4)
        RETURNING id, module_id, title, content, position
        "#,
    )
    .bind(module_id)
    .bind(&payload.title)
    .bind(&payload.content)
    .bind(payload.position)
    .fetch_one(&mut *conn)
    .await?;
    Ok(substep)
}
