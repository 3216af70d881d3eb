//! Postgres-backed metadata repository.
//!
//! ## Schema
//!
//! One table per entity kind, each with a `BIGSERIAL` id, a foreign key to the
//! parent table and a `UNIQUE (parent_id, name)` constraint. Structured model
//! fields (wrapper, requirements, dataset types, params, artifact reference)
//! are stored as `JSONB`. `ensure_schema()` creates everything idempotently.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | EboniteError |
//! |------------|----------------------|--------------|
//! | Database (unique violation) | `23505` | `Existing*` for the written record |
//! | Database (foreign key violation) | `23503` | `NonExisting*` parent on write, `*With*` on delete |
//! | anything else | - | `Storage` |
//!
//! Existence and child checks are also performed explicitly before writes so
//! the common cases produce precise errors; the constraint mapping covers
//! races between concurrent writers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use ebonite_core::{
    EboniteError, EboniteResult, Entity, Image, ImageId, InstanceId, MetadataRepository, Model,
    ModelId, Project, ProjectId, RuntimeInstance, Task, TaskId,
};

use super::{Record, require_name, require_parent};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        author TEXT NOT NULL,
        creation_date TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        project_id BIGINT NOT NULL REFERENCES projects(id),
        author TEXT NOT NULL,
        creation_date TIMESTAMPTZ NOT NULL,
        UNIQUE (project_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS models (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        task_id BIGINT NOT NULL REFERENCES tasks(id),
        author TEXT NOT NULL,
        creation_date TIMESTAMPTZ NOT NULL,
        description TEXT,
        params JSONB NOT NULL,
        wrapper JSONB NOT NULL,
        requirements JSONB NOT NULL,
        input_meta JSONB NOT NULL,
        output_meta JSONB,
        artifact JSONB,
        UNIQUE (task_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS images (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        model_id BIGINT NOT NULL REFERENCES models(id),
        author TEXT NOT NULL,
        creation_date TIMESTAMPTZ NOT NULL,
        params JSONB NOT NULL,
        UNIQUE (model_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS instances (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        image_id BIGINT NOT NULL REFERENCES images(id),
        author TEXT NOT NULL,
        creation_date TIMESTAMPTZ NOT NULL,
        params JSONB NOT NULL,
        UNIQUE (image_id, name)
    )
    "#,
];

/// Postgres-backed metadata repository.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and handles
/// connection management across tasks.
#[derive(Debug, Clone)]
pub struct PostgresMetadataRepository {
    pool: Arc<PgPool>,
}

impl PostgresMetadataRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url` and make sure the schema exists.
    pub async fn connect(database_url: &str) -> EboniteResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let repo = Self::new(pool);
        repo.ensure_schema().await?;
        Ok(repo)
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> EboniteResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn exists(&self, table: &'static str, id: i64) -> EboniteResult<bool> {
        sqlx::query_scalar::<_, bool>(&format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)"))
            .bind(id)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("exists", e))
    }

    async fn count_children(&self, table: &'static str, fk: &'static str, parent: i64) -> EboniteResult<usize> {
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table} WHERE {fk} = $1"))
            .bind(parent)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_children", e))?;
        Ok(count as usize)
    }

    /// Delete a leaf record after verifying it exists and has no children.
    async fn delete_checked<E: Record>(
        &self,
        record: &E,
        table: &'static str,
        children: Option<(&'static str, &'static str)>,
        with_children: impl Fn(String, usize) -> EboniteError,
    ) -> EboniteResult<()> {
        let id = record.bound_id()?;
        let raw: i64 = id.into();
        if !self.exists(table, raw).await? {
            return Err(E::non_existing(id));
        }
        if let Some((child_table, fk)) = children {
            let count = self.count_children(child_table, fk, raw).await?;
            if count > 0 {
                return Err(with_children(record.name().to_string(), count));
            }
        }

        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(raw)
            .execute(&*self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    with_children(record.name().to_string(), 1)
                } else {
                    map_sqlx_error("delete", e)
                }
            });
        match result {
            Ok(done) if done.rows_affected() == 0 => Err(E::non_existing(id)),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Verify an update target exists and its new parent exists.
    async fn check_update<E: Record>(
        &self,
        record: &E,
        table: &'static str,
        parent_table: &'static str,
        parent_missing: impl FnOnce(E::ParentId) -> EboniteError,
    ) -> EboniteResult<(i64, i64)>
    where
        E::ParentId: Into<i64>,
    {
        require_name(record)?;
        let parent = require_parent(record)?;
        let id = record.bound_id()?;
        let raw: i64 = id.into();
        if !self.exists(table, raw).await? {
            return Err(E::non_existing(id));
        }
        let parent_raw: i64 = parent.into();
        if !self.exists(parent_table, parent_raw).await? {
            return Err(parent_missing(parent));
        }
        Ok((raw, parent_raw))
    }

    /// Verify a new record is unbound and its parent exists.
    async fn check_create<E: Record>(
        &self,
        record: &E,
        parent_table: &'static str,
        parent_missing: impl FnOnce(E::ParentId) -> EboniteError,
    ) -> EboniteResult<i64>
    where
        E::ParentId: Into<i64>,
    {
        require_name(record)?;
        if record.id().is_some() {
            return Err(E::existing(record.name()));
        }
        let parent = require_parent(record)?;
        let parent_raw: i64 = parent.into();
        if !self.exists(parent_table, parent_raw).await? {
            return Err(parent_missing(parent));
        }
        Ok(parent_raw)
    }
}

#[async_trait]
impl MetadataRepository for PostgresMetadataRepository {
    async fn get_projects(&self) -> EboniteResult<Vec<Project>> {
        let rows = sqlx::query("SELECT id, name, author, creation_date FROM projects ORDER BY id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_projects", e))?;
        rows.iter().map(project_from_row).collect()
    }

    async fn get_project_by_id(&self, id: ProjectId) -> EboniteResult<Option<Project>> {
        let row = sqlx::query("SELECT id, name, author, creation_date FROM projects WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_project_by_id", e))?;
        row.as_ref().map(project_from_row).transpose()
    }

    async fn get_project_by_name(&self, name: &str) -> EboniteResult<Option<Project>> {
        let row = sqlx::query("SELECT id, name, author, creation_date FROM projects WHERE name = $1")
            .bind(name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_project_by_name", e))?;
        row.as_ref().map(project_from_row).transpose()
    }

    #[instrument(skip(self, project), fields(name = %project.name), err)]
    async fn create_project(&self, mut project: Project) -> EboniteResult<Project> {
        require_name(&project)?;
        if project.id.is_some() {
            return Err(EboniteError::ExistingProject(project.name));
        }
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO projects (name, author, creation_date) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&project.name)
        .bind(&project.author)
        .bind(project.creation_date)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| write_error::<Project>("create_project", &project.name, e, || None))?;
        project.id = Some(ProjectId::new(id));
        Ok(project)
    }

    #[instrument(skip(self, project), fields(name = %project.name), err)]
    async fn update_project(&self, project: Project) -> EboniteResult<Project> {
        require_name(&project)?;
        let id = project.bound_id()?;
        let row = sqlx::query(
            "UPDATE projects SET name = $2 WHERE id = $1 RETURNING id, name, author, creation_date",
        )
        .bind(id.value())
        .bind(&project.name)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| write_error::<Project>("update_project", &project.name, e, || None))?;
        match row {
            Some(row) => project_from_row(&row),
            None => Err(EboniteError::NonExistingProject(id)),
        }
    }

    async fn delete_project(&self, project: &Project) -> EboniteResult<()> {
        self.delete_checked(project, "projects", Some(("tasks", "project_id")), |name, count| {
            EboniteError::ProjectWithTasks { name, count }
        })
        .await
    }

    async fn get_tasks(&self, project_id: ProjectId) -> EboniteResult<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT id, name, project_id, author, creation_date FROM tasks WHERE project_id = $1 ORDER BY id",
        )
        .bind(project_id.value())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_tasks", e))?;
        rows.iter().map(task_from_row).collect()
    }

    async fn get_task_by_id(&self, id: TaskId) -> EboniteResult<Option<Task>> {
        let row = sqlx::query("SELECT id, name, project_id, author, creation_date FROM tasks WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_task_by_id", e))?;
        row.as_ref().map(task_from_row).transpose()
    }

    async fn get_task_by_name(&self, project_id: ProjectId, name: &str) -> EboniteResult<Option<Task>> {
        let row = sqlx::query(
            "SELECT id, name, project_id, author, creation_date FROM tasks WHERE project_id = $1 AND name = $2",
        )
        .bind(project_id.value())
        .bind(name)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_task_by_name", e))?;
        row.as_ref().map(task_from_row).transpose()
    }

    #[instrument(skip(self, task), fields(name = %task.name), err)]
    async fn create_task(&self, mut task: Task) -> EboniteResult<Task> {
        let project_id = self
            .check_create(&task, "projects", EboniteError::NonExistingProject)
            .await?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO tasks (name, project_id, author, creation_date) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&task.name)
        .bind(project_id)
        .bind(&task.author)
        .bind(task.creation_date)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            write_error::<Task>("create_task", &task.name, e, || {
                Some(EboniteError::NonExistingProject(ProjectId::new(project_id)))
            })
        })?;
        task.id = Some(TaskId::new(id));
        Ok(task)
    }

    #[instrument(skip(self, task), fields(name = %task.name), err)]
    async fn update_task(&self, task: Task) -> EboniteResult<Task> {
        let (id, project_id) = self
            .check_update(&task, "tasks", "projects", EboniteError::NonExistingProject)
            .await?;
        let row = sqlx::query(
            r#"
            UPDATE tasks SET name = $2, project_id = $3 WHERE id = $1
            RETURNING id, name, project_id, author, creation_date
            "#,
        )
        .bind(id)
        .bind(&task.name)
        .bind(project_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| {
            write_error::<Task>("update_task", &task.name, e, || {
                Some(EboniteError::NonExistingProject(ProjectId::new(project_id)))
            })
        })?;
        match row {
            Some(row) => task_from_row(&row),
            None => Err(EboniteError::NonExistingTask(TaskId::new(id))),
        }
    }

    async fn delete_task(&self, task: &Task) -> EboniteResult<()> {
        self.delete_checked(task, "tasks", Some(("models", "task_id")), |name, count| {
            EboniteError::TaskWithModels { name, count }
        })
        .await
    }

    async fn get_models(&self, task_id: TaskId) -> EboniteResult<Vec<Model>> {
        let rows = sqlx::query(&format!("{MODEL_COLUMNS} WHERE task_id = $1 ORDER BY id"))
            .bind(task_id.value())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_models", e))?;
        rows.iter().map(model_from_row).collect()
    }

    async fn get_model_by_id(&self, id: ModelId) -> EboniteResult<Option<Model>> {
        let row = sqlx::query(&format!("{MODEL_COLUMNS} WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_model_by_id", e))?;
        row.as_ref().map(model_from_row).transpose()
    }

    async fn get_model_by_name(&self, task_id: TaskId, name: &str) -> EboniteResult<Option<Model>> {
        let row = sqlx::query(&format!("{MODEL_COLUMNS} WHERE task_id = $1 AND name = $2"))
            .bind(task_id.value())
            .bind(name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_model_by_name", e))?;
        row.as_ref().map(model_from_row).transpose()
    }

    #[instrument(skip(self, model), fields(name = %model.name), err)]
    async fn create_model(&self, mut model: Model) -> EboniteResult<Model> {
        let task_id = self
            .check_create(&model, "tasks", EboniteError::NonExistingTask)
            .await?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO models (
                name, task_id, author, creation_date, description,
                params, wrapper, requirements, input_meta, output_meta, artifact
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(&model.name)
        .bind(task_id)
        .bind(&model.author)
        .bind(model.creation_date)
        .bind(&model.description)
        .bind(Json(&model.params))
        .bind(Json(&model.wrapper))
        .bind(Json(&model.requirements))
        .bind(Json(&model.input_meta))
        .bind(model.output_meta.as_ref().map(Json))
        .bind(model.artifact.as_ref().map(Json))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            write_error::<Model>("create_model", &model.name, e, || {
                Some(EboniteError::NonExistingTask(TaskId::new(task_id)))
            })
        })?;
        model.id = Some(ModelId::new(id));
        Ok(model)
    }

    #[instrument(skip(self, model), fields(name = %model.name), err)]
    async fn update_model(&self, model: Model) -> EboniteResult<Model> {
        let (id, task_id) = self
            .check_update(&model, "models", "tasks", EboniteError::NonExistingTask)
            .await?;
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE models SET
                name = $2, task_id = $3, description = $4, params = $5, wrapper = $6,
                requirements = $7, input_meta = $8, output_meta = $9, artifact = $10
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&model.name)
        .bind(task_id)
        .bind(&model.description)
        .bind(Json(&model.params))
        .bind(Json(&model.wrapper))
        .bind(Json(&model.requirements))
        .bind(Json(&model.input_meta))
        .bind(model.output_meta.as_ref().map(Json))
        .bind(model.artifact.as_ref().map(Json))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| {
            write_error::<Model>("update_model", &model.name, e, || {
                Some(EboniteError::NonExistingTask(TaskId::new(task_id)))
            })
        })?;
        match updated {
            Some(_) => self
                .get_model_by_id(ModelId::new(id))
                .await?
                .ok_or(EboniteError::NonExistingModel(ModelId::new(id))),
            None => Err(EboniteError::NonExistingModel(ModelId::new(id))),
        }
    }

    async fn delete_model(&self, model: &Model) -> EboniteResult<()> {
        self.delete_checked(model, "models", Some(("images", "model_id")), |name, count| {
            EboniteError::ModelWithImages { name, count }
        })
        .await
    }

    async fn get_images(&self, model_id: ModelId) -> EboniteResult<Vec<Image>> {
        let rows = sqlx::query(
            "SELECT id, name, model_id, author, creation_date, params FROM images WHERE model_id = $1 ORDER BY id",
        )
        .bind(model_id.value())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_images", e))?;
        rows.iter().map(image_from_row).collect()
    }

    async fn get_image_by_id(&self, id: ImageId) -> EboniteResult<Option<Image>> {
        let row = sqlx::query("SELECT id, name, model_id, author, creation_date, params FROM images WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_image_by_id", e))?;
        row.as_ref().map(image_from_row).transpose()
    }

    async fn get_image_by_name(&self, model_id: ModelId, name: &str) -> EboniteResult<Option<Image>> {
        let row = sqlx::query(
            "SELECT id, name, model_id, author, creation_date, params FROM images WHERE model_id = $1 AND name = $2",
        )
        .bind(model_id.value())
        .bind(name)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_image_by_name", e))?;
        row.as_ref().map(image_from_row).transpose()
    }

    #[instrument(skip(self, image), fields(name = %image.name), err)]
    async fn create_image(&self, mut image: Image) -> EboniteResult<Image> {
        let model_id = self
            .check_create(&image, "models", EboniteError::NonExistingModel)
            .await?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO images (name, model_id, author, creation_date, params)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&image.name)
        .bind(model_id)
        .bind(&image.author)
        .bind(image.creation_date)
        .bind(Json(&image.params))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            write_error::<Image>("create_image", &image.name, e, || {
                Some(EboniteError::NonExistingModel(ModelId::new(model_id)))
            })
        })?;
        image.id = Some(ImageId::new(id));
        Ok(image)
    }

    #[instrument(skip(self, image), fields(name = %image.name), err)]
    async fn update_image(&self, image: Image) -> EboniteResult<Image> {
        let (id, model_id) = self
            .check_update(&image, "images", "models", EboniteError::NonExistingModel)
            .await?;
        let row = sqlx::query(
            r#"
            UPDATE images SET name = $2, model_id = $3, params = $4 WHERE id = $1
            RETURNING id, name, model_id, author, creation_date, params
            "#,
        )
        .bind(id)
        .bind(&image.name)
        .bind(model_id)
        .bind(Json(&image.params))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| {
            write_error::<Image>("update_image", &image.name, e, || {
                Some(EboniteError::NonExistingModel(ModelId::new(model_id)))
            })
        })?;
        match row {
            Some(row) => image_from_row(&row),
            None => Err(EboniteError::NonExistingImage(ImageId::new(id))),
        }
    }

    async fn delete_image(&self, image: &Image) -> EboniteResult<()> {
        self.delete_checked(image, "images", Some(("instances", "image_id")), |name, count| {
            EboniteError::ImageWithInstances { name, count }
        })
        .await
    }

    async fn get_instances(&self, image_id: ImageId) -> EboniteResult<Vec<RuntimeInstance>> {
        let rows = sqlx::query(
            "SELECT id, name, image_id, author, creation_date, params FROM instances WHERE image_id = $1 ORDER BY id",
        )
        .bind(image_id.value())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_instances", e))?;
        rows.iter().map(instance_from_row).collect()
    }

    async fn get_instance_by_id(&self, id: InstanceId) -> EboniteResult<Option<RuntimeInstance>> {
        let row = sqlx::query(
            "SELECT id, name, image_id, author, creation_date, params FROM instances WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_instance_by_id", e))?;
        row.as_ref().map(instance_from_row).transpose()
    }

    async fn get_instance_by_name(
        &self,
        image_id: ImageId,
        name: &str,
    ) -> EboniteResult<Option<RuntimeInstance>> {
        let row = sqlx::query(
            "SELECT id, name, image_id, author, creation_date, params FROM instances WHERE image_id = $1 AND name = $2",
        )
        .bind(image_id.value())
        .bind(name)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_instance_by_name", e))?;
        row.as_ref().map(instance_from_row).transpose()
    }

    #[instrument(skip(self, instance), fields(name = %instance.name), err)]
    async fn create_instance(&self, mut instance: RuntimeInstance) -> EboniteResult<RuntimeInstance> {
        let image_id = self
            .check_create(&instance, "images", EboniteError::NonExistingImage)
            .await?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO instances (name, image_id, author, creation_date, params)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&instance.name)
        .bind(image_id)
        .bind(&instance.author)
        .bind(instance.creation_date)
        .bind(Json(&instance.params))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            write_error::<RuntimeInstance>("create_instance", &instance.name, e, || {
                Some(EboniteError::NonExistingImage(ImageId::new(image_id)))
            })
        })?;
        instance.id = Some(InstanceId::new(id));
        Ok(instance)
    }

    async fn delete_instance(&self, instance: &RuntimeInstance) -> EboniteResult<()> {
        self.delete_checked(instance, "instances", None, |name, count| {
            EboniteError::storage(format!("instance {name} has {count} dependent record(s)"))
        })
        .await
    }
}

const MODEL_COLUMNS: &str = r#"
    SELECT id, name, task_id, author, creation_date, description,
           params, wrapper, requirements, input_meta, output_meta, artifact
    FROM models
"#;

// Row mapping

fn project_from_row(row: &PgRow) -> EboniteResult<Project> {
    Ok(Project {
        id: Some(ProjectId::new(get(row, "id")?)),
        name: get(row, "name")?,
        author: get(row, "author")?,
        creation_date: get::<DateTime<Utc>>(row, "creation_date")?,
    })
}

fn task_from_row(row: &PgRow) -> EboniteResult<Task> {
    Ok(Task {
        id: Some(TaskId::new(get(row, "id")?)),
        name: get(row, "name")?,
        project_id: Some(ProjectId::new(get(row, "project_id")?)),
        author: get(row, "author")?,
        creation_date: get::<DateTime<Utc>>(row, "creation_date")?,
    })
}

fn model_from_row(row: &PgRow) -> EboniteResult<Model> {
    let wrapper = get::<Json<_>>(row, "wrapper")?.0;
    let input_meta = get::<Json<_>>(row, "input_meta")?.0;
    let mut model = Model::new(get::<String>(row, "name")?, wrapper, input_meta);
    model.id = Some(ModelId::new(get(row, "id")?));
    model.task_id = Some(TaskId::new(get(row, "task_id")?));
    model.author = get(row, "author")?;
    model.creation_date = get::<DateTime<Utc>>(row, "creation_date")?;
    model.description = get(row, "description")?;
    model.params = get::<Json<_>>(row, "params")?.0;
    model.requirements = get::<Json<_>>(row, "requirements")?.0;
    model.output_meta = get::<Option<Json<_>>>(row, "output_meta")?.map(|j| j.0);
    model.artifact = get::<Option<Json<_>>>(row, "artifact")?.map(|j| j.0);
    Ok(model)
}

fn image_from_row(row: &PgRow) -> EboniteResult<Image> {
    Ok(Image {
        id: Some(ImageId::new(get(row, "id")?)),
        name: get(row, "name")?,
        model_id: Some(ModelId::new(get(row, "model_id")?)),
        author: get(row, "author")?,
        creation_date: get::<DateTime<Utc>>(row, "creation_date")?,
        params: get::<Json<_>>(row, "params")?.0,
    })
}

fn instance_from_row(row: &PgRow) -> EboniteResult<RuntimeInstance> {
    Ok(RuntimeInstance {
        id: Some(InstanceId::new(get(row, "id")?)),
        name: get(row, "name")?,
        image_id: Some(ImageId::new(get(row, "image_id")?)),
        author: get(row, "author")?,
        creation_date: get::<DateTime<Utc>>(row, "creation_date")?,
        params: get::<Json<_>>(row, "params")?.0,
    })
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> EboniteResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| EboniteError::storage(format!("failed to decode column {column}: {e}")))
}

// Error mapping

/// Map a failed write: unique violations become `Existing*`, foreign key
/// violations become whatever `missing_parent` reports.
fn write_error<E: Record>(
    operation: &str,
    name: &str,
    err: sqlx::Error,
    missing_parent: impl FnOnce() -> Option<EboniteError>,
) -> EboniteError {
    if is_unique_violation(&err) {
        return E::existing(name);
    }
    if is_foreign_key_violation(&err) {
        if let Some(mapped) = missing_parent() {
            return mapped;
        }
    }
    map_sqlx_error(operation, err)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> EboniteError {
    match err {
        sqlx::Error::Database(db_err) => {
            EboniteError::storage(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            EboniteError::storage(format!("connection pool closed during {}", operation))
        }
        other => EboniteError::storage(format!("{} failed: {}", operation, other)),
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|c| c.to_string());
    }
    None
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some("23505")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some("23503")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_constraint_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_foreign_key_violation(&sqlx::Error::PoolClosed));
    }

    #[test]
    fn generic_failures_map_to_storage() {
        let err = write_error::<Project>("create_project", "p", sqlx::Error::PoolClosed, || None);
        assert!(matches!(err, EboniteError::Storage(ref m) if m.contains("create_project")));
    }

    #[test]
    fn schema_declares_every_table() {
        let ddl = SCHEMA.join("\n");
        for table in ["projects", "tasks", "models", "images", "instances"] {
            assert!(ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")), "{table}");
        }
    }
}
