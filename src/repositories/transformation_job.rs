//! # Transformation Job Repository
//!
//! Registry of job definitions: creation with configuration validation, listing,
//! activation toggles and deletion.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::transformation_job::{
    ActiveModel, Column, Entity, Model, TransformationConfig, TransformationType,
};

const ENTITY: &str = "transformation job";

/// Input for [`TransformationJobRepository::create`].
#[derive(Debug, Clone)]
pub struct NewTransformationJob {
    pub job_name: String,
    pub source_table: String,
    pub target_table: String,
    pub transformation_type: TransformationType,
    pub transformation_config: JsonValue,
    pub schedule: Option<String>,
    pub is_active: bool,
}

impl NewTransformationJob {
    /// Check required fields and decode the configuration for the declared type.
    pub fn validate(&self) -> DomainResult<TransformationConfig> {
        require_non_empty("job_name", &self.job_name)?;
        require_non_empty("source_table", &self.source_table)?;
        require_non_empty("target_table", &self.target_table)?;
        TransformationConfig::parse(&self.transformation_type, &self.transformation_config)
    }
}

fn require_non_empty(field: &'static str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid_field(
            field,
            format!("{} is required", field),
        ));
    }
    Ok(())
}

/// Registry counts shown on the jobs page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct JobCounts {
    pub total: u64,
    pub active: u64,
    pub scheduled: u64,
}

/// Repository for transformation job definitions
pub struct TransformationJobRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TransformationJobRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Validate and persist a new job definition
    pub async fn create(&self, input: NewTransformationJob) -> DomainResult<Model> {
        let config = input.validate()?;
        let schedule = input
            .schedule
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let job = ActiveModel {
            job_id: Set(Uuid::new_v4()),
            job_name: Set(input.job_name.trim().to_string()),
            source_table: Set(input.source_table.trim().to_string()),
            target_table: Set(input.target_table.trim().to_string()),
            transformation_type: Set(config.transformation_type()),
            transformation_config: Set(config.to_json()),
            schedule: Set(schedule),
            is_active: Set(input.is_active),
            last_run: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let created = job.insert(self.db).await?;

        tracing::info!(
            job_id = %created.job_id,
            job_name = %created.job_name,
            transformation_type = created.transformation_type.as_str(),
            "Transformation job created"
        );

        Ok(created)
    }

    /// All jobs, most recently created first
    pub async fn list(&self) -> DomainResult<Vec<Model>> {
        let jobs = Entity::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_asc(Column::JobName)
            .all(self.db)
            .await?;
        Ok(jobs)
    }

    pub async fn find(&self, job_id: Uuid) -> DomainResult<Option<Model>> {
        Ok(Entity::find_by_id(job_id).one(self.db).await?)
    }

    pub async fn get(&self, job_id: Uuid) -> DomainResult<Model> {
        self.find(job_id)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY, job_id))
    }

    /// Toggle the active flag. Nothing is written when the job is already in the
    /// requested state.
    pub async fn set_active(&self, job_id: Uuid, is_active: bool) -> DomainResult<Model> {
        let job = self.get(job_id).await?;
        if job.is_active == is_active {
            return Ok(job);
        }

        let mut active = job.into_active_model();
        active.is_active = Set(is_active);
        let updated = active.update(self.db).await?;

        tracing::info!(job_id = %job_id, is_active, "Transformation job activation changed");
        Ok(updated)
    }

    /// Remove a job definition. Its execution history stays in place.
    pub async fn delete(&self, job_id: Uuid) -> DomainResult<()> {
        let result = Entity::delete_by_id(job_id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found(ENTITY, job_id));
        }

        tracing::info!(job_id = %job_id, "Transformation job deleted");
        Ok(())
    }

    pub async fn record_last_run(
        &self,
        job_id: Uuid,
        at: DateTimeWithTimeZone,
    ) -> DomainResult<()> {
        Entity::update_many()
            .col_expr(Column::LastRun, sea_orm::sea_query::Expr::value(Some(at)))
            .filter(Column::JobId.eq(job_id))
            .exec(self.db)
            .await?;
        Ok(())
    }

    pub async fn counts(&self) -> DomainResult<JobCounts> {
        let total = Entity::find().count(self.db).await?;
        let active = Entity::find()
            .filter(Column::IsActive.eq(true))
            .count(self.db)
            .await?;
        let scheduled = Entity::find()
            .filter(Column::Schedule.is_not_null())
            .count(self.db)
            .await?;

        Ok(JobCounts {
            total,
            active,
            scheduled,
        })
    }

    pub async fn count_active(&self) -> DomainResult<u64> {
        Ok(Entity::find()
            .filter(Column::IsActive.eq(true))
            .count(self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use serde_json::json;

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn dedup_job(name: &str) -> NewTransformationJob {
        NewTransformationJob {
            job_name: name.to_string(),
            source_table: "DB.SCH.CUSTOMERS".to_string(),
            target_table: "DB.SCH.CUSTOMERS_CLEAN".to_string(),
            transformation_type: TransformationType::Deduplicate,
            transformation_config: json!({"key_columns": ["EMAIL"]}),
            schedule: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let db = setup_db().await;
        let repo = TransformationJobRepository::new(&db);

        let mut input = dedup_job("  ");
        assert!(repo.create(input.clone()).await.unwrap_err().is_validation());

        input.job_name = "ok".to_string();
        input.target_table = String::new();
        assert!(repo.create(input).await.unwrap_err().is_validation());

        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_schedule_is_stored_as_none() {
        let db = setup_db().await;
        let repo = TransformationJobRepository::new(&db);

        let mut input = dedup_job("nightly");
        input.schedule = Some("   ".to_string());
        let job = repo.create(input).await.unwrap();
        assert_eq!(job.schedule, None);

        let counts = repo.counts().await.unwrap();
        assert_eq!(counts.scheduled, 0);
    }

    #[tokio::test]
    async fn test_counts() {
        let db = setup_db().await;
        let repo = TransformationJobRepository::new(&db);

        let mut scheduled = dedup_job("a");
        scheduled.schedule = Some("0 2 * * *".to_string());
        repo.create(scheduled).await.unwrap();

        let mut inactive = dedup_job("b");
        inactive.is_active = false;
        repo.create(inactive).await.unwrap();

        assert_eq!(
            repo.counts().await.unwrap(),
            JobCounts {
                total: 2,
                active: 1,
                scheduled: 1
            }
        );
        assert_eq!(repo.count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_last_run() {
        let db = setup_db().await;
        let repo = TransformationJobRepository::new(&db);
        let job = repo.create(dedup_job("a")).await.unwrap();
        assert!(job.last_run.is_none());

        let at = Utc::now().fixed_offset();
        repo.record_last_run(job.job_id, at).await.unwrap();

        let reloaded = repo.get(job.job_id).await.unwrap();
        assert!(reloaded.last_run.is_some());
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let db = setup_db().await;
        let repo = TransformationJobRepository::new(&db);
        let id = Uuid::new_v4();

        assert!(matches!(
            repo.get(id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            repo.set_active(id, false).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            repo.delete(id).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
