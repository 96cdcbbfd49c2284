//! # Quality Check Repository
//!
//! Check definitions: validated creation, listing and activation.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::quality_check_config::{
    ActiveModel, CheckParameters, CheckType, Column, Entity, Model, Severity,
};

const ENTITY: &str = "quality check";

/// Input for [`QualityCheckRepository::create`].
#[derive(Debug, Clone)]
pub struct NewQualityCheck {
    pub check_name: String,
    pub table_name: String,
    pub column_name: Option<String>,
    pub check_type: CheckType,
    pub check_parameters: JsonValue,
    pub severity: Severity,
    pub is_active: bool,
}

impl NewQualityCheck {
    pub fn validate(&self) -> DomainResult<CheckParameters> {
        if self.check_name.trim().is_empty() {
            return Err(DomainError::invalid_field(
                "check_name",
                "check_name is required",
            ));
        }
        if self.table_name.trim().is_empty() {
            return Err(DomainError::invalid_field(
                "table_name",
                "table_name is required",
            ));
        }
        CheckParameters::parse(&self.check_type, &self.check_parameters)
    }
}

pub struct QualityCheckRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> QualityCheckRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: NewQualityCheck) -> DomainResult<Model> {
        let parameters = input.validate()?;
        let column_name = input
            .column_name
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let check = ActiveModel {
            check_id: Set(Uuid::new_v4()),
            check_name: Set(input.check_name.trim().to_string()),
            table_name: Set(input.table_name.trim().to_string()),
            column_name: Set(column_name),
            check_type: Set(input.check_type),
            check_parameters: Set(parameters.to_json()),
            severity: Set(input.severity),
            is_active: Set(input.is_active),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let created = check.insert(self.db).await?;

        tracing::info!(
            check_id = %created.check_id,
            table_name = %created.table_name,
            check_type = created.check_type.as_str(),
            severity = created.severity.as_str(),
            "Quality check created"
        );

        Ok(created)
    }

    /// All checks, newest first
    pub async fn list(&self) -> DomainResult<Vec<Model>> {
        Ok(Entity::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_asc(Column::CheckName)
            .all(self.db)
            .await?)
    }

    pub async fn get(&self, check_id: Uuid) -> DomainResult<Model> {
        Entity::find_by_id(check_id)
            .one(self.db)
            .await?
            .ok_or_else(|| DomainError::not_found(ENTITY, check_id))
    }

    pub async fn active_for_table(&self, table_name: &str) -> DomainResult<Vec<Model>> {
        Ok(Entity::find()
            .filter(Column::TableName.eq(table_name))
            .filter(Column::IsActive.eq(true))
            .order_by_asc(Column::CreatedAt)
            .all(self.db)
            .await?)
    }

    /// Distinct tables that have at least one active check
    pub async fn tables_with_active_checks(&self) -> DomainResult<Vec<String>> {
        let tables: Vec<String> = Entity::find()
            .select_only()
            .column(Column::TableName)
            .filter(Column::IsActive.eq(true))
            .distinct()
            .order_by_asc(Column::TableName)
            .into_tuple()
            .all(self.db)
            .await?;
        Ok(tables)
    }

    pub async fn set_active(&self, check_id: Uuid, is_active: bool) -> DomainResult<Model> {
        let check = self.get(check_id).await?;
        if check.is_active == is_active {
            return Ok(check);
        }

        let mut active = check.into_active_model();
        active.is_active = Set(is_active);
        let updated = active.update(self.db).await?;

        tracing::info!(check_id = %check_id, is_active, "Quality check activation changed");
        Ok(updated)
    }

    /// Remove a check definition. Recorded results stay in the ledger.
    pub async fn delete(&self, check_id: Uuid) -> DomainResult<()> {
        let result = Entity::delete_by_id(check_id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found(ENTITY, check_id));
        }
        tracing::info!(check_id = %check_id, "Quality check deleted");
        Ok(())
    }
}
