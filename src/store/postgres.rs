use anyhow::{Context, Result};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};

use crate::model::{
    EntityType, ExternalIntegrationMapping, Id, Item, MakeMethod, MethodMaterial, MethodOperation,
    OperationParameter, OperationStep, OperationTool, Part,
};
use crate::store::traits::{ItemStore, MakeMethodStore, MaterialStore, Store, TransactionStore};

const ITEM_COLUMNS: &str = "id, readable_id, revision, name, type, unit_of_measure_code, \
    replenishment_system, default_method_type, company_id, created_by, created_at, updated_by, updated_at";

const MAKE_METHOD_COLUMNS: &str =
    "id, item_id, version, status, company_id, created_by, created_at, updated_by, updated_at";

const OPERATION_COLUMNS: &str = r#"id, make_method_id, "order", operation_type, process_id, work_center_id,
    description, setup_time, labor_time, machine_time, company_id, created_by, created_at, updated_by, updated_at"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn item_from_row(row: &PgRow) -> Result<Item> {
    Ok(Item {
        id: row.try_get("id")?,
        readable_id: row.try_get("readable_id")?,
        revision: row.try_get("revision")?,
        name: row.try_get("name")?,
        item_type: row.try_get::<String, _>("type")?.parse()?,
        unit_of_measure_code: row.try_get("unit_of_measure_code")?,
        replenishment_system: row.try_get::<String, _>("replenishment_system")?.parse()?,
        default_method_type: row.try_get::<String, _>("default_method_type")?.parse()?,
        company_id: row.try_get("company_id")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_by: row.try_get("updated_by")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn make_method_from_row(row: &PgRow) -> Result<MakeMethod> {
    Ok(MakeMethod {
        id: row.try_get("id")?,
        item_id: row.try_get("item_id")?,
        version: row.try_get("version")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        company_id: row.try_get("company_id")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_by: row.try_get("updated_by")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn operation_from_row(row: &PgRow) -> Result<MethodOperation> {
    Ok(MethodOperation {
        id: row.try_get("id")?,
        make_method_id: row.try_get("make_method_id")?,
        order: row.try_get("order")?,
        operation_type: row.try_get("operation_type")?,
        process_id: row.try_get("process_id")?,
        work_center_id: row.try_get("work_center_id")?,
        description: row.try_get("description")?,
        setup_time: row.try_get("setup_time")?,
        labor_time: row.try_get("labor_time")?,
        machine_time: row.try_get("machine_time")?,
        company_id: row.try_get("company_id")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_by: row.try_get("updated_by")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait::async_trait]
impl TransactionStore for PostgresStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx> {
        self.pool.begin().await.context("Failed to begin transaction")
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        tx.commit().await.context("Failed to commit transaction")
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        tx.rollback().await.context("Failed to roll back transaction")
    }
}

#[async_trait::async_trait]
impl ItemStore for PostgresStore {
    async fn get_item(&self, tx: &mut Self::Tx, company_id: &Id, id: &Id) -> Result<Option<Item>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM item WHERE id = $1 AND company_id = $2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to fetch item")?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn find_item_by_readable_id(
        &self,
        tx: &mut Self::Tx,
        company_id: &Id,
        readable_id: &str,
        revision: &str,
    ) -> Result<Option<Item>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM item \
             WHERE company_id = $1 AND readable_id = $2 AND revision = $3"
        ))
        .bind(company_id)
        .bind(readable_id)
        .bind(revision)
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to look up item by readable id")?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn insert_item(&self, tx: &mut Self::Tx, item: Item) -> Result<Option<Item>> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO item (id, readable_id, revision, name, type, unit_of_measure_code,
                              replenishment_system, default_method_type, company_id, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&item.id)
        .bind(&item.readable_id)
        .bind(&item.revision)
        .bind(&item.name)
        .bind(item.item_type.as_str())
        .bind(&item.unit_of_measure_code)
        .bind(item.replenishment_system.as_str())
        .bind(item.default_method_type.as_str())
        .bind(&item.company_id)
        .bind(&item.created_by)
        .bind(item.created_at)
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to insert item")?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn touch_item(&self, tx: &mut Self::Tx, id: &Id, user_id: &Id) -> Result<()> {
        sqlx::query("UPDATE item SET updated_at = NOW(), updated_by = $2 WHERE id = $1")
            .bind(id)
            .bind(user_id)
            .execute(&mut **tx)
            .await
            .context("Failed to touch item")?;
        Ok(())
    }

    async fn upsert_part(&self, tx: &mut Self::Tx, part: Part) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO part (id, company_id, created_by, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id, company_id) DO NOTHING
            "#,
        )
        .bind(&part.id)
        .bind(&part.company_id)
        .bind(&part.created_by)
        .bind(part.created_at)
        .execute(&mut **tx)
        .await
        .context("Failed to upsert part")?;
        Ok(())
    }

    async fn find_mapped_entity(
        &self,
        tx: &mut Self::Tx,
        integration: &str,
        external_id: &str,
        entity_type: EntityType,
        company_id: &Id,
    ) -> Result<Option<Id>> {
        let entity_id = sqlx::query_scalar::<_, String>(
            r#"
            SELECT entity_id FROM external_integration_mapping
            WHERE integration = $1 AND external_id = $2 AND entity_type = $3 AND company_id = $4
            "#,
        )
        .bind(integration)
        .bind(external_id)
        .bind(entity_type.as_str())
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to look up external integration mapping")?;

        Ok(entity_id)
    }

    async fn upsert_mapping_by_entity(
        &self,
        tx: &mut Self::Tx,
        mapping: ExternalIntegrationMapping,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO external_integration_mapping
                (entity_type, entity_id, integration, external_id, metadata, company_id, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (entity_type, entity_id, integration, company_id) DO UPDATE SET
                external_id = EXCLUDED.external_id,
                metadata = EXCLUDED.metadata,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(mapping.entity_type.as_str())
        .bind(&mapping.entity_id)
        .bind(&mapping.integration)
        .bind(&mapping.external_id)
        .bind(&mapping.metadata)
        .bind(&mapping.company_id)
        .bind(mapping.updated_at)
        .execute(&mut **tx)
        .await
        .context("Failed to upsert external integration mapping")?;
        Ok(())
    }

    async fn upsert_mapping_by_external_id(
        &self,
        tx: &mut Self::Tx,
        mapping: ExternalIntegrationMapping,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO external_integration_mapping
                (entity_type, entity_id, integration, external_id, metadata, company_id, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (integration, external_id, entity_type, company_id) DO UPDATE SET
                entity_id = EXCLUDED.entity_id,
                metadata = EXCLUDED.metadata,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(mapping.entity_type.as_str())
        .bind(&mapping.entity_id)
        .bind(&mapping.integration)
        .bind(&mapping.external_id)
        .bind(&mapping.metadata)
        .bind(&mapping.company_id)
        .bind(mapping.updated_at)
        .execute(&mut **tx)
        .await
        .context("Failed to upsert external integration mapping")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MakeMethodStore for PostgresStore {
    async fn get_make_method(&self, tx: &mut Self::Tx, id: &Id) -> Result<Option<MakeMethod>> {
        let row = sqlx::query(&format!(
            "SELECT {MAKE_METHOD_COLUMNS} FROM make_method WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to fetch make method")?;

        row.as_ref().map(make_method_from_row).transpose()
    }

    async fn list_make_methods_for_item(
        &self,
        tx: &mut Self::Tx,
        item_id: &Id,
    ) -> Result<Vec<MakeMethod>> {
        let rows = sqlx::query(&format!(
            "SELECT {MAKE_METHOD_COLUMNS} FROM make_method WHERE item_id = $1 ORDER BY version"
        ))
        .bind(item_id)
        .fetch_all(&mut **tx)
        .await
        .context("Failed to list make methods")?;

        rows.iter().map(make_method_from_row).collect()
    }

    async fn insert_make_method(
        &self,
        tx: &mut Self::Tx,
        method: MakeMethod,
    ) -> Result<MakeMethod> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO make_method (id, item_id, version, status, company_id, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MAKE_METHOD_COLUMNS}
            "#
        ))
        .bind(&method.id)
        .bind(&method.item_id)
        .bind(method.version)
        .bind(method.status.as_str())
        .bind(&method.company_id)
        .bind(&method.created_by)
        .bind(method.created_at)
        .fetch_one(&mut **tx)
        .await
        .with_context(|| format!("Failed to insert make method for item {}", method.item_id))?;

        make_method_from_row(&row)
    }

    async fn lock_item_methods(&self, tx: &mut Self::Tx, item_id: &Id) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(item_id)
            .execute(&mut **tx)
            .await
            .context("Failed to lock item make methods")?;
        Ok(())
    }

    async fn list_operations(
        &self,
        tx: &mut Self::Tx,
        make_method_id: &Id,
    ) -> Result<Vec<MethodOperation>> {
        let rows = sqlx::query(&format!(
            r#"SELECT {OPERATION_COLUMNS} FROM method_operation WHERE make_method_id = $1 ORDER BY "order", created_at"#
        ))
        .bind(make_method_id)
        .fetch_all(&mut **tx)
        .await
        .context("Failed to list method operations")?;

        rows.iter().map(operation_from_row).collect()
    }

    async fn insert_operation(
        &self,
        tx: &mut Self::Tx,
        operation: MethodOperation,
    ) -> Result<MethodOperation> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO method_operation (id, make_method_id, "order", operation_type, process_id, work_center_id,
                                          description, setup_time, labor_time, machine_time, company_id,
                                          created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {OPERATION_COLUMNS}
            "#
        ))
        .bind(&operation.id)
        .bind(&operation.make_method_id)
        .bind(operation.order)
        .bind(&operation.operation_type)
        .bind(&operation.process_id)
        .bind(&operation.work_center_id)
        .bind(&operation.description)
        .bind(operation.setup_time)
        .bind(operation.labor_time)
        .bind(operation.machine_time)
        .bind(&operation.company_id)
        .bind(&operation.created_by)
        .bind(operation.created_at)
        .fetch_one(&mut **tx)
        .await
        .context("Failed to insert method operation")?;

        operation_from_row(&row)
    }

    async fn list_operation_tools(
        &self,
        tx: &mut Self::Tx,
        operation_id: &Id,
    ) -> Result<Vec<OperationTool>> {
        let rows = sqlx::query(
            r#"
            SELECT id, operation_id, tool_id, quantity, company_id, created_by, created_at
            FROM method_operation_tool WHERE operation_id = $1 ORDER BY created_at
            "#,
        )
        .bind(operation_id)
        .fetch_all(&mut **tx)
        .await
        .context("Failed to list operation tools")?;

        rows.iter()
            .map(|row| -> Result<OperationTool> {
                Ok(OperationTool {
                    id: row.try_get("id")?,
                    operation_id: row.try_get("operation_id")?,
                    tool_id: row.try_get("tool_id")?,
                    quantity: row.try_get("quantity")?,
                    company_id: row.try_get("company_id")?,
                    created_by: row.try_get("created_by")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn insert_operation_tools(
        &self,
        tx: &mut Self::Tx,
        tools: Vec<OperationTool>,
    ) -> Result<()> {
        for tool in tools {
            sqlx::query(
                r#"
                INSERT INTO method_operation_tool (id, operation_id, tool_id, quantity, company_id, created_by, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&tool.id)
            .bind(&tool.operation_id)
            .bind(&tool.tool_id)
            .bind(tool.quantity)
            .bind(&tool.company_id)
            .bind(&tool.created_by)
            .bind(tool.created_at)
            .execute(&mut **tx)
            .await
            .context("Failed to insert operation tool")?;
        }
        Ok(())
    }

    async fn list_operation_parameters(
        &self,
        tx: &mut Self::Tx,
        operation_id: &Id,
    ) -> Result<Vec<OperationParameter>> {
        let rows = sqlx::query(
            r#"
            SELECT id, operation_id, key, value, company_id, created_by, created_at
            FROM method_operation_parameter WHERE operation_id = $1 ORDER BY created_at
            "#,
        )
        .bind(operation_id)
        .fetch_all(&mut **tx)
        .await
        .context("Failed to list operation parameters")?;

        rows.iter()
            .map(|row| -> Result<OperationParameter> {
                Ok(OperationParameter {
                    id: row.try_get("id")?,
                    operation_id: row.try_get("operation_id")?,
                    key: row.try_get("key")?,
                    value: row.try_get("value")?,
                    company_id: row.try_get("company_id")?,
                    created_by: row.try_get("created_by")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn insert_operation_parameters(
        &self,
        tx: &mut Self::Tx,
        parameters: Vec<OperationParameter>,
    ) -> Result<()> {
        for parameter in parameters {
            sqlx::query(
                r#"
                INSERT INTO method_operation_parameter (id, operation_id, key, value, company_id, created_by, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&parameter.id)
            .bind(&parameter.operation_id)
            .bind(&parameter.key)
            .bind(&parameter.value)
            .bind(&parameter.company_id)
            .bind(&parameter.created_by)
            .bind(parameter.created_at)
            .execute(&mut **tx)
            .await
            .context("Failed to insert operation parameter")?;
        }
        Ok(())
    }

    async fn list_operation_steps(
        &self,
        tx: &mut Self::Tx,
        operation_id: &Id,
    ) -> Result<Vec<OperationStep>> {
        let rows = sqlx::query(
            r#"
            SELECT id, operation_id, name, description, step_type, sort_order, company_id, created_by, created_at
            FROM method_operation_step WHERE operation_id = $1 ORDER BY sort_order
            "#,
        )
        .bind(operation_id)
        .fetch_all(&mut **tx)
        .await
        .context("Failed to list operation steps")?;

        rows.iter()
            .map(|row| -> Result<OperationStep> {
                Ok(OperationStep {
                    id: row.try_get("id")?,
                    operation_id: row.try_get("operation_id")?,
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                    step_type: row.try_get("step_type")?,
                    sort_order: row.try_get("sort_order")?,
                    company_id: row.try_get("company_id")?,
                    created_by: row.try_get("created_by")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn insert_operation_steps(
        &self,
        tx: &mut Self::Tx,
        steps: Vec<OperationStep>,
    ) -> Result<()> {
        for step in steps {
            sqlx::query(
                r#"
                INSERT INTO method_operation_step (id, operation_id, name, description, step_type, sort_order,
                                                   company_id, created_by, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(&step.id)
            .bind(&step.operation_id)
            .bind(&step.name)
            .bind(&step.description)
            .bind(&step.step_type)
            .bind(step.sort_order)
            .bind(&step.company_id)
            .bind(&step.created_by)
            .bind(step.created_at)
            .execute(&mut **tx)
            .await
            .context("Failed to insert operation step")?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MaterialStore for PostgresStore {
    async fn delete_materials(&self, tx: &mut Self::Tx, make_method_id: &Id) -> Result<u64> {
        let result = sqlx::query("DELETE FROM method_material WHERE make_method_id = $1")
            .bind(make_method_id)
            .execute(&mut **tx)
            .await
            .context("Failed to delete method materials")?;

        Ok(result.rows_affected())
    }

    async fn insert_materials(
        &self,
        tx: &mut Self::Tx,
        materials: Vec<MethodMaterial>,
    ) -> Result<()> {
        if materials.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"INSERT INTO method_material (id, make_method_id, material_make_method_id, item_id, item_type,
                method_type, "order", quantity, unit_of_measure_code, company_id, created_by, created_at) "#,
        );
        builder.push_values(materials, |mut row, material| {
            row.push_bind(material.id)
                .push_bind(material.make_method_id)
                .push_bind(material.material_make_method_id)
                .push_bind(material.item_id)
                .push_bind(material.item_type.as_str())
                .push_bind(material.method_type.as_str())
                .push_bind(material.order)
                .push_bind(material.quantity)
                .push_bind(material.unit_of_measure_code)
                .push_bind(material.company_id)
                .push_bind(material.created_by)
                .push_bind(material.created_at);
        });

        builder
            .build()
            .execute(&mut **tx)
            .await
            .context("Failed to insert method materials")?;
        Ok(())
    }
}

impl Store for PostgresStore {}
