use crate::model::{
    EntityType, ExternalIntegrationMapping, Id, Item, MakeMethod, MethodMaterial, MethodOperation,
    OperationParameter, OperationStep, OperationTool, Part,
};
use anyhow::Result;

/// Transaction lifecycle. Every other store call runs inside a `Tx`.
///
/// Dropping a `Tx` without committing must roll it back.
#[async_trait::async_trait]
pub trait TransactionStore: Send + Sync + 'static {
    type Tx: Send;

    async fn begin(&self) -> Result<Self::Tx>;
    async fn commit(&self, tx: Self::Tx) -> Result<()>;
    async fn rollback(&self, tx: Self::Tx) -> Result<()>;
}

/// Catalog items, part shells and external id mappings
#[async_trait::async_trait]
pub trait ItemStore: TransactionStore {
    async fn get_item(&self, tx: &mut Self::Tx, company_id: &Id, id: &Id) -> Result<Option<Item>>;
    async fn find_item_by_readable_id(
        &self,
        tx: &mut Self::Tx,
        company_id: &Id,
        readable_id: &str,
        revision: &str,
    ) -> Result<Option<Item>>;
    /// Insert a new item, returning the stored row
    async fn insert_item(&self, tx: &mut Self::Tx, item: Item) -> Result<Option<Item>>;
    /// Bump `updated_at` / `updated_by`
    async fn touch_item(&self, tx: &mut Self::Tx, id: &Id, user_id: &Id) -> Result<()>;
    /// Insert a part shell unless one already exists for (id, company)
    async fn upsert_part(&self, tx: &mut Self::Tx, part: Part) -> Result<()>;

    async fn find_mapped_entity(
        &self,
        tx: &mut Self::Tx,
        integration: &str,
        external_id: &str,
        entity_type: EntityType,
        company_id: &Id,
    ) -> Result<Option<Id>>;
    /// Upsert keyed on (entity_type, entity_id, integration, company_id)
    async fn upsert_mapping_by_entity(
        &self,
        tx: &mut Self::Tx,
        mapping: ExternalIntegrationMapping,
    ) -> Result<()>;
    /// Upsert keyed on (integration, external_id, entity_type, company_id)
    async fn upsert_mapping_by_external_id(
        &self,
        tx: &mut Self::Tx,
        mapping: ExternalIntegrationMapping,
    ) -> Result<()>;
}

/// Make method versions and their operations
#[async_trait::async_trait]
pub trait MakeMethodStore: TransactionStore {
    async fn get_make_method(&self, tx: &mut Self::Tx, id: &Id) -> Result<Option<MakeMethod>>;
    /// All versions for an item, ordered by version
    async fn list_make_methods_for_item(
        &self,
        tx: &mut Self::Tx,
        item_id: &Id,
    ) -> Result<Vec<MakeMethod>>;
    async fn insert_make_method(&self, tx: &mut Self::Tx, method: MakeMethod) -> Result<MakeMethod>;
    /// Serialize version decisions for one item until the transaction ends
    async fn lock_item_methods(&self, tx: &mut Self::Tx, item_id: &Id) -> Result<()>;

    async fn list_operations(
        &self,
        tx: &mut Self::Tx,
        make_method_id: &Id,
    ) -> Result<Vec<MethodOperation>>;
    async fn insert_operation(
        &self,
        tx: &mut Self::Tx,
        operation: MethodOperation,
    ) -> Result<MethodOperation>;
    async fn list_operation_tools(
        &self,
        tx: &mut Self::Tx,
        operation_id: &Id,
    ) -> Result<Vec<OperationTool>>;
    async fn insert_operation_tools(
        &self,
        tx: &mut Self::Tx,
        tools: Vec<OperationTool>,
    ) -> Result<()>;
    async fn list_operation_parameters(
        &self,
        tx: &mut Self::Tx,
        operation_id: &Id,
    ) -> Result<Vec<OperationParameter>>;
    async fn insert_operation_parameters(
        &self,
        tx: &mut Self::Tx,
        parameters: Vec<OperationParameter>,
    ) -> Result<()>;
    async fn list_operation_steps(
        &self,
        tx: &mut Self::Tx,
        operation_id: &Id,
    ) -> Result<Vec<OperationStep>>;
    async fn insert_operation_steps(
        &self,
        tx: &mut Self::Tx,
        steps: Vec<OperationStep>,
    ) -> Result<()>;
}

/// Material edges of make methods
#[async_trait::async_trait]
pub trait MaterialStore: TransactionStore {
    /// Remove every material of a make method, returning the number removed
    async fn delete_materials(&self, tx: &mut Self::Tx, make_method_id: &Id) -> Result<u64>;
    async fn insert_materials(
        &self,
        tx: &mut Self::Tx,
        materials: Vec<MethodMaterial>,
    ) -> Result<()>;
}

pub trait Store: ItemStore + MakeMethodStore + MaterialStore + Send + Sync {}
