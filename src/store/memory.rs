use anyhow::{bail, Result};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{
    EntityType, ExternalIntegrationMapping, Id, Item, MakeMethod, MakeMethodStatus,
    MethodMaterial, MethodOperation, OperationParameter, OperationStep, OperationTool, Part,
};
use crate::store::traits::{ItemStore, MakeMethodStore, MaterialStore, Store, TransactionStore};

/// Every table the sync touches, held as plain vectors
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub items: Vec<Item>,
    pub parts: Vec<Part>,
    pub mappings: Vec<ExternalIntegrationMapping>,
    pub make_methods: Vec<MakeMethod>,
    pub operations: Vec<MethodOperation>,
    pub operation_tools: Vec<OperationTool>,
    pub operation_parameters: Vec<OperationParameter>,
    pub operation_steps: Vec<OperationStep>,
    pub materials: Vec<MethodMaterial>,
}

impl MemoryState {
    pub fn materials_for(&self, make_method_id: &str) -> Vec<&MethodMaterial> {
        let mut materials: Vec<_> = self
            .materials
            .iter()
            .filter(|m| m.make_method_id == make_method_id)
            .collect();
        materials.sort_by_key(|m| m.order);
        materials
    }

    pub fn methods_for_item(&self, item_id: &str) -> Vec<&MakeMethod> {
        let mut methods: Vec<_> = self
            .make_methods
            .iter()
            .filter(|m| m.item_id == item_id)
            .collect();
        methods.sort_by_key(|m| m.version);
        methods
    }

    pub fn operations_for(&self, make_method_id: &str) -> Vec<&MethodOperation> {
        self.operations
            .iter()
            .filter(|o| o.make_method_id == make_method_id)
            .collect()
    }

    pub fn item_by_readable_id(&self, readable_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.readable_id == readable_id)
    }
}

/// Store operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertItem,
    InsertMakeMethod,
    InsertOperation,
    DeleteMaterials,
    InsertMaterials,
    Commit,
}

/// A transaction over a private copy of the committed state
#[derive(Debug)]
pub struct MemoryTx {
    state: MemoryState,
}

/// In-memory store with copy-on-begin transactions.
///
/// Commit replaces the shared state wholesale, so concurrent transactions
/// resolve as last writer wins.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_point: Arc<Mutex<Option<FailPoint>>>,
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: MemoryState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            ..Self::default()
        }
    }

    /// Copy of the committed state
    pub fn snapshot(&self) -> MemoryState {
        self.state.lock().clone()
    }

    pub fn fail_on(&self, point: FailPoint) {
        *self.fail_point.lock() = Some(point);
    }

    pub fn clear_failure(&self) {
        *self.fail_point.lock() = None;
    }

    /// Number of times a store method has been called
    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    fn record(&self, method: &'static str) {
        *self.calls.lock().entry(method).or_insert(0) += 1;
    }

    fn check(&self, point: FailPoint) -> Result<()> {
        if *self.fail_point.lock() == Some(point) {
            bail!("injected failure at {:?}", point);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TransactionStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        self.record("begin");
        Ok(MemoryTx {
            state: self.snapshot(),
        })
    }

    async fn commit(&self, tx: MemoryTx) -> Result<()> {
        self.record("commit");
        self.check(FailPoint::Commit)?;
        *self.state.lock() = tx.state;
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> Result<()> {
        self.record("rollback");
        drop(tx);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ItemStore for MemoryStore {
    async fn get_item(
        &self,
        tx: &mut MemoryTx,
        company_id: &Id,
        id: &Id,
    ) -> Result<Option<Item>> {
        self.record("get_item");
        Ok(tx
            .state
            .items
            .iter()
            .find(|i| &i.id == id && &i.company_id == company_id)
            .cloned())
    }

    async fn find_item_by_readable_id(
        &self,
        tx: &mut MemoryTx,
        company_id: &Id,
        readable_id: &str,
        revision: &str,
    ) -> Result<Option<Item>> {
        self.record("find_item_by_readable_id");
        Ok(tx
            .state
            .items
            .iter()
            .find(|i| {
                &i.company_id == company_id
                    && i.readable_id == readable_id
                    && i.revision == revision
            })
            .cloned())
    }

    async fn insert_item(&self, tx: &mut MemoryTx, item: Item) -> Result<Option<Item>> {
        self.record("insert_item");
        self.check(FailPoint::InsertItem)?;
        if tx.state.items.iter().any(|i| {
            i.company_id == item.company_id
                && i.readable_id == item.readable_id
                && i.revision == item.revision
        }) {
            bail!(
                "duplicate item {} revision {} in company {}",
                item.readable_id,
                item.revision,
                item.company_id
            );
        }
        tx.state.items.push(item.clone());
        Ok(Some(item))
    }

    async fn touch_item(&self, tx: &mut MemoryTx, id: &Id, user_id: &Id) -> Result<()> {
        self.record("touch_item");
        if let Some(item) = tx.state.items.iter_mut().find(|i| &i.id == id) {
            item.updated_at = Some(Utc::now());
            item.updated_by = Some(user_id.clone());
        }
        Ok(())
    }

    async fn upsert_part(&self, tx: &mut MemoryTx, part: Part) -> Result<()> {
        self.record("upsert_part");
        if !tx
            .state
            .parts
            .iter()
            .any(|p| p.id == part.id && p.company_id == part.company_id)
        {
            tx.state.parts.push(part);
        }
        Ok(())
    }

    async fn find_mapped_entity(
        &self,
        tx: &mut MemoryTx,
        integration: &str,
        external_id: &str,
        entity_type: EntityType,
        company_id: &Id,
    ) -> Result<Option<Id>> {
        self.record("find_mapped_entity");
        Ok(tx
            .state
            .mappings
            .iter()
            .find(|m| {
                m.integration == integration
                    && m.external_id == external_id
                    && m.entity_type == entity_type
                    && &m.company_id == company_id
            })
            .map(|m| m.entity_id.clone()))
    }

    async fn upsert_mapping_by_entity(
        &self,
        tx: &mut MemoryTx,
        mapping: ExternalIntegrationMapping,
    ) -> Result<()> {
        self.record("upsert_mapping_by_entity");
        let mappings = &mut tx.state.mappings;
        let existing = mappings.iter().position(|m| m.same_entity(&mapping));
        if mappings
            .iter()
            .enumerate()
            .any(|(pos, m)| Some(pos) != existing && m.same_external(&mapping))
        {
            bail!(
                "external id {} is already mapped for {}",
                mapping.external_id,
                mapping.integration
            );
        }
        match existing {
            Some(pos) => {
                let row = &mut mappings[pos];
                row.external_id = mapping.external_id;
                row.metadata = mapping.metadata;
                row.updated_at = mapping.updated_at;
            }
            None => mappings.push(mapping),
        }
        Ok(())
    }

    async fn upsert_mapping_by_external_id(
        &self,
        tx: &mut MemoryTx,
        mapping: ExternalIntegrationMapping,
    ) -> Result<()> {
        self.record("upsert_mapping_by_external_id");
        let mappings = &mut tx.state.mappings;
        let existing = mappings.iter().position(|m| m.same_external(&mapping));
        if mappings
            .iter()
            .enumerate()
            .any(|(pos, m)| Some(pos) != existing && m.same_entity(&mapping))
        {
            bail!(
                "{} {} is already mapped for {}",
                mapping.entity_type,
                mapping.entity_id,
                mapping.integration
            );
        }
        match existing {
            Some(pos) => {
                let row = &mut mappings[pos];
                row.entity_id = mapping.entity_id;
                row.metadata = mapping.metadata;
                row.updated_at = mapping.updated_at;
            }
            None => mappings.push(mapping),
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MakeMethodStore for MemoryStore {
    async fn get_make_method(&self, tx: &mut MemoryTx, id: &Id) -> Result<Option<MakeMethod>> {
        self.record("get_make_method");
        Ok(tx.state.make_methods.iter().find(|m| &m.id == id).cloned())
    }

    async fn list_make_methods_for_item(
        &self,
        tx: &mut MemoryTx,
        item_id: &Id,
    ) -> Result<Vec<MakeMethod>> {
        self.record("list_make_methods_for_item");
        Ok(tx
            .state
            .methods_for_item(item_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn insert_make_method(
        &self,
        tx: &mut MemoryTx,
        method: MakeMethod,
    ) -> Result<MakeMethod> {
        self.record("insert_make_method");
        self.check(FailPoint::InsertMakeMethod)?;
        let methods = &tx.state.make_methods;
        if methods
            .iter()
            .any(|m| m.item_id == method.item_id && m.version == method.version)
        {
            bail!(
                "make method version {} already exists for item {}",
                method.version,
                method.item_id
            );
        }
        if method.status == MakeMethodStatus::Draft
            && methods
                .iter()
                .any(|m| m.item_id == method.item_id && m.is_draft())
        {
            bail!("item {} already has a draft make method", method.item_id);
        }
        tx.state.make_methods.push(method.clone());
        Ok(method)
    }

    async fn lock_item_methods(&self, _tx: &mut MemoryTx, _item_id: &Id) -> Result<()> {
        self.record("lock_item_methods");
        Ok(())
    }

    async fn list_operations(
        &self,
        tx: &mut MemoryTx,
        make_method_id: &Id,
    ) -> Result<Vec<MethodOperation>> {
        self.record("list_operations");
        Ok(tx
            .state
            .operations_for(make_method_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn insert_operation(
        &self,
        tx: &mut MemoryTx,
        operation: MethodOperation,
    ) -> Result<MethodOperation> {
        self.record("insert_operation");
        self.check(FailPoint::InsertOperation)?;
        tx.state.operations.push(operation.clone());
        Ok(operation)
    }

    async fn list_operation_tools(
        &self,
        tx: &mut MemoryTx,
        operation_id: &Id,
    ) -> Result<Vec<OperationTool>> {
        self.record("list_operation_tools");
        Ok(tx
            .state
            .operation_tools
            .iter()
            .filter(|t| &t.operation_id == operation_id)
            .cloned()
            .collect())
    }

    async fn insert_operation_tools(
        &self,
        tx: &mut MemoryTx,
        tools: Vec<OperationTool>,
    ) -> Result<()> {
        self.record("insert_operation_tools");
        tx.state.operation_tools.extend(tools);
        Ok(())
    }

    async fn list_operation_parameters(
        &self,
        tx: &mut MemoryTx,
        operation_id: &Id,
    ) -> Result<Vec<OperationParameter>> {
        self.record("list_operation_parameters");
        Ok(tx
            .state
            .operation_parameters
            .iter()
            .filter(|p| &p.operation_id == operation_id)
            .cloned()
            .collect())
    }

    async fn insert_operation_parameters(
        &self,
        tx: &mut MemoryTx,
        parameters: Vec<OperationParameter>,
    ) -> Result<()> {
        self.record("insert_operation_parameters");
        tx.state.operation_parameters.extend(parameters);
        Ok(())
    }

    async fn list_operation_steps(
        &self,
        tx: &mut MemoryTx,
        operation_id: &Id,
    ) -> Result<Vec<OperationStep>> {
        self.record("list_operation_steps");
        Ok(tx
            .state
            .operation_steps
            .iter()
            .filter(|s| &s.operation_id == operation_id)
            .cloned()
            .collect())
    }

    async fn insert_operation_steps(
        &self,
        tx: &mut MemoryTx,
        steps: Vec<OperationStep>,
    ) -> Result<()> {
        self.record("insert_operation_steps");
        tx.state.operation_steps.extend(steps);
        Ok(())
    }
}

#[async_trait::async_trait]
impl MaterialStore for MemoryStore {
    async fn delete_materials(&self, tx: &mut MemoryTx, make_method_id: &Id) -> Result<u64> {
        self.record("delete_materials");
        self.check(FailPoint::DeleteMaterials)?;
        let before = tx.state.materials.len();
        tx.state
            .materials
            .retain(|m| &m.make_method_id != make_method_id);
        Ok((before - tx.state.materials.len()) as u64)
    }

    async fn insert_materials(
        &self,
        tx: &mut MemoryTx,
        materials: Vec<MethodMaterial>,
    ) -> Result<()> {
        self.record("insert_materials");
        self.check(FailPoint::InsertMaterials)?;
        tx.state.materials.extend(materials);
        Ok(())
    }
}

impl Store for MemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemType, MethodType, NewItem, ReplenishmentSystem};

    fn bolt() -> Item {
        NewItem {
            readable_id: "BOLT-M6".to_string(),
            revision: "0".to_string(),
            name: "Bolt".to_string(),
            item_type: ItemType::Part,
            unit_of_measure_code: "EA".to_string(),
            replenishment_system: ReplenishmentSystem::Buy,
            default_method_type: MethodType::Buy,
            company_id: "co-1".to_string(),
            created_by: "user-1".to_string(),
        }
        .into_item()
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        store.insert_item(&mut tx, bolt()).await.unwrap();
        store.rollback(tx).await.unwrap();
        assert!(store.snapshot().items.is_empty());

        let mut tx = store.begin().await.unwrap();
        store.insert_item(&mut tx, bolt()).await.unwrap();
        store.commit(tx).await.unwrap();
        assert_eq!(store.snapshot().items.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_item_is_rejected() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        store.insert_item(&mut tx, bolt()).await.unwrap();
        assert!(store.insert_item(&mut tx, bolt()).await.is_err());
    }

    #[tokio::test]
    async fn test_second_draft_is_rejected() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let item_id = "item-1".to_string();
        let company_id = "co-1".to_string();
        let user_id = "user-1".to_string();

        store
            .insert_make_method(&mut tx, MakeMethod::new_draft(&item_id, 1, &company_id, &user_id))
            .await
            .unwrap();
        let err = store
            .insert_make_method(&mut tx, MakeMethod::new_draft(&item_id, 2, &company_id, &user_id))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already has a draft"));
    }

    #[tokio::test]
    async fn test_mapping_upsert_by_entity_overwrites_external_id() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let item_id = "item-1".to_string();
        let company_id = "co-1".to_string();

        let first = ExternalIntegrationMapping::for_item(
            &item_id,
            "onshape",
            "ext-1".to_string(),
            serde_json::json!({}),
            &company_id,
        );
        let second = ExternalIntegrationMapping::for_item(
            &item_id,
            "onshape",
            "ext-2".to_string(),
            serde_json::json!({"material": "steel"}),
            &company_id,
        );
        store.upsert_mapping_by_entity(&mut tx, first).await.unwrap();
        store.upsert_mapping_by_entity(&mut tx, second).await.unwrap();

        assert_eq!(tx.state.mappings.len(), 1);
        assert_eq!(tx.state.mappings[0].external_id, "ext-2");
        assert_eq!(
            store
                .find_mapped_entity(&mut tx, "onshape", "ext-2", EntityType::Item, &company_id)
                .await
                .unwrap(),
            Some(item_id)
        );
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_on(FailPoint::InsertMaterials);
        let mut tx = store.begin().await.unwrap();

        assert!(store.insert_materials(&mut tx, Vec::new()).await.is_err());
        store.clear_failure();
        assert!(store.insert_materials(&mut tx, Vec::new()).await.is_ok());
        assert_eq!(store.call_count("insert_materials"), 2);
    }
}
