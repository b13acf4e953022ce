use log::debug;

use crate::logic::context::SyncContext;
use crate::logic::error::SyncError;
use crate::model::{
    BomRow, EntityType, ExternalIntegrationMapping, Id, Item, ItemType, NewItem, Part,
};
use crate::store::traits::Store;

/// Resolve the catalog item a BOM row refers to, creating it when needed.
pub async fn resolve_item<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    ctx: &mut SyncContext,
    row: &BomRow,
) -> Result<Item, SyncError> {
    match row.existing_item_id() {
        Some(item_id) => resolve_by_id(store, tx, ctx, row, item_id).await,
        None => resolve_by_natural_key(store, tx, ctx, row).await,
    }
}

/// Row already carries a catalog id from an earlier sync
async fn resolve_by_id<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    ctx: &mut SyncContext,
    row: &BomRow,
    item_id: &Id,
) -> Result<Item, SyncError> {
    if let Some(item) = ctx.item_by_id(item_id) {
        return Ok(item.clone());
    }

    let item = store
        .get_item(tx, &ctx.company_id, item_id)
        .await?
        .ok_or_else(|| SyncError::ItemNotFound(item_id.clone()))?;

    store.touch_item(tx, &item.id, &ctx.user_id).await?;
    let external_id = row.external_id(&ctx.default_revision);
    let holder = mapped_item(store, tx, ctx, &external_id).await?;
    if owns_external_id(holder.as_ref(), &item) {
        store
            .upsert_mapping_by_entity(tx, mapping_for(ctx, row, &item))
            .await?;
    }

    ctx.stats.items_reused += 1;
    ctx.remember_item(None, &item);
    Ok(item)
}

async fn resolve_by_natural_key<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    ctx: &mut SyncContext,
    row: &BomRow,
) -> Result<Item, SyncError> {
    let natural_key = row.natural_key(&ctx.default_revision);
    if let Some(item) = ctx.item_by_key(&natural_key) {
        return Ok(item.clone());
    }

    let readable_id = row.readable_id_or_name().to_string();
    let revision = row.revision_or(&ctx.default_revision).to_string();
    let external_id = row.external_id(&ctx.default_revision);

    // An explicit readable id outranks a part id shared by different parts
    let holder = mapped_item(store, tx, ctx, &external_id).await?;
    let mapped = holder.clone().filter(|item| {
        !row.has_readable_id() || (item.readable_id == readable_id && item.revision == revision)
    });
    let existing = match mapped {
        Some(item) => Some(item),
        None => {
            store
                .find_item_by_readable_id(tx, &ctx.company_id, &readable_id, &revision)
                .await?
        }
    };

    let item = match existing {
        Some(item) => {
            debug!("Reusing item {} ({} rev {})", item.id, readable_id, revision);
            store.touch_item(tx, &item.id, &ctx.user_id).await?;
            if owns_external_id(holder.as_ref(), &item) {
                store
                    .upsert_mapping_by_entity(tx, mapping_for(ctx, row, &item))
                    .await?;
            }
            ctx.stats.items_reused += 1;
            item
        }
        None => {
            let new_item = NewItem {
                readable_id: readable_id.clone(),
                revision: revision.clone(),
                name: row.name.clone(),
                item_type: ItemType::Part,
                unit_of_measure_code: ctx.default_unit_of_measure.clone(),
                replenishment_system: row.replenishment_system,
                default_method_type: row.default_method_type,
                company_id: ctx.company_id.clone(),
                created_by: ctx.user_id.clone(),
            };
            let item = store
                .insert_item(tx, new_item.into_item())
                .await?
                .ok_or(SyncError::ItemCreation {
                    readable_id,
                    revision,
                })?;

            store.upsert_part(tx, Part::for_item(&item)).await?;
            if owns_external_id(holder.as_ref(), &item) {
                store
                    .upsert_mapping_by_external_id(tx, mapping_for(ctx, row, &item))
                    .await?;
            }

            debug!("Created item {} ({} rev {})", item.id, item.readable_id, item.revision);
            ctx.stats.items_created += 1;
            item
        }
    };

    ctx.remember_item(Some(natural_key), &item);
    Ok(item)
}

/// Item the external id is currently mapped to, if that item still exists
async fn mapped_item<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    ctx: &SyncContext,
    external_id: &str,
) -> Result<Option<Item>, SyncError> {
    let entity_id = store
        .find_mapped_entity(tx, ctx.integration, external_id, EntityType::Item, &ctx.company_id)
        .await?;
    match entity_id {
        Some(entity_id) => Ok(store.get_item(tx, &ctx.company_id, &entity_id).await?),
        None => Ok(None),
    }
}

/// False when the external id already belongs to another live item
fn owns_external_id(holder: Option<&Item>, item: &Item) -> bool {
    match holder {
        Some(holder) if holder.id != item.id => {
            debug!(
                "External id of item {} is already mapped to item {}, keeping that mapping",
                item.id, holder.id
            );
            false
        }
        _ => true,
    }
}

fn mapping_for(ctx: &SyncContext, row: &BomRow, item: &Item) -> ExternalIntegrationMapping {
    ExternalIntegrationMapping::for_item(
        &item.id,
        ctx.integration,
        row.external_id(&ctx.default_revision),
        row.metadata(),
        &ctx.company_id,
    )
}
