use log::{debug, info};

use crate::logic::context::SyncContext;
use crate::logic::error::SyncError;
use crate::model::{Id, MakeMethod, MakeMethodStatus};
use crate::store::traits::Store;

/// Make method id of the draft that a sync may write to for `item_id`.
///
/// | existing versions      | result                                   |
/// |------------------------|------------------------------------------|
/// | none                   | new version 1 draft                      |
/// | a draft                | that draft                               |
/// | active, no draft       | new max+1 draft cloned from the active   |
/// | archived only          | new max+1 draft, nothing cloned          |
pub async fn ensure_draft<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    ctx: &mut SyncContext,
    item_id: &Id,
) -> Result<Id, SyncError> {
    if let Some(make_method_id) = ctx.method_for_item(item_id) {
        return Ok(make_method_id.clone());
    }

    store.lock_item_methods(tx, item_id).await?;
    let versions = store.list_make_methods_for_item(tx, item_id).await?;
    let make_method_id = draft_from_versions(store, tx, ctx, item_id, &versions, None).await?;

    ctx.remember_method(item_id, &make_method_id);
    Ok(make_method_id)
}

/// Resolve the make method a sync targets. A target that is not a draft is
/// never written to: its item's draft is used instead, and a draft created
/// here starts as a copy of the target.
pub async fn ensure_top_level_draft<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    ctx: &mut SyncContext,
    make_method_id: &Id,
) -> Result<Id, SyncError> {
    let target = store
        .get_make_method(tx, make_method_id)
        .await?
        .filter(|method| method.company_id == ctx.company_id)
        .ok_or_else(|| SyncError::MakeMethodNotFound(make_method_id.clone()))?;

    let draft_id = if target.is_draft() {
        target.id.clone()
    } else {
        store.lock_item_methods(tx, &target.item_id).await?;
        let versions = store.list_make_methods_for_item(tx, &target.item_id).await?;
        draft_from_versions(store, tx, ctx, &target.item_id, &versions, Some(&target)).await?
    };

    ctx.remember_method(&target.item_id, &draft_id);
    Ok(draft_id)
}

async fn draft_from_versions<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    ctx: &mut SyncContext,
    item_id: &Id,
    versions: &[MakeMethod],
    clone_source: Option<&MakeMethod>,
) -> Result<Id, SyncError> {
    if let Some(draft) = versions.iter().find(|method| method.is_draft()) {
        debug!(
            "Reusing draft make method {} (v{}) for item {}",
            draft.id, draft.version, item_id
        );
        return Ok(draft.id.clone());
    }

    let next_version = versions.iter().map(|m| m.version).max().unwrap_or(0) + 1;
    let draft = store
        .insert_make_method(
            tx,
            MakeMethod::new_draft(item_id, next_version, &ctx.company_id, &ctx.user_id),
        )
        .await?;
    ctx.stats.drafts_created += 1;

    let clone_source = clone_source.or_else(|| {
        versions
            .iter()
            .rev()
            .find(|method| method.status == MakeMethodStatus::Active)
    });

    match clone_source {
        Some(source) => {
            let cloned = clone_operations(store, tx, ctx, &source.id, &draft.id).await?;
            info!(
                "Created draft make method {} (v{}) for item {} from {} with {} operations",
                draft.id, draft.version, item_id, source.id, cloned
            );
        }
        None => {
            info!(
                "Created draft make method {} (v{}) for item {}",
                draft.id, draft.version, item_id
            );
        }
    }

    Ok(draft.id)
}

/// Copy every operation of `source_id`, with its tools, parameters and steps,
/// into `target_id`. Returns the number of operations copied.
pub async fn clone_operations<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    ctx: &mut SyncContext,
    source_id: &Id,
    target_id: &Id,
) -> Result<usize, SyncError> {
    let operations = store.list_operations(tx, source_id).await?;

    for operation in &operations {
        let cloned = store
            .insert_operation(tx, operation.clone_into(target_id, &ctx.user_id))
            .await?;

        let tools = store
            .list_operation_tools(tx, &operation.id)
            .await?
            .iter()
            .map(|tool| tool.clone_into(&cloned.id, &ctx.user_id))
            .collect();
        store.insert_operation_tools(tx, tools).await?;

        let parameters = store
            .list_operation_parameters(tx, &operation.id)
            .await?
            .iter()
            .map(|parameter| parameter.clone_into(&cloned.id, &ctx.user_id))
            .collect();
        store.insert_operation_parameters(tx, parameters).await?;

        let steps = store
            .list_operation_steps(tx, &operation.id)
            .await?
            .iter()
            .map(|step| step.clone_into(&cloned.id, &ctx.user_id))
            .collect();
        store.insert_operation_steps(tx, steps).await?;
    }

    ctx.stats.operations_cloned += operations.len();
    Ok(operations.len())
}
