use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::SyncConfig;
use crate::logic::context::{SyncContext, SyncStats};
use crate::logic::error::SyncError;
use crate::logic::materials::{self, MaterialLine};
use crate::logic::tree::Forest;
use crate::logic::{items, versions};
use crate::model::{BomRow, Id, MethodType, SyncRequest};
use crate::store::traits::Store;

/// Result of a committed sync
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub make_method_id: Id,
    pub stats: SyncStats,
}

/// One make method whose materials are still to be rewritten, with the
/// forest slots of its children
struct PendingLevel {
    make_method_id: Id,
    slots: Vec<usize>,
}

/// Apply a CAD bill of materials to the catalog in a single transaction.
///
/// Either every item, draft and material edge of the payload is committed,
/// or nothing is.
pub async fn sync_bom<S: Store>(
    store: &S,
    request: SyncRequest,
    config: &SyncConfig,
) -> Result<SyncOutcome, SyncError> {
    request.validate()?;

    let SyncRequest {
        source,
        make_method_id,
        data,
        company_id,
        user_id,
    } = request;

    let forest = Forest::build(data, |row: &BomRow| row.index.as_str());
    let mut ctx = SyncContext::new(source, company_id, user_id, config);
    info!(
        "Syncing {} BOM rows from {} into make method {} (company {})",
        forest.len(),
        source,
        make_method_id,
        ctx.company_id
    );

    let mut tx = store.begin().await?;

    match apply_forest(store, &mut tx, &mut ctx, &forest, &make_method_id).await {
        Ok(draft_id) => {
            if let Err(err) = store.commit(tx).await {
                error!(
                    "Failed to commit BOM sync for make method {} (company {}, user {}): {:#}",
                    make_method_id, ctx.company_id, ctx.user_id, err
                );
                return Err(err.into());
            }

            info!(
                "BOM sync committed to make method {}: {:?}",
                draft_id, ctx.stats
            );
            Ok(SyncOutcome {
                make_method_id: draft_id,
                stats: ctx.stats,
            })
        }
        Err(err) => {
            error!(
                "BOM sync failed for make method {} (company {}, user {}): {}",
                make_method_id, ctx.company_id, ctx.user_id, err
            );
            if let Err(rollback_err) = store.rollback(tx).await {
                warn!("Failed to roll back BOM sync: {:#}", rollback_err);
            }
            Err(err)
        }
    }
}

/// Walk the forest depth first, rewriting each make method's materials
/// before descending into its made children.
async fn apply_forest<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    ctx: &mut SyncContext,
    forest: &Forest<BomRow>,
    make_method_id: &Id,
) -> Result<Id, SyncError> {
    let top_level_id = versions::ensure_top_level_draft(store, tx, ctx, make_method_id).await?;

    let mut pending = vec![PendingLevel {
        make_method_id: top_level_id.clone(),
        slots: forest.roots().to_vec(),
    }];

    while let Some(level) = pending.pop() {
        if !ctx.claim_method(&level.make_method_id, !level.slots.is_empty()) {
            debug!(
                "Make method {} already written in this sync, skipping",
                level.make_method_id
            );
            continue;
        }

        materials::clear_materials(store, tx, &level.make_method_id).await?;

        let mut lines = Vec::with_capacity(level.slots.len());
        let mut children = Vec::new();

        for &slot in &level.slots {
            let node = forest.node(slot);
            let row = &node.record;
            let item = items::resolve_item(store, tx, ctx, row).await?;

            let made = !node.children.is_empty() || row.default_method_type == MethodType::Make;
            let child_method_id = if made {
                Some(versions::ensure_draft(store, tx, ctx, &item.id).await?)
            } else {
                None
            };

            if let Some(child_method_id) = &child_method_id {
                children.push(PendingLevel {
                    make_method_id: child_method_id.clone(),
                    slots: node.children.clone(),
                });
            }
            lines.push(MaterialLine::new(item, row, child_method_id));
        }

        materials::write_materials(store, tx, ctx, &level.make_method_id, lines).await?;

        // Reversed so the first child is popped first
        pending.extend(children.into_iter().rev());
    }

    Ok(top_level_id)
}
