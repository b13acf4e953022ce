use chrono::Utc;
use log::debug;

use crate::logic::context::SyncContext;
use crate::logic::error::SyncError;
use crate::model::{generate_id, BomRow, Id, Item, MethodMaterial, MethodType};
use crate::store::traits::Store;

/// A resolved child of one tree level, not yet written
#[derive(Debug, Clone)]
pub struct MaterialLine {
    pub item: Item,
    pub quantity: f64,
    pub method_type: MethodType,
    pub material_make_method_id: Option<Id>,
}

impl MaterialLine {
    pub fn new(item: Item, row: &BomRow, material_make_method_id: Option<Id>) -> Self {
        let method_type = if material_make_method_id.is_some() {
            MethodType::Make
        } else {
            row.default_method_type
        };

        Self {
            item,
            quantity: row.quantity_or_default(),
            method_type,
            material_make_method_id,
        }
    }
}

/// Drop every material of a make method before its children are re-resolved
pub async fn clear_materials<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    make_method_id: &Id,
) -> Result<u64, SyncError> {
    let removed = store.delete_materials(tx, make_method_id).await?;
    if removed > 0 {
        debug!("Removed {} materials from make method {}", removed, make_method_id);
    }
    Ok(removed)
}

/// Insert one material per line, ordered by position among siblings
pub async fn write_materials<S: Store>(
    store: &S,
    tx: &mut S::Tx,
    ctx: &mut SyncContext,
    make_method_id: &Id,
    lines: Vec<MaterialLine>,
) -> Result<usize, SyncError> {
    let now = Utc::now();
    let materials: Vec<MethodMaterial> = lines
        .into_iter()
        .enumerate()
        .map(|(order, line)| MethodMaterial {
            id: generate_id(),
            make_method_id: make_method_id.clone(),
            material_make_method_id: line.material_make_method_id,
            item_id: line.item.id,
            item_type: line.item.item_type,
            method_type: line.method_type,
            order: order as i32,
            quantity: line.quantity,
            unit_of_measure_code: line.item.unit_of_measure_code,
            company_id: ctx.company_id.clone(),
            created_by: ctx.user_id.clone(),
            created_at: now,
        })
        .collect();

    let written = materials.len();
    store.insert_materials(tx, materials).await?;

    ctx.stats.methods_rewritten += 1;
    ctx.stats.materials_written += written;
    debug!("Wrote {} materials to make method {}", written, make_method_id);
    Ok(written)
}
