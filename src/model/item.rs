use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{generate_id, Id, ItemType, MethodType, ReplenishmentSystem};

/// A catalog entry, unique per company by readable id and revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Id,
    pub readable_id: String,
    pub revision: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub unit_of_measure_code: String,
    pub replenishment_system: ReplenishmentSystem,
    pub default_method_type: MethodType,
    pub company_id: Id,
    pub created_by: Id,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<Id>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields needed to insert a new catalog item
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub readable_id: String,
    pub revision: String,
    pub name: String,
    pub item_type: ItemType,
    pub unit_of_measure_code: String,
    pub replenishment_system: ReplenishmentSystem,
    pub default_method_type: MethodType,
    pub company_id: Id,
    pub created_by: Id,
}

impl NewItem {
    pub fn into_item(self) -> Item {
        Item {
            id: generate_id(),
            readable_id: self.readable_id,
            revision: self.revision,
            name: self.name,
            item_type: self.item_type,
            unit_of_measure_code: self.unit_of_measure_code,
            replenishment_system: self.replenishment_system,
            default_method_type: self.default_method_type,
            company_id: self.company_id,
            created_by: self.created_by,
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        }
    }
}

/// Part shell keyed by (readable id, company). May predate the catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: String,
    pub company_id: Id,
    pub created_by: Id,
    pub created_at: DateTime<Utc>,
}

impl Part {
    pub fn for_item(item: &Item) -> Self {
        Self {
            id: item.readable_id.clone(),
            company_id: item.company_id.clone(),
            created_by: item.created_by.clone(),
            created_at: Utc::now(),
        }
    }
}
