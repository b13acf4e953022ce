use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{EntityType, Id};

/// Association between a catalog entity and its id in an external system.
///
/// Two natural keys identify a mapping: the catalog side
/// `(entity_type, entity_id, integration, company_id)` and the external side
/// `(integration, external_id, entity_type, company_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIntegrationMapping {
    pub entity_type: EntityType,
    pub entity_id: Id,
    pub integration: String,
    pub external_id: String,
    pub metadata: serde_json::Value,
    pub company_id: Id,
    pub updated_at: DateTime<Utc>,
}

impl ExternalIntegrationMapping {
    pub fn for_item(
        item_id: &Id,
        integration: &str,
        external_id: String,
        metadata: serde_json::Value,
        company_id: &Id,
    ) -> Self {
        Self {
            entity_type: EntityType::Item,
            entity_id: item_id.clone(),
            integration: integration.to_string(),
            external_id,
            metadata,
            company_id: company_id.clone(),
            updated_at: Utc::now(),
        }
    }

    pub fn same_entity(&self, other: &Self) -> bool {
        self.entity_type == other.entity_type
            && self.entity_id == other.entity_id
            && self.integration == other.integration
            && self.company_id == other.company_id
    }

    pub fn same_external(&self, other: &Self) -> bool {
        self.integration == other.integration
            && self.external_id == other.external_id
            && self.entity_type == other.entity_type
            && self.company_id == other.company_id
    }
}
