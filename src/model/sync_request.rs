use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::logic::tree::index_segments;
use crate::model::{Id, MethodType, ReplenishmentSystem, SyncSource};

/// Rejection of a sync payload before any store access
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid sync payload: {0}")]
    Malformed(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid BOM index {0:?}: expected dot separated integers")]
    InvalidIndex(String),
    #[error("duplicate BOM index {0:?}")]
    DuplicateIndex(String),
    #[error("invalid quantity {quantity} at BOM index {index:?}")]
    InvalidQuantity { index: String, quantity: f64 },
}

/// One flat row of a CAD bill of materials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomRow {
    /// Dotted position in the assembly, e.g. "1.2.10"
    pub index: String,
    pub id: Option<Id>,
    pub readable_id: Option<String>,
    pub revision: Option<String>,
    pub name: String,
    pub quantity: Option<f64>,
    pub replenishment_system: ReplenishmentSystem,
    pub default_method_type: MethodType,
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl BomRow {
    /// Catalog item id carried over from an earlier sync, if any
    pub fn existing_item_id(&self) -> Option<&Id> {
        self.id.as_ref().filter(|id| !id.trim().is_empty())
    }

    /// True when the row names its readable id instead of relying on `name`
    pub fn has_readable_id(&self) -> bool {
        self.readable_id
            .as_deref()
            .is_some_and(|readable_id| !readable_id.trim().is_empty())
    }

    pub fn readable_id_or_name(&self) -> &str {
        match self.readable_id.as_deref() {
            Some(readable_id) if !readable_id.trim().is_empty() => readable_id,
            _ => &self.name,
        }
    }

    pub fn revision_or<'a>(&'a self, default_revision: &'a str) -> &'a str {
        match self.revision.as_deref() {
            Some(revision) if !revision.trim().is_empty() => revision,
            _ => default_revision,
        }
    }

    /// Key used to deduplicate items created within one sync
    pub fn natural_key(&self, default_revision: &str) -> String {
        format!(
            "{}\u{1f}{}",
            self.readable_id_or_name(),
            self.revision_or(default_revision)
        )
    }

    /// Identifier the CAD tool knows this row by
    pub fn external_id(&self, default_revision: &str) -> String {
        ["partId", "id"]
            .iter()
            .find_map(|key| match self.data.get(*key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_else(|| {
                format!(
                    "{}.{}",
                    self.readable_id_or_name(),
                    self.revision_or(default_revision)
                )
            })
    }

    pub fn quantity_or_default(&self) -> f64 {
        self.quantity.unwrap_or(1.0)
    }

    pub fn metadata(&self) -> serde_json::Value {
        serde_json::Value::Object(self.data.clone())
    }
}

/// Body of `POST /sync`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    #[serde(rename = "type")]
    pub source: SyncSource,
    pub make_method_id: Id,
    pub data: Vec<BomRow>,
    pub company_id: Id,
    pub user_id: Id,
}

impl SyncRequest {
    /// Deserialize and validate a raw request body
    pub fn parse(body: &[u8]) -> Result<Self, ValidationError> {
        let request: SyncRequest = serde_json::from_slice(body)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.make_method_id.trim().is_empty() {
            return Err(ValidationError::MissingField("makeMethodId"));
        }
        if self.company_id.trim().is_empty() {
            return Err(ValidationError::MissingField("companyId"));
        }
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("userId"));
        }

        let mut seen = HashSet::new();
        for row in &self.data {
            if index_segments(&row.index).is_none() {
                return Err(ValidationError::InvalidIndex(row.index.clone()));
            }
            if !seen.insert(row.index.as_str()) {
                return Err(ValidationError::DuplicateIndex(row.index.clone()));
            }
            if let Some(quantity) = row.quantity {
                if !quantity.is_finite() || quantity < 0.0 {
                    return Err(ValidationError::InvalidQuantity {
                        index: row.index.clone(),
                        quantity,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Body of a successful sync response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    pub make_method_id: Id,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget_payload() -> serde_json::Value {
        json!({
            "type": "onshape",
            "makeMethodId": "mm-top",
            "companyId": "co-1",
            "userId": "user-1",
            "data": [
                {"index": "1", "name": "Widget", "quantity": 1, "replenishmentSystem": "Make", "defaultMethodType": "Make", "data": {}},
                {"index": "1.1", "name": "Screw", "quantity": 4, "replenishmentSystem": "Buy", "defaultMethodType": "Buy", "data": {"partId": "JHD"}}
            ]
        })
    }

    #[test]
    fn test_parse_valid_payload() {
        let body = serde_json::to_vec(&widget_payload()).unwrap();
        let request = SyncRequest::parse(&body).unwrap();

        assert_eq!(request.source, SyncSource::Onshape);
        assert_eq!(request.data.len(), 2);
        assert_eq!(request.data[1].quantity_or_default(), 4.0);
        assert_eq!(request.data[1].external_id("0"), "JHD");
        assert_eq!(request.data[0].external_id("0"), "Widget.0");
    }

    #[test]
    fn test_missing_company_id_is_malformed() {
        let mut payload = widget_payload();
        payload.as_object_mut().unwrap().remove("companyId");
        let body = serde_json::to_vec(&payload).unwrap();

        let err = SyncRequest::parse(&body).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(ref msg) if msg.contains("companyId")));
    }

    #[test]
    fn test_blank_user_id_is_rejected() {
        let mut payload = widget_payload();
        payload["userId"] = json!("  ");
        let body = serde_json::to_vec(&payload).unwrap();

        assert_eq!(
            SyncRequest::parse(&body).unwrap_err(),
            ValidationError::MissingField("userId")
        );
    }

    #[test]
    fn test_bad_and_duplicate_indices_are_rejected() {
        let mut payload = widget_payload();
        payload["data"][1]["index"] = json!("1.a");
        let body = serde_json::to_vec(&payload).unwrap();
        assert_eq!(
            SyncRequest::parse(&body).unwrap_err(),
            ValidationError::InvalidIndex("1.a".to_string())
        );

        payload["data"][1]["index"] = json!("1");
        let body = serde_json::to_vec(&payload).unwrap();
        assert_eq!(
            SyncRequest::parse(&body).unwrap_err(),
            ValidationError::DuplicateIndex("1".to_string())
        );
    }

    #[test]
    fn test_unknown_source_type_is_rejected() {
        let mut payload = widget_payload();
        payload["type"] = json!("solidworks");
        let body = serde_json::to_vec(&payload).unwrap();

        assert!(matches!(
            SyncRequest::parse(&body),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_quantity_defaults_to_one() {
        let mut payload = widget_payload();
        payload["data"][1].as_object_mut().unwrap().remove("quantity");
        let body = serde_json::to_vec(&payload).unwrap();

        let request = SyncRequest::parse(&body).unwrap();
        assert_eq!(request.data[1].quantity_or_default(), 1.0);
    }

    #[test]
    fn test_natural_key_falls_back_to_name_and_default_revision() {
        let mut payload = widget_payload();
        payload["data"][1]["readableId"] = json!("SCR-M4");
        let body = serde_json::to_vec(&payload).unwrap();
        let request = SyncRequest::parse(&body).unwrap();

        assert_eq!(request.data[0].natural_key("0"), "Widget\u{1f}0");
        assert_eq!(request.data[1].natural_key("A"), "SCR-M4\u{1f}A");
    }
}
