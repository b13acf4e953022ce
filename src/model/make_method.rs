use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{generate_id, Id, ItemType, MakeMethodStatus, MethodType};

/// A versioned manufacturing recipe for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeMethod {
    pub id: Id,
    pub item_id: Id,
    pub version: i32,
    pub status: MakeMethodStatus,
    pub company_id: Id,
    pub created_by: Id,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<Id>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MakeMethod {
    pub fn is_draft(&self) -> bool {
        self.status == MakeMethodStatus::Draft
    }

    /// Start a new draft version for an item
    pub fn new_draft(item_id: &Id, version: i32, company_id: &Id, created_by: &Id) -> Self {
        Self {
            id: generate_id(),
            item_id: item_id.clone(),
            version,
            status: MakeMethodStatus::Draft,
            company_id: company_id.clone(),
            created_by: created_by.clone(),
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        }
    }
}

/// Edge from a parent make method to a child item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodMaterial {
    pub id: Id,
    pub make_method_id: Id,
    pub material_make_method_id: Option<Id>,
    pub item_id: Id,
    pub item_type: ItemType,
    pub method_type: MethodType,
    pub order: i32,
    pub quantity: f64,
    pub unit_of_measure_code: String,
    pub company_id: Id,
    pub created_by: Id,
    pub created_at: DateTime<Utc>,
}

/// One manufacturing step of a make method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodOperation {
    pub id: Id,
    pub make_method_id: Id,
    pub order: f64,
    pub operation_type: String,
    pub process_id: Option<Id>,
    pub work_center_id: Option<Id>,
    pub description: Option<String>,
    pub setup_time: f64,
    pub labor_time: f64,
    pub machine_time: f64,
    pub company_id: Id,
    pub created_by: Id,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<Id>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MethodOperation {
    /// Copy into another make method with fresh audit fields
    pub fn clone_into(&self, make_method_id: &Id, created_by: &Id) -> Self {
        Self {
            id: generate_id(),
            make_method_id: make_method_id.clone(),
            created_by: created_by.clone(),
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationTool {
    pub id: Id,
    pub operation_id: Id,
    pub tool_id: Id,
    pub quantity: f64,
    pub company_id: Id,
    pub created_by: Id,
    pub created_at: DateTime<Utc>,
}

impl OperationTool {
    pub fn clone_into(&self, operation_id: &Id, created_by: &Id) -> Self {
        Self {
            id: generate_id(),
            operation_id: operation_id.clone(),
            created_by: created_by.clone(),
            created_at: Utc::now(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationParameter {
    pub id: Id,
    pub operation_id: Id,
    pub key: String,
    pub value: String,
    pub company_id: Id,
    pub created_by: Id,
    pub created_at: DateTime<Utc>,
}

impl OperationParameter {
    pub fn clone_into(&self, operation_id: &Id, created_by: &Id) -> Self {
        Self {
            id: generate_id(),
            operation_id: operation_id.clone(),
            created_by: created_by.clone(),
            created_at: Utc::now(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStep {
    pub id: Id,
    pub operation_id: Id,
    pub name: String,
    pub description: Option<String>,
    pub step_type: String,
    pub sort_order: i32,
    pub company_id: Id,
    pub created_by: Id,
    pub created_at: DateTime<Utc>,
}

impl OperationStep {
    pub fn clone_into(&self, operation_id: &Id, created_by: &Id) -> Self {
        Self {
            id: generate_id(),
            operation_id: operation_id.clone(),
            created_by: created_by.clone(),
            created_at: Utc::now(),
            ..self.clone()
        }
    }
}
