#![allow(dead_code)]

use bom_sync::model::{
    BomRow, Item, ItemType, MakeMethod, MakeMethodStatus, MethodMaterial, MethodOperation,
    MethodType, NewItem, OperationParameter, OperationStep, OperationTool, ReplenishmentSystem,
    SyncRequest, SyncSource,
};
use chrono::Utc;
use serde_json::json;

pub const COMPANY: &str = "co-1";
pub const USER: &str = "user-1";

pub fn item(id: &str, readable_id: &str, replenishment_system: ReplenishmentSystem) -> Item {
    let mut item = NewItem {
        readable_id: readable_id.to_string(),
        revision: "0".to_string(),
        name: readable_id.to_string(),
        item_type: ItemType::Part,
        unit_of_measure_code: "EA".to_string(),
        replenishment_system,
        default_method_type: MethodType::Make,
        company_id: COMPANY.to_string(),
        created_by: "seed".to_string(),
    }
    .into_item();
    item.id = id.to_string();
    item
}

pub fn method(id: &str, item_id: &str, version: i32, status: MakeMethodStatus) -> MakeMethod {
    MakeMethod {
        id: id.to_string(),
        item_id: item_id.to_string(),
        version,
        status,
        company_id: COMPANY.to_string(),
        created_by: "seed".to_string(),
        created_at: Utc::now(),
        updated_by: None,
        updated_at: None,
    }
}

pub fn operation(id: &str, make_method_id: &str, order: f64) -> MethodOperation {
    MethodOperation {
        id: id.to_string(),
        make_method_id: make_method_id.to_string(),
        order,
        operation_type: "Inside".to_string(),
        process_id: Some("proc-cut".to_string()),
        work_center_id: Some("wc-saw".to_string()),
        description: Some(format!("Operation {}", order)),
        setup_time: 10.0,
        labor_time: 2.0,
        machine_time: 1.5,
        company_id: COMPANY.to_string(),
        created_by: "seed".to_string(),
        created_at: Utc::now(),
        updated_by: Some("seed".to_string()),
        updated_at: Some(Utc::now()),
    }
}

pub fn tool(id: &str, operation_id: &str) -> OperationTool {
    OperationTool {
        id: id.to_string(),
        operation_id: operation_id.to_string(),
        tool_id: "tool-bandsaw".to_string(),
        quantity: 1.0,
        company_id: COMPANY.to_string(),
        created_by: "seed".to_string(),
        created_at: Utc::now(),
    }
}

pub fn parameter(id: &str, operation_id: &str) -> OperationParameter {
    OperationParameter {
        id: id.to_string(),
        operation_id: operation_id.to_string(),
        key: "feed".to_string(),
        value: "120".to_string(),
        company_id: COMPANY.to_string(),
        created_by: "seed".to_string(),
        created_at: Utc::now(),
    }
}

pub fn step(id: &str, operation_id: &str) -> OperationStep {
    OperationStep {
        id: id.to_string(),
        operation_id: operation_id.to_string(),
        name: "Deburr".to_string(),
        description: None,
        step_type: "Task".to_string(),
        sort_order: 1,
        company_id: COMPANY.to_string(),
        created_by: "seed".to_string(),
        created_at: Utc::now(),
    }
}

pub fn material(id: &str, make_method_id: &str, item_id: &str, order: i32) -> MethodMaterial {
    MethodMaterial {
        id: id.to_string(),
        make_method_id: make_method_id.to_string(),
        material_make_method_id: None,
        item_id: item_id.to_string(),
        item_type: ItemType::Part,
        method_type: MethodType::Buy,
        order,
        quantity: 1.0,
        unit_of_measure_code: "EA".to_string(),
        company_id: COMPANY.to_string(),
        created_by: "seed".to_string(),
        created_at: Utc::now(),
    }
}

pub fn row(index: &str, name: &str, quantity: f64, method_type: MethodType) -> BomRow {
    let replenishment_system = match method_type {
        MethodType::Make => ReplenishmentSystem::Make,
        _ => ReplenishmentSystem::Buy,
    };
    BomRow {
        index: index.to_string(),
        id: None,
        readable_id: None,
        revision: None,
        name: name.to_string(),
        quantity: Some(quantity),
        replenishment_system,
        default_method_type: method_type,
        data: serde_json::Map::new(),
    }
}

pub fn request(make_method_id: &str, data: Vec<BomRow>) -> SyncRequest {
    SyncRequest {
        source: SyncSource::Onshape,
        make_method_id: make_method_id.to_string(),
        data,
        company_id: COMPANY.to_string(),
        user_id: USER.to_string(),
    }
}

/// The two-row Widget/Screw payload as raw JSON
pub fn widget_payload(make_method_id: &str) -> serde_json::Value {
    json!({
        "type": "onshape",
        "makeMethodId": make_method_id,
        "companyId": COMPANY,
        "userId": USER,
        "data": [
            {"index": "1", "name": "Widget", "quantity": 1, "replenishmentSystem": "Make", "defaultMethodType": "Make", "data": {}},
            {"index": "1.1", "name": "Screw", "quantity": 4, "replenishmentSystem": "Buy", "defaultMethodType": "Buy", "data": {}}
        ]
    })
}
