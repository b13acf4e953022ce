use serde::Serialize;
use std::collections::HashMap;

use crate::config::SyncConfig;
use crate::model::{Id, Item, SyncSource};

/// Counters reported at the end of a sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub items_created: usize,
    pub items_reused: usize,
    pub drafts_created: usize,
    pub operations_cloned: usize,
    pub methods_rewritten: usize,
    pub materials_written: usize,
}

/// Per-run state of one sync. Lives exactly as long as its transaction.
///
/// Several tree nodes may resolve to the same item, so item and make method
/// resolutions are remembered here instead of re-queried.
#[derive(Debug)]
pub struct SyncContext {
    pub company_id: Id,
    pub user_id: Id,
    pub integration: &'static str,
    pub default_unit_of_measure: String,
    pub default_revision: String,
    pub stats: SyncStats,
    items_by_key: HashMap<String, Item>,
    items_by_id: HashMap<Id, Item>,
    methods_by_item: HashMap<Id, Id>,
    /// Make methods already written, and whether they were written with children
    written_methods: HashMap<Id, bool>,
}

impl SyncContext {
    pub fn new(source: SyncSource, company_id: Id, user_id: Id, config: &SyncConfig) -> Self {
        Self {
            company_id,
            user_id,
            integration: source.as_str(),
            default_unit_of_measure: config.default_unit_of_measure.clone(),
            default_revision: config.default_revision.clone(),
            stats: SyncStats::default(),
            items_by_key: HashMap::new(),
            items_by_id: HashMap::new(),
            methods_by_item: HashMap::new(),
            written_methods: HashMap::new(),
        }
    }

    pub fn item_by_key(&self, natural_key: &str) -> Option<&Item> {
        self.items_by_key.get(natural_key)
    }

    pub fn item_by_id(&self, id: &str) -> Option<&Item> {
        self.items_by_id.get(id)
    }

    pub fn remember_item(&mut self, natural_key: Option<String>, item: &Item) {
        if let Some(key) = natural_key {
            self.items_by_key.insert(key, item.clone());
        }
        self.items_by_id.insert(item.id.clone(), item.clone());
    }

    pub fn method_for_item(&self, item_id: &str) -> Option<&Id> {
        self.methods_by_item.get(item_id)
    }

    pub fn remember_method(&mut self, item_id: &Id, make_method_id: &Id) {
        self.methods_by_item
            .insert(item_id.clone(), make_method_id.clone());
    }

    /// Claim a make method for material rewriting.
    ///
    /// The first occurrence with children wins. An occurrence without children
    /// only claims a make method nothing has written yet, and is replaced by a
    /// later occurrence that has children.
    pub fn claim_method(&mut self, make_method_id: &Id, has_children: bool) -> bool {
        match self.written_methods.get(make_method_id) {
            Some(&written_with_children) if written_with_children || !has_children => false,
            _ => {
                self.written_methods
                    .insert(make_method_id.clone(), has_children);
                true
            }
        }
    }
}
