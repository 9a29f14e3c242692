use crate::models::LineItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ordered line items for a document that has not been finalized yet.
///
/// Item numbers are always `1..=len` in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemBuffer {
    items: Vec<LineItem>,
}

impl LineItemBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends a snapshot and returns it with its assigned item number.
    pub fn push(
        &mut self,
        code: String,
        name: String,
        unit: String,
        quantity: Decimal,
        location: Option<String>,
    ) -> &LineItem {
        let item_number = self.items.len() as i32 + 1;
        self.items.push(LineItem {
            item_number,
            code,
            name,
            unit,
            quantity,
            location,
        });
        &self.items[self.items.len() - 1]
    }

    /// Removes the item at the 0-based `index` and renumbers the rest.
    /// Out-of-range indexes leave the buffer unchanged.
    pub fn remove(&mut self, index: usize) -> Option<LineItem> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.renumber();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replaces the contents with `items`, keeping their order.
    pub fn replace(&mut self, items: Vec<LineItem>) {
        self.items = items;
        self.renumber();
    }

    fn renumber(&mut self) {
        for (position, item) in self.items.iter_mut().enumerate() {
            item.item_number = position as i32 + 1;
        }
    }
}
