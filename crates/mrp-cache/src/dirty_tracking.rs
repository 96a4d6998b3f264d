//! 異動追蹤：記錄自上次計算後有變更的物料

use std::collections::BTreeSet;

/// 待重算物料集合（依物料 ID 排序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyTracker {
    dirty_products: BTreeSet<String>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記物料需要重算（需求、庫存、BOM 或主檔有變更）
    pub fn mark_dirty(&mut self, product_id: impl Into<String>) {
        let product_id = product_id.into();
        if self.dirty_products.insert(product_id.clone()) {
            tracing::debug!("物料 {} 標記為待重算", product_id);
        }
    }

    pub fn mark_many<I, S>(&mut self, products: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for product_id in products {
            self.mark_dirty(product_id);
        }
    }

    pub fn is_dirty(&self, product_id: &str) -> bool {
        self.dirty_products.contains(product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.dirty_products.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dirty_products.len()
    }

    pub fn dirty_products(&self) -> impl Iterator<Item = &str> {
        self.dirty_products.iter().map(String::as_str)
    }

    /// 只清除已處理的物料；處理期間新標記的保留
    pub fn clear_products<'p>(&mut self, products: impl IntoIterator<Item = &'p String>) {
        for product_id in products {
            self.dirty_products.remove(product_id);
        }
    }

    /// 取出並清空
    pub fn take(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.dirty_products)
    }

    pub fn clear(&mut self) {
        self.dirty_products.clear();
    }
}
