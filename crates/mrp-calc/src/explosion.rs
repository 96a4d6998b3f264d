//! BOM 展開、反查與驗證
//!
//! 展開採用顯式堆疊（每層一個 frame），堆疊本身就是目前的祖先鏈：
//! 子件若已出現在鏈上即為循環，立即回報 [`MrpError::CircularStructure`]；
//! 經由不同分支重複出現的子件則是正常的共用件。

use std::collections::{BTreeSet, VecDeque};

use chrono::NaiveDate;
use mrp_core::{Bom, BomLine, MrpError, Result, StructureStore, WhereUsedEntry};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// 展開結果的一筆子件需求
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplodedComponent {
    pub product_id: String,
    /// 含損耗的需求量
    pub quantity: Decimal,
    /// BOM 層級（最上層子件為 1，虛擬件不增加層級）
    pub level: u32,
    pub uom_code: String,
    /// 直接上層（虛擬件已併入時為虛擬件的上層）
    pub parent_product_id: String,
    /// 標記為虛擬件但找不到 BOM，只能當一般子件處理
    pub unresolved_phantom: bool,
}

/// BOM 驗證問題（循環以錯誤回傳，不在此列）
#[derive(Debug, Clone, PartialEq)]
pub struct BomIssue {
    pub parent_product_id: String,
    pub component_id: String,
    pub line_id: Uuid,
    pub error: MrpError,
}

struct Frame {
    product_id: String,
    lines: Vec<BomLine>,
    next: usize,
    quantity: Decimal,
    /// 本 frame 的行輸出的層級
    line_level: u32,
}

/// BOM 展開器
pub struct BomExplosion<'a> {
    store: &'a dyn StructureStore,
}

impl<'a> BomExplosion<'a> {
    pub fn new(store: &'a dyn StructureStore) -> Self {
        Self { store }
    }

    /// 依物料查找有效 BOM 後多階展開
    pub fn explode(&self, product_id: &str, quantity: Decimal, as_of: NaiveDate) -> Result<Vec<ExplodedComponent>> {
        let bom = self
            .store
            .find_effective_bom(product_id, as_of)
            .ok_or_else(|| MrpError::bom_not_found(product_id))?;
        self.explode_bom(&bom, quantity, as_of)
    }

    /// 多階展開
    ///
    /// 深度優先，輸出順序為前序（父件先於其子件）。只納入生效區間包含 `as_of` 的行。
    pub fn explode_bom(&self, bom: &Bom, quantity: Decimal, as_of: NaiveDate) -> Result<Vec<ExplodedComponent>> {
        tracing::debug!("展開 BOM {} v{}，數量 {}", bom.product_id, bom.version, quantity);

        let mut components = Vec::new();
        let mut stack = vec![Frame {
            product_id: bom.product_id.clone(),
            lines: bom.effective_lines(as_of).cloned().collect(),
            next: 0,
            quantity,
            line_level: 1,
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(line) = frame.lines.get(frame.next).cloned() else {
                stack.pop();
                continue;
            };
            frame.next += 1;

            let parent_quantity = frame.quantity;
            let line_level = frame.line_level;
            let required = line.required_quantity(parent_quantity);

            if stack.iter().any(|f| f.product_id == line.component_id) {
                let mut path: Vec<String> = stack.iter().map(|f| f.product_id.clone()).collect();
                path.push(line.component_id.clone());
                tracing::warn!("偵測到 BOM 循環: {}", path.join(" -> "));
                return Err(MrpError::CircularStructure { path });
            }

            let child_bom = self.store.find_effective_bom(&line.component_id, as_of);
            let is_phantom = line.is_phantom || child_bom.as_ref().is_some_and(Bom::is_phantom);
            let parent_product_id = visible_parent(&stack);

            match child_bom {
                Some(child) if is_phantom => {
                    // 虛擬件：不輸出自身，其子件以相同層級併入
                    stack.push(Frame {
                        product_id: line.component_id.clone(),
                        lines: child.effective_lines(as_of).cloned().collect(),
                        next: 0,
                        quantity: required,
                        line_level,
                    });
                }
                child => {
                    components.push(ExplodedComponent {
                        product_id: line.component_id.clone(),
                        quantity: required,
                        level: line_level,
                        uom_code: line.uom_code.clone(),
                        parent_product_id,
                        unresolved_phantom: is_phantom,
                    });
                    if let Some(child) = child {
                        stack.push(Frame {
                            product_id: line.component_id.clone(),
                            lines: child.effective_lines(as_of).cloned().collect(),
                            next: 0,
                            quantity: required,
                            line_level: line_level + 1,
                        });
                    }
                }
            }
        }

        Ok(components)
    }

    /// 單階展開（MRP 遞迴用）
    ///
    /// 只輸出直接子件；虛擬件仍會併入，所以結果中永遠不會出現有 BOM 的虛擬件。
    pub fn explode_single_level(&self, bom: &Bom, quantity: Decimal, as_of: NaiveDate) -> Result<Vec<ExplodedComponent>> {
        Ok(self
            .explode_bom(bom, quantity, as_of)?
            .into_iter()
            .filter(|c| c.level == 1)
            .collect())
    }

    /// 反查：所有引用該子件的 BOM 行
    pub fn where_used(&self, component_id: &str) -> Vec<WhereUsedEntry> {
        self.store.find_where_used(component_id)
    }

    /// 反查至最上層：回傳所有不再被引用的祖先（子件本身無上層時回傳自身）
    pub fn where_used_roots(&self, component_id: &str) -> BTreeSet<String> {
        let mut roots = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([component_id.to_string()]);

        while let Some(product_id) = queue.pop_front() {
            if !visited.insert(product_id.clone()) {
                continue;
            }
            let parents: BTreeSet<String> = self
                .store
                .find_where_used(&product_id)
                .into_iter()
                .map(|entry| entry.parent_product_id)
                .collect();
            if parents.is_empty() {
                roots.insert(product_id);
            } else {
                queue.extend(parents);
            }
        }

        roots
    }

    /// 驗證 BOM
    ///
    /// 循環直接回傳錯誤；缺少物料主檔、非正數用量則逐筆列出。
    pub fn validate(&self, bom: &Bom, as_of: NaiveDate) -> Result<Vec<BomIssue>> {
        self.explode_bom(bom, Decimal::ONE, as_of)?;

        let mut issues = Vec::new();
        let mut checked = BTreeSet::new();
        let mut queue = VecDeque::from([bom.clone()]);

        while let Some(current) = queue.pop_front() {
            if !checked.insert(current.product_id.clone()) {
                continue;
            }
            for line in current.effective_lines(as_of) {
                if line.quantity <= Decimal::ZERO {
                    issues.push(BomIssue {
                        parent_product_id: current.product_id.clone(),
                        component_id: line.component_id.clone(),
                        line_id: line.id,
                        error: MrpError::InvalidQuantity(format!(
                            "{} 的子件 {} 用量 {} 必須大於 0",
                            current.product_id, line.component_id, line.quantity
                        )),
                    });
                }
                if !self.store.item_exists(&line.component_id) {
                    issues.push(BomIssue {
                        parent_product_id: current.product_id.clone(),
                        component_id: line.component_id.clone(),
                        line_id: line.id,
                        error: MrpError::ItemNotFound(line.component_id.clone()),
                    });
                }
                if let Some(child) = self.store.find_effective_bom(&line.component_id, as_of) {
                    queue.push_back(child);
                }
            }
        }

        Ok(issues)
    }

    /// 最低階碼：每個子件在展開中出現的最深層級
    pub fn low_level_codes(
        &self,
        bom: &Bom,
        as_of: NaiveDate,
        codes: &mut std::collections::HashMap<String, u32>,
    ) -> Result<()> {
        for component in self.explode_bom(bom, Decimal::ONE, as_of)? {
            let code = codes.entry(component.product_id).or_insert(0);
            *code = (*code).max(component.level);
        }
        Ok(())
    }
}

/// 最近的非虛擬件祖先（堆疊底部一定是被展開的 BOM 本身）
fn visible_parent(stack: &[Frame]) -> String {
    // 虛擬件 frame 與其上層共用 line_level
    let mut iter = stack.iter().rev().peekable();
    while let Some(frame) = iter.next() {
        match iter.peek() {
            Some(parent) if parent.line_level == frame.line_level => continue,
            _ => return frame.product_id.clone(),
        }
    }
    String::new()
}
