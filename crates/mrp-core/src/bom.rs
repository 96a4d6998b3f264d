//! 物料清單（BOM）模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Effectivity, MrpError, Result};

/// BOM 類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BomType {
    /// 標準
    Standard,
    /// 虛擬件（展開時直接併入上層，不產生計劃訂單）
    Phantom,
    /// 可配置
    Configurable,
}

/// BOM 狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BomStatus {
    /// 草稿
    Draft,
    /// 已發行
    Released,
    /// 已作廢
    Obsolete,
}

/// BOM 行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    pub id: Uuid,

    /// 子件物料ID
    pub component_id: String,

    /// 每單位父件用量
    pub quantity: Decimal,

    /// 單位
    pub uom_code: String,

    /// 損耗率（0-100）
    pub scrap_percentage: Decimal,

    /// 是否為虛擬件
    pub is_phantom: bool,

    /// 對應的途程工序
    pub operation_number: Option<u32>,

    /// 行本身的生效區間（與表頭區間獨立判斷）
    pub effectivity: Effectivity,
}

impl BomLine {
    /// 創建新的 BOM 行
    pub fn new(component_id: impl Into<String>, quantity: Decimal, uom_code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            component_id: component_id.into(),
            quantity,
            uom_code: uom_code.into(),
            scrap_percentage: Decimal::ZERO,
            is_phantom: false,
            operation_number: None,
            effectivity: Effectivity::always(),
        }
    }

    /// 建構器模式：設置損耗率
    pub fn with_scrap(mut self, scrap_percentage: Decimal) -> Self {
        self.scrap_percentage = scrap_percentage;
        self
    }

    /// 建構器模式：標記為虛擬件
    pub fn as_phantom(mut self) -> Self {
        self.is_phantom = true;
        self
    }

    /// 建構器模式：設置工序
    pub fn with_operation(mut self, operation_number: u32) -> Self {
        self.operation_number = Some(operation_number);
        self
    }

    /// 建構器模式：設置生效區間
    pub fn with_effectivity(mut self, effectivity: Effectivity) -> Self {
        self.effectivity = effectivity;
        self
    }

    /// 含損耗的單位用量
    pub fn quantity_with_scrap(&self) -> Decimal {
        self.quantity * (Decimal::ONE + self.scrap_percentage / Decimal::ONE_HUNDRED)
    }

    /// 父件數量對應的子件需求
    pub fn required_quantity(&self, parent_quantity: Decimal) -> Decimal {
        parent_quantity * self.quantity_with_scrap()
    }

    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.effectivity.contains(date)
    }
}

/// 物料清單
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bom {
    pub id: Uuid,

    /// 父件物料ID
    pub product_id: String,

    pub version: u32,

    pub bom_type: BomType,

    /// 基準產出數量（參考批量，用量仍以每單位父件計）
    pub output_quantity: Decimal,

    pub uom_code: String,

    /// 有序的 BOM 行
    pub lines: Vec<BomLine>,

    pub effectivity: Effectivity,

    pub status: BomStatus,

    /// 是否為最新版本（由結構目錄維護，作廢不影響）
    pub is_latest: bool,
}

impl Bom {
    /// 創建新的草稿 BOM
    pub fn new(product_id: impl Into<String>, version: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            version,
            bom_type: BomType::Standard,
            output_quantity: Decimal::ONE,
            uom_code: "EA".to_string(),
            lines: Vec::new(),
            effectivity: Effectivity::always(),
            status: BomStatus::Draft,
            is_latest: true,
        }
    }

    /// 建構器模式：添加 BOM 行
    pub fn with_line(mut self, line: BomLine) -> Self {
        self.lines.push(line);
        self
    }

    /// 建構器模式：設置類型
    pub fn with_type(mut self, bom_type: BomType) -> Self {
        self.bom_type = bom_type;
        self
    }

    /// 建構器模式：設置生效區間
    pub fn with_effectivity(mut self, effectivity: Effectivity) -> Self {
        self.effectivity = effectivity;
        self
    }

    /// 建構器模式：設置產出數量與單位
    pub fn with_output(mut self, quantity: Decimal, uom_code: impl Into<String>) -> Self {
        self.output_quantity = quantity;
        self.uom_code = uom_code.into();
        self
    }

    /// 建構器模式：直接發行（測試與資料載入用）
    pub fn released(mut self) -> Self {
        self.status = BomStatus::Released;
        self
    }

    /// 發行 BOM（草稿 → 已發行）
    pub fn release(&mut self) -> Result<()> {
        match self.status {
            BomStatus::Draft => {
                if self.effectivity.is_empty() {
                    return Err(MrpError::InvalidDate(format!(
                        "BOM {} v{} 生效區間為空",
                        self.product_id, self.version
                    )));
                }
                self.status = BomStatus::Released;
                Ok(())
            }
            other => Err(MrpError::invalid_status(
                format!("BOM {} v{}", self.product_id, self.version),
                other,
                "release",
            )),
        }
    }

    /// 作廢 BOM（草稿/已發行 → 已作廢）
    pub fn obsolete(&mut self) -> Result<()> {
        match self.status {
            BomStatus::Draft | BomStatus::Released => {
                self.status = BomStatus::Obsolete;
                Ok(())
            }
            BomStatus::Obsolete => Err(MrpError::invalid_status(
                format!("BOM {} v{}", self.product_id, self.version),
                self.status,
                "obsolete",
            )),
        }
    }

    /// 已發行且日期落在生效區間內
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.status == BomStatus::Released && self.effectivity.contains(date)
    }

    pub fn is_phantom(&self) -> bool {
        self.bom_type == BomType::Phantom
    }

    /// 指定日期有效的 BOM 行
    pub fn effective_lines(&self, date: NaiveDate) -> impl Iterator<Item = &BomLine> {
        self.lines.iter().filter(move |line| line.is_effective_on(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_with_scrap() {
        let line = BomLine::new("SCREW-001", Decimal::from(10), "EA").with_scrap(Decimal::from(10));
        assert_eq!(line.quantity_with_scrap(), Decimal::from(11));
        assert_eq!(line.required_quantity(Decimal::from(3)), Decimal::from(33));
    }

    #[test]
    fn test_release_lifecycle() {
        let mut bom = Bom::new("BIKE-001", 1);
        assert_eq!(bom.status, BomStatus::Draft);

        bom.release().unwrap();
        assert_eq!(bom.status, BomStatus::Released);

        // 已發行不可再次發行
        assert!(matches!(bom.release(), Err(MrpError::InvalidStatus { .. })));

        bom.obsolete().unwrap();
        assert_eq!(bom.status, BomStatus::Obsolete);

        // 已作廢不可發行，也不可再次作廢
        assert!(bom.release().is_err());
        assert!(bom.obsolete().is_err());
    }

    #[test]
    fn test_line_effectivity_independent_of_header() {
        let cutover = NaiveDate::from_ymd_opt(2025, 11, 10).unwrap();
        let bom = Bom::new("BIKE-001", 1)
            .with_line(BomLine::new("FRAME-OLD", Decimal::ONE, "EA").with_effectivity(Effectivity::until(cutover)))
            .with_line(BomLine::new("FRAME-NEW", Decimal::ONE, "EA").with_effectivity(Effectivity::starting(cutover)))
            .released();

        let before: Vec<_> = bom
            .effective_lines(NaiveDate::from_ymd_opt(2025, 11, 9).unwrap())
            .map(|l| l.component_id.as_str())
            .collect();
        let after: Vec<_> = bom.effective_lines(cutover).map(|l| l.component_id.as_str()).collect();

        assert_eq!(before, vec!["FRAME-OLD"]);
        assert_eq!(after, vec!["FRAME-NEW"]);
    }

    #[test]
    fn test_draft_bom_not_effective() {
        let bom = Bom::new("BIKE-001", 1);
        assert!(!bom.is_effective_on(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()));
    }
}
