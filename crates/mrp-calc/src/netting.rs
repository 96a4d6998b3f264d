//! 淨需求計算
//!
//! 每個物料一本供應帳：期初可用量（在庫 − 安全庫存，可為負）加上逐桶的預計收貨。
//! 第 `b` 桶只能動用期初與 `0..=b` 桶的收貨，結餘向後結轉，缺口不向未來借。

use rust_decimal::Decimal;

/// 單桶淨算結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetRequirement {
    /// 桶索引
    pub bucket: usize,
    /// 總需求
    pub gross_requirement: Decimal,
    /// 進入本桶時的結轉可用量（已扣安全庫存）
    pub carried: Decimal,
    /// 本桶預計收貨
    pub scheduled_receipt: Decimal,
    /// 淨需求
    pub net_requirement: Decimal,
}

impl NetRequirement {
    /// 可用量 = 結轉 + 本桶收貨
    pub fn available(&self) -> Decimal {
        self.carried + self.scheduled_receipt
    }
}

/// 單一物料的供應帳
#[derive(Debug, Clone, PartialEq)]
pub struct SupplyLedger {
    opening: Decimal,
    receipts: Vec<Decimal>,
    safety_stock: Decimal,
}

impl SupplyLedger {
    /// 建立供應帳；`receipts` 長度即桶數
    pub fn new(on_hand: Decimal, safety_stock: Decimal, bucket_count: usize) -> Self {
        Self {
            opening: on_hand - safety_stock,
            receipts: vec![Decimal::ZERO; bucket_count],
            safety_stock,
        }
    }

    pub fn safety_stock(&self) -> Decimal {
        self.safety_stock
    }

    pub fn bucket_count(&self) -> usize {
        self.receipts.len()
    }

    /// 登錄收貨（預計收貨或計劃訂單的剩餘量）
    pub fn receive(&mut self, bucket: usize, quantity: Decimal) {
        if let Some(slot) = self.receipts.get_mut(bucket) {
            *slot += quantity;
        }
    }

    /// 第 `bucket` 桶可動用的總量
    pub fn available_at(&self, bucket: usize) -> Decimal {
        self.opening + self.receipts_through(bucket)
    }

    fn receipts_through(&self, bucket: usize) -> Decimal {
        let end = (bucket + 1).min(self.receipts.len());
        self.receipts[..end].iter().copied().sum()
    }

    /// 對第 `bucket` 桶淨算 `gross`
    ///
    /// 淨需求 = max(0, 毛需求 − 可用量)。可用量不足時本桶以前的帳全部清空，
    /// 足夠時依先進先出扣抵（先償還負的期初）。
    pub fn net(&mut self, bucket: usize, gross: Decimal) -> NetRequirement {
        let bucket = bucket.min(self.receipts.len().saturating_sub(1));
        let scheduled_receipt = self.receipts.get(bucket).copied().unwrap_or(Decimal::ZERO);
        let available = self.available_at(bucket);
        let carried = available - scheduled_receipt;
        let net_requirement = (gross - available).max(Decimal::ZERO);

        if gross >= available {
            self.opening = Decimal::ZERO;
            for slot in self.receipts.iter_mut().take(bucket + 1) {
                *slot = Decimal::ZERO;
            }
        } else {
            self.consume(bucket, gross);
        }

        NetRequirement {
            bucket,
            gross_requirement: gross,
            carried,
            scheduled_receipt,
            net_requirement,
        }
    }

    /// 先進先出扣抵；呼叫前已確認可用量大於扣抵量
    fn consume(&mut self, bucket: usize, quantity: Decimal) {
        let mut owed = quantity;
        if self.opening < Decimal::ZERO {
            owed -= self.opening;
            self.opening = Decimal::ZERO;
        }

        let taken = owed.min(self.opening);
        self.opening -= taken;
        owed -= taken;

        for slot in self.receipts.iter_mut().take(bucket + 1) {
            if owed <= Decimal::ZERO {
                break;
            }
            let taken = owed.min(*slot);
            *slot -= taken;
            owed -= taken;
        }
    }
}
