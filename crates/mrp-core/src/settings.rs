//! 引擎設定
//!
//! 所有欄位皆有預設值，JSON 設定檔只需列出要覆寫的項目：
//!
//! ```
//! use mrp_core::{EngineSettings, LeadTimeMode};
//!
//! let settings = EngineSettings::from_json_str(r#"{ "lead_time_mode": "working_days" }"#).unwrap();
//! assert_eq!(settings.lead_time_mode, LeadTimeMode::WorkingDays);
//! assert!(!settings.parallel);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MrpError, ResolutionAction, Result};

/// 提前期換算方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadTimeMode {
    /// 日曆天
    #[default]
    CalendarDays,
    /// 工作天（依工作日曆）
    WorkingDays,
}

/// MRP 引擎設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub lead_time_mode: LeadTimeMode,
    /// 以 rayon 平行展開最上層物料
    pub parallel: bool,
    /// 過期判斷基準日；未設定時以時界起日為準
    pub past_due_as_of: Option<NaiveDate>,
    pub forecast: ForecastSettings,
    pub capacity: CapacitySettings,
    pub resolver: ResolverPreferences,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            lead_time_mode: LeadTimeMode::CalendarDays,
            parallel: false,
            past_due_as_of: None,
            forecast: ForecastSettings::default(),
            capacity: CapacitySettings::default(),
            resolver: ResolverPreferences::default(),
        }
    }
}

impl EngineSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MrpError::Configuration(format!("設定解析失敗: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MrpError::Configuration(format!("無法讀取設定檔 {}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_lead_time_mode(mut self, mode: LeadTimeMode) -> Self {
        self.lead_time_mode = mode;
        self
    }

    pub fn with_past_due_as_of(mut self, date: NaiveDate) -> Self {
        self.past_due_as_of = Some(date);
        self
    }
}

/// 預測設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// 無確定需求時以預測補足毛需求
    pub enabled: bool,
    /// 外部預測逾時（毫秒）
    pub timeout_ms: u64,
    /// 指數平滑所需最少歷史點數
    pub min_history_points: usize,
    pub smoothing_alpha: Decimal,
    /// 低於此信心水準時發出警告
    pub low_confidence_threshold: Decimal,
    /// 歷史備援的信心水準
    pub fallback_confidence: Decimal,
    /// 歷史不足時的信心水準
    pub minimum_confidence: Decimal,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 2_000,
            min_history_points: 3,
            smoothing_alpha: Decimal::new(3, 1),
            low_confidence_threshold: Decimal::new(5, 1),
            fallback_confidence: Decimal::new(6, 1),
            minimum_confidence: Decimal::new(1, 1),
        }
    }
}

/// 產能規劃設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacitySettings {
    /// 可用工時是否計入加班
    pub include_overtime: bool,
    /// 瓶頸利用率門檻
    pub bottleneck_threshold: Decimal,
}

impl Default for CapacitySettings {
    fn default() -> Self {
        Self {
            include_overtime: false,
            bottleneck_threshold: Decimal::new(9, 1),
        }
    }
}

/// 產能解決偏好
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverPreferences {
    /// 停用的處置方式
    pub disabled_actions: Vec<ResolutionAction>,
    /// 覆寫優先序
    pub priority_overrides: BTreeMap<ResolutionAction, u32>,
    /// 無外包費率時，外包成本 = 工時 × 工時費率 × 此倍數
    pub subcontract_premium: Decimal,
    /// 重排向後搜尋的最多期間數
    pub max_reschedule_periods: usize,
}

impl Default for ResolverPreferences {
    fn default() -> Self {
        Self {
            disabled_actions: Vec::new(),
            priority_overrides: BTreeMap::new(),
            subcontract_premium: Decimal::new(13, 1),
            max_reschedule_periods: 4,
        }
    }
}

impl ResolverPreferences {
    pub fn disable(mut self, action: ResolutionAction) -> Self {
        if !self.disabled_actions.contains(&action) {
            self.disabled_actions.push(action);
        }
        self
    }

    pub fn with_priority(mut self, action: ResolutionAction, priority: u32) -> Self {
        self.priority_overrides.insert(action, priority);
        self
    }

    pub fn is_enabled(&self, action: ResolutionAction) -> bool {
        !self.disabled_actions.contains(&action)
    }

    pub fn priority_for(&self, action: ResolutionAction, default: u32) -> u32 {
        self.priority_overrides.get(&action).copied().unwrap_or(default)
    }
}
