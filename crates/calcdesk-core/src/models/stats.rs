use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Calculation;

/// Aggregate report from `GET /api/statistics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStatistics {
    pub total_calculations: u64,
    #[serde(default)]
    pub operations_breakdown: BTreeMap<String, u64>,
    pub average_inputs_count: Option<f64>,
    pub average_result: Option<f64>,
    pub most_used_operation: Option<String>,
    #[serde(default)]
    pub recent_calculations: Vec<Calculation>,
    /// `YYYY-MM-DD` to count, last 30 days
    #[serde(default)]
    pub calculations_by_day: BTreeMap<String, u64>,
}

impl UserStatistics {
    /// Share of all calculations that used `operation`, in percent.
    pub fn operation_share(&self, operation: &str) -> f64 {
        if self.total_calculations == 0 {
            return 0.0;
        }
        let count = self.operations_breakdown.get(operation).copied().unwrap_or(0);
        count as f64 * 100.0 / self.total_calculations as f64
    }
}

/// One page of `GET /api/history`, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub calculations: Vec<Calculation>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl HistoryPage {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Per-operation report from `GET /api/statistics/operation/{operation}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationStatistics {
    pub count: u64,
    pub average_inputs_count: Option<f64>,
    pub average_result: Option<f64>,
    pub min_result: Option<f64>,
    pub max_result: Option<f64>,
}
