use std::future::Future;

use crate::error::AppResult;
use crate::models::{DivisionInputs, SavedDecision};

/// 分部输入与最终决策的持久化边界
pub trait DivisionRepository: Send + Sync + 'static {
    /// 加载分部的预算行、报价及上游映射提示
    fn load_division(&self, division_id: &str) -> impl Future<Output = AppResult<Option<DivisionInputs>>> + Send;

    /// 主表与明细要么全部写入, 要么都不写
    fn save_decision(&self, decision: &SavedDecision) -> impl Future<Output = AppResult<()>> + Send;
}
