use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::db::DivisionRepository;
use crate::error::{AppError, AppResult};
use crate::models::{DivisionInputs, SavedDecision};

/// 进程内仓储, 用于测试和嵌入式调用
#[derive(Debug, Default)]
pub struct MemoryRepository {
    divisions: DashMap<String, DivisionInputs>,
    decisions: Mutex<Vec<SavedDecision>>,
    fail_saves: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_division(&self, inputs: DivisionInputs) {
        self.divisions.insert(inputs.division_id.clone(), inputs);
    }

    /// 打开后所有保存均失败, 直到关闭
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn saved_decisions(&self, division_id: &str) -> Vec<SavedDecision> {
        self.decisions
            .lock()
            .map(|d| d.iter().filter(|s| s.division_id == division_id).cloned().collect())
            .unwrap_or_default()
    }
}

impl DivisionRepository for MemoryRepository {
    async fn load_division(&self, division_id: &str) -> AppResult<Option<DivisionInputs>> {
        Ok(self.divisions.get(division_id).map(|d| d.value().clone()))
    }

    async fn save_decision(&self, decision: &SavedDecision) -> AppResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "decision store unavailable",
            )));
        }
        let mut decisions = self
            .decisions
            .lock()
            .map_err(|_| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, "decision store poisoned")))?;
        decisions.push(decision.clone());
        Ok(())
    }
}
