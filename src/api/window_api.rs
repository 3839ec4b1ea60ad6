// ==========================================
// 繁育窗口引擎 - 窗口 API
// ==========================================
// 职责: 宿主应用的统一入口
// - 偏移策略 GET / PATCH / 预设 / 恢复默认 / 校验
// - 计划锚点 → 窗口构造器 → 清洗器 → 渲染器输入
// 说明: 反向时间带只在校验报告中提示，不拒绝保存
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::offset_policy::{FieldKey, OffsetPolicy, PresetScope};
use crate::config::policy_store::PolicyStore;
use crate::domain::anchors::PlanAnchors;
use crate::domain::types::StageKey;
use crate::domain::window::StageWindow;
use crate::engine::band_validator::{validate_policy, ValidationReport};
use crate::engine::preset::{apply_named, reset_row, reset_scope, BandPreset};
use crate::engine::sanitizer::sanitize;
use crate::engine::window_builder::build_windows;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// 策略变更结果（变更后的策略 + 校验报告）
#[derive(Debug, Clone, Serialize)]
pub struct PolicyUpdate {
    pub policy: OffsetPolicy,
    pub report: ValidationReport,
}

impl PolicyUpdate {
    fn of(policy: OffsetPolicy) -> Self {
        let report = validate_policy(&policy);
        Self { policy, report }
    }
}

// ==========================================
// WindowApi - 窗口 API
// ==========================================
pub struct WindowApi {
    store: Arc<PolicyStore>,
    defaults: OffsetPolicy,
}

impl WindowApi {
    pub fn new(store: Arc<PolicyStore>) -> Self {
        Self {
            store,
            defaults: OffsetPolicy::default(),
        }
    }

    /// 使用自定义默认策略（恢复默认/预设基准都以它为准）
    pub fn with_defaults(store: Arc<PolicyStore>, defaults: OffsetPolicy) -> Self {
        Self { store, defaults }
    }

    pub fn defaults(&self) -> &OffsetPolicy {
        &self.defaults
    }

    // ==========================================
    // 偏移策略
    // ==========================================

    pub fn get_policy(&self, tenant_id: &str) -> ApiResult<OffsetPolicy> {
        Ok(self.store.load_policy(tenant_id)?)
    }

    /// 局部更新策略
    ///
    /// # 参数
    /// - patch: 扁平记录对象，如 `{"date_birth_risky_from": -4}`
    pub fn patch_policy(&self, tenant_id: &str, patch: &Value) -> ApiResult<PolicyUpdate> {
        let record = patch
            .as_object()
            .ok_or_else(|| ApiError::InvalidInput("策略更新必须是对象".to_string()))?;
        let outcome = self.store.patch_policy(tenant_id, record)?;
        let update = PolicyUpdate::of(outcome.policy);
        if !update.report.is_valid() {
            tracing::warn!(
                tenant = tenant_id,
                errors = update.report.errors().count(),
                "策略已保存，但存在反向时间带"
            );
        }
        Ok(update)
    }

    /// 应用命名预设
    ///
    /// 作用域先恢复默认再缩放，重复应用同一预设结果不变
    pub fn apply_preset(
        &self,
        tenant_id: &str,
        scope: PresetScope,
        preset: BandPreset,
    ) -> ApiResult<PolicyUpdate> {
        let next = self.store.update_policy(tenant_id, |current| {
            let base = reset_scope(current, scope, &self.defaults);
            apply_named(&base, scope, preset)
        })?;

        tracing::info!(
            tenant = tenant_id,
            scope = scope.as_str(),
            preset = preset.as_str(),
            "已应用偏移预设"
        );
        Ok(PolicyUpdate::of(next))
    }

    /// 恢复作用域默认值
    pub fn reset_scope(&self, tenant_id: &str, scope: PresetScope) -> ApiResult<PolicyUpdate> {
        let next = self
            .store
            .update_policy(tenant_id, |current| reset_scope(current, scope, &self.defaults))?;
        Ok(PolicyUpdate::of(next))
    }

    /// 恢复一行（一个锚点或阶段的四个字段）
    pub fn reset_row(&self, tenant_id: &str, stage: StageKey) -> ApiResult<PolicyUpdate> {
        let keys = match stage {
            StageKey::Phase(phase) => FieldKey::phase_row(phase),
            StageKey::Anchor(anchor) => FieldKey::date_row(anchor),
        };
        let next = self
            .store
            .update_policy(tenant_id, |current| reset_row(current, keys, &self.defaults))?;
        Ok(PolicyUpdate::of(next))
    }

    pub fn validate(&self, tenant_id: &str) -> ApiResult<ValidationReport> {
        let policy = self.store.load_policy(tenant_id)?;
        Ok(validate_policy(&policy))
    }

    // ==========================================
    // 阶段窗口
    // ==========================================

    /// 计划锚点 → 清洗后的阶段窗口
    ///
    /// # 参数
    /// - raw_anchors: 上游计划记录（camelCase，日期可为字符串/时间戳）
    #[instrument(skip(self, raw_anchors))]
    pub fn stage_windows(
        &self,
        tenant_id: &str,
        raw_anchors: &Value,
    ) -> ApiResult<Vec<StageWindow>> {
        let policy = self.store.load_policy(tenant_id)?;
        let anchors = PlanAnchors::from_value(raw_anchors);
        let windows = build_windows(&anchors, &policy);

        let payload = serde_json::to_value(&windows)
            .map_err(|e| ApiError::InternalError(format!("窗口序列化失败: {}", e)))?;
        Ok(sanitize(&payload))
    }
}
