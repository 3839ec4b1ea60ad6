// ==========================================
// 繁育窗口引擎 - 租户偏移策略存储
// ==========================================
// 职责: 租户级偏移策略的读取 (GET) / 局部更新 (PATCH) / 导入导出
// 存储: config_kv 表 (scope_id = 'tenant/{tenant_id}', key = 'offset_policy/{field}')
// 说明: 与本地显示偏好 (display_prefs) 完全分离；引擎只接收本层给出的策略值
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::offset_policy::{
    parse_flag_value, parse_offset_value, FieldKey, MergeReport, OffsetPolicy,
    PLACEMENT_START_BANDS_ENABLED_KEY,
};
use crate::db::{
    ensure_config_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION,
};
use rusqlite::{params, Connection, TransactionBehavior};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};

/// config_kv 中偏移策略键的前缀
const KEY_PREFIX: &str = "offset_policy/";

/// 导出包格式版本
pub const BUNDLE_VERSION: i64 = 1;

/// PATCH 结果
#[derive(Debug, Clone, Serialize)]
pub struct PatchOutcome {
    /// 写入的键（按请求顺序）
    pub applied: Vec<String>,
    /// 写入后的完整策略
    pub policy: OffsetPolicy,
}

/// 导入结果
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub policy: OffsetPolicy,
    pub report: MergeReport,
}

// ==========================================
// PolicyStore - 租户偏移策略存储
// ==========================================
pub struct PolicyStore {
    conn: Arc<Mutex<Connection>>,
}

impl PolicyStore {
    /// 打开数据库文件并确保配置表存在
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_config_schema(&conn)?;
        check_schema_version(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    fn scope_id(tenant_id: &str) -> ConfigResult<String> {
        let id = tenant_id.trim();
        if id.is_empty() {
            return Err(ConfigError::InvalidTenant("租户ID为空".to_string()));
        }
        Ok(format!("tenant/{}", id))
    }

    // ==========================================
    // 读取
    // ==========================================

    /// 读取租户策略（已存字段覆盖在编译期默认值之上）
    ///
    /// 无记录时返回默认策略；单行数据损坏时该字段回退默认值（记录 warn）
    pub fn load_policy(&self, tenant_id: &str) -> ConfigResult<OffsetPolicy> {
        let scope_id = Self::scope_id(tenant_id)?;
        let conn = self.lock()?;
        let record = read_record(&conn, &scope_id)?;
        Ok(OffsetPolicy::from_record(&record).0)
    }

    /// 租户是否存有任何策略字段
    pub fn has_policy(&self, tenant_id: &str) -> ConfigResult<bool> {
        let scope_id = Self::scope_id(tenant_id)?;
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM config_kv WHERE scope_id = ?1 AND key LIKE ?2",
            params![scope_id, format!("{}%", KEY_PREFIX)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 局部更新 (PATCH)
    ///
    /// # 规则
    /// - 任一键未知或值类型不符 → 整体拒绝，不写入任何字段
    /// - 合法键在同一事务内写入
    /// - 不校验时间带宽度（反向时间带交由校验器提示）
    pub fn patch_policy(
        &self,
        tenant_id: &str,
        patch: &Map<String, Value>,
    ) -> ConfigResult<PatchOutcome> {
        let scope_id = Self::scope_id(tenant_id)?;

        let mut entries: Vec<(String, Value)> = Vec::with_capacity(patch.len());
        for (key, value) in patch {
            entries.push(normalize_patch_entry(key, value)?);
        }

        let mut conn = self.lock()?;
        {
            let tx = conn.transaction()?;
            ensure_tenant_scope(&tx, &scope_id, tenant_id)?;
            for (key, value) in &entries {
                upsert_entry(&tx, &scope_id, key, value)?;
            }
            tx.commit()?;
        }

        let applied: Vec<String> = entries.into_iter().map(|(k, _)| k).collect();
        tracing::info!(tenant = tenant_id, fields = applied.len(), "偏移策略已局部更新");

        let record = read_record(&conn, &scope_id)?;
        Ok(PatchOutcome {
            applied,
            policy: OffsetPolicy::from_record(&record).0,
        })
    }

    /// 保存完整策略（覆盖全部字段）
    pub fn save_policy(&self, tenant_id: &str, policy: &OffsetPolicy) -> ConfigResult<()> {
        let scope_id = Self::scope_id(tenant_id)?;
        let mut conn = self.lock()?;

        let tx = conn.transaction()?;
        ensure_tenant_scope(&tx, &scope_id, tenant_id)?;
        for (key, value) in policy.to_record() {
            upsert_entry(&tx, &scope_id, &key, &value)?;
        }
        tx.commit()?;

        tracing::info!(tenant = tenant_id, "偏移策略已保存");
        Ok(())
    }

    /// 读取 → 变换 → 写回，在同一把锁、同一个写事务内完成
    ///
    /// 只写回与当前值不同的字段，变换未触及的字段保持原行不动
    ///
    /// # 返回
    /// 变换后的完整策略
    pub fn update_policy<F>(&self, tenant_id: &str, transform: F) -> ConfigResult<OffsetPolicy>
    where
        F: FnOnce(&OffsetPolicy) -> OffsetPolicy,
    {
        let scope_id = Self::scope_id(tenant_id)?;
        let mut conn = self.lock()?;

        // IMMEDIATE: 开始即持有写锁，其他连接无法在读写之间插入提交
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current_record = read_record(&tx, &scope_id)?;
        let current = OffsetPolicy::from_record(&current_record).0;
        let next = transform(&current);

        let before = current.to_record();
        let changed: Vec<(String, Value)> = next
            .to_record()
            .into_iter()
            .filter(|(key, value)| before.get(key) != Some(value))
            .collect();

        if !changed.is_empty() {
            ensure_tenant_scope(&tx, &scope_id, tenant_id)?;
            for (key, value) in &changed {
                upsert_entry(&tx, &scope_id, key, value)?;
            }
        }
        tx.commit()?;

        tracing::info!(tenant = tenant_id, fields = changed.len(), "偏移策略已更新");
        Ok(next)
    }

    /// 删除租户的全部策略字段（之后读取即为默认策略）
    ///
    /// # 返回
    /// 删除的行数
    pub fn reset_policy(&self, tenant_id: &str) -> ConfigResult<usize> {
        let scope_id = Self::scope_id(tenant_id)?;
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key LIKE ?2",
            params![scope_id, format!("{}%", KEY_PREFIX)],
        )?;
        tracing::info!(tenant = tenant_id, deleted, "偏移策略已恢复默认");
        Ok(deleted)
    }

    // ==========================================
    // 导入导出
    // ==========================================

    /// 导出配置包
    pub fn export_bundle(&self, tenant_id: &str) -> ConfigResult<Value> {
        let policy = self.load_policy(tenant_id)?;
        Ok(json!({
            "version": BUNDLE_VERSION,
            "tenantId": tenant_id.trim(),
            "offsetPolicy": policy.to_record(),
        }))
    }

    /// 导入配置包
    ///
    /// - 接受 offsetPolicy / offset_policy 两种键名
    /// - 其他无关配置忽略
    /// - 部分策略合并到编译期默认值之上后整体保存
    pub fn import_bundle(&self, tenant_id: &str, bundle: &Value) -> ConfigResult<ImportOutcome> {
        let obj = bundle
            .as_object()
            .ok_or_else(|| ConfigError::InvalidBundle("导入数据不是对象".to_string()))?;

        let section = obj
            .get("offsetPolicy")
            .or_else(|| obj.get("offset_policy"))
            .ok_or_else(|| ConfigError::InvalidBundle("缺少 offsetPolicy".to_string()))?;

        let record = section
            .as_object()
            .ok_or_else(|| ConfigError::InvalidBundle("offsetPolicy 不是对象".to_string()))?;

        let (policy, report) = OffsetPolicy::from_record(record);
        self.save_policy(tenant_id, &policy)?;

        tracing::info!(
            tenant = tenant_id,
            applied = report.applied.len(),
            skipped = report.unknown.len() + report.invalid.len(),
            "偏移策略已导入"
        );
        Ok(ImportOutcome { policy, report })
    }
}

// ==========================================
// 内部工具
// ==========================================

/// 数据库由更新版本的引擎创建时拒绝打开（旧代码可能误读新格式）
fn check_schema_version(conn: &Connection) -> ConfigResult<()> {
    match read_schema_version(conn)? {
        Some(found) if found > CURRENT_SCHEMA_VERSION => Err(ConfigError::SchemaVersion {
            found,
            expected: CURRENT_SCHEMA_VERSION,
        }),
        _ => Ok(()),
    }
}

/// 校验并规范化 PATCH 条目
fn normalize_patch_entry(key: &str, value: &Value) -> ConfigResult<(String, Value)> {
    let invalid = || ConfigError::InvalidValue {
        field: key.to_string(),
        value: value.to_string(),
    };

    if key == PLACEMENT_START_BANDS_ENABLED_KEY {
        let enabled = parse_flag_value(value).ok_or_else(invalid)?;
        return Ok((key.to_string(), Value::Bool(enabled)));
    }

    let field: FieldKey = key
        .parse()
        .map_err(|_| ConfigError::UnknownField(key.to_string()))?;
    let offset = parse_offset_value(value).ok_or_else(invalid)?;
    Ok((field.to_string(), Value::from(offset)))
}

fn ensure_tenant_scope(conn: &Connection, scope_id: &str, tenant_id: &str) -> ConfigResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
         VALUES (?1, 'TENANT', ?2)",
        params![scope_id, tenant_id.trim()],
    )?;
    Ok(())
}

fn upsert_entry(conn: &Connection, scope_id: &str, key: &str, value: &Value) -> ConfigResult<()> {
    conn.execute(
        "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
         ON CONFLICT(scope_id, key)
         DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
        params![scope_id, format!("{}{}", KEY_PREFIX, key), serde_json::to_string(value)?],
    )?;
    Ok(())
}

/// 读取租户的扁平策略记录（损坏行跳过）
fn read_record(conn: &Connection, scope_id: &str) -> ConfigResult<Map<String, Value>> {
    let mut stmt = conn.prepare(
        "SELECT key, value FROM config_kv
         WHERE scope_id = ?1 AND key LIKE ?2
         ORDER BY key",
    )?;
    let rows = stmt.query_map(params![scope_id, format!("{}%", KEY_PREFIX)], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut record = Map::new();
    for row in rows {
        let (key, raw) = row?;
        let field = key.trim_start_matches(KEY_PREFIX).to_string();
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                record.insert(field, value);
            }
            Err(e) => {
                tracing::warn!(scope_id, key = %field, "策略字段数据损坏，回退默认值: {}", e);
            }
        }
    }
    Ok(record)
}
