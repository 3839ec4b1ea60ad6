// ==========================================
// 繁育窗口引擎 - 本地显示偏好
// ==========================================
// 仅存于本机（JSON 文件），与租户偏移策略完全分离
// 引擎不读取本配置；只有渲染侧使用
// ==========================================

use crate::config::error::ConfigResult;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 覆盖偏好文件路径的环境变量
pub const PREFS_PATH_ENV: &str = "BREEDING_WINDOW_PREFS_PATH";

const PREFS_DIR_NAME: &str = "breeding-window-engine";
const PREFS_FILE_NAME: &str = "display_prefs.json";

/// 本地显示偏好
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayPrefs {
    /// 新打开的时间轴是否默认显示时间带
    pub show_bands_by_default: bool,
    pub show_risky: bool,
    pub show_unlikely: bool,
    /// 甘特图可视范围（天）
    pub gantt_horizon_days: u32,
    pub show_today_cursor: bool,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            show_bands_by_default: true,
            show_risky: true,
            show_unlikely: true,
            gantt_horizon_days: 120,
            show_today_cursor: true,
        }
    }
}

/// 默认偏好文件路径
///
/// 优先级: 环境变量 → 用户配置目录 → 当前目录
pub fn default_prefs_path() -> PathBuf {
    if let Ok(path) = std::env::var(PREFS_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    match dirs::config_dir() {
        Some(dir) => dir.join(PREFS_DIR_NAME).join(PREFS_FILE_NAME),
        None => PathBuf::from(PREFS_FILE_NAME),
    }
}

// ==========================================
// DisplayPrefsStore - 本地偏好文件
// ==========================================
pub struct DisplayPrefsStore {
    path: PathBuf,
}

impl DisplayPrefsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn at_default_location() -> Self {
        Self::new(default_prefs_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取偏好；文件不存在或内容损坏时返回默认值
    pub fn load(&self) -> DisplayPrefs {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return DisplayPrefs::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "显示偏好读取失败，使用默认值: {}", e);
                return DisplayPrefs::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), "显示偏好格式错误，使用默认值: {}", e);
            DisplayPrefs::default()
        })
    }

    /// 保存偏好（自动创建父目录）
    pub fn save(&self, prefs: &DisplayPrefs) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建偏好目录: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(prefs)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("无法写入偏好文件: {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "显示偏好已保存");
        Ok(())
    }
}
