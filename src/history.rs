//! 识别历史存储：接受 `(text, format)` 对，按文本去重，只保留最近 30 条。
//! 由调用方在识别成功后写入；识别核心本身不落任何状态。

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::AppError;

/// 历史容量上限：超过后淘汰最旧记录。
const MAX_HISTORY_ITEMS: i64 = 30;

/// 一条识别历史。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryItem {
    pub id: i64,
    pub text: String,
    pub format: String,
    pub timestamp: i64,
}

/// 识别历史存储。
pub struct ScanHistoryStore {
    conn: Mutex<Connection>,
}

impl ScanHistoryStore {
    /// 打开文件存储（不存在时自动建表）。
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let conn = Connection::open(path)
            .map_err(|e| AppError::Database(format!("打开历史数据库失败: {}", e)))?;
        Self::with_connection(conn)
    }

    /// 打开内存存储（测试与一次性会话）。
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Database(format!("打开内存数据库失败: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, AppError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS scan_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                format TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| AppError::Database(format!("初始化历史表失败: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::Database("历史数据库锁已中毒".to_string()))
    }

    /// 写入一条识别结果；同文本记录去重，容量超限时淘汰最旧。
    pub fn add(&self, text: &str, format: &str) -> Result<(), AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let conn = self.lock()?;

        conn.execute("DELETE FROM scan_history WHERE text = ?1", params![text])
            .map_err(|e| AppError::Database(format!("历史去重失败: {}", e)))?;

        conn.execute(
            "INSERT INTO scan_history (text, format, timestamp) VALUES (?1, ?2, ?3)",
            params![text, format, chrono::Utc::now().timestamp_millis()],
        )
        .map_err(|e| AppError::Database(format!("写入历史失败: {}", e)))?;

        conn.execute(
            "DELETE FROM scan_history WHERE id NOT IN (
                SELECT id FROM scan_history ORDER BY timestamp DESC, id DESC LIMIT ?1
            )",
            params![MAX_HISTORY_ITEMS],
        )
        .map_err(|e| AppError::Database(format!("裁剪历史失败: {}", e)))?;

        Ok(())
    }

    /// 按时间倒序读取历史。
    pub fn list(&self, limit: i64) -> Result<Vec<ScanHistoryItem>, AppError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, text, format, timestamp FROM scan_history
                 ORDER BY timestamp DESC, id DESC LIMIT ?1",
            )
            .map_err(|e| AppError::Database(format!("准备查询失败: {}", e)))?;

        let items = stmt
            .query_map(params![limit], |row| {
                Ok(ScanHistoryItem {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    format: row.get(2)?,
                    timestamp: row.get(3)?,
                })
            })
            .map_err(|e| AppError::Database(format!("查询历史失败: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Database(format!("读取行失败: {}", e)))?;

        Ok(items)
    }

    /// 清空全部历史。
    pub fn clear(&self) -> Result<(), AppError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM scan_history", [])
            .map_err(|e| AppError::Database(format!("清空历史失败: {}", e)))?;
        Ok(())
    }
}
