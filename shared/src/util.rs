//! 通用工具 — 时间戳与 ID 生成

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate an opaque resource ID (UUID v4).
///
/// Cart lines are created client-side before any server round trip,
/// so IDs must be generable without coordination.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
