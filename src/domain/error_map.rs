// ==========================================
// 设备维保管理系统 - 位置键错误集
// ==========================================
// 职责: 校验阶段按"逻辑位置"聚合错误消息(字段名/元数据槽位/条目行号)
// 红线: 校验永不短路,一条记录可携带多个位置多条消息
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ErrorMap - 位置键错误多重映射
// ==========================================
// 键序: BTreeMap 保证确定性遍历顺序(报告列/消息拼接稳定)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorMap<K: Ord> {
    entries: BTreeMap<K, Vec<String>>,
}

impl<K: Ord> ErrorMap<K> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// 追加一条错误消息（同一位置可累积多条）
    pub fn push(&mut self, key: K, message: impl Into<String>) {
        self.entries.entry(key).or_default().push(message.into());
    }

    /// 是否无任何错误
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 出错位置数
    pub fn location_count(&self) -> usize {
        self.entries.len()
    }

    /// 错误消息总数（跨位置）
    pub fn message_count(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }

    /// 指定位置的错误消息
    pub fn messages(&self, key: &K) -> Option<&Vec<String>> {
        self.entries.get(key)
    }

    /// 是否包含指定位置
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// 按键序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Vec<String>)> {
        self.entries.iter()
    }

    /// 按键序拼接全部消息（多字段违规合并为一条多行消息）
    pub fn joined(&self, sep: &str) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(self.message_count());
        for messages in self.entries.values() {
            for m in messages {
                parts.push(m.as_str());
            }
        }
        parts.join(sep)
    }

    /// 指定位置的消息拼接
    pub fn joined_at(&self, key: &K, sep: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.join(sep))
    }
}
