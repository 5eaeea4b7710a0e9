// ==========================================
// 骑手排班系统 - 局部更新辅助
// ==========================================
// 可空字段的局部更新使用 Option<Option<T>>:
// - None: 未提供，保持原值
// - Some(None): 显式清空
// - Some(Some(v)): 设置为 v
// ==========================================

use serde::{Deserialize, Deserializer};

/// 反序列化 Option<Option<T>>，区分"缺省"与"显式 null"
///
/// 需与 `#[serde(default)]` 配合使用
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 应用可空字段补丁
pub fn apply_nullable<T>(target: &mut Option<T>, patch: Option<Option<T>>) {
    if let Some(value) = patch {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "double_option")]
        value: Option<Option<i64>>,
    }

    #[test]
    fn test_double_option_distinguishes_null() {
        let missing: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.value, None);

        let null: Probe = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(null.value, Some(None));

        let set: Probe = serde_json::from_str(r#"{"value": 3}"#).unwrap();
        assert_eq!(set.value, Some(Some(3)));
    }

    #[test]
    fn test_apply_nullable() {
        let mut target = Some(1);
        apply_nullable(&mut target, None);
        assert_eq!(target, Some(1));
        apply_nullable(&mut target, Some(None));
        assert_eq!(target, None);
        apply_nullable(&mut target, Some(Some(7)));
        assert_eq!(target, Some(7));
    }
}
