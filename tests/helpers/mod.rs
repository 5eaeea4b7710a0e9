// ==========================================
// 集成测试公共模块
// ==========================================
// 各测试 crate 只使用其中一部分
#![allow(dead_code)]

pub mod api_test_helper;
pub mod test_data_builder;
