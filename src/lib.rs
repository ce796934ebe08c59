//! noteshell - 笔记外壳的无界面核心
//!
//! 模块结构：
//! - core: 路径约束（规范化、拼接、名称校验）
//! - models: 数据模型（IndexTree, Note）
//! - kernel: 笔记索引、响应式状态、标签页、工作区，以及 services（ports + adapters）
//! - logging: tracing 初始化

pub mod core;
pub mod kernel;
pub mod logging;
pub mod models;
