//! 核心工具模块

pub mod path;
