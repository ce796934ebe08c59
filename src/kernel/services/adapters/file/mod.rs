//! 文件服务模块
//!
//! 本地 Provider 与受限根目录的 FileService

pub mod local;
pub mod service;

pub use local::LocalFileProvider;
pub use service::FileService;
