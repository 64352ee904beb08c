//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责应用生命周期和对外接口，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `server` - 应用入口
//! - 加载题库和评分规则
//! - 创建 LLM 服务和 InterviewFlow
//! - 启动 HTTP 服务并处理退出信号
//!
//! ### `routes` - HTTP 路由
//! - 解析请求参数，转交给 InterviewFlow
//! - 把结果序列化为 JSON 或文件下载
//!
//! ## 层次关系
//!
//! ```text
//! server / routes (HTTP 请求)
//!     ↓
//! workflow::InterviewFlow (处理单个会话的一轮)
//!     ↓
//! services (能力层：llm / feedback / artifact / submission)
//!     ↓
//! infrastructure (基础设施：SessionStore)
//! ```

pub mod routes;
pub mod server;

// 重新导出主要类型
pub use routes::router;
pub use server::App;
