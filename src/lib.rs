// ==========================================
// 危废实验室装箱系统 - 核心库
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 系统宪法
// 系统定位: 装箱决策支持引擎 (人工最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 规则配置
pub mod config;

// 错误类型
pub mod error;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ContainerSize, HazardCategory, PhysicalState, SafetyLevel, Severity, WasteCodeKind,
};

// 领域实体
pub use domain::{
    BatchSummary, CategoryAssignment, CompatibilityCluster, CompatibilityResult,
    ContainerAssignment, DqReport, IncompatiblePair, LabPackManifest, MaterialRecord, Violation,
    ViolationType,
};

// 引擎
pub use engine::{
    CategoryAssigner, ClusterBuilder, CompatibilityMatrix, CompatibilityOracle, ComplianceChecker,
    ContainerPacker, LabPackOrchestrator, ManifestSummarizer,
};

// 配置与导入
pub use config::RuleConfig;
pub use error::{EngineError, EngineResult, IncompleteRecordError};
pub use importer::BatchImporter;

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "危废实验室装箱系统";
