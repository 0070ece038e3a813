// ==========================================
// 危废实验室装箱系统 - 领域模型层
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 1. 数据模型
// ==========================================
// 职责: 定义领域实体、类型、输出契约
// 红线: 不含引擎逻辑,不含 I/O
// ==========================================

pub mod assignment;
pub mod container;
pub mod manifest;
pub mod material;
pub mod types;

// 重导出核心类型
pub use assignment::{
    CategoryAssignment, CompatibilityCluster, CompatibilityResult, IncompatiblePair,
};
pub use container::{ContainerAssignment, ContainerMember, ShippingMetadata};
pub use manifest::{BatchSummary, LabPackManifest, Violation, ViolationType};
pub use material::{
    ComponentEntry, DqLevel, DqReport, DqSummary, DqViolation, FlashPoint, MaterialRecord,
    RawBatchRecord,
};
pub use types::{
    ContainerSize, HazardCategory, PhysicalState, SafetyLevel, Severity, WasteCodeKind,
};
