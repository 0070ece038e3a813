// ==========================================
// 引擎模块 - 分类/相容/分簇/装箱/汇总/合规/编排
// ==========================================

pub mod category;
pub mod cluster;
pub mod compatibility;
pub mod compliance;
pub mod orchestrator;
pub mod packer;
pub mod summarizer;

pub use category::CategoryAssigner;
pub use cluster::{ClusterBuilder, ConflictGraph};
pub use compatibility::{CompatibilityMatrix, CompatibilityOracle};
pub use compliance::ComplianceChecker;
pub use orchestrator::LabPackOrchestrator;
pub use packer::ContainerPacker;
pub use summarizer::ManifestSummarizer;
