// ==========================================
// 危废实验室装箱系统 - 输出清单领域模型
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 6. 输出契约
// ==========================================
// 红线: 违规是数据不是异常,整改责任归调用方
// ==========================================

use crate::domain::assignment::{CategoryAssignment, IncompatiblePair};
use crate::domain::container::ContainerAssignment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ViolationType - 合规违规类型
// ==========================================
// 依据: LabPack_Engine_Specs 7. Compliance Checker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    IncompatiblePairColocated, // 不相容对同箱
    DotCombinationNotAllowed,  // DOT 类别组合不在白名单
    CapacityExceeded,          // 超过额定容积
    ListedWasteMixing,         // F 列名废物与非 F 项混装
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationType::IncompatiblePairColocated => write!(f, "INCOMPATIBLE_PAIR_COLOCATED"),
            ViolationType::DotCombinationNotAllowed => write!(f, "DOT_COMBINATION_NOT_ALLOWED"),
            ViolationType::CapacityExceeded => write!(f, "CAPACITY_EXCEEDED"),
            ViolationType::ListedWasteMixing => write!(f, "LISTED_WASTE_MIXING"),
        }
    }
}

// ==========================================
// Violation - 合规违规记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub violation_type: ViolationType,
    pub container_no: i32,
    pub material_ids: Vec<String>,
    pub message: String,
}

// ==========================================
// BatchSummary - 批次汇总统计
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_materials: usize,   // 输入材料数
    pub categorized: usize,       // 完成分类数
    pub manual_review: usize,     // 人工复核数
    pub cluster_count: usize,     // 相容性簇数
    pub container_count: usize,   // 容器数
    pub incompatible_pairs: usize, // 不相容对数
    pub violation_count: usize,   // 合规违规数
}

// ==========================================
// LabPackManifest - 装箱清单（输出契约）
// ==========================================
// 生命周期: 每批次派生一次,返回后引擎不保留任何状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabPackManifest {
    // ===== 批次元信息 =====
    pub batch_id: String,               // 批次 ID（UUID）
    pub generated_at: DateTime<Utc>,    // 生成时间

    // ===== 分类与相容性 =====
    pub chemical_categories: Vec<CategoryAssignment>, // 类别判定（按材料号升序）
    pub compatible_groups: Vec<Vec<String>>,          // 相容性簇成员列表
    pub incompatible_pairs: Vec<IncompatiblePair>,    // 不相容对
    pub segregation_required: bool,                   // 是否需要隔离运输

    // ===== 装箱 =====
    pub container_assignments: Vec<ContainerAssignment>, // 容器分配
    pub packaging_recommendations: Vec<String>,          // 包装要求（去重汇总）

    // ===== 合规与建议 =====
    pub violations: Vec<Violation>,   // 合规违规（数据,非异常）
    pub recommendations: Vec<String>, // 处置建议

    // ===== 汇总 =====
    pub summary: BatchSummary,
}
