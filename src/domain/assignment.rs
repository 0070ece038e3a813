// ==========================================
// 危废实验室装箱系统 - 分类与相容性领域模型
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 2. Category Assigner / 3. Compatibility Oracle
// ==========================================
// 红线: 所有判定必须输出 reason（可审计）
// ==========================================

use crate::domain::types::{HazardCategory, SafetyLevel, Severity};
use serde::{Deserialize, Serialize};

// ==========================================
// CategoryAssignment - 类别判定结果
// ==========================================
// 用途: Category Assigner 输出,每批次每材料派生一次
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub material_id: String,             // 关联材料
    pub primary_category: HazardCategory, // 主类别
    pub subcategory: String,             // 子类别（如 "ketones"/"mineral_acids"）
    pub reasoning: String,               // 判定原因（审计链）
    pub safety_level: SafetyLevel,       // 安全等级
    pub is_fallback: bool,               // 是否兜底判定（未命中任何规则）
}

// ==========================================
// CompatibilityResult - 成对相容性判定结果
// ==========================================
// 红线: 纯函数输出,对称: check(A,B) == check(B,A)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub compatible: bool,  // 是否可同箱
    pub severity: Severity, // 不相容严重度（compatible=true 时为 NONE）
    pub reason: String,    // 判定原因
}

impl CompatibilityResult {
    /// 相容结果
    pub fn compatible(reason: impl Into<String>) -> Self {
        Self {
            compatible: true,
            severity: Severity::None,
            reason: reason.into(),
        }
    }

    /// 不相容结果
    pub fn incompatible(severity: Severity, reason: impl Into<String>) -> Self {
        Self {
            compatible: false,
            severity,
            reason: reason.into(),
        }
    }
}

// ==========================================
// IncompatiblePair - 不相容材料对（输出清单用）
// ==========================================
// 约定: material_a < material_b（字典序,保证幂等输出）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncompatiblePair {
    pub material_a: String,
    pub material_b: String,
    pub severity: Severity,
    pub reason: String,
}

impl IncompatiblePair {
    /// 构造规范化材料对（自动排序两端）
    pub fn new(a: &str, b: &str, severity: Severity, reason: impl Into<String>) -> Self {
        let (material_a, material_b) = if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };
        Self {
            material_a,
            material_b,
            severity,
            reason: reason.into(),
        }
    }
}

// ==========================================
// CompatibilityCluster - 相容性簇
// ==========================================
// 不变量: 簇内任意材料对之间不存在不相容边
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityCluster {
    pub cluster_id: String,               // 簇标识（C001 起）
    pub primary_category: HazardCategory, // 主类别
    pub subcategory: Option<String>,      // 子类别（簇内一致时填充）
    pub member_ids: Vec<String>,          // 成员材料（升序,保证确定性）
    pub forced_separation: bool,          // 强制隔离（EXTREME 或 incompatible-with-ALL）
    pub notes: Vec<String>,               // 审计备注
}

impl CompatibilityCluster {
    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_pair_normalizes_order() {
        let p1 = IncompatiblePair::new("M002", "M001", Severity::Extreme, "x");
        let p2 = IncompatiblePair::new("M001", "M002", Severity::Extreme, "x");
        assert_eq!(p1.material_a, "M001");
        assert_eq!(p1.material_b, "M002");
        assert_eq!(p2.material_a, p1.material_a);
        assert_eq!(p2.material_b, p1.material_b);
    }

    #[test]
    fn test_compatibility_result_constructors() {
        let ok = CompatibilityResult::compatible("DEFAULT_COMPATIBLE");
        assert!(ok.compatible);
        assert_eq!(ok.severity, Severity::None);

        let bad = CompatibilityResult::incompatible(Severity::High, "PH_GAP");
        assert!(!bad.compatible);
        assert_eq!(bad.severity, Severity::High);
    }
}
