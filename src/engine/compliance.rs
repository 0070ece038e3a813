// ==========================================
// 危废实验室装箱系统 - 合规检查引擎
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 7. Compliance Checker
// 红线: 违规是数据不是异常,检查失败绝不中断批次
// 红线: 检查器只读容器分配,不做任何修正
// ==========================================
// 职责: 装箱结果事后审计（不相容同箱 / DOT 组合 / 容量 / 列名废物混装）
// ==========================================

use crate::config::RuleConfig;
use crate::domain::container::ContainerAssignment;
use crate::domain::manifest::{Violation, ViolationType};
use crate::domain::material::MaterialRecord;
use crate::domain::types::WasteCodeKind;
use crate::engine::compatibility::CompatibilityMatrix;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{instrument, warn};

// ==========================================
// ComplianceChecker - 合规检查引擎
// ==========================================
pub struct ComplianceChecker {
    config: Arc<RuleConfig>,
}

impl ComplianceChecker {
    /// 创建新的 ComplianceChecker 实例
    pub fn new(config: Arc<RuleConfig>) -> Self {
        Self { config }
    }

    /// 审计全部容器分配
    ///
    /// # 检查项
    /// 1. INCOMPATIBLE_PAIR_COLOCATED: 不相容对出现在同一容器
    /// 2. DOT_COMBINATION_NOT_ALLOWED: 多 DOT 类别组合不在白名单
    /// 3. CAPACITY_EXCEEDED: 已装体积超出有效容量（额定 × fill_ratio）
    /// 4. LISTED_WASTE_MIXING: F 列名废物与非列名材料混装
    ///
    /// # 备注
    /// - 人工复核桶不参与检查（成员未完成分类,检查无意义）
    #[instrument(skip_all, fields(containers = containers.len()))]
    pub fn check(
        &self,
        containers: &[ContainerAssignment],
        matrix: &CompatibilityMatrix,
        materials: &[MaterialRecord],
    ) -> Vec<Violation> {
        let by_id: HashMap<&str, &MaterialRecord> = materials
            .iter()
            .map(|m| (m.material_id.as_str(), m))
            .collect();

        let mut violations = Vec::new();
        for container in containers {
            if container.is_manual_review {
                continue;
            }
            self.check_colocated_pairs(container, matrix, &mut violations);
            self.check_dot_combination(container, &by_id, &mut violations);
            self.check_capacity(container, &mut violations);
            self.check_listed_waste_mixing(container, &by_id, &mut violations);
        }

        if !violations.is_empty() {
            warn!(count = violations.len(), "检出合规违规");
        }
        violations
    }

    // ==========================================
    // 检查项实现
    // ==========================================

    fn check_colocated_pairs(
        &self,
        container: &ContainerAssignment,
        matrix: &CompatibilityMatrix,
        violations: &mut Vec<Violation>,
    ) {
        let ids = container.member_ids();
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let Some(result) = matrix.get(&ids[i], &ids[j]) else {
                    continue;
                };
                if !result.compatible {
                    violations.push(Violation {
                        violation_type: ViolationType::IncompatiblePairColocated,
                        container_no: container.container_no,
                        material_ids: vec![ids[i].clone(), ids[j].clone()],
                        message: format!(
                            "不相容对同箱 (严重度 {}): {}",
                            result.severity, result.reason
                        ),
                    });
                }
            }
        }
    }

    fn check_dot_combination(
        &self,
        container: &ContainerAssignment,
        materials: &HashMap<&str, &MaterialRecord>,
        violations: &mut Vec<Violation>,
    ) {
        let classes: BTreeSet<String> = container
            .members
            .iter()
            .filter_map(|m| materials.get(m.material_id.as_str()))
            .filter_map(|m| m.dot_hazard_class.clone())
            .collect();

        // 单一类别（含无类别）隐含允许
        if classes.len() <= 1 {
            return;
        }

        let allowed = self.config.allowed_dot_combinations.iter().any(|combo| {
            classes.iter().all(|c| combo.contains(c))
        });
        if !allowed {
            violations.push(Violation {
                violation_type: ViolationType::DotCombinationNotAllowed,
                container_no: container.container_no,
                material_ids: container.member_ids(),
                message: format!(
                    "DOT 类别组合 [{}] 不在同箱白名单",
                    classes.iter().cloned().collect::<Vec<_>>().join(", ")
                ),
            });
        }
    }

    fn check_capacity(&self, container: &ContainerAssignment, violations: &mut Vec<Violation>) {
        let effective = container.container_size.rated_capacity_l() * self.config.fill_ratio;
        if container.used_volume_l > effective + 1e-9 {
            violations.push(Violation {
                violation_type: ViolationType::CapacityExceeded,
                container_no: container.container_no,
                material_ids: container.member_ids(),
                message: format!(
                    "已装体积 {:.1}L 超出有效容量 {:.1}L (额定 {:.1}L × {:.2})",
                    container.used_volume_l,
                    effective,
                    container.container_size.rated_capacity_l(),
                    self.config.fill_ratio
                ),
            });
        }
    }

    fn check_listed_waste_mixing(
        &self,
        container: &ContainerAssignment,
        materials: &HashMap<&str, &MaterialRecord>,
        violations: &mut Vec<Violation>,
    ) {
        if container.members.len() <= 1 {
            return;
        }

        let has_f = |id: &str| {
            materials
                .get(id)
                .map(|m| {
                    m.waste_codes
                        .iter()
                        .any(|c| WasteCodeKind::classify(c) == WasteCodeKind::F)
                })
                .unwrap_or(false)
        };

        let f_members: Vec<String> = container
            .members
            .iter()
            .filter(|m| has_f(&m.material_id))
            .map(|m| m.material_id.clone())
            .collect();
        if f_members.is_empty() || f_members.len() == container.members.len() {
            return;
        }

        violations.push(Violation {
            violation_type: ViolationType::ListedWasteMixing,
            container_no: container.container_no,
            material_ids: container.member_ids(),
            message: format!(
                "F 列名废物 [{}] 与非列名材料混装,整箱将按列名废物管理",
                f_members.join(", ")
            ),
        });
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assignment::CompatibilityResult;
    use crate::domain::container::ContainerMember;
    use crate::domain::types::{ContainerSize, HazardCategory, PhysicalState, SafetyLevel, Severity};

    // ==========================================
    // 测试辅助函数
    // ==========================================
    fn create_test_material(
        material_id: &str,
        dot: Option<&str>,
        waste_codes: &[&str],
    ) -> MaterialRecord {
        MaterialRecord {
            material_id: material_id.to_string(),
            product_name: format!("Material {}", material_id),
            physical_state: PhysicalState::Liquid,
            ph: None,
            flash_point: None,
            dot_hazard_class: dot.map(String::from),
            un_number: None,
            waste_codes: waste_codes.iter().map(|s| s.to_string()).collect(),
            composition: vec![],
            volume_l: Some(4.0),
            weight_kg: Some(3.5),
        }
    }

    fn create_test_container(member_ids: &[&str], used_volume_l: f64) -> ContainerAssignment {
        ContainerAssignment {
            container_no: 1,
            primary_category: HazardCategory::FlammableOrganic,
            subcategory: None,
            members: member_ids
                .iter()
                .map(|id| ContainerMember {
                    material_id: id.to_string(),
                    product_name: format!("Material {}", id),
                    subcategory: "test".to_string(),
                    reasoning: "TEST".to_string(),
                })
                .collect(),
            requires_separate_container: false,
            safety_level: SafetyLevel::High,
            packaging_notes: vec![],
            container_size: ContainerSize::FiveGallon,
            used_volume_l,
            used_weight_kg: 0.0,
            dot_hazard_class: None,
            consolidated_waste_codes: vec![],
            shipping_description: None,
            container_classification: None,
            form_code: None,
            regulatory_citations: vec![],
            is_manual_review: false,
        }
    }

    fn checker() -> ComplianceChecker {
        ComplianceChecker::new(Arc::new(RuleConfig::default()))
    }

    #[test]
    fn test_colocated_incompatible_pair_flagged() {
        let checker = checker();
        let materials = vec![
            create_test_material("M001", None, &[]),
            create_test_material("M002", None, &[]),
        ];
        let mut matrix = CompatibilityMatrix::default();
        matrix.insert(
            "M001",
            "M002",
            CompatibilityResult::incompatible(Severity::Extreme, "TEST_CONFLICT"),
        );
        let containers = vec![create_test_container(&["M001", "M002"], 8.0)];

        let violations = checker.check(&containers, &matrix, &materials);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].violation_type,
            ViolationType::IncompatiblePairColocated
        );
        assert_eq!(violations[0].container_no, 1);
    }

    #[test]
    fn test_dot_combination_whitelist() {
        let checker = checker();
        let matrix = CompatibilityMatrix::default();

        // {3, 9} 在白名单中
        let materials_ok = vec![
            create_test_material("M001", Some("3"), &[]),
            create_test_material("M002", Some("9"), &[]),
        ];
        let containers = vec![create_test_container(&["M001", "M002"], 8.0)];
        let violations = checker.check(&containers, &matrix, &materials_ok);
        assert!(violations.is_empty());

        // {3, 8} 不在白名单中
        let materials_bad = vec![
            create_test_material("M001", Some("3"), &[]),
            create_test_material("M002", Some("8"), &[]),
        ];
        let violations = checker.check(&containers, &matrix, &materials_bad);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].violation_type,
            ViolationType::DotCombinationNotAllowed
        );
    }

    #[test]
    fn test_capacity_exceeded_flagged() {
        let checker = checker();
        let matrix = CompatibilityMatrix::default();
        let materials = vec![create_test_material("M001", None, &[])];
        // 5 加仑有效容量 16.15L
        let containers = vec![create_test_container(&["M001"], 18.0)];

        let violations = checker.check(&containers, &matrix, &materials);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].violation_type, ViolationType::CapacityExceeded);
    }

    #[test]
    fn test_listed_waste_mixing_flagged() {
        let checker = checker();
        let matrix = CompatibilityMatrix::default();
        let materials = vec![
            create_test_material("M001", None, &["F003"]),
            create_test_material("M002", None, &[]),
        ];
        let containers = vec![create_test_container(&["M001", "M002"], 8.0)];

        let violations = checker.check(&containers, &matrix, &materials);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].violation_type, ViolationType::ListedWasteMixing);
    }

    #[test]
    fn test_all_f_listed_members_not_flagged() {
        let checker = checker();
        let matrix = CompatibilityMatrix::default();
        let materials = vec![
            create_test_material("M001", None, &["F003"]),
            create_test_material("M002", None, &["F005"]),
        ];
        let containers = vec![create_test_container(&["M001", "M002"], 8.0)];

        let violations = checker.check(&containers, &matrix, &materials);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_manual_review_bucket_skipped() {
        let checker = checker();
        let matrix = CompatibilityMatrix::default();
        let materials = vec![
            create_test_material("M001", Some("3"), &[]),
            create_test_material("M002", Some("8"), &[]),
        ];
        let mut container = create_test_container(&["M001", "M002"], 20.0);
        container.is_manual_review = true;

        let violations = checker.check(&[container], &matrix, &materials);
        assert!(violations.is_empty());
    }
}
