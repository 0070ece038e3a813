// ==========================================
// 危废实验室装箱系统 - 批次编排引擎
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 1. 总体流程
// 红线: 引擎无状态,批次之间不保留任何数据
// 红线: 除 batch_id 与生成时间外,同输入必产生同输出（幂等）
// ==========================================
// 流程: 分类 → 相容矩阵 → 分簇 → 装箱 → 运输元数据 → 合规审计 → 清单
// 人工复核: 信息不完整材料集中进入专用复核桶,置于容器列表末尾
// ==========================================

use crate::config::RuleConfig;
use crate::domain::container::{ContainerAssignment, ContainerMember};
use crate::domain::manifest::{BatchSummary, LabPackManifest};
use crate::domain::material::MaterialRecord;
use crate::domain::types::{HazardCategory, SafetyLevel, Severity};
use crate::engine::category::CategoryAssigner;
use crate::engine::cluster::ClusterBuilder;
use crate::engine::compatibility::CompatibilityOracle;
use crate::engine::compliance::ComplianceChecker;
use crate::engine::packer::ContainerPacker;
use crate::engine::summarizer::ManifestSummarizer;
use crate::error::IncompleteRecordError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

// ==========================================
// LabPackOrchestrator - 批次编排引擎
// ==========================================
pub struct LabPackOrchestrator {
    assigner: CategoryAssigner,
    oracle: CompatibilityOracle,
    cluster_builder: ClusterBuilder,
    packer: ContainerPacker,
    summarizer: ManifestSummarizer,
    checker: ComplianceChecker,
}

impl LabPackOrchestrator {
    /// 创建新的 LabPackOrchestrator 实例
    ///
    /// # 参数
    /// - config: 规则配置（各引擎共享只读引用）
    pub fn new(config: Arc<RuleConfig>) -> Self {
        Self {
            assigner: CategoryAssigner::new(),
            oracle: CompatibilityOracle::new(Arc::clone(&config)),
            cluster_builder: ClusterBuilder::new(Arc::clone(&config)),
            packer: ContainerPacker::new(Arc::clone(&config)),
            summarizer: ManifestSummarizer::new(Arc::clone(&config)),
            checker: ComplianceChecker::new(config),
        }
    }

    /// 处理一个批次,返回装箱清单
    ///
    /// # 流程
    /// 1. 类别判定（不完整记录分流到人工复核）
    /// 2. 相容性矩阵（全对备忘计算）
    /// 3. 冲突图无冲突组分簇
    /// 4. FFD 装箱
    /// 5. 运输元数据回填
    /// 6. 人工复核桶追加（容器列表末位）
    /// 7. 合规审计 + 处置建议 + 汇总
    #[instrument(skip_all, fields(materials = materials.len()))]
    pub fn process_batch(&self, materials: &[MaterialRecord]) -> LabPackManifest {
        let batch_id = Uuid::new_v4().to_string();
        info!(batch_id = %batch_id, "批次处理开始");

        // === 步骤 1: 类别判定 ===
        let (mut assignments, manual_review) = self.assigner.assign_batch(materials);
        assignments.sort_by(|a, b| a.material_id.cmp(&b.material_id));
        info!(
            categorized = assignments.len(),
            manual_review = manual_review.len(),
            "类别判定完成"
        );

        // === 步骤 2: 相容性矩阵 ===
        let matrix = self.oracle.build_matrix(materials, &assignments);

        // === 步骤 3: 分簇 ===
        let clusters = self.cluster_builder.build(&assignments, &matrix);

        // === 步骤 4: 装箱 ===
        let mut containers = self.packer.pack(&clusters, materials, &assignments);

        // === 步骤 5: 运输元数据 ===
        self.summarizer.apply(&mut containers, materials);

        // === 步骤 6: 人工复核桶 ===
        if !manual_review.is_empty() {
            let next_no = containers.len() as i32 + 1;
            containers.push(Self::manual_review_bucket(next_no, &manual_review, materials));
        }

        // === 步骤 7: 合规审计与汇总 ===
        let violations = self.checker.check(&containers, &matrix, materials);
        let incompatible_pairs = matrix.incompatible_pairs();
        let segregation_required = clusters.iter().any(|c| c.forced_separation)
            || incompatible_pairs
                .iter()
                .any(|p| p.severity >= Severity::High);

        let packaging_recommendations = Self::collect_packaging_notes(&containers);
        let recommendations = Self::generate_recommendations(
            manual_review.len(),
            &incompatible_pairs.iter().map(|p| p.severity).collect::<Vec<_>>(),
            violations.len(),
            segregation_required,
        );

        let summary = BatchSummary {
            total_materials: materials.len(),
            categorized: assignments.len(),
            manual_review: manual_review.len(),
            cluster_count: clusters.len(),
            container_count: containers.len(),
            incompatible_pairs: incompatible_pairs.len(),
            violation_count: violations.len(),
        };

        info!(
            batch_id = %batch_id,
            containers = summary.container_count,
            violations = summary.violation_count,
            "批次处理完成"
        );

        LabPackManifest {
            batch_id,
            generated_at: chrono::Utc::now(),
            chemical_categories: assignments,
            compatible_groups: clusters.iter().map(|c| c.member_ids.clone()).collect(),
            incompatible_pairs,
            segregation_required,
            container_assignments: containers,
            packaging_recommendations,
            violations,
            recommendations,
            summary,
        }
    }

    // ==========================================
    // 人工复核桶
    // ==========================================
    // 保守策略: 复核桶按 EXTREME 处理并强制单独容器
    fn manual_review_bucket(
        container_no: i32,
        errors: &[IncompleteRecordError],
        materials: &[MaterialRecord],
    ) -> ContainerAssignment {
        let by_id: HashMap<&str, &MaterialRecord> = materials
            .iter()
            .map(|m| (m.material_id.as_str(), m))
            .collect();

        let mut members: Vec<ContainerMember> = errors
            .iter()
            .map(|e| ContainerMember {
                material_id: e.material_id.clone(),
                product_name: by_id
                    .get(e.material_id.as_str())
                    .map(|m| m.product_name.clone())
                    .unwrap_or_default(),
                subcategory: "manual_review".to_string(),
                reasoning: format!("MANUAL_REVIEW: {}", e),
            })
            .collect();
        members.sort_by(|a, b| a.material_id.cmp(&b.material_id));

        let used_volume_l = members
            .iter()
            .filter_map(|m| by_id.get(m.material_id.as_str()))
            .filter_map(|m| m.volume_l)
            .sum();
        let used_weight_kg = members
            .iter()
            .filter_map(|m| by_id.get(m.material_id.as_str()))
            .filter_map(|m| m.weight_kg)
            .sum();

        ContainerAssignment {
            container_no,
            primary_category: HazardCategory::NonHazardousLiquids,
            subcategory: Some("manual_review".to_string()),
            members,
            requires_separate_container: true,
            safety_level: SafetyLevel::Extreme,
            packaging_notes: vec![
                "MANUAL_REVIEW: 信息不完整,危险属性未确认,须人工复核后方可装箱".to_string(),
            ],
            container_size: crate::domain::types::ContainerSize::ThirtyGallon,
            used_volume_l,
            used_weight_kg,
            dot_hazard_class: None,
            consolidated_waste_codes: Vec::new(),
            shipping_description: None,
            container_classification: None,
            form_code: None,
            regulatory_citations: Vec::new(),
            is_manual_review: true,
        }
    }

    /// 包装要求去重汇总（保持首次出现顺序）
    fn collect_packaging_notes(containers: &[ContainerAssignment]) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut notes = Vec::new();
        for container in containers {
            for note in &container.packaging_notes {
                if seen.insert(note.clone()) {
                    notes.push(note.clone());
                }
            }
        }
        notes
    }

    /// 生成处置建议
    fn generate_recommendations(
        manual_review: usize,
        pair_severities: &[Severity],
        violation_count: usize,
        segregation_required: bool,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if manual_review > 0 {
            recommendations.push(format!(
                "{} 份材料信息不完整,已分流人工复核桶,补全 SDS 字段后重新提交",
                manual_review
            ));
        }
        if pair_severities.iter().any(|s| *s == Severity::Extreme) {
            recommendations.push(
                "批次存在极端不相容对,装卸与运输全程保持物理隔离".to_string(),
            );
        }
        if segregation_required {
            recommendations.push("存在强制隔离容器,运输时独立码放并避免堆叠".to_string());
        }
        if violation_count > 0 {
            recommendations.push(format!(
                "检出 {} 项合规违规,发运前须逐项整改并复核",
                violation_count
            ));
        }
        if recommendations.is_empty() {
            recommendations.push("批次无合规违规,可按清单装箱发运".to_string());
        }

        recommendations
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::material::FlashPoint;
    use crate::domain::types::PhysicalState;

    // ==========================================
    // 测试辅助函数
    // ==========================================
    fn create_test_material(material_id: &str, name: &str, state: PhysicalState) -> MaterialRecord {
        MaterialRecord {
            material_id: material_id.to_string(),
            product_name: name.to_string(),
            physical_state: state,
            ph: None,
            flash_point: None,
            dot_hazard_class: None,
            un_number: None,
            waste_codes: vec![],
            composition: vec![],
            volume_l: Some(4.0),
            weight_kg: Some(3.5),
        }
    }

    fn orchestrator() -> LabPackOrchestrator {
        LabPackOrchestrator::new(Arc::new(RuleConfig::default()))
    }

    fn sample_batch() -> Vec<MaterialRecord> {
        let mut acetone = create_test_material("M001", "Acetone", PhysicalState::Liquid);
        acetone.flash_point = Some(FlashPoint::from_celsius(-18.0));

        let mut acid =
            create_test_material("M002", "Hydrochloric Acid 37%", PhysicalState::Liquid);
        acid.ph = Some(0.1);
        acid.dot_hazard_class = Some("8".to_string());

        let mut cyanide =
            create_test_material("M003", "Potassium Cyanide", PhysicalState::Solid);
        cyanide.waste_codes = vec!["P098".to_string()];

        let mut incomplete =
            create_test_material("M004", "Mystery Liquid", PhysicalState::Liquid);
        incomplete.volume_l = None;

        vec![acetone, acid, cyanide, incomplete]
    }

    #[test]
    fn test_every_material_lands_in_exactly_one_container() {
        let orchestrator = orchestrator();
        let materials = sample_batch();

        let manifest = orchestrator.process_batch(&materials);

        let mut seen = std::collections::HashMap::new();
        for container in &manifest.container_assignments {
            for id in container.member_ids() {
                *seen.entry(id).or_insert(0usize) += 1;
            }
        }
        assert_eq!(seen.len(), materials.len());
        assert!(seen.values().all(|count| *count == 1));
    }

    #[test]
    fn test_manual_review_bucket_is_last_container() {
        let orchestrator = orchestrator();
        let manifest = orchestrator.process_batch(&sample_batch());

        let last = manifest.container_assignments.last().unwrap();
        assert!(last.is_manual_review);
        assert_eq!(last.member_ids(), vec!["M004"]);
        assert_eq!(last.safety_level, SafetyLevel::Extreme);
        assert!(last.requires_separate_container);
        // 前面的容器均非复核桶
        assert!(manifest.container_assignments[..manifest.container_assignments.len() - 1]
            .iter()
            .all(|c| !c.is_manual_review));
    }

    #[test]
    fn test_cyanide_acid_pair_reported_and_segregated() {
        let orchestrator = orchestrator();
        let manifest = orchestrator.process_batch(&sample_batch());

        let pair = manifest
            .incompatible_pairs
            .iter()
            .find(|p| p.material_a == "M002" && p.material_b == "M003")
            .unwrap();
        assert_eq!(pair.severity, Severity::Extreme);
        assert!(manifest.segregation_required);
    }

    #[test]
    fn test_summary_counts_consistent() {
        let orchestrator = orchestrator();
        let manifest = orchestrator.process_batch(&sample_batch());

        assert_eq!(manifest.summary.total_materials, 4);
        assert_eq!(manifest.summary.categorized, 3);
        assert_eq!(manifest.summary.manual_review, 1);
        assert_eq!(
            manifest.summary.container_count,
            manifest.container_assignments.len()
        );
        assert_eq!(
            manifest.summary.incompatible_pairs,
            manifest.incompatible_pairs.len()
        );
        assert_eq!(manifest.summary.violation_count, manifest.violations.len());
    }

    #[test]
    fn test_clean_packing_has_no_violations() {
        let orchestrator = orchestrator();
        let mut acetone = create_test_material("M001", "Acetone", PhysicalState::Liquid);
        acetone.flash_point = Some(FlashPoint::from_celsius(-18.0));
        let mut ipa =
            create_test_material("M002", "Isopropyl Alcohol", PhysicalState::Liquid);
        ipa.flash_point = Some(FlashPoint::from_celsius(12.0));

        let manifest = orchestrator.process_batch(&[acetone, ipa]);
        assert!(manifest.violations.is_empty());
        assert!(manifest
            .recommendations
            .iter()
            .any(|r| r.contains("可按清单装箱发运")));
    }

    #[test]
    fn test_process_batch_idempotent_modulo_batch_metadata() {
        let orchestrator = orchestrator();
        let materials = sample_batch();

        let first = orchestrator.process_batch(&materials);
        let second = orchestrator.process_batch(&materials);

        assert_ne!(first.batch_id, second.batch_id);
        assert_eq!(first.compatible_groups, second.compatible_groups);
        assert_eq!(
            first.incompatible_pairs.len(),
            second.incompatible_pairs.len()
        );
        assert_eq!(
            first.container_assignments.len(),
            second.container_assignments.len()
        );
        for (a, b) in first
            .container_assignments
            .iter()
            .zip(second.container_assignments.iter())
        {
            assert_eq!(a.member_ids(), b.member_ids());
            assert_eq!(a.container_size, b.container_size);
        }
    }

    #[test]
    fn test_chemical_categories_sorted_by_material_id() {
        let orchestrator = orchestrator();
        let mut materials = sample_batch();
        materials.reverse();

        let manifest = orchestrator.process_batch(&materials);
        let ids: Vec<&str> = manifest
            .chemical_categories
            .iter()
            .map(|a| a.material_id.as_str())
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
