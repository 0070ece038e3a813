// ==========================================
// 危废实验室装箱系统 - 相容性判定引擎
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 3. Compatibility Oracle
// 依据: EPA_DOT_Rule_Tables_v0.1.md - 类别相容表 / 化学对规则
// 红线: 判定对称 check(A,B) == check(B,A),且同输入同输出
// 红线: 不相容结论必须有明确规则依据;未命中任何规则的对为相容（NONE）
//       异类分箱由簇构建阶段的类别分组保证,不借相容判定实现
// ==========================================
// 职责: 成对相容性判定 + 批次级备忘矩阵
// ==========================================

use crate::config::RuleConfig;
use crate::domain::assignment::{CategoryAssignment, CompatibilityResult, IncompatiblePair};
use crate::domain::material::MaterialRecord;
use crate::domain::types::{PhysicalState, Severity};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

// ==========================================
// CompatibilityMatrix - 批次备忘矩阵
// ==========================================
// 键为 (min_id, max_id),保证对称查询命中同一条目
#[derive(Debug, Clone, Default)]
pub struct CompatibilityMatrix {
    results: BTreeMap<(String, String), CompatibilityResult>,
}

impl CompatibilityMatrix {
    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    pub fn insert(&mut self, a: &str, b: &str, result: CompatibilityResult) {
        self.results.insert(Self::key(a, b), result);
    }

    /// 查询材料对的判定结果（对称）
    pub fn get(&self, a: &str, b: &str) -> Option<&CompatibilityResult> {
        self.results.get(&Self::key(a, b))
    }

    /// 材料对是否相容（未记录的对视为不相容,保守处理）
    pub fn is_compatible(&self, a: &str, b: &str) -> bool {
        self.get(a, b).map(|r| r.compatible).unwrap_or(false)
    }

    /// 导出全部不相容对（按规范化键升序,保证幂等输出）
    pub fn incompatible_pairs(&self) -> Vec<IncompatiblePair> {
        self.results
            .iter()
            .filter(|(_, r)| !r.compatible)
            .map(|((a, b), r)| IncompatiblePair::new(a, b, r.severity, r.reason.clone()))
            .collect()
    }

    pub fn pair_count(&self) -> usize {
        self.results.len()
    }
}

// ==========================================
// CompatibilityOracle - 相容性判定引擎
// ==========================================
pub struct CompatibilityOracle {
    config: Arc<RuleConfig>,
}

impl CompatibilityOracle {
    /// 创建新的 CompatibilityOracle 实例
    ///
    /// # 参数
    /// - config: 规则配置（只读）
    pub fn new(config: Arc<RuleConfig>) -> Self {
        Self { config }
    }

    /// 判定两份材料能否同箱
    ///
    /// # 规则（按序求值,首个不相容即定论）
    /// 1. 任一类别属于 incompatible-with-ALL → EXTREME 不相容
    /// 2. 类别对命中固定不相容表 → 按表严重度
    /// 3. 化学对规则（名称关键词交叉匹配,双向）
    /// 4. pH 差: 双液体且 |pH 差| ≥ 阈值 → HIGH
    ///    （规则 3/4 对同类别对仅在该类别要求逐对检查时运行）
    /// 5. 同主类别 → 相容（乐观缺省）
    /// 6. 显式白名单类别对 → 相容
    /// 7. 其余对 → 相容（NONE,无已知反应风险;异类分箱由类别分组保证）
    #[instrument(skip_all, fields(a = %assign_a.material_id, b = %assign_b.material_id))]
    pub fn check(
        &self,
        material_a: &MaterialRecord,
        assign_a: &CategoryAssignment,
        material_b: &MaterialRecord,
        assign_b: &CategoryAssignment,
    ) -> CompatibilityResult {
        let cat_a = assign_a.primary_category;
        let cat_b = assign_b.primary_category;

        // === 规则 1: incompatible-with-ALL ===
        for cat in [cat_a, cat_b] {
            if self.config.is_incompatible_with_all(cat) && cat_a != cat_b {
                return CompatibilityResult::incompatible(
                    Severity::Extreme,
                    format!("INCOMPATIBLE_WITH_ALL: {} 与任何其他类别不得同箱", cat),
                );
            }
        }

        // === 规则 2: 固定不相容类别对 ===
        if let Some(blocked) = self.config.blocked_pair(cat_a, cat_b) {
            return CompatibilityResult::incompatible(blocked.severity, blocked.reason.clone());
        }

        // === 规则 3/4: 逐对化学检查 ===
        // 同类别对仅在该类别列入逐对检查表时运行;跨类别对恒运行
        let pair_checks = cat_a != cat_b || self.config.requires_individual_check(cat_a);
        if pair_checks {
            if let Some(result) = self.check_chemical_pairs(material_a, material_b) {
                return result;
            }
            if let Some(result) = self.check_ph_gap(material_a, material_b) {
                return result;
            }
        }

        // === 规则 5: 同主类别 ===
        if cat_a == cat_b {
            let reason = if assign_a.subcategory == assign_b.subcategory {
                format!("SAME_SUBCATEGORY: 同类别同子类别 ({})", assign_a.subcategory)
            } else {
                format!("SAME_CATEGORY: 同主类别 ({})", cat_a)
            };
            return CompatibilityResult::compatible(reason);
        }

        // === 规则 6: 显式白名单 ===
        if self.config.is_whitelisted_pair(cat_a, cat_b) {
            return CompatibilityResult::compatible(format!(
                "WHITELISTED_PAIR: {} 与 {} 在可合并白名单中",
                cat_a, cat_b
            ));
        }

        // === 规则 7: 默认相容 ===
        // 异类材料仍按类别分箱（簇构建阶段按主类别分组）,
        // 此处仅声明"无已知反应风险",不得计入不相容对清单
        CompatibilityResult::compatible(format!(
            "CROSS_CATEGORY_DEFAULT: {} 与 {} 无已知反应风险,按类别分箱",
            cat_a, cat_b
        ))
    }

    /// 构建批次备忘矩阵（全对计算一次,下游只查矩阵）
    ///
    /// # 参数
    /// - materials: 批次材料（与 assignments 按 material_id 关联）
    /// - assignments: 类别判定结果
    pub fn build_matrix(
        &self,
        materials: &[MaterialRecord],
        assignments: &[CategoryAssignment],
    ) -> CompatibilityMatrix {
        let by_id: HashMap<&str, &MaterialRecord> = materials
            .iter()
            .map(|m| (m.material_id.as_str(), m))
            .collect();

        let mut matrix = CompatibilityMatrix::default();
        for i in 0..assignments.len() {
            for j in (i + 1)..assignments.len() {
                let assign_a = &assignments[i];
                let assign_b = &assignments[j];
                let (Some(mat_a), Some(mat_b)) = (
                    by_id.get(assign_a.material_id.as_str()),
                    by_id.get(assign_b.material_id.as_str()),
                ) else {
                    continue;
                };
                let result = self.check(mat_a, assign_a, mat_b, assign_b);
                matrix.insert(&assign_a.material_id, &assign_b.material_id, result);
            }
        }

        debug!(pairs = matrix.pair_count(), "相容性矩阵构建完成");
        matrix
    }

    // ==========================================
    // 判定子规则
    // ==========================================

    /// 化学对规则: 两侧关键词分别命中两份材料名称（双向匹配）
    fn check_chemical_pairs(
        &self,
        material_a: &MaterialRecord,
        material_b: &MaterialRecord,
    ) -> Option<CompatibilityResult> {
        let name_a = material_a.name_lower();
        let name_b = material_b.name_lower();
        let hit = |keywords: &[String], name: &str| keywords.iter().any(|kw| name.contains(kw));

        for rule in &self.config.chemical_pair_rules {
            let forward = hit(&rule.left_keywords, &name_a) && hit(&rule.right_keywords, &name_b);
            let backward = hit(&rule.left_keywords, &name_b) && hit(&rule.right_keywords, &name_a);
            if forward || backward {
                return Some(CompatibilityResult::incompatible(
                    rule.severity,
                    rule.reason.clone(),
                ));
            }
        }
        None
    }

    /// pH 差规则: 两液体 pH 差超阈值即视为酸碱冲突
    fn check_ph_gap(
        &self,
        material_a: &MaterialRecord,
        material_b: &MaterialRecord,
    ) -> Option<CompatibilityResult> {
        if material_a.physical_state != PhysicalState::Liquid
            || material_b.physical_state != PhysicalState::Liquid
        {
            return None;
        }
        let (Some(ph_a), Some(ph_b)) = (material_a.ph, material_b.ph) else {
            return None;
        };

        let gap = (ph_a - ph_b).abs();
        if gap >= self.config.ph_gap_threshold {
            return Some(CompatibilityResult::incompatible(
                Severity::High,
                format!(
                    "PH_GAP: 液体 pH 差 {:.1} ≥ {:.1},存在酸碱中和风险",
                    gap, self.config.ph_gap_threshold
                ),
            ));
        }
        None
    }
}
