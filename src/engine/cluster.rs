// ==========================================
// 危废实验室装箱系统 - 相容簇构建引擎
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 4. Cluster Builder
// 红线: 同批次同输入必须产生同一簇划分与同一簇编号（幂等）
// 红线: EXTREME 安全等级材料不与较低等级材料同簇
// ==========================================
// 职责: 冲突图极大无冲突组 → 相容簇
// 输入: CategoryAssignment + CompatibilityMatrix
// 输出: Vec<CompatibilityCluster>（簇编号 C001 起）
// ==========================================

use crate::config::RuleConfig;
use crate::domain::assignment::{CategoryAssignment, CompatibilityCluster};
use crate::domain::types::SafetyLevel;
use crate::engine::compatibility::CompatibilityMatrix;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, instrument};

// ==========================================
// ConflictGraph - 冲突图
// ==========================================
// 节点为材料号,边为"不可同箱"关系;分簇取极大无冲突组
#[derive(Debug, Default)]
pub struct ConflictGraph {
    nodes: BTreeSet<String>,
    edges: BTreeSet<(String, String)>,
}

impl ConflictGraph {
    pub fn add_node(&mut self, id: &str) {
        self.nodes.insert(id.to_string());
    }

    /// 记录一条冲突边（无序,内部规范化为 (min, max)）
    pub fn add_conflict(&mut self, a: &str, b: &str) {
        self.add_node(a);
        self.add_node(b);
        let edge = if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };
        self.edges.insert(edge);
    }

    fn has_conflict(&self, a: &str, b: &str) -> bool {
        let edge = if a <= b { (a, b) } else { (b, a) };
        self.edges
            .contains(&(edge.0.to_string(), edge.1.to_string()))
    }

    /// 极大无冲突组（贪心,节点按材料号升序逐个开组）
    ///
    /// # 规则
    /// 1. 候选节点仅在与组内**全部**现有成员均无冲突边时入组
    /// 2. 组列表按首成员升序排列,组内升序,同输入同输出
    ///
    /// # 红线
    /// - 任一组内不得存在冲突边（否则装箱阶段会把不相容对放入同一容器）
    pub fn conflict_free_components(&self) -> Vec<Vec<String>> {
        let mut assigned: BTreeSet<&str> = BTreeSet::new();
        let mut components = Vec::new();

        for start in &self.nodes {
            if assigned.contains(start.as_str()) {
                continue;
            }

            let mut component = vec![start.as_str()];
            assigned.insert(start.as_str());

            for candidate in &self.nodes {
                if assigned.contains(candidate.as_str()) {
                    continue;
                }
                // 逐成员核对: 与某一成员相容不代表与全组相容
                let clashes = component
                    .iter()
                    .any(|member| self.has_conflict(member, candidate));
                if !clashes {
                    assigned.insert(candidate.as_str());
                    component.push(candidate.as_str());
                }
            }

            components.push(component.into_iter().map(str::to_string).collect());
        }

        components
    }
}

// ==========================================
// ClusterBuilder - 相容簇构建引擎
// ==========================================
pub struct ClusterBuilder {
    config: Arc<RuleConfig>,
}

impl ClusterBuilder {
    /// 创建新的 ClusterBuilder 实例
    pub fn new(config: Arc<RuleConfig>) -> Self {
        Self { config }
    }

    /// 构建批次相容簇
    ///
    /// # 规则
    /// 1. 按主类别分组（类别字典序遍历,保证确定性）
    /// 2. 类别内 EXTREME 材料单独处理: 按子类别再分组,
    ///    组内建冲突图取无冲突组,每组为强制隔离簇
    /// 3. 其余材料建冲突图（矩阵中不相容对即冲突边）取无冲突组
    /// 4. 簇编号按生成顺序 C001 起
    #[instrument(skip_all, fields(assignments = assignments.len()))]
    pub fn build(
        &self,
        assignments: &[CategoryAssignment],
        matrix: &CompatibilityMatrix,
    ) -> Vec<CompatibilityCluster> {
        // === 步骤 1: 按主类别分组 ===
        let mut by_category: BTreeMap<&str, Vec<&CategoryAssignment>> = BTreeMap::new();
        for assignment in assignments {
            by_category
                .entry(assignment.primary_category.as_str())
                .or_default()
                .push(assignment);
        }

        let mut clusters = Vec::new();
        let mut next_id = 1usize;

        for (_, group) in by_category {
            let category = group[0].primary_category;
            let forced_category = self.config.is_incompatible_with_all(category);

            // === 步骤 2: EXTREME 材料按子类别隔离 ===
            let (extreme, normal): (Vec<_>, Vec<_>) = group
                .into_iter()
                .partition(|a| a.safety_level == SafetyLevel::Extreme);

            let mut by_subcategory: BTreeMap<&str, Vec<&CategoryAssignment>> = BTreeMap::new();
            for assignment in extreme {
                by_subcategory
                    .entry(assignment.subcategory.as_str())
                    .or_default()
                    .push(assignment);
            }
            for (subcategory, members) in by_subcategory {
                for component in Self::split_components(&members, matrix) {
                    clusters.push(CompatibilityCluster {
                        cluster_id: format!("C{:03}", next_id),
                        primary_category: category,
                        subcategory: Some(subcategory.to_string()),
                        member_ids: component,
                        forced_separation: true,
                        notes: vec![format!(
                            "FORCED_SEPARATION: EXTREME 安全等级,{} 类别单独隔离装箱",
                            category
                        )],
                    });
                    next_id += 1;
                }
            }

            // === 步骤 3: 其余材料取无冲突组 ===
            if normal.is_empty() {
                continue;
            }
            let subcategory_uniform = Self::uniform_subcategory(&normal);
            for component in Self::split_components(&normal, matrix) {
                clusters.push(CompatibilityCluster {
                    cluster_id: format!("C{:03}", next_id),
                    primary_category: category,
                    subcategory: subcategory_uniform.clone(),
                    member_ids: component,
                    forced_separation: forced_category,
                    notes: vec![],
                });
                next_id += 1;
            }
        }

        debug!(clusters = clusters.len(), "相容簇构建完成");
        clusters
    }

    /// 组内冲突图无冲突组拆分
    fn split_components(
        members: &[&CategoryAssignment],
        matrix: &CompatibilityMatrix,
    ) -> Vec<Vec<String>> {
        let mut graph = ConflictGraph::default();
        for member in members {
            graph.add_node(&member.material_id);
        }
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                let a = &members[i].material_id;
                let b = &members[j].material_id;
                if !matrix.is_compatible(a, b) {
                    graph.add_conflict(a, b);
                }
            }
        }
        graph.conflict_free_components()
    }

    /// 组内子类别一致时返回 Some,否则 None
    fn uniform_subcategory(members: &[&CategoryAssignment]) -> Option<String> {
        let first = &members[0].subcategory;
        if members.iter().all(|m| &m.subcategory == first) {
            Some(first.clone())
        } else {
            None
        }
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assignment::CompatibilityResult;
    use crate::domain::types::{HazardCategory, Severity};

    // ==========================================
    // 测试辅助函数
    // ==========================================
    fn create_test_assignment(
        material_id: &str,
        category: HazardCategory,
        subcategory: &str,
        safety: SafetyLevel,
    ) -> CategoryAssignment {
        CategoryAssignment {
            material_id: material_id.to_string(),
            primary_category: category,
            subcategory: subcategory.to_string(),
            reasoning: "TEST".to_string(),
            safety_level: safety,
            is_fallback: false,
        }
    }

    /// 按判定结果填充矩阵: pairs 中的对不相容,其余全相容
    fn matrix_with_conflicts(ids: &[&str], conflicts: &[(&str, &str)]) -> CompatibilityMatrix {
        let mut matrix = CompatibilityMatrix::default();
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let conflict = conflicts.iter().any(|(a, b)| {
                    (*a == ids[i] && *b == ids[j]) || (*a == ids[j] && *b == ids[i])
                });
                let result = if conflict {
                    CompatibilityResult::incompatible(Severity::High, "TEST_CONFLICT")
                } else {
                    CompatibilityResult::compatible("TEST_OK")
                };
                matrix.insert(ids[i], ids[j], result);
            }
        }
        matrix
    }

    fn builder() -> ClusterBuilder {
        ClusterBuilder::new(Arc::new(RuleConfig::default()))
    }

    #[test]
    fn test_components_split_on_conflict() {
        let mut graph = ConflictGraph::default();
        for id in ["M001", "M002", "M003"] {
            graph.add_node(id);
        }
        graph.add_conflict("M001", "M002");
        graph.add_conflict("M001", "M003");
        graph.add_conflict("M002", "M003");

        // 全冲突: 三个单点组
        let components = graph.conflict_free_components();
        assert_eq!(components.len(), 3);
    }

    #[test]
    fn test_components_merge_without_conflict() {
        let mut graph = ConflictGraph::default();
        for id in ["M003", "M001", "M002"] {
            graph.add_node(id);
        }

        let components = graph.conflict_free_components();
        assert_eq!(components.len(), 1);
        // 成员升序
        assert_eq!(components[0], vec!["M001", "M002", "M003"]);
    }

    #[test]
    fn test_components_never_bridge_conflict_via_shared_neighbor() {
        // M001-M002 冲突,两者均与 M003 相容:
        // M003 不得把冲突对桥接进同一组
        let mut graph = ConflictGraph::default();
        for id in ["M001", "M002", "M003"] {
            graph.add_node(id);
        }
        graph.add_conflict("M001", "M002");

        let components = graph.conflict_free_components();
        assert_eq!(components, vec![vec!["M001", "M003"], vec!["M002"]]);
        for component in &components {
            for i in 0..component.len() {
                for j in (i + 1)..component.len() {
                    assert!(!graph.has_conflict(&component[i], &component[j]));
                }
            }
        }
    }

    #[test]
    fn test_same_subcategory_single_cluster() {
        let builder = builder();
        let assignments = vec![
            create_test_assignment(
                "M002",
                HazardCategory::FlammableOrganic,
                "ketones",
                SafetyLevel::High,
            ),
            create_test_assignment(
                "M001",
                HazardCategory::FlammableOrganic,
                "ketones",
                SafetyLevel::High,
            ),
        ];
        let matrix = matrix_with_conflicts(&["M001", "M002"], &[]);

        let clusters = builder.build(&assignments, &matrix);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cluster_id, "C001");
        assert_eq!(clusters[0].member_ids, vec!["M001", "M002"]);
        assert_eq!(clusters[0].subcategory.as_deref(), Some("ketones"));
        assert!(!clusters[0].forced_separation);
    }

    #[test]
    fn test_extreme_members_isolated_from_high() {
        let builder = builder();
        let assignments = vec![
            create_test_assignment(
                "M001",
                HazardCategory::Cyanides,
                "inorganic_cyanides",
                SafetyLevel::Extreme,
            ),
            create_test_assignment(
                "M002",
                HazardCategory::Toxics,
                "toxic_metals",
                SafetyLevel::High,
            ),
        ];
        let matrix = matrix_with_conflicts(&["M001", "M002"], &[("M001", "M002")]);

        let clusters = builder.build(&assignments, &matrix);
        assert_eq!(clusters.len(), 2);
        let cyanide_cluster = clusters
            .iter()
            .find(|c| c.primary_category == HazardCategory::Cyanides)
            .unwrap();
        assert!(cyanide_cluster.forced_separation);
        assert!(cyanide_cluster.notes[0].contains("FORCED_SEPARATION"));
    }

    #[test]
    fn test_extreme_same_subcategory_may_share_cluster() {
        // 单点隔离不搞过度拆分: 同类别同子类别且两两相容的 EXTREME 材料可同簇
        let builder = builder();
        let assignments = vec![
            create_test_assignment(
                "M001",
                HazardCategory::Cyanides,
                "inorganic_cyanides",
                SafetyLevel::Extreme,
            ),
            create_test_assignment(
                "M002",
                HazardCategory::Cyanides,
                "inorganic_cyanides",
                SafetyLevel::Extreme,
            ),
        ];
        let matrix = matrix_with_conflicts(&["M001", "M002"], &[]);

        let clusters = builder.build(&assignments, &matrix);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].member_ids, vec!["M001", "M002"]);
        assert!(clusters[0].forced_separation);
    }

    #[test]
    fn test_intra_category_conflict_splits_cluster() {
        let builder = builder();
        let assignments = vec![
            create_test_assignment(
                "M001",
                HazardCategory::Oxidizers,
                "liquid_oxidizers",
                SafetyLevel::High,
            ),
            create_test_assignment(
                "M002",
                HazardCategory::Oxidizers,
                "solid_oxidizers",
                SafetyLevel::High,
            ),
        ];
        let matrix = matrix_with_conflicts(&["M001", "M002"], &[("M001", "M002")]);

        let clusters = builder.build(&assignments, &matrix);
        assert_eq!(clusters.len(), 2);
        // 子类别不一致且被拆分: 每簇单成员
        assert!(clusters.iter().all(|c| c.member_count() == 1));
    }

    #[test]
    fn test_build_is_idempotent() {
        let builder = builder();
        let assignments = vec![
            create_test_assignment(
                "M003",
                HazardCategory::FlammableOrganic,
                "alcohols",
                SafetyLevel::High,
            ),
            create_test_assignment(
                "M001",
                HazardCategory::AcidsInorganic,
                "mineral_acids",
                SafetyLevel::High,
            ),
            create_test_assignment(
                "M002",
                HazardCategory::FlammableOrganic,
                "ketones",
                SafetyLevel::High,
            ),
        ];
        let matrix = matrix_with_conflicts(&["M001", "M002", "M003"], &[]);

        let first = builder.build(&assignments, &matrix);
        let second = builder.build(&assignments, &matrix);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.cluster_id, b.cluster_id);
            assert_eq!(a.member_ids, b.member_ids);
        }
    }
}
