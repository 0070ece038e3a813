// ==========================================
// 危废实验室装箱系统 - 容器装箱引擎
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 5. Container Packer
// 依据: EPA_DOT_Rule_Tables_v0.1.md - 容器阶梯 / 填充率
// 红线: 容器不跨簇,running volume ≤ 额定容积 × fill_ratio
// 红线: 超尺寸单品单独占用最大容器并记录 OVERSIZE 备注,不中断批次
// ==========================================
// 职责: 首次适应递减（FFD）装箱
// 输入: CompatibilityCluster + MaterialRecord + CategoryAssignment
// 输出: Vec<ContainerAssignment>（容器序号 1 起,运输元数据留空待回填）
// ==========================================

use crate::config::{ContainerTier, RuleConfig};
use crate::domain::assignment::{CategoryAssignment, CompatibilityCluster};
use crate::domain::container::{ContainerAssignment, ContainerMember};
use crate::domain::material::MaterialRecord;
use crate::domain::types::{HazardCategory, SafetyLevel};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

// 装箱中间态
struct OpenContainer {
    tier: ContainerTier,
    used_volume_l: f64,
    used_weight_kg: f64,
    members: Vec<ContainerMember>,
    max_safety: SafetyLevel,
    notes: Vec<String>,
}

// ==========================================
// ContainerPacker - 容器装箱引擎
// ==========================================
pub struct ContainerPacker {
    config: Arc<RuleConfig>,
}

impl ContainerPacker {
    /// 创建新的 ContainerPacker 实例
    pub fn new(config: Arc<RuleConfig>) -> Self {
        Self { config }
    }

    /// 按簇装箱
    ///
    /// # 规则
    /// 1. 逐簇独立装箱,容器绝不跨簇
    /// 2. 簇内按体积降序（并列时材料号升序）排序
    /// 3. 首次适应: 放入第一个容量允许的已开容器
    /// 4. 无容器可放时开新容器: 取能容纳当前项的最小规格,
    ///    溢出自然落入下一个最小可容纳容器
    /// 5. 单品超过最大有效容量: 单独占用最大容器,记 OVERSIZE 备注
    #[instrument(skip_all, fields(clusters = clusters.len()))]
    pub fn pack(
        &self,
        clusters: &[CompatibilityCluster],
        materials: &[MaterialRecord],
        assignments: &[CategoryAssignment],
    ) -> Vec<ContainerAssignment> {
        let material_by_id: HashMap<&str, &MaterialRecord> = materials
            .iter()
            .map(|m| (m.material_id.as_str(), m))
            .collect();
        let assignment_by_id: HashMap<&str, &CategoryAssignment> = assignments
            .iter()
            .map(|a| (a.material_id.as_str(), a))
            .collect();

        let mut containers = Vec::new();
        let mut next_no = 1i32;

        for cluster in clusters {
            let packed = self.pack_cluster(cluster, &material_by_id, &assignment_by_id);
            for open in packed {
                containers.push(self.finish_container(next_no, cluster, open));
                next_no += 1;
            }
        }

        debug!(containers = containers.len(), "装箱完成");
        containers
    }

    // ==========================================
    // 单簇装箱
    // ==========================================
    fn pack_cluster(
        &self,
        cluster: &CompatibilityCluster,
        material_by_id: &HashMap<&str, &MaterialRecord>,
        assignment_by_id: &HashMap<&str, &CategoryAssignment>,
    ) -> Vec<OpenContainer> {
        // === 步骤 1: 收集成员并按体积降序排序 ===
        let mut items: Vec<(&MaterialRecord, &CategoryAssignment, f64)> = cluster
            .member_ids
            .iter()
            .filter_map(|id| {
                let material = material_by_id.get(id.as_str())?;
                let assignment = assignment_by_id.get(id.as_str())?;
                let volume = material.volume_l.unwrap_or(0.0);
                Some((*material, *assignment, volume))
            })
            .collect();
        items.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.material_id.cmp(&b.0.material_id))
        });

        let largest_tier = self
            .config
            .container_tiers
            .last()
            .cloned()
            .expect("容器阶梯经 validate() 保证非空");
        let max_effective = largest_tier.capacity_l * self.config.fill_ratio;

        let mut open: Vec<OpenContainer> = Vec::new();

        for (material, assignment, volume) in items {
            // === 步骤 5: 超尺寸单品 ===
            if volume > max_effective {
                warn!(
                    material_id = %material.material_id,
                    volume_l = volume,
                    "单品超过最大容器有效容量"
                );
                let mut container = self.open_container(largest_tier.clone(), cluster);
                container.notes.push(format!(
                    "OVERSIZE: {} 体积 {:.1}L 超过最大有效容量 {:.1}L,需单独处置",
                    material.material_id, volume, max_effective
                ));
                Self::place(&mut container, material, assignment, volume);
                open.push(container);
                continue;
            }

            // === 步骤 3: 首次适应 ===
            let fits = open.iter_mut().find(|c| {
                c.used_volume_l + volume <= c.tier.capacity_l * self.config.fill_ratio
            });
            match fits {
                Some(container) => Self::place(container, material, assignment, volume),
                None => {
                    // === 步骤 4: 开新容器 ===
                    let tier = self.select_tier(volume);
                    let mut container = self.open_container(tier, cluster);
                    Self::place(&mut container, material, assignment, volume);
                    open.push(container);
                }
            }
        }

        open
    }

    /// 选择新容器规格: 有效容量能装下当前项的最小规格
    fn select_tier(&self, item_volume: f64) -> ContainerTier {
        let effective = |tier: &ContainerTier| tier.capacity_l * self.config.fill_ratio;

        self.config
            .container_tiers
            .iter()
            .find(|t| effective(t) >= item_volume)
            .or_else(|| self.config.container_tiers.last())
            .cloned()
            .expect("容器阶梯经 validate() 保证非空")
    }

    fn open_container(&self, tier: ContainerTier, cluster: &CompatibilityCluster) -> OpenContainer {
        OpenContainer {
            tier,
            used_volume_l: 0.0,
            used_weight_kg: 0.0,
            members: Vec::new(),
            max_safety: SafetyLevel::Low,
            notes: Self::packaging_notes(cluster.primary_category),
        }
    }

    fn place(
        container: &mut OpenContainer,
        material: &MaterialRecord,
        assignment: &CategoryAssignment,
        volume: f64,
    ) {
        container.used_volume_l += volume;
        container.used_weight_kg += material.weight_kg.unwrap_or(0.0);
        container.max_safety = container.max_safety.max(assignment.safety_level);
        container.members.push(ContainerMember {
            material_id: material.material_id.clone(),
            product_name: material.product_name.clone(),
            subcategory: assignment.subcategory.clone(),
            reasoning: assignment.reasoning.clone(),
        });
    }

    fn finish_container(
        &self,
        container_no: i32,
        cluster: &CompatibilityCluster,
        open: OpenContainer,
    ) -> ContainerAssignment {
        let mut packaging_notes = open.notes;
        packaging_notes.extend(cluster.notes.iter().cloned());

        ContainerAssignment {
            container_no,
            primary_category: cluster.primary_category,
            subcategory: cluster.subcategory.clone(),
            members: open.members,
            requires_separate_container: cluster.forced_separation,
            safety_level: open.max_safety,
            packaging_notes,
            container_size: open.tier.size,
            used_volume_l: open.used_volume_l,
            used_weight_kg: open.used_weight_kg,
            dot_hazard_class: None,
            consolidated_waste_codes: Vec::new(),
            shipping_description: None,
            container_classification: None,
            form_code: None,
            regulatory_citations: Vec::new(),
            is_manual_review: false,
        }
    }

    /// 类别 → 包装要求
    fn packaging_notes(category: HazardCategory) -> Vec<String> {
        use HazardCategory::*;
        let mut notes = vec!["蛭石填充至无晃动,层间隔垫".to_string()];
        let extra = match category {
            Aerosols => "直立放置,防刺穿,远离热源",
            AcidsOxidizing => "耐酸独立包装,严禁与有机物接触",
            Cyanides => "双重密封包装,外附氰化物警示标签",
            ReactiveMetals => "矿物油覆盖保存,严禁接触水分",
            FlammableOrganic => "远离火源,容器接地防静电",
            AcidsInorganic => "耐酸内衬,瓶口向上垂直放置",
            BasesCaustic => "耐碱内衬,瓶口向上垂直放置",
            Oxidizers => "与可燃物隔离,避免受热",
            Toxics => "密封双袋包装,标注毒性警示",
            NonHazardousSolids | NonHazardousLiquids => "常规包装",
        };
        notes.push(extra.to_string());
        notes
    }
}
