// ==========================================
// 危废实验室装箱系统 - 清单汇总引擎
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 6. Manifest Summarizer
// 依据: EPA_DOT_Rule_Tables_v0.1.md - DOT 主导序 / 表单代码 / 法规引用
// 红线: 纯派生计算,不修改成员归属,不产生副作用
// ==========================================
// 职责: 容器级运输元数据派生（废物代码合并、主导 DOT、运输描述、H/N 分类）
// ==========================================

use crate::config::RuleConfig;
use crate::domain::container::{ContainerAssignment, ShippingMetadata};
use crate::domain::material::MaterialRecord;
use crate::domain::types::WasteCodeKind;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

// ==========================================
// ManifestSummarizer - 清单汇总引擎
// ==========================================
pub struct ManifestSummarizer {
    config: Arc<RuleConfig>,
}

impl ManifestSummarizer {
    /// 创建新的 ManifestSummarizer 实例
    pub fn new(config: Arc<RuleConfig>) -> Self {
        Self { config }
    }

    /// 为所有容器回填运输元数据
    #[instrument(skip_all, fields(containers = containers.len()))]
    pub fn apply(&self, containers: &mut [ContainerAssignment], materials: &[MaterialRecord]) {
        let by_id: HashMap<&str, &MaterialRecord> = materials
            .iter()
            .map(|m| (m.material_id.as_str(), m))
            .collect();

        for container in containers.iter_mut() {
            let meta = self.summarize_container(container, &by_id);
            container.apply_shipping_metadata(meta);
        }
        debug!("运输元数据派生完成");
    }

    /// 派生单个容器的运输元数据
    ///
    /// # 规则
    /// 1. 废物代码: 成员并集去重,按 P > U > D > F > 其他 再字典序排序
    /// 2. 主导 DOT: 成员 DOT 类别按固定优先级表取最主导者
    /// 3. 容器分类: 危险类别或携带任一废物代码 → "H",否则 "N"
    /// 4. 运输描述: 按分类与主导 DOT 查模板表
    /// 5. 法规引用: 基础引用 + F 代码追加 261.31,P/U 代码追加 261.33
    pub fn summarize_container(
        &self,
        container: &ContainerAssignment,
        materials: &HashMap<&str, &MaterialRecord>,
    ) -> ShippingMetadata {
        let members: Vec<&MaterialRecord> = container
            .members
            .iter()
            .filter_map(|m| materials.get(m.material_id.as_str()).copied())
            .collect();

        // === 规则 1: 废物代码合并 ===
        let mut codes: Vec<String> = members
            .iter()
            .flat_map(|m| m.waste_codes.iter().cloned())
            .collect();
        codes.sort_by(|a, b| {
            WasteCodeKind::classify(a)
                .cmp(&WasteCodeKind::classify(b))
                .then_with(|| a.cmp(b))
        });
        codes.dedup();
        let primary_waste_code = codes.first().cloned();

        // === 规则 2: 主导 DOT 类别 ===
        let dominant_dot_class = members
            .iter()
            .filter_map(|m| m.dot_hazard_class.clone())
            .min_by_key(|c| self.config.dot_dominance_rank(c));

        // === 规则 3: 容器分类 ===
        let hazardous = container.primary_category.is_hazardous() || !codes.is_empty();
        let container_classification = if hazardous { "H" } else { "N" }.to_string();

        // === 规则 4: 运输描述 ===
        let template_key = if !hazardous {
            "NON_HAZ"
        } else {
            dominant_dot_class.as_deref().unwrap_or("DEFAULT")
        };
        let shipping_description = self
            .config
            .shipping_description_templates
            .get(template_key)
            .or_else(|| self.config.shipping_description_templates.get("DEFAULT"))
            .cloned()
            .unwrap_or_default();

        // === 规则 5: 法规引用 ===
        let mut regulatory_citations = self.config.base_citations.clone();
        if codes.iter().any(|c| WasteCodeKind::classify(c) == WasteCodeKind::F) {
            regulatory_citations.push("40 CFR 261.31 (F-listed wastes)".to_string());
        }
        if codes.iter().any(|c| {
            matches!(
                WasteCodeKind::classify(c),
                WasteCodeKind::P | WasteCodeKind::U
            )
        }) {
            regulatory_citations.push("40 CFR 261.33 (P/U-listed wastes)".to_string());
        }

        ShippingMetadata {
            dominant_dot_class,
            shipping_description,
            consolidated_waste_codes: codes,
            primary_waste_code,
            form_code: self.config.form_code(container.primary_category),
            container_classification,
            regulatory_citations,
        }
    }
}
