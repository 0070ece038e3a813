// ==========================================
// 危废实验室装箱系统 - 容器领域模型
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 4. Container Packer / 5. Manifest Summarizer
// ==========================================

use crate::domain::types::{ContainerSize, HazardCategory, SafetyLevel};
use serde::{Deserialize, Serialize};

// ==========================================
// ContainerMember - 容器成员条目
// ==========================================
// 用途: 输出清单中的成员明细（id + 名称 + 判定链）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerMember {
    pub material_id: String,
    pub product_name: String,
    pub subcategory: String,
    pub reasoning: String, // 类别判定原因（审计链透传）
}

// ==========================================
// ShippingMetadata - 运输元数据
// ==========================================
// 用途: Manifest Summarizer 输出,纯派生无副作用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingMetadata {
    pub dominant_dot_class: Option<String>,    // 主导 DOT 类别（固定优先级表选择）
    pub shipping_description: String,          // 运输描述（按主导类别模板化）
    pub consolidated_waste_codes: Vec<String>, // 合并废物代码（P>U>D>F 排序）
    pub primary_waste_code: Option<String>,    // 主代码（优先级最高者）
    pub form_code: String,                     // 表单代码（按类别查表）
    pub container_classification: String,      // 容器分类（"H" / "N"）
    pub regulatory_citations: Vec<String>,     // 法规引用
}

// ==========================================
// ContainerAssignment - 容器分配结果
// ==========================================
// 不变量: running volume <= rated_capacity * fill_ratio（装箱阶段）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerAssignment {
    pub container_no: i32,                    // 容器序号（1 起）
    pub primary_category: HazardCategory,     // 主类别
    pub subcategory: Option<String>,          // 子类别
    pub members: Vec<ContainerMember>,        // 成员明细
    pub requires_separate_container: bool,    // 强制单独容器
    pub safety_level: SafetyLevel,            // 容器安全等级（成员最高）
    pub packaging_notes: Vec<String>,         // 包装要求备注
    pub container_size: ContainerSize,        // 容器规格
    pub used_volume_l: f64,                   // 已装体积（升）
    pub used_weight_kg: f64,                  // 已装重量（千克,跟踪项非硬约束）
    pub dot_hazard_class: Option<String>,     // 主导 DOT 类别
    pub consolidated_waste_codes: Vec<String>, // 合并废物代码
    pub shipping_description: Option<String>, // 运输描述
    pub container_classification: Option<String>, // 容器分类（H/N）
    pub form_code: Option<String>,            // 表单代码
    pub regulatory_citations: Vec<String>,    // 法规引用
    pub is_manual_review: bool,               // 是否人工复核桶
}

impl ContainerAssignment {
    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.material_id.clone()).collect()
    }

    /// 应用运输元数据（Summarizer 输出回填）
    pub fn apply_shipping_metadata(&mut self, meta: ShippingMetadata) {
        self.dot_hazard_class = meta.dominant_dot_class;
        self.consolidated_waste_codes = meta.consolidated_waste_codes;
        self.shipping_description = Some(meta.shipping_description);
        self.container_classification = Some(meta.container_classification);
        self.form_code = Some(meta.form_code);
        self.regulatory_citations = meta.regulatory_citations;
    }
}
