// ==========================================
// 危废实验室装箱系统 - 材料领域模型
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 1. 数据模型
// 依据: SDS_Field_Mapping_v0.1.md - 批次文件字段映射
// ==========================================

use crate::domain::types::PhysicalState;
use serde::{Deserialize, Serialize};

// ==========================================
// FlashPoint - 闪点（双单位）
// ==========================================
// 来源字段可能只给华氏或只给摄氏,判定统一折算为摄氏
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlashPoint {
    pub celsius: Option<f64>,    // 摄氏闪点
    pub fahrenheit: Option<f64>, // 华氏闪点
}

impl FlashPoint {
    pub fn from_celsius(c: f64) -> Self {
        Self {
            celsius: Some(c),
            fahrenheit: None,
        }
    }

    pub fn from_fahrenheit(f: f64) -> Self {
        Self {
            celsius: None,
            fahrenheit: Some(f),
        }
    }

    /// 折算为摄氏温度
    ///
    /// # 规则
    /// - celsius 存在 → 直接使用
    /// - 否则 fahrenheit 存在 → (F - 32) * 5 / 9
    /// - 两者皆空 → None
    pub fn normalized_celsius(&self) -> Option<f64> {
        match (self.celsius, self.fahrenheit) {
            (Some(c), _) => Some(c),
            (None, Some(f)) => Some((f - 32.0) * 5.0 / 9.0),
            (None, None) => None,
        }
    }
}

// ==========================================
// ComponentEntry - 组分条目
// ==========================================
// 来源: SDS 第 3 节（成分/组分信息），顺序保留
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub name: String,               // 组分名称
    pub cas_number: Option<String>, // CAS 号
    pub percentage: Option<f64>,    // 质量百分比
}

// ==========================================
// MaterialRecord - 已分类材料记录
// ==========================================
// 红线: 引擎只读,不可变输入,所有权归调用方
// 用途: 上游分类协作方填充,引擎按批次消费
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRecord {
    // ===== 主键 =====
    pub material_id: String, // 材料唯一标识

    // ===== SDS 基础信息 =====
    pub product_name: String,               // 产品名称
    pub physical_state: PhysicalState,      // 物理状态
    pub ph: Option<f64>,                    // pH 值（非液体通常为空）
    pub flash_point: Option<FlashPoint>,    // 闪点
    pub dot_hazard_class: Option<String>,   // DOT 危险类别（如 "3"/"5.1"/"8"）
    pub un_number: Option<String>,          // UN 编号（如 "UN1090"）
    pub waste_codes: Vec<String>,           // EPA 废物代码集合（D/F/P/U）
    pub composition: Vec<ComponentEntry>,   // 组分列表（有序）

    // ===== 装箱维度 =====
    pub volume_l: Option<f64>,   // 体积估计（升）
    pub weight_kg: Option<f64>,  // 重量估计（千克）
}

impl MaterialRecord {
    /// 产品名称小写形式（关键词匹配统一口径）
    pub fn name_lower(&self) -> String {
        self.product_name.to_lowercase()
    }

    /// 是否携带任一 EPA 废物代码
    pub fn has_waste_codes(&self) -> bool {
        !self.waste_codes.is_empty()
    }
}

// ==========================================
// RawBatchRecord - 导入中间结构体
// ==========================================
// 用途: 导入管道中间产物（文件解析 → 字段映射 → 此结构）
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBatchRecord {
    pub material_id: Option<String>,
    pub product_name: Option<String>,
    pub physical_state: Option<String>, // 原始字符串,DQ 校验后解析
    pub ph: Option<f64>,
    pub flash_point_c: Option<f64>,
    pub flash_point_f: Option<f64>,
    pub dot_hazard_class: Option<String>,
    pub un_number: Option<String>,
    pub waste_codes: Vec<String>,
    pub composition: Vec<ComponentEntry>,
    pub volume_l: Option<f64>,
    pub weight_kg: Option<f64>,

    // 元信息
    #[serde(default)]
    pub row_number: usize, // 原始文件行号（用于 DQ 报告）
}

// ==========================================
// DqLevel - 数据质量级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DqLevel {
    Error,   // 错误（该行不进入引擎）
    Warning, // 警告（允许进入,引擎侧可能转人工复核）
    Info,    // 提示（仅记录）
}

// ==========================================
// DqViolation - 数据质量违规记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqViolation {
    pub row_number: usize,           // 原始文件行号
    pub material_id: Option<String>, // 材料号（如果可解析）
    pub level: DqLevel,              // 违规级别
    pub field: String,               // 违规字段
    pub message: String,             // 违规描述
}

// ==========================================
// DqSummary - 数据质量汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqSummary {
    pub total_rows: usize, // 总行数
    pub accepted: usize,   // 进入引擎行数
    pub blocked: usize,    // 阻断行数（ERROR）
    pub warning: usize,    // 警告行数（WARNING）
}

// ==========================================
// DqReport - 数据质量报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqReport {
    pub batch_file: Option<String>,   // 源文件名
    pub summary: DqSummary,           // 汇总统计
    pub violations: Vec<DqViolation>, // 违规明细
}
