// ==========================================
// 危废实验室装箱系统 - 领域类型定义
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 0.2 分类体系与等级制
// 依据: EPA_DOT_Rule_Tables_v0.1.md - 类别与容器规格
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 物理状态 (Physical State)
// ==========================================
// 红线: aerosol 必须独立于 liquid 判定（压力容器优先）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysicalState {
    Liquid,  // 液体
    Solid,   // 固体
    Gas,     // 气体
    Aerosol, // 气雾剂（压力容器）
}

impl fmt::Display for PhysicalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalState::Liquid => write!(f, "liquid"),
            PhysicalState::Solid => write!(f, "solid"),
            PhysicalState::Gas => write!(f, "gas"),
            PhysicalState::Aerosol => write!(f, "aerosol"),
        }
    }
}

impl PhysicalState {
    /// 从字符串解析物理状态（导入层用）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "liquid" | "l" => Some(PhysicalState::Liquid),
            "solid" | "s" => Some(PhysicalState::Solid),
            "gas" | "g" => Some(PhysicalState::Gas),
            "aerosol" | "a" => Some(PhysicalState::Aerosol),
            _ => None,
        }
    }
}

// ==========================================
// 安全等级 (Safety Level)
// ==========================================
// 红线: 等级制,不是评分制
// 顺序: Low < Moderate < High < Extreme
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyLevel {
    Low,      // 低危
    Moderate, // 中危
    High,     // 高危
    Extreme,  // 极危（强制单独成簇）
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyLevel::Low => write!(f, "LOW"),
            SafetyLevel::Moderate => write!(f, "MODERATE"),
            SafetyLevel::High => write!(f, "HIGH"),
            SafetyLevel::Extreme => write!(f, "EXTREME"),
        }
    }
}

// ==========================================
// 不相容严重度 (Incompatibility Severity)
// ==========================================
// 依据: LabPack_Engine_Specs 3.2 - 严重度体系
// 注: MODERATE 及以上在装箱阶段一律视为"不可同箱"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    None,     // 无冲突
    Moderate, // 中等
    High,     // 高
    Extreme,  // 极端（即时剧烈反应/毒气）
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "NONE"),
            Severity::Moderate => write!(f, "MODERATE"),
            Severity::High => write!(f, "HIGH"),
            Severity::Extreme => write!(f, "EXTREME"),
        }
    }
}

// ==========================================
// 化学类别 (Hazard Category)
// ==========================================
// 依据: EPA_DOT_Rule_Tables - 1. 类别分类表
// 序列化格式: snake_case (与输出清单一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardCategory {
    Aerosols,           // 气雾剂
    AcidsOxidizing,     // 氧化性酸（与所有类别不相容）
    Cyanides,           // 氰化物
    ReactiveMetals,     // 活泼金属（遇水反应）
    FlammableOrganic,   // 易燃有机液体
    AcidsInorganic,     // 无机酸
    BasesCaustic,       // 腐蚀性碱
    Oxidizers,          // 氧化剂
    Toxics,             // 毒害品
    NonHazardousSolids, // 非危固体
    NonHazardousLiquids, // 非危液体（保守兜底类别）
}

impl HazardCategory {
    /// 输出清单中使用的类别标识
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardCategory::Aerosols => "aerosols",
            HazardCategory::AcidsOxidizing => "acids_oxidizing",
            HazardCategory::Cyanides => "cyanides",
            HazardCategory::ReactiveMetals => "reactive_metals",
            HazardCategory::FlammableOrganic => "flammable_organic",
            HazardCategory::AcidsInorganic => "acids_inorganic",
            HazardCategory::BasesCaustic => "bases_caustic",
            HazardCategory::Oxidizers => "oxidizers",
            HazardCategory::Toxics => "toxics",
            HazardCategory::NonHazardousSolids => "non_hazardous_solids",
            HazardCategory::NonHazardousLiquids => "non_hazardous_liquids",
        }
    }

    /// 是否为非危类别（用于容器分类 H/N 判定）
    pub fn is_hazardous(&self) -> bool {
        !matches!(
            self,
            HazardCategory::NonHazardousSolids | HazardCategory::NonHazardousLiquids
        )
    }
}

impl fmt::Display for HazardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 容器规格 (Container Size)
// ==========================================
// 依据: EPA_DOT_Rule_Tables - 5. 容器阶梯表（加仑制）
// 顺序: 从小到大,装箱时选择能容纳首件的最小规格
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerSize {
    OneGallon,    // 1 加仑
    FiveGallon,   // 5 加仑
    TenGallon,    // 10 加仑
    ThirtyGallon, // 30 加仑
}

impl ContainerSize {
    /// 额定容积（升）
    pub fn rated_capacity_l(&self) -> f64 {
        match self {
            ContainerSize::OneGallon => 3.8,
            ContainerSize::FiveGallon => 19.0,
            ContainerSize::TenGallon => 38.0,
            ContainerSize::ThirtyGallon => 114.0,
        }
    }
}

impl fmt::Display for ContainerSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerSize::OneGallon => write!(f, "1_GALLON"),
            ContainerSize::FiveGallon => write!(f, "5_GALLON"),
            ContainerSize::TenGallon => write!(f, "10_GALLON"),
            ContainerSize::ThirtyGallon => write!(f, "30_GALLON"),
        }
    }
}

// ==========================================
// 废物代码种类 (Waste Code Kind)
// ==========================================
// 依据: EPA RCRA 代码体系（此处作为不透明标签处理）
// 主代码选择优先级: P > U > D (> F > 其他)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WasteCodeKind {
    P,     // 急性危险废物列名
    U,     // 危险废物列名
    D,     // 特性废物
    F,     // 来源列名
    Other, // 州代码等其他标签
}

impl WasteCodeKind {
    /// 按代码首字母归类
    pub fn classify(code: &str) -> Self {
        match code.trim().chars().next() {
            Some('P') | Some('p') => WasteCodeKind::P,
            Some('U') | Some('u') => WasteCodeKind::U,
            Some('D') | Some('d') => WasteCodeKind::D,
            Some('F') | Some('f') => WasteCodeKind::F,
            _ => WasteCodeKind::Other,
        }
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_level_ordering() {
        assert!(SafetyLevel::Low < SafetyLevel::Moderate);
        assert!(SafetyLevel::Moderate < SafetyLevel::High);
        assert!(SafetyLevel::High < SafetyLevel::Extreme);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::None < Severity::Moderate);
        assert!(Severity::Moderate < Severity::High);
        assert!(Severity::High < Severity::Extreme);
    }

    #[test]
    fn test_physical_state_parse() {
        assert_eq!(PhysicalState::parse("Liquid"), Some(PhysicalState::Liquid));
        assert_eq!(PhysicalState::parse(" aerosol "), Some(PhysicalState::Aerosol));
        assert_eq!(PhysicalState::parse("plasma"), None);
    }

    #[test]
    fn test_category_as_str() {
        assert_eq!(HazardCategory::AcidsOxidizing.as_str(), "acids_oxidizing");
        assert_eq!(HazardCategory::NonHazardousLiquids.as_str(), "non_hazardous_liquids");
    }

    #[test]
    fn test_category_is_hazardous() {
        assert!(HazardCategory::Cyanides.is_hazardous());
        assert!(!HazardCategory::NonHazardousSolids.is_hazardous());
    }

    #[test]
    fn test_container_capacity_ascending() {
        let tiers = [
            ContainerSize::OneGallon,
            ContainerSize::FiveGallon,
            ContainerSize::TenGallon,
            ContainerSize::ThirtyGallon,
        ];
        for pair in tiers.windows(2) {
            assert!(pair[0].rated_capacity_l() < pair[1].rated_capacity_l());
        }
    }

    #[test]
    fn test_waste_code_kind_classify() {
        assert_eq!(WasteCodeKind::classify("P030"), WasteCodeKind::P);
        assert_eq!(WasteCodeKind::classify("u002"), WasteCodeKind::U);
        assert_eq!(WasteCodeKind::classify("D001"), WasteCodeKind::D);
        assert_eq!(WasteCodeKind::classify("F003"), WasteCodeKind::F);
        assert_eq!(WasteCodeKind::classify("NY-B213"), WasteCodeKind::Other);
        assert!(WasteCodeKind::P < WasteCodeKind::U);
        assert!(WasteCodeKind::U < WasteCodeKind::D);
    }
}
