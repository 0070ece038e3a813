// ==========================================
// 危废实验室装箱系统 - 规则配置
// ==========================================
// 依据: EPA_DOT_Rule_Tables_v0.1.md - 全局规则表全集
// ==========================================
// 职责: 类别相容表、化学对规则、容器阶梯、DOT 主导序的
//      不可变配置。启动时加载一次,按引用传入各引擎。
// 红线: 规则表只读;引擎不得在运行中修改规则
// ==========================================

use crate::domain::types::{ContainerSize, HazardCategory, Severity};
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

// ==========================================
// ContainerTier - 容器阶梯条目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerTier {
    pub size: ContainerSize,
    pub capacity_l: f64, // 额定容积（升）
}

// ==========================================
// BlockedCategoryPair - 类别级不相容条目
// ==========================================
// 注: 无序对,查询时两向匹配
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedCategoryPair {
    pub category_a: HazardCategory,
    pub category_b: HazardCategory,
    pub severity: Severity,
    pub reason: String,
}

// ==========================================
// ChemicalPairRule - 已知危险化学对规则
// ==========================================
// 匹配口径: 两侧关键词分别命中两份材料的产品名称（小写子串,双向）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChemicalPairRule {
    pub code: String, // 规则代码（reason 前缀）
    pub left_keywords: Vec<String>,
    pub right_keywords: Vec<String>,
    pub severity: Severity,
    pub reason: String,
}

// ==========================================
// RuleConfig - 规则配置全集
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    // ===== 装箱参数 =====
    pub fill_ratio: f64,                  // 填充率上限（默认 0.85,预留填充介质/热胀空间）
    pub container_tiers: Vec<ContainerTier>, // 容器阶梯（升序）

    // ===== 类别级相容表 =====
    pub incompatible_with_all: Vec<HazardCategory>, // 与所有类别不相容
    pub blocked_category_pairs: Vec<BlockedCategoryPair>, // 固定不相容类别对
    pub compatible_category_pairs: Vec<(HazardCategory, HazardCategory)>, // 显式可合并白名单
    pub requires_individual_check: Vec<HazardCategory>, // 类内也需逐对检查的类别

    // ===== 化学对启发式 =====
    pub chemical_pair_rules: Vec<ChemicalPairRule>,
    pub ph_gap_threshold: f64, // 两液体 pH 差阈值（默认 10.0）

    // ===== DOT / 运输派生表 =====
    pub dot_dominance_order: Vec<String>,          // 主导类别全序优先级表
    pub allowed_dot_combinations: Vec<Vec<String>>, // 同箱 DOT 组合白名单（单类别隐含允许）
    pub shipping_description_templates: BTreeMap<String, String>, // 主导类别 → 运输描述
    pub form_codes: BTreeMap<String, String>,      // 类别标识 → 表单代码
    pub base_citations: Vec<String>,               // 基础法规引用
}

impl Default for RuleConfig {
    fn default() -> Self {
        use HazardCategory::*;

        Self {
            fill_ratio: 0.85,
            container_tiers: vec![
                ContainerTier { size: ContainerSize::OneGallon, capacity_l: 3.8 },
                ContainerTier { size: ContainerSize::FiveGallon, capacity_l: 19.0 },
                ContainerTier { size: ContainerSize::TenGallon, capacity_l: 38.0 },
                ContainerTier { size: ContainerSize::ThirtyGallon, capacity_l: 114.0 },
            ],

            incompatible_with_all: vec![AcidsOxidizing],

            blocked_category_pairs: vec![
                BlockedCategoryPair {
                    category_a: Cyanides,
                    category_b: AcidsInorganic,
                    severity: Severity::Extreme,
                    reason: "CYANIDE_ACID: 氰化物遇酸生成氰化氢气体".to_string(),
                },
                BlockedCategoryPair {
                    category_a: AcidsInorganic,
                    category_b: BasesCaustic,
                    severity: Severity::High,
                    reason: "ACID_BASE: 酸碱中和剧烈放热".to_string(),
                },
                BlockedCategoryPair {
                    category_a: AcidsInorganic,
                    category_b: ReactiveMetals,
                    severity: Severity::Extreme,
                    reason: "ACID_METAL: 活泼金属遇酸放出氢气".to_string(),
                },
                BlockedCategoryPair {
                    category_a: BasesCaustic,
                    category_b: ReactiveMetals,
                    severity: Severity::Extreme,
                    reason: "BASE_METAL: 活泼金属遇碱液放出氢气".to_string(),
                },
                BlockedCategoryPair {
                    category_a: Oxidizers,
                    category_b: FlammableOrganic,
                    severity: Severity::Extreme,
                    reason: "OXIDIZER_FUEL: 氧化剂与易燃有机物火灾/爆炸风险".to_string(),
                },
                BlockedCategoryPair {
                    category_a: Oxidizers,
                    category_b: ReactiveMetals,
                    severity: Severity::Extreme,
                    reason: "OXIDIZER_METAL: 氧化剂与活泼金属剧烈反应".to_string(),
                },
                BlockedCategoryPair {
                    category_a: Cyanides,
                    category_b: Oxidizers,
                    severity: Severity::High,
                    reason: "CYANIDE_OXIDIZER: 氰化物被氧化剂分解".to_string(),
                },
                BlockedCategoryPair {
                    category_a: ReactiveMetals,
                    category_b: NonHazardousLiquids,
                    severity: Severity::High,
                    reason: "WATER_REACTIVE: 遇水反应金属不得与含水液体同箱".to_string(),
                },
            ],

            // 显式可合并白名单: 未列出的类别对即使未检出冲突也不合并
            compatible_category_pairs: vec![(NonHazardousSolids, NonHazardousLiquids)],

            requires_individual_check: vec![
                AcidsOxidizing,
                AcidsInorganic,
                Oxidizers,
                Toxics,
                ReactiveMetals,
            ],

            chemical_pair_rules: vec![
                ChemicalPairRule {
                    code: "NITRIC_SULFURIC".to_string(),
                    left_keywords: vec!["nitric".to_string()],
                    right_keywords: vec!["sulfuric".to_string()],
                    severity: Severity::Extreme,
                    reason: "NITRIC_SULFURIC: 硝酸/硫酸混合具硝化爆炸风险".to_string(),
                },
                ChemicalPairRule {
                    code: "PEROXIDE_ORGANIC".to_string(),
                    left_keywords: vec!["peroxide".to_string()],
                    right_keywords: vec![
                        "acetone".to_string(),
                        "ether".to_string(),
                        "alcohol".to_string(),
                        "ethanol".to_string(),
                        "toluene".to_string(),
                        "solvent".to_string(),
                        "thinner".to_string(),
                    ],
                    severity: Severity::Extreme,
                    reason: "PEROXIDE_ORGANIC: 过氧化物与有机溶剂生成爆炸性过氧化产物".to_string(),
                },
                ChemicalPairRule {
                    code: "METAL_WATER".to_string(),
                    left_keywords: vec![
                        "sodium metal".to_string(),
                        "potassium metal".to_string(),
                        "lithium".to_string(),
                    ],
                    right_keywords: vec!["water".to_string(), "aqueous".to_string()],
                    severity: Severity::Extreme,
                    reason: "METAL_WATER: 碱金属遇水剧烈反应".to_string(),
                },
                ChemicalPairRule {
                    code: "CHLORAMINE_GAS".to_string(),
                    left_keywords: vec!["hypochlorite".to_string(), "bleach".to_string()],
                    right_keywords: vec!["ammonia".to_string(), "ammonium".to_string()],
                    severity: Severity::High,
                    reason: "CHLORAMINE_GAS: 次氯酸盐遇氨生成氯胺毒气".to_string(),
                },
                ChemicalPairRule {
                    code: "CHLORINE_GAS".to_string(),
                    left_keywords: vec!["hypochlorite".to_string(), "bleach".to_string()],
                    right_keywords: vec!["acid".to_string()],
                    severity: Severity::High,
                    reason: "CHLORINE_GAS: 次氯酸盐遇酸放出氯气".to_string(),
                },
                ChemicalPairRule {
                    code: "OXIDIZER_PAIR".to_string(),
                    left_keywords: vec!["permanganate".to_string()],
                    right_keywords: vec!["peroxide".to_string()],
                    severity: Severity::High,
                    reason: "OXIDIZER_PAIR: 高锰酸盐与过氧化物互促分解".to_string(),
                },
                ChemicalPairRule {
                    code: "PERMANGANATE_GLYCOL".to_string(),
                    left_keywords: vec!["permanganate".to_string()],
                    right_keywords: vec!["glycerin".to_string(), "glycol".to_string()],
                    severity: Severity::Extreme,
                    reason: "PERMANGANATE_GLYCOL: 高锰酸盐遇甘油自燃".to_string(),
                },
                ChemicalPairRule {
                    code: "PICRATE_METAL".to_string(),
                    left_keywords: vec!["picric".to_string()],
                    right_keywords: vec![
                        "metal".to_string(),
                        "zinc".to_string(),
                        "lead".to_string(),
                        "copper".to_string(),
                    ],
                    severity: Severity::Extreme,
                    reason: "PICRATE_METAL: 苦味酸遇金属生成敏感苦味酸盐".to_string(),
                },
            ],

            ph_gap_threshold: 10.0,

            dot_dominance_order: vec![
                "1.1", "1.2", "1.3", "2.3", "5.2", "4.2", "5.1", "2.1", "4.3", "4.1", "6.1",
                "8", "3", "2.2", "9",
            ]
            .into_iter()
            .map(String::from)
            .collect(),

            allowed_dot_combinations: vec![
                vec!["3".to_string(), "9".to_string()],
                vec!["8".to_string(), "9".to_string()],
                vec!["6.1".to_string(), "9".to_string()],
                vec!["4.1".to_string(), "9".to_string()],
                vec!["3".to_string(), "6.1".to_string()],
                vec!["3".to_string(), "6.1".to_string(), "9".to_string()],
                vec!["6.1".to_string(), "8".to_string()],
            ],

            shipping_description_templates: [
                ("3", "Waste Flammable Liquids, n.o.s., 3, UN1993, PG II (lab pack)"),
                ("8", "Waste Corrosive Liquids, n.o.s., 8, UN1760, PG II (lab pack)"),
                ("5.1", "Waste Oxidizing Solids, n.o.s., 5.1, UN1479, PG II (lab pack)"),
                ("6.1", "Waste Toxic Liquids, Organic, n.o.s., 6.1, UN2810, PG II (lab pack)"),
                ("4.3", "Waste Dangerous When Wet Material, n.o.s., 4.3, UN3208, PG I (lab pack)"),
                ("2.1", "Waste Aerosols, Flammable, 2.1, UN1950 (lab pack)"),
                ("2.2", "Waste Aerosols, Non-flammable, 2.2, UN1950 (lab pack)"),
                ("9", "Waste Environmentally Hazardous Substances, n.o.s., 9, UN3077 (lab pack)"),
                ("DEFAULT", "Waste Chemicals, n.o.s., 9, UN3335 (lab pack)"),
                ("NON_HAZ", "Non-Regulated Material, Non-Hazardous (lab pack)"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),

            form_codes: [
                ("aerosols", "W803"),
                ("acids_oxidizing", "W200"),
                ("acids_inorganic", "W200"),
                ("bases_caustic", "W201"),
                ("cyanides", "W209"),
                ("reactive_metals", "W405"),
                ("flammable_organic", "W202"),
                ("oxidizers", "W218"),
                ("toxics", "W219"),
                ("non_hazardous_solids", "W301"),
                ("non_hazardous_liquids", "W300"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),

            base_citations: vec![
                "40 CFR 264.316 (lab pack standard)".to_string(),
                "49 CFR 173.12 (DOT lab pack exceptions)".to_string(),
            ],
        }
    }
}

impl RuleConfig {
    /// 从 JSON 文件加载规则配置
    ///
    /// # 参数
    /// - path: 规则文件路径
    ///
    /// # 返回
    /// - Ok(RuleConfig): 加载并通过校验的配置
    /// - Err(EngineError): 文件缺失、解析失败或校验失败
    pub fn from_json_file(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            return Err(EngineError::RuleFileNotFound(path.display().to_string()));
        }

        let raw = std::fs::read_to_string(path)?;
        let config: RuleConfig = serde_json::from_str(&raw)?;
        config.validate()?;

        info!(
            path = %path.display(),
            blocked_pairs = config.blocked_category_pairs.len(),
            pair_rules = config.chemical_pair_rules.len(),
            tiers = config.container_tiers.len(),
            "规则配置加载完成"
        );

        Ok(config)
    }

    /// 校验规则配置有效性
    ///
    /// # 校验规则
    /// 1. fill_ratio ∈ (0.0, 1.0]
    /// 2. 容器阶梯非空且容积严格升序
    /// 3. DOT 主导序非空
    /// 4. pH 差阈值为有限正数
    pub fn validate(&self) -> EngineResult<()> {
        if !self.fill_ratio.is_finite() || self.fill_ratio <= 0.0 || self.fill_ratio > 1.0 {
            return Err(EngineError::InvalidRuleConfig(format!(
                "fill_ratio {} 超出有效范围 (0.0, 1.0]",
                self.fill_ratio
            )));
        }

        if self.container_tiers.is_empty() {
            return Err(EngineError::InvalidRuleConfig(
                "容器阶梯表不能为空".to_string(),
            ));
        }
        for pair in self.container_tiers.windows(2) {
            if pair[0].capacity_l >= pair[1].capacity_l {
                return Err(EngineError::InvalidRuleConfig(format!(
                    "容器阶梯容积必须严格升序: {} >= {}",
                    pair[0].capacity_l, pair[1].capacity_l
                )));
            }
        }

        if self.dot_dominance_order.is_empty() {
            return Err(EngineError::InvalidRuleConfig(
                "DOT 主导序不能为空".to_string(),
            ));
        }

        if !self.ph_gap_threshold.is_finite() || self.ph_gap_threshold <= 0.0 {
            return Err(EngineError::InvalidRuleConfig(format!(
                "pH 差阈值无效: {}",
                self.ph_gap_threshold
            )));
        }

        Ok(())
    }

    // ==========================================
    // 查询方法
    // ==========================================

    /// 类别是否与所有类别不相容
    pub fn is_incompatible_with_all(&self, category: HazardCategory) -> bool {
        self.incompatible_with_all.contains(&category)
    }

    /// 查询类别对是否在固定不相容表中（两向匹配）
    pub fn blocked_pair(
        &self,
        a: HazardCategory,
        b: HazardCategory,
    ) -> Option<&BlockedCategoryPair> {
        self.blocked_category_pairs.iter().find(|p| {
            (p.category_a == a && p.category_b == b) || (p.category_a == b && p.category_b == a)
        })
    }

    /// 类别对是否在显式可合并白名单中（两向匹配）
    pub fn is_whitelisted_pair(&self, a: HazardCategory, b: HazardCategory) -> bool {
        self.compatible_category_pairs
            .iter()
            .any(|(x, y)| (*x == a && *y == b) || (*x == b && *y == a))
    }

    /// 类别是否要求类内逐对检查
    pub fn requires_individual_check(&self, category: HazardCategory) -> bool {
        self.requires_individual_check.contains(&category)
    }

    /// DOT 类别的主导优先级（越小越主导,不在表中视为最低）
    pub fn dot_dominance_rank(&self, dot_class: &str) -> usize {
        self.dot_dominance_order
            .iter()
            .position(|c| c == dot_class)
            .unwrap_or(self.dot_dominance_order.len())
    }

    /// 类别对应的表单代码
    pub fn form_code(&self, category: HazardCategory) -> String {
        self.form_codes
            .get(category.as_str())
            .cloned()
            .unwrap_or_else(|| "W004".to_string())
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::HazardCategory::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = RuleConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fill_ratio_out_of_range_rejected() {
        let mut config = RuleConfig::default();
        config.fill_ratio = 1.5;
        assert!(config.validate().is_err());

        config.fill_ratio = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_tiers_rejected() {
        let mut config = RuleConfig::default();
        config.container_tiers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_ascending_tiers_rejected() {
        let mut config = RuleConfig::default();
        config.container_tiers.swap(0, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blocked_pair_symmetric_lookup() {
        let config = RuleConfig::default();
        let forward = config.blocked_pair(Cyanides, AcidsInorganic);
        let backward = config.blocked_pair(AcidsInorganic, Cyanides);
        assert!(forward.is_some());
        assert!(backward.is_some());
        assert_eq!(forward.unwrap().reason, backward.unwrap().reason);
    }

    #[test]
    fn test_incompatible_with_all_contains_oxidizing_acids() {
        let config = RuleConfig::default();
        assert!(config.is_incompatible_with_all(AcidsOxidizing));
        assert!(!config.is_incompatible_with_all(FlammableOrganic));
    }

    #[test]
    fn test_dot_dominance_rank() {
        let config = RuleConfig::default();
        // 5.1 主导于 3, 3 主导于 9
        assert!(config.dot_dominance_rank("5.1") < config.dot_dominance_rank("3"));
        assert!(config.dot_dominance_rank("3") < config.dot_dominance_rank("9"));
        // 未知类别视为最低优先级
        assert_eq!(
            config.dot_dominance_rank("X"),
            config.dot_dominance_order.len()
        );
    }

    #[test]
    fn test_whitelisted_pair_symmetric() {
        let config = RuleConfig::default();
        assert!(config.is_whitelisted_pair(NonHazardousSolids, NonHazardousLiquids));
        assert!(config.is_whitelisted_pair(NonHazardousLiquids, NonHazardousSolids));
        assert!(!config.is_whitelisted_pair(FlammableOrganic, NonHazardousSolids));
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = RuleConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RuleConfig = serde_json::from_str(&json).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.fill_ratio, config.fill_ratio);
        assert_eq!(
            parsed.blocked_category_pairs.len(),
            config.blocked_category_pairs.len()
        );
    }
}
