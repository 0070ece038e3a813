// ==========================================
// 配置模块
// ==========================================

pub mod rule_config;

pub use rule_config::{BlockedCategoryPair, ChemicalPairRule, ContainerTier, RuleConfig};
