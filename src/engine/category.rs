// ==========================================
// 危废实验室装箱系统 - 类别判定引擎
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md - 2. Category Assigner
// 红线: 规则按固定顺序逐条求值,首个命中即定论（first-match-wins）
// 红线: 引擎绝不猜测危险属性,关键字段缺失 → 人工复核
// ==========================================
// 职责: SDS 字段 → 主类别 + 子类别 + 安全等级 + 判定原因
// 输入: MaterialRecord（只读）
// 输出: CategoryAssignment 或 IncompleteRecordError
// ==========================================

use crate::domain::assignment::CategoryAssignment;
use crate::domain::material::MaterialRecord;
use crate::domain::types::{HazardCategory, PhysicalState, SafetyLevel};
use crate::error::IncompleteRecordError;
use tracing::{debug, instrument};

// 易燃液体闪点阈值（摄氏,GHS 第 3 类上限）
const FLAMMABLE_FLASH_POINT_C: f64 = 60.0;
// 强酸 pH 上限 / 强碱 pH 下限（40 CFR 261.22 口径）
const ACID_PH_MAX: f64 = 2.0;
const BASE_PH_MIN: f64 = 12.5;

// 规则谓词引用的 UN 编号集合（49 CFR 172.101 口径）
const UN_AEROSOLS: &[&str] = &["UN1950"];
const UN_OXIDIZING_ACIDS: &[&str] = &["UN2031", "UN1873", "UN1755"];
const UN_WATER_REACTIVES: &[&str] = &["UN1428", "UN2257", "UN1415"];

// ==========================================
// CategoryAssigner - 类别判定引擎
// ==========================================
// 红线: 无状态,规则表内置,同一输入必产生同一输出
pub struct CategoryAssigner;

impl CategoryAssigner {
    pub fn new() -> Self {
        Self
    }

    /// 判定单个材料的危险类别
    ///
    /// # 规则（按序求值,首个命中即返回）
    /// 1. 气雾剂（压力容器状态或 UN1950,优先于一切液体规则）
    /// 2. 氧化性酸（nitric/perchloric/chromic,DOT 5.1 + acid,或 UN 编号集）
    /// 3. 氰化物（名称/组分/P 代码）
    /// 4. 活泼金属（碱金属/DOT 4.3/UN 编号集）
    /// 5. 易燃有机物（液体且闪点 < 60°C,或 DOT 3,或溶剂关键词）
    /// 6. 无机酸（液体且 pH ≤ 2.0,或液体 DOT 8 + acid）
    /// 7. 腐蚀性碱（液体且 pH ≥ 12.5,或液体 DOT 8 + 碱关键词）
    /// 8. 氧化剂（DOT 5.1 或氧化剂关键词）
    /// 9. 毒性物质（DOT 6.1 或毒性金属/有机毒物关键词）
    /// 10. 非危固体 / 11. 非危液体
    /// 12. 兜底: non_hazardous_liquids + is_fallback + MODERATE
    ///
    /// # 返回
    /// - Ok(CategoryAssignment): 含判定原因（审计链）
    /// - Err(IncompleteRecordError): 关键字段缺失,转人工复核
    #[instrument(skip(self, material), fields(material_id = %material.material_id))]
    pub fn assign(
        &self,
        material: &MaterialRecord,
    ) -> Result<CategoryAssignment, IncompleteRecordError> {
        // === 步骤 1: 完整性检查 ===
        self.check_completeness(material)?;

        let name = material.name_lower();
        let dot = material.dot_hazard_class.as_deref().unwrap_or("");

        // === 步骤 2: 按序求值规则表 ===
        let (category, subcategory, reasoning, is_fallback) =
            self.evaluate_rules(material, &name, dot);

        let safety_level = if is_fallback {
            SafetyLevel::Moderate // 兜底判定保守处理
        } else {
            Self::safety_level_for(category)
        };

        debug!(
            category = category.as_str(),
            subcategory = %subcategory,
            safety = %safety_level,
            fallback = is_fallback,
            "类别判定完成"
        );

        Ok(CategoryAssignment {
            material_id: material.material_id.clone(),
            primary_category: category,
            subcategory,
            reasoning,
            safety_level,
            is_fallback,
        })
    }

    /// 批量判定
    ///
    /// # 返回
    /// - (判定成功列表, 人工复核列表)
    pub fn assign_batch(
        &self,
        materials: &[MaterialRecord],
    ) -> (Vec<CategoryAssignment>, Vec<IncompleteRecordError>) {
        let mut assignments = Vec::with_capacity(materials.len());
        let mut manual_review = Vec::new();

        for material in materials {
            match self.assign(material) {
                Ok(assignment) => assignments.push(assignment),
                Err(err) => manual_review.push(err),
            }
        }

        (assignments, manual_review)
    }

    // ==========================================
    // 完整性检查
    // ==========================================
    fn check_completeness(&self, material: &MaterialRecord) -> Result<(), IncompleteRecordError> {
        if material.product_name.trim().is_empty() {
            return Err(IncompleteRecordError::new(
                &material.material_id,
                "product_name",
                "产品名称为空,无法判定",
            ));
        }

        match material.volume_l {
            Some(v) if v > 0.0 && v.is_finite() => {}
            _ => {
                return Err(IncompleteRecordError::new(
                    &material.material_id,
                    "volume_l",
                    "体积缺失或非正,无法装箱",
                ));
            }
        }

        // 液体 + 腐蚀性关键词但 pH 与 DOT 类别双缺失: 不猜测,转人工复核
        if material.physical_state == PhysicalState::Liquid
            && material.ph.is_none()
            && material.dot_hazard_class.is_none()
        {
            let name = material.name_lower();
            let corrosive_hint = ["acid", "hydroxide", "caustic", "corrosive"]
                .iter()
                .any(|kw| name.contains(kw));
            if corrosive_hint {
                return Err(IncompleteRecordError::new(
                    &material.material_id,
                    "ph",
                    "疑似腐蚀性液体但 pH 与 DOT 类别均缺失",
                ));
            }
        }

        Ok(())
    }

    // ==========================================
    // 规则表求值
    // ==========================================
    fn evaluate_rules(
        &self,
        material: &MaterialRecord,
        name: &str,
        dot: &str,
    ) -> (HazardCategory, String, String, bool) {
        use HazardCategory::*;

        let is_liquid = material.physical_state == PhysicalState::Liquid;
        let is_solid = material.physical_state == PhysicalState::Solid;
        let contains_any =
            |keywords: &[&str]| keywords.iter().any(|kw| name.contains(kw));
        let un = material
            .un_number
            .as_deref()
            .map(|u| u.trim().to_uppercase())
            .unwrap_or_default();
        let un_in = |set: &[&str]| set.contains(&un.as_str());

        // --- 规则 1: 气雾剂 ---
        if material.physical_state == PhysicalState::Aerosol || un_in(UN_AEROSOLS) {
            return (
                Aerosols,
                "consumer_aerosols".to_string(),
                "AEROSOL: 压力容器状态或 UN1950".to_string(),
                false,
            );
        }

        // --- 规则 2: 氧化性酸 ---
        if contains_any(&["nitric", "perchloric", "chromic"])
            || (dot == "5.1" && name.contains("acid"))
            || un_in(UN_OXIDIZING_ACIDS)
        {
            return (
                AcidsOxidizing,
                "oxidizing_acids".to_string(),
                "OXIDIZING_ACID: 氧化性酸关键词,DOT 5.1 + acid,或 UN 编号".to_string(),
                false,
            );
        }

        // --- 规则 3: 氰化物 ---
        let cyanide_code = material
            .waste_codes
            .iter()
            .any(|c| matches!(c.as_str(), "P030" | "P098" | "P106"));
        let cyanide_component = material
            .composition
            .iter()
            .any(|c| c.name.to_lowercase().contains("cyanide"));
        if name.contains("cyanide") || cyanide_code || cyanide_component {
            return (
                Cyanides,
                "inorganic_cyanides".to_string(),
                "CYANIDE: 名称/组分/废物代码命中氰化物".to_string(),
                false,
            );
        }

        // --- 规则 4: 活泼金属 ---
        if dot == "4.3"
            || un_in(UN_WATER_REACTIVES)
            || contains_any(&[
                "sodium metal",
                "potassium metal",
                "lithium",
                "calcium carbide",
                "metal hydride",
            ])
        {
            return (
                ReactiveMetals,
                "water_reactives".to_string(),
                "REACTIVE_METAL: 遇水反应金属关键词,DOT 4.3,或 UN 编号".to_string(),
                false,
            );
        }

        // --- 规则 5: 易燃有机物 ---
        let flash_c = material
            .flash_point
            .and_then(|fp| fp.normalized_celsius());
        let low_flash = is_liquid && matches!(flash_c, Some(c) if c < FLAMMABLE_FLASH_POINT_C);
        let solvent_kw = is_liquid
            && contains_any(&["solvent", "thinner", "lacquer", "naphtha", "petroleum"]);
        if low_flash || dot == "3" || solvent_kw {
            let subcategory = if contains_any(&["acetone", "ketone", "mek"]) {
                "ketones"
            } else if contains_any(&["alcohol", "ethanol", "methanol", "isopropyl"]) {
                "alcohols"
            } else if contains_any(&["toluene", "xylene", "benzene"]) {
                "aromatics"
            } else if name.contains("ether") {
                "ethers"
            } else {
                "general_flammables"
            };
            let reasoning = match flash_c {
                Some(c) if low_flash => {
                    format!("FLAMMABLE: 液体闪点 {:.1}°C < {:.0}°C", c, FLAMMABLE_FLASH_POINT_C)
                }
                _ => "FLAMMABLE: DOT 3 或溶剂关键词".to_string(),
            };
            return (FlammableOrganic, subcategory.to_string(), reasoning, false);
        }

        // --- 规则 6: 无机酸（液体限定）---
        let acid_by_ph = is_liquid && matches!(material.ph, Some(ph) if ph <= ACID_PH_MAX);
        let acid_by_dot = is_liquid && dot == "8" && name.contains("acid");
        if acid_by_ph || acid_by_dot {
            let subcategory = if contains_any(&["acetic", "formic", "citric", "lactic"]) {
                "organic_acids"
            } else {
                "mineral_acids"
            };
            let reasoning = match material.ph {
                Some(ph) if acid_by_ph => format!("CORROSIVE_ACID: pH {:.1} ≤ {:.1}", ph, ACID_PH_MAX),
                _ => "CORROSIVE_ACID: DOT 8 + acid 关键词".to_string(),
            };
            return (AcidsInorganic, subcategory.to_string(), reasoning, false);
        }

        // --- 规则 7: 腐蚀性碱（液体限定）---
        let base_by_ph = is_liquid && matches!(material.ph, Some(ph) if ph >= BASE_PH_MIN);
        let base_by_dot = is_liquid
            && dot == "8"
            && contains_any(&["hydroxide", "caustic", "ammonia", "amine"]);
        if base_by_ph || base_by_dot {
            let reasoning = match material.ph {
                Some(ph) if base_by_ph => format!("CORROSIVE_BASE: pH {:.1} ≥ {:.1}", ph, BASE_PH_MIN),
                _ => "CORROSIVE_BASE: DOT 8 + 碱关键词".to_string(),
            };
            return (BasesCaustic, "caustic_liquids".to_string(), reasoning, false);
        }

        // --- 规则 8: 氧化剂 ---
        if dot == "5.1"
            || contains_any(&[
                "peroxide",
                "permanganate",
                "nitrate",
                "hypochlorite",
                "persulfate",
                "chlorate",
                "bleach",
            ])
        {
            let subcategory = if is_solid {
                "solid_oxidizers"
            } else {
                "liquid_oxidizers"
            };
            return (
                Oxidizers,
                subcategory.to_string(),
                "OXIDIZER: DOT 5.1 或氧化剂关键词".to_string(),
                false,
            );
        }

        // --- 规则 9: 毒性物质 ---
        let toxic_metal = contains_any(&[
            "mercury", "arsenic", "cadmium", "chromium", "selenium", "thallium", "barium",
        ]);
        let toxic_organic = contains_any(&[
            "phenol",
            "formaldehyde",
            "chloroform",
            "pesticide",
            "aniline",
        ]);
        if dot == "6.1" || toxic_metal || toxic_organic {
            let subcategory = if toxic_metal {
                "toxic_metals"
            } else {
                "organic_toxics"
            };
            return (
                Toxics,
                subcategory.to_string(),
                "TOXIC: DOT 6.1 或毒性物质关键词".to_string(),
                false,
            );
        }

        // --- 规则 10: 非危固体 ---
        if is_solid {
            return (
                NonHazardousSolids,
                "general_solids".to_string(),
                "NON_HAZ_SOLID: 固体且未命中任何危险规则".to_string(),
                false,
            );
        }

        // --- 规则 11: 非危液体 ---
        if is_liquid {
            return (
                NonHazardousLiquids,
                "aqueous_liquids".to_string(),
                "NON_HAZ_LIQUID: 液体且未命中任何危险规则".to_string(),
                false,
            );
        }

        // --- 规则 12: 兜底 ---
        (
            NonHazardousLiquids,
            "unclassified".to_string(),
            "FALLBACK: 未命中任何规则,保守归入非危液体并标记兜底".to_string(),
            true,
        )
    }

    /// 类别 → 安全等级映射
    ///
    /// # 规则
    /// - 氧化性酸/氰化物/活泼金属 → EXTREME（强制单独成簇）
    /// - 其余危险类别 → HIGH
    /// - 非危类别 → LOW
    fn safety_level_for(category: HazardCategory) -> SafetyLevel {
        use HazardCategory::*;
        match category {
            AcidsOxidizing | Cyanides | ReactiveMetals => SafetyLevel::Extreme,
            Aerosols | FlammableOrganic | AcidsInorganic | BasesCaustic | Oxidizers | Toxics => {
                SafetyLevel::High
            }
            NonHazardousSolids | NonHazardousLiquids => SafetyLevel::Low,
        }
    }
}

impl Default for CategoryAssigner {
    fn default() -> Self {
        Self::new()
    }
}
