// ==========================================
// 危废实验室装箱系统 - 数据质量校验器
// ==========================================
// 依据: SDS_Field_Mapping_v0.1.md - 6. 数据质量规则
// 职责: 行级 DQ 校验 + RawBatchRecord → MaterialRecord 转换 + DQ 报告
// 红线: ERROR 级违规阻断该行;WARNING 级放行,危险属性缺口由引擎转人工复核
// ==========================================

use crate::domain::material::{
    DqLevel, DqReport, DqSummary, DqViolation, FlashPoint, MaterialRecord, RawBatchRecord,
};
use crate::domain::types::PhysicalState;
use std::collections::HashSet;
use tracing::{info, instrument};

pub struct DqValidator;

impl DqValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验整个批次并转换为引擎输入
    ///
    /// # ERROR（阻断该行）
    /// - material_id 缺失
    /// - material_id 批次内重复
    /// - physical_state 缺失或无法解析
    ///
    /// # WARNING（放行,记录在报告中）
    /// - product_name 缺失（映射为空串,引擎侧转人工复核）
    /// - volume_l 缺失或非正（引擎侧转人工复核）
    /// - ph 超出 [0, 14] 常规区间
    #[instrument(skip_all, fields(rows = records.len()))]
    pub fn validate_batch(
        &self,
        records: &[RawBatchRecord],
        batch_file: Option<String>,
    ) -> (Vec<MaterialRecord>, DqReport) {
        let mut accepted = Vec::new();
        let mut violations = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut blocked = 0usize;
        let mut warning_rows = 0usize;

        for record in records {
            match self.validate_record(record, &mut seen_ids) {
                Ok((material, row_violations)) => {
                    if !row_violations.is_empty() {
                        warning_rows += 1;
                    }
                    violations.extend(row_violations);
                    accepted.push(material);
                }
                Err(row_violations) => {
                    blocked += 1;
                    violations.extend(row_violations);
                }
            }
        }

        let report = DqReport {
            batch_file,
            summary: DqSummary {
                total_rows: records.len(),
                accepted: accepted.len(),
                blocked,
                warning: warning_rows,
            },
            violations,
        };

        info!(
            total = report.summary.total_rows,
            accepted = report.summary.accepted,
            blocked = report.summary.blocked,
            "批次 DQ 校验完成"
        );

        (accepted, report)
    }

    // ==========================================
    // 单行校验
    // ==========================================
    fn validate_record(
        &self,
        record: &RawBatchRecord,
        seen_ids: &mut HashSet<String>,
    ) -> Result<(MaterialRecord, Vec<DqViolation>), Vec<DqViolation>> {
        // === ERROR: 主键 ===
        let Some(material_id) = record.material_id.clone() else {
            return Err(vec![DqViolation {
                row_number: record.row_number,
                material_id: None,
                level: DqLevel::Error,
                field: "material_id".to_string(),
                message: "主键缺失".to_string(),
            }]);
        };
        if !seen_ids.insert(material_id.clone()) {
            return Err(vec![DqViolation {
                row_number: record.row_number,
                material_id: Some(material_id),
                level: DqLevel::Error,
                field: "material_id".to_string(),
                message: "主键批次内重复".to_string(),
            }]);
        }

        // === ERROR: 物理状态 ===
        let state_raw = record.physical_state.as_deref().unwrap_or("");
        let Some(physical_state) = PhysicalState::parse(state_raw) else {
            return Err(vec![DqViolation {
                row_number: record.row_number,
                material_id: Some(material_id),
                level: DqLevel::Error,
                field: "physical_state".to_string(),
                message: format!("物理状态缺失或无法解析: \"{}\"", state_raw),
            }]);
        };

        // === WARNING 项 ===
        let mut warnings = Vec::new();
        let mut warn = |field: &str, message: String| {
            warnings.push(DqViolation {
                row_number: record.row_number,
                material_id: Some(material_id.clone()),
                level: DqLevel::Warning,
                field: field.to_string(),
                message,
            });
        };

        if record.product_name.is_none() {
            warn("product_name", "产品名称缺失,引擎将转人工复核".to_string());
        }
        match record.volume_l {
            None => warn("volume_l", "体积缺失,引擎将转人工复核".to_string()),
            Some(v) if v <= 0.0 => warn("volume_l", format!("体积非正: {}", v)),
            _ => {}
        }
        if let Some(ph) = record.ph {
            if !(0.0..=14.0).contains(&ph) {
                warn("ph", format!("pH {} 超出常规区间 [0, 14]", ph));
            }
        }

        let flash_point = match (record.flash_point_c, record.flash_point_f) {
            (None, None) => None,
            (celsius, fahrenheit) => Some(FlashPoint { celsius, fahrenheit }),
        };

        let material = MaterialRecord {
            material_id,
            product_name: record.product_name.clone().unwrap_or_default(),
            physical_state,
            ph: record.ph,
            flash_point,
            dot_hazard_class: record.dot_hazard_class.clone(),
            un_number: record.un_number.clone(),
            waste_codes: record.waste_codes.clone(),
            composition: record.composition.clone(),
            volume_l: record.volume_l,
            weight_kg: record.weight_kg,
        };

        Ok((material, warnings))
    }
}

impl Default for DqValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn raw(material_id: Option<&str>, state: Option<&str>, row_number: usize) -> RawBatchRecord {
        RawBatchRecord {
            material_id: material_id.map(String::from),
            product_name: Some("Test Chemical".to_string()),
            physical_state: state.map(String::from),
            volume_l: Some(4.0),
            row_number,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_record_accepted() {
        let validator = DqValidator::new();
        let (materials, report) =
            validator.validate_batch(&[raw(Some("M001"), Some("liquid"), 2)], None);

        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].material_id, "M001");
        assert_eq!(report.summary.blocked, 0);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_missing_id_blocks_row() {
        let validator = DqValidator::new();
        let (materials, report) = validator.validate_batch(&[raw(None, Some("liquid"), 2)], None);

        assert!(materials.is_empty());
        assert_eq!(report.summary.blocked, 1);
        assert_eq!(report.violations[0].level, DqLevel::Error);
        assert_eq!(report.violations[0].field, "material_id");
    }

    #[test]
    fn test_duplicate_id_blocks_second_row() {
        let validator = DqValidator::new();
        let (materials, report) = validator.validate_batch(
            &[
                raw(Some("M001"), Some("liquid"), 2),
                raw(Some("M001"), Some("solid"), 3),
            ],
            None,
        );

        assert_eq!(materials.len(), 1);
        assert_eq!(report.summary.blocked, 1);
        assert!(report
            .violations
            .iter()
            .any(|v| v.message.contains("重复") && v.row_number == 3));
    }

    #[test]
    fn test_unparseable_state_blocks_row() {
        let validator = DqValidator::new();
        let (materials, report) =
            validator.validate_batch(&[raw(Some("M001"), Some("plasma"), 2)], None);

        assert!(materials.is_empty());
        assert_eq!(report.summary.blocked, 1);
        assert_eq!(report.violations[0].field, "physical_state");
    }

    #[test]
    fn test_missing_volume_passes_with_warning() {
        let validator = DqValidator::new();
        let mut record = raw(Some("M001"), Some("liquid"), 2);
        record.volume_l = None;

        let (materials, report) = validator.validate_batch(&[record], None);
        // 放行: 人工复核由引擎侧决定
        assert_eq!(materials.len(), 1);
        assert!(materials[0].volume_l.is_none());
        assert_eq!(report.summary.warning, 1);
        assert_eq!(report.violations[0].level, DqLevel::Warning);
    }

    #[test]
    fn test_out_of_range_ph_warned() {
        let validator = DqValidator::new();
        let mut record = raw(Some("M001"), Some("liquid"), 2);
        record.ph = Some(17.0);

        let (materials, report) = validator.validate_batch(&[record], None);
        assert_eq!(materials.len(), 1);
        assert!(report.violations.iter().any(|v| v.field == "ph"));
    }

    #[test]
    fn test_flash_point_assembled_from_either_unit() {
        let validator = DqValidator::new();
        let mut record = raw(Some("M001"), Some("liquid"), 2);
        record.flash_point_f = Some(0.0);

        let (materials, _) = validator.validate_batch(&[record], None);
        let fp = materials[0].flash_point.unwrap();
        assert!(fp.celsius.is_none());
        assert_eq!(fp.fahrenheit, Some(0.0));
    }
}
