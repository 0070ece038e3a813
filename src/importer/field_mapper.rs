// ==========================================
// 危废实验室装箱系统 - 字段映射器
// ==========================================
// 依据: SDS_Field_Mapping_v0.1.md - 标准字段映射表
// 职责: 源字段 → 标准字段映射 + 类型转换
// 注: 缺失字段映射为 None,类型转换失败按行报错（该行阻断）
// ==========================================

use crate::domain::material::{ComponentEntry, RawBatchRecord};
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

pub struct FieldMapper;

impl FieldMapper {
    /// 单行映射: 列名 → RawBatchRecord
    pub fn map_to_raw_record(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<RawBatchRecord> {
        Ok(RawBatchRecord {
            // 主键
            material_id: self.get_string(row, "material_id"),

            // SDS 基础信息
            product_name: self.get_string(row, "product_name"),
            physical_state: self.get_string(row, "physical_state"),
            ph: self.parse_f64(row, "ph", row_number)?,
            flash_point_c: self.parse_f64(row, "flash_point_c", row_number)?,
            flash_point_f: self.parse_f64(row, "flash_point_f", row_number)?,
            dot_hazard_class: self.get_string(row, "dot_hazard_class"),
            un_number: self.get_string(row, "un_number"),
            waste_codes: self.parse_code_list(row),
            composition: self.parse_composition(row, row_number)?,

            // 装箱维度
            volume_l: self.parse_f64(row, "volume_l", row_number)?,
            weight_kg: self.parse_f64(row, "weight_kg", row_number)?,

            // 元信息
            row_number,
        })
    }

    /// 行材料号提取（别名同 map_to_raw_record,用于映射失败行的 DQ 归属）
    pub fn material_id_of(&self, row: &HashMap<String, String>) -> Option<String> {
        self.get_string(row, "material_id")
    }

    /// 提取字符串字段（返回 Option）,支持列名别名
    fn get_string(&self, row: &HashMap<String, String>, key: &str) -> Option<String> {
        let aliases: Vec<&str> = match key {
            "material_id" => vec!["material_id", "id", "waste_id"],
            "product_name" => vec!["product_name", "chemical_name", "name"],
            "physical_state" => vec!["physical_state", "state"],
            "dot_hazard_class" => vec!["dot_hazard_class", "dot_class", "hazard_class"],
            "un_number" => vec!["un_number", "un_no"],
            _ => vec![key],
        };

        for alias in aliases {
            if let Some(value) = row.get(alias) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
        None
    }

    fn parse_f64(
        &self,
        row: &HashMap<String, String>,
        key: &str,
        row_number: usize,
    ) -> ImportResult<Option<f64>> {
        let aliases: Vec<&str> = match key {
            "ph" => vec!["ph", "ph_value"],
            "flash_point_c" => vec!["flash_point_c", "flash_point_celsius"],
            "flash_point_f" => vec!["flash_point_f", "flash_point_fahrenheit"],
            "volume_l" => vec!["volume_l", "volume_liters", "volume"],
            "weight_kg" => vec!["weight_kg", "weight"],
            _ => vec![key],
        };

        for alias in aliases {
            let Some(raw) = row.get(alias) else { continue };
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            return trimmed.parse::<f64>().map(Some).map_err(|e| {
                ImportError::TypeConversionError {
                    row: row_number,
                    field: key.to_string(),
                    message: format!("无法解析 \"{}\": {}", trimmed, e),
                }
            });
        }
        Ok(None)
    }

    /// 废物代码列表: JSON 数组文本或分号/逗号分隔
    fn parse_code_list(&self, row: &HashMap<String, String>) -> Vec<String> {
        let raw = ["waste_codes", "epa_codes"]
            .iter()
            .find_map(|a| row.get(*a))
            .map(|s| s.trim())
            .unwrap_or("");
        if raw.is_empty() {
            return Vec::new();
        }

        if raw.starts_with('[') {
            if let Ok(codes) = serde_json::from_str::<Vec<String>>(raw) {
                return codes
                    .into_iter()
                    .map(|c| c.trim().to_uppercase())
                    .filter(|c| !c.is_empty())
                    .collect();
            }
        }

        raw.split([';', ','])
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// 组分列表: JSON 数组文本（CSV 中内嵌,JSON 中透传）
    fn parse_composition(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<Vec<ComponentEntry>> {
        let Some(raw) = row.get("composition") else {
            return Ok(Vec::new());
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str::<Vec<ComponentEntry>>(trimmed).map_err(|e| {
            ImportError::TypeConversionError {
                row: row_number,
                field: "composition".to_string(),
                message: format!("组分列表须为 JSON 数组: {}", e),
            }
        })
    }
}
