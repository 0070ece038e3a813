// ==========================================
// 危废实验室装箱系统 - 批次文件解析器
// ==========================================
// 依据: SDS_Field_Mapping_v0.1.md - 阶段 0: 文件读取与解析
// 支持: CSV (.csv) / JSON (.json)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

// ==========================================
// FileParser - 文件解析接口
// ==========================================
// 输出统一为 "列名 → 字符串值" 行记录,下游映射器负责类型转换
pub trait FileParser {
    fn parse_to_raw_records(&self, file_path: &Path)
        -> ImportResult<Vec<HashMap<String, String>>>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> ImportResult<Vec<HashMap<String, String>>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row_map);
        }

        Ok(records)
    }
}

// ==========================================
// JSON Parser 实现
// ==========================================
// 输入: 对象数组,标量统一转字符串,嵌套结构保留 JSON 文本交映射器解析
pub struct JsonParser;

impl FileParser for JsonParser {
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> ImportResult<Vec<HashMap<String, String>>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let raw = std::fs::read_to_string(file_path)?;
        let parsed: Value = serde_json::from_str(&raw)?;
        let Value::Array(rows) = parsed else {
            return Err(ImportError::JsonParseError(
                "顶层结构必须是对象数组".to_string(),
            ));
        };

        let mut records = Vec::new();
        for row in rows {
            let Value::Object(fields) = row else {
                return Err(ImportError::JsonParseError(
                    "数组元素必须是对象".to_string(),
                ));
            };

            let mut row_map = HashMap::new();
            for (key, value) in fields {
                let text = match value {
                    Value::Null => String::new(),
                    Value::String(s) => s.trim().to_string(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    nested @ (Value::Array(_) | Value::Object(_)) => nested.to_string(),
                };
                row_map.insert(key.trim().to_string(), text);
            }

            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }
            records.push(row_map);
        }

        Ok(records)
    }
}

/// 按扩展名选择解析器
pub fn parser_for_path(file_path: &Path) -> ImportResult<Box<dyn FileParser>> {
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "csv" => Ok(Box::new(CsvParser)),
        "json" => Ok(Box::new(JsonParser)),
        other => Err(ImportError::UnsupportedFormat(other.to_string())),
    }
}
