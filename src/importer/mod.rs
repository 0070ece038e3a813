// ==========================================
// 危废实验室装箱系统 - 导入层
// ==========================================
// 依据: SDS_Field_Mapping_v0.1.md - 批次文件导入流程
// ==========================================
// 职责: 批次文件 → MaterialRecord + DQ 报告
// 流程: 解析 → 映射 → DQ 校验
// 支持: CSV / JSON
// ==========================================

// 模块声明
pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;

// 重导出核心类型
pub use dq_validator::DqValidator;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{parser_for_path, CsvParser, FileParser, JsonParser};

use crate::domain::material::{DqLevel, DqReport, DqViolation, MaterialRecord};
use std::path::Path;
use tracing::{info, instrument, warn};

// ==========================================
// BatchImporter - 批次导入器
// ==========================================
// 红线: 单行失败绝不中断批次,失败行记入 DQ 报告
pub struct BatchImporter {
    field_mapper: FieldMapper,
    dq_validator: DqValidator,
}

impl BatchImporter {
    pub fn new() -> Self {
        Self {
            field_mapper: FieldMapper,
            dq_validator: DqValidator::new(),
        }
    }

    /// 导入批次文件
    ///
    /// # 参数
    /// - file_path: 批次文件路径（.csv 或 .json）
    ///
    /// # 返回
    /// - Ok((materials, report)): 通过校验的材料 + DQ 报告
    /// - Err(ImportError): 文件级错误（不存在/格式不支持/整体解析失败）
    #[instrument(skip(self), fields(file = %file_path.display()))]
    pub fn import_file(
        &self,
        file_path: &Path,
    ) -> ImportResult<(Vec<MaterialRecord>, DqReport)> {
        // === 步骤 1: 文件解析 ===
        let parser = parser_for_path(file_path)?;
        let rows = parser.parse_to_raw_records(file_path)?;
        if rows.is_empty() {
            return Err(ImportError::EmptyBatch);
        }
        info!(rows = rows.len(), "文件解析完成");

        // === 步骤 2: 字段映射（行级失败记违规,不中断）===
        let mut raw_records = Vec::with_capacity(rows.len());
        let mut mapping_violations = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 2; // 表头占第 1 行
            match self.field_mapper.map_to_raw_record(row, row_number) {
                Ok(record) => raw_records.push(record),
                Err(err) => {
                    warn!(row = row_number, error = %err, "行映射失败");
                    mapping_violations.push(DqViolation {
                        row_number,
                        material_id: self.field_mapper.material_id_of(row),
                        level: DqLevel::Error,
                        field: "mapping".to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        // === 步骤 3: DQ 校验 ===
        let batch_file = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());
        let (materials, mut report) = self.dq_validator.validate_batch(&raw_records, batch_file);

        // 映射失败行并入报告
        report.summary.total_rows += mapping_violations.len();
        report.summary.blocked += mapping_violations.len();
        report.violations.extend(mapping_violations);
        report
            .violations
            .sort_by_key(|v| (v.row_number, v.field.clone()));

        info!(
            accepted = materials.len(),
            blocked = report.summary.blocked,
            "批次导入完成"
        );
        Ok((materials, report))
    }
}

impl Default for BatchImporter {
    fn default() -> Self {
        Self::new()
    }
}
