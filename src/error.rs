// ==========================================
// 危废实验室装箱系统 - 引擎错误类型
// ==========================================
// 依据: Rust 错误处理最佳实践
// 工具: thiserror 派生宏
// ==========================================
// 红线: 容量溢出与合规违规不是错误（见 manifest::Violation）,
//      此处只承载真正的异常条件（配置错误、记录不完整）
// ==========================================

use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 配置错误 =====
    #[error("规则配置无效: {0}")]
    InvalidRuleConfig(String),

    #[error("规则配置文件不存在: {0}")]
    RuleFileNotFound(String),

    #[error("规则配置解析失败: {0}")]
    RuleFileParseError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::RuleFileParseError(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::RuleFileParseError(err.to_string())
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

// ==========================================
// IncompleteRecordError - 记录不完整
// ==========================================
// 依据: LabPack_Engine_Specs 8. 错误处理 - 不完整记录直接转人工复核,
//      引擎绝不猜测危险属性
#[derive(Error, Debug, Clone)]
#[error("记录不完整 ({material_id}): 字段 {field} 缺失 - {message}")]
pub struct IncompleteRecordError {
    pub material_id: String,
    pub field: String,
    pub message: String,
}

impl IncompleteRecordError {
    pub fn new(
        material_id: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            material_id: material_id.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}
