// ==========================================
// 危废实验室装箱系统 - 命令行主入口
// ==========================================
// 依据: LabPack_Engine_Specs_v0.2.md
// 系统定位: 装箱决策支持引擎
// 用法: labpack-engine <批次文件.csv|.json> [规则文件.json]
// ==========================================

use labpack_engine::{logging, BatchImporter, LabPackOrchestrator, RuleConfig};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

fn main() -> ExitCode {
    // 初始化日志系统
    logging::init();

    info!("==================================================");
    info!("{} - 装箱决策支持引擎", labpack_engine::APP_NAME);
    info!("系统版本: {}", labpack_engine::VERSION);
    info!("==================================================");

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("用法: {} <批次文件.csv|.json> [规则文件.json]", args[0]);
        return ExitCode::from(2);
    }

    match run(Path::new(&args[1]), args.get(2).map(Path::new)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("处理失败: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(batch_path: &Path, rules_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    // === 步骤 1: 加载规则配置 ===
    let config = match rules_path {
        Some(path) => {
            info!("使用规则文件: {}", path.display());
            RuleConfig::from_json_file(path)?
        }
        None => {
            info!("使用内置规则表");
            RuleConfig::default()
        }
    };
    let config = Arc::new(config);

    // === 步骤 2: 导入批次文件 ===
    let importer = BatchImporter::new();
    let (materials, dq_report) = importer.import_file(batch_path)?;
    if dq_report.summary.blocked > 0 {
        info!(
            blocked = dq_report.summary.blocked,
            "部分行被 DQ 规则阻断,详见报告"
        );
    }

    // === 步骤 3: 批次处理 ===
    let orchestrator = LabPackOrchestrator::new(config);
    let manifest = orchestrator.process_batch(&materials);

    info!(
        batch_id = %manifest.batch_id,
        containers = manifest.summary.container_count,
        violations = manifest.summary.violation_count,
        "清单生成完成"
    );

    // === 步骤 4: 输出清单（stdout,JSON）===
    let output = serde_json::json!({
        "dq_report": dq_report,
        "manifest": manifest,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
