use anyhow::Result;
/// 日志工具模块
///
/// 提供运行日志文件和统计输出的辅助函数
use std::fs;
use tracing::info;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n职位投递日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(headless: bool, answers_file: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - Easy Apply 自动投递");
    info!(
        "🌐 浏览器模式: {}",
        if headless { "无头启动" } else { "连接调试端口" }
    );
    info!("📒 答案库: {}", answers_file);
    info!("{}", "=".repeat(60));
}

/// 记录职位加载信息
pub fn log_jobs_loaded(total: usize) {
    info!("✓ 找到 {} 个待投递的职位", total);
    info!("💡 职位将按顺序逐个投递\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `applied`: 投递成功数量
/// - `skipped`: 跳过数量
/// - `failed`: 失败数量
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(applied: usize, skipped: usize, failed: usize, log_file_path: &str) {
    let total = applied + skipped + failed;
    info!("\n{}", "=".repeat(60));
    info!("📊 全部投递完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", applied, total);
    info!("⏭️ 跳过: {}", skipped);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
