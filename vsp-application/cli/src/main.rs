//! VSP CLI 应用

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::Level;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "vsp")]
#[command(about = "VSP - 流水线虚拟机生命周期自动化", long_about = None)]
#[command(version)]
struct Cli {
    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行步骤计划
    Run {
        /// 计划文件路径 (YAML)
        plan: String,

        /// 覆盖计划中的守护重试次数
        #[arg(long)]
        retries: Option<u32>,

        /// 覆盖计划中的重试间隔（秒）
        #[arg(long)]
        retry_delay: Option<u64>,

        /// 构建参数覆盖 (KEY=VALUE, 可重复)
        #[arg(long = "param")]
        params: Vec<String>,

        /// 发布变量追加写入的文件
        #[arg(long)]
        env_out: Option<String>,

        /// 执行报告输出路径 (JSON)
        #[arg(long)]
        report: Option<String>,
    },

    /// 单步虚拟机操作
    Vm {
        #[command(subcommand)]
        action: VmAction,
    },

    /// 执行前预检
    Check {
        #[command(subcommand)]
        action: CheckAction,
    },
}

/// 单步执行公共参数
#[derive(Args)]
struct RunOpts {
    /// 守护重试次数
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// 重试间隔（秒）
    #[arg(long, default_value_t = 10)]
    retry_delay: u64,

    /// 构建参数覆盖 (KEY=VALUE, 可重复)
    #[arg(long = "param")]
    params: Vec<String>,

    /// 发布变量追加写入的文件
    #[arg(long)]
    env_out: Option<String>,
}

#[derive(Subcommand)]
enum VmAction {
    /// 从既有虚拟机克隆
    Clone {
        /// 来源虚拟机名称
        #[arg(long)]
        source: String,
        /// 新虚拟机名称
        #[arg(long)]
        clone_name: String,
        /// 集群
        #[arg(long)]
        cluster: String,
        /// 数据存储
        #[arg(long, default_value = "")]
        datastore: String,
        /// 目标文件夹
        #[arg(long, default_value = "")]
        folder: String,
        /// 资源池
        #[arg(long, default_value = "")]
        resource_pool: String,
        /// 自定义规范名称
        #[arg(long, default_value = "")]
        customization_spec: String,
        /// 链接克隆
        #[arg(long)]
        linked_clone: bool,
        /// 克隆后开机并等待 IP
        #[arg(long)]
        power_on: bool,
        /// 等待 IP 的超时（秒）
        #[arg(long, default_value_t = 60)]
        timeout: u64,
        /// guest-info 属性 (NAME=VALUE, 可重复)
        #[arg(long = "guest-info")]
        guest_info: Vec<String>,
        #[command(flatten)]
        opts: RunOpts,
    },

    /// 从模板部署
    Deploy {
        /// 模板名称
        #[arg(long)]
        template: String,
        /// 新虚拟机名称
        #[arg(long)]
        clone_name: String,
        /// 集群
        #[arg(long)]
        cluster: String,
        /// 数据存储
        #[arg(long, default_value = "")]
        datastore: String,
        /// 目标文件夹
        #[arg(long, default_value = "")]
        folder: String,
        /// 资源池 (留空时使用平台保留的根资源池)
        #[arg(long, default_value = "")]
        resource_pool: String,
        /// 自定义规范名称
        #[arg(long, default_value = "")]
        customization_spec: String,
        /// 链接克隆
        #[arg(long)]
        linked_clone: bool,
        /// 部署后开机并等待 IP
        #[arg(long)]
        power_on: bool,
        /// 等待 IP 的超时（秒）
        #[arg(long, default_value_t = 60)]
        timeout: u64,
        /// guest-info 属性 (NAME=VALUE, 可重复)
        #[arg(long = "guest-info")]
        guest_info: Vec<String>,
        #[command(flatten)]
        opts: RunOpts,
    },

    /// 更新虚拟机备注
    Annotate {
        /// 虚拟机名称
        #[arg(long)]
        vm: String,
        /// 备注文本
        #[arg(long)]
        annotation: String,
        #[command(flatten)]
        opts: RunOpts,
    },
}

#[derive(Subcommand)]
enum CheckAction {
    /// 预检克隆步骤
    Clone {
        /// 来源虚拟机名称
        #[arg(long)]
        source: String,
        /// 新虚拟机名称
        #[arg(long)]
        clone_name: String,
        /// 自定义规范名称
        #[arg(long, default_value = "")]
        customization_spec: String,
    },

    /// 预检模板部署步骤
    Deploy {
        /// 模板名称
        #[arg(long)]
        template: String,
        /// 新虚拟机名称
        #[arg(long)]
        clone_name: String,
    },

    /// 预检备注更新步骤
    Annotation {
        /// 虚拟机名称
        #[arg(long)]
        vm: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt().with_max_level(log_level).init();

    // 处理命令
    match cli.command {
        Commands::Run {
            plan,
            retries,
            retry_delay,
            params,
            env_out,
            report,
        } => commands::run::handle(&plan, retries, retry_delay, &params, env_out, report).await?,
        Commands::Vm { action } => commands::vm::handle(action).await?,
        Commands::Check { action } => commands::check::handle(action).await?,
    }

    Ok(())
}
