// ==========================================
// 骑手排班系统 - 命令行入口
// ==========================================
// 用法: rider-scheduling [--db PATH] [--locale L] <命令>
// 输出: 成功时 stdout 输出 JSON, stderr 输出本地化提示
//       失败时 stderr 输出错误 JSON, 退出码非零
// ==========================================

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use rider_scheduling::api::ApiError;
use rider_scheduling::app::{get_default_db_path, AppState, Notification};
use rider_scheduling::domain::{
    AssignmentDraft, AssignmentPatch, BranchDraft, BranchPatch, RiderDraft, RiderPatch,
};
use rider_scheduling::engine::{FilterSpec, Selector};
use rider_scheduling::importer::EntityKind;
use rider_scheduling::{i18n, logging, RiderType, ShiftType};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "rider-scheduling", version, about = "骑手排班系统")]
struct Cli {
    /// 数据库路径（缺省取环境变量或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 界面语言: zh-CN / en / es
    #[arg(long, global = true)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 排班分配
    #[command(subcommand)]
    Schedule(ScheduleCommand),
    /// 骑手登记
    #[command(subcommand)]
    Rider(RiderCommand),
    /// 门店登记
    #[command(subcommand)]
    Branch(BranchCommand),
    /// 外部品牌登记
    #[command(subcommand)]
    Brand(BrandCommand),
    /// 表格导入
    Import(ImportArgs),
    /// 系统配置
    #[command(subcommand)]
    Config(ConfigCommand),
    /// 操作日志
    #[command(subcommand)]
    Log(LogCommand),
}

// ==========================================
// 排班命令
// ==========================================

#[derive(Debug, Subcommand)]
enum ScheduleCommand {
    /// 查询窗口内排班（可筛选）
    List(ListArgs),
    /// 人工新建排班
    Create(CreateArgs),
    /// 局部更新排班（"none" 表示清空字段）
    Update(UpdateArgs),
    /// 删除排班
    Delete { id: i64 },
    /// 自动生成排班（不覆盖已有记录）
    Generate(GenerateArgs),
    /// 生成导出下载引用
    Export(RangeArgs),
    /// 登记骑手为待命
    Available {
        #[arg(long)]
        rider: i64,
        #[arg(long)]
        date: NaiveDate,
    },
    /// 待命骑手池
    Pool,
    /// 单条排班的操作历史
    History { id: i64 },
}

#[derive(Debug, Args)]
struct ListArgs {
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    days: Option<u32>,
    #[arg(long, default_value = "all")]
    branch: Selector<i64>,
    #[arg(long, default_value = "all")]
    brand: Selector<i64>,
    #[arg(long, default_value = "all")]
    shift_type: Selector<ShiftType>,
    #[arg(long, default_value = "all")]
    rider_type: Selector<RiderType>,
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[arg(long)]
    rider: i64,
    #[arg(long)]
    date: NaiveDate,
    #[arg(long, value_parser = parse_shift_type)]
    shift_type: ShiftType,
    #[arg(long)]
    branch: Option<i64>,
    #[arg(long)]
    brand: Option<i64>,
    #[arg(long, value_parser = parse_time)]
    start_time: Option<NaiveTime>,
    #[arg(long, value_parser = parse_time)]
    end_time: Option<NaiveTime>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    id: i64,
    #[arg(long, value_parser = parse_shift_type)]
    shift_type: Option<ShiftType>,
    #[arg(long)]
    branch: Option<String>,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    start_time: Option<String>,
    #[arg(long)]
    end_time: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    days: u32,
}

#[derive(Debug, Args)]
struct RangeArgs {
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: NaiveDate,
}

// ==========================================
// 登记簿命令
// ==========================================

#[derive(Debug, Subcommand)]
enum RiderCommand {
    List {
        #[arg(long)]
        active_only: bool,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long = "type", value_parser = parse_rider_type)]
        rider_type: RiderType,
        #[arg(long)]
        identification: Option<String>,
        #[arg(long)]
        branch: Option<i64>,
        #[arg(long)]
        note: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type", value_parser = parse_rider_type)]
        rider_type: Option<RiderType>,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        identification: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    Remove { id: i64 },
}

#[derive(Debug, Subcommand)]
enum BranchCommand {
    List,
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        zone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        zone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    Remove { id: i64 },
}

#[derive(Debug, Subcommand)]
enum BrandCommand {
    List,
    Add {
        #[arg(long)]
        name: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: String,
    },
    Remove { id: i64 },
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// riders / branches / brands
    #[arg(value_parser = parse_entity_kind)]
    kind: EntityKind,
    file: PathBuf,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    List,
    Get { key: String },
    Set { key: String, value: String },
}

#[derive(Debug, Subcommand)]
enum LogCommand {
    Recent {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

// ==========================================
// 参数解析
// ==========================================

fn parse_shift_type(s: &str) -> Result<ShiftType, String> {
    ShiftType::from_code(s).ok_or_else(|| format!("未知班次类型: {}", s))
}

fn parse_rider_type(s: &str) -> Result<RiderType, String> {
    RiderType::from_code(s).ok_or_else(|| format!("未知骑手类型: {}", s))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| format!("时间格式应为 HH:MM: {}", e))
}

fn parse_entity_kind(s: &str) -> Result<EntityKind, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "riders" | "rider" => Ok(EntityKind::Riders),
        "branches" | "branch" => Ok(EntityKind::Branches),
        "brands" | "brand" => Ok(EntityKind::Brands),
        other => Err(format!("未知导入类型: {}", other)),
    }
}

/// 可清空字段: 缺省 → 不变, "none" → 清空, 其他 → 设置
fn nullable<T, F>(raw: Option<String>, parse: F) -> anyhow::Result<Option<Option<T>>>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    match raw {
        None => Ok(None),
        Some(s) if s.trim().eq_ignore_ascii_case("none") => Ok(Some(None)),
        Some(s) => parse(&s).map(|v| Some(Some(v))).map_err(anyhow::Error::msg),
    }
}

fn parse_id(s: &str) -> Result<i64, String> {
    s.trim().parse::<i64>().map_err(|e| format!("无效ID {}: {}", s, e))
}

fn parse_text(s: &str) -> Result<String, String> {
    Ok(s.to_string())
}

fn to_json<T: Serialize>(value: T) -> anyhow::Result<Value> {
    serde_json::to_value(value).context("结果序列化失败")
}

fn notify(key: &str, args: &[(&str, &str)]) {
    eprintln!("{}", Notification::success(key, args).message);
}

// ==========================================
// 命令执行
// ==========================================

async fn run(cli: Cli) -> anyhow::Result<Value> {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path)?;

    let locale = cli.locale.unwrap_or_else(|| state.config.locale.clone());
    i18n::set_locale(&locale);

    match cli.command {
        Commands::Schedule(cmd) => run_schedule(&state, cmd).await,
        Commands::Rider(cmd) => run_rider(&state, cmd),
        Commands::Branch(cmd) => run_branch(&state, cmd),
        Commands::Brand(cmd) => run_brand(&state, cmd),
        Commands::Import(args) => {
            let summary = state.import_api.import(args.kind, &args.file)?;
            let (created, updated, skipped) = (
                summary.created.to_string(),
                summary.updated.to_string(),
                summary.skipped.to_string(),
            );
            notify(
                "import.completed",
                &[
                    ("created", created.as_str()),
                    ("updated", updated.as_str()),
                    ("skipped", skipped.as_str()),
                ],
            );
            to_json(summary)
        }
        Commands::Config(cmd) => match cmd {
            ConfigCommand::List => to_json(state.config_api.list_configs()?),
            ConfigCommand::Get { key } => to_json(state.config_api.get_config(&key)?),
            ConfigCommand::Set { key, value } => {
                let entry = state.config_api.update_config(&key, &value)?;
                notify("config.updated", &[("key", key.as_str())]);
                to_json(entry)
            }
        },
        Commands::Log(LogCommand::Recent { limit }) => {
            to_json(state.schedule_api.recent_actions(limit)?)
        }
    }
}

async fn run_schedule(state: &AppState, cmd: ScheduleCommand) -> anyhow::Result<Value> {
    let api = &state.schedule_api;
    match cmd {
        ScheduleCommand::List(args) => {
            let mut session = state.session(args.start, args.days);
            session.set_filters(FilterSpec {
                branch: args.branch,
                brand: args.brand,
                shift_type: args.shift_type,
                rider_type: args.rider_type,
            });
            session.refresh().await?;
            let window = session.window();
            Ok(json!({
                "window": { "start": window.start, "end": window.end(), "days": window.days },
                "total": session.assignments().len(),
                "assignments": to_json(session.visible())?,
            }))
        }
        ScheduleCommand::Create(args) => {
            let draft = AssignmentDraft {
                rider_id: args.rider,
                shift_date: args.date,
                shift_type: args.shift_type,
                branch_id: args.branch,
                brand_id: args.brand,
                start_time: args.start_time,
                end_time: args.end_time,
                notes: args.notes,
                manual_override: None,
            };
            let created = api.create(&draft)?;
            notify("schedule.created", &[]);
            to_json(created)
        }
        ScheduleCommand::Update(args) => {
            let patch = AssignmentPatch {
                shift_type: args.shift_type,
                branch_id: nullable(args.branch, parse_id)?,
                brand_id: nullable(args.brand, parse_id)?,
                start_time: nullable(args.start_time, parse_time)?,
                end_time: nullable(args.end_time, parse_time)?,
                notes: nullable(args.notes, parse_text)?,
                manual_override: None,
            };
            let updated = api.update(args.id, &patch)?;
            notify("schedule.updated", &[]);
            to_json(updated)
        }
        ScheduleCommand::Delete { id } => {
            api.delete(id)?;
            notify("schedule.deleted", &[]);
            Ok(json!({ "deleted": id }))
        }
        ScheduleCommand::Generate(args) => {
            let outcome = api.generate(args.start, args.days).await?;
            let inserted = outcome.inserted.to_string();
            let skipped = outcome.skipped.to_string();
            notify(
                "schedule.generated",
                &[("inserted", inserted.as_str()), ("skipped", skipped.as_str())],
            );
            to_json(outcome)
        }
        ScheduleCommand::Export(args) => {
            let reference = api.export(args.start, args.end)?;
            notify("schedule.exported", &[("file_name", reference.file_name.as_str())]);
            to_json(reference)
        }
        ScheduleCommand::Available { rider, date } => {
            let created = api.create_available(rider, date)?;
            notify("schedule.available_created", &[]);
            to_json(created)
        }
        ScheduleCommand::Pool => to_json(api.available_pool()?),
        ScheduleCommand::History { id } => to_json(api.history(id)?),
    }
}

fn run_rider(state: &AppState, cmd: RiderCommand) -> anyhow::Result<Value> {
    let api = &state.registry_api;
    match cmd {
        RiderCommand::List { active_only } => to_json(api.list_riders(active_only)?),
        RiderCommand::Add {
            name,
            rider_type,
            identification,
            branch,
            note,
        } => {
            let mut draft = RiderDraft::new(name, rider_type);
            draft.identification = identification;
            draft.home_branch_id = branch;
            draft.note = note;
            to_json(api.create_rider(&draft)?)
        }
        RiderCommand::Update {
            id,
            name,
            rider_type,
            active,
            identification,
            branch,
            note,
        } => {
            let patch = RiderPatch {
                full_name: name,
                active,
                rider_type,
                identification: nullable(identification, parse_text)?,
                home_branch_id: nullable(branch, parse_id)?,
                note: nullable(note, parse_text)?,
            };
            to_json(api.update_rider(id, &patch)?)
        }
        RiderCommand::Remove { id } => {
            api.delete_rider(id)?;
            Ok(json!({ "deleted": id }))
        }
    }
}

fn run_branch(state: &AppState, cmd: BranchCommand) -> anyhow::Result<Value> {
    let api = &state.registry_api;
    match cmd {
        BranchCommand::List => to_json(api.list_branches()?),
        BranchCommand::Add {
            code,
            name,
            zone,
            address,
        } => to_json(api.create_branch(&BranchDraft {
            code,
            name,
            zone,
            address,
        })?),
        BranchCommand::Update {
            id,
            code,
            name,
            zone,
            address,
        } => {
            let patch = BranchPatch {
                code,
                name,
                zone: nullable(zone, parse_text)?,
                address: nullable(address, parse_text)?,
            };
            to_json(api.update_branch(id, &patch)?)
        }
        BranchCommand::Remove { id } => {
            api.delete_branch(id)?;
            Ok(json!({ "deleted": id }))
        }
    }
}

fn run_brand(state: &AppState, cmd: BrandCommand) -> anyhow::Result<Value> {
    let api = &state.registry_api;
    match cmd {
        BrandCommand::List => to_json(api.list_brands()?),
        BrandCommand::Add { name } => to_json(api.create_brand(&name)?),
        BrandCommand::Update { id, name } => to_json(api.rename_brand(id, &name)?),
        BrandCommand::Remove { id } => {
            api.delete_brand(id)?;
            Ok(json!({ "deleted": id }))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            match err.downcast_ref::<ApiError>() {
                Some(api_err) => {
                    let body = json!({
                        "notification": Notification::from_error(api_err),
                        "error": api_err.to_response(),
                    });
                    eprintln!("{}", body);
                }
                None => eprintln!("{:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
