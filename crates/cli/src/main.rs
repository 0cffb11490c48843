use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use numsort_core::{
    apply_plan, generate_plan, load_config, load_config_from, AnchorMode, AppConfig,
    FailurePolicy, ReportFormat, SortOptions, SortPlan,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "numsort")]
#[command(about = "ファイル名の先頭/末尾の番号をゼロ埋めして桁数を揃えます")]
struct Cli {
    /// 対象フォルダ (省略時はカレントフォルダ)
    #[arg(short = 'd', long, value_name = "DIR")]
    directory: Option<PathBuf>,
    /// サブフォルダも含めて番号を揃える
    #[arg(short, long, default_value_t = false)]
    recursive: bool,
    /// 実際にはリネームせず結果だけ表示する
    #[arg(short = 't', long = "test", visible_alias = "simulate", default_value_t = false)]
    test: bool,
    /// 番号がファイル名の末尾にある
    #[arg(short, long, default_value_t = false)]
    suffix: bool,
    /// 失敗した時点で残りのリネームを中止する
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// ドットで始まるエントリを対象外にする
    #[arg(long, default_value_t = false)]
    exclude_hidden: bool,
    #[arg(long, value_enum)]
    output: Option<OutputFormat>,
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Table => Self::Table,
            ReportFormat::Json => Self::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match cli.config.as_deref() {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let cwd = std::env::current_dir().context("カレントフォルダを取得できませんでした")?;

    cmd_sort(&cli, &config, &cwd)
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn sort_options(cli: &Cli, config: &AppConfig, cwd: &Path) -> SortOptions {
    SortOptions {
        root: cli.directory.clone().unwrap_or_else(|| cwd.to_path_buf()),
        recursive: cli.recursive || config.recursive_default,
        anchor: AnchorMode::from_suffix_flag(cli.suffix || config.suffix_default),
        exclude_hidden: cli.exclude_hidden || config.exclude_hidden_default,
    }
}

fn cmd_sort(cli: &Cli, config: &AppConfig, cwd: &Path) -> Result<()> {
    let options = sort_options(cli, config, cwd);
    let policy = FailurePolicy::from_strict_flag(cli.strict || config.strict_default);
    let output = cli.output.unwrap_or_else(|| config.output.into());

    let plan = generate_plan(&options)?;

    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        OutputFormat::Table => {
            print_table(&plan);
        }
    }

    if cli.test {
        eprintln!("テストモード: 実ファイルは変更していません。");
        return Ok(());
    }

    let result = apply_plan(&plan, policy)?;
    eprintln!(
        "適用完了: {}件 (変更なし {}件, スキップ {}件, 失敗 {}件)",
        result.applied,
        result.unchanged,
        result.skipped,
        result.failures.len()
    );
    for failure in &result.failures {
        eprintln!("  {}", failure.reason);
    }

    if !result.failures.is_empty() {
        anyhow::bail!("{}件のリネームに失敗しました", result.failures.len());
    }
    Ok(())
}

fn print_table(plan: &SortPlan) {
    for candidate in &plan.candidates {
        println!("{}", candidate.report_line());
    }

    eprintln!(
        "\n集計: width={} max={} scanned={} numbered={} planned={} unchanged={} no_match={} conflicts={} hidden_skip={}",
        plan.width,
        plan.max_number
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string()),
        plan.stats.scanned_entries,
        plan.stats.numbered,
        plan.stats.planned,
        plan.stats.unchanged,
        plan.stats.no_match,
        plan.stats.conflicts,
        plan.stats.skipped_hidden
    );
}
