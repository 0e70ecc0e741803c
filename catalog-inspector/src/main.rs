use std::fs;
use std::path::Path;
use std::process;

use catalog_filter::{FilterConfig, FilterEngine, MissingCharacteristic};
use clap::{Arg, ArgAction, Command};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod html;
mod report;

use error::InspectError;
use report::{collect_pages, inspect_file, InspectOptions, PageReport};

fn main() {
    // 设置命令行参数
    let matches = Command::new("目录筛选检查器")
        .version(env!("CARGO_PKG_VERSION"))
        .about("在服务端渲染的目录页面上模拟商品筛选")
        .arg(Arg::new("path")
            .value_name("PATH")
            .help("HTML 文件或包含 HTML 文件的目录")
            .required(true))
        .arg(Arg::new("query")
            .short('q')
            .long("query")
            .value_name("TEXT")
            .help("搜索词"))
        .arg(Arg::new("max_price")
            .short('p')
            .long("max-price")
            .value_name("PRICE")
            .help("价格上限"))
        .arg(Arg::new("filter")
            .short('f')
            .long("filter")
            .value_name("CATEGORY=VALUE")
            .help("勾选类别筛选，可重复")
            .action(ArgAction::Append))
        .arg(Arg::new("config")
            .short('c')
            .long("config")
            .value_name("FILE")
            .help("筛选器 JSON 配置文件"))
        .arg(Arg::new("lenient")
            .long("lenient")
            .help("缺少类别的商品不受该类别筛选限制")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("json")
            .long("json")
            .help("以 JSON 输出报告")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("显示详细信息")
            .action(ArgAction::SetTrue))
        .get_matches();

    init_tracing(matches.get_flag("verbose"));

    if let Err(e) = run(&matches) {
        eprintln!("错误: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(matches: &clap::ArgMatches) -> Result<(), InspectError> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|source| InspectError::Io {
                path: path.into(),
                source,
            })?;
            FilterConfig::from_json(&json)?
        }
        None => FilterConfig::default(),
    };
    if matches.get_flag("lenient") {
        config.missing_characteristic = MissingCharacteristic::Lenient;
    }

    let options = InspectOptions {
        query: matches.get_one::<String>("query").cloned(),
        max_price: matches
            .get_one::<String>("max_price")
            .map(|p| InspectOptions::parse_price(p))
            .transpose()?,
        filters: matches
            .get_many::<String>("filter")
            .into_iter()
            .flatten()
            .map(|f| InspectOptions::parse_filter(f))
            .collect::<Result<_, _>>()?,
    };
    debug!(?options, "筛选条件");

    // 路径参数为必填项
    let path = Path::new(matches.get_one::<String>("path").map(String::as_str).unwrap_or("."));
    let pages = collect_pages(path)?;
    info!("找到 {} 个页面", pages.len());

    let engine = FilterEngine::new(config);
    let mut reports = Vec::new();
    for page in &pages {
        match inspect_file(page, &engine, &options) {
            Ok(report) => reports.push(report),
            Err(e) => warn!("跳过 {}: {}", page.display(), e),
        }
    }

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }
    Ok(())
}

fn print_report(report: &PageReport) {
    let outcome = &report.outcome;
    println!("{}", report.path);
    println!("  可见 {}，隐藏 {}", outcome.visible, outcome.hidden);

    for entry in &report.entries {
        let mark = if entry.visible { "+" } else { "-" };
        let view = entry.view.as_deref().unwrap_or("-");
        println!("  {} [{}] {} ({}) @ {}", mark, entry.id, entry.name, entry.price, view);
    }

    match outcome.active_view.as_deref() {
        Some(view) if report.empty_state_shown => {
            println!("  当前视图 {} 没有可见商品，将显示空结果提示", view)
        }
        Some(view) => println!("  当前视图 {} 可见 {}", view, outcome.active_view_visible),
        None => println!("  页面没有激活的视图"),
    }
}
