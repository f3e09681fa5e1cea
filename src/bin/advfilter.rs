use std::fs;
use std::path::{Path, PathBuf};

use advfilter::config::Config;
use advfilter::core::models::{ApiFilterRequest, ApiFilterResponse, FilterGroup, PaginationConfig, SortSpec};
use advfilter::core::types::SortOrder;
use advfilter::services::{
    AdvancedFilter, ExecutionMode, FetchOutcome, FilterEdit, InMemorySearchBackend, LocalSource,
};
use clap::{Parser, ValueEnum};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

/// Run a grouped AND/OR filter query over a JSON array of records
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// JSON file holding an array of records
    #[arg(long = "data", value_name = "PATH")]
    data: PathBuf,
    /// Query file (JSON, or YAML for .yml/.yaml): a full request or a bare list of groups
    #[arg(long = "query", value_name = "PATH")]
    query: Option<PathBuf>,
    /// Run through the paginated search backend instead of filtering in memory
    #[arg(long = "remote")]
    remote: bool,
    /// Page to return, starting at 1
    #[arg(long = "page")]
    page: Option<usize>,
    /// Rows per page (defaults to filter.default_page_size)
    #[arg(long = "page-size")]
    page_size: Option<usize>,
    /// Field to sort by
    #[arg(long = "sort-by", value_name = "FIELD")]
    sort_by: Option<String>,
    #[arg(long = "sort-order", value_enum, default_value_t = Direction::Asc)]
    sort_order: Direction,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Direction { Asc, Desc }

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryFile {
    Groups(Vec<FilterGroup>),
    Request(ApiFilterRequest),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let cwd = std::env::current_dir()?;
    let log_path = cwd.join(advfilter::logging::LOG_FILE.clone());
    let level = match args.logging {
        Some(LogLevel::Error) => Some(tracing::Level::ERROR),
        Some(LogLevel::Warn)  => Some(tracing::Level::WARN),
        Some(LogLevel::Info)  => Some(tracing::Level::INFO),
        Some(LogLevel::Debug) => Some(tracing::Level::DEBUG),
        Some(LogLevel::Trace) => Some(tracing::Level::TRACE),
        None => Some(tracing::Level::WARN),
    };
    advfilter::logging::init_with(Some(log_path), level)?;

    let cfg = Config::from_path(args.config.as_ref()).wrap_err("failed to load config")?;
    let records = load_records(&args.data)?;
    let query = match &args.query {
        Some(path) => Some(load_query(path)?),
        None => None,
    };
    info!(
        "Loaded {} records, query: {}",
        records.len(),
        args.query.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "none".into())
    );

    // CLI flags win over the query file, which wins over config
    let mut settings = cfg.filter.clone();
    let mut groups = Vec::new();
    let mut page = 1;
    match query {
        Some(QueryFile::Groups(g)) => groups = g,
        Some(QueryFile::Request(request)) => {
            page = request.page;
            settings.default_page_size = request.page_size;
            if request.sort_by.is_some() {
                settings.sort_by = request.sort_by;
                settings.sort_order = request.sort_order.unwrap_or_default();
            }
            groups = request.condition_groups;
        }
        None => {}
    }
    if let Some(p) = args.page {
        page = p;
    }
    if let Some(size) = args.page_size {
        settings.default_page_size = size;
    }
    if let Some(field) = args.sort_by.clone() {
        settings.sort_by = Some(field);
        settings.sort_order = match args.sort_order {
            Direction::Asc => SortOrder::Asc,
            Direction::Desc => SortOrder::Desc,
        };
    }

    let mode = if args.remote {
        ExecutionMode::remote(InMemorySearchBackend::new(records))
    } else {
        ExecutionMode::Local(LocalSource::from_records(records))
    };
    let mut filter = AdvancedFilter::new(cfg.new_filter_state(), mode, &settings);

    filter.mount().await;
    if !groups.is_empty() {
        filter.apply(FilterEdit::ReplaceGroups(groups)).await?;
    }
    filter.apply(FilterEdit::SetPanelOpen(true)).await?;
    if page != 1 && filter.change_page(page).await? == Some(FetchOutcome::Failed) {
        debug!("Page {} could not be loaded", page);
    }

    if let Some(e) = filter.last_error() {
        return Err(eyre!("search failed: {e}"));
    }

    let response = if filter.is_remote() {
        let pagination = *filter.pagination();
        ApiFilterResponse {
            data: filter.filtered_data().into_iter().cloned().collect(),
            total: pagination.total,
            page: pagination.page,
            page_size: pagination.page_size,
            total_pages: pagination.total_pages,
        }
    } else {
        paginate_local(filter.filtered_data(), page, settings.page_size(), filter.sort())
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn load_records(path: &Path) -> Result<Vec<Value>> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read data file {}", path.display()))?;
    let records: Vec<Value> = serde_json::from_str(&text)
        .wrap_err_with(|| format!("{} is not a JSON array", path.display()))?;
    Ok(records)
}

fn load_query(path: &Path) -> Result<QueryFile> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read query file {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"));
    let query = if is_yaml {
        serde_yaml::from_str(&text).wrap_err("failed to parse YAML query")?
    } else {
        serde_json::from_str(&text).wrap_err("failed to parse JSON query")?
    };
    Ok(query)
}

fn paginate_local(
    mut rows: Vec<&Value>,
    page: usize,
    page_size: usize,
    sort: Option<&SortSpec>,
) -> ApiFilterResponse<Value> {
    if let Some(sort) = sort {
        rows.sort_by(|a, b| {
            let left = field_text(a, &sort.field);
            let right = field_text(b, &sort.field);
            match sort.order {
                SortOrder::Asc => left.cmp(&right),
                SortOrder::Desc => right.cmp(&left),
            }
        });
    }
    let total = rows.len();
    let pagination = PaginationConfig {
        page: page.max(1),
        page_size,
        total,
        total_pages: PaginationConfig::pages_for(total, page_size),
    };
    ApiFilterResponse {
        data: rows
            .into_iter()
            .skip(pagination.offset())
            .take(page_size)
            .cloned()
            .collect(),
        total,
        page: pagination.page,
        page_size,
        total_pages: pagination.total_pages,
    }
}

fn field_text(row: &Value, field: &str) -> String {
    advfilter::core::record::record_value(row, field).to_lowercase()
}
