use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use client_core::{
    load_settings, ClientSettings, EmployeeTable, ExportOutcome, FilterField, TableSnapshot,
};
use shared::domain::{ExportMode, PageSize, SortField};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Browse and export the employee directory from a terminal.
#[derive(Parser, Debug)]
struct Args {
    /// Settings file (defaults to ./employee_table.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// API base url, e.g. http://localhost:5000/api
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    salary_min: Option<String>,
    #[arg(long)]
    salary_max: Option<String>,
    /// Column to sort by; repeat to click the same header again.
    #[arg(long = "sort-by")]
    sort_by: Vec<SortField>,
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    per_page: Option<PageSize>,
    /// Export to employees.xlsx after listing: `filtered` or `all`.
    #[arg(long)]
    export: Option<ExportMode>,
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

impl Args {
    fn apply_to(&self, settings: &mut ClientSettings) {
        if let Some(url) = &self.server_url {
            settings.api_base_url = url.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.request_timeout_ms = timeout_ms;
        }
        if let Some(dir) = &self.out_dir {
            settings.export_dir = dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    args.apply_to(&mut settings);
    settings.validate()?;

    let mut table = EmployeeTable::connect(&settings).context("failed to build api client")?;
    let result = run(&mut table, &args).await;
    table.teardown().await;
    result
}

async fn run(table: &mut EmployeeTable, args: &Args) -> Result<()> {
    table.settle().await;

    if let Some(department) = &args.department {
        table.set_filter(FilterField::Department, department)?;
    }
    if let Some(min) = &args.salary_min {
        table.set_filter(FilterField::SalaryMin, min)?;
    }
    if let Some(max) = &args.salary_max {
        table.set_filter(FilterField::SalaryMax, max)?;
    }
    for field in &args.sort_by {
        table.set_sort(*field);
    }
    if let Some(per_page) = args.per_page {
        table.set_page_size(per_page);
    }
    table.set_page(args.page.saturating_sub(1));
    table.settle().await;

    let snapshot = table.bindings().snapshot();
    print_page(table, &snapshot)?;
    if let Some(message) = &snapshot.error {
        return Err(anyhow!("failed to load employees: {message}"));
    }

    let Some(mode) = args.export else {
        return Ok(());
    };
    table.set_export_mode(mode);
    if !table.export_available() {
        warn!("export: nothing to export for the current filters");
        return Ok(());
    }
    match table.export().await {
        ExportOutcome::Saved { bytes } => {
            info!(bytes, export_type = mode.as_wire(), "export: done");
            Ok(())
        }
        ExportOutcome::Failed(message) => Err(anyhow!("export failed: {message}")),
        ExportOutcome::Skipped => Ok(()),
    }
}

fn print_page(table: &EmployeeTable, snapshot: &TableSnapshot) -> Result<()> {
    let page = table.store().page();
    let sort = table.store().sort();
    println!(
        "{} of {} (sorted by {} {}, {} per page)",
        row_range(page.page_index, page.page_size.rows(), snapshot.items.len()),
        snapshot.total,
        sort.field,
        sort.direction,
        page.page_size.rows()
    );
    if !snapshot.departments.is_empty() {
        println!("departments: {}", snapshot.departments.join(", "));
    }
    for record in &snapshot.items {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

fn row_range(page_index: u32, rows: u32, shown: usize) -> String {
    if shown == 0 {
        return "0-0".to_string();
    }
    let from = u64::from(page_index) * u64::from(rows) + 1;
    format!("{from}-{}", from + shown as u64 - 1)
}
