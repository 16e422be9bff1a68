// 🔗 Pipeline - Loader → Cleaner → Aggregator → {Writer, Reporter}
//
// Nothing is written until loading, cleaning and aggregation have all
// succeeded, so a missing input or a bad date leaves the outputs untouched.

use crate::aggregator::{aggregate, SalesSummary};
use crate::cleaner::{Cleaner, CleaningSummary};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::loader::load_table;
use crate::progress::{PipelineEvent, ProgressSink};
use crate::report::{render_report, write_report, ReportContext};
use crate::table::TransactionTable;
use crate::writer::write_workbook;
use chrono::NaiveDateTime;
use tracing::{info, warn};

/// Per-group rounding can move a column total by at most half a cent per row
const ROUNDING_TOLERANCE_PER_GROUP: f64 = 0.005;

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub table: TransactionTable,
    pub cleaning: CleaningSummary,
    pub summary: SalesSummary,
    pub report: String,
}

pub fn run_pipeline(
    config: &PipelineConfig,
    generated_at: NaiveDateTime,
    progress: &mut dyn ProgressSink,
) -> Result<PipelineOutcome> {
    config.validate()?;

    // 1. Load
    progress.on_event(&PipelineEvent::LoadStarted {
        input: &config.input_path,
    });
    let raw = load_table(&config.input_path, &config.sheet_name)?;
    progress.on_event(&PipelineEvent::Loaded { table: &raw });

    // 2. Clean
    let cleaned = Cleaner::new().clean(raw, progress)?;

    // 3. Aggregate
    let summary = aggregate(&cleaned.table);
    let groups = summary
        .categories
        .len()
        .max(summary.customers.len())
        .max(summary.daily.len());
    let tolerance = ROUNDING_TOLERANCE_PER_GROUP * groups as f64 + 1e-9;
    if !summary.totals_agree(tolerance) {
        warn!(
            discrepancy = summary.total_discrepancy(),
            "summary totals disagree with the grand total"
        );
    }

    progress.on_event(&PipelineEvent::Statistics {
        stats: &summary.statistics,
    });
    progress.on_event(&PipelineEvent::CategorySummary {
        rows: &summary.categories,
    });
    progress.on_event(&PipelineEvent::CustomerSummary {
        rows: &summary.customers,
    });

    // 4. Workbook
    progress.on_event(&PipelineEvent::SavingStarted {
        output: &config.output_path,
    });
    write_workbook(&config.output_path, &cleaned.table, &summary)?;
    progress.on_event(&PipelineEvent::WorkbookSaved {
        output: &config.output_path,
    });

    // 5. Report
    progress.on_event(&PipelineEvent::ReportStarted);
    let report = render_report(&ReportContext {
        generated_at,
        input_file: PipelineConfig::display_name(&config.input_path),
        output_file: PipelineConfig::display_name(&config.output_path),
        report_file: PipelineConfig::display_name(&config.report_path),
        cleaning: &cleaned.summary,
        summary: &summary,
        top_customers: config.top_customers,
    });
    progress.on_event(&PipelineEvent::ReportGenerated { text: &report });
    write_report(&config.report_path, &report)?;
    progress.on_event(&PipelineEvent::ReportSaved {
        path: &config.report_path,
    });

    info!(
        rows = cleaned.table.len(),
        output = %config.output_path.display(),
        report = %config.report_path.display(),
        "pipeline finished"
    );

    Ok(PipelineOutcome {
        table: cleaned.table,
        cleaning: cleaned.summary,
        summary,
        report,
    })
}
