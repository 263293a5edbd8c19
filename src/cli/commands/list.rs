//! `mdi list` command - List documents with filters

use clap::ValueEnum;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::Workspace;
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::{FilterArgs, GlobalOpts, OutputFormat};
use crate::core::{apply_filters, Document, Milestone};

/// Columns to display in list output
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ListColumn {
    Stt,
    DocNo,
    Title,
    Discipline,
    Rev,
    Status,
    Pic,
    IfiPlan,
    IfrPlan,
    IfaPlan,
    Overdue,
    Critical,
}

impl ListColumn {
    fn key(&self) -> &'static str {
        match self {
            ListColumn::Stt => "stt",
            ListColumn::DocNo => "doc-no",
            ListColumn::Title => "title",
            ListColumn::Discipline => "discipline",
            ListColumn::Rev => "rev",
            ListColumn::Status => "status",
            ListColumn::Pic => "pic",
            ListColumn::IfiPlan => "ifi-plan",
            ListColumn::IfrPlan => "ifr-plan",
            ListColumn::IfaPlan => "ifa-plan",
            ListColumn::Overdue => "overdue",
            ListColumn::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ListColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("stt", "STT", 6),
    ColumnDef::new("doc-no", "DOCUMENT NO", 30),
    ColumnDef::new("title", "TITLE", 40),
    ColumnDef::new("discipline", "DISC", 12),
    ColumnDef::new("rev", "REV", 5),
    ColumnDef::new("status", "STATUS", 26),
    ColumnDef::new("pic", "PIC", 18),
    ColumnDef::new("ifi-plan", "IFI PLAN", 12),
    ColumnDef::new("ifr-plan", "IFR PLAN", 12),
    ColumnDef::new("ifa-plan", "IFA PLAN", 12),
    ColumnDef::new("overdue", "OVERDUE", 8),
    ColumnDef::new("critical", "CRITICAL", 9),
];

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Columns to display (can specify multiple)
    #[arg(long, value_delimiter = ',', default_values_t = vec![
        ListColumn::Stt,
        ListColumn::DocNo,
        ListColumn::Title,
        ListColumn::Discipline,
        ListColumn::Status,
        ListColumn::Pic,
        ListColumn::Overdue,
    ])]
    pub columns: Vec<ListColumn>,

    /// Limit output to N items
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only, not the items
    #[arg(long)]
    pub count: bool,

    /// Wrap long titles at N characters instead of truncating
    #[arg(long, value_name = "WIDTH")]
    pub wrap: Option<usize>,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let docs = ws.documents()?;
    let filters = args.filter.to_filter_state();

    let mut filtered = apply_filters(&docs, &filters);
    log::debug!("{} of {} documents match", filtered.len(), docs.len());

    if let Some(limit) = args.limit {
        filtered.truncate(limit);
    }

    if args.count {
        println!("{}", filtered.len());
        return Ok(());
    }

    if filtered.is_empty() {
        match ws.format(global) {
            OutputFormat::Json | OutputFormat::Yaml => println!("[]"),
            _ => {
                if !global.quiet {
                    println!("No documents found.");
                }
            }
        }
        return Ok(());
    }

    let format = match ws.format(global) {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&filtered).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&filtered).into_diagnostic()?);
        }
        _ => {
            let visible: Vec<&str> = args.columns.iter().map(|c| c.key()).collect();
            let config = match args.wrap {
                Some(width) => TableConfig::with_wrap(width),
                None if global.quiet => TableConfig::for_pipe(),
                None => TableConfig::default(),
            };
            TableFormatter::new(COLUMNS, "document")
                .with_config(config)
                .output(filtered.iter().map(document_row), format, &visible);
        }
    }

    Ok(())
}

/// One table row per document. `--format id` prints the document number.
pub fn document_row(doc: &Document) -> TableRow {
    TableRow::new(&doc.document_no)
        .cell("stt", CellValue::Number(doc.stt))
        .cell("doc-no", CellValue::DocNo(doc.document_no.clone()))
        .cell("title", CellValue::Text(doc.title.clone()))
        .cell("discipline", CellValue::Text(doc.discipline.clone()))
        .cell("rev", CellValue::Text(doc.revision.clone()))
        .cell("status", CellValue::Status(doc.status.clone()))
        .cell("pic", CellValue::opt_text(&doc.pic_ptsc))
        .cell("ifi-plan", plan_cell(doc, Milestone::Ifi))
        .cell("ifr-plan", plan_cell(doc, Milestone::Ifr))
        .cell("ifa-plan", plan_cell(doc, Milestone::Ifa))
        .cell("overdue", CellValue::Flag(doc.is_overdue))
        .cell("critical", CellValue::Flag(doc.is_critical))
}

fn plan_cell(doc: &Document, milestone: Milestone) -> CellValue {
    CellValue::Date(doc.plan_dates.get(milestone).map(str::to_string))
}
