//! Batch fetch/transform subcommand: the six mutually exclusive input
//! modes fan out through `papeline_pmc::Orchestrator`, each item landing
//! as a `PMC<id>.json` artifact plus one line in the run's ledger.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use papeline_core::{looks_like_doi, looks_like_pmcid_or_pmid, normalize_pmcid};
use papeline_pmc::idconv::{HttpIdConverter, IdConverter, id_convert_batch};
use papeline_pmc::{Config, LedgerEntry, Orchestrator, WorkItem, fetch};

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("input").required(true).multiple(false)))]
pub struct FetchArgs {
    /// Comma-separated PMCID-ish tokens (e.g. PMC7181753,7181754)
    #[arg(long, value_delimiter = ',', group = "input")]
    pub pmcids: Option<Vec<String>>,

    /// Comma-separated PMIDs, converted to PMCIDs before processing
    #[arg(long, value_delimiter = ',', group = "input")]
    pub pmids: Option<Vec<String>>,

    /// Comma-separated DOIs, converted to PMCIDs before processing
    #[arg(long, value_delimiter = ',', group = "input")]
    pub dois: Option<Vec<String>>,

    /// Text file, one identifier per line, type auto-detected
    #[arg(long, group = "input")]
    pub id_file: Option<PathBuf>,

    /// Directory of local JATS XML files
    #[arg(long, group = "input")]
    pub directory: Option<PathBuf>,

    /// Explicit list of local JATS XML file paths
    #[arg(long, value_delimiter = ',', group = "input")]
    pub files: Option<Vec<PathBuf>>,

    /// Output directory for per-item artifacts and the run summary
    #[arg(long, default_value = "./pmc_output")]
    pub output_dir: PathBuf,

    /// Number of parallel workers
    #[arg(long, default_value_t = 10)]
    pub workers: usize,

    /// Artifact emission format
    #[arg(long, value_enum, default_value_t = Format::PerItem)]
    pub format: Format,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    PerItem,
    Stream,
}

/// Process exit status a batch run maps to, per the CLI contract.
pub enum RunOutcome {
    Success,
    AllFetchesFailed,
    OutputUnwritable,
}

pub fn run(args: FetchArgs, config: &Config) -> Result<RunOutcome> {
    std::fs::create_dir_all(&args.output_dir)
        .map_err(|_| anyhow::anyhow!("output directory {} is not writable", args.output_dir.display()))?;

    let email = config.credential_pool().next_email();
    let timeout = config.timeout();
    let converter = HttpIdConverter;

    let (items, mut preflight_failures) = resolve_items(&args, &converter, &email, timeout)?;

    let mut orch_config = config.orchestrator_config();
    orch_config.workers = args.workers;
    orch_config.output_dir = Some(args.output_dir.clone());
    orch_config.output_mode = match args.format {
        Format::PerItem => papeline_pmc::OutputMode::PerItem,
        Format::Stream => papeline_pmc::OutputMode::Stream,
    };

    let orchestrator = Orchestrator::new(
        Box::new(papeline_pmc::HttpFetcher),
        config.credential_pool(),
        orch_config,
    );

    let had_remote_items = items.iter().any(|i| matches!(i, WorkItem::Pmcid(_)));
    let preflight_count = preflight_failures.len();
    let (mut ledger, summary) = orchestrator.process(&items);
    let preflight_entries = preflight_failures.clone();
    ledger.append(&mut preflight_failures);

    print_summary(&summary, preflight_count);
    write_summary_artifact(&args.output_dir, &summary, &preflight_entries, &ledger)
        .context("writing run summary")?;

    if had_remote_items && summary.successful == 0 && summary.failed > 0 {
        return Ok(RunOutcome::AllFetchesFailed);
    }
    Ok(RunOutcome::Success)
}

/// Build the orchestrator's work list from whichever input mode was
/// selected, resolving PMIDs/DOIs/id-file entries to PMCIDs up front.
/// Items that fail resolution are returned as ready-made ledger entries
/// rather than being handed to the orchestrator.
fn resolve_items(
    args: &FetchArgs,
    converter: &dyn IdConverter,
    email: &str,
    timeout: Duration,
) -> Result<(Vec<WorkItem>, Vec<LedgerEntry>)> {
    if let Some(pmcids) = &args.pmcids {
        return Ok(split_normalized(pmcids));
    }
    if let Some(pmids) = &args.pmids {
        return Ok(split_converted(pmids, converter, email, timeout));
    }
    if let Some(dois) = &args.dois {
        return Ok(split_converted(dois, converter, email, timeout));
    }
    if let Some(path) = &args.id_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading id file {}", path.display()))?;
        let ids: Vec<String> = content.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect();
        return Ok(split_autodetected(&ids, converter, email, timeout));
    }
    if let Some(dir) = &args.directory {
        let paths = fetch::walk_directory(dir)?;
        return Ok((paths.into_iter().map(WorkItem::LocalPath).collect(), Vec::new()));
    }
    if let Some(files) = &args.files {
        return Ok((files.iter().cloned().map(WorkItem::LocalPath).collect(), Vec::new()));
    }
    anyhow::bail!("no input mode selected")
}

fn split_normalized(ids: &[String]) -> (Vec<WorkItem>, Vec<LedgerEntry>) {
    let mut items = Vec::new();
    let mut failures = Vec::new();
    for id in ids {
        match normalize_pmcid(id) {
            Ok(pmcid) => items.push(WorkItem::Pmcid(pmcid)),
            Err(e) => failures.push(LedgerEntry::unresolved(id, e)),
        }
    }
    (items, failures)
}

fn split_converted(
    ids: &[String],
    converter: &dyn IdConverter,
    email: &str,
    timeout: Duration,
) -> (Vec<WorkItem>, Vec<LedgerEntry>) {
    let mut items = Vec::new();
    let mut failures = Vec::new();
    for (id, result) in id_convert_batch(converter, ids, email, timeout) {
        match result {
            Ok(pmcid) => items.push(WorkItem::Pmcid(pmcid)),
            Err(e) => failures.push(LedgerEntry::unresolved(&id, e)),
        }
    }
    (items, failures)
}

/// A bare numeric token in an id-file defaults to PMID, not PMCID — only an
/// explicit `PMC` prefix is treated as already being a PMCID.
fn has_pmc_prefix(id: &str) -> bool {
    let trimmed = id.trim();
    trimmed.len() >= 3 && trimmed[..3].eq_ignore_ascii_case("pmc")
}

fn split_autodetected(
    ids: &[String],
    converter: &dyn IdConverter,
    email: &str,
    timeout: Duration,
) -> (Vec<WorkItem>, Vec<LedgerEntry>) {
    let (direct, needs_conversion): (Vec<_>, Vec<_>) =
        ids.iter().cloned().partition(|id| has_pmc_prefix(id) && looks_like_pmcid_or_pmid(id) && normalize_pmcid(id).is_ok());
    let (dois, unrecognized): (Vec<_>, Vec<_>) = needs_conversion.into_iter().partition(|id| looks_like_doi(id));

    let (mut items, mut failures) = split_normalized(&direct);
    let (pmid_items, pmid_failures) = split_converted(&unrecognized, converter, email, timeout);
    let (doi_items, doi_failures) = split_converted(&dois, converter, email, timeout);
    items.extend(pmid_items);
    items.extend(doi_items);
    failures.extend(pmid_failures);
    failures.extend(doi_failures);
    (items, failures)
}

fn print_summary(summary: &papeline_pmc::BatchSummary, preflight_failures: usize) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![Cell::new("Metric").fg(Color::Cyan), Cell::new("Value").fg(Color::Cyan)]);
    table.add_row(vec!["Requested", &(summary.total_requested + preflight_failures).to_string()]);
    table.add_row(vec!["Succeeded", &summary.successful.to_string()]);
    table.add_row(vec!["Failed", &(summary.failed + preflight_failures).to_string()]);
    table.add_row(vec!["Elapsed", &format!("{:.1}s", summary.elapsed_seconds)]);
    eprintln!("\n{table}");
}

fn write_summary_artifact(
    output_dir: &std::path::Path,
    summary: &papeline_pmc::BatchSummary,
    preflight_entries: &[LedgerEntry],
    ledger: &[LedgerEntry],
) -> Result<()> {
    let failed_items: Vec<_> = ledger
        .iter()
        .filter_map(|entry| match &entry.result {
            Err((kind, _)) => Some(serde_json::json!({
                "id": entry.item,
                "last_error_kind": kind.to_string(),
                "attempts": entry.attempts,
            })),
            Ok(_) => None,
        })
        .collect();

    let mut error_counts = summary.error_counts.clone();
    for entry in preflight_entries {
        if let Err((kind, _)) = &entry.result {
            *error_counts.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    let artifact = serde_json::json!({
        "total_requested": summary.total_requested + preflight_entries.len(),
        "successful": summary.successful,
        "failed": summary.failed + preflight_entries.len(),
        "error_counts": error_counts,
        "elapsed_seconds": summary.elapsed_seconds,
        "failed_items": failed_items,
    });

    let path = output_dir.join("summary.json");
    std::fs::write(&path, serde_json::to_string_pretty(&artifact)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
