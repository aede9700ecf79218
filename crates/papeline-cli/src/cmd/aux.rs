//! `aux` subcommand group: direct scripting access to C10's auxiliary
//! NCBI clients, independent of the main batch pipeline.

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};

use papeline_pmc::Config;
use papeline_pmc::aux::bioc::{BiocClient, HttpBiocClient};
use papeline_pmc::aux::cite::{CiteClient, CiteFormat, HttpCiteClient};
use papeline_pmc::aux::oa::{HttpOaClient, OaClient};
use papeline_pmc::aux::oai::{HttpOaiClient, OaiClient, OaiHarvestIter, OaiQuery};

#[derive(Args, Debug)]
pub struct AuxArgs {
    #[command(subcommand)]
    pub command: AuxCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuxCommand {
    /// Fetch a PMC article in BioC XML
    Bioc { pmcid: String },
    /// Look up Open Access download links and license for a PMCID
    Oa { pmcid: String },
    /// Harvest OAI-PMH records, following resumption tokens
    OaiListRecords(OaiArgs),
    /// Harvest OAI-PMH identifiers, following resumption tokens
    OaiListIdentifiers(OaiArgs),
    /// Export a citation in a reference-manager format
    Cite {
        pmcid: String,
        #[arg(long, value_enum, default_value_t = CiteFormatArg::Medline)]
        format: CiteFormatArg,
    },
}

#[derive(Args, Debug)]
pub struct OaiArgs {
    #[arg(long)]
    pub set: Option<String>,
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub until: Option<String>,
    #[arg(long, default_value = "pmc")]
    pub metadata_prefix: String,
    /// Stop after this many records (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CiteFormatArg {
    Medline,
    Bibtex,
    Ris,
    Nbib,
    Pubmed,
}

impl From<CiteFormatArg> for CiteFormat {
    fn from(f: CiteFormatArg) -> Self {
        match f {
            CiteFormatArg::Medline => CiteFormat::Medline,
            CiteFormatArg::Bibtex => CiteFormat::BibTex,
            CiteFormatArg::Ris => CiteFormat::Ris,
            CiteFormatArg::Nbib => CiteFormat::Nbib,
            CiteFormatArg::Pubmed => CiteFormat::PubMed,
        }
    }
}

pub fn run(args: AuxArgs, config: &Config) -> Result<()> {
    let email = config.credential_pool().next_email();
    let timeout = config.timeout();

    match args.command {
        AuxCommand::Bioc { pmcid } => {
            let body = HttpBiocClient.fetch_bioc(&pmcid, timeout).context("BioC fetch")?;
            println!("{body}");
        }
        AuxCommand::Oa { pmcid } => {
            let record = HttpOaClient.lookup_remote(&pmcid, timeout).context("OA lookup")?;
            println!("license: {}", record.license.as_deref().unwrap_or("unknown"));
            for link in &record.links {
                println!("{}: {}", link.format, link.href);
            }
        }
        AuxCommand::OaiListRecords(oai_args) => run_oai_harvest(oai_args, &email, timeout, true)?,
        AuxCommand::OaiListIdentifiers(oai_args) => run_oai_harvest(oai_args, &email, timeout, false)?,
        AuxCommand::Cite { pmcid, format } => {
            let text = HttpCiteClient
                .export(&pmcid, format.into(), &email, timeout)
                .context("citation export")?;
            println!("{text}");
        }
    }
    Ok(())
}

fn run_oai_harvest(args: OaiArgs, _email: &str, timeout: std::time::Duration, records: bool) -> Result<()> {
    let client = HttpOaiClient;
    let query = OaiQuery {
        set: args.set,
        from: args.from,
        until: args.until,
        metadata_prefix: args.metadata_prefix,
    };
    let iter: Box<dyn Iterator<Item = _>> = if records {
        Box::new(OaiHarvestIter::list_records(&client, query, timeout))
    } else {
        Box::new(OaiHarvestIter::list_identifiers(&client, query, timeout))
    };

    let mut seen = 0usize;
    for result in iter {
        let record = result.context("OAI-PMH harvest")?;
        println!("{}\t{}", record.identifier, record.datestamp);
        seen += 1;
        if args.limit != 0 && seen >= args.limit {
            break;
        }
    }
    Ok(())
}
