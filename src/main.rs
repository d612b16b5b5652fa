// ABOUTME: Entry point for the cdispec binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and saves or streams CDI spec files.

mod config;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cdispec_core::format::Format;
use cdispec_core::naming::{
    KindNamer, SpecNamer, TransientNamer, parse_kind, qualified_device_name,
};
use cdispec_store::{Persister, RegistryDelegate, SpecDocument, SpecRegistry};
use clap::{Parser, Subcommand};

use crate::config::CdiSpecConfig;

#[derive(Debug, Parser)]
#[command(name = "cdispec", version, about = "Save and export CDI spec files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a spec to a path, appending an extension when it has none.
    Save {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        format: Option<Format>,
    },
    /// Stream a spec to stdout exactly as it would be saved.
    Export {
        input: PathBuf,
        #[arg(long)]
        format: Option<Format>,
        #[arg(long)]
        transient_id: Option<String>,
    },
    /// Print the fully qualified name of every device in a spec.
    Devices { input: PathBuf },
    /// Print the canonical file name for a spec.
    Name {
        input: PathBuf,
        #[arg(long)]
        transient_id: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cdispec=info,cdispec_store=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = CdiSpecConfig::from_env().context("load configuration")?;

    match cli.command {
        Command::Save {
            input,
            output,
            format,
        } => {
            let doc = load(&input, format.or(config.format))?;
            let written = Persister::new()
                .save(&doc, &output)
                .with_context(|| format!("save {}", output.display()))?;
            tracing::info!("saved spec to {}", written.display());
        }
        Command::Export {
            input,
            format,
            transient_id,
        } => {
            let doc = load(&input, format.or(config.format))?;
            let mut persister = Persister::new();
            if let Some(dir) = config.scratch_dir {
                persister = persister.with_scratch_dir(dir);
            }
            let copied = match transient_id {
                Some(id) => export(persister.with_namer(TransientNamer::new(id)), &doc)?,
                None => export(persister, &doc)?,
            };
            tracing::debug!("exported {} bytes", copied);
        }
        Command::Devices { input } => {
            let doc = load(&input, None)?;
            let (vendor, class) = parse_kind(&doc.raw().kind).context("parse spec kind")?;
            for device in &doc.raw().devices {
                println!("{}", qualified_device_name(vendor, class, &device.name));
            }
        }
        Command::Name {
            input,
            transient_id,
        } => {
            let doc = load(&input, None)?;
            let name = match transient_id {
                Some(id) => TransientNamer::new(id).name_for(doc.raw()),
                None => KindNamer.name_for(doc.raw()),
            }
            .context("generate spec name")?;
            println!("{name}");
        }
    }

    Ok(())
}

/// Read a spec file. Without an explicit format the input's own extension is kept.
fn load(input: &Path, format: Option<Format>) -> Result<SpecDocument> {
    let raw = SpecRegistry::read_spec(input)
        .with_context(|| format!("read spec {}", input.display()))?;
    Ok(SpecDocument::new(raw, format.or_else(|| Format::from_path(input))))
}

fn export<N: SpecNamer>(persister: Persister<RegistryDelegate, N>, doc: &SpecDocument) -> Result<u64> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let copied = persister.write_to(doc, &mut out).context("export spec")?;
    out.flush().context("flush stdout")?;
    Ok(copied)
}
