use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use soscope_core::{code_regions, decode, scan_printable_runs, Architecture, Artifact, Digest};

mod output;

/// Native library inspector
#[derive(Parser)]
#[command(
    name = "soscope",
    about = "Inspect native binaries (ELF identification, strings, SHA-256, disassembly)",
    version,
    author
)]
struct Cli {
    /// Path to binary file
    #[arg(required = true)]
    path: std::path::PathBuf,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show ELF identification fields
    Ident,
    /// List NUL-terminated printable strings
    Strings {
        /// Minimum string length
        #[arg(short = 'n', long, default_value_t = 4)]
        min_len: usize,
        /// Prefix each string with its file offset
        #[arg(short = 't', long)]
        offsets: bool,
    },
    /// Print the SHA-256 digest
    Hash {
        /// Exit with an error unless the digest matches
        #[arg(long)]
        expect: Option<Digest>,
    },
    /// List executable sections (or segments, if stripped)
    Regions,
    /// Disassemble a region, or a raw slice of the file
    Disasm {
        /// Instruction set; detected from the ELF header when omitted
        #[arg(long)]
        arch: Option<Architecture>,
        /// Address of the first byte (default: region address, or 0)
        #[arg(long, value_parser = parse_address)]
        base: Option<u64>,
        /// Executable section to decode, e.g. .text
        #[arg(long, conflicts_with_all = ["offset", "length"])]
        section: Option<String>,
        /// File offset of a raw slice
        #[arg(long, value_parser = parse_address)]
        offset: Option<u64>,
        /// Length of a raw slice
        #[arg(long, value_parser = parse_address)]
        length: Option<u64>,
        /// Stop after this many instructions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Digest, identification, string count and code regions in one go
    Report {
        /// Minimum string length
        #[arg(short = 'n', long, default_value_t = 4)]
        min_len: usize,
    },
}

/// Accepts `0x`-prefixed hex or decimal.
fn parse_address(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

struct DisasmTarget<'a> {
    code: &'a [u8],
    base: u64,
    architecture: Option<Architecture>,
}

fn select_target<'a>(
    artifact: &'a Artifact,
    section: Option<String>,
    offset: Option<u64>,
    length: Option<u64>,
) -> Result<DisasmTarget<'a>> {
    let data = artifact.bytes();
    let ident = artifact.identification().ok();
    let raw_slice = offset.is_some() || length.is_some();

    if ident.is_some() && !raw_slice {
        let map = code_regions(data)?;
        let region = match &section {
            Some(name) => map
                .find(name)
                .with_context(|| format!("no executable region named {name}"))?,
            None => map
                .find(".text")
                .or_else(|| map.regions.first())
                .context("no executable regions found")?,
        };
        log::info!("Disassembling {} ({} bytes)", region.name, region.size);
        let code = region
            .bytes(data)
            .with_context(|| format!("{} runs past end of file", region.name))?;
        return Ok(DisasmTarget {
            code,
            base: region.address,
            architecture: map.architecture,
        });
    }
    if let Some(name) = section {
        bail!("{} is not an ELF image; cannot locate {name}", artifact.path);
    }

    let start = offset.unwrap_or(0) as usize;
    if start > data.len() {
        bail!("offset {start:#x} is past end of file ({:#x} bytes)", data.len());
    }
    let end = match length {
        Some(len) => start.saturating_add(len as usize).min(data.len()),
        None => data.len(),
    };
    Ok(DisasmTarget {
        code: &data[start..end],
        base: 0,
        architecture: ident.and_then(|id| id.architecture()),
    })
}

/// Fails unless `actual` equals `expected`, so `hash --expect` exits non-zero.
fn verify_digest(expected: &Digest, actual: &Digest) -> Result<()> {
    if expected != actual {
        bail!("SHA-256 mismatch: expected {expected}, got {actual}");
    }
    log::info!("Digest matches");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let artifact = Artifact::open(&cli.path)?;

    match cli.command {
        Command::Ident => {
            let id = artifact.identification()?;
            if cli.json {
                output::json(&id)?;
            } else {
                output::identification(&id);
            }
        }

        Command::Strings { min_len, offsets } => {
            let found = scan_printable_runs(artifact.bytes(), min_len);
            if cli.json {
                output::json(&found)?;
            } else {
                output::strings(&found, offsets);
            }
        }

        Command::Hash { expect } => {
            let digest = artifact.digest();
            if cli.json {
                output::json(&digest)?;
            } else {
                println!("{}  {}", digest, artifact.path);
            }
            if let Some(expected) = expect {
                verify_digest(&expected, &digest)?;
            }
        }

        Command::Regions => {
            let map = code_regions(artifact.bytes())?;
            if cli.json {
                output::json(&map)?;
            } else {
                output::regions(&map);
            }
        }

        Command::Disasm {
            arch,
            base,
            section,
            offset,
            length,
            limit,
        } => {
            let target = select_target(&artifact, section, offset, length)?;
            let Some(architecture) = arch.or(target.architecture) else {
                bail!("cannot detect the architecture; pass --arch");
            };
            let base = base.unwrap_or(target.base);
            let insns = decode(target.code, base, architecture)?.take(limit.unwrap_or(usize::MAX));
            if cli.json {
                output::json(&insns.collect::<Vec<_>>())?;
            } else {
                output::instructions(insns);
            }
        }

        Command::Report { min_len } => {
            let report = artifact.report(min_len);
            if cli.json {
                output::json(&report)?;
            } else {
                output::report(&report);
            }
        }
    }

    Ok(())
}
