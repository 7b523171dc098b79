use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_num::maybe_hex;
use zobj_core::format::decode_vertices;
use zobj_core::{Entry, EntryKind, ObjectEntry, TextureEntry, TextureFormat, VERTEX_SIZE};

use project::Project;

mod project;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Dlist,
    Vertex,
    Texture,
    Unknown,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a project around a raw object file
    Init {
        #[clap(short, long)]
        input: PathBuf,
        #[clap(short, long)]
        project_dir: PathBuf,
    },
    /// List every entry with its offset
    Info {
        #[clap(short, long)]
        project_dir: PathBuf,
    },
    /// Describe a region of the object as a typed entry
    Add {
        #[clap(short, long)]
        project_dir: PathBuf,
        #[clap(short, long, value_enum)]
        kind: Kind,
        #[clap(short, long, value_parser = maybe_hex::<u32>)]
        offset: u32,
        #[clap(long, value_parser = maybe_hex::<u32>)]
        size: Option<u32>,
        #[clap(long)]
        count: Option<u32>,
        #[clap(long)]
        width: Option<u32>,
        #[clap(long)]
        height: Option<u32>,
        #[clap(long)]
        format: Option<String>,
        #[clap(long)]
        tlut: Option<String>,
        #[clap(short, long)]
        name: Option<String>,
    },
    /// Merge adjacent unknown entries and regenerate names
    Tidy {
        #[clap(short, long)]
        project_dir: PathBuf,
    },
    /// Write the rebuilt object
    Build {
        #[clap(short, long)]
        project_dir: PathBuf,
        #[clap(short, long)]
        output: PathBuf,
    },
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

struct AddRequest {
    kind: Kind,
    offset: u32,
    size: Option<u32>,
    count: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    format: Option<String>,
    tlut: Option<String>,
    name: Option<String>,
}

fn info(project_dir: &Path) -> Result<()> {
    let project = Project::open(project_dir)?;
    let object = project.object();
    for (offset, entry) in object.iter_with_offsets() {
        println!(
            "0x{:06X}  {:<8} 0x{:06X}  {}",
            offset,
            entry.kind().to_string(),
            entry.size(),
            entry.name()
        );
    }
    println!("{} entries, 0x{:X} bytes", object.len(), object.total_size());
    Ok(())
}

fn add(project_dir: &Path, request: AddRequest) -> Result<()> {
    let mut project = Project::open(project_dir)?;
    let entry = carve_entry(&project, &request)?;
    let index = project.object_mut().insert(entry, Some(request.offset))?;
    log::info!(
        "added {:?} at 0x{:X}",
        project.object().entries()[index].name(),
        request.offset
    );
    project.save()
}

/// Builds the requested entry from the bytes currently in the project blob.
fn carve_entry(project: &Project, request: &AddRequest) -> Result<Entry> {
    let name = |kind| {
        request
            .name
            .clone()
            .unwrap_or_else(|| Entry::auto_name(kind, request.offset))
    };

    let entry = match request.kind {
        Kind::Dlist | Kind::Unknown => {
            let size = request.size.context("--size is required")?;
            let data = project.slice(request.offset, size)?.to_vec();
            match request.kind {
                Kind::Dlist => Entry::dlist(&name(EntryKind::DList), data)?,
                _ => Entry::unknown(&name(EntryKind::Unknown), data)?,
            }
        }
        Kind::Vertex => {
            let count = request.count.context("--count is required")?;
            let size = count.checked_mul(VERTEX_SIZE).context("--count too large")?;
            let data = project.slice(request.offset, size)?;
            Entry::vertices(&name(EntryKind::Vertex), decode_vertices(data)?)?
        }
        Kind::Texture => {
            let width = request.width.context("--width is required")?;
            let height = request.height.context("--height is required")?;
            let format: TextureFormat = request
                .format
                .as_deref()
                .context("--format is required")?
                .parse()?;
            if format.is_palette_indexed() && request.tlut.is_none() {
                log::warn!("{} texture added without a palette", format);
            }
            let data = project.slice(request.offset, format.size_for(width, height)?)?;
            let texture = TextureEntry::new(&name(EntryKind::Texture), width, height, format)?
                .with_data(data)?
                .with_palette(request.tlut.as_deref());
            Entry::texture(texture)
        }
    };
    Ok(entry)
}

fn tidy(project_dir: &Path) -> Result<()> {
    let mut project = Project::open(project_dir)?;
    let merged = project.object_mut().group_unknown_entries();
    project.object_mut().fix_names();
    log::info!("merged {} unknown entries", merged);
    project.save()
}

fn build(project_dir: &Path, output: &Path) -> Result<()> {
    let project = Project::open(project_dir)?;
    let data = project.object().build();
    if data.is_empty() {
        bail!("nothing to build");
    }
    std::fs::write(output, data).with_context(|| format!("write {:?}", output))?;
    Ok(())
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Init { input, project_dir } => Project::init(input, project_dir).map(|_| ()),
        Command::Info { project_dir } => info(&project_dir),
        Command::Add {
            project_dir,
            kind,
            offset,
            size,
            count,
            width,
            height,
            format,
            tlut,
            name,
        } => add(
            &project_dir,
            AddRequest {
                kind,
                offset,
                size,
                count,
                width,
                height,
                format,
                tlut,
                name,
            },
        ),
        Command::Tidy { project_dir } => tidy(&project_dir),
        Command::Build {
            project_dir,
            output,
        } => build(&project_dir, &output),
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
