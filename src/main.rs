//! Browse a directory tree through the item-identifier namespace.
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use fs_namespace::NamespaceError;
use fs_namespace::fs::HostFs;
use fs_namespace::idl::{ItemId, ItemIdList, ItemKind};
use fs_namespace::namespace::{
    Capabilities, ContentMask, DisplayFlags, FolderServices, FsFolder, PersistFolder as _,
    SortColumn, attributes_text, open_folder, parse_absolute, resolve_item,
};
use fs_namespace::overrides::IniOverrides;
use fs_namespace::registry::{KEY_CLSID, KEY_DROP_HANDLER, KEY_ICON_HANDLER};
use tracing::{debug, error, warn};

mod app_config;
mod trc;

use crate::app_config::Config;
use crate::trc::Trc;

#[derive(Parser)]
#[command(
    version,
    about = "Projects a directory tree into a namespace of opaque item identifiers."
)]
struct Args {
    #[arg(short, long, value_parser, help = "Optional path to a config TOML.")]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Comment,
    Type,
    Size,
    Modified,
    Attributes,
}

impl From<SortArg> for SortColumn {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => Self::Name,
            SortArg::Comment => Self::Comment,
            SortArg::Type => Self::Type,
            SortArg::Size => Self::Size,
            SortArg::Modified => Self::Modified,
            SortArg::Attributes => Self::Attributes,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Parse a path into identifiers and print each segment.
    Parse { path: PathBuf },

    /// List the children of a directory in sorted order.
    List {
        dir: PathBuf,

        #[arg(long, help = "Include folders. Implied when neither --folders nor --files is set.")]
        folders: bool,

        #[arg(long, help = "Include non-folders.")]
        files: bool,

        #[arg(long, help = "Include hidden entries.")]
        hidden: bool,

        #[arg(long, value_enum, default_value = "name", help = "Column to sort by.")]
        sort: SortArg,

        #[arg(long, help = "Reverse the sort order.")]
        reverse: bool,
    },

    /// Print the display name of an item.
    Name {
        path: PathBuf,

        #[arg(long, help = "Print the parsing name.")]
        parsing: bool,

        #[arg(long, help = "Print the name relative to its folder.")]
        in_folder: bool,
    },

    /// Print the capabilities of an item.
    Attrs { path: PathBuf },

    /// Rename an item.
    Rename {
        path: PathBuf,
        new_name: String,

        #[arg(long, help = "Treat NEW_NAME as a full parsing path.")]
        parsing: bool,
    },
}

fn absolute(path: &Path) -> Result<PathBuf, NamespaceError> {
    std::path::absolute(path).map_err(|e| NamespaceError::OperationFailed {
        context: format!("resolving {}", path.display()),
        source: Some(e),
    })
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn kind_label(id: &ItemId) -> &'static str {
    match id.kind() {
        ItemKind::Folder => "folder",
        ItemKind::File => "file",
        ItemKind::Drive => "drive",
        ItemKind::Foreign(_) => "foreign",
    }
}

fn parse(services: &FolderServices, path: &Path) -> Result<(), NamespaceError> {
    let ids = parse_absolute(services, path)?;
    for id in &ids {
        println!("{:<8} {}", kind_label(id), id.name().unwrap_or("?"));
    }
    println!("wire: {}", hex(&ids.to_bytes()));

    let (parent, leaf) = services.binder.bind_parent(services, &ids)?;
    let caps = parent.attributes_of(std::slice::from_ref(&leaf), Capabilities::empty())?;
    println!("capabilities: {caps:?}");
    Ok(())
}

fn list(
    services: &FolderServices,
    dir: &Path,
    mask: ContentMask,
    column: SortColumn,
    reverse: bool,
) -> Result<(), NamespaceError> {
    let folder = open_folder(services, dir)?;
    let mut rows: Vec<ItemIdList> = folder
        .enumerate(mask)?
        .map(ItemIdList::from_id)
        .collect();

    rows.sort_by(|a, b| {
        folder
            .compare(column.index(), a, b)
            .unwrap_or_else(|e| {
                warn!(error = %e, "cannot compare entries, keeping scan order");
                Ordering::Equal
            })
    });
    if reverse {
        rows.reverse();
    }
    debug!(count = rows.len(), %column, "sorted listing");

    for row in &rows {
        let Some(entry) = row.first().and_then(ItemId::fs_entry) else {
            continue;
        };
        let name = folder.display_name(row, DisplayFlags::IN_FOLDER)?;
        let size = if entry.is_folder {
            String::new()
        } else {
            entry.size.to_string()
        };
        println!(
            "{:<4} {:>12} {:<16} {}",
            attributes_text(entry.attributes),
            size,
            entry.modified.to_string(),
            name
        );
    }
    Ok(())
}

fn name(
    services: &FolderServices,
    path: &Path,
    flags: DisplayFlags,
) -> Result<(), NamespaceError> {
    let (parent, id) = resolve_item(services, path)?;
    println!("{}", parent.display_name(&ItemIdList::from_id(id), flags)?);
    Ok(())
}

fn attrs(services: &FolderServices, path: &Path) -> Result<(), NamespaceError> {
    let (parent, id) = resolve_item(services, path)?;
    let caps = parent.attributes_of(std::slice::from_ref(&id), Capabilities::empty())?;
    println!("{caps:?}");

    if id.is_filesystem() {
        let mut folder = FsFolder::new(services.clone());
        folder.initialize(parent.current_folder())?;
        for key in [KEY_CLSID, KEY_DROP_HANDLER, KEY_ICON_HANDLER] {
            if let Some(class) = folder.handler_for(&id, key)? {
                println!("{key}: {class}");
            }
        }
        if let Some(icon) = folder.icon_override(&id) {
            println!("icon: {},{}", icon.file, icon.index);
        }
    }
    Ok(())
}

fn rename(
    services: &FolderServices,
    path: &Path,
    new_name: &str,
    flags: DisplayFlags,
) -> Result<(), NamespaceError> {
    let (parent, id) = resolve_item(services, path)?;
    let renamed = parent.rename(&id, new_name, flags)?;
    println!(
        "{}",
        parent.display_name(&ItemIdList::from_id(renamed), DisplayFlags::FOR_PARSING)?
    );
    Ok(())
}

fn run(command: Command, services: &FolderServices) -> Result<(), NamespaceError> {
    match command {
        Command::Parse { path } => parse(services, &absolute(&path)?),
        Command::List {
            dir,
            folders,
            files,
            hidden,
            sort,
            reverse,
        } => {
            let mut mask = ContentMask::empty();
            if folders || !files {
                mask |= ContentMask::FOLDERS;
            }
            if files || !folders {
                mask |= ContentMask::NON_FOLDERS;
            }
            if hidden {
                mask |= ContentMask::INCLUDE_HIDDEN;
            }
            list(services, &absolute(&dir)?, mask, sort.into(), reverse)
        }
        Command::Name {
            path,
            parsing,
            in_folder,
        } => {
            let mut flags = DisplayFlags::NORMAL;
            flags.set(DisplayFlags::FOR_PARSING, parsing);
            flags.set(DisplayFlags::IN_FOLDER, in_folder);
            name(services, &absolute(&path)?, flags)
        }
        Command::Attrs { path } => attrs(services, &absolute(&path)?),
        Command::Rename {
            path,
            new_name,
            parsing,
        } => {
            let flags = if parsing {
                DisplayFlags::FOR_PARSING
            } else {
                DisplayFlags::IN_FOLDER
            };
            rename(services, &absolute(&path)?, &new_name, flags)
        }
    }
}

/// Main entry point for the application.
fn main() {
    let args = Args::parse();

    // Errors use eprintln since tracing isn't initialized yet.
    let config = Config::load_or_default(args.config_path.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}");
        std::process::exit(1);
    });

    Trc::default().init().unwrap_or_else(|e| {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    });

    let services = FolderServices::new(Arc::new(HostFs::new()), Arc::new(config.registry))
        .with_overrides(Arc::new(IniOverrides::new(config.override_file)));

    if let Err(e) = run(args.command, &services) {
        error!("{e}");
        std::process::exit(1);
    }
}
