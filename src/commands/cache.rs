//! # Cache Command Implementation
//!
//! This module implements the `cache` subcommand, which provides
//! functionality for managing the external repository cache.
//!
//! ## Subcommands
//!
//! - **`list`**: Display all cached repositories with their information
//! - **`clean`**: Remove cached repository entries

use anyhow::Result;
use clap::{Args, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::vendor::default_cache_root;

/// Manage the external repository cache
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// The root directory for the external repository cache.
    ///
    /// If not provided, it defaults to the system's cache directory
    /// (e.g., `~/.cache/repo-vendor` on Linux).
    /// Can also be set with the `REPO_VENDOR_CACHE` environment variable.
    #[arg(long, value_name = "DIR", env = "REPO_VENDOR_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List all cached repositories
    List,
    /// Clean cached repository entries
    Clean(CleanArgs),
}

/// Arguments for the cache clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Show what would be deleted without actually deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt and delete immediately
    #[arg(long)]
    pub yes: bool,
}

/// A cached repository entry as found on disk
#[derive(Debug, Clone)]
struct CacheEntry {
    name: String,
    size: u64,
    symlinked: bool,
    dir_path: PathBuf,
}

/// Execute the `cache` command.
pub fn execute(args: CacheArgs) -> Result<()> {
    let cache_root = args.cache_root.unwrap_or_else(default_cache_root);
    match args.command {
        CacheSubcommand::List => execute_list(&cache_root),
        CacheSubcommand::Clean(clean_args) => execute_clean(&cache_root, clean_args),
    }
}

/// Execute the `cache list` command.
fn execute_list(cache_root: &Path) -> Result<()> {
    if !cache_root.exists() {
        println!("Cache directory does not exist: {}", cache_root.display());
        println!("No cached repositories found.");
        return Ok(());
    }

    let entries = scan_cache_directory(cache_root)?;
    if entries.is_empty() {
        println!("No cached repositories found in: {}", cache_root.display());
        return Ok(());
    }

    println!("Cached repositories in {}:\n", cache_root.display());
    for entry in &entries {
        let marker = if entry.symlinked { " -> vendored" } else { "" };
        println!(
            "  {:<32} {}{}",
            entry.name,
            format_size(entry.size),
            marker
        );
    }
    let total: u64 = entries.iter().map(|e| e.size).sum();
    println!("\nTotal: {} entries ({})", entries.len(), format_size(total));
    Ok(())
}

/// Execute the `cache clean` command.
fn execute_clean(cache_root: &Path, args: CleanArgs) -> Result<()> {
    if !cache_root.exists() {
        println!("Cache directory does not exist: {}", cache_root.display());
        println!("No cached repositories to clean.");
        return Ok(());
    }

    let entries = scan_cache_directory(cache_root)?;
    if entries.is_empty() {
        println!("No cached repositories found in: {}", cache_root.display());
        return Ok(());
    }

    if args.dry_run {
        println!("Cache entries that would be deleted:\n");
        for entry in &entries {
            println!("  {}", entry.dir_path.display());
        }
        println!("\nDry run mode - no changes were made.");
        return Ok(());
    }

    if !args.yes {
        print!(
            "Delete {} cache entries from {}? (y/N): ",
            entries.len(),
            cache_root.display()
        );
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();
        if input != "y" && input != "yes" {
            println!("Clean cancelled.");
            return Ok(());
        }
    }

    let mut deleted_count = 0;
    let mut failed_count = 0;
    for entry in &entries {
        let result = if entry.symlinked {
            // Symlinked entries point into the vendor directory; only the
            // link itself is removed.
            remove_symlink(&entry.dir_path)
        } else {
            fs::remove_dir_all(&entry.dir_path)
        };
        match result {
            Ok(_) => deleted_count += 1,
            Err(e) => {
                failed_count += 1;
                eprintln!("Failed to delete {}: {}", entry.dir_path.display(), e);
            }
        }
    }

    if deleted_count > 0 {
        println!("Deleted {} cache entries.", deleted_count);
    }
    if failed_count > 0 {
        eprintln!("Failed to delete {} cache entries.", failed_count);
    }
    Ok(())
}

#[cfg(unix)]
fn remove_symlink(path: &Path) -> std::io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_symlink(path: &Path) -> std::io::Result<()> {
    fs::remove_dir(path)
}

/// Scan the cache root for repository entries (one directory per repository).
fn scan_cache_directory(cache_root: &Path) -> Result<Vec<CacheEntry>> {
    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(cache_root)? {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        let metadata = fs::symlink_metadata(&path)?;
        let symlinked = metadata.file_type().is_symlink();
        if !symlinked && !metadata.is_dir() {
            continue;
        }
        let name = dir_entry.file_name().to_string_lossy().to_string();
        let size = if symlinked { 0 } else { directory_size(&path) };
        entries.push(CacheEntry {
            name,
            size,
            symlinked,
            dir_path: path,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Total size in bytes of all regular files under `path`.
fn directory_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}

/// Format a byte count for display.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    match bytes {
        b if b >= GB => format!("{:.1} GiB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1} MiB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KiB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}
