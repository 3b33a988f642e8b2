//! Finding images to label and picking a reproducible subsample.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::DatasetConfig;

/// Discovers image files in directories.
pub struct FileDiscovery {
    config: DatasetConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    /// Discover all supported image files at a path.
    ///
    /// If path is a file, returns it if supported.
    /// If path is a directory, recursively finds all supported files.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        if path.is_file() {
            if self.is_supported(path) {
                if let Ok(meta) = std::fs::metadata(path) {
                    return vec![DiscoveredFile {
                        path: path.to_path_buf(),
                        size: meta.len(),
                    }];
                }
            }
            return vec![];
        }

        let mut files: Vec<DiscoveredFile> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file() && self.is_supported(entry.path()))
            .filter_map(|entry| {
                let size = entry.metadata().ok()?.len();
                Some(DiscoveredFile {
                    path: entry.into_path(),
                    size,
                })
            })
            .collect();

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Discover files, then apply the configured subsample.
    pub fn discover_sampled(&self, path: &Path) -> Vec<DiscoveredFile> {
        let files = self.discover(path);
        match self.config.subsample {
            Some(n) => subsample(files, n, self.config.seed),
            None => files,
        }
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

/// Pick `n` files at random with a fixed seed, keeping path order.
///
/// Returns all files unchanged when `n` is not smaller than the total.
pub fn subsample(mut files: Vec<DiscoveredFile>, n: usize, seed: u64) -> Vec<DiscoveredFile> {
    if n >= files.len() {
        return files;
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    files.shuffle(&mut rng);
    files.truncate(n);
    files.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!("Subsampled {} images (seed {})", n, seed);
    files
}
