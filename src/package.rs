//! Torrent creation and seeding through external commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{error, info};

use crate::config::{AnnounceConfig, PackagingConfig};
use crate::contract::Packager;
use crate::error::{AnnounceError, PackagingError};
use crate::paths::sanitize_archive_name;

/// Runs `mktorrent`-style and `transmission-remote`-style commands.
pub struct CommandPackager {
    archive_root: PathBuf,
    packaging: PackagingConfig,
    announce: AnnounceConfig,
}

impl CommandPackager {
    pub fn new(archive_root: PathBuf, packaging: PackagingConfig, announce: AnnounceConfig) -> Self {
        Self {
            archive_root,
            packaging,
            announce,
        }
    }

    /// Full argument vector for building a torrent of `directory` at `output`.
    pub fn package_command(&self, directory: &Path, output: &Path) -> Vec<String> {
        let mut args = self.packaging.command.clone();
        for tracker in &self.packaging.trackers {
            args.push("-a".to_string());
            args.push(tracker.clone());
        }
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args.push("-c".to_string());
        args.push(self.packaging.comment.clone());
        args.push(directory.display().to_string());
        args
    }

    /// Full argument vector for seeding `archive_path` out of `directory`'s parent.
    pub fn announce_command(&self, archive_path: &Path, directory: &Path) -> Vec<String> {
        let watch_dir = directory.parent().unwrap_or(directory);
        let mut args = self.announce.command.clone();
        args.push("-w".to_string());
        args.push(watch_dir.display().to_string());
        args.push("-a".to_string());
        args.push(archive_path.display().to_string());
        args
    }
}

impl Packager for CommandPackager {
    fn package(&self, directory: &Path, archive_name: &str) -> Result<PathBuf, PackagingError> {
        fs::create_dir_all(&self.archive_root).map_err(|source| PackagingError::Io {
            path: self.archive_root.clone(),
            source,
        })?;
        let output = self.archive_root.join(sanitize_archive_name(archive_name));
        let args = self.package_command(directory, &output);
        let (program, rest) = args.split_first().ok_or(PackagingError::EmptyCommand)?;

        let status = Command::new(program)
            .args(rest)
            .status()
            .map_err(|source| {
                error!(error = ?source, program = %program, "Failed to launch torrent command");
                PackagingError::Spawn {
                    program: program.clone(),
                    source,
                }
            })?;

        if !status.success() {
            error!(directory = %directory.display(), %status, "Torrent command exited with non-zero code");
            return Err(PackagingError::ExitStatus(status));
        }
        info!(torrent = %output.display(), "Torrent command succeeded");
        Ok(output)
    }

    fn announce(&self, archive_path: &Path, directory: &Path) -> Result<(), AnnounceError> {
        let args = self.announce_command(archive_path, directory);
        let (program, rest) = args.split_first().ok_or(AnnounceError::EmptyCommand)?;

        let status = Command::new(program)
            .args(rest)
            .status()
            .map_err(|source| AnnounceError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(AnnounceError::ExitStatus(status));
        }
        Ok(())
    }
}
