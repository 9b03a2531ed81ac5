#![forbid(unsafe_code)]

//! `lrboot` lets a parser generator which parses its own input with a parser it generated be
//! rebuilt from source. `start` pulls the last committed version of each generated file out of
//! version control and stages it next to the working copy as `<name>_bootstrap.rs`; the project is
//! then built with its `bootstrap` feature so that those snapshots, rather than the (possibly
//! broken) working copies, are compiled in. `finish` removes the snapshots again.
//!
//! Version control and the compiler are reached through the [Vcs] and [Toolchain] traits, so
//! the staging logic can be driven without either being installed.

use std::{
    error::Error,
    fmt, fs, io,
    path::{Path, PathBuf},
    process::Command,
};

use log::{debug, info, warn};

/// The revision snapshots are taken from if none is specified.
pub const DEFAULT_REVISION: &str = "main";

const BOOTSTRAP_SUFFIX: &str = "_bootstrap";

/// The various different possible bootstrap errors.
#[derive(Debug)]
pub enum BootstrapErrorKind {
    /// These files have no committed version at the requested revision.
    SnapshotMissing(Vec<PathBuf>),
    /// The version control system could not be run or reported an error.
    Vcs(String),
    /// The build could not be run or failed.
    Toolchain(String),
    Io(io::Error),
    /// No ancestor of the starting directory looks like a project root.
    NoProjectRoot(PathBuf),
}

/// Any error from the bootstrap process returns an instance of this struct.
#[derive(Debug)]
pub struct BootstrapError {
    pub kind: BootstrapErrorKind,
}

impl BootstrapError {
    fn new(kind: BootstrapErrorKind) -> Self {
        BootstrapError { kind }
    }
}

impl Error for BootstrapError {}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for BootstrapErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BootstrapErrorKind::SnapshotMissing(paths) => {
                let names = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>();
                write!(f, "No committed version of: {}", names.join(", "))
            }
            BootstrapErrorKind::Vcs(s) => write!(f, "Version control error: {}", s),
            BootstrapErrorKind::Toolchain(s) => write!(f, "Build failed: {}", s),
            BootstrapErrorKind::Io(e) => write!(f, "{}", e),
            BootstrapErrorKind::NoProjectRoot(p) => write!(
                f,
                "Can't find a project root (a directory with .git and Cargo.toml) above {}",
                p.display()
            ),
        }
    }
}

impl From<io::Error> for BootstrapError {
    fn from(err: io::Error) -> Self {
        BootstrapError::new(BootstrapErrorKind::Io(err))
    }
}

/// Read access to committed file contents.
pub trait Vcs {
    /// Return the contents of `path` (relative to the project root) at `revision`, or `None` if
    /// `path` does not exist at that revision.
    fn show(&self, revision: &str, path: &Path) -> Result<Option<Vec<u8>>, BootstrapError>;
}

/// Builds the project once the snapshots are in place.
pub trait Toolchain {
    fn build(&self, root: &Path) -> Result<(), BootstrapError>;
}

/// [Vcs] backed by the `git` command line tool.
pub struct Git {
    root: PathBuf,
}

impl Git {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Git { root: root.into() }
    }
}

impl Vcs for Git {
    fn show(&self, revision: &str, path: &Path) -> Result<Option<Vec<u8>>, BootstrapError> {
        // git always wants '/' separated paths in `<rev>:<path>`.
        let revspec = format!(
            "{}:{}",
            revision,
            path.to_string_lossy().replace('\\', "/")
        );
        debug!("git show {}", revspec);
        let out = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .arg("show")
            .arg(&revspec)
            .output()
            .map_err(|e| {
                BootstrapError::new(BootstrapErrorKind::Vcs(format!("can't run git: {}", e)))
            })?;
        if out.status.success() {
            return Ok(Some(out.stdout));
        }
        let stderr = String::from_utf8_lossy(&out.stderr);
        if stderr.contains("does not exist in") || stderr.contains("exists on disk, but not in") {
            Ok(None)
        } else {
            Err(BootstrapError::new(BootstrapErrorKind::Vcs(
                stderr.trim().to_owned(),
            )))
        }
    }
}

/// [Toolchain] which runs `cargo build` with the `bootstrap` feature enabled.
#[derive(Default)]
pub struct Cargo {
    package: Option<String>,
}

impl Cargo {
    pub fn new() -> Self {
        Cargo::default()
    }

    /// Only build `package` (i.e. pass `-p <package>`).
    pub fn package(mut self, package: &str) -> Self {
        self.package = Some(package.to_owned());
        self
    }

    fn args(&self, root: &Path) -> Vec<String> {
        let mut args = vec![
            "build".to_owned(),
            "--manifest-path".to_owned(),
            root.join("Cargo.toml").to_string_lossy().into_owned(),
            "--features".to_owned(),
            "bootstrap".to_owned(),
        ];
        if let Some(p) = &self.package {
            args.push("-p".to_owned());
            args.push(p.clone());
        }
        args
    }
}

impl Toolchain for Cargo {
    fn build(&self, root: &Path) -> Result<(), BootstrapError> {
        let args = self.args(root);
        info!("cargo {}", args.join(" "));
        let status = Command::new("cargo").args(&args).status().map_err(|e| {
            BootstrapError::new(BootstrapErrorKind::Toolchain(format!(
                "can't run cargo: {}",
                e
            )))
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(BootstrapError::new(BootstrapErrorKind::Toolchain(format!(
                "cargo exited with {}",
                status
            ))))
        }
    }
}

/// What [Bootstrap::finish] did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FinishReport {
    /// Snapshot files which were deleted.
    pub removed: Vec<PathBuf>,
    /// Snapshot files which were expected but did not exist.
    pub missing: Vec<PathBuf>,
}

/// A set of generated files to be staged from a given revision.
pub struct Bootstrap {
    root: PathBuf,
    revision: String,
    files: Vec<PathBuf>,
}

impl Bootstrap {
    /// Create a bootstrap for the project rooted at `root` with no files and the default revision.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Bootstrap {
            root: root.into(),
            revision: DEFAULT_REVISION.to_owned(),
            files: Vec::new(),
        }
    }

    /// Set the revision snapshots are taken from.
    pub fn revision(mut self, revision: &str) -> Self {
        self.revision = revision.to_owned();
        self
    }

    /// Add a generated file to stage. Relative paths are relative to the project root.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        let rel = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
        self.files.push(rel);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Where the snapshot of `path` lives: `a/b/x.rs` becomes `a/b/x_bootstrap.rs`.
    pub fn bootstrap_path(path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut name = format!("{}{}", stem, BOOTSTRAP_SUFFIX);
        if let Some(ext) = path.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }
        path.with_file_name(name)
    }

    /// Stage every file's snapshot and then build the project. If any file has no committed
    /// version, nothing is written and the build is not attempted. If a snapshot can't be
    /// written, those already staged are removed again. Returns the snapshot paths written.
    pub fn start(
        &self,
        vcs: &dyn Vcs,
        toolchain: &dyn Toolchain,
    ) -> Result<Vec<PathBuf>, BootstrapError> {
        let mut snapshots = Vec::with_capacity(self.files.len());
        let mut missing = Vec::new();
        for rel in &self.files {
            match vcs.show(&self.revision, rel)? {
                Some(c) => snapshots.push((self.root.join(Self::bootstrap_path(rel)), c)),
                None => missing.push(rel.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(BootstrapError::new(BootstrapErrorKind::SnapshotMissing(
                missing,
            )));
        }

        let mut written: Vec<PathBuf> = Vec::with_capacity(snapshots.len());
        for (p, c) in snapshots {
            info!("Staging {}", p.display());
            if let Err(e) = fs::write(&p, c) {
                for w in &written {
                    if let Err(re) = fs::remove_file(w) {
                        warn!("Can't remove {}: {}", w.display(), re);
                    }
                }
                return Err(e.into());
            }
            written.push(p);
        }
        toolchain.build(&self.root)?;
        Ok(written)
    }

    /// Delete every staged snapshot. Snapshots which do not exist are reported rather than
    /// treated as errors, so running this twice is harmless.
    pub fn finish(&self) -> Result<FinishReport, BootstrapError> {
        let mut report = FinishReport::default();
        for rel in &self.files {
            let p = self.root.join(Self::bootstrap_path(rel));
            match fs::remove_file(&p) {
                Ok(()) => {
                    info!("Removed {}", p.display());
                    report.removed.push(p);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!("{} does not exist", p.display());
                    report.missing.push(p);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(report)
    }
}

/// Return the nearest ancestor of `start` (including `start` itself) which contains both a `.git`
/// entry and a `Cargo.toml` file.
pub fn find_project_root(start: &Path) -> Result<PathBuf, BootstrapError> {
    start
        .ancestors()
        .find(|d| d.join(".git").exists() && d.join("Cargo.toml").is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            BootstrapError::new(BootstrapErrorKind::NoProjectRoot(start.to_path_buf()))
        })
}
