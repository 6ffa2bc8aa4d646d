//! 可写目录的权限修复

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

/// 相对于应用根目录的可写目录
pub const WRITABLE_DIRS: &[&str] = &[
    "storage",
    "storage/logs",
    "storage/app",
    "storage/framework",
    "bootstrap/cache",
];

/// 递归处理的起点，覆盖上面所有目录
const WALK_ROOTS: &[&str] = &["storage", "bootstrap/cache"];

pub const DIR_MODE: u32 = 0o775;
pub const FILE_MODE: u32 = 0o664;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PermissionReport {
    pub dry_run: bool,
    pub created: Vec<PathBuf>,
    pub directories: usize,
    pub files: usize,
}

impl fmt::Display for PermissionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "Would create" } else { "Created" };
        for path in &self.created {
            writeln!(f, "{verb} {}", path.display())?;
        }
        let verb = if self.dry_run { "Would update" } else { "Updated" };
        writeln!(
            f,
            "{verb} {} directories ({:o}) and {} files ({:o})",
            self.directories, DIR_MODE, self.files, FILE_MODE
        )
    }
}

/// 创建缺失的目录并递归设置权限；dry run 只统计不修改
pub fn repair(root: &Path, dry_run: bool) -> io::Result<PermissionReport> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        ));
    }

    let mut report = PermissionReport {
        dry_run,
        ..Default::default()
    };

    for relative in WRITABLE_DIRS {
        let dir = root.join(relative);
        if !dir.exists() {
            if !dry_run {
                fs::create_dir_all(&dir)?;
            }
            tracing::info!(path = %dir.display(), dry_run, "creating directory");
            report.created.push(dir);
        }
    }

    for relative in WALK_ROOTS {
        let dir = root.join(relative);
        if dir.is_dir() {
            walk(&dir, dry_run, &mut report)?;
        }
    }
    if dry_run {
        // 尚未创建的目录按创建后计
        report.directories += report.created.len();
    }

    Ok(report)
}

fn walk(dir: &Path, dry_run: bool, report: &mut PermissionReport) -> io::Result<()> {
    if !dry_run {
        set_mode(dir, DIR_MODE)?;
    }
    report.directories += 1;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            continue;
        }
        if file_type.is_dir() {
            walk(&entry.path(), dry_run, report)?;
        } else {
            if !dry_run {
                set_mode(&entry.path(), FILE_MODE)?;
            }
            report.files += 1;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
