use std::ffi::CString;
use std::fs::{self, File, FileTimes, Metadata, OpenOptions};
use std::io::{self, BufRead, Write};
use std::os::unix::fs::{MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::Path;

use super::{Builtin, Context};
use crate::error::{ErrorKind, ShellError};

/// Runs `op` on every operand, reporting failures as they happen.
/// Returns 1 if any operand failed.
fn each_operand<F>(args: &[String], ctx: &mut Context<'_>, mut op: F) -> i32
where
    F: FnMut(&str, &mut Context<'_>) -> Result<(), ShellError>,
{
    let mut status = 0;
    for arg in args {
        if let Err(err) = op(arg, ctx) {
            ctx.diag.report(&err);
            status = 1;
        }
    }
    status
}

fn to_c_string(path: &str, context: &str) -> Result<CString, ShellError> {
    CString::new(path).map_err(|_| {
        ShellError::new(
            ErrorKind::InvalidArgument,
            format!("{}: {}: path contains NUL", context, path),
        )
    })
}

/// Writes `question (y/n): ` and reads one answer line. Anything but an
/// answer starting with `y` or `Y`, end of input included, is a no.
fn ask(question: &str, out: &mut dyn Write, input: &mut dyn BufRead) -> io::Result<bool> {
    write!(out, "{} (y/n): ", question)?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim_start().chars().next(), Some('y' | 'Y')))
}

/// Asks on the terminal in interactive sessions; elsewhere the answer is yes.
fn confirm(question: &str, ctx: &mut Context<'_>) -> Result<bool, ShellError> {
    if !ctx.state.interactive {
        return Ok(true);
    }
    let stdin = io::stdin();
    ask(question, &mut *ctx.out, &mut stdin.lock()).map_err(ShellError::from)
}

fn is_write_protected(path: &str) -> bool {
    let Ok(c_path) = CString::new(path) else {
        return false;
    };
    // SAFETY: c_path is NUL-terminated and outlives the call.
    let rc = unsafe { libc::access(c_path.as_ptr(), libc::W_OK) };
    rc != 0 && io::Error::last_os_error().raw_os_error() == Some(libc::EACCES)
}

fn type_char(meta: &Metadata) -> char {
    if meta.is_dir() {
        'd'
    } else {
        '-'
    }
}

fn mode_string(mode: u32) -> String {
    const BITS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    BITS.iter()
        .map(|&(bit, c)| if mode & bit != 0 { c } else { '-' })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LsCommand;

impl Builtin for LsCommand {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        let dir = args.first().map(String::as_str).unwrap_or(".");
        let context = || format!("ls: {}", dir);

        let mut rows = Vec::new();
        let mut status = 0;
        for entry in fs::read_dir(dir).map_err(|e| ShellError::from_io(e, context()))? {
            let entry = entry.map_err(|e| ShellError::from_io(e, context()))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            // follows symlinks; an entry that cannot be stat'ed is skipped
            match fs::metadata(entry.path()) {
                Ok(meta) => rows.push((name, meta)),
                Err(e) => {
                    ctx.diag
                        .report(&ShellError::from_io(e, format!("ls: {}", name)));
                    status = 1;
                }
            }
        }
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, meta) in rows {
            writeln!(
                ctx.out,
                "{}{}  {}{}",
                type_char(&meta),
                mode_string(meta.permissions().mode()),
                name,
                if meta.is_dir() { "/" } else { "" }
            )?;
        }
        Ok(status)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CatCommand;

impl CatCommand {
    fn cat_one(path: &str, ctx: &mut Context<'_>) -> Result<(), ShellError> {
        let meta = fs::metadata(path).map_err(|e| ShellError::from_io(e, format!("cat: {}", path)))?;
        if meta.is_dir() {
            return Err(ShellError::new(
                ErrorKind::InvalidPath,
                format!("cat: {}: is a directory", path),
            ));
        }
        let mut file = File::open(path).map_err(|e| ShellError::from_io(e, format!("cat: {}", path)))?;
        io::copy(&mut file, &mut *ctx.out)
            .map_err(|e| ShellError::from_io(e, format!("cat: {}", path)))?;
        Ok(())
    }
}

impl Builtin for CatCommand {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        let status = each_operand(args, ctx, Self::cat_one);
        ctx.out.flush()?;
        Ok(status)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CpCommand;

impl CpCommand {
    /// Streams `src` into `dst`, then carries over timestamps and mode.
    fn copy_contents(src: &str, dst: &str, meta: &Metadata) -> io::Result<()> {
        let mut reader = File::open(src)?;
        let mut writer = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(dst)?;
        io::copy(&mut reader, &mut writer)?;
        writer.set_times(
            FileTimes::new()
                .set_accessed(meta.accessed()?)
                .set_modified(meta.modified()?),
        )?;
        writer.set_permissions(meta.permissions())
    }
}

impl Builtin for CpCommand {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        let (src, dst) = (args[0].as_str(), args[1].as_str());

        let meta = fs::metadata(src).map_err(|e| ShellError::from_io(e, format!("cp: {}", src)))?;
        if !meta.is_file() {
            return Err(ShellError::new(
                ErrorKind::InvalidArgument,
                format!("cp: '{}' is not a regular file", src),
            ));
        }

        let existed = match fs::metadata(dst) {
            Ok(dst_meta) if dst_meta.is_dir() => {
                return Err(ShellError::new(
                    ErrorKind::InvalidPath,
                    format!("cp: '{}' is a directory", dst),
                ));
            }
            Ok(dst_meta) if dst_meta.dev() == meta.dev() && dst_meta.ino() == meta.ino() => {
                return Err(ShellError::new(
                    ErrorKind::InvalidArgument,
                    format!("cp: '{}' and '{}' are the same file", src, dst),
                ));
            }
            Ok(_) => true,
            Err(_) => false,
        };

        if existed && !confirm(&format!("cp: overwrite '{}'?", dst), ctx)? {
            writeln!(ctx.out, "cp: not overwriting '{}'", dst)?;
            return Ok(0);
        }

        if let Err(e) = Self::copy_contents(src, dst, &meta) {
            // never delete a file that was there before us
            if !existed && Path::new(dst).exists() {
                let _ = fs::remove_file(dst);
            }
            return Err(ShellError::from_io(e, format!("cp: {} -> {}", src, dst)));
        }

        writeln!(ctx.out, "cp: copied '{}' to '{}'", src, dst)?;
        Ok(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RmCommand;

impl RmCommand {
    fn rm_one(path: &str, ctx: &mut Context<'_>) -> Result<(), ShellError> {
        let meta =
            fs::symlink_metadata(path).map_err(|e| ShellError::from_io(e, format!("rm: {}", path)))?;
        if meta.is_dir() {
            return Err(ShellError::new(
                ErrorKind::InvalidPath,
                format!("rm: cannot remove '{}': is a directory", path),
            ));
        }
        if is_write_protected(path)
            && !confirm(&format!("rm: remove write-protected file '{}'?", path), ctx)?
        {
            writeln!(ctx.out, "rm: skipping '{}'", path)?;
            return Ok(());
        }
        fs::remove_file(path).map_err(|e| ShellError::from_io(e, format!("rm: {}", path)))?;
        writeln!(ctx.out, "rm: removed '{}'", path)?;
        Ok(())
    }
}

impl Builtin for RmCommand {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        Ok(each_operand(args, ctx, Self::rm_one))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TouchCommand;

impl TouchCommand {
    fn touch_one(path: &str, _ctx: &mut Context<'_>) -> Result<(), ShellError> {
        let context = || format!("touch: {}", path);
        if Path::new(path).exists() {
            let c_path = to_c_string(path, "touch")?;
            // SAFETY: c_path is NUL-terminated; null times means "now", which
            // only needs write access rather than ownership.
            let rc = unsafe {
                libc::utimensat(libc::AT_FDCWD, c_path.as_ptr(), std::ptr::null(), 0)
            };
            if rc != 0 {
                return Err(ShellError::from_io(io::Error::last_os_error(), context()));
            }
            Ok(())
        } else {
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(0o644)
                .open(path)
                .map(drop)
                .map_err(|e| ShellError::from_io(e, context()))
        }
    }
}

impl Builtin for TouchCommand {
    fn execute(&self, args: &[String], ctx: &mut Context<'_>) -> Result<i32, ShellError> {
        Ok(each_operand(args, ctx, Self::touch_one))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use super::*;
    use std::os::unix::fs::symlink;
    use std::time::{Duration, SystemTime};

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_mode_string() {
        assert_eq!(mode_string(0o755), "rwxr-xr-x");
        assert_eq!(mode_string(0o640), "rw-r-----");
        assert_eq!(mode_string(0), "---------");
    }

    #[test]
    fn test_ls_lists_sorted_visible_entries() -> Result<(), ShellError> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("b.txt"), "b")?;
        fs::write(dir.path().join(".hidden"), "h")?;
        fs::create_dir(dir.path().join("a_dir"))?;
        fs::set_permissions(dir.path().join("b.txt"), fs::Permissions::from_mode(0o644))?;

        let mut h = Harness::new();
        h.run("ls", &[&path_str(dir.path())])?;
        let out = h.output();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('d'));
        assert!(lines[0].ends_with("  a_dir/"));
        assert_eq!(lines[1], "-rw-r--r--  b.txt");
        Ok(())
    }

    #[test]
    fn test_ls_missing_dir() {
        let mut h = Harness::new();
        let err = h.run("ls", &["/no/such/dir"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn test_cat_concatenates() -> Result<(), ShellError> {
        let dir = tempfile::tempdir()?;
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "one\n")?;
        fs::write(&b, "two\n")?;

        let mut h = Harness::new();
        assert_eq!(h.run("cat", &[&path_str(&a), &path_str(&b)])?, 0);
        assert_eq!(h.output(), "one\ntwo\n");
        Ok(())
    }

    #[test]
    fn test_cat_keeps_going_after_failure() -> Result<(), ShellError> {
        let dir = tempfile::tempdir()?;
        let a = dir.path().join("a");
        fs::write(&a, "still here\n")?;

        let mut h = Harness::new();
        let status = h.run("cat", &["/no/such/file", &path_str(dir.path()), &path_str(&a)])?;
        assert_eq!(status, 1);
        assert_eq!(h.output(), "still here\n");
        assert_eq!(h.diag.error_count(), 2);
        Ok(())
    }

    #[test]
    fn test_cp_copies_contents_and_mode() -> Result<(), ShellError> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("src.sh");
        let dst = dir.path().join("dst.sh");
        fs::write(&src, "#!/bin/sh\n")?;
        fs::set_permissions(&src, fs::Permissions::from_mode(0o750))?;

        let mut h = Harness::new();
        assert_eq!(h.run("cp", &[&path_str(&src), &path_str(&dst)])?, 0);
        assert_eq!(fs::read_to_string(&dst)?, "#!/bin/sh\n");
        assert_eq!(fs::metadata(&dst)?.permissions().mode() & 0o777, 0o750);
        assert_eq!(fs::metadata(&dst)?.modified()?, fs::metadata(&src)?.modified()?);
        assert!(h.output().starts_with("cp: copied '"));
        Ok(())
    }

    #[test]
    fn test_cp_refusals() -> Result<(), ShellError> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("src");
        fs::write(&src, "data")?;

        let mut h = Harness::new();
        let into_dir = h.run("cp", &[&path_str(&src), &path_str(dir.path())]).unwrap_err();
        assert_eq!(into_dir.kind(), ErrorKind::InvalidPath);

        let same = h.run("cp", &[&path_str(&src), &path_str(&src)]).unwrap_err();
        assert_eq!(same.kind(), ErrorKind::InvalidArgument);

        let from_dir = h.run("cp", &[&path_str(dir.path()), "/tmp/x"]).unwrap_err();
        assert_eq!(from_dir.kind(), ErrorKind::InvalidArgument);

        let missing = h.run("cp", &["/no/such/src", "/tmp/x"]).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::FileNotFound);
        assert_eq!(fs::read_to_string(&src)?, "data");
        Ok(())
    }

    #[test]
    fn test_ls_skips_entries_it_cannot_stat() -> Result<(), ShellError> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("kept"), "k")?;
        symlink(dir.path().join("missing-target"), dir.path().join("broken"))?;

        let mut h = Harness::new();
        assert_eq!(h.run("ls", &[&path_str(dir.path())])?, 1);
        let out = h.output();
        assert_eq!(out.lines().count(), 1);
        assert!(out.ends_with("  kept\n"));
        assert_eq!(h.diag.error_count(), 1);
        assert_eq!(h.diag.last_error(), Some(ErrorKind::FileNotFound));
        Ok(())
    }

    #[test]
    fn test_ask_reads_one_answer() -> Result<(), ShellError> {
        let cases = [("y\n", true), ("Yes\n", true), ("n\n", false), ("\n", false), ("", false)];
        for (answer, expected) in cases {
            let mut out = Vec::new();
            let mut input = io::Cursor::new(answer);
            assert_eq!(ask("cp: overwrite 'x'?", &mut out, &mut input)?, expected);
            assert_eq!(String::from_utf8_lossy(&out), "cp: overwrite 'x'? (y/n): ");
        }
        Ok(())
    }

    #[test]
    fn test_cp_overwrites_without_asking_when_not_interactive() -> Result<(), ShellError> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        fs::write(&src, "new")?;
        fs::write(&dst, "precious")?;

        let mut h = Harness::new();
        assert!(!h.state.interactive);
        assert_eq!(h.run("cp", &[&path_str(&src), &path_str(&dst)])?, 0);
        assert_eq!(fs::read_to_string(&dst)?, "new");
        assert!(!h.output().contains("(y/n)"));
        Ok(())
    }

    #[test]
    fn test_rm_write_protected_without_asking_when_not_interactive() -> Result<(), ShellError> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("readonly");
        fs::write(&file, "x")?;
        fs::set_permissions(&file, fs::Permissions::from_mode(0o444))?;

        let mut h = Harness::new();
        assert_eq!(h.run("rm", &[&path_str(&file)])?, 0);
        assert!(!file.exists());
        assert!(!h.output().contains("(y/n)"));
        Ok(())
    }

    #[test]
    fn test_touch_write_only_file() -> Result<(), ShellError> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("write-only");
        fs::write(&file, "data")?;
        let past = SystemTime::now() - Duration::from_secs(3600);
        File::options().write(true).open(&file)?.set_modified(past)?;
        fs::set_permissions(&file, fs::Permissions::from_mode(0o200))?;

        let mut h = Harness::new();
        assert_eq!(h.run("touch", &[&path_str(&file)])?, 0);
        assert_eq!(h.diag.error_count(), 0);
        assert!(fs::metadata(&file)?.modified()? > past + Duration::from_secs(60));
        Ok(())
    }

    #[test]
    fn test_rm() -> Result<(), ShellError> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("victim");
        fs::write(&file, "x")?;

        let mut h = Harness::new();
        assert_eq!(h.run("rm", &[&path_str(&file)])?, 0);
        assert!(!file.exists());
        assert_eq!(h.output(), format!("rm: removed '{}'\n", path_str(&file)));

        assert_eq!(h.run("rm", &[&path_str(dir.path())])?, 1);
        assert!(dir.path().exists());
        assert_eq!(h.diag.last_error(), Some(ErrorKind::InvalidPath));
        Ok(())
    }

    #[test]
    fn test_touch_creates_and_updates() -> Result<(), ShellError> {
        let dir = tempfile::tempdir()?;
        let fresh = dir.path().join("fresh");
        let old = dir.path().join("old");
        fs::write(&old, "keep")?;
        let past = SystemTime::now() - Duration::from_secs(3600);
        File::options()
            .write(true)
            .open(&old)?
            .set_modified(past)?;

        let mut h = Harness::new();
        assert_eq!(h.run("touch", &[&path_str(&fresh), &path_str(&old)])?, 0);

        let meta = fs::metadata(&fresh)?;
        assert_eq!(meta.len(), 0);
        let mode = meta.permissions().mode();
        assert_ne!(mode & 0o400, 0);
        assert_eq!(mode & 0o133, 0);
        assert_eq!(fs::read_to_string(&old)?, "keep");
        assert!(fs::metadata(&old)?.modified()? > past + Duration::from_secs(60));
        Ok(())
    }
}
