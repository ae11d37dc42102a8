//! Check command implementation.
//!
//! Reports which process sources are usable on this host, whether the
//! process table is fully visible, and whether the configuration is valid.

use anyhow::Result;
use nix::unistd::{access, geteuid, AccessFlags};
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;

use memon::process::{collect_proc_entries, PsSource, ProcessSource, SourceKind};

use crate::config::{validate_effective_config, Config};

/// Outcome of probing one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Usable(usize),
    Unusable(String),
}

impl Probe {
    fn is_usable(&self) -> bool {
        matches!(self, Probe::Usable(_))
    }
}

/// Checks that `root` is a readable proc filesystem with process entries.
pub fn probe_procfs(root: &Path) -> Probe {
    if let Err(e) = access(root, AccessFlags::R_OK | AccessFlags::X_OK) {
        return Probe::Unusable(format!("{} not accessible: {}", root.display(), e));
    }
    match collect_proc_entries(root, Some(5)) {
        Ok(entries) if entries.is_empty() => {
            Probe::Unusable(format!("no process entries under {}", root.display()))
        }
        Ok(entries) => Probe::Usable(entries.len()),
        Err(e) => Probe::Unusable(format!("cannot list {}: {}", root.display(), e)),
    }
}

/// Checks that `ps` runs and yields parsable rows.
pub fn probe_ps(source: &PsSource) -> Probe {
    match source.snapshot() {
        Ok(records) if records.is_empty() => Probe::Unusable("ps returned no rows".into()),
        Ok(records) => Probe::Usable(records.len()),
        Err(e) => Probe::Unusable(e.to_string()),
    }
}

/// Validates process sources, privileges and configuration.
pub fn command_check(config: &Config) -> Result<ExitCode> {
    println!("🔍 memon - System Check");
    println!("=======================");

    let mut all_ok = true;
    let settings = config.source_settings();

    println!("\n📁 Checking proc filesystem...");
    let procfs = probe_procfs(&settings.proc_root);
    match &procfs {
        Probe::Usable(n) => println!(
            "   ✅ {} readable ({} process entries sampled)",
            settings.proc_root.display(),
            n
        ),
        Probe::Unusable(reason) => println!("   ⚠️  procfs unavailable: {}", reason),
    }

    println!("\n🧰 Checking ps...");
    let ps = probe_ps(&PsSource::default());
    match &ps {
        Probe::Usable(n) => println!("   ✅ ps runnable ({} processes listed)", n),
        Probe::Unusable(reason) => println!("   ⚠️  ps unavailable: {}", reason),
    }

    println!("\n🔌 Checking configured source...");
    let kind = config.source_kind();
    let resolved = kind.resolve(&settings.proc_root);
    debug!("Source {:?} resolves to {:?}", kind, resolved);
    let usable = match resolved {
        SourceKind::Procfs | SourceKind::Auto => procfs.is_usable(),
        SourceKind::Ps => ps.is_usable(),
        SourceKind::Snapshot => match &settings.snapshot_file {
            Some(path) if path.exists() => true,
            Some(path) => {
                println!("   ❌ Snapshot file not found: {}", path.display());
                false
            }
            None => false,
        },
    };
    if usable {
        println!("   ✅ Using {:?} source", resolved);
    } else {
        println!("   ❌ Configured source {:?} is not usable", resolved);
        all_ok = false;
    }

    println!("\n👤 Checking privileges...");
    if geteuid().is_root() {
        println!("   ✅ Running as root (uid=0)");
    } else {
        println!("   ⚠️  Not running as root - processes of other users may be incomplete");
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - ready to analyze");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_probe_procfs_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!probe_procfs(&tmp.path().join("missing")).is_usable());
    }

    #[test]
    fn test_probe_procfs_empty_root() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!probe_procfs(tmp.path()).is_usable());
    }

    #[test]
    fn test_probe_procfs_fake_root() {
        let tmp = tempfile::tempdir().unwrap();
        for pid in [1, 2] {
            let dir = tmp.path().join(pid.to_string());
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("stat"), format!("{pid} (x) S 0")).unwrap();
        }
        assert_eq!(probe_procfs(tmp.path()), Probe::Usable(2));
    }

    #[test]
    fn test_probe_ps_missing_program() {
        let source = PsSource {
            program: "memon-definitely-not-a-real-binary".to_string(),
            ..PsSource::default()
        };
        assert!(!probe_ps(&source).is_usable());
    }
}
