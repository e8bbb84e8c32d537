//! On-disk layout of a generated dataset.
//!
//! ```text
//! <out>/columns.json
//! <out>/m1/{raw_latents.npy, latents.npy, latents.provenance.json[, latents.<table>]}
//! <out>/m2/...
//! ```
//! Single-view runs write the view files directly under `<out>/`.
//!
//! The tree is built in a hidden sibling of `<out>` and moved into place only
//! once every file is written; a failed run leaves `<out>` untouched.

use crate::args::TableFormat;
use crate::provenance::{write_sidecar, Payload};
use crate::{npy, table};
use anyhow::{Context, Result};
use scene_latents::layout::{GeneratedLatents, LatentsCfg};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};

pub const RAW_FILE: &str = "raw_latents.npy";
pub const LATENTS_FILE: &str = "latents.npy";
pub const COLUMNS_FILE: &str = "columns.json";

/// Folder of view `index` (0-based) under `root`.
pub fn view_dir(root: &Path, index: usize, single_view: bool) -> PathBuf {
    if single_view {
        root.to_path_buf()
    } else {
        root.join(format!("m{}", index + 1))
    }
}

/// Write every view of `generated` under `root`; returns the written paths.
pub fn write_all(
    root: &Path,
    generated: &GeneratedLatents,
    cfg: &LatentsCfg,
    format: TableFormat,
) -> Result<Vec<PathBuf>> {
    let stage = staging_dir(root)?;
    let staged = write_tree(stage.path(), root, generated, cfg, format)?;
    publish(&stage, root)?;
    Ok(staged
        .iter()
        .map(|p| root.join(p.strip_prefix(stage.path()).unwrap_or(p)))
        .collect())
}

fn staging_dir(root: &Path) -> Result<TempDir> {
    let parent = match root.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    Builder::new()
        .prefix(".scene-latents-")
        .tempdir_in(parent)
        .with_context(|| format!("creating staging dir in {}", parent.display()))
}

fn write_tree(
    stage: &Path,
    root: &Path,
    generated: &GeneratedLatents,
    cfg: &LatentsCfg,
    format: TableFormat,
) -> Result<Vec<PathBuf>> {
    let names = generated.layout.names();
    let columns_path = stage.join(COLUMNS_FILE);
    fs::write(&columns_path, serde_json::to_vec_pretty(&names)?)
        .with_context(|| format!("writing {}", columns_path.display()))?;
    let mut written = vec![columns_path];

    let params = serde_json::to_value(cfg)?;
    for (i, view) in generated.views.iter().enumerate() {
        let dir = view_dir(stage, i, cfg.single_view);
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let raw_path = dir.join(RAW_FILE);
        npy::save(&raw_path, &view.raw)?;
        let latents_path = dir.join(LATENTS_FILE);
        npy::save(&latents_path, &view.latents)?;

        let mut siblings = vec![raw_path.clone()];
        if let Some(p) = table::write(format, &latents_path, &names, &view.latents)
            .with_context(|| format!("writing table for view {}", i + 1))?
        {
            siblings.push(p);
        }
        let sidecar = write_sidecar(
            &latents_path,
            Payload::new(params.clone())
                .with_siblings(siblings.clone())
                .published_at(stage, root),
        )?;
        tracing::info!(
            view = i + 1,
            rows = view.latents.nrows(),
            cols = view.latents.ncols(),
            dir = %view_dir(root, i, cfg.single_view).display(),
            "view written"
        );
        written.push(latents_path);
        written.extend(siblings);
        written.push(sidecar);
    }
    Ok(written)
}

/// Move the staged tree to `root`, replacing same-named entries.
fn publish(stage: &TempDir, root: &Path) -> Result<()> {
    if !root.exists() {
        return fs::rename(stage.path(), root)
            .with_context(|| format!("moving dataset into {}", root.display()));
    }
    for entry in fs::read_dir(stage.path())? {
        let entry = entry?;
        let target = root.join(entry.file_name());
        let cleared = if target.is_dir() {
            fs::remove_dir_all(&target)
        } else if target.exists() {
            fs::remove_file(&target)
        } else {
            Ok(())
        };
        cleared.with_context(|| format!("replacing {}", target.display()))?;
        fs::rename(entry.path(), &target)
            .with_context(|| format!("moving {}", target.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use scene_latents::layout::{generate, FamilyFlags, Partition};
    use tempfile::tempdir;

    fn small_cfg() -> LatentsCfg {
        LatentsCfg {
            n_pairs: 4,
            hue: FamilyFlags::active_as(Partition::Content),
            ..LatentsCfg::default()
        }
    }

    #[test]
    fn paired_run_writes_m1_and_m2() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let cfg = small_cfg();
        let generated = generate(&cfg).unwrap();
        let written = write_all(&out, &generated, &cfg, TableFormat::Csv).unwrap();
        assert!(written.iter().all(|p| p.starts_with(&out) && p.exists()));
        for view in ["m1", "m2"] {
            for file in [RAW_FILE, LATENTS_FILE, "latents.csv", "latents.provenance.json"] {
                assert!(out.join(view).join(file).exists(), "{view}/{file}");
            }
        }
        let names: Vec<String> =
            serde_json::from_slice(&fs::read(out.join(COLUMNS_FILE)).unwrap()).unwrap();
        assert_eq!(names, generated.layout.names());
        let sidecar: serde_json::Value = serde_json::from_slice(
            &fs::read(out.join("m1").join("latents.provenance.json")).unwrap(),
        )
        .unwrap();
        let recorded = out.join("m1").join(LATENTS_FILE);
        assert_eq!(sidecar["outputs"][0], recorded.to_string_lossy().as_ref());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        let bytes = fs::read(out.join("m2").join(LATENTS_FILE)).unwrap();
        let header = npy::header(4, 10).unwrap();
        assert_eq!(bytes.len(), header.len() + 4 * 10 * 8);
        assert_eq!(&bytes[..header.len()], header.as_slice());
    }

    #[test]
    fn single_view_writes_at_root() {
        let dir = tempdir().unwrap();
        let cfg = LatentsCfg {
            single_view: true,
            ..small_cfg()
        };
        let generated = generate(&cfg).unwrap();
        write_all(dir.path(), &generated, &cfg, TableFormat::None).unwrap();
        assert!(dir.path().join(RAW_FILE).exists());
        assert!(dir.path().join(LATENTS_FILE).exists());
        assert!(!dir.path().join("m1").exists());
        assert!(!dir.path().join("latents.csv").exists());
    }

    #[test]
    fn failed_view_leaves_no_dataset_behind() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let cfg = small_cfg();
        let mut generated = generate(&cfg).unwrap();
        generated.views[1].latents = DMatrix::zeros(4, 3);
        assert!(write_all(&out, &generated, &cfg, TableFormat::Csv).is_err());
        assert!(!out.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn rerun_replaces_previous_views() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("m1")).unwrap();
        fs::write(out.join("m1").join("stale.npy"), b"old").unwrap();
        fs::write(out.join("notes.txt"), b"keep").unwrap();
        let cfg = small_cfg();
        let generated = generate(&cfg).unwrap();
        write_all(&out, &generated, &cfg, TableFormat::None).unwrap();
        assert!(!out.join("m1").join("stale.npy").exists());
        assert!(out.join("m1").join(LATENTS_FILE).exists());
        assert!(out.join("notes.txt").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
