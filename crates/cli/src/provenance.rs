use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Metadata used to generate a provenance sidecar.
pub struct Payload {
    /// Resolved generation config.
    pub params: Value,
    /// Files produced alongside the artifact (same run, same view).
    pub siblings: Vec<PathBuf>,
    /// `(staging, published)` roots: outputs are recorded under `published`.
    pub rebase: Option<(PathBuf, PathBuf)>,
}

impl Payload {
    pub fn new(params: Value) -> Self {
        Self {
            params,
            siblings: Vec::new(),
            rebase: None,
        }
    }

    pub fn with_siblings(mut self, siblings: Vec<PathBuf>) -> Self {
        self.siblings = siblings;
        self
    }

    /// Record outputs written under `staging` at their place under `published`.
    pub fn published_at(mut self, staging: &Path, published: &Path) -> Self {
        self.rebase = Some((staging.to_path_buf(), published.to_path_buf()));
        self
    }

    fn recorded(&self, path: &Path) -> String {
        let path = match &self.rebase {
            Some((from, to)) => match path.strip_prefix(from) {
                Ok(rel) => to.join(rel),
                Err(_) => path.to_path_buf(),
            },
            None => path.to_path_buf(),
        };
        path.to_string_lossy().into_owned()
    }
}

/// Write `<artifact>.provenance.json` containing the git commit, engine version,
/// callsite, params, and outputs.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let provenance_path = provenance_path(artifact);
    if let Some(parent) = provenance_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let mut outputs = vec![payload.recorded(artifact)];
    outputs.extend(payload.siblings.iter().map(|p| payload.recorded(p)));
    let doc = json!({
        "code_rev": current_git_rev(),
        "engine_version": scene_latents::VERSION,
        "callsite": {
            "file": callsite.file(),
            "line": callsite.line()
        },
        "params": payload.params,
        "outputs": outputs
    });
    fs::write(&provenance_path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", provenance_path.display()))?;
    Ok(provenance_path)
}

fn provenance_path(artifact: &Path) -> PathBuf {
    let stem = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("artifact"));
    let mut name = stem;
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

pub fn current_git_rev() -> String {
    if let Some(from_env) = option_env!("GIT_COMMIT") {
        if !from_env.is_empty() {
            return from_env.to_string();
        }
    }
    if let Ok(env_override) = std::env::var("GIT_COMMIT") {
        if !env_override.is_empty() {
            return env_override;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn provenance_path_rewrites_extension() {
        let base = Path::new("/tmp/output/m1/latents.npy");
        let derived = provenance_path(base);
        assert_eq!(derived, Path::new("/tmp/output/m1/latents.provenance.json"));
    }

    #[test]
    fn write_sidecar_lists_artifact_then_siblings() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("latents.npy");
        let raw = dir.path().join("raw_latents.npy");
        fs::write(&artifact, b"").unwrap();
        let payload = Payload::new(json!({"n_pairs": 4})).with_siblings(vec![raw.clone()]);
        let prov_path = write_sidecar(&artifact, payload).unwrap();
        assert!(prov_path.exists());
        let parsed: Value = serde_json::from_slice(&fs::read(prov_path).unwrap()).unwrap();
        assert_eq!(parsed["outputs"][0], artifact.to_string_lossy().as_ref());
        assert_eq!(parsed["outputs"][1], raw.to_string_lossy().as_ref());
        assert_eq!(parsed["params"]["n_pairs"], 4);
        assert_eq!(parsed["engine_version"], scene_latents::VERSION);
    }

    #[test]
    fn staged_outputs_are_recorded_at_published_paths() {
        let dir = tempdir().unwrap();
        let stage = dir.path().join(".stage");
        let artifact = stage.join("m1").join("latents.npy");
        let payload = Payload::new(json!({}))
            .with_siblings(vec![stage.join("m1").join("raw_latents.npy")])
            .published_at(&stage, Path::new("/data/run"));
        let prov_path = write_sidecar(&artifact, payload).unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(prov_path).unwrap()).unwrap();
        assert_eq!(parsed["outputs"][0], "/data/run/m1/latents.npy");
        assert_eq!(parsed["outputs"][1], "/data/run/m1/raw_latents.npy");
    }
}
