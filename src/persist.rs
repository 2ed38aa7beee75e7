//! Persistence layer (C9): write `*.raw`, `*.sig`, `*.out` files atomically.
//!
//! Writes go through a temp file in the destination directory followed by a
//! rename, so a partially-written file is never visible under the final
//! name (spec.md §5: "create-temp, rename ... partial files are never
//! visible"). The teacher has no direct file-artifact equivalent; this
//! follows spec.md §5/§6 directly.

use crate::error::CoinResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Artifact filename stages, in the order spec.md §4.7/§6 requires:
/// `.raw` must exist before `.sig`; `.sig` before `.out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStage {
    Raw,
    Sig,
    Out,
}

impl ArtifactStage {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactStage::Raw => "raw",
            ArtifactStage::Sig => "sig",
            ArtifactStage::Out => "out",
        }
    }
}

/// `tx_<TXID6>[<AMOUNT>].<ext>` — later stages rewrite only the extension,
/// preserving `tx_id` and `send_amount` literally so all three files for one
/// transaction can be found by prefix.
pub fn artifact_filename(tx_id6: &str, send_amount: &str, stage: ArtifactStage) -> String {
    format!("tx_{tx_id6}[{send_amount}].{}", stage.extension())
}

/// Writes `content` to `dir/filename` atomically: write to a sibling temp
/// file, then rename over the destination. `fsync`-level durability is left
/// to the filesystem; this only guarantees that readers never observe a
/// partially written file under the final name.
pub fn write_atomic(dir: &Path, filename: &str, content: &str) -> CoinResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let dest = dir.join(filename);
    let tmp = dir.join(format!(".{filename}.tmp"));
    fs::write(&tmp, content)?;
    fs::rename(&tmp, &dest)?;
    Ok(dest)
}

/// Enforces the stage-sequencing invariant: `prior_stage`'s file must exist
/// before writing `stage`'s (spec.md §5: "state transitions are strictly
/// sequential").
pub fn require_prior_stage(dir: &Path, tx_id6: &str, send_amount: &str, prior: ArtifactStage) -> CoinResult<()> {
    let path = dir.join(artifact_filename(tx_id6, send_amount, prior));
    if !path.exists() {
        return Err(crate::error::CoinError::invalid_input(format!(
            "{} must exist before the next stage",
            path.display()
        )));
    }
    Ok(())
}
