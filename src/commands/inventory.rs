use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::InventoryArgs;
use crate::convert::DocumentFormat;
use crate::model::{DocumentEntry, DocumentInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.source_dir)?;

    if args.dry_run {
        info!(
            document_count = manifest.document_count,
            skipped = manifest.skipped_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.source_dir));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(
        document_count = manifest.document_count,
        skipped = manifest.skipped_count,
        "inventory completed"
    );

    Ok(())
}

pub fn default_manifest_path(source_dir: &Path) -> PathBuf {
    source_dir.join("manifests").join("document_inventory.json")
}

pub fn build_manifest(source_dir: &Path) -> Result<DocumentInventoryManifest> {
    let (mut paths, skipped_count) = discover_documents(source_dir)?;
    paths.sort_by(|a, b| a.0.cmp(&b.0));

    if paths.is_empty() {
        bail!("no supported documents found in {}", source_dir.display());
    }

    let mut documents = Vec::with_capacity(paths.len());
    for (path, format) in paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let size_bytes = fs::metadata(&path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        let sha256 = sha256_file(&path)?;

        documents.push(DocumentEntry {
            filename,
            format: format.as_str().to_string(),
            size_bytes,
            sha256,
        });
    }

    Ok(DocumentInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        document_count: documents.len(),
        skipped_count,
        documents,
    })
}

fn discover_documents(source_dir: &Path) -> Result<(Vec<(PathBuf, DocumentFormat)>, usize)> {
    let mut documents = Vec::new();
    let mut skipped = 0usize;

    let entries = fs::read_dir(source_dir)
        .with_context(|| format!("failed to read {}", source_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", source_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(DocumentFormat::from_extension);

        match format {
            Some(format) => documents.push((path, format)),
            None => {
                debug!(path = %path.display(), "skipping unsupported file");
                skipped += 1;
            }
        }
    }

    Ok((documents, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "fedevent_inventory_{label}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("scratch dir is created");
        dir
    }

    #[test]
    fn build_manifest_skips_unsupported_extensions() {
        let dir = scratch_dir("skips");
        fs::write(dir.join("b_sheet.txt"), "Total Rooms: 250\n").expect("write txt");
        fs::write(dir.join("a_deck.PDF"), b"%PDF-1.4").expect("write pdf");
        fs::write(dir.join("notes.xlsx"), b"ignored").expect("write xlsx");
        fs::create_dir_all(dir.join("nested.docx")).expect("directory is not a document");

        let manifest = build_manifest(&dir).expect("manifest builds");

        assert_eq!(manifest.document_count, 2);
        assert_eq!(manifest.skipped_count, 1);
        assert_eq!(manifest.documents[0].filename, "a_deck.PDF");
        assert_eq!(manifest.documents[0].format, "pdf");
        assert_eq!(manifest.documents[1].format, "text");
        assert_eq!(manifest.documents[1].size_bytes, 17);
        assert_eq!(manifest.documents[1].sha256.len(), 64);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn build_manifest_fails_without_documents() {
        let dir = scratch_dir("empty");
        fs::write(dir.join("readme.rtf"), "nothing here").expect("write rtf");

        assert!(build_manifest(&dir).is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
