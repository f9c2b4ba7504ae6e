//! Dataset archive provisioning.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Extract the sample archive into `extract_root` unless it already exists.
///
/// Idempotence is a directory-existence check only: a present root is
/// trusted as-is, its contents are not verified against the archive.
pub(crate) fn provision(archive: &Path, extract_root: &Path) -> Result<()> {
    if extract_root.exists() {
        tracing::debug!(root = %extract_root.display(), "extraction root present, skipping unzip");
        return Ok(());
    }

    println!("Extracting ATLAS data...");

    fs::create_dir_all(extract_root)
        .with_context(|| format!("create extraction root {}", extract_root.display()))?;

    let file =
        fs::File::open(archive).with_context(|| format!("open archive {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("read zip archive {}", archive.display()))?;
    zip.extract(extract_root).with_context(|| {
        format!("extract {} into {}", archive.display(), extract_root.display())
    })?;

    tracing::info!(
        entries = zip.len(),
        root = %extract_root.display(),
        "archive extracted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn tmp_dir(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        p.push(format!("fl-cli-{}-{}-{}", name, std::process::id(), nanos));
        p
    }

    fn rm_rf(path: &Path) {
        let _ = std::fs::remove_dir_all(path);
    }

    fn write_test_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, bytes) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_archive_into_fresh_root() {
        let base = tmp_dir("prov1");
        rm_rf(&base);
        fs::create_dir_all(&base).unwrap();

        let archive = base.join("samples.zip");
        write_test_zip(&archive, &[("Data/sub/DataMuons.root", b"not really root")]);

        let root = base.join("extracted");
        provision(&archive, &root).unwrap();

        let extracted = root.join("Data/sub/DataMuons.root");
        assert_eq!(fs::read(&extracted).unwrap(), b"not really root");

        rm_rf(&base);
    }

    #[test]
    fn existing_root_skips_extraction_entirely() {
        let base = tmp_dir("prov2");
        rm_rf(&base);
        let root = base.join("extracted");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("marker.txt"), "kept").unwrap();

        // The archive path does not exist; a present root must short-circuit
        // before the archive is ever opened.
        provision(&base.join("missing.zip"), &root).unwrap();
        assert_eq!(fs::read_to_string(root.join("marker.txt")).unwrap(), "kept");

        rm_rf(&base);
    }

    #[test]
    fn missing_archive_with_fresh_root_is_an_error() {
        let base = tmp_dir("prov3");
        rm_rf(&base);
        fs::create_dir_all(&base).unwrap();

        let err = provision(&base.join("missing.zip"), &base.join("extracted")).unwrap_err();
        assert!(format!("{err:#}").contains("missing.zip"), "unexpected error: {err:#}");

        rm_rf(&base);
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let base = tmp_dir("prov4");
        rm_rf(&base);
        fs::create_dir_all(&base).unwrap();

        let archive = base.join("bad.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let err = provision(&archive, &base.join("extracted")).unwrap_err();
        assert!(format!("{err:#}").contains("bad.zip"), "unexpected error: {err:#}");

        rm_rf(&base);
    }
}
