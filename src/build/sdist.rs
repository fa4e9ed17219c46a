//! Source distribution (`.tar.gz`) builder

use super::metadata::core_metadata;
use super::select::select_sdist_files;
use super::{read_source, Artifact, BuildContext, PartialFile};
use crate::domain::TargetKind;
use crate::error::BuildError;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::Path;
use tar::{Builder, EntryType, Header};
use tracing::debug;

/// Entry timestamp used when `SOURCE_DATE_EPOCH` is unset (2020-02-02)
const DEFAULT_SOURCE_DATE_EPOCH: u64 = 1_580_601_600;

pub(super) fn source_date_epoch() -> u64 {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(DEFAULT_SOURCE_DATE_EPOCH)
}

fn append<W: Write>(
    builder: &mut Builder<W>,
    archive_path: &str,
    data: &[u8],
    mtime: u64,
) -> std::io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(mtime);
    builder.append_data(&mut header, archive_path, data)
}

pub(super) fn build_sdist(ctx: &BuildContext<'_>, out_dir: &Path) -> Result<Artifact, BuildError> {
    let descriptor = ctx.descriptor;
    let stem = ctx.distribution_stem();
    let target = out_dir.join(format!("{}.tar.gz", stem));

    let files = select_sdist_files(&ctx.tree, &descriptor.targets.sdist, &stem)?;
    debug!(files = files.len(), "selected sdist files");

    let (partial, file) = PartialFile::create(&target)?;
    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
    let mtime = source_date_epoch();

    let pkg_info = core_metadata(descriptor, ctx.readme_body().as_deref());
    append(
        &mut builder,
        &format!("{}/PKG-INFO", stem),
        pkg_info.as_bytes(),
        mtime,
    )
    .map_err(|e| BuildError::archive(partial.path(), e))?;

    for selected in &files {
        let data = read_source(selected)?;
        append(&mut builder, &selected.archive_path, &data, mtime)
            .map_err(|e| BuildError::archive(partial.path(), e))?;
    }

    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .map_err(|e| BuildError::archive(partial.path(), e))?;
    partial.commit()?;

    Artifact::from_file(TargetKind::Sdist, &target, files.len())
}
