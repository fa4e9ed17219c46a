//! Wheel (`.whl`) builder

use super::metadata::{core_metadata, entry_points_file, wheel_file, Record, WHEEL_TAG};
use super::sdist::source_date_epoch;
use super::select::select_wheel_files;
use super::{read_source, Artifact, BuildContext, PartialFile};
use crate::domain::TargetKind;
use crate::error::BuildError;
use chrono::{Datelike, Timelike};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Zip timestamp for a unix epoch, clamped to the 1980..=2107 range zip can store
fn zip_timestamp(epoch: u64) -> DateTime {
    let Some(moment) = i64::try_from(epoch)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
    else {
        return DateTime::default();
    };
    let Ok(year) = u16::try_from(moment.year()) else {
        return DateTime::default();
    };

    DateTime::from_date_and_time(
        year,
        moment.month() as u8,
        moment.day() as u8,
        moment.hour() as u8,
        moment.minute() as u8,
        moment.second() as u8,
    )
    .unwrap_or_default()
}

fn entry_options(modified: DateTime) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644)
        .last_modified_time(modified)
}

/// Adds one entry to the archive and records its digest
fn add_entry(
    zip: &mut ZipWriter<File>,
    record: &mut Record,
    archive_path: &str,
    data: &[u8],
    options: SimpleFileOptions,
    partial: &Path,
) -> Result<(), BuildError> {
    zip.start_file(archive_path, options)
        .map_err(|e| BuildError::archive(partial, e))?;
    zip.write_all(data)
        .map_err(|e| BuildError::archive(partial, e))?;
    record.add(archive_path, data);
    Ok(())
}

pub(super) fn build_wheel(ctx: &BuildContext<'_>, out_dir: &Path) -> Result<Artifact, BuildError> {
    let descriptor = ctx.descriptor;
    let name = descriptor.project.artifact_name();
    let stem = ctx.distribution_stem();
    let target = out_dir.join(format!("{}-{}.whl", stem, WHEEL_TAG));
    let dist_info = format!("{}.dist-info", stem);

    let files = select_wheel_files(&ctx.tree, &descriptor.targets.wheel, &name)?;
    debug!(files = files.len(), "selected wheel files");

    let (partial, file) = PartialFile::create(&target)?;
    let mut zip = ZipWriter::new(file);
    let mut record = Record::new();
    let options = entry_options(zip_timestamp(source_date_epoch()));

    for selected in &files {
        let data = read_source(selected)?;
        add_entry(&mut zip, &mut record, &selected.archive_path, &data, options, partial.path())?;
    }

    let metadata = core_metadata(descriptor, ctx.readme_body().as_deref());
    add_entry(
        &mut zip,
        &mut record,
        &format!("{}/METADATA", dist_info),
        metadata.as_bytes(),
        options,
        partial.path(),
    )?;
    add_entry(
        &mut zip,
        &mut record,
        &format!("{}/WHEEL", dist_info),
        wheel_file().as_bytes(),
        options,
        partial.path(),
    )?;
    if let Some(entry_points) = entry_points_file(descriptor) {
        add_entry(
            &mut zip,
            &mut record,
            &format!("{}/entry_points.txt", dist_info),
            entry_points.as_bytes(),
            options,
            partial.path(),
        )?;
    }

    let record_path = format!("{}/RECORD", dist_info);
    let rendered = record.render(&record_path);
    zip.start_file(record_path.as_str(), options)
        .map_err(|e| BuildError::archive(partial.path(), e))?;
    zip.write_all(rendered.as_bytes())
        .map_err(|e| BuildError::archive(partial.path(), e))?;

    zip.finish()
        .map_err(|e| BuildError::archive(partial.path(), e))?;
    partial.commit()?;

    Artifact::from_file(TargetKind::Wheel, &target, files.len())
}
