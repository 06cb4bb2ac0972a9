//! # Pipeline Entry Points
//!
//! [`build_manifest`] drains a [`RecordStream`] into a [`ManifestBuilder`].
//! [`run`] does the whole compile, decode, and build sequence from a
//! [`PipelineConfig`].

use std::io::Read;

use pop_crypto::CommitmentKey;
use pop_decode::{decode, RecordStream};
use pop_schema::compile_schema;

use crate::builder::{CryptoOptions, ManifestBuilder};
use crate::config::PipelineConfig;
use crate::error::ManifestError;
use crate::manifest::Manifest;

/// Build a manifest from every record of `stream`.
///
/// The stream's layout and decode options are recorded in the manifest. A
/// stream stopped early yields a manifest over the records read so far.
pub fn build_manifest<R: Read>(
    stream: RecordStream<'_, R>,
    crypto: &CryptoOptions,
    key: Option<&CommitmentKey>,
) -> Result<Manifest, ManifestError> {
    let layout = stream.layout();
    let mut builder = ManifestBuilder::new(layout, stream.options().clone(), crypto, key)?;
    let mut stream = stream;
    for item in &mut stream {
        builder.push(item)?;
    }
    let summary = stream.summary();
    if summary.stopped_early {
        tracing::info!(records_read = summary.records_read, "building manifest over a stopped stream");
    }
    builder.finish()
}

/// Compile `copybook`, decode `reader`, and build its manifest under
/// `config`.
pub fn run<R: Read>(
    config: &PipelineConfig,
    copybook: &str,
    reader: R,
    key: Option<&CommitmentKey>,
) -> Result<Manifest, ManifestError> {
    config.validate()?;
    let layout = compile_schema(copybook, &config.schema)?;
    build_manifest(decode(&layout, reader, config.decode.clone()), &config.crypto_options(), key)
}
