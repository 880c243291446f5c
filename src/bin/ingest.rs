use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use jyotir_rag::config::ServiceArgs;
use jyotir_rag::ingest::{read_record, Ingestor, Uploader};
use jyotir_rag::logging::{init_tracing, LogArgs};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "jyotir-ingest",
    about = "Segment a lecture transcript into argument units and upload it to Qdrant"
)]
struct IngestCli {
    /// Raw lecture transcript to segment.
    #[arg(long, env = "JYOTIR_INGEST_INPUT", default_value = "pasted.txt")]
    input: PathBuf,

    /// Directory receiving the structured JSON records.
    #[arg(long, env = "JYOTIR_INGEST_OUTPUT", default_value = "Data")]
    output_dir: PathBuf,

    /// Upload an existing JSON record instead of segmenting a transcript.
    #[arg(long, conflicts_with = "skip_upload")]
    from_record: Option<PathBuf>,

    /// Write the record but do not embed or upload it.
    #[arg(long, default_value_t = false)]
    skip_upload: bool,

    #[command(flatten)]
    services: ServiceArgs,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> Result<()> {
    let cli = IngestCli::parse();
    init_tracing(&cli.log);

    if let Some(path) = &cli.from_record {
        let unit = read_record(path)?;
        let embedder = cli.services.embedder()?;
        let store = cli.services.store()?;
        let uploader = Uploader {
            embedder: embedder.as_ref(),
            sink: &store,
        };
        match uploader.upload(&unit)? {
            Some(id) => info!(id, title = %unit.title, "record uploaded"),
            None => info!(title = %unit.title, "record had no content"),
        }
        return Ok(());
    }

    let generator = cli.services.generator()?;
    // Only an upload needs the embedder and its credentials.
    let upload_clients = if cli.skip_upload {
        None
    } else {
        Some((cli.services.embedder()?, cli.services.store()?))
    };
    let ingestor = Ingestor {
        generator: generator.as_ref(),
        uploader: upload_clients
            .as_ref()
            .map(|(embedder, store)| Uploader {
                embedder: embedder.as_ref(),
                sink: store,
            }),
    };

    let report = ingestor.ingest_file(&cli.input, &cli.output_dir)?;
    info!(
        title = %report.unit.title,
        class_num = %report.unit.class_num,
        record = ?report.record_path,
        uploaded = report.point_id.is_some(),
        "ingestion complete"
    );
    Ok(())
}
