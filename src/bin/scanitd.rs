use std::fs::File;
use std::io::BufWriter;

use anyhow::Context;
use clap::Parser;
use scanitd_rs::cli::{init_logging, Cli};
use scanitd_rs::scanner::BamScanner;
use scanitd_rs::vcf::VcfWriter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let sample_name = std::path::Path::new(&cli.output)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sample".to_string());

    let config = cli.into_config();

    let scanner = BamScanner::new(config.clone()).context("failed to initialize scanner")?;
    let (events, header_info) = scanner.scan().context("scan failed")?;

    let file = File::create(&config.output_vcf)
        .with_context(|| format!("cannot create output VCF {}", config.output_vcf))?;
    let mut writer = VcfWriter::new(BufWriter::new(file), sample_name);

    writer.write_header(&header_info).context("failed to write VCF header")?;
    let written = writer
        .write_events(&events, &config)
        .context("failed to write VCF events")?;

    log::info!("wrote {} of {} candidate events", written, events.len());
    Ok(())
}
