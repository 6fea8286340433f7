//! The core pipeline: experiment file → resolve network file → InfoPass →
//! select writer → FullPass → split each top-level population → write.
//! The config layering, logging, and progress bar are ambient additions
//! around that core flow.

use std::fs::File;
use std::path::Path;

use tracing::{info, warn};

use spinesplit_model::SplitterMode;
use spinesplit_parser::{run_experiment_pass, run_full_pass, run_info_pass};
use spinesplit_split::SplitContext;
use spinesplit_writers::{DamsonWriter, DotWriter, NetworkWriter, WriteOptions, XmlWriter};

use crate::commands::Cli;
use crate::config::{DefaultWriter, SpinesplitConfig};
use crate::error::{CliError, CliResult};

/// Run the experiment → split → write pipeline for one invocation of the
/// bare (non-subcommand) CLI form.
pub fn execute(cli: Cli) -> CliResult<()> {
    let experiment_path = cli
        .experiment
        .clone()
        .ok_or_else(|| CliError::invalid_args("an experiment XML file is required"))?;
    let output_path = cli
        .output
        .clone()
        .ok_or_else(|| CliError::invalid_args("an output path is required"))?;

    let config_path = match cli.config.clone() {
        Some(p) => p,
        None => SpinesplitConfig::default_config_path()?,
    };
    let config = SpinesplitConfig::load_from_file(&config_path)?;

    let cap = cli.cap.or(config.default_cap).unwrap_or(spinesplit_model::DEFAULT_CAP);
    let parallel = !cli.no_parallel && config.default_parallel;

    if cli.alias && cli.graph {
        return Err(CliError::invalid_args("--alias and --graph are mutually exclusive"));
    }

    let experiment_text = std::fs::read_to_string(&experiment_path).map_err(|e| {
        CliError::missing_resource(format!("experiment file '{}': {e}", experiment_path.display()))
    })?;
    let experiment = run_experiment_pass(&experiment_text)?;

    let experiment_dir = experiment_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    let network_path = experiment_dir.join(&experiment.network_layer_url);

    let network_text = std::fs::read_to_string(&network_path).map_err(|e| {
        CliError::missing_resource(format!("network file '{}': {e}", network_path.display()))
    })?;

    info!("running InfoPass over {}", network_path.display());
    let info = run_info_pass(&network_text, cap)?;
    let mode = info.mode.unwrap_or(SplitterMode::ProjDefinedAtSrc);

    info!("running FullPass over {}", network_path.display());
    let network_dir = network_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    let populations = run_full_pass(&network_text, &info, &network_dir)?;

    let sizes = populations
        .iter()
        .map(|pop| (pop.name.clone(), pop.size()))
        .collect();
    let ctx = SplitContext::new_with_parallel(cap, mode, &sizes, parallel);

    let options = WriteOptions {
        cap,
        mode,
        no_xml_formatting: cli.no_xml_formatting,
    };
    let out_file = File::create(&output_path)?;
    let mut writer = select_writer(&cli, &config, options, out_file)?;

    let progress = if cli.silent || !console::Term::stderr().is_term() {
        None
    } else {
        let bar = indicatif::ProgressBar::new(populations.len() as u64);
        bar.set_style(
            indicatif::ProgressStyle::with_template("{bar:40} {pos}/{len} populations")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
        );
        Some(bar)
    };

    writer.begin()?;
    for pop in &populations {
        let sub_populations = spinesplit_split::split(&ctx, pop)?;
        if sub_populations.is_empty() {
            warn!("population '{}' split into zero sub-populations", pop.name);
        }
        writer.write_population(pop, &sub_populations)?;
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }
    writer.finish()?;
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    if !cli.silent {
        info!(
            "wrote {} population(s) to {}",
            populations.len(),
            output_path.display()
        );
    }
    Ok(())
}

fn select_writer(
    cli: &Cli,
    config: &SpinesplitConfig,
    options: WriteOptions,
    out_file: File,
) -> CliResult<Box<dyn NetworkWriter>> {
    let resolved = if cli.alias {
        DefaultWriter::Alias
    } else if cli.graph {
        DefaultWriter::Graph
    } else {
        config.default_writer
    };

    match resolved {
        DefaultWriter::Alias => {
            Ok(Box::new(DamsonWriter::new(out_file, options.cap, options.mode)?))
        }
        DefaultWriter::Graph => Ok(Box::new(DotWriter::new(out_file))),
        DefaultWriter::Xml => Ok(Box::new(XmlWriter::new(
            out_file,
            options.mode,
            !options.no_xml_formatting,
        ))),
    }
}
