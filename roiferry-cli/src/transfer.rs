// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::PathBuf;

use clap::Args;

use roiferry_core::batch::run_batch_with;
use roiferry_core::io::read_image_pairs;
use roiferry_core::ut::track::{self, progress_log, warn_log};
use roiferry_omero::WebConnector;

use crate::config::{ConfigArgs, complete_credentials, resolve_config};

#[derive(Debug, Args)]
#[command(about = "Copy ROIs from source images onto paired target images.")]
pub struct TransferArgs {
    #[arg(short = 'i', long, help = "Table of image pairs (csv, tsv, txt, parquet or pq).", required = true)]
    pub pairs: Option<String>,

    #[arg(long, help = "Read and convert ROIs without writing them to the target server.")]
    pub dry_run: bool,

    #[arg(long, help = "Directory to save source image thumbnails for QC.")]
    pub thumbnails: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn transfer(args: &TransferArgs) {
    let mut config = resolve_config(&args.config);
    let verbose = config.verbosity.info();

    let pairs_path = args.pairs.to_owned().unwrap();

    let pairs = read_image_pairs(&pairs_path, &config.source_column, &config.target_column)
        .unwrap_or_else(|err| {
            eprintln!("{}", err);
            std::process::exit(1);
        });

    if pairs.is_empty() {
        eprintln!("[roiferry::transfer] ERROR: No image pairs were found in {}.", pairs_path);
        std::process::exit(1);
    }

    let thumbnails = args.thumbnails.as_ref().map(PathBuf::from);

    if let Some(dir) = &thumbnails {
        std::fs::create_dir_all(dir).unwrap_or_else(|_| {
            eprintln!("[roiferry::transfer] ERROR: Could not create thumbnail directory.");
            std::process::exit(1);
        });
    }

    progress_log(
        &format!(
            "Detected {} image pairs.",
            track::thousands_format(pairs.len())
        ),
        verbose,
    );

    complete_credentials(&mut config.source, "1", "ROIFERRY_SOURCE");
    if !args.dry_run {
        complete_credentials(&mut config.target, "2", "ROIFERRY_TARGET");
    }

    let source = WebConnector::new(config.source.clone());
    let target = WebConnector::new(config.target.clone());

    let report = run_batch_with(
        &pairs,
        &source,
        &target,
        &config.batch_options(args.dry_run),
        |pair, extraction| {
            let (Some(dir), Some(thumbnail)) = (&thumbnails, &extraction.thumbnail) else {
                return;
            };

            let path = dir.join(format!("{}.png", pair.source_id));
            if let Err(err) = thumbnail.save(&path) {
                warn_log(&format!(
                    "Failed to save thumbnail {}. {}",
                    path.display(),
                    err
                ));
            }
        },
    );

    if report.pairs_failed > 0 || report.rois_failed > 0 {
        eprintln!(
            "[roiferry::transfer] ERROR: {} image pairs and {} ROIs failed to transfer.",
            report.pairs_failed, report.rois_failed
        );
        std::process::exit(1);
    }
}
