// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use clap::Args;
use colored::Colorize;

use roiferry_core::codec::{int_to_rgba, points_to_string};
use roiferry_core::roi::{Extraction, RoiOutcome, StrokeWidth, extract_rois};
use roiferry_core::session::Connect;
use roiferry_omero::WebConnector;

use crate::config::{ConfigArgs, complete_credentials, resolve_config};

#[derive(Debug, Args)]
#[command(about = "List the ROIs of a source image as they would be transferred.")]
pub struct InspectArgs {
    #[arg(short = 'i', long, help = "Source image id.", required = true)]
    pub image: Option<i64>,

    #[arg(long, help = "Print normalized ROIs as json.")]
    pub json: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn inspect(args: &InspectArgs) {
    let mut config = resolve_config(&args.config);
    let image_id = args.image.unwrap();

    complete_credentials(&mut config.source, "1", "ROIFERRY_SOURCE");

    let source = WebConnector::new(config.source.clone());

    let extraction = source
        .open()
        .and_then(|mut session| extract_rois(&mut *session, image_id, config.verbosity))
        .unwrap_or_else(|err| {
            eprintln!("{}", err);
            std::process::exit(1);
        });

    if args.json {
        print_json(&extraction);
    } else {
        print_table(&extraction);
    }
}

fn describe_width(width: &Option<StrokeWidth>) -> String {
    match width {
        Some(StrokeWidth::Magnitude(value)) => format!("{}", value),
        Some(StrokeWidth::Length(length)) => format!("{} {}", length.value, length.unit.symbol()),
        None => "default".to_string(),
    }
}

fn print_json(extraction: &Extraction) {
    let rois: Vec<serde_json::Value> = extraction
        .outcomes
        .iter()
        .map(|outcome| match outcome {
            RoiOutcome::Extracted(roi) => serde_json::json!({
                "name": roi.name,
                "points": roi.points,
                "stroke_color": roi.stroke_color,
                "fill_color": roi.fill_color,
                "stroke_width": describe_width(&roi.stroke_width),
                "stroke_dash": roi.stroke_dash,
            }),
            RoiOutcome::Skipped(skipped) => serde_json::json!({
                "region_id": skipped.region_id,
                "name": skipped.name,
                "skipped": skipped.reason.to_string(),
            }),
        })
        .collect();

    let output = serde_json::json!({
        "image": extraction.image.id,
        "name": extraction.image.name,
        "group": extraction.image.group_id,
        "rois": rois,
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&output).unwrap_or_default()
    );
}

fn print_table(extraction: &Extraction) {
    println!("{:^69}", "\n");
    println!("| {:-^74} |", "");
    println!("| {:^74} |", "roiferry".truecolor(103, 194, 69).bold());
    println!(
        "| {:^74} |",
        format!("ROIs on image {} ({})", extraction.image.id, extraction.image.name)
    );
    println!("| {:-^18} | {:-^10} | {:-^19} | {:-^18} |", "", "", "", "");
    println!(
        "| {:^18} | {:^10} | {:^19} | {:^18} |",
        "name".bold(),
        "points".bold(),
        "stroke (rgba)".bold(),
        "width".bold()
    );
    println!("| {:-^18} | {:-^10} | {:-^19} | {:-^18} |", "", "", "", "");

    for outcome in &extraction.outcomes {
        match outcome {
            RoiOutcome::Extracted(roi) => {
                let [r, g, b, a] = int_to_rgba(roi.stroke_color);
                println!(
                    "| {:^18} | {:^10} | {:^19} | {:^18} |",
                    truncate(&roi.name, 18),
                    roi.points.len(),
                    format!("{},{},{},{}", r, g, b, a),
                    describe_width(&roi.stroke_width),
                );
            }
            RoiOutcome::Skipped(skipped) => {
                println!(
                    "| {:^18} | {:^10} | {:^40} |",
                    truncate(&skipped.name, 18),
                    "skipped".yellow(),
                    truncate(&skipped.reason.to_string(), 40),
                );
            }
        }
    }

    println!("| {:-^18} | {:-^10} | {:-^19} | {:-^18} |", "", "", "", "");

    for roi in extraction.rois() {
        println!("{}: {}", roi.name.bold(), points_to_string(&roi.points));
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let mut short: String = text.chars().take(width - 1).collect();
        short.push('…');
        short
    } else {
        text.to_string()
    }
}
