// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::constant::{ALL_GROUPS, UNSCOPED_GROUP};
use crate::error::RoiFerryError;
use crate::io::ImagePair;
use crate::roi::{Extraction, Shape, encode_roi, extract_rois};
use crate::session::{Connect, Session};
use crate::ut::track::{Verbosity, debug_log, progress_log, thousands_format, warn_log};

/// Settings that apply to every pair of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    pub default_stroke_width: f64,
    pub target_group: i64,
    pub target_user: i64,
    pub verbosity: Verbosity,
    pub dry_run: bool,
}

/// Counts collected over a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub pairs: usize,
    pub pairs_failed: usize,
    pub rois_written: usize,
    pub rois_failed: usize,
    pub rois_skipped: usize,
}

/// Copy the ROIs of every source image onto its paired target image
///
/// Pairs are processed in order, one at a time. A failure while reading a
/// pair or writing one of its ROIs is logged and counted before moving on.
///
/// # Arguments
///
/// * `pairs` - Ordered source and target image ids
/// * `source` - Connects to the server the ROIs are read from
/// * `target` - Connects to the server the ROIs are written to
/// * `options` - Batch settings
pub fn run_batch<A: Connect, B: Connect>(
    pairs: &[ImagePair],
    source: &A,
    target: &B,
    options: &BatchOptions,
) -> BatchReport {
    run_batch_with(pairs, source, target, options, |_, _| {})
}

/// Same as [`run_batch`] but hands every extraction to `inspect` before
/// its ROIs are written
pub fn run_batch_with<A, B, F>(
    pairs: &[ImagePair],
    source: &A,
    target: &B,
    options: &BatchOptions,
    mut inspect: F,
) -> BatchReport
where
    A: Connect,
    B: Connect,
    F: FnMut(&ImagePair, &Extraction),
{
    let verbosity = options.verbosity;
    let mut report = BatchReport::default();

    for (idx, pair) in pairs.iter().enumerate() {
        report.pairs += 1;

        progress_log(
            &format!(
                "Pair {}/{}: image {} on {} -> image {} on {}",
                idx + 1,
                pairs.len(),
                pair.source_id,
                source.describe(),
                pair.target_id,
                target.describe()
            ),
            verbosity.info(),
        );

        let extraction = match read_pair(pair, source, verbosity) {
            Ok(extraction) => extraction,
            Err(err) => {
                warn_log(&format!(
                    "Skipping pair {} -> {}. {}",
                    pair.source_id, pair.target_id, err
                ));
                report.pairs_failed += 1;
                continue;
            }
        };

        inspect(pair, &extraction);
        report.rois_skipped += extraction.skipped().count();

        let shapes: Vec<Shape> = extraction
            .rois()
            .map(|roi| encode_roi(roi, options.default_stroke_width))
            .collect();

        if options.dry_run {
            progress_log(
                &format!(
                    "Dry run: {} ROIs would be written to image {}",
                    shapes.len(),
                    pair.target_id
                ),
                verbosity.info(),
            );
            continue;
        }

        for shape in &shapes {
            let name = shape.text.as_deref().unwrap_or_default();

            match write_shape(shape, pair.target_id, target, options) {
                Ok(region_id) => {
                    report.rois_written += 1;
                    debug_log(
                        &format!(
                            "Saved ROI '{}' as region {} on image {}",
                            name, region_id, pair.target_id
                        ),
                        verbosity.debug(),
                    );
                }
                Err(err) => {
                    report.rois_failed += 1;
                    warn_log(&format!(
                        "Failed to write ROI '{}' to image {}. {}",
                        name, pair.target_id, err
                    ));
                }
            }
        }
    }

    progress_log(
        &format!(
            "Complete. {} ROIs written across {} image pairs. {} ROIs failed, {} ROIs skipped, {} pairs failed.",
            thousands_format(report.rois_written),
            thousands_format(report.pairs),
            thousands_format(report.rois_failed),
            thousands_format(report.rois_skipped),
            thousands_format(report.pairs_failed),
        ),
        verbosity.info(),
    );

    report
}

/// Extract the ROIs of a source image within its own scoped session
fn read_pair<A: Connect>(
    pair: &ImagePair,
    source: &A,
    verbosity: Verbosity,
) -> Result<Extraction, RoiFerryError> {
    progress_log(
        &format!("Connecting to {}", source.describe()),
        verbosity.info(),
    );

    let mut session = source.open()?;
    extract_rois(&mut *session, pair.source_id, verbosity)
}

/// Save one shape onto a target image within its own scoped session
fn write_shape<B: Connect>(
    shape: &Shape,
    target_id: i64,
    target: &B,
    options: &BatchOptions,
) -> Result<i64, RoiFerryError> {
    let mut session = target.open()?;

    session.set_active_group(ALL_GROUPS)?;
    let image = session.get_image(target_id)?;

    if options.target_group == UNSCOPED_GROUP {
        session.persist(shape, &image, None)
    } else {
        let context = session.set_write_context(options.target_group, options.target_user);
        session.persist(shape, &image, Some(&context))
    }
}
