//! Batch mode: process every PDF in a directory, isolating per-file
//! failures.
//!
//! A file that cannot be processed gets `{"title": "", "outline": []}`
//! written in its place and an error logged; processing then continues with
//! the next file. The only condition that fails the whole run is a missing
//! input directory.

use std::fs;
use std::path::{Path, PathBuf};

use anstream::println;
use color_eyre::eyre::{eyre, Result};
use outline::DocumentOutline;

/// Map an input path to its result file name: `report.pdf` ->
/// `report_new.json`.
fn output_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}_new.json")
}

/// Case-insensitive `.pdf` extension check.
fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Write a JSON value to `path`, logging instead of failing: individual
/// write errors must not abort the batch.
fn write_json(path: &Path, json: &str) {
    if let Err(err) = fs::write(path, json) {
        log::error!("cannot write {}: {}", path.display(), err);
    }
}

pub fn run(input_dir: &Path, output_dir: &Path) -> Result<()> {
    if !input_dir.is_dir() {
        return Err(eyre!(
            "input directory not found: {}",
            input_dir.display()
        ));
    }

    if let Err(err) = fs::create_dir_all(output_dir) {
        log::error!("cannot create {}: {}", output_dir.display(), err);
    }

    let mut inputs: Vec<PathBuf> = fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_pdf_extension(path))
        .collect();
    inputs.sort();

    for input in inputs {
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let out_name = output_file_name(&input);
        let out_path = output_dir.join(&out_name);

        println!("Processing {file_name}...");

        match outline::extract_outline_from_path(&input) {
            Ok(result) => match serde_json::to_string_pretty(&result) {
                Ok(json) => {
                    write_json(&out_path, &json);
                    println!("Successfully processed {file_name} -> {out_name}");
                }
                Err(err) => {
                    log::error!("cannot serialize result for {}: {}", file_name, err);
                    write_empty_result(&out_path);
                }
            },
            Err(err) => {
                log::error!("error processing {}: {}", file_name, err);
                write_empty_result(&out_path);
            }
        }
    }

    Ok(())
}

/// Substitute result for a failed file.
fn write_empty_result(path: &Path) {
    match serde_json::to_string(&DocumentOutline::default()) {
        Ok(json) => write_json(path, &json),
        Err(err) => log::error!("cannot serialize empty result: {}", err),
    }
}
