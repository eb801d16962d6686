// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Schematic Viewport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Schematic Viewport demo shell.
//!
//! Opens a case from a directory tree, positions the viewport once and prints the resulting
//! frame as JSON on stdout.

use std::error::Error;

use log::info;
use schematic_viewport::config::ViewportConfig;
use schematic_viewport::model::ZoomLevel;
use schematic_viewport::store::FsSource;
use schematic_viewport::viewport::{PositionSpace, ViewportController, ViewportUpdate};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} <root> <case> [--bin <n> | --column <n>] [--zoom <bin-width>] [--width <px>] [--config <file>] [--highlight] [--read-ahead]\n\nFiles are read from <root>/<case>/: the chunk index plus one directory per zoom level.\n--bin positions on a bin of the selected zoom level (default 1); --column on a base column.\n--zoom selects a zoom level by bin width (default: the finest level).\n--width overrides the configured window width in pixels.\n--read-ahead waits for the read-ahead margin to load before printing.\n\nLogging goes to stderr; set RUST_LOG to change the level (default info)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    root: String,
    case: String,
    position: Option<(u64, PositionKind)>,
    zoom: Option<u32>,
    width_px: Option<u32>,
    config: Option<String>,
    highlight: bool,
    read_ahead: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PositionKind {
    Bin,
    Column,
}

fn parse_number<T: std::str::FromStr>(raw: Option<String>) -> Result<T, ()> {
    raw.ok_or(())?.parse().map_err(|_| ())
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bin" | "--column" => {
                if options.position.is_some() {
                    return Err(());
                }
                let kind = if arg == "--bin" { PositionKind::Bin } else { PositionKind::Column };
                options.position = Some((parse_number(args.next())?, kind));
            }
            "--zoom" => {
                if options.zoom.is_some() {
                    return Err(());
                }
                options.zoom = Some(parse_number(args.next())?);
            }
            "--width" => {
                if options.width_px.is_some() {
                    return Err(());
                }
                options.width_px = Some(parse_number(args.next())?);
            }
            "--config" => {
                if options.config.is_some() {
                    return Err(());
                }
                options.config = Some(args.next().ok_or(())?);
            }
            "--highlight" => {
                if options.highlight {
                    return Err(());
                }
                options.highlight = true;
            }
            "--read-ahead" => {
                if options.read_ahead {
                    return Err(());
                }
                options.read_ahead = true;
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => positional.push(arg),
        }
    }

    let [root, case]: [String; 2] = positional.try_into().map_err(|_| ())?;
    options.root = root;
    options.case = case;
    Ok(options)
}

async fn run(options: CliOptions) -> Result<String, Box<dyn Error>> {
    let mut config = match &options.config {
        Some(path) => ViewportConfig::from_json_file(path)?,
        None => ViewportConfig::default(),
    };
    if let Some(width_px) = options.width_px {
        config.window_width_px = width_px;
    }

    let controller = ViewportController::new(FsSource::new(&options.root), &config);
    controller.open_case(&options.case).await?;
    if let Some(width) = options.zoom {
        controller.set_zoom(ZoomLevel::new(width)?).await?;
    }

    let (target, space) = match options.position {
        Some((target, PositionKind::Bin)) => (target, PositionSpace::Bin),
        Some((target, PositionKind::Column)) => (target, PositionSpace::Column),
        None => (1, PositionSpace::Bin),
    };
    let frame = match controller.update_position(target, space, options.highlight).await? {
        ViewportUpdate::Applied(frame) => frame,
        ViewportUpdate::Superseded => return Err("position request was superseded".into()),
    };
    if options.read_ahead {
        let added = if config.auto_read_ahead {
            controller.settle_read_ahead().await?
        } else {
            controller.read_ahead().await?
        };
        info!("read-ahead added {added} segments");
    }

    info!(
        "bins {}..={} at zoom {}: {} segments, {} arrows",
        frame.window.begin_bin,
        frame.window.end_bin,
        frame.zoom,
        frame.segments.len(),
        frame.links.len()
    );
    Ok(serde_json::to_string_pretty(&*frame)?)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "schematic-viewport".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let json = runtime.block_on(run(options))?;
        println!("{json}");
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("schematic-viewport: {err}");
        std::process::exit(1);
    }
}
