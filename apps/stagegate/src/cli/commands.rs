//! # CLI Command Implementations

use super::PrefsAction;
use crate::script::{Script, SimulationReport, run_script};
use stagegate_core::{
    CameraFacing, CaptureError, Dimensions, MemoryPreferences, Orientation, PreferenceStore,
    PreferenceValue, PreviewTransform, RedbPreferences, ScreenRotation, camera_rotation,
    crop_to_surface,
};
use std::path::Path;

fn print_json(output: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(output).unwrap_or_default()
    );
}

/// Parse an orientation name.
pub fn parse_orientation(name: &str) -> Result<Orientation, CaptureError> {
    match name.to_ascii_lowercase().as_str() {
        "portrait" => Ok(Orientation::Portrait),
        "landscape" => Ok(Orientation::Landscape),
        other => Err(CaptureError::InvalidArgument(format!(
            "unknown orientation '{other}' (expected portrait or landscape)"
        ))),
    }
}

/// Parse a camera facing name.
pub fn parse_facing(name: &str) -> Result<CameraFacing, CaptureError> {
    match name.to_ascii_lowercase().as_str() {
        "back" => Ok(CameraFacing::Back),
        "front" => Ok(CameraFacing::Front),
        other => Err(CaptureError::InvalidArgument(format!(
            "unknown camera facing '{other}' (expected back or front)"
        ))),
    }
}

// =============================================================================
// GEOMETRY COMMANDS
// =============================================================================

/// Show the preview transform for a stream of `preview` shown in `view`.
pub fn cmd_transform(
    preview: Dimensions,
    view: Dimensions,
    orientation: &str,
    json_mode: bool,
) -> Result<(), CaptureError> {
    let orientation = parse_orientation(orientation)?;
    let transform = PreviewTransform::compute(preview, view, orientation)?;

    if json_mode {
        print_json(&serde_json::json!({
            "preview": preview,
            "view": view,
            "orientation": orientation,
            "scale_x_millionths": transform.scale_x.millionths(),
            "scale_y_millionths": transform.scale_y.millionths(),
        }));
        return Ok(());
    }

    println!("Preview Transform");
    println!("=================");
    println!("Preview:     {}", preview);
    println!("View:        {}", view);
    println!("Orientation: {:?}", orientation);
    println!();
    println!("Scale X:     {}", transform.scale_x);
    println!("Scale Y:     {}", transform.scale_y);
    if transform.is_identity() {
        println!("(identity)");
    }

    Ok(())
}

/// Show the crop of `image` that matches the aspect of `surface`.
pub fn cmd_crop(
    image: Dimensions,
    surface: Dimensions,
    json_mode: bool,
) -> Result<(), CaptureError> {
    let crop = crop_to_surface(image, surface)?;

    if json_mode {
        print_json(&serde_json::json!({
            "image": image,
            "surface": surface,
            "crop": crop,
        }));
        return Ok(());
    }

    println!("Capture Crop");
    println!("============");
    println!("Image:   {}", image);
    println!("Surface: {}", surface);
    println!();
    println!("Origin:  ({}, {})", crop.left, crop.top);
    println!("Size:    {}", crop.size());

    Ok(())
}

/// Show the display rotation for a sensor mounted at `sensor` degrees.
pub fn cmd_rotation(
    sensor: u16,
    facing: &str,
    screen: u16,
    json_mode: bool,
) -> Result<(), CaptureError> {
    let facing = parse_facing(facing)?;
    let screen = ScreenRotation::from_degrees(screen)?;
    let degrees = camera_rotation(sensor, facing, screen);

    if json_mode {
        print_json(&serde_json::json!({
            "sensor": sensor,
            "facing": facing,
            "screen": screen.degrees(),
            "rotation": degrees,
        }));
        return Ok(());
    }

    println!("Camera Rotation");
    println!("===============");
    println!("Facing:   {}", facing);
    println!("Sensor:   {} degrees", sensor);
    println!("Screen:   {} degrees", screen.degrees());
    println!();
    println!("Rotation: {} degrees", degrees);
    Ok(())
}

// =============================================================================
// PREFERENCE COMMANDS
// =============================================================================

/// Run a preference store operation against the database at `db_path`.
pub fn cmd_prefs(db_path: &Path, action: PrefsAction, json_mode: bool) -> Result<(), CaptureError> {
    let mut store = RedbPreferences::open(db_path)?;

    match action {
        PrefsAction::Get { key } => {
            let value = store.get(&key)?;
            if json_mode {
                print_json(&serde_json::json!({ "key": key, "value": value }));
            } else {
                match value {
                    Some(value) => println!("{} = {}", key, value),
                    None => println!("{} is not set", key),
                }
            }
        }
        PrefsAction::Set { key, value, kind } => {
            let value = PreferenceValue::parse(&kind, &value)?;
            store.set(&key, value.clone())?;
            if json_mode {
                print_json(&serde_json::json!({ "key": key, "value": value }));
            } else {
                println!("{} = {}", key, value);
            }
        }
        PrefsAction::Remove { key } => {
            let previous = store.remove(&key)?;
            if json_mode {
                print_json(&serde_json::json!({ "key": key, "removed": previous }));
            } else {
                match previous {
                    Some(value) => println!("Removed {} (was {})", key, value),
                    None => println!("{} was not set", key),
                }
            }
        }
        PrefsAction::List => {
            let entries = store.entries()?;
            if json_mode {
                let map: serde_json::Map<String, serde_json::Value> = entries
                    .into_iter()
                    .map(|(key, value)| (key, serde_json::json!(value)))
                    .collect();
                print_json(&serde_json::Value::Object(map));
            } else if entries.is_empty() {
                println!("No preferences stored in {:?}", store.path());
            } else {
                for (key, value) in entries {
                    println!("{} = {}", key, value);
                }
            }
        }
    }

    Ok(())
}

// =============================================================================
// SIMULATE COMMAND
// =============================================================================

/// Replay the script at `script_path` and print what the session reported.
pub fn cmd_simulate(
    db_path: &Path,
    script_path: &Path,
    ephemeral: bool,
    json_mode: bool,
) -> Result<(), CaptureError> {
    let script = Script::load(script_path)?;
    tracing::info!(
        script = %script_path.display(),
        steps = script.steps.len(),
        ephemeral,
        "replaying simulation"
    );

    let report = if ephemeral {
        run_script(&script, MemoryPreferences::new())?
    } else {
        run_script(&script, RedbPreferences::open(db_path)?)?
    };

    if json_mode {
        print_json(&serde_json::json!(report));
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &SimulationReport) {
    println!("Simulation Timeline");
    println!("===================");
    for entry in &report.timeline {
        println!("[{}] {:?}", entry.index, entry.step);
        for event in &entry.events {
            println!("      -> {}", event);
        }
    }
    println!();
    println!("Device calls:  {}", report.device_calls.len());
    println!("Final camera:  {}", report.final_facing);
}
