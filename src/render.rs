use crate::client::Prediction;
use std::fmt::Write as _;

pub const RESULTS_TITLE: &str = "Classification Results";
pub const EMPTY_PLACEHOLDER: &str = "Upload an image to get started";

/// Formats a confidence as a percentage with one decimal, e.g. `97.0%`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Draws a bar of `width` cells filled in proportion to `confidence`.
///
/// Out of range values are clamped for drawing only.
pub fn confidence_bar(confidence: f64, width: usize) -> String {
    let ratio = if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    };
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Renders the results area of a session.
///
/// The placeholder only shows before any image is selected. With an image and
/// no predictions the area stays empty.
pub fn render_results(image_selected: bool, predictions: &[Prediction], bar_width: usize) -> String {
    if !image_selected && predictions.is_empty() {
        return format!("{EMPTY_PLACEHOLDER}\n");
    }
    render_predictions(predictions, bar_width)
}

/// Renders predictions in the order given. An empty list renders nothing.
pub fn render_predictions(predictions: &[Prediction], bar_width: usize) -> String {
    if predictions.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{RESULTS_TITLE}");
    for prediction in predictions {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}  {} confidence",
            prediction.label,
            format_confidence(prediction.confidence)
        );
        if let Some(description) = prediction.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "  {description}");
        }
        let _ = writeln!(out, "  [{}]", confidence_bar(prediction.confidence, bar_width));
    }
    out
}
