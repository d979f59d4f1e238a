//! Node widths from label text.

use std::collections::HashMap;

use super::graph::FamilyGraph;
use crate::config::LayoutConfig;
use crate::text_metrics;

/// Box width of every person, by index. Label widths are memoised per call
/// on the label text, which already folds in name and sex.
pub(super) fn node_widths(graph: &FamilyGraph<'_>, config: &LayoutConfig) -> Vec<f32> {
    let mut memo: HashMap<String, f32> = HashMap::new();
    let label_widths: Vec<f32> = (0..graph.len())
        .map(|pid| {
            let label = graph.person(pid).label();
            *memo
                .entry(label)
                .or_insert_with_key(|label| text_width(label, config))
        })
        .collect();

    if config.uniform_node_width {
        let any_photo = (0..graph.len()).any(|pid| graph.person(pid).photo.is_some());
        let widest = label_widths.iter().copied().fold(0.0, f32::max);
        let width = node_width(widest, any_photo, config);
        return vec![width; graph.len()];
    }
    label_widths
        .iter()
        .enumerate()
        .map(|(pid, &label)| node_width(label, graph.person(pid).photo.is_some(), config))
        .collect()
}

pub(super) fn node_width(label_width: f32, photo: bool, config: &LayoutConfig) -> f32 {
    let padding = if photo {
        config.photo_padding
    } else {
        config.text_padding
    };
    config.min_node_width.max((label_width + padding).ceil())
}

/// Bold label width. The char table is used unless system font metrics were
/// asked for; a missing font falls back to the table too.
pub(super) fn text_width(text: &str, config: &LayoutConfig) -> f32 {
    let size = config.label_font_size;
    if config.fast_text_metrics {
        return fallback_text_width(text, size);
    }
    text_metrics::measure_text_width(text, size, &config.label_font_family, true)
        .unwrap_or_else(|| fallback_text_width(text, size))
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

pub(super) fn char_width_factor(ch: char) -> f32 {
    // Em fractions of a common sans-serif face; anything missing (including
    // the sex symbols) takes the average.
    match ch {
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        'A' => 0.652,
        'B' => 0.648,
        'C' => 0.734,
        'D' => 0.723,
        'E' => 0.594,
        'F' => 0.575,
        'G' | 'H' => 0.742,
        'I' => 0.272,
        'J' => 0.557,
        'K' => 0.648,
        'L' => 0.559,
        'M' => 0.903,
        'N' => 0.763,
        'O' => 0.754,
        'P' => 0.623,
        'Q' => 0.755,
        'R' => 0.637,
        'S' => 0.633,
        'T' => 0.599,
        'U' => 0.746,
        'V' => 0.661,
        'W' => 0.958,
        'X' => 0.655,
        'Y' => 0.646,
        'Z' => 0.621,
        'a' => 0.550,
        'b' => 0.603,
        'c' => 0.547,
        'd' => 0.609,
        'e' => 0.570,
        'f' => 0.340,
        'g' | 'h' => 0.600,
        'i' => 0.235,
        'j' => 0.227,
        'k' => 0.522,
        'l' => 0.239,
        'm' => 0.867,
        'n' => 0.585,
        'o' => 0.574,
        'p' => 0.595,
        'q' => 0.585,
        'r' => 0.364,
        's' => 0.523,
        't' => 0.305,
        'u' => 0.585,
        'v' => 0.545,
        'w' => 0.811,
        'x' => 0.538,
        'y' => 0.556,
        'z' => 0.550,
        '0' => 0.613,
        '1' => 0.396,
        '2' => 0.609,
        '3' => 0.597,
        '4' => 0.614,
        '5' => 0.586,
        '6' => 0.608,
        '7' => 0.559,
        '8' => 0.611,
        '9' => 0.595,
        '@' | '#' | '%' | '&' => 0.946,
        _ => 0.568,
    }
}
