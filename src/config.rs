use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// Alternating barycenter rounds before the settling pass.
    pub passes: usize,
    /// Barycenter weight of block members that are not the block's own
    /// spanning-tree child (marry-in partners).
    pub partner_weight: f32,
    /// Blocks larger than this skip the partner path search.
    pub path_search_limit: usize,
    pub swap_refinement: bool,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            passes: 4,
            partner_weight: 0.3,
            path_search_limit: 10,
            swap_refinement: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Vertical offset between child bars sharing a generation pair.
    pub bar_stagger: f32,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self { bar_stagger: 10.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_height: f32,
    pub min_node_width: f32,
    pub h_gap: f32,
    pub v_gap: f32,
    pub spouse_gap: f32,
    pub margin: f32,
    pub label_font_size: f32,
    pub label_font_family: String,
    pub text_padding: f32,
    pub photo_padding: f32,
    pub uniform_node_width: bool,
    pub fast_text_metrics: bool,
    pub ordering: OrderingConfig,
    pub connectors: ConnectorConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_height: 60.0,
            min_node_width: 210.0,
            h_gap: 40.0,
            v_gap: 80.0,
            spouse_gap: 20.0,
            margin: 30.0,
            label_font_size: 14.0,
            label_font_family: "sans-serif".to_string(),
            text_padding: 30.0,
            photo_padding: 80.0,
            uniform_node_width: true,
            fast_text_metrics: true,
            ordering: OrderingConfig::default(),
            connectors: ConnectorConfig::default(),
        }
    }
}

impl LayoutConfig {
    /// Distance between the centres of two adjacent generation rows.
    pub fn row_pitch(&self) -> f32 {
        self.node_height + self.v_gap
    }

    pub fn row_center(&self, generation: usize) -> f32 {
        generation as f32 * self.row_pitch() + self.node_height / 2.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderingConfigFile {
    passes: Option<usize>,
    partner_weight: Option<f32>,
    path_search_limit: Option<usize>,
    swap_refinement: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectorConfigFile {
    bar_stagger: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    node_height: Option<f32>,
    min_node_width: Option<f32>,
    h_gap: Option<f32>,
    v_gap: Option<f32>,
    spouse_gap: Option<f32>,
    margin: Option<f32>,
    font_size: Option<f32>,
    font_family: Option<String>,
    text_padding: Option<f32>,
    photo_padding: Option<f32>,
    uniform_node_width: Option<bool>,
    fast_text_metrics: Option<bool>,
    ordering: Option<OrderingConfigFile>,
    connectors: Option<ConnectorConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    let layout = &mut config.layout;

    if let Some(v) = parsed.node_height {
        layout.node_height = v;
    }
    if let Some(v) = parsed.min_node_width {
        layout.min_node_width = v;
    }
    if let Some(v) = parsed.h_gap {
        layout.h_gap = v;
    }
    if let Some(v) = parsed.v_gap {
        layout.v_gap = v;
    }
    if let Some(v) = parsed.spouse_gap {
        layout.spouse_gap = v;
    }
    if let Some(v) = parsed.margin {
        layout.margin = v;
    }
    if let Some(v) = parsed.font_size {
        layout.label_font_size = v;
    }
    if let Some(v) = parsed.font_family {
        layout.label_font_family = v;
    }
    if let Some(v) = parsed.text_padding {
        layout.text_padding = v;
    }
    if let Some(v) = parsed.photo_padding {
        layout.photo_padding = v;
    }
    if let Some(v) = parsed.uniform_node_width {
        layout.uniform_node_width = v;
    }
    if let Some(v) = parsed.fast_text_metrics {
        layout.fast_text_metrics = v;
    }

    if let Some(ordering) = parsed.ordering {
        if let Some(v) = ordering.passes {
            layout.ordering.passes = v;
        }
        if let Some(v) = ordering.partner_weight {
            layout.ordering.partner_weight = v;
        }
        if let Some(v) = ordering.path_search_limit {
            layout.ordering.path_search_limit = v;
        }
        if let Some(v) = ordering.swap_refinement {
            layout.ordering.swap_refinement = v;
        }
    }

    if let Some(connectors) = parsed.connectors
        && let Some(v) = connectors.bar_stagger
    {
        layout.connectors.bar_stagger = v;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.node_height, 60.0);
        assert_eq!(config.layout.ordering.passes, 4);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = parse_config(
            r#"{"hGap": 12, "fontFamily": "Inter", "ordering": {"partnerWeight": 0.5},
                "connectors": {"barStagger": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.layout.h_gap, 12.0);
        assert_eq!(config.layout.v_gap, 80.0);
        assert_eq!(config.layout.label_font_family, "Inter");
        assert_eq!(config.layout.ordering.partner_weight, 0.5);
        assert_eq!(config.layout.ordering.passes, 4);
        assert_eq!(config.layout.connectors.bar_stagger, 4.0);
    }

    #[test]
    fn row_center_follows_pitch() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.row_center(0), 30.0);
        assert_eq!(layout.row_center(2), 310.0);
    }
}
