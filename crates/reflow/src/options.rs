//! Conversion options, loadable from a partial JSON file.

use std::path::Path;

use reflow_core::{FlowConfig, ReconcileOptions, Reconciler, ReflowError};
use reflow_parse::StandardFont;
use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Stage, StageExt};

/// Every tunable of a conversion. Missing JSON fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Standard font used when paginating to PDF.
    pub font: String,
    pub font_size: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    /// Extra vertical gap between flowed lines, in points.
    pub line_spacing: f64,
    /// Line spacing multiplier written on reconstructed paragraphs.
    pub paragraph_line_spacing: f64,
    pub reconcile: ReconcileOptions,
    /// Added to every extracted image's y coordinate.
    pub page_origin_offset: f64,
    pub page_width: f64,
    pub page_height: f64,
    /// Joins table cells when a table is flattened to a line.
    pub cell_separator: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            font: "Helvetica".to_string(),
            font_size: 12.0,
            margin_top: 72.0,
            margin_bottom: 72.0,
            margin_left: 72.0,
            margin_right: 72.0,
            line_spacing: 3.0,
            paragraph_line_spacing: 1.5,
            reconcile: ReconcileOptions::default(),
            page_origin_offset: 0.0,
            page_width: 612.0,
            page_height: 792.0,
            cell_separator: "\t".to_string(),
        }
    }
}

impl ConvertOptions {
    pub fn from_json_str(json: &str) -> Result<Self, ConvertError> {
        serde_json::from_str(json).at(Stage::Input)
    }

    /// Load options from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::new(
                Stage::Input,
                ReflowError::InvalidInput(format!("cannot read {}: {e}", path.display())),
            )
        })?;
        Self::from_json_str(&json)
    }

    /// Set all four margins at once.
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin_top = margin;
        self.margin_bottom = margin;
        self.margin_left = margin;
        self.margin_right = margin;
        self
    }

    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig {
            page_width: self.page_width,
            page_height: self.page_height,
            margin_top: self.margin_top,
            margin_bottom: self.margin_bottom,
            margin_left: self.margin_left,
            margin_right: self.margin_right,
            font_size: self.font_size,
            line_spacing: self.line_spacing,
        }
    }

    pub fn standard_font(&self) -> Result<StandardFont, ReflowError> {
        StandardFont::from_name(&self.font).ok_or_else(|| {
            ReflowError::InvalidInput(format!("unknown standard font {:?}", self.font))
        })
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.reconcile).with_line_spacing(self.paragraph_line_spacing)
    }
}
