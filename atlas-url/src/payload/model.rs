//! Typed view of the explorer's page state.
//!
//! These types serialize to the JSON shape understood by [`crate::json`],
//! with unset message fields omitted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Projection {
    WebImage,
    Cartesian,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    Single,
    DoubleVertical,
    DoubleHorizontal,
    TripleLeft,
    TripleRight,
    TripleBottom,
    TripleTop,
    Quadruple,
    QuadrupleRight,
    QuadrupleBottom,
    QuadrupleTop,
    QuadrupleLeft,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColorMode {
    Quantitative,
    Metadata,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NullColoring {
    Hide,
    Zeros,
    Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColorOption {
    None,
    Default,
    Custom,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point2d {
    pub x: f32,
    pub y: f32,
}

impl Point2d {
    pub const fn new(x: f32, y: f32) -> Point2d {
        Point2d { x, y }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Box2d {
    pub min_corner: Point2d,
    pub max_corner: Point2d,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NumericColor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamp_range: Option<Interval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invert_map: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_zeros: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_coloring: Option<NullColoring>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Camera {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<Projection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<Point2d>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Point2d>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_feature_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_bounds: Option<Box2d>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_unselected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_index: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuantitativeFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Interval>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DrawStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option: Option<ColorOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Annotation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_type_reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_in_front: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<DrawStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<DrawStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Gene {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ColorSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ColorMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_transparent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Interval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<NumericColor>,
}

/// One panel of the explorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Visualization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_collection_id: Option<String>,
    /// Superseded by `dataset_id`, still read by older explorer builds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_filters: Option<Vec<FilterCategory>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<Camera>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genes: Option<Vec<Gene>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_by: Option<ColorSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantitative_filters: Option<Vec<QuantitativeFilter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Annotation>,
}

/// The state the explorer page starts in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExplorePageInitPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<Vec<Visualization>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}
