//! Explorer frames for a single cell-type annotation.

use super::model::{
    Annotation, Box2d, Camera, ColorMode, ColorOption, ColorSettings, DrawStyle,
    ExplorePageInitPayload, FilterCategory, Gene, Layout, Point2d, Projection, Visualization,
};

const PROJECT_ID: &str = "POZ2HCPBT60DSDJ8UA7";
const GRID_FEATURE_ID: &str = "WMP8NMJ5D8XO1AOI1L9";
const CELL_TYPE_FEATURE_ID: &str = "CREHRCK2YXRWJK2J0AL";

/// Metadata categories that can be filtered on, keyed by labelset, in the
/// order the explorer lists them.
pub const METADATA_CATEGORIES: [(&str, &str); 5] = [
    ("Neighborhood", "E3HGBYHRC98GA6FW9F6"),
    ("Class", "3XBOFBR302EYC0UQD51"),
    ("Subclass", "SQ6WJO0GNUJGFU8LHVV"),
    ("Group", "HK14O1ASANPYHONFLLQ"),
    ("Cluster", "6EWBSEJ4YFVGKI2APBL"),
];

/// A cell-type annotation to highlight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellAnnotation {
    /// Taxonomy level of the annotation, such as `Subclass`.
    pub labelset: String,
    pub cell_label: String,
}

impl CellAnnotation {
    pub fn new(labelset: impl Into<String>, cell_label: impl Into<String>) -> CellAnnotation {
        CellAnnotation {
            labelset: labelset.into(),
            cell_label: cell_label.into(),
        }
    }
}

struct SlideGrid {
    feature_id: &'static str,
    bounds: Box2d,
}

struct FrameTemplate {
    data_collection_id: &'static str,
    plot_id: &'static str,
    visualization_id: &'static str,
    annotation_reference_id: &'static str,
    annotation_feature_type_id: &'static str,
    projection: Projection,
    center: Point2d,
    size: Point2d,
    grid: Option<SlideGrid>,
    /// Whether the camera sets `hideUnselected` and `offsetIndex` explicitly.
    explicit_offset: bool,
}

const fn bounds(min: (f32, f32), max: (f32, f32)) -> Box2d {
    Box2d {
        min_corner: Point2d::new(min.0, min.1),
        max_corner: Point2d::new(max.0, max.1),
    }
}

/// The four panels of the page: whole-brain scRNA-seq followed by the three
/// MERFISH species.
const TEMPLATES: [FrameTemplate; 4] = [
    FrameTemplate {
        data_collection_id: "NXJ9NZAQA5MEHQNOWJQ",
        plot_id: "TGBQ2FEV27N0CPLKVAZ",
        visualization_id: "IA6Y6SN7QZSIEJ0FZ0U",
        annotation_reference_id: "7416B5XJDSY0HDF93RO",
        annotation_feature_type_id: CELL_TYPE_FEATURE_ID,
        projection: Projection::WebImage,
        center: Point2d::new(51.15907669067383, 48.792232513427734),
        size: Point2d::new(127.61137390136719, 81.34007263183594),
        grid: Some(SlideGrid {
            feature_id: GRID_FEATURE_ID,
            bounds: bounds(
                (19.089702606201172, 10.058863639831543),
                (28.25238037109375, 21.12554168701172),
            ),
        }),
        explicit_offset: false,
    },
    FrameTemplate {
        data_collection_id: "VM4E6J9DPYYD7E0BHNB",
        plot_id: "KGZLAWIPCR4W98F5LD6",
        visualization_id: "9AUTE9S10KAEC2UZO31",
        annotation_reference_id: "Y3P1JM1ENCGWEW8USTV",
        annotation_feature_type_id: CELL_TYPE_FEATURE_ID,
        projection: Projection::WebImage,
        center: Point2d::new(98.08788299560547, 71.96050262451172),
        size: Point2d::new(167.3242950439453, 106.65327453613281),
        grid: Some(SlideGrid {
            feature_id: GRID_FEATURE_ID,
            bounds: bounds(
                (34.845741271972656, 21.173229217529297),
                (55.926456451416016, 41.488136291503906),
            ),
        }),
        explicit_offset: true,
    },
    FrameTemplate {
        data_collection_id: "3CPIP2804SBDX1DX1RW",
        plot_id: "S5KQTFHCRKHVZVRR5HR",
        visualization_id: "HZEYXSQOEDND2Q6M97M",
        annotation_reference_id: "6T96260126TV4KLGDXG",
        annotation_feature_type_id: CELL_TYPE_FEATURE_ID,
        projection: Projection::WebImage,
        center: Point2d::new(97.7215805053711, 144.1280975341797),
        size: Point2d::new(306.3804931640625, 195.288330078125),
        grid: Some(SlideGrid {
            feature_id: GRID_FEATURE_ID,
            bounds: bounds(
                (7.681753158569336, 51.13364791870117),
                (43.69768142700195, 97.63086700439453),
            ),
        }),
        explicit_offset: true,
    },
    FrameTemplate {
        data_collection_id: "EIUALPYNGZ5VU7Y2Y02",
        plot_id: "QZQ2QBMU4T5I47D1K4F",
        visualization_id: "FTLAUOV6SLB071SVNU9",
        // This species has no annotation layer.
        annotation_reference_id: "none",
        annotation_feature_type_id: "none",
        projection: Projection::Cartesian,
        center: Point2d::new(5.4347004890441895, 4.979799270629883),
        size: Point2d::new(44.858089447021484, 28.59275245666504),
        grid: None,
        explicit_offset: false,
    },
];

fn draw_style(option: ColorOption) -> DrawStyle {
    DrawStyle {
        option: Some(option),
        color: Some("#000000".to_owned()),
        opacity: Some(100),
    }
}

impl FrameTemplate {
    fn camera(&self) -> Camera {
        Camera {
            projection: Some(self.projection),
            center: Some(self.center),
            size: Some(self.size),
            grid_feature_id: self.grid.as_ref().map(|grid| grid.feature_id.to_owned()),
            slide_bounds: self.grid.as_ref().map(|grid| grid.bounds),
            hide_unselected: self.explicit_offset.then_some(false),
            offset_index: self.explicit_offset.then_some(0),
        }
    }

    fn instantiate(&self, annotation: &CellAnnotation, genes: &[String]) -> Visualization {
        let (metadata_filters, category_id) = metadata_filters(annotation);

        Visualization {
            data_collection_id: Some(self.data_collection_id.to_owned()),
            plot_id: Some(self.plot_id.to_owned()),
            metadata_filters: Some(metadata_filters),
            camera: Some(self.camera()),
            genes: Some(
                genes
                    .iter()
                    .map(|symbol| Gene {
                        symbol: Some(symbol.clone()),
                    })
                    .collect(),
            ),
            color_by: Some(ColorSettings {
                mode: Some(ColorMode::Metadata),
                value: category_id.map(str::to_owned),
                transparency: Some(0.5),
                is_transparent: Some(false),
                ..ColorSettings::default()
            }),
            dataset_id: None,
            visualization_id: Some(self.visualization_id.to_owned()),
            project_id: Some(PROJECT_ID.to_owned()),
            quantitative_filters: Some(Vec::new()),
            annotation: Some(Annotation {
                reference_id: Some(self.annotation_reference_id.to_owned()),
                feature_type_reference_id: Some(self.annotation_feature_type_id.to_owned()),
                is_in_front: Some(true),
                fill: Some(draw_style(ColorOption::None)),
                stroke: Some(draw_style(ColorOption::Default)),
            }),
        }
    }
}

/// One filter per metadata category, with the annotation's cell label
/// selected in the category matching its labelset.
///
/// Also returns the id of that category, which the frames are coloured by.
/// Annotations from other labelsets select nothing.
pub fn metadata_filters(annotation: &CellAnnotation) -> (Vec<FilterCategory>, Option<&'static str>) {
    let mut selected_category = None;
    let filters = METADATA_CATEGORIES
        .iter()
        .map(|(labelset, category_id)| {
            let mut selected_values = Vec::new();
            if *labelset == annotation.labelset {
                selected_values.push(annotation.cell_label.clone());
                selected_category = Some(*category_id);
            }
            FilterCategory {
                category_id: Some((*category_id).to_owned()),
                selected_values: Some(selected_values),
            }
        })
        .collect();

    (filters, selected_category)
}

/// The page state highlighting `annotation`, with `genes` as gene filters.
pub fn create_payload(annotation: &CellAnnotation, genes: &[String]) -> ExplorePageInitPayload {
    ExplorePageInitPayload {
        frames: Some(
            TEMPLATES
                .iter()
                .map(|template| template.instantiate(annotation, genes))
                .collect(),
        ),
        layout: Some(Layout::Quadruple),
    }
}
