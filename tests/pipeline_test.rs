use image::{DynamicImage, GrayImage, Luma};
use minedoc_vision::models::{Detection, LayoutModel, ModelSet, NullLayoutModel, IdentityOrientation};
use minedoc_vision::{
    BoundingBox, DocumentType, Orientation, PipelineConfig, PipelineError, Preprocessor,
    RegionType,
};
use std::io::Cursor;
use std::sync::Arc;

/// Layout model returning the same detections for every page
struct FixedLayout(Vec<Detection>);

impl LayoutModel for FixedLayout {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn predict(&self, _image: &GrayImage) -> Result<Vec<Detection>, PipelineError> {
        Ok(self.0.clone())
    }
}

fn with_layout(detections: Vec<Detection>) -> Preprocessor {
    let models = ModelSet {
        orientation: Arc::new(IdentityOrientation),
        layout: Arc::new(FixedLayout(detections)),
    };
    Preprocessor::new(PipelineConfig::default(), models)
}

fn encode_png(img: GrayImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn in_band(v: u32, bands: &[u32]) -> bool {
    bands.iter().any(|&b| (b..b + 3).contains(&v))
}

/// White 1000x1000 page with a dark 400x300 table at (300, 350) whose
/// separators are 3px bright bands: four horizontal, three vertical
fn page_with_table() -> GrayImage {
    GrayImage::from_fn(1000, 1000, |x, y| {
        let inside = (300..700).contains(&x) && (350..650).contains(&y);
        if !inside {
            return Luma([255]);
        }
        let (lx, ly) = (x - 300, y - 350);
        if in_band(ly, &[0, 100, 200, 297]) || in_band(lx, &[0, 200, 397]) {
            Luma([255])
        } else {
            Luma([50])
        }
    })
}

fn detection(bbox: BoundingBox, class_id: usize, score: f32) -> Detection {
    Detection {
        bbox,
        class_id,
        score,
    }
}

#[tokio::test]
async fn test_table_region_yields_three_by_two_grid() {
    let table_box = BoundingBox::new(300.0, 350.0, 400.0, 300.0);
    let preprocessor = with_layout(vec![detection(table_box, 1, 0.92)]);

    let analysis = preprocessor.analyze(&encode_png(page_with_table())).await.unwrap();

    assert_eq!(analysis.tables.len(), 1);
    let table = &analysis.tables[0];
    assert_eq!(table.bbox, table_box);
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.columns.len(), 2);
    assert_eq!(table.cells.len(), 6);
    assert_eq!(table.header_row_count, 1);
    assert_eq!(table.confidence, 0.92);
    assert_eq!(table.rows[0].y, 350.0);
    assert_eq!(table.columns[0].x, 300.0);

    let pre = &analysis.preprocessing;
    assert_eq!(pre.document_type, DocumentType::ComplianceForm);
    assert_eq!(pre.layout_regions.len(), 1);
    assert_eq!(pre.layout_regions[0].region_type, RegionType::Table);
}

#[tokio::test]
async fn test_regions_on_one_line_read_left_to_right() {
    let preprocessor = with_layout(vec![
        detection(BoundingBox::new(600.0, 400.0, 200.0, 50.0), 0, 0.9),
        detection(BoundingBox::new(300.0, 100.0, 200.0, 50.0), 0, 0.9),
        detection(BoundingBox::new(50.0, 115.0, 200.0, 50.0), 3, 0.9),
    ]);

    let result = preprocessor
        .preprocess(&encode_png(GrayImage::from_pixel(800, 600, Luma([240]))))
        .await
        .unwrap();

    let order: Vec<(f32, usize)> = result
        .layout_regions
        .iter()
        .map(|r| (r.bbox.x, r.reading_order))
        .collect();
    assert_eq!(order, vec![(50.0, 0), (300.0, 1), (600.0, 2)]);
    assert_eq!(result.layout_regions[0].region_type, RegionType::Header);
}

#[tokio::test]
async fn test_low_scoring_regions_are_dropped() {
    let preprocessor = with_layout(vec![
        detection(BoundingBox::new(10.0, 10.0, 100.0, 40.0), 5, 0.4),
        detection(BoundingBox::new(10.0, 80.0, 100.0, 40.0), 0, 0.8),
    ]);

    let result = preprocessor
        .preprocess(&encode_png(GrayImage::from_pixel(200, 200, Luma([230]))))
        .await
        .unwrap();

    assert_eq!(result.layout_regions.len(), 1);
    assert_eq!(result.layout_regions[0].region_type, RegionType::Text);
}

#[tokio::test]
async fn test_without_layout_model_tables_are_discovered() {
    let page = GrayImage::from_fn(600, 600, |x, y| {
        if in_band(y, &[0, 200, 400]) || in_band(x, &[0, 250, 500]) {
            Luma([255])
        } else {
            Luma([50])
        }
    });

    let analysis = Preprocessor::new(PipelineConfig::default(), ModelSet::fallback())
        .analyze(&encode_png(page))
        .await
        .unwrap();

    assert_eq!(analysis.tables.len(), 4);
    assert!(analysis.preprocessing.layout_regions.is_empty());
    assert!(analysis
        .preprocessing
        .warnings
        .iter()
        .any(|w| w.contains("layout model unavailable")));
}

#[tokio::test]
async fn test_layout_model_without_tables_extracts_nothing() {
    let preprocessor = with_layout(vec![detection(
        BoundingBox::new(0.0, 0.0, 400.0, 100.0),
        0,
        0.9,
    )]);

    let analysis = preprocessor.analyze(&encode_png(page_with_table())).await.unwrap();

    assert!(analysis.tables.is_empty());
}

#[tokio::test]
async fn test_undecodable_input_is_a_decode_error() {
    let preprocessor = Preprocessor::new(PipelineConfig::default(), ModelSet::fallback());

    let err = preprocessor.analyze(b"\x89PNG broken").await.unwrap_err();

    assert!(matches!(err, PipelineError::DecodeError(_)));
    assert_eq!(err.code(), "DECODE_ERROR");
}

#[tokio::test]
async fn test_oversized_page_is_bounded() {
    let config = PipelineConfig {
        max_image_size: 500,
        ..Default::default()
    };
    let preprocessor = Preprocessor::new(config, ModelSet::fallback());

    let result = preprocessor
        .preprocess(&encode_png(GrayImage::from_pixel(1000, 400, Luma([200]))))
        .await
        .unwrap();

    assert_eq!(result.processed_image.dimensions(), (500, 200));
    assert_eq!(result.orientation, Orientation::Deg0);
}

#[tokio::test]
async fn test_concurrent_pages_share_models() {
    let preprocessor = Preprocessor::new(
        PipelineConfig::default(),
        ModelSet {
            orientation: Arc::new(IdentityOrientation),
            layout: Arc::new(NullLayoutModel),
        },
    );
    let page = encode_png(GrayImage::from_pixel(120, 120, Luma([128])));

    let results = futures::future::try_join_all((0..4).map(|_| preprocessor.preprocess(&page)))
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert!(results
        .iter()
        .all(|r| r.document_type == DocumentType::GeneralDocument));
}

#[test]
fn test_result_serializes_without_image_data() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let analysis = runtime
        .block_on(
            Preprocessor::new(PipelineConfig::default(), ModelSet::fallback())
                .analyze(&encode_png(GrayImage::from_pixel(64, 64, Luma([255])))),
        )
        .unwrap();

    let json: serde_json::Value = serde_json::to_value(&analysis).unwrap();

    assert!(json["preprocessing"].get("processed_image").is_none());
    assert_eq!(json["preprocessing"]["orientation"], 0);
    assert_eq!(json["preprocessing"]["document_type"], "general-document");
    assert!(json["tables"].as_array().unwrap().is_empty());
}
