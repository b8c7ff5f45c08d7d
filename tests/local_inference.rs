use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use acne_severity::dispatch::load_severity_model;
use acne_severity::{
    upload_image, ActivationFunction, ClassifyError, Dense, ImageSource, Layer, LocalClassifier,
    Matrix, ModelError, ModelMetadata, ModelSlot, ModelSource, Network, NotReadyReason,
    Prediction, SeverityLevel,
};
use acne_severity::network::save_bundle;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

/// Averages each channel, then scores the four levels from the channel
/// means: red favours level 0, green level 1, blue level 2, and a small bias
/// makes level 3 win on a black image.
fn channel_model(classes: usize) -> Network {
    let mut kernel = vec![vec![0.0; classes]; 3];
    for (c, row) in kernel.iter_mut().enumerate() {
        if c < classes {
            row[c] = 4.0;
        }
    }
    let mut bias = vec![0.0; classes];
    bias[classes - 1] = 0.5;
    let dense = Dense::new(Matrix::from_data(kernel), bias, ActivationFunction::Softmax).unwrap();
    Network::new(
        "channel-probe",
        [224, 224, 3],
        vec![Layer::GlobalAveragePooling2D, Layer::Dense(dense)],
        ModelMetadata::default(),
    )
    .unwrap()
}

fn solid_png(color: [u8; 3]) -> ImageSource {
    let img = RgbImage::from_pixel(10, 10, Rgb(color));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    upload_image(bytes, "image/png").unwrap()
}

async fn loaded_slot(dir: &Path) -> Arc<ModelSlot> {
    let slot = Arc::new(ModelSlot::new());
    let source = ModelSource::Directory(dir.to_path_buf());
    let client = reqwest::Client::new();
    slot.load_once(|| load_severity_model(&source, &client)).await.unwrap();
    slot
}

#[tokio::test]
async fn solid_colours_map_to_fixed_levels() {
    let dir = tempfile::tempdir().unwrap();
    save_bundle(&channel_model(4), dir.path()).unwrap();
    let classifier = LocalClassifier::new(loaded_slot(dir.path()).await);

    let cases = [
        ([0, 0, 0], SeverityLevel::Severe),
        ([255, 0, 0], SeverityLevel::ExtremelyMild),
        ([0, 255, 0], SeverityLevel::Mild),
        ([0, 0, 255], SeverityLevel::Moderate),
    ];
    for (color, expected) in cases {
        let result = classifier.classify(Some(&solid_png(color))).await.unwrap();
        assert_eq!(result.prediction, Prediction::Class(expected), "{:?}", color);
        let scores = result.scores.expect("local results carry scores");
        assert_eq!(scores.len(), SeverityLevel::COUNT);
        assert!((scores.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn classify_before_load_reports_loading() {
    let classifier = LocalClassifier::new(Arc::new(ModelSlot::new()));
    let err = classifier.classify(Some(&solid_png([10, 10, 10]))).await.unwrap_err();
    assert!(matches!(err, ClassifyError::NotReady(NotReadyReason::ModelLoading)));
}

#[tokio::test]
async fn model_is_required_before_image() {
    let classifier = LocalClassifier::new(Arc::new(ModelSlot::new()));
    let err = classifier.classify(None).await.unwrap_err();
    assert!(matches!(err, ClassifyError::NotReady(NotReadyReason::ModelLoading)));
}

#[tokio::test]
async fn missing_image_with_ready_model() {
    let dir = tempfile::tempdir().unwrap();
    save_bundle(&channel_model(4), dir.path()).unwrap();
    let classifier = LocalClassifier::new(loaded_slot(dir.path()).await);
    let err = classifier.classify(None).await.unwrap_err();
    assert!(matches!(err, ClassifyError::NotReady(NotReadyReason::NoImage)));
}

#[tokio::test]
async fn wrong_output_width_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    save_bundle(&channel_model(3), dir.path()).unwrap();
    let source = ModelSource::Directory(dir.path().to_path_buf());
    let err = load_severity_model(&source, &reqwest::Client::new()).await.unwrap_err();
    assert!(matches!(err, ModelError::Topology(_)), "{:?}", err);
}

#[tokio::test]
async fn missing_bundle_leaves_model_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let source = ModelSource::Directory(dir.path().join("nowhere"));
    let client = reqwest::Client::new();
    let slot = Arc::new(ModelSlot::new());
    assert!(slot.load_once(|| load_severity_model(&source, &client)).await.is_err());

    let classifier = LocalClassifier::new(slot);
    let err = classifier.classify(Some(&solid_png([0, 0, 0]))).await.unwrap_err();
    assert!(matches!(err, ClassifyError::NotReady(NotReadyReason::ModelUnavailable)));
}

#[tokio::test]
async fn undecodable_upload_fails_preprocessing() {
    let dir = tempfile::tempdir().unwrap();
    save_bundle(&channel_model(4), dir.path()).unwrap();
    let classifier = LocalClassifier::new(loaded_slot(dir.path()).await);

    let garbage = upload_image(b"not really a png".to_vec(), "image/png").unwrap();
    let err = classifier.classify(Some(&garbage)).await.unwrap_err();
    assert!(matches!(err, ClassifyError::Preprocess(_)), "{:?}", err);
}

#[tokio::test]
async fn overflowing_manifest_marks_model_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = r#"{
        "format": "layers-model",
        "name": "corrupt",
        "input_shape": [224, 224, 3],
        "layers": [
            {"type": "global_average_pooling2d"},
            {"type": "dense", "units": 4, "activation": "Softmax"}
        ],
        "weights_manifest": [
            {"paths": ["group1-shard1of1.bin"],
             "weights": [{"name": "dense/kernel", "shape": [4294967296, 4294967296, 4]},
                         {"name": "dense/bias", "shape": [4]}]}
        ]
    }"#;
    std::fs::write(dir.path().join("model.json"), manifest).unwrap();
    std::fs::write(dir.path().join("group1-shard1of1.bin"), [0u8; 16]).unwrap();

    let slot = Arc::new(ModelSlot::new());
    let task = {
        let slot = slot.clone();
        let source = ModelSource::Directory(dir.path().to_path_buf());
        tokio::spawn(async move {
            let client = reqwest::Client::new();
            slot.load_once(|| load_severity_model(&source, &client)).await
        })
    };
    let loaded = task.await.expect("loading a corrupt manifest must not panic");
    assert!(matches!(loaded, Err(ClassifyError::NotReady(NotReadyReason::ModelUnavailable))));

    let classifier = LocalClassifier::new(slot);
    let err = classifier.classify(Some(&solid_png([0, 0, 0]))).await.unwrap_err();
    assert!(matches!(err, ClassifyError::NotReady(NotReadyReason::ModelUnavailable)));
}
