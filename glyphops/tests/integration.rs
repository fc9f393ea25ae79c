//! Integration tests for glyphops CLI.

use clap::Parser;
use glyphops::cli::{Cli, run_cli};

/// Local model export with `model.onnx` trained on the default alphabet.
const MODEL_DIR_ENV: &str = "GLYPHOPS_TEST_MODEL";

#[test]
#[ignore = "exported recognition model required"]
fn rec_recognizes_and_logs() {
    let model_dir = std::env::var(MODEL_DIR_ENV).expect("model dir env var not set");
    let temp_dir = std::env::temp_dir().join("glyphops-test");

    // Clean up previous test run
    if temp_dir.exists() {
        std::fs::remove_dir_all(&temp_dir).ok();
    }
    std::fs::create_dir_all(&temp_dir).expect("failed to create temp dir");

    let image = image::GrayImage::from_pixel(100, 32, image::Luma([255u8]));
    image
        .save(temp_dir.join("blank.png"))
        .expect("failed to write image");

    let log = temp_dir.join("log_demo_result.txt");

    let cli = Cli::parse_from([
        "glyph",
        "rec",
        temp_dir.to_str().unwrap(),
        "-m",
        &model_dir,
        "--model-source",
        "path",
        "--log",
        log.to_str().unwrap(),
    ]);

    run_cli(cli).expect("failed to recognize");

    let report = std::fs::read_to_string(&log).expect("log not written");
    assert!(report.starts_with(&"-".repeat(80)));
    assert!(report.contains("blank.png"));
}

#[test]
fn missing_image_folder_fails() {
    let cli = Cli::parse_from([
        "glyph",
        "rec",
        "/nonexistent/glyphops/images",
        "-m",
        "model_dir",
        "--model-source",
        "path",
    ]);

    assert!(run_cli(cli).is_err());
}
