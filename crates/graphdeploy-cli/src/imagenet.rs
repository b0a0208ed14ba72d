//! Demo helpers for the ImageNet classification variant: image
//! preprocessing into the model's input layout, the label CSV, top-k.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array;

use graphdeploy_core::{Shape, Tensor};

pub const IMAGE_SIZE: usize = 224;
/// Per-channel RGB mean and common scale of the demo preprocessing.
pub const MEAN: [f32; 3] = [120.45, 115.74, 104.65];
pub const SCALE: f32 = 127.5;

/// Resizes to 224x224 RGB and normalizes into a NCHW f32 tensor.
pub fn preprocess(img: &DynamicImage) -> Result<Tensor> {
    let rgb = img
        .resize_exact(IMAGE_SIZE as u32, IMAGE_SIZE as u32, FilterType::Nearest)
        .to_rgb8();
    let planes = Array::from_shape_fn((1, 3, IMAGE_SIZE, IMAGE_SIZE), |(_, c, y, x)| {
        let pixel = rgb.get_pixel(x as u32, y as u32);
        (pixel[c] as f32 - MEAN[c]) / SCALE
    });
    Tensor::from_f32(
        Shape::from_slice(&[1, 3, IMAGE_SIZE, IMAGE_SIZE]),
        planes.into_raw_vec().as_slice(),
    )
}

/// Reads the `index,label` CSV derived during fetch into a dense table.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_label_csv(&raw)
}

pub fn parse_label_csv(raw: &str) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (index, label) = line
            .split_once(',')
            .with_context(|| format!("malformed label row `{line}`"))?;
        let index: usize = index
            .trim()
            .parse()
            .with_context(|| format!("bad class index in `{line}`"))?;
        entries.push((index, unquote_csv(label)));
    }
    ensure!(!entries.is_empty(), "label table is empty");

    let len = entries.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
    let mut labels = vec![String::new(); len];
    for (index, label) in entries {
        labels[index] = label;
    }
    Ok(labels)
}

fn unquote_csv(field: &str) -> String {
    let field = field.trim();
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        field[1..field.len() - 1].replace("\"\"", "\"")
    } else {
        field.to_string()
    }
}

/// Indices of the k largest logits, best first.
pub fn top_k(logits: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = logits.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphdeploy_compiler::fetch::derive_label_csv;
    use image::RgbImage;

    #[test]
    fn preprocess_layout_and_normalization() {
        // A solid-color image survives nearest-neighbor resizing unchanged,
        // so every element of a channel plane carries one known value.
        let solid = RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 120]));
        let tensor = preprocess(&DynamicImage::ImageRgb8(solid)).unwrap();
        assert_eq!(tensor.desc.shape, Shape::from_slice(&[1, 3, 224, 224]));

        let data = tensor.to_f32().unwrap();
        assert_eq!(data.len(), 3 * 224 * 224);
        let plane = 224 * 224;
        let expected = [
            (255.0 - MEAN[0]) / SCALE,
            (0.0 - MEAN[1]) / SCALE,
            (120.0 - MEAN[2]) / SCALE,
        ];
        for c in 0..3 {
            assert!((data[c * plane] - expected[c]).abs() < 1e-6);
            assert!((data[c * plane + plane - 1] - expected[c]).abs() < 1e-6);
        }
    }

    #[test]
    fn label_csv_roundtrip() {
        let entries = vec![
            (0, "tench, Tinca tinca".to_string()),
            (1, "goldfish".to_string()),
            (2, "a \"quoted\" label".to_string()),
        ];
        let labels = parse_label_csv(&derive_label_csv(&entries)).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0], "tench, Tinca tinca");
        assert_eq!(labels[1], "goldfish");
        assert_eq!(labels[2], "a \"quoted\" label");
    }

    #[test]
    fn top_k_orders_and_truncates() {
        let logits = [0.1f32, 0.9, 0.3, 0.7];
        let top = top_k(&logits, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, 1);
        assert_eq!(top[1].0, 3);

        // k beyond the class count returns everything.
        assert_eq!(top_k(&logits, 10).len(), 4);
    }
}
