// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Detector post-processing and recognizer preprocessing, no models needed

use image::{Rgb, RgbImage};
use persona_render::faces::detection::{self, non_max_suppression, Detection};
use persona_render::faces::recognition::{self, crop_face, l2_normalize};
use persona_render::faces::FaceBox;

fn det(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Detection {
    Detection {
        bbox: FaceBox { x1, y1, x2, y2 },
        score,
    }
}

#[test]
fn test_group_photo_order_is_deterministic() {
    // Three separate faces plus a duplicate box around the middle one
    let candidates = vec![
        det(200.0, 40.0, 260.0, 110.0, 0.88),
        det(20.0, 40.0, 80.0, 110.0, 0.97),
        det(110.0, 40.0, 170.0, 110.0, 0.97),
        det(112.0, 42.0, 171.0, 111.0, 0.93),
    ];

    let first = non_max_suppression(candidates.clone(), 0.3);
    let mut reversed = candidates;
    reversed.reverse();
    let second = non_max_suppression(reversed, 0.3);

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(first[0].bbox.x1, 20.0);
    assert_eq!(first[1].bbox.x1, 110.0);
    assert_eq!(first[2].score, 0.88);
}

#[test]
fn test_loose_iou_keeps_overlapping_faces() {
    let candidates = vec![
        det(0.0, 0.0, 10.0, 10.0, 0.9),
        det(5.0, 0.0, 15.0, 10.0, 0.8),
    ];
    // IoU of these boxes is 1/3
    assert_eq!(non_max_suppression(candidates.clone(), 0.5).len(), 2);
    assert_eq!(non_max_suppression(candidates, 0.3).len(), 1);
}

#[test]
fn test_detector_input_shape_for_portrait_photo() {
    let photo = RgbImage::from_pixel(480, 640, Rgb([30, 60, 90]));
    let tensor = detection::preprocess(&photo);
    assert_eq!(
        tensor.shape(),
        &[
            1,
            3,
            detection::DETECTION_INPUT_HEIGHT as usize,
            detection::DETECTION_INPUT_WIDTH as usize
        ]
    );
}

#[test]
fn test_face_crop_feeds_recognizer() {
    let photo = RgbImage::from_pixel(640, 480, Rgb([200, 150, 100]));
    let bbox = FaceBox {
        x1: 300.0,
        y1: 100.0,
        x2: 380.0,
        y2: 210.0,
    };

    let crop = crop_face(&photo, &bbox).unwrap();
    let tensor = recognition::preprocess(&crop);

    let side = recognition::RECOGNITION_INPUT_SIZE as usize;
    assert_eq!(tensor.shape(), &[1, 3, side, side]);
    assert!(tensor.iter().all(|v| (-1.0..=1.0).contains(v)));
}

#[test]
fn test_normalized_embedding_has_unit_length() {
    let mut embedding: Vec<f32> = (1..=512).map(|i| i as f32 * 0.01).collect();
    l2_normalize(&mut embedding);
    let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4);
    assert_eq!(embedding.len(), 512);
}
