// tests/core_tests.rs
//
// End-to-end flow: recognize a sprite in a synthetic frame, drive the
// controller from the verdict, and check the wire traffic.

use autopad_core::{Buttons, Controller, Hat, MockSink, StickSide, Tilt};
use autopad_cv::{ColorStage, CropSpec, MatchOptions, MatcherMode, PreprocessConfig, Recognizer};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

fn frame_with_sprite(x0: u32, y0: u32) -> DynamicImage {
    let mut frame = RgbImage::from_pixel(160, 90, Rgb([30, 30, 60]));
    for dy in 0..12 {
        for dx in 0..12 {
            let v = if (dx / 3 + dy / 3) % 2 == 0 { 240 } else { 60 };
            frame.put_pixel(x0 + dx, y0 + dy, Rgb([v, v, v]));
        }
    }
    DynamicImage::ImageRgb8(frame)
}

fn sprite_template() -> DynamicImage {
    let tpl = GrayImage::from_fn(12, 12, |x, y| {
        Luma([if (x / 3 + y / 3) % 2 == 0 { 240 } else { 60 }])
    });
    DynamicImage::ImageLuma8(tpl)
}

#[test]
fn recognize_then_react() {
    let frame = frame_with_sprite(100, 40);
    let mut recognizer = Recognizer::new(MatcherMode::Cpu);

    let result = recognizer
        .contains_template(
            &frame,
            &sprite_template(),
            None,
            &MatchOptions::with_threshold(0.9),
        )
        .expect("matcher was ready");
    assert!(result.contains);
    assert_eq!(result.location, (100, 40));

    // Sprite found: press A, nudge the stick toward it, release, neutral.
    let mut pad = Controller::new(MockSink::new());
    pad.state.push_buttons(Buttons::A);
    pad.state.tilt_stick_preset(StickSide::Left, Tilt::RIGHT);
    pad.send_state().unwrap();
    pad.state.release_buttons(Buttons::A);
    pad.state.negate_stick_tilt(StickSide::Left, Tilt::RIGHT);
    pad.send_state().unwrap();
    pad.send_state().unwrap();

    let lines = pad.into_sink().lines;
    assert_eq!(
        lines,
        vec![
            // A pressed, left stick dirty at full right.
            "0x0006 8 ff 7f\r\n",
            // Released and recentered: stick dirty again at center.
            "0x0002 8 80 7f\r\n",
            // Nothing changed since: header only.
            "0x0000 8\r\n",
        ]
    );
}

#[test]
fn cropped_recognition_matches_script_conventions() {
    let frame = frame_with_sprite(100, 40);
    let mut recognizer = Recognizer::new(MatcherMode::Cpu);

    // Row-major script crop [y0, y1, x0, x1] around the sprite.
    let options = MatchOptions {
        threshold: 0.9,
        preprocess: PreprocessConfig {
            crop: Some(CropSpec {
                format: 13,
                values: [30, 70, 90, 130],
            }),
            stage: ColorStage::Grayscale,
            binarize_threshold: None,
        },
        template_crop: None,
    };
    let result = recognizer
        .contains_template(&frame, &sprite_template(), None, &options)
        .unwrap();
    assert!(result.contains);
    assert_eq!(result.location, (10, 10));
}

#[test]
fn multi_template_selection_drives_branching() {
    let frame = frame_with_sprite(20, 20);
    let mut recognizer = Recognizer::new(MatcherMode::Cpu);

    let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(12, 12, Luma([128])));
    let outcome = recognizer.best_of(
        &frame,
        &[blank, sprite_template()],
        &[],
        &MatchOptions::with_threshold(0.8),
    );
    assert!(outcome.is_valid());
    assert_eq!(outcome.best, Some(1));
    assert!(outcome.passed[1]);
    assert!(!outcome.passed[0]);

    // The automation loop branches on the selected index.
    let mut pad = Controller::new(MockSink::new());
    match outcome.best {
        Some(1) => pad.state.push_buttons(Buttons::A),
        _ => pad.state.set_hat(Hat::Bottom),
    }
    pad.send_state().unwrap();
    assert_eq!(pad.into_sink().lines, vec!["0x0004 8\r\n"]);
}

#[test]
fn recognizer_reports_backend_mode() {
    // CPU is always available; a GPU request must never fail outright.
    let cpu = Recognizer::new(MatcherMode::Cpu);
    assert_eq!(cpu.mode(), MatcherMode::Cpu);

    let maybe_gpu = Recognizer::new(MatcherMode::Gpu);
    assert!(matches!(
        maybe_gpu.mode(),
        MatcherMode::Cpu | MatcherMode::Gpu
    ));
}
