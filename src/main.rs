use anyhow::Result;
use autopad_core::{Buttons, Controller, MockSink, StickSide, Tilt};
use autopad_cv::{MatchOptions, MatcherMode, Recognizer};
use image::{DynamicImage, GrayImage, Luma};
use log::info;
use rand::Rng;

/// Builds a noisy synthetic capture frame with a checkered sprite planted at
/// a random position, plus the matching template.
fn synthetic_scene() -> (DynamicImage, DynamicImage, (u32, u32)) {
    let mut rng = rand::thread_rng();
    let mut frame = GrayImage::from_fn(320, 180, |_, _| Luma([rng.gen_range(10..40)]));

    let sprite_x = rng.gen_range(0..320 - 16);
    let sprite_y = rng.gen_range(0..180 - 16);
    for dy in 0..16 {
        for dx in 0..16 {
            let v = if (dx / 4 + dy / 4) % 2 == 0 { 220 } else { 90 };
            frame.put_pixel(sprite_x + dx, sprite_y + dy, Luma([v]));
        }
    }

    let template = GrayImage::from_fn(16, 16, |x, y| {
        Luma([if (x / 4 + y / 4) % 2 == 0 { 220 } else { 90 }])
    });

    (
        DynamicImage::ImageLuma8(frame),
        DynamicImage::ImageLuma8(template),
        (sprite_x, sprite_y),
    )
}

fn main() -> Result<()> {
    env_logger::init();

    let (frame, template, planted_at) = synthetic_scene();

    let mut recognizer = Recognizer::new(MatcherMode::Gpu);
    info!("matcher backend: {:?}", recognizer.mode());

    let decoy = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([128])));
    let outcome = recognizer.best_of(
        &frame,
        &[decoy, template],
        &[],
        &MatchOptions::with_threshold(0.8),
    );
    println!("planted sprite at {planted_at:?}");
    println!(
        "best template: {:?}, scores: {:?}, found at: {:?}",
        outcome.best,
        outcome.values,
        outcome.best.map(|i| outcome.locations[i]),
    );

    // React the way an automation script would: press a button, tilt, send.
    let mut pad = Controller::new(MockSink::new());
    pad.state.push_buttons(Buttons::A);
    pad.send_state()?;
    pad.state.release_buttons(Buttons::A);
    pad.state
        .tilt_stick_preset(StickSide::Left, Tilt::TOP | Tilt::RIGHT);
    pad.send_state()?;
    pad.state.reset();
    pad.send_state()?;

    println!("wire traffic:");
    for line in &pad.into_sink().lines {
        print!("  {line}");
    }
    Ok(())
}
