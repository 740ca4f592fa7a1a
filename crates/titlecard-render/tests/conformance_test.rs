use titlecard_core::{RawOptions, RenderConfig};
use titlecard_render::TitleCardPipeline;

/// Helper to render a config and return its content hash hex string.
fn run_conformance_test(config: &RenderConfig) -> String {
    let pipeline = TitleCardPipeline::new(config).expect("fonts should load");
    let result = pipeline
        .render(config)
        .expect("render should succeed in conformance test");
    result.hash.to_hex()
}

fn base_options(title: &str) -> RawOptions {
    RawOptions {
        size: Some("320x180".into()),
        seed: Some(1234),
        ..RawOptions::with_title(title)
    }
}

fn resolve(opts: RawOptions) -> RenderConfig {
    opts.resolve().expect("options should resolve")
}

#[test]
fn test_conformance_01_plain_title_is_stable() {
    let cfg = resolve(base_options("Invincible"));
    assert_eq!(run_conformance_test(&cfg), run_conformance_test(&cfg));
}

#[test]
fn test_conformance_02_each_effect_is_stable() {
    for effect in ["none", "glitch", "distort", "shadow"] {
        let cfg = resolve(RawOptions {
            effect: Some(effect.into()),
            ..base_options("Invincible")
        });
        assert_eq!(
            run_conformance_test(&cfg),
            run_conformance_test(&cfg),
            "effect {} is not deterministic",
            effect
        );
    }
}

#[test]
fn test_conformance_03_effects_change_output() {
    let plain = run_conformance_test(&resolve(base_options("Invincible")));
    for effect in ["glitch", "distort", "shadow"] {
        let cfg = resolve(RawOptions {
            effect: Some(effect.into()),
            ..base_options("Invincible")
        });
        assert_ne!(run_conformance_test(&cfg), plain, "effect {} had no visible result", effect);
    }
}

#[test]
fn test_conformance_04_outline_and_credits_change_output() {
    let plain = run_conformance_test(&resolve(base_options("Invincible")));
    let outlined = run_conformance_test(&resolve(RawOptions {
        outline: Some(3),
        ..base_options("Invincible")
    }));
    let credited = run_conformance_test(&resolve(RawOptions {
        show_credits: Some(true),
        ..base_options("Invincible")
    }));
    assert_ne!(plain, outlined);
    assert_ne!(plain, credited);
}

#[test]
fn test_conformance_05_long_title_fits() {
    let cfg = resolve(base_options("INVINCIBLE: THE COMPLETE SAGA"));
    let pipeline = TitleCardPipeline::new(&cfg).unwrap();
    let out = pipeline.render(&cfg).unwrap();
    let margin = (320.0 * 0.05_f64).round() as i32;

    assert!(out.layout.font_size < cfg.title_font_size);
    assert!(out.layout.title.x >= margin);
    assert!(out.layout.title.right() <= 320 - margin);
}

#[test]
fn test_conformance_06_background_color() {
    let cfg = resolve(RawOptions {
        background_color: Some("#102030".into()),
        ..base_options("X")
    });
    let pipeline = TitleCardPipeline::new(&cfg).unwrap();
    let out = pipeline.render(&cfg).unwrap();
    assert_eq!(out.image.get_pixel(0, 0), Some([0x10, 0x20, 0x30, 255]));
}
