use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rawdenoise::{
    denoise, denoise_in_place, denoise_with_params, BandMultipliers, CfaPattern, ChannelGroup,
    DenoiseError, DenoiseParams,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Helper: create CFA input where each pixel gets a value based on its filter color.
fn synthetic_input(width: usize, height: usize, cfa: &CfaPattern, rgb: [f32; 3]) -> Vec<f32> {
    let mut input = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            input[y * width + x] = rgb[cfa.color_at(y, x) as usize];
        }
    }
    input
}

/// Flat per-color mosaic plus seeded Gaussian noise.
fn noisy_input(width: usize, height: usize, cfa: &CfaPattern, sigma: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0f32, sigma).unwrap();
    let mut input = synthetic_input(width, height, cfa, [0.45, 0.6, 0.3]);
    for v in input.iter_mut() {
        *v += normal.sample(&mut rng);
    }
    input
}

fn all_cfas() -> Vec<CfaPattern> {
    vec![
        CfaPattern::bayer_rggb(),
        CfaPattern::bayer_bggr(),
        CfaPattern::bayer_grbg(),
        CfaPattern::bayer_gbrg(),
        CfaPattern::xtrans_default(),
        CfaPattern::xtrans_default().shift(2, 3),
    ]
}

fn squared_error(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| f64::from(x - y).powi(2)).sum()
}

// ---------------------------------------------------------------------------
// Bypass: a zero threshold copies the input bit for bit.
// ---------------------------------------------------------------------------

#[test]
fn zero_threshold_is_identity() {
    for cfa in &all_cfas() {
        for (w, h) in [(1, 1), (1, 7), (5, 3), (36, 24), (37, 41)] {
            let mut input = noisy_input(w, h, cfa, 0.1, 7);
            input[0] = -0.25;
            let mut output = vec![0.0f32; w * h];
            denoise(&input, w, h, cfa, 0.0, &BandMultipliers::uniform(1.0), &mut output).unwrap();
            for (i, (a, b)) in input.iter().zip(&output).enumerate() {
                assert_eq!(a.to_bits(), b.to_bits(), "{cfa} {w}x{h} pixel {i}");
            }
        }
    }
}

#[test]
fn zero_threshold_in_place_leaves_data() {
    let cfa = CfaPattern::xtrans_default();
    let mut data = noisy_input(24, 18, &cfa, 0.05, 3);
    let orig = data.clone();
    denoise_in_place(&mut data, 24, 18, &cfa, 0.0, &BandMultipliers::neutral()).unwrap();
    assert_eq!(data, orig);
}

// ---------------------------------------------------------------------------
// Flat mosaics carry no detail, so even the strongest settings return them.
// ---------------------------------------------------------------------------

#[test]
fn flat_mosaic_is_invariant() {
    init_tracing();
    let strongest = BandMultipliers::uniform(1.0);
    for cfa in &all_cfas() {
        for (w, h) in [(36, 36), (35, 29)] {
            let input = synthetic_input(w, h, cfa, [0.7, 0.5, 0.3]);
            let mut output = vec![0.0f32; w * h];
            denoise(&input, w, h, cfa, 1.0, &strongest, &mut output).unwrap();
            for (i, (&got, &want)) in output.iter().zip(&input).enumerate() {
                assert!((got - want).abs() < 1e-5, "{cfa} {w}x{h} pixel {i}: {got} vs {want}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tiny mosaics: level scales clamp to the plane size.
// ---------------------------------------------------------------------------

#[test]
fn tiny_mosaics_stay_finite() {
    for cfa in &all_cfas() {
        for (w, h) in [(1, 1), (2, 1), (1, 2), (16, 3), (3, 16), (12, 6), (2, 2), (7, 1)] {
            let input = noisy_input(w, h, cfa, 0.05, 11);
            let mut output = vec![0.0f32; w * h];
            denoise(&input, w, h, cfa, 1.0, &BandMultipliers::uniform(1.0), &mut output).unwrap();
            assert!(
                output.iter().all(|v| v.is_finite() && *v >= 0.0),
                "{cfa} {w}x{h}: {output:?}"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Stronger thresholds remove more noise.
// ---------------------------------------------------------------------------

fn assert_monotone_suppression(cfa: &CfaPattern, w: usize, h: usize) {
    let clean = synthetic_input(w, h, cfa, [0.45, 0.6, 0.3]);
    let noisy = noisy_input(w, h, cfa, 0.02, 42);
    let mut output = vec![0.0f32; w * h];

    let mut errors = Vec::new();
    for threshold in [0.0, 0.01, 0.1, 1.0] {
        denoise(&noisy, w, h, cfa, threshold, &BandMultipliers::neutral(), &mut output).unwrap();
        errors.push(squared_error(&output, &clean));
    }
    for pair in errors.windows(2) {
        assert!(pair[1] <= pair[0] * (1.0 + 1e-4), "{cfa}: residual noise grew: {errors:?}");
    }
    assert!(errors[3] < 0.5 * errors[0], "{cfa}: too little suppression: {errors:?}");
}

#[test]
fn suppression_grows_with_threshold_bayer() {
    assert_monotone_suppression(&CfaPattern::bayer_rggb(), 64, 48);
}

#[test]
fn suppression_grows_with_threshold_xtrans() {
    assert_monotone_suppression(&CfaPattern::xtrans_default(), 60, 48);
}

#[test]
fn zero_band_multipliers_keep_detail() {
    let cfa = CfaPattern::bayer_grbg();
    let (w, h) = (32, 32);
    let noisy = noisy_input(w, h, &cfa, 0.02, 5);
    let mut output = vec![0.0f32; w * h];
    // every band threshold collapses to zero
    let mut m = BandMultipliers::neutral();
    *m.group_mut(ChannelGroup::All) = [0.0; 5];
    denoise(&noisy, w, h, &cfa, 1.0, &m, &mut output).unwrap();
    for (&got, &want) in output.iter().zip(&noisy) {
        assert!((got - want).abs() < 1e-5);
    }
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

fn run_on_threads(threads: usize, input: &[f32], w: usize, h: usize, cfa: &CfaPattern) -> Vec<f32> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
    let mut output = vec![0.0f32; w * h];
    pool.install(|| {
        denoise(input, w, h, cfa, 0.05, &BandMultipliers::neutral(), &mut output).unwrap();
    });
    output
}

#[test]
fn output_independent_of_thread_count() {
    for cfa in [CfaPattern::bayer_bggr(), CfaPattern::xtrans_default()] {
        let (w, h) = (67, 53);
        let input = noisy_input(w, h, &cfa, 0.03, 99);
        let single = run_on_threads(1, &input, w, h, &cfa);
        let many = run_on_threads(4, &input, w, h, &cfa);
        let again = run_on_threads(4, &input, w, h, &cfa);
        for (i, ((a, b), c)) in single.iter().zip(&many).zip(&again).enumerate() {
            assert_eq!(a.to_bits(), b.to_bits(), "{cfa} pixel {i}");
            assert_eq!(b.to_bits(), c.to_bits(), "{cfa} pixel {i}");
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points agree
// ---------------------------------------------------------------------------

#[test]
fn in_place_matches_out_of_place() {
    for cfa in [CfaPattern::bayer_rggb(), CfaPattern::xtrans_default()] {
        let (w, h) = (30, 24);
        let input = noisy_input(w, h, &cfa, 0.03, 1);
        let mut output = vec![0.0f32; w * h];
        denoise(&input, w, h, &cfa, 0.2, &BandMultipliers::neutral(), &mut output).unwrap();

        let mut data = input.clone();
        denoise_in_place(&mut data, w, h, &cfa, 0.2, &BandMultipliers::neutral()).unwrap();
        assert_eq!(data, output, "{cfa}");
    }
}

#[test]
fn params_record_matches_explicit_arguments() {
    let cfa = CfaPattern::bayer_rggb();
    let (w, h) = (24, 20);
    let input = noisy_input(w, h, &cfa, 0.03, 2);

    let mut expected = vec![0.0f32; w * h];
    denoise(&input, w, h, &cfa, 0.05, &BandMultipliers::neutral(), &mut expected).unwrap();

    let params = DenoiseParams::from_json(r#"{"version":"1","threshold":0.05}"#).unwrap();
    let mut output = vec![0.0f32; w * h];
    denoise_with_params(&input, w, h, &cfa, &params, &mut output).unwrap();
    assert_eq!(output, expected);
}

#[test]
fn default_params_denoise() {
    let cfa = CfaPattern::xtrans_default();
    let (w, h) = (36, 30);
    let input = noisy_input(w, h, &cfa, 0.03, 8);
    let mut output = vec![0.0f32; w * h];
    denoise_with_params(&input, w, h, &cfa, &DenoiseParams::default(), &mut output).unwrap();
    assert_ne!(output, input);
    assert!(output.iter().all(|v| v.is_finite()));
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

#[test]
fn error_input_size_mismatch() {
    let cfa = CfaPattern::bayer_rggb();
    let input = vec![0.0f32; 10];
    let mut output = vec![0.0f32; 16];
    let result = denoise(&input, 4, 4, &cfa, 0.1, &BandMultipliers::neutral(), &mut output);
    assert_eq!(result, Err(DenoiseError::InputSizeMismatch { expected: 16, got: 10 }));
}

#[test]
fn error_output_size_mismatch() {
    let cfa = CfaPattern::xtrans_default();
    let input = vec![0.0f32; 16];
    let mut output = vec![0.0f32; 48];
    let result = denoise(&input, 4, 4, &cfa, 0.1, &BandMultipliers::neutral(), &mut output);
    assert_eq!(result, Err(DenoiseError::OutputSizeMismatch { expected: 16, got: 48 }));
}

#[test]
fn error_zero_dimensions() {
    let cfa = CfaPattern::bayer_rggb();
    let mut output: Vec<f32> = Vec::new();
    let result = denoise(&[], 0, 5, &cfa, 0.1, &BandMultipliers::neutral(), &mut output);
    assert_eq!(result, Err(DenoiseError::InvalidDimensions { width: 0, height: 5 }));
}

#[test]
fn error_bad_threshold() {
    let cfa = CfaPattern::bayer_rggb();
    let input = vec![0.5f32; 16];
    let mut output = vec![-1.0f32; 16];
    for t in [-0.1, 1.01, f32::NAN, f32::INFINITY] {
        let result = denoise(&input, 4, 4, &cfa, t, &BandMultipliers::neutral(), &mut output);
        assert!(matches!(result, Err(DenoiseError::InvalidThreshold(_))), "{t}: {result:?}");
    }
    assert!(output.iter().all(|&v| v == -1.0));
}

#[test]
fn error_bad_multiplier() {
    let cfa = CfaPattern::xtrans_default();
    let mut data = vec![0.5f32; 36];
    let mut m = BandMultipliers::neutral();
    m.group_mut(ChannelGroup::Red)[1] = -0.5;
    let result = denoise_in_place(&mut data, 6, 6, &cfa, 0.1, &m);
    assert_eq!(
        result,
        Err(DenoiseError::InvalidMultiplier { group: ChannelGroup::Red, band: 1, value: -0.5 })
    );
    assert!(data.iter().all(|&v| v == 0.5));
}

#[test]
fn error_malformed_record() {
    let err = DenoiseParams::from_json(r#"{"version":"2","threshold":"high"}"#).unwrap_err();
    assert!(matches!(err, DenoiseError::Params(_)));
    assert!(err.to_string().starts_with("parameter record"));
}
