use proptest::prelude::*;

use stepclip_clip_model::{ClipMapping, ClipParameters};

fn clip_strategy() -> impl Strategy<Value = ClipParameters> {
    (0i64..10_000, 1i64..64, 1i64..2_000)
        .prop_map(|(start, stride, count)| ClipParameters::new(start, stride, count).unwrap())
}

proptest! {
    #[test]
    fn step_frame_round_trip(clip in clip_strategy(), pick in 0.0f64..1.0) {
        let mapping = clip.mapping();
        let step = ((clip.step_count() - 1) as f64 * pick).round() as i64;
        prop_assert_eq!(mapping.step_of(mapping.frame_of(step)), step);
    }

    #[test]
    fn step_of_is_floor_for_any_frame(clip in clip_strategy(), frame in any::<i64>()) {
        let mapping = clip.mapping();
        let step = mapping.step_of(frame);

        let start = i128::from(clip.start_frame());
        let stride = i128::from(clip.stride());
        let exact = (i128::from(frame) - start).div_euclid(stride);
        prop_assert_eq!(
            i128::from(step),
            exact.clamp(i128::from(i64::MIN), i128::from(i64::MAX))
        );

        let step = i128::from(step);
        if step == exact {
            prop_assert!(start + step * stride <= i128::from(frame));
            prop_assert!(i128::from(frame) < start + (step + 1) * stride);
        }
    }

    #[test]
    fn clamped_step_is_in_range(clip in clip_strategy(), frame in any::<i64>()) {
        let mapping: ClipMapping = clip.mapping();
        let step = mapping.clamped_step_of(frame);
        prop_assert!(step >= 0);
        prop_assert!(step < clip.step_count());
    }
}

#[test]
fn strided_offset_clip_reconciles_mid_step_frames() {
    let clip = ClipParameters::new(10, 5, 4).unwrap();
    let mapping = clip.mapping();
    let frames: Vec<i64> = (0..4).map(|s| mapping.frame_of(s)).collect();
    assert_eq!(frames, vec![10, 15, 20, 25]);
    assert_eq!(mapping.step_of(22), 2);
}
