use std::sync::Arc;

use proptest::prelude::*;

use stepclip_clip_model::ClipParameters;
use stepclip_playback_core::{MemoryVideoSource, PlaybackController, VideoSource};

#[derive(Debug, Clone)]
enum Op {
    Play,
    Stop,
    Step,
    Back,
    Seek(i64),
    Rate(f64),
    Looping(bool),
    Advance(f64),
    Settle,
    ExternalSeek(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Play),
        Just(Op::Stop),
        Just(Op::Step),
        Just(Op::Back),
        (-5i64..20).prop_map(Op::Seek),
        (-3.0f64..3.0).prop_map(Op::Rate),
        any::<bool>().prop_map(Op::Looping),
        (0.0f64..400.0).prop_map(Op::Advance),
        Just(Op::Settle),
        (-3i64..40).prop_map(Op::ExternalSeek),
    ]
}

proptest! {
    #[test]
    fn intended_and_observed_steps_converge(
        start in 0i64..6,
        stride in 1i64..4,
        ops in prop::collection::vec(op_strategy(), 0..40),
    ) {
        let source = Arc::new(MemoryVideoSource::with_frame_rate(30, 25.0));
        let clip = ClipParameters::spanning(start, stride, 30).unwrap();
        let mut controller = PlaybackController::new(clip, source.clone()).unwrap();

        // last transport intent, and whether time has passed since a play
        let mut wants_playing = None;
        let mut may_have_halted = false;

        for op in ops {
            match op {
                Op::Play => {
                    controller.play();
                    wants_playing = Some(true);
                    may_have_halted = false;
                }
                Op::Stop | Op::Step | Op::Back => {
                    match op {
                        Op::Stop => controller.stop(),
                        Op::Step => controller.step(),
                        _ => controller.back(),
                    }
                    wants_playing = Some(false);
                }
                Op::Seek(n) => controller.set_step_number(n),
                Op::Rate(r) => controller.set_rate(r),
                Op::Looping(b) => controller.set_looping(b),
                Op::Advance(ms) => {
                    may_have_halted = true;
                    source.advance(ms);
                    controller.poll_source_events();
                }
                Op::Settle => {
                    source.settle();
                    controller.poll_source_events();
                }
                Op::ExternalSeek(frame) => source.report_frame(frame),
            }
            let intended = controller.intended_step_number();
            prop_assert!(intended >= 0 && intended < clip.step_count());
        }

        source.settle();
        controller.poll_source_events();

        prop_assert_eq!(controller.intended_step_number(), controller.step_number());
        prop_assert_eq!(controller.rate(), source.rate());
        prop_assert_eq!(controller.is_looping(), source.is_looping());
        prop_assert_eq!(controller.is_playing(), source.is_playing());
        match wants_playing {
            Some(false) => prop_assert!(!controller.is_playing()),
            Some(true) if !may_have_halted => prop_assert!(controller.is_playing()),
            _ => {}
        }
    }
}
