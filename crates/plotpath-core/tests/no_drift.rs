//! Randomized checks of the anti-drift position tracking

use plotpath_core::{AffineMatrix, Instruction, PathEmitter, Point};
use proptest::prelude::*;

fn move_sum<'a>(instructions: impl Iterator<Item = &'a Instruction>) -> (i64, i64) {
    instructions.fold((0, 0), |(sx, sy), i| match i {
        Instruction::Move { dx, dy } => (sx + dx, sy + dy),
        _ => (sx, sy),
    })
}

fn coord() -> impl Strategy<Value = f64> {
    -5000.0f64..5000.0
}

fn matrix() -> impl Strategy<Value = AffineMatrix> {
    (
        -3.0f64..3.0,
        -3.0f64..3.0,
        -3.0f64..3.0,
        -3.0f64..3.0,
        -500.0f64..500.0,
        -500.0f64..500.0,
    )
        .prop_map(|(a, b, c, d, e, f)| AffineMatrix::new(a, b, c, d, e, f))
}

proptest! {
    #[test]
    fn deltas_sum_to_rounded_displacement(
        context in matrix(),
        positions in prop::collection::vec((coord(), coord()), 2..60),
    ) {
        let mut emitter = PathEmitter::default();
        emitter.transform(&context);

        let (x0, y0) = positions[0];
        emitter.move_to(x0, y0).end();
        let first = emitter.device_position();
        let (fx, fy) = move_sum(emitter.instructions());

        for &(x, y) in &positions[1..] {
            emitter.move_to(x, y).end();
            // per-step error stays below half a unit
            let exact = context.transform_point(Point::new(x, y));
            prop_assert!((emitter.device_position().x - exact.x).abs() <= 0.5);
            prop_assert!((emitter.device_position().y - exact.y).abs() <= 0.5);
        }

        let (sx, sy) = move_sum(emitter.instructions());
        let (lx, ly) = positions[positions.len() - 1];
        let last = context.transform_point(Point::new(lx, ly)).round();
        prop_assert_eq!(sx - fx, (last.x - first.x) as i64);
        prop_assert_eq!(sy - fy, (last.y - first.y) as i64);
    }

    #[test]
    fn relative_steps_do_not_drift(
        steps in prop::collection::vec((-3.0f64..3.0, -3.0f64..3.0), 1..200),
    ) {
        let mut emitter = PathEmitter::default();
        let mut exact = Point::ORIGIN;
        for &(dx, dy) in &steps {
            emitter.move_by(dx, dy).end();
            exact = exact.translate(dx, dy);
        }
        let (sx, sy) = move_sum(emitter.instructions());
        prop_assert_eq!(sx, emitter.position().round().x as i64);
        prop_assert_eq!(sy, emitter.position().round().y as i64);
        prop_assert!((sx as f64 - exact.x).abs() <= 0.5 + 1e-6);
        prop_assert!((sy as f64 - exact.y).abs() <= 0.5 + 1e-6);
    }

    #[test]
    fn store_then_restore_is_identity(
        lines in prop::collection::vec((coord(), coord()), 0..20),
    ) {
        let mut emitter = PathEmitter::new(Some("roundtrip"));
        emitter.move_to(12.0, 34.0).and();
        let before = emitter.code();
        let device = emitter.device_position();

        emitter.store_code();
        for &(x, y) in &lines {
            emitter.line_to(x, y).end();
        }
        emitter.comment("scratch");
        emitter.restore_code().unwrap();

        prop_assert_eq!(emitter.code(), before);
        prop_assert_eq!(emitter.device_position(), device);
    }

    #[test]
    fn store_then_release_keeps_appended_code(
        lines in prop::collection::vec((coord(), coord()), 0..20),
    ) {
        let mut emitter = PathEmitter::default();
        emitter.store_code();
        for &(x, y) in &lines {
            emitter.line_to(x, y).end();
        }
        let appended = emitter.code();
        emitter.release_code().unwrap();
        prop_assert_eq!(emitter.code(), appended);
        prop_assert_eq!(emitter.code_depth(), 0);
    }
}
