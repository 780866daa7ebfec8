//! Integration tests for the animation evaluator and instance state

mod fixtures;

use glam::{Mat4, Vec3};
use pretty_assertions::assert_eq;
use smo_model::animation::{
    compose_world_matrices, compose_world_matrices_uniform, local_matrix, resolve_rotation,
    transformed_end_points,
};
use smo_model::format::{sma, sms};
use smo_model::geometry::{Triangle, Vertex};
use smo_model::{Bone, BoneSample, InstanceAnimation, LoadOptions, Model, Skeleton};
use tempfile::TempDir;
use test_case::test_case;

const WAVE: usize = 0;
const SPIN: usize = 1;

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

fn robot() -> (TempDir, Model) {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    let model = Model::load(&path, &LoadOptions::default()).unwrap();
    (dir, model)
}

/// A wider tree: 0 -> {1 -> {3, 4}, 2 -> {5}}
fn tree() -> Skeleton {
    let mut skeleton = Skeleton::new();
    for (id, parent) in [
        (0, None),
        (1, Some(0)),
        (2, Some(0)),
        (3, Some(1)),
        (4, Some(1)),
        (5, Some(2)),
    ] {
        let pivot = Vec3::new(id as f32, 0.0, 0.0);
        skeleton
            .push(Bone::new(id, format!("bone{id}"), pivot, pivot + Vec3::Y, parent))
            .unwrap();
    }
    skeleton
}

#[test]
fn test_parent_walk_reaches_root() {
    let skeleton = tree();
    skeleton.validate().unwrap();
    for bone in skeleton.iter() {
        let ancestors: Vec<_> = skeleton.ancestors(bone.id).collect();
        assert!(ancestors.len() < skeleton.len());
        if bone.is_root() {
            assert!(ancestors.is_empty());
        } else {
            assert_eq!(ancestors.last().map(|b| b.id), Some(0));
        }
    }
    assert_eq!(skeleton.depth(5), 2);
    assert_eq!(skeleton.descendants(1), vec![3, 4]);
    assert_eq!(skeleton.descendants(0), vec![1, 3, 4, 2, 5]);
}

#[test]
fn test_one_matrix_per_bone() {
    let skeleton = tree();
    for (index, bone) in skeleton.iter().enumerate() {
        assert_eq!(bone.id, index);
    }
    let world = compose_world_matrices(&skeleton, &[]);
    assert_eq!(world.len(), skeleton.len());
    // No animations anywhere: rest pose is identity
    for matrix in &world {
        assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }
}

#[test]
fn test_exact_key_frames_are_reproduced() {
    let (_dir, model) = robot();
    let root = model.skeleton().root().unwrap();
    for key in &root.animations[WAVE].keyframes {
        let first = resolve_rotation(root, WAVE, key.step as f32);
        let second = resolve_rotation(root, WAVE, key.step as f32);
        assert_eq!(first, key.rotation);
        assert_eq!(first, second);
    }
}

#[test]
fn test_frames_outside_keys_hold() {
    let (_dir, model) = robot();
    let root = model.skeleton().root().unwrap();
    assert_eq!(resolve_rotation(root, WAVE, 0.0), Vec3::ZERO);
    assert_eq!(resolve_rotation(root, WAVE, 15.0), Vec3::new(0.0, 0.0, 90.0));
    assert!(approx(
        resolve_rotation(root, WAVE, 6.0),
        Vec3::new(0.0, 0.0, 45.0)
    ));
}

#[test_case(1.5, 175.0 ; "quarter way")]
#[test_case(2.0, 180.0 ; "half way crosses the seam")]
#[test_case(2.5, 185.0 ; "past the seam")]
fn test_rotation_takes_short_arc(frame: f32, expected_y: f32) {
    let (_dir, model) = robot();
    let root = model.skeleton().root().unwrap();
    let rotation = resolve_rotation(root, SPIN, frame);
    assert!((rotation.y - expected_y).abs() < 1e-3, "got {}", rotation.y);
}

#[test]
fn test_empty_track_uses_rest_rotation() {
    let (_dir, model) = robot();
    let arm = model.skeleton().get(1).unwrap();
    assert!(arm.animations[SPIN].is_empty());
    assert_eq!(resolve_rotation(arm, SPIN, 2.0), arm.rest_rotation);
}

#[test]
fn test_child_world_is_parent_world_times_local() {
    let (_dir, model) = robot();
    let skeleton = model.skeleton();

    for frame in [1.0, 3.5, 6.0, 11.0, 17.0] {
        let world = compose_world_matrices_uniform(skeleton, WAVE, frame);
        let arm = skeleton.get(1).unwrap();
        let local = local_matrix(arm, resolve_rotation(arm, WAVE, frame));
        assert!(world[1].abs_diff_eq(world[0] * local, 1e-5));
    }
}

const LIMB_SMS: &str = "\
2
0
root
0
0
0
0
1
0
-1
0
0
0
0
0
0
1
limb
0
1
0
1
1
0
0
0
0
0
0
0
0
";

const BEND_SMA: &str = "\
2
0
bend
4
2
0
0
0
1
0
0
60
4
1
bend
4
2
30
0
0
1
30
0
-60
4
";

#[test]
fn test_two_bone_limb_between_keys() {
    let mut skeleton = sms::parse("limb.sms", LIMB_SMS).unwrap();
    sma::attach(&mut skeleton, sma::parse("bend.sma", BEND_SMA).unwrap()).unwrap();

    let mut state = InstanceAnimation::new(&skeleton);
    state.set_frame(&skeleton, 2.5, 0, true);
    assert_eq!(state.frame(1), 2.5);

    let world = compose_world_matrices(&skeleton, state.samples());
    assert_eq!(world.len(), 2);

    let root = skeleton.get(0).unwrap();
    let limb = skeleton.get(1).unwrap();
    assert!(approx(resolve_rotation(root, 0, 2.5), Vec3::new(0.0, 0.0, 30.0)));
    assert!(approx(resolve_rotation(limb, 0, 2.5), Vec3::new(30.0, 0.0, -30.0)));

    let root_local = local_matrix(root, resolve_rotation(root, 0, 2.5));
    let limb_local = local_matrix(limb, resolve_rotation(limb, 0, 2.5));
    assert!(world[0].abs_diff_eq(root_local, 1e-5));
    assert!(world[1].abs_diff_eq(world[0] * limb_local, 1e-5));
}

#[test]
fn test_wave_end_points() {
    let (_dir, model) = robot();
    let skeleton = model.skeleton();

    let rest = compose_world_matrices_uniform(skeleton, WAVE, 1.0);
    let ends = transformed_end_points(skeleton, &rest);
    assert!(approx(ends[0], Vec3::new(0.0, 1.0, 0.0)));
    assert!(approx(ends[1], Vec3::new(1.0, 1.0, 0.0)));

    // Root turns +90 about z at the origin, arm turns back -90 about its pivot
    let posed = compose_world_matrices_uniform(skeleton, WAVE, 11.0);
    let ends = transformed_end_points(skeleton, &posed);
    assert!(approx(ends[0], Vec3::new(-1.0, 0.0, 0.0)));
    assert!(approx(ends[1], Vec3::ZERO));
}

#[test]
fn test_mixed_selection_per_bone() {
    let (_dir, model) = robot();
    let skeleton = model.skeleton();
    let selection = [BoneSample::new(SPIN, 2.0), BoneSample::new(WAVE, 11.0)];
    let world = compose_world_matrices(skeleton, &selection);

    let root = skeleton.root().unwrap();
    let expected_root = local_matrix(root, Vec3::new(0.0, 180.0, 0.0));
    assert!(world[0].abs_diff_eq(expected_root, 1e-4));
}

#[test]
fn test_advance_wraps_past_length() {
    let (_dir, model) = robot();
    let skeleton = model.skeleton();
    let mut state = InstanceAnimation::new(skeleton);

    state.set_current_animation(skeleton, SPIN, 0, true);
    state.set_frame(skeleton, 9.5, 0, true);
    state.advance_frame(skeleton, 3.0, 0, true);
    assert!((state.frame(0) - 2.5).abs() < 1e-5);
    assert!((state.frame(1) - 2.5).abs() < 1e-5);

    state.advance_frame(skeleton, -2.0, 0, true);
    // 0.5 is below the first frame and wraps forward by length - 1
    assert!((state.frame(0) - 9.5).abs() < 1e-5);
}

#[test]
fn test_cascade_reaches_children_only_when_asked() {
    let (_dir, model) = robot();
    let skeleton = model.skeleton();
    let mut state = InstanceAnimation::new(skeleton);

    state.advance_frame(skeleton, 4.0, 0, false);
    assert_eq!(state.frame(0), 4.0);
    assert_eq!(state.frame(1), 0.0);

    state.advance_frame(skeleton, 4.0, 0, true);
    assert_eq!(state.frame(0), 8.0);
    assert_eq!(state.frame(1), 4.0);

    state.set_current_animation(skeleton, SPIN, 0, false);
    assert_eq!(state.current_animation(0), SPIN);
    assert_eq!(state.current_animation(1), WAVE);
    // Switching keeps the frame
    assert_eq!(state.frame(0), 8.0);

    state.advance_frame(skeleton, 1.0, 1, false);
    assert_eq!(state.frame(0), 8.0);
    assert_eq!(state.frame(1), 5.0);
}

#[test]
fn test_advance_by_time_uses_framerate() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    let model = Model::load(&path, &LoadOptions::new().framerate(10.0)).unwrap();
    let mut state = InstanceAnimation::new(model.skeleton());

    state.advance_by_time(&model, std::time::Duration::from_millis(500), 0, true);
    assert!((state.frame(0) - 5.0).abs() < 1e-5);
    assert!((state.frame(1) - 5.0).abs() < 1e-5);
}

#[test]
fn test_degenerate_triangle_has_zero_normal() {
    let triangle = Triangle::new(
        [
            Vertex::new(Vec3::ZERO),
            Vertex::new(Vec3::X),
            Vertex::new(Vec3::X * 2.0),
        ],
        [Vertex::default(); 3],
        0,
    );
    assert_eq!(triangle.surface_normal(), Vec3::ZERO);
    assert!(triangle.surface_normal().is_finite());
    assert_eq!(triangle.area(), 0.0);
}
