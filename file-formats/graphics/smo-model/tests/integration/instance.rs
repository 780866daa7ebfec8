//! Integration tests for shared models, instances, and the model library

mod fixtures;

use glam::{Mat4, Vec3};
use pretty_assertions::assert_eq;
use smo_model::{
    BufferUsage, HeadlessBackend, LoadOptions, ModelError, ModelInstance, ModelLibrary, Placement,
};
use tempfile::TempDir;

#[test]
fn test_instances_animate_independently() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    let mut library = ModelLibrary::new(HeadlessBackend::new());
    library.load("robot", &path, &LoadOptions::default()).unwrap();
    let model = library.get("robot").unwrap();

    let mut left = ModelInstance::with_placement(model, Placement::at(Vec3::new(-5.0, 0.0, 0.0)));
    let mut right = ModelInstance::with_placement(model, Placement::at(Vec3::new(5.0, 0.0, 0.0)));

    left.set_frame(model, 11.0, 0, true);
    right.set_current_animation(model, 1, 0, true);
    right.set_frame(model, 2.0, 0, true);

    assert_eq!(left.frame(0), 11.0);
    assert_eq!(right.frame(0), 2.0);
    assert_eq!(left.current_animation(1), 0);
    assert_eq!(right.current_animation(1), 1);
    assert_ne!(left.pose(model), right.pose(model));

    library.draw("robot", &left, false).unwrap();
    library.draw("robot", &right, false).unwrap();
    library.draw("robot", &right, true).unwrap();

    let draws = library.backend().draws();
    assert_eq!(draws.len(), 3);
    assert_eq!(draws[0].buffer, draws[1].buffer);
    assert_eq!(draws[0].vertex_count, 6);
    assert_eq!(draws[0].bone_matrices.len(), 2);
    assert!(draws[2].bone_matrices.is_empty());
    assert_eq!(
        draws[0].model_matrix,
        Mat4::from_translation(Vec3::new(-5.0, 0.0, 0.0))
    );
}

#[test]
fn test_instance_pose_matches_drawn_matrices() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    let mut library = ModelLibrary::new(HeadlessBackend::new());
    let model = library.load("robot", &path, &LoadOptions::default()).unwrap();

    let mut robot = ModelInstance::new(model);
    robot.advance_frame(model, 6.0, 0, true);
    let pose = robot.pose(model);

    library.draw("robot", &robot, false).unwrap();
    assert_eq!(library.backend().draws()[0].bone_matrices, pose);
}

#[test]
fn test_library_lifecycle() {
    let dir = TempDir::new().unwrap();
    let robot = fixtures::write_robot(dir.path());
    let cube = fixtures::write_cube(dir.path(), true);

    let mut library = ModelLibrary::new(HeadlessBackend::new());
    let options = LoadOptions::new().buffer_usage(BufferUsage::Dynamic);
    library.load("robot", &robot, &options).unwrap();
    let handle = library.load("cube", &cube, &options).unwrap().buffer().unwrap();

    assert_eq!(library.names(), vec!["cube", "robot"]);
    assert_eq!(library.backend().live_buffers(), 2);
    assert_eq!(library.backend().live_textures(), 2);
    assert_eq!(
        library.backend().buffer_usage(handle),
        Some(BufferUsage::Dynamic)
    );

    assert!(library.destroy("cube"));
    assert_eq!(library.backend().live_buffers(), 1);
    assert_eq!(library.backend().buffer(handle), None);

    let instance = ModelInstance::new(library.get("robot").unwrap());
    assert!(matches!(
        library.draw("cube", &instance, false),
        Err(ModelError::Reference(_))
    ));

    library.destroy_all();
    assert!(library.is_empty());
    assert_eq!(library.backend().live_buffers(), 0);
    assert_eq!(library.backend().live_textures(), 0);
}

#[test]
fn test_failed_load_leaves_library_unchanged() {
    let dir = TempDir::new().unwrap();
    let robot = fixtures::write_robot(dir.path());
    let mut library = ModelLibrary::new(HeadlessBackend::new());
    library.load("robot", &robot, &LoadOptions::default()).unwrap();

    assert!(
        library
            .load("robot", dir.path().join("missing.smo"), &LoadOptions::default())
            .is_err()
    );
    assert!(library.contains("robot"));
    assert_eq!(library.backend().live_buffers(), 1);
}
