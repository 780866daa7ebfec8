//! Integration tests for model loading

mod fixtures;

use std::fs;

use pretty_assertions::assert_eq;
use smo_model::format::{sma, smm, sms};
use smo_model::geometry::{TRIANGLE_STRIDE, interleave, layout};
use smo_model::model::SkippedKind;
use smo_model::{HeadlessBackend, LoadOptions, Model, ModelError, ModelFormat};
use tempfile::TempDir;
use test_case::test_case;

#[test]
fn test_load_umbrella() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());

    let model = Model::load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(model.name(), "robot");
    assert_eq!(model.format(), ModelFormat::Smo);
    assert!(model.load_report().is_complete());

    assert_eq!(model.triangles().len(), 2);
    assert_eq!(model.vertex_count(), 6);
    assert_eq!(model.materials().len(), 1);
    assert_eq!(model.texture_files().len(), 1);
    assert!(model.texture_files()[0].is_some());

    let skeleton = model.skeleton();
    assert_eq!(skeleton.len(), 2);
    assert_eq!(model.bone_id("arm"), Some(1));
    assert_eq!(model.bone_name(0), Some("root"));
    assert_eq!(model.animation_id("wave"), Some(0));
    assert_eq!(model.animation_id("spin"), Some(1));
    assert_eq!(model.animation_id("dance"), None);
    assert_eq!(skeleton.get(1).unwrap().animations.len(), 2);
}

#[test]
fn test_smm_buffer_round_trips_bit_for_bit() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    let model = Model::load(&path, &LoadOptions::default()).unwrap();

    let copy_path = dir.path().join("copy.smm");
    let bytes = smm::write(Vec::new(), model.vertex_data(), &["robot.png".to_string()]).unwrap();
    fs::write(&copy_path, bytes).unwrap();

    let copy = Model::load(&copy_path, &LoadOptions::default()).unwrap();
    assert_eq!(copy.format(), ModelFormat::Smm);
    let original: Vec<u32> = model.vertex_data().iter().map(|f| f.to_bits()).collect();
    let reloaded: Vec<u32> = copy.vertex_data().iter().map(|f| f.to_bits()).collect();
    assert_eq!(original, reloaded);
    assert_eq!(original.len(), 2 * TRIANGLE_STRIDE);
}

#[test]
fn test_smm_buffer_rebuilds_from_triangles_and_materials() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    let model = Model::load(&path, &LoadOptions::default()).unwrap();

    let rebuilt = interleave(model.triangles(), model.materials().as_slice()).unwrap();
    let rebuilt: Vec<u32> = rebuilt.iter().map(|f| f.to_bits()).collect();
    let loaded: Vec<u32> = model.vertex_data().iter().map(|f| f.to_bits()).collect();
    assert_eq!(rebuilt, loaded);
}

#[test]
fn test_skeleton_and_animations_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    let model = Model::load(&path, &LoadOptions::default()).unwrap();

    let bones = String::from_utf8(sms::write(Vec::new(), model.skeleton()).unwrap()).unwrap();
    let tracks = String::from_utf8(sma::write(Vec::new(), model.skeleton()).unwrap()).unwrap();

    let mut skeleton = sms::parse("copy.sms", &bones).unwrap();
    sma::attach(&mut skeleton, sma::parse("copy.sma", &tracks).unwrap()).unwrap();
    assert_eq!(&skeleton, model.skeleton());
}

#[test]
fn test_obj_cube() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_cube(dir.path(), true);

    let model = Model::load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(model.format(), ModelFormat::Obj);
    assert_eq!(model.triangles().len(), 12);
    assert_eq!(model.materials().len(), 2);
    assert!(model.load_report().is_complete());

    let wood = model.materials().get(0).unwrap();
    assert!(wood.has_texture);
    let metal = model.materials().get(1).unwrap();
    assert!(!metal.has_texture);
    assert_eq!(metal.shininess, 64.0);

    let data = model.vertex_data();
    assert_eq!(data[layout::POSITION + 3], 1.0);
    assert_eq!(data[layout::RESERVED], -1.0);
    assert_eq!(data[layout::HAS_TEXTURE], 1.0);
    let last = data.len() - TRIANGLE_STRIDE;
    assert_eq!(data[last + layout::MATERIAL_INDEX], 1.0);
    assert_eq!(data[last + layout::ALPHA], 0.9);

    // Smooth normals at a cube corner point away from the cube's center
    for triangle in model.triangles() {
        for corner in &triangle.coords {
            let outward = corner.position - glam::Vec3::splat(0.5);
            assert!(corner.normal.dot(outward) > 0.0);
            assert!((corner.normal.length() - 1.0).abs() < 1e-5);
        }
    }
}

#[test]
fn test_obj_missing_texture_keeps_loading() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_cube(dir.path(), false);

    let model = Model::load(&path, &LoadOptions::default()).unwrap();
    assert!(!model.materials().get(0).unwrap().has_texture);
    let report = model.load_report();
    assert!(!report.is_complete());
    assert_eq!(report.skipped()[0].kind, SkippedKind::Texture);
    assert_eq!(model.vertex_data()[layout::HAS_TEXTURE], 0.0);
}

#[test]
fn test_missing_member_strict_fails() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    fs::remove_file(dir.path().join("spin.sma")).unwrap();

    let err = Model::load(&path, &LoadOptions::default()).unwrap_err();
    match err {
        ModelError::Open { path, .. } => assert!(path.ends_with("spin.sma")),
        other => panic!("expected open error, got {other:?}"),
    }
}

#[test]
fn test_missing_member_partial_reports() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    fs::remove_file(dir.path().join("spin.sma")).unwrap();

    let options = LoadOptions::new().allow_partial(true);
    let model = Model::load(&path, &options).unwrap();
    let report = model.load_report();
    assert!(!report.is_complete());
    assert_eq!(report.skipped().len(), 1);
    assert_eq!(report.skipped()[0].kind, SkippedKind::UmbrellaMember);
    assert_eq!(model.animation_id("wave"), Some(0));
    assert_eq!(model.animation_id("spin"), None);
}

#[test]
fn test_missing_bones_partial_skips_animations() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    fs::remove_file(dir.path().join("robot.sms")).unwrap();

    let model = Model::load(&path, &LoadOptions::new().allow_partial(true)).unwrap();
    assert!(model.skeleton().is_empty());
    assert_eq!(model.triangles().len(), 2);
    assert_eq!(model.load_report().skipped().len(), 3);
}

#[test]
fn test_dangling_animation_bone_is_fatal_even_when_partial() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    fs::write(
        dir.path().join("spin.sma"),
        "1\n7\nspin\n10\n0\n",
    )
    .unwrap();

    let options = LoadOptions::new().allow_partial(true);
    assert!(matches!(
        Model::load(&path, &options),
        Err(ModelError::Reference(_))
    ));
}

#[test_case("robot.fbx" ; "unknown extension")]
#[test_case("robot.sms" ; "bone file is not an entry point")]
#[test_case("robot" ; "no extension")]
fn test_unsupported_entry_points(name: &str) {
    let dir = TempDir::new().unwrap();
    fixtures::write_robot(dir.path());
    assert!(matches!(
        Model::load(dir.path().join(name), &LoadOptions::default()),
        Err(ModelError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_uppercase_extension() {
    let dir = TempDir::new().unwrap();
    fixtures::write_robot(dir.path());
    fs::rename(dir.path().join("robot.smo"), dir.path().join("ROBOT.SMO")).unwrap();
    let model = Model::load(dir.path().join("ROBOT.SMO"), &LoadOptions::default()).unwrap();
    assert_eq!(model.skeleton().len(), 2);
}

#[test]
fn test_truncated_mesh_reports_eof() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    fs::write(dir.path().join("robot.smm"), "2\n0.0\n").unwrap();
    assert!(matches!(
        Model::load(&path, &LoadOptions::default()),
        Err(ModelError::UnexpectedEof { .. })
    ));
}

#[test]
fn test_strip_packing_without_array_textures() {
    let dir = TempDir::new().unwrap();
    let path = fixtures::write_robot(dir.path());
    let mut backend = HeadlessBackend::without_array_textures();
    let model = Model::load_with_backend(&path, &LoadOptions::default(), &mut backend).unwrap();

    let texture = model.texture().unwrap();
    let layers = backend.texture(texture).unwrap();
    assert_eq!(
        layers.packing(),
        smo_model::backend::TexturePacking::HorizontalStrip
    );
    assert_eq!(layers.len(), 1);
}
