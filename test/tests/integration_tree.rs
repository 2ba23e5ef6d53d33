/// Integration tests for the tree/scene consistency invariants: root-set
/// membership, scene re-derivation on reparent, read-only enforcement and
/// cascade destroy.
use std::sync::Arc;

use sylva_server::{ObjectError, Scene, SceneObject};
use sylva_test::{make_context, make_scene, EventLog, MapAssets, RecordingTransport};

#[test]
fn parented_objects_leave_the_root_set_and_join_the_parent() {
    let (scene, _log, _transport) = make_scene("arena");
    let cart = SceneObject::new("cart");
    let wheel = SceneObject::new("wheel");
    scene.adopt(&cart).unwrap();
    scene.adopt(&wheel).unwrap();

    wheel.set_parent(Some(&cart)).unwrap();

    // invariant: a non-root object never appears in scene.objects()
    assert!(!scene.objects().iter().any(|root| root.id() == wheel.id()));
    assert!(cart.children().iter().any(|child| child.id() == wheel.id()));

    // invariant: the converse holds for roots
    assert!(scene.objects().iter().any(|root| root.id() == cart.id()));
    assert!(cart.parent().is_none());
}

#[test]
fn reparent_rederives_scene_and_path() {
    let (scene_a, _log_a, _ta) = make_scene("overworld");
    let (scene_b, _log_b, _tb) = make_scene("dungeon");
    let dock = SceneObject::new("dock");
    scene_b.adopt(&dock).unwrap();

    let boat = SceneObject::new("boat");
    scene_a.adopt(&boat).unwrap();

    boat.set_parent(Some(&dock)).unwrap();

    assert!(Arc::ptr_eq(&boat.scene().unwrap(), &scene_b));
    assert_eq!(boat.path(), format!("{}/{}", dock.path(), boat.name()));
}

#[test]
fn every_mutator_respects_the_read_only_guard() {
    let log = EventLog::new();
    let transport = Arc::new(RecordingTransport::default());
    let assets = MapAssets::new().with(
        "relic",
        r#"{ "name": "relic", "replicating": false, "data": { "age": 900 } }"#,
    );
    let scene = Scene::new("vault", "lobby", make_context(&log, &transport, assets, false));

    let relic = scene.spawn_prefab("relic").unwrap();
    let shelf = SceneObject::new("shelf");
    scene.adopt(&shelf).unwrap();

    assert!(relic.set_name("fake").is_err());
    assert!(relic.set_active(false).is_err());
    assert!(relic.set_parent(Some(&shelf)).is_err());
    assert!(relic.destroy().is_err());
    assert!(scene.adopt(&relic).is_err());
    assert!(relic
        .transform()
        .set_position(sylva_shared::Vec3::new(1.0, 1.0, 1.0))
        .is_err());
    assert!(relic.data().set("age", 901).is_err());

    assert_eq!(relic.name(), "relic");
    assert!(relic.active());
    assert!(relic.parent().is_none());
    assert_eq!(relic.data().get_i64("age"), Some(900));
}

#[test]
fn destroying_a_root_destroys_every_descendant_exactly_once() {
    let (scene, _log, _transport) = make_scene("arena");
    let root = SceneObject::new("tower");
    let floor = SceneObject::new("floor");
    let turret = SceneObject::new("turret");
    scene.adopt(&root).unwrap();
    scene.adopt(&floor).unwrap();
    scene.adopt(&turret).unwrap();
    floor.set_parent(Some(&root)).unwrap();
    turret.set_parent(Some(&floor)).unwrap();
    scene.drain_deltas();

    root.destroy().unwrap();

    for object in [&root, &floor, &turret] {
        assert!(object.is_destroyed());
        assert!(object.parent().is_none());
        assert!(object.scene().is_none());
        assert!(object.children().is_empty());
    }
    assert_eq!(scene.objects_count(), 0);

    let destroyed = scene.drain_deltas().destroyed;
    assert_eq!(destroyed.len(), 3);
    for object in [&root, &floor, &turret] {
        assert_eq!(
            destroyed.iter().filter(|id| **id == object.id()).count(),
            1
        );
    }
}

#[test]
fn destroyed_objects_reject_further_operations() {
    let (scene, _log, _transport) = make_scene("arena");
    let crate_box = SceneObject::new("crate");
    scene.adopt(&crate_box).unwrap();
    crate_box.destroy().unwrap();

    // destroy is terminal; repeating it is a no-op
    crate_box.destroy().unwrap();
    assert!(matches!(
        crate_box.set_name("ghost").unwrap_err(),
        ObjectError::Destroyed { .. }
    ));
    assert!(matches!(
        crate_box.set_active(false).unwrap_err(),
        ObjectError::Destroyed { .. }
    ));
}
