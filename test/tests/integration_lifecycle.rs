/// Integration tests for component lifecycle ordering and the message
/// registry closure rules.
use sylva_server::{MessengerError, ObjectComponent, SceneObject};
use sylva_shared::MessageKindsError;
use sylva_test::{make_scene, ChestComponent};

#[test]
fn lifecycle_hooks_fire_in_contract_order() {
    let (scene, log, _transport) = make_scene("arena");
    let chest = SceneObject::new("chest");
    chest
        .attach_component(Box::new(ChestComponent::new(&log)))
        .unwrap();

    scene.adopt(&chest).unwrap();
    chest.set_active(false).unwrap();
    chest.set_active(true).unwrap();
    chest.destroy().unwrap();

    assert_eq!(
        log.take(),
        vec![
            "init", "start", "enable", // scene entry of an active object
            "disable", "enable", // active flag round trip
            "disable", "stop", "destroy", // teardown
        ]
    );
}

#[test]
fn init_is_once_per_instance_across_repeated_scene_cycles() {
    let (scene_a, log, _ta) = make_scene("overworld");
    let (scene_b, _log_b, _tb) = make_scene("dungeon");
    let chest = SceneObject::new("chest");
    chest
        .attach_component(Box::new(ChestComponent::new(&log)))
        .unwrap();

    scene_a.adopt(&chest).unwrap();
    scene_b.adopt(&chest).unwrap();
    scene_a.adopt(&chest).unwrap();

    let events = log.take();
    assert_eq!(
        events.iter().filter(|event| event.as_str() == "init").count(),
        1
    );
    assert_eq!(
        events.iter().filter(|event| event.as_str() == "start").count(),
        3
    );
    assert_eq!(
        events.iter().filter(|event| event.as_str() == "stop").count(),
        2
    );
}

#[test]
fn ticks_reach_enabled_components_only() {
    let (scene, log, _transport) = make_scene("arena");
    let chest = SceneObject::new("chest");
    chest
        .attach_component(Box::new(ChestComponent::new(&log)))
        .unwrap();
    scene.adopt(&chest).unwrap();
    log.take();

    scene.tick(1);
    chest.set_active(false).unwrap();
    scene.tick(2);
    chest.set_active(true).unwrap();
    scene.tick(3);

    let events: Vec<String> = log
        .take()
        .into_iter()
        .filter(|event| event.starts_with("update"))
        .collect();
    assert_eq!(events, vec!["update:1", "update:3"]);
}

#[test]
fn registry_closes_when_the_object_enters_a_scene() {
    let (scene, log, _transport) = make_scene("arena");
    let chest = SceneObject::new("chest");
    let mut component = ChestComponent::new(&log);
    component.messenger_mut().register("open").unwrap();
    component.messenger_mut().register("loot").unwrap();
    let index = chest.attach_component(Box::new(component)).unwrap();
    scene.adopt(&chest).unwrap();

    let attached = chest.component_at(index).unwrap();
    let err = attached.with_component_mut(|component| {
        component.messenger_mut().register("smash").unwrap_err()
    });
    assert_eq!(
        err,
        MessageKindsError::RegistrySealed {
            kind: "smash".to_string()
        }
    );

    // registered indices stay stable
    attached.with_component(|component| {
        assert_eq!(component.messenger().kinds().index_of("open").unwrap(), 0);
        assert_eq!(component.messenger().kinds().index_of("loot").unwrap(), 1);
    });
}

#[test]
fn sending_unregistered_kinds_fails_loudly() {
    let (scene, log, transport) = make_scene("arena");
    let chest = SceneObject::new("chest");
    let mut component = ChestComponent::new(&log);
    component.messenger_mut().register("open").unwrap();
    let index = chest.attach_component(Box::new(component)).unwrap();
    let attached = chest.component_at(index).unwrap();

    // outside a scene even registered kinds cannot be sent
    let err = attached.with_component(|component| {
        component.messenger().send("open", Vec::new()).unwrap_err()
    });
    assert_eq!(err, MessengerError::NotInScene);

    scene.adopt(&chest).unwrap();
    let err = attached.with_component(|component| {
        component.messenger().send("smash", Vec::new()).unwrap_err()
    });
    assert_eq!(
        err,
        MessengerError::KindNotRegistered {
            kind: "smash".to_string()
        }
    );

    // the registered kind goes out addressed by (scene, room, object, slot)
    attached
        .with_component(|component| component.messenger().send("open", vec![1, 2]))
        .unwrap();
    let broadcasts = transport.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0].address.scene_path, "arena");
    assert_eq!(broadcasts[0].address.room, "lobby");
    assert_eq!(broadcasts[0].address.object_id, chest.id());
    assert_eq!(broadcasts[0].address.component_index, index);
    assert_eq!(broadcasts[0].kind_index, 0);
}
