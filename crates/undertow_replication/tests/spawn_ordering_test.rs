//! Integration tests for batch walking: ordering, idempotency and readiness.

use std::sync::Arc;
use undertow_replication::integration::mock::{EngineEvent, MockEngine, MockSpawner};
use undertow_replication::{
    EntityOrchestrator, LiveObjects, ReadinessTimeoutAction, ReplicationConfig, ReplicationError,
    SpawnerRegistry, StandardSpawners,
};
use undertow_shared::{Entity, EntityId, EntityMetadata, Kind, Transform, Vec3};

fn id(n: u128) -> EntityId {
    EntityId::from_u128(n)
}

fn battery(charge: f32) -> EntityMetadata {
    EntityMetadata::Battery { charge, capacity: 100.0 }
}

/// Standard layout where every strategy is a plain mock, except the world
/// spawner which the caller configures.
fn registry(engine: &Arc<MockEngine>, world: MockSpawner) -> SpawnerRegistry {
    SpawnerRegistry::with_standard_layout(StandardSpawners {
        prefab_child: MockSpawner::new(Arc::clone(engine)).shared(),
        inventory: MockSpawner::new(Arc::clone(engine)).data_only().shared(),
        inventory_item: MockSpawner::new(Arc::clone(engine)).shared(),
        world: world.shared(),
    })
}

fn orchestrator(engine: &Arc<MockEngine>) -> EntityOrchestrator {
    let world = MockSpawner::new(Arc::clone(engine));
    EntityOrchestrator::new(registry(engine, world), engine.bindings(), ReplicationConfig::default())
}

fn position_of(events: &[EngineEvent], event: &EngineEvent) -> usize {
    events
        .iter()
        .position(|e| e == event)
        .unwrap_or_else(|| panic!("{event:?} not in {events:?}"))
}

#[tokio::test]
async fn test_duplicate_description_constructed_once() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);
    let locker = Entity::world(id(1), Kind::World, Transform::IDENTITY);

    orchestrator.spawn_all(vec![locker.clone(), locker.clone()]).await.unwrap();
    orchestrator.spawn_all(vec![locker]).await.unwrap();

    assert_eq!(engine.constructed(), vec![id(1)]);
    assert_eq!(orchestrator.ledger().len(), 1);
}

#[tokio::test]
async fn test_child_before_parent_converges() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);

    let flashlight = Entity::world(id(1), Kind::World, Transform::IDENTITY);
    let cell = Entity::new(id(2), Kind::PrefabChild)
        .with_parent(id(1))
        .with_metadata(battery(40.0));

    orchestrator.spawn_all(vec![cell, flashlight]).await.unwrap();

    assert_eq!(engine.constructed(), vec![id(1), id(2)]);
    assert_eq!(engine.applied_metadata(id(2)), vec![battery(40.0)]);
    assert!(orchestrator.pending().is_empty());

    let stats = orchestrator.stats();
    assert_eq!(stats.deferred, 1);
    assert_eq!(stats.released, 1);
}

#[tokio::test]
async fn test_chain_in_reverse_order() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);

    let a = Entity::world(id(1), Kind::World, Transform::IDENTITY);
    let b = Entity::new(id(2), Kind::PrefabChild).with_parent(id(1));
    let c = Entity::new(id(3), Kind::PrefabChild).with_parent(id(2));

    orchestrator.spawn_all(vec![c, b, a]).await.unwrap();

    assert_eq!(engine.constructed(), vec![id(1), id(2), id(3)]);
    assert_eq!(orchestrator.ledger().len(), 3);
    assert!(orchestrator.pending().is_empty());
}

#[tokio::test]
async fn test_grandchild_released_by_nested_child() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);

    let lamp = Entity::new(id(3), Kind::PrefabChild).with_parent(id(2));
    let desk = Entity::world(id(1), Kind::World, Transform::IDENTITY)
        .with_child(Entity::new(id(2), Kind::Inventory));

    orchestrator.spawn_all(vec![lamp, desk]).await.unwrap();

    assert_eq!(engine.constructed(), vec![id(1), id(2), id(3)]);
    assert!(orchestrator.pending().is_empty());
}

#[tokio::test]
async fn test_parent_waits_across_batches() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);

    orchestrator
        .spawn_all(vec![Entity::new(id(2), Kind::InventoryItem).with_parent(id(1))])
        .await
        .unwrap();
    assert!(engine.constructed().is_empty());
    assert!(orchestrator.pending().is_waiting(id(1)));

    orchestrator.spawn_all(vec![Entity::new(id(1), Kind::Inventory)]).await.unwrap();

    assert_eq!(engine.constructed(), vec![id(1), id(2)]);
    assert!(orchestrator.pending().is_empty());
}

#[tokio::test]
async fn test_respawn_as_different_kind() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);

    let dropped = Entity::world(id(5), Kind::World, Transform::IDENTITY);
    let picked_up = Entity::new(id(5), Kind::InventoryItem);

    orchestrator.spawn_all(vec![dropped]).await.unwrap();
    orchestrator.spawn_all(vec![picked_up.clone()]).await.unwrap();

    assert_eq!(engine.constructed(), vec![id(5), id(5)]);
    assert_eq!(orchestrator.require_kind(id(5)), Ok(Kind::InventoryItem));
    assert!(orchestrator.was_already_spawned(&picked_up));
}

#[tokio::test]
async fn test_metadata_applied_after_children() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);

    let parked = Entity::new(id(3), Kind::InventoryItem)
        .with_parent(id(1))
        .with_metadata(battery(10.0));
    let player = Entity::world(id(1), Kind::Player, Transform::IDENTITY)
        .with_child(Entity::new(id(2), Kind::InventoryItem).with_metadata(battery(20.0)))
        .with_metadata(EntityMetadata::Equipment {
            slots: vec![("head".to_string(), id(2)), ("hand".to_string(), id(3))],
        });

    orchestrator.spawn_all(vec![parked, player]).await.unwrap();

    assert_eq!(engine.constructed(), vec![id(1), id(2), id(3)]);

    let events = engine.events();
    let equipped = position_of(&events, &EngineEvent::MetadataApplied(id(1)));
    assert!(equipped > position_of(&events, &EngineEvent::Constructed(id(2))));
    assert!(equipped > position_of(&events, &EngineEvent::Constructed(id(3))));
    assert!(equipped > position_of(&events, &EngineEvent::MetadataApplied(id(3))));
}

#[tokio::test]
async fn test_nested_children_parent_first() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);

    let base = Entity::world(id(1), Kind::World, Transform::IDENTITY)
        .with_child(
            Entity::new(id(2), Kind::Inventory)
                .with_child(Entity::new(id(3), Kind::InventoryItem))
                .with_child(Entity::new(id(4), Kind::InventoryItem)),
        )
        .with_child(Entity::new(id(5), Kind::PrefabChild));

    orchestrator.spawn_all(vec![base]).await.unwrap();

    assert_eq!(engine.constructed(), vec![id(1), id(2), id(3), id(4), id(5)]);
}

#[tokio::test]
async fn test_unknown_kind_aborts_walk() {
    let engine = Arc::new(MockEngine::new());
    let mut registry = SpawnerRegistry::new();
    registry.register(Kind::World, MockSpawner::new(Arc::clone(&engine)).shared());
    let mut orchestrator = EntityOrchestrator::new(registry, engine.bindings(), ReplicationConfig::default());

    let result = orchestrator
        .spawn_all(vec![
            Entity::world(id(1), Kind::World, Transform::IDENTITY),
            Entity::world(id(2), Kind::Vehicle, Transform::IDENTITY),
            Entity::world(id(3), Kind::World, Transform::IDENTITY),
        ])
        .await;

    assert_eq!(result, Err(ReplicationError::UnknownKind(Kind::Vehicle)));
    assert_eq!(engine.constructed(), vec![id(1)]);
    assert!(!orchestrator.is_known(id(3)));
}

#[tokio::test]
async fn test_failed_release_keeps_siblings_parked() {
    let engine = Arc::new(MockEngine::new());
    let mut registry = SpawnerRegistry::new();
    registry.register(Kind::World, MockSpawner::new(Arc::clone(&engine)).shared());
    let mut orchestrator = EntityOrchestrator::new(registry, engine.bindings(), ReplicationConfig::default());

    let result = orchestrator
        .spawn_all(vec![
            Entity::world(id(2), Kind::Vehicle, Transform::IDENTITY).with_parent(id(1)),
            Entity::world(id(3), Kind::World, Transform::IDENTITY).with_parent(id(1)),
            Entity::world(id(1), Kind::World, Transform::IDENTITY),
        ])
        .await;

    assert_eq!(result, Err(ReplicationError::UnknownKind(Kind::Vehicle)));
    assert_eq!(engine.constructed(), vec![id(1)]);
    assert!(!orchestrator.is_known(id(3)));
    assert!(orchestrator.pending().is_waiting(id(1)));
    assert_eq!(orchestrator.pending().len(), 1);
}

#[tokio::test]
async fn test_spawner_failure_aborts_walk() {
    let engine = Arc::new(MockEngine::new());
    let world = MockSpawner::new(Arc::clone(&engine)).failing("prefab missing");
    let mut orchestrator =
        EntityOrchestrator::new(registry(&engine, world), engine.bindings(), ReplicationConfig::default());

    let result = orchestrator
        .spawn_all(vec![Entity::world(id(1), Kind::EscapePod, Transform::IDENTITY)])
        .await;

    assert_eq!(
        result,
        Err(ReplicationError::SpawnFailed {
            id: id(1),
            kind: Kind::EscapePod,
            reason: "prefab missing".to_string(),
        })
    );
}

#[tokio::test]
async fn test_data_only_entity_gets_no_metadata() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);

    orchestrator
        .spawn_all(vec![Entity::new(id(1), Kind::Inventory).with_metadata(EntityMetadata::Storage {
            label: "tools".to_string(),
        })])
        .await
        .unwrap();

    assert_eq!(engine.events(), vec![EngineEvent::Constructed(id(1))]);
    assert!(orchestrator.is_known(id(1)));
}

// ============================================================================
// READINESS
// ============================================================================

fn slow_orchestrator(engine: &Arc<MockEngine>, polls: u32, action: ReadinessTimeoutAction) -> EntityOrchestrator {
    let world = MockSpawner::new(Arc::clone(engine)).with_setup_polls(polls);
    let config = ReplicationConfig {
        readiness_poll_interval_ms: 16,
        readiness_timeout_ms: Some(100),
        readiness_timeout_action: action,
    };
    EntityOrchestrator::new(registry(engine, world), engine.bindings(), config)
}

#[tokio::test(start_paused = true)]
async fn test_metadata_waits_for_setup() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = slow_orchestrator(&engine, 3, ReadinessTimeoutAction::Abort);

    orchestrator
        .spawn_all(vec![Entity::world(id(1), Kind::World, Transform::IDENTITY).with_metadata(battery(75.0))])
        .await
        .unwrap();

    assert_eq!(engine.applied_metadata(id(1)), vec![battery(75.0)]);
    assert_eq!(orchestrator.stats().readiness_timeouts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_readiness_timeout_skips_metadata() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = slow_orchestrator(&engine, u32::MAX, ReadinessTimeoutAction::SkipMetadata);

    orchestrator
        .spawn_all(vec![
            Entity::world(id(1), Kind::World, Transform::IDENTITY).with_metadata(battery(75.0)),
            Entity::new(id(2), Kind::InventoryItem).with_metadata(battery(5.0)),
        ])
        .await
        .unwrap();

    assert!(engine.applied_metadata(id(1)).is_empty());
    assert_eq!(engine.applied_metadata(id(2)), vec![battery(5.0)]);
    assert_eq!(orchestrator.stats().readiness_timeouts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_readiness_timeout_aborts() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = slow_orchestrator(&engine, u32::MAX, ReadinessTimeoutAction::Abort);

    let result = orchestrator
        .spawn_all(vec![Entity::world(id(1), Kind::World, Transform::IDENTITY).with_metadata(battery(75.0))])
        .await;

    assert_eq!(result, Err(ReplicationError::ReadinessTimeout { id: id(1), waited_ms: 100 }));
    assert!(engine.applied_metadata(id(1)).is_empty());
}

// ============================================================================
// OWNED CHILDREN AND ADOPTION
// ============================================================================

#[tokio::test]
async fn test_owned_children_recorded_not_constructed() {
    let engine = Arc::new(MockEngine::new());
    let world = MockSpawner::new(Arc::clone(&engine)).owning_children();
    let mut orchestrator =
        EntityOrchestrator::new(registry(&engine, world), engine.bindings(), ReplicationConfig::default());

    let hatch = Entity::new(id(2), Kind::PrefabChild);
    let pod = Entity::world(id(1), Kind::EscapePod, Transform::IDENTITY).with_child(hatch.clone());
    let decal = Entity::new(id(3), Kind::PrefabChild).with_parent(id(2));

    orchestrator.spawn_all(vec![decal, pod]).await.unwrap();

    assert_eq!(engine.constructed(), vec![id(1), id(3)]);
    assert!(orchestrator.is_known(id(2)));

    // A re-sent description of the owned child is a no-op.
    orchestrator.spawn_all(vec![hatch.with_parent(id(1))]).await.unwrap();
    assert_eq!(engine.constructed(), vec![id(1), id(3)]);
}

#[tokio::test]
async fn test_adopt_releases_parked_children() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);

    orchestrator
        .spawn_all(vec![Entity::new(id(2), Kind::InventoryItem).with_parent(id(1))])
        .await
        .unwrap();
    assert_eq!(orchestrator.pending().len(), 1);

    orchestrator
        .adopt(&Entity::world(id(1), Kind::World, Transform::IDENTITY))
        .await
        .unwrap();

    assert_eq!(engine.constructed(), vec![id(2)]);
    assert!(orchestrator.pending().is_empty());
    assert_eq!(orchestrator.require_kind(id(1)), Ok(Kind::World));
}

// ============================================================================
// IN-PLACE UPDATES AND REMOVAL
// ============================================================================

#[tokio::test]
async fn test_known_world_entity_moved_in_place() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);
    let moved_to = Transform::at(Vec3::new(4.0, -12.0, 9.5));

    orchestrator
        .spawn_all(vec![Entity::world(id(1), Kind::Vehicle, Transform::IDENTITY)])
        .await
        .unwrap();
    orchestrator
        .spawn_all(vec![Entity::world(id(1), Kind::Vehicle, moved_to)])
        .await
        .unwrap();

    let handle = engine.resolve(id(1)).unwrap();
    assert_eq!(engine.transform_of(handle), Some(moved_to));
    assert_eq!(engine.constructed(), vec![id(1)]);
    assert_eq!(orchestrator.stats().updated_in_place, 1);
}

#[tokio::test]
async fn test_in_place_update_without_object() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);
    let far_away = Entity::world(id(1), Kind::PlaceholderGroup, Transform::IDENTITY);

    orchestrator.adopt(&far_away).await.unwrap();
    orchestrator.spawn_all(vec![far_away]).await.unwrap();

    assert!(engine.events().is_empty());
    assert_eq!(orchestrator.stats().missing_handles, 1);
}

#[tokio::test]
async fn test_removed_hierarchy_can_respawn() {
    let engine = Arc::new(MockEngine::new());
    let mut orchestrator = orchestrator(&engine);

    let shelf = Entity::world(id(1), Kind::World, Transform::IDENTITY)
        .with_child(Entity::new(id(2), Kind::Inventory).with_child(Entity::new(id(3), Kind::InventoryItem)));
    let bystander = Entity::world(id(9), Kind::World, Transform::IDENTITY);

    orchestrator.spawn_all(vec![shelf.clone(), bystander]).await.unwrap();
    orchestrator.remove_hierarchy(&shelf);

    assert!(!orchestrator.is_known(id(1)));
    assert!(!orchestrator.is_known(id(3)));
    assert!(orchestrator.is_known(id(9)));

    orchestrator.spawn_all(vec![shelf]).await.unwrap();
    assert_eq!(
        engine.constructed(),
        vec![id(1), id(2), id(3), id(9), id(1), id(2), id(3)]
    );
}
