//! End-to-end flow of typed events through the in-memory bus

use envsim_bus::{
    publish_event, BusError, Channel, InMemoryBus, MessageBus, SensorCreatedEvent,
    SensorReadingEvent, SensorStatus, SensorStatusEvent,
};
use envsim_core_sim::{ReadingGenerator, SensorType};

#[tokio::test]
async fn test_typed_events_reach_subscribers() {
    let bus = InMemoryBus::new();
    let mut created = bus.subscribe(Channel::SensorCreated).await.unwrap();

    let event = SensorCreatedEvent {
        sensor_identity: 12,
        display_name: "greenhouse".to_string(),
        sensor_type: SensorType::Humidity,
        owner_id: "U7".to_string(),
        active: true,
        created_at: None,
    };
    publish_event(&bus, &event).await.unwrap();

    let message = created.recv().await.unwrap();
    assert_eq!(message.channel, Channel::SensorCreated);
    assert_eq!(message.decode::<SensorCreatedEvent>().unwrap(), event);
}

#[tokio::test]
async fn test_journal_decodes_readings() {
    let bus = InMemoryBus::new();
    let generator = ReadingGenerator::default();

    for _ in 0..5 {
        let reading = generator.generate(SensorType::Light, 4);
        publish_event(&bus, &SensorReadingEvent::from_reading(4, "U1", &reading))
            .await
            .unwrap();
    }

    let readings: Vec<SensorReadingEvent> = bus.published_events();
    assert_eq!(readings.len(), 5);
    assert!(readings
        .iter()
        .all(|r| r.unit == "LUX" && r.value >= 0.0 && r.value <= 2_000.0));
}

#[tokio::test]
async fn test_dyn_bus_publish() {
    let bus = InMemoryBus::new();
    let dyn_bus: &dyn MessageBus = &bus;

    bus.fail_next(Channel::SensorStatus, 1);
    let event = SensorStatusEvent::now(1, "U1".to_string(), SensorStatus::Inactive);

    let err = publish_event(dyn_bus, &event).await.unwrap_err();
    assert!(matches!(err, BusError::Rejected { .. }));
    assert!(err.is_transient());

    publish_event(dyn_bus, &event).await.unwrap();
    let statuses: Vec<SensorStatusEvent> = bus.published_events();
    assert_eq!(statuses, vec![event]);
}
