use gamepad_state::port::{MemoryInputPort, RawFrame};
use gamepad_state::{DriverSettings, JoystickError, JoystickRegistry, JoystickService};
use std::sync::Arc;

fn service_with_pads(count: usize) -> (Arc<MemoryInputPort>, JoystickService) {
    let port = Arc::new(MemoryInputPort::new());
    for n in 0..count {
        port.attach(
            format!("Xbox Controller {}", n),
            RawFrame::new(vec![0.0, 0.0, -1.0, 0.0, 0.0, -1.0], vec![false; 11], vec![(0, 0)]),
        );
    }
    let registry = JoystickRegistry::new(port.clone(), DriverSettings::default());
    (port, JoystickService::new(registry))
}

#[tokio::test]
async fn service_runs_the_full_lifecycle() {
    let (port, service) = service_with_pads(1);

    let connected = service.list_connected().await.unwrap();
    assert_eq!(connected.len(), 1);
    assert_eq!(connected[0].name, "Xbox Controller 0");

    service
        .create(0, "xbox_controller".to_string(), Some("linux".to_string()))
        .await
        .unwrap();

    let mut buttons = vec![false; 11];
    buttons[1] = true;
    port.stage_frame(
        0,
        RawFrame::new(vec![0.0, 0.0, 1.0, 0.0, 0.0, -1.0], buttons, vec![(-1, 0)]),
    )
    .unwrap();
    let state = service.get_state(0).await.unwrap();
    assert_eq!(state.axes().left_analog_trigger, 1.0);
    assert_eq!(state.d_pad().horizontal_right, -1);
    assert_eq!(
        state.buttons().pressed_buttons(),
        vec!["b", "left_trigger", "d_pad_left"]
    );

    service.remove(0).await.unwrap();
    assert!(matches!(
        service.get_state(0).await,
        Err(JoystickError::UnknownId { id: 0 })
    ));
}

#[tokio::test]
async fn service_reports_selection_errors() {
    let (_, service) = service_with_pads(1);
    assert!(matches!(
        service.create(0, "steam_controller".to_string(), Some("linux".to_string())).await,
        Err(JoystickError::UnsupportedControllerType { .. })
    ));
    assert!(matches!(
        service.create(0, "xbox_controller".to_string(), Some("plan9".to_string())).await,
        Err(JoystickError::UnsupportedPlatform { .. })
    ));
    assert!(service.registry().active_ids().is_empty());
}

#[tokio::test]
async fn compatible_catalog_is_available_without_devices() {
    let (_, service) = service_with_pads(0);
    let catalog = service.list_compatible();
    assert_eq!(
        catalog["xbox_controller"],
        vec!["win".to_string(), "linux".to_string(), "darwin".to_string()]
    );
    assert_eq!(catalog["dualshock4"], vec!["linux".to_string()]);
    assert!(service.list_connected().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn clones_share_one_registry() {
    let (port, service) = service_with_pads(3);

    let tasks: Vec<_> = (0..3u32)
        .map(|id| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create(id, "xbox_controller".to_string(), Some("win".to_string()))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(service.registry().active_ids(), vec![0, 1, 2]);
    assert_eq!(port.open_handle_count(), 3);
    for id in 0..3 {
        assert!(service.get_state(id).await.is_ok());
    }
}
