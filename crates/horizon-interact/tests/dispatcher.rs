//! Several interactors sharing one dispatcher.

use std::sync::Arc;

use horizon_interact::resource::BUILTIN_MODULE;
use horizon_interact::tools::{ContourInteractor, SliceNavigator};
use horizon_interact::{
    DataInteractor, Dispatcher, EventConfig, EventStateMachine, InteractionEvent, InteractorId, MouseButton,
    Point2, Point3, ProcessingMode, ResourceManager, StateMode,
};
use horizon_interact_core::DataNode;
use parking_lot::Mutex;

/// Set `RUST_LOG=horizon_interact=trace` to see dispatch diagnostics.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn contour_machine(resources: &ResourceManager) -> EventStateMachine<ContourInteractor> {
    init_tracing();
    let mut machine = EventStateMachine::new(ContourInteractor::new());
    machine
        .load_state_machine_from(resources, "ContourTool.xml", BUILTIN_MODULE)
        .unwrap();
    machine
        .load_event_config_from(resources, "ContourToolConfig.xml", BUILTIN_MODULE)
        .unwrap();
    machine
}

fn navigator(resources: &ResourceManager, slices: usize) -> EventStateMachine<SliceNavigator> {
    let mut machine = EventStateMachine::new(SliceNavigator::new(slices));
    machine
        .load_state_machine_from(resources, "SliceNavigation.xml", BUILTIN_MODULE)
        .unwrap();
    machine
        .load_event_config_from(resources, "DisplayConfig.xml", BUILTIN_MODULE)
        .unwrap();
    machine
}

fn click(x: f64, y: f64) -> InteractionEvent {
    InteractionEvent::mouse_press(Point2::new(x, y), MouseButton::Left)
        .with_world_position(Point3::new(x, y, 0.0))
}

fn node(name: &str, visible: bool, layer: i64) -> Option<Arc<DataNode>> {
    Some(Arc::new(
        DataNode::new(name)
            .with_property("visible", visible)
            .with_property("layer", layer),
    ))
}

fn record(dispatcher: &Dispatcher) -> Arc<Mutex<Vec<(String, bool)>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    dispatcher
        .event_processed()
        .connect(move |(event, handled): &(InteractionEvent, bool)| {
            let label = event
                .signal_name()
                .map(str::to_string)
                .unwrap_or_else(|| event.class().to_string());
            sink.lock().push((label, *handled));
        });
    log
}

#[test]
fn test_contour_closing_through_internal_signal() {
    let resources = ResourceManager::with_builtin();
    let mut dispatcher = Dispatcher::new();
    let contour = dispatcher.add(contour_machine(&resources), node("image", true, 1));
    let log = record(&dispatcher);

    assert!(dispatcher.process_event(click(0.0, 0.0)));
    assert_eq!(dispatcher.processing_mode(), ProcessingMode::PreferInput);
    assert_eq!(dispatcher.selected_interactor(), Some(contour));

    dispatcher.process_event(click(10.0, 0.0));
    dispatcher.process_event(click(10.0, 10.0));
    log.lock().clear();

    assert!(dispatcher.process_event(click(0.5, 0.5)));
    assert_eq!(
        *log.lock(),
        vec![
            ("MousePressEvent".to_string(), true),
            ("ContourClosed".to_string(), true),
        ]
    );
    assert_eq!(dispatcher.processing_mode(), ProcessingMode::Regular);
    assert_eq!(dispatcher.selected_interactor(), None);
}

#[test]
fn test_preferred_interactor_lets_others_handle_the_rest() {
    let resources = ResourceManager::with_builtin();
    let mut dispatcher = Dispatcher::new();
    let contour = dispatcher.add(contour_machine(&resources), node("image", true, 5));
    let slices = dispatcher.add(navigator(&resources, 10), None);

    assert!(dispatcher.process_event(click(0.0, 0.0)));
    assert_eq!(dispatcher.selected_interactor(), Some(contour));

    // The contour tool has no use for the wheel, so the navigator gets it.
    assert!(dispatcher.process_event(InteractionEvent::wheel(Point2::default(), 120)));
    assert_eq!(dispatcher.processing_mode(), ProcessingMode::Regular);
    assert!(dispatcher.contains(slices));
}

#[test]
fn test_invisible_layer_falls_through() {
    let resources = ResourceManager::with_builtin();
    let mut dispatcher = Dispatcher::new();
    let hidden = dispatcher.add(contour_machine(&resources), node("hidden", false, 10));
    let shown = dispatcher.add(contour_machine(&resources), node("shown", true, 0));
    assert_eq!(dispatcher.dispatch_order(), vec![hidden, shown]);

    assert!(dispatcher.process_event(click(0.0, 0.0)));
    assert_eq!(dispatcher.selected_interactor(), Some(shown));
}

#[test]
fn test_navigator_bounds_and_keys() {
    let resources = ResourceManager::with_builtin();
    let mut dispatcher = Dispatcher::new();
    dispatcher.add(navigator(&resources, 3), None);

    assert!(!dispatcher.process_event(InteractionEvent::wheel(Point2::default(), -1)));
    assert!(dispatcher.process_event(InteractionEvent::key("ArrowUp")));
    assert!(dispatcher.process_event(InteractionEvent::key("PageUp")));
    assert!(!dispatcher.process_event(InteractionEvent::key("ArrowUp")));
    assert!(dispatcher.process_event(InteractionEvent::key("ArrowDown")));
    assert!(!dispatcher.process_event(InteractionEvent::key("Home")));
}

#[test]
fn test_huge_slice_step_clamps_to_last_slice() {
    let resources = ResourceManager::with_builtin();
    let mut machine = navigator(&resources, 8);
    machine.set_event_config(EventConfig::parse(
        r#"<config><param name="slice_step" value="1000000000000000000"/></config>"#,
    ));

    // PageUp multiplies the step by ten.
    assert!(machine.handle_event(&InteractionEvent::key("PageUp"), None));
    assert_eq!(machine.tool().current_slice(), 7);
    assert!(machine.handle_event(&InteractionEvent::key("PageDown"), None));
    assert_eq!(machine.tool().current_slice(), 0);
}

#[test]
fn test_removing_selected_interactor_resets_mode() {
    let resources = ResourceManager::with_builtin();
    let mut dispatcher = Dispatcher::new();
    let contour: InteractorId = dispatcher.add(contour_machine(&resources), node("image", true, 0));

    dispatcher.process_event(click(0.0, 0.0));
    assert_eq!(dispatcher.processing_mode(), ProcessingMode::PreferInput);

    assert!(dispatcher.remove_interactor(contour).is_some());
    assert_eq!(dispatcher.processing_mode(), ProcessingMode::Regular);
    assert!(dispatcher.is_empty());
    assert!(!dispatcher.process_event(click(0.0, 0.0)));
}

#[test]
fn test_reset_interactors() {
    let resources = ResourceManager::with_builtin();
    let mut dispatcher = Dispatcher::new();
    let contour = dispatcher.add(contour_machine(&resources), node("image", true, 0));

    dispatcher.process_event(click(0.0, 0.0));
    assert_eq!(
        dispatcher.interactor(contour).map(|i| i.mode()),
        Some(StateMode::PreferInput)
    );

    dispatcher.reset_interactors();
    assert_eq!(dispatcher.processing_mode(), ProcessingMode::Regular);
    assert_eq!(
        dispatcher.interactor(contour).map(|i| i.name()),
        Some("ContourTool")
    );
    assert_eq!(
        dispatcher.interactor(contour).map(|i| i.mode()),
        Some(StateMode::Regular)
    );
}
