//! Event configuration loading and variant lookup.

use horizon_interact::resource::BUILTIN_MODULE;
use horizon_interact::{
    EventConfig, EventFactory, EventMapping, InteractionEvent, KeyboardModifiers, MouseButton,
    MouseButtons, Point2, Point3, ResourceManager,
};
use horizon_interact_core::PropertyList;

fn press(button: MouseButton) -> InteractionEvent {
    InteractionEvent::mouse_press(Point2::new(10.0, 20.0), button)
}

#[test]
fn test_builtin_contour_config() {
    let resources = ResourceManager::with_builtin();
    let mut config = EventConfig::new();
    assert!(config
        .load_config_from(&resources, "ContourToolConfig.xml", BUILTIN_MODULE)
        .unwrap());
    assert!(config.is_valid());
    assert_eq!(config.attributes().get_float("closing_distance"), Some(5.0));

    let click = press(MouseButton::Left).with_world_position(Point3::new(1.0, 2.0, 3.0));
    assert_eq!(config.mapped_event(&click).as_deref(), Some("PrimaryButtonPressed"));

    let hover = InteractionEvent::mouse_move(Point2::new(3.0, 3.0), MouseButtons::NONE);
    assert_eq!(config.mapped_event(&hover).as_deref(), Some("MouseMove"));

    assert_eq!(
        config.mapped_event(&InteractionEvent::key("Backspace")).as_deref(),
        Some("DeleteLastPoint")
    );
    assert_eq!(config.mapped_event(&press(MouseButton::Middle)), None);
}

#[test]
fn test_builtin_display_config_wheel_directions() {
    let resources = ResourceManager::with_builtin();
    let mut config = EventConfig::new();
    assert!(config
        .load_config_from(&resources, "DisplayConfig.xml", BUILTIN_MODULE)
        .unwrap());

    for delta in [1, 5, 120] {
        let up = InteractionEvent::wheel(Point2::default(), delta);
        assert_eq!(config.mapped_event(&up).as_deref(), Some("ScrollUp"));
        let down = InteractionEvent::wheel(Point2::default(), -delta);
        assert_eq!(config.mapped_event(&down).as_deref(), Some("ScrollDown"));
    }

    let ctrl_up =
        InteractionEvent::wheel(Point2::default(), 1).with_modifiers(KeyboardModifiers::CTRL);
    assert_eq!(config.mapped_event(&ctrl_up), None);
}

#[test]
fn test_missing_resource_is_fatal() {
    let resources = ResourceManager::with_builtin();
    let mut config = EventConfig::parse(
        r#"<config><event_variant class="MouseMoveEvent" name="Move"/></config>"#,
    );

    let err = config
        .load_config_from(&resources, "NoSuchConfig.xml", BUILTIN_MODULE)
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(config.len(), 1);
}

#[test]
fn test_unknown_class_is_skipped() {
    let config = EventConfig::parse(
        r#"<config>
             <event_variant class="TouchEvent" name="Tap"/>
             <event_variant class="InteractionPositionEvent" name="Anything"/>
             <event_variant class="MousePressEvent" name="Select">
               <attribute name="EventButton" value="left"/>
             </event_variant>
           </config>"#,
    );
    assert!(!config.is_valid());
    assert_eq!(config.len(), 1);
    assert_eq!(config.mapped_event(&press(MouseButton::Left)).as_deref(), Some("Select"));
}

#[test]
fn test_wheel_variant_without_direction_is_rejected() {
    let config = EventConfig::parse(
        r#"<config>
             <event_variant class="MouseWheelEvent" name="Scroll"/>
             <event_variant class="MouseWheelEvent" name="ScrollUp">
               <attribute name="ScrollDirection" value="up"/>
             </event_variant>
           </config>"#,
    );
    assert!(!config.is_valid());
    assert_eq!(config.len(), 1);
    assert_eq!(
        config.mapped_event(&InteractionEvent::wheel(Point2::default(), 120)).as_deref(),
        Some("ScrollUp")
    );
    assert_eq!(config.mapped_event(&InteractionEvent::wheel(Point2::default(), -120)), None);
}

#[test]
fn test_later_declaration_wins() {
    let mut config = EventConfig::parse(
        r#"<config>
             <event_variant class="MousePressEvent" name="Select">
               <attribute name="EventButton" value="LeftMouseButton"/>
             </event_variant>
             <event_variant class="MousePressEvent" name="Pan">
               <attribute name="EventButton" value="MiddleMouseButton"/>
             </event_variant>
           </config>"#,
    );
    assert!(config.add_config_str(
        r#"<config>
             <param name="mode" value="override"/>
             <event_variant class="MousePressEvent" name="Paint">
               <attribute name="EventButton" value="LeftMouseButton"/>
             </event_variant>
           </config>"#
    ));

    assert_eq!(config.len(), 2);
    assert_eq!(config.mapped_event(&press(MouseButton::Left)).as_deref(), Some("Paint"));
    assert_eq!(config.mapped_event(&press(MouseButton::Middle)).as_deref(), Some("Pan"));
    assert_eq!(config.attributes().get_string("mode").as_deref(), Some("override"));
}

#[test]
fn test_insert_mapping_twice_keeps_one() {
    let mut config = EventConfig::new();
    let attributes: PropertyList = [("Key", "Z"), ("Modifiers", "ctrl")].into_iter().collect();
    let template = EventFactory::create_event("InteractionKeyEvent", &attributes).unwrap();

    config.insert_mapping(EventMapping::new(template.clone(), "Undo"));
    config.insert_mapping(EventMapping::new(template, "Revert"));
    assert_eq!(config.len(), 1);

    let event = InteractionEvent::key("Z").with_modifiers(KeyboardModifiers::CTRL);
    assert_eq!(config.mapped_event(&event).as_deref(), Some("Revert"));
    // Without the modifier the key falls back to its standard name.
    assert_eq!(config.mapped_event(&InteractionEvent::key("Z")).as_deref(), Some("StdZ"));
}

#[test]
fn test_internal_events_bypass_mappings() {
    let config = EventConfig::parse(
        r#"<config>
             <event_variant class="InternalEvent" name="Renamed">
               <attribute name="SignalName" value="ContourClosed"/>
             </event_variant>
           </config>"#,
    );
    assert!(config.is_valid());
    let event = InteractionEvent::internal("ContourClosed", None);
    assert_eq!(config.mapped_event(&event).as_deref(), Some("ContourClosed"));
}

#[test]
fn test_syntax_error_leaves_content() {
    let mut config = EventConfig::parse(
        r#"<config><event_variant class="MouseMoveEvent" name="Move"/></config>"#,
    );
    assert!(config.is_valid());

    assert!(!config.add_config_str("<config><event_variant class=\"MouseMoveEvent\">"));
    assert!(!config.is_valid());
    assert_eq!(config.len(), 1);

    config.clear_config();
    assert!(config.is_empty());
    assert!(config.is_valid());
}
