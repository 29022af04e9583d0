//! Event configurations: mapping concrete events to symbolic variant names.
//!
//! A configuration document lists event variants and free-form parameters:
//!
//! ```xml
//! <config>
//!   <param name="closing_distance" value="5.0"/>
//!   <event_variant class="MousePressEvent" name="PrimaryButtonPressed">
//!     <attribute name="EventButton" value="LeftMouseButton"/>
//!   </event_variant>
//!   <event_variant class="MouseWheelEvent" name="ScrollUp">
//!     <attribute name="ScrollDirection" value="up"/>
//!   </event_variant>
//! </config>
//! ```
//!
//! Each `event_variant` becomes a template event (see [`EventFactory`]) paired
//! with its name. [`EventConfig::mapped_event`] classifies a concrete event by
//! returning the name of the first template it matches.
//!
//! Inserting a mapping removes every existing mapping whose template matches
//! the new one, so a later declaration of the same event always wins and the
//! list never holds two mappings for the same kind of event.

use std::borrow::Cow;

use horizon_interact_core::logging::{span_names, targets};
use horizon_interact_core::{PerfSpan, PropertyList};

use crate::error::{Error, Result};
use crate::event::{EventData, EventFactory, InteractionEvent};
use crate::resource::ResourceManager;
use crate::xml::{self, XmlEvent, XmlReader};

/// Prefix of the variant names synthesized for unmapped key events.
pub const KEY_FALLBACK_PREFIX: &str = "Std";

const CONFIG_ELEMENT: &str = "config";
const PARAM_ELEMENT: &str = "param";
const EVENT_VARIANT_ELEMENT: &str = "event_variant";
const ATTRIBUTE_ELEMENT: &str = "attribute";

/// A template event paired with the variant name it maps to.
#[derive(Debug, Clone)]
pub struct EventMapping {
    template: InteractionEvent,
    variant: String,
}

impl EventMapping {
    /// Pair a template with a variant name.
    pub fn new(template: InteractionEvent, variant: impl Into<String>) -> Self {
        Self {
            template,
            variant: variant.into(),
        }
    }

    /// The template event.
    pub fn template(&self) -> &InteractionEvent {
        &self.template
    }

    /// The variant name.
    pub fn variant(&self) -> &str {
        &self.variant
    }
}

/// An ordered set of event mappings plus free-form configuration parameters.
#[derive(Debug, Clone, Default)]
pub struct EventConfig {
    mappings: Vec<EventMapping>,
    attributes: PropertyList,
    errors: bool,
}

impl EventConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration document.
    ///
    /// Problems are logged and reflected by [`is_valid`](Self::is_valid).
    pub fn parse(text: &str) -> Self {
        let mut config = Self::new();
        config.add_config_str(text);
        config
    }

    /// Load a configuration from the global resource manager.
    pub fn from_resource(file: &str, module: &str) -> Result<Self> {
        let mut config = Self::new();
        config.load_config(file, module)?;
        Ok(config)
    }

    /// Replace the configuration with the resource `file` of `module`.
    ///
    /// Returns `Err` if the resource does not exist and `Ok(false)` if it could
    /// not be parsed completely. A missing resource leaves the configuration
    /// untouched.
    pub fn load_config(&mut self, file: &str, module: &str) -> Result<bool> {
        self.load_config_from(ResourceManager::global(), file, module)
    }

    /// [`load_config`](Self::load_config) with an explicit resource manager.
    pub fn load_config_from(
        &mut self,
        resources: &ResourceManager,
        file: &str,
        module: &str,
    ) -> Result<bool> {
        let _span = PerfSpan::for_resource(span_names::LOAD_CONFIG, module, file);
        let text = resources.load_text(module, file)?;
        self.clear_config();
        Ok(self.add_config_str(&text))
    }

    /// Merge the resource `file` of `module` on top of the current configuration.
    ///
    /// Mappings of the merged resource replace matching existing ones and its
    /// parameters overwrite parameters of the same name.
    pub fn add_config(&mut self, file: &str, module: &str) -> Result<bool> {
        self.add_config_from(ResourceManager::global(), file, module)
    }

    /// [`add_config`](Self::add_config) with an explicit resource manager.
    pub fn add_config_from(
        &mut self,
        resources: &ResourceManager,
        file: &str,
        module: &str,
    ) -> Result<bool> {
        let _span = PerfSpan::for_resource(span_names::LOAD_CONFIG, module, file);
        let text = resources.load_text(module, file)?;
        Ok(self.add_config_str(&text))
    }

    /// Replace the configuration with a document given as text.
    pub fn load_config_str(&mut self, text: &str) -> bool {
        self.clear_config();
        self.add_config_str(text)
    }

    /// Merge a document given as text.
    ///
    /// A document that is not well formed is rejected as a whole. Entries that
    /// cannot be interpreted are skipped with a warning. Either way the error
    /// flag is set and `false` is returned.
    pub fn add_config_str(&mut self, text: &str) -> bool {
        let document = match read_document(text) {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(target: targets::CONFIG, error = %e, "malformed event configuration");
                self.errors = true;
                return false;
            }
        };

        let mut ok = document.problems.is_empty();
        for problem in &document.problems {
            tracing::warn!(target: targets::CONFIG, "{problem}");
        }

        for (name, value) in document.params {
            self.attributes.set(name, value);
        }

        for variant in document.variants {
            if let Err(e) = self.add_variant(&variant.class, &variant.name, &variant.attributes) {
                tracing::warn!(
                    target: targets::CONFIG,
                    variant = %variant.name,
                    class = %variant.class,
                    error = %e,
                    "skipping event variant"
                );
                ok = false;
            }
        }

        if !ok {
            self.errors = true;
        }
        tracing::debug!(
            target: targets::CONFIG,
            mappings = self.mappings.len(),
            params = self.attributes.len(),
            ok,
            "event configuration parsed"
        );
        ok
    }

    /// Create a template of `class` from `attributes` and map it to `name`.
    pub fn add_variant(&mut self, class: &str, name: &str, attributes: &PropertyList) -> Result<()> {
        let template = EventFactory::create_event(class, attributes)?;
        self.insert_mapping(EventMapping::new(template, name));
        Ok(())
    }

    /// Append a mapping, first removing every mapping whose template matches
    /// the new template.
    pub fn insert_mapping(&mut self, mapping: EventMapping) {
        let before = self.mappings.len();
        self.mappings
            .retain(|existing| !existing.template.matches_template(&mapping.template));
        let replaced = before - self.mappings.len();
        if replaced > 0 {
            tracing::trace!(
                target: targets::CONFIG,
                variant = %mapping.variant,
                replaced,
                "replacing event mapping"
            );
        }
        self.mappings.push(mapping);
    }

    /// The variant name `event` maps to.
    ///
    /// Internal events map to their signal name. Other events map to the
    /// variant of the first matching template. Unmatched key events map to
    /// [`KEY_FALLBACK_PREFIX`] followed by the key, e.g. `"StdA"`; anything
    /// else unmatched has no variant.
    pub fn mapped_event<'a>(&'a self, event: &'a InteractionEvent) -> Option<Cow<'a, str>> {
        if let EventData::Internal(internal) = event.data() {
            return Some(Cow::Borrowed(internal.signal_name.as_str()));
        }

        if let Some(mapping) = self
            .mappings
            .iter()
            .find(|mapping| event.matches_template(&mapping.template))
        {
            return Some(Cow::Borrowed(mapping.variant.as_str()));
        }

        event
            .key_name()
            .map(|key| Cow::Owned(format!("{KEY_FALLBACK_PREFIX}{key}")))
    }

    /// Drop all mappings and parameters and reset the error flag.
    pub fn clear_config(&mut self) {
        self.mappings.clear();
        self.attributes.clear();
        self.errors = false;
    }

    /// Free-form `<param>` values.
    pub fn attributes(&self) -> &PropertyList {
        &self.attributes
    }

    /// Set a free-form parameter.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.set(name, value);
    }

    /// The mappings in lookup order.
    pub fn mappings(&self) -> &[EventMapping] {
        &self.mappings
    }

    /// Whether every document loaded since the last reset parsed cleanly.
    pub fn is_valid(&self) -> bool {
        !self.errors
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether there are no mappings.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

struct VariantEntry {
    class: String,
    name: String,
    attributes: PropertyList,
}

#[derive(Default)]
struct ConfigDocument {
    params: Vec<(String, String)>,
    variants: Vec<VariantEntry>,
    problems: Vec<String>,
}

/// Read a configuration document. Only syntax errors fail; structural
/// problems are collected so the rest of the document can still be used.
fn read_document(text: &str) -> Result<ConfigDocument> {
    let mut reader = XmlReader::from_str(text);
    let mut document = ConfigDocument::default();
    let mut current: Option<VariantEntry> = None;
    let mut seen_root = false;

    while let Some(event) = reader.next()? {
        let (name, attributes, empty) = match event {
            XmlEvent::StartElement { name, attributes } => (name, attributes, false),
            XmlEvent::EmptyElement { name, attributes } => (name, attributes, true),
            XmlEvent::EndElement { name } => {
                if name.eq_ignore_ascii_case(EVENT_VARIANT_ELEMENT) {
                    if let Some(variant) = current.take() {
                        document.variants.push(variant);
                    }
                }
                continue;
            }
            XmlEvent::Text(_) => continue,
        };

        if name.eq_ignore_ascii_case(CONFIG_ELEMENT) {
            seen_root = true;
        } else if name.eq_ignore_ascii_case(PARAM_ELEMENT) {
            match (
                xml::attribute(&attributes, "name"),
                xml::attribute(&attributes, "value"),
            ) {
                (Some(key), Some(value)) => document.params.push((key.to_string(), value.to_string())),
                _ => document
                    .problems
                    .push("<param> requires 'name' and 'value' attributes".to_string()),
            }
        } else if name.eq_ignore_ascii_case(EVENT_VARIANT_ELEMENT) {
            if current.is_some() {
                return Err(Error::xml(reader.position(), "nested <event_variant>"));
            }
            let class = xml::attribute(&attributes, "class");
            let variant = xml::attribute(&attributes, "name");
            let entry = match (class, variant) {
                (Some(class), Some(variant)) => Some(VariantEntry {
                    class: class.to_string(),
                    name: variant.to_string(),
                    attributes: PropertyList::new(),
                }),
                _ => {
                    document
                        .problems
                        .push("<event_variant> requires 'class' and 'name' attributes".to_string());
                    None
                }
            };
            match (entry, empty) {
                (Some(entry), true) => document.variants.push(entry),
                (Some(entry), false) => current = Some(entry),
                (None, true) => {}
                // Collect (and drop) the attributes of the broken variant.
                (None, false) => {
                    current = Some(VariantEntry {
                        class: String::new(),
                        name: String::new(),
                        attributes: PropertyList::new(),
                    })
                }
            }
        } else if name.eq_ignore_ascii_case(ATTRIBUTE_ELEMENT) {
            let Some(variant) = current.as_mut() else {
                document
                    .problems
                    .push("<attribute> outside of <event_variant>".to_string());
                continue;
            };
            match (
                xml::attribute(&attributes, "name"),
                xml::attribute(&attributes, "value"),
            ) {
                (Some(key), Some(value)) => variant.attributes.set(key, value),
                _ => document
                    .problems
                    .push("<attribute> requires 'name' and 'value' attributes".to_string()),
            }
        } else {
            tracing::debug!(target: targets::CONFIG, element = %name, "ignoring unknown element");
        }
    }

    document.variants.retain(|variant| !variant.class.is_empty());
    if !seen_root {
        document
            .problems
            .push(format!("missing <{CONFIG_ELEMENT}> root element"));
    }
    Ok(document)
}
