//! Stepping through the slices of a volume.

use horizon_interact_core::{DataNode, PropertyList, Signal};

use crate::actions::{ActionContext, ActionRegistry};
use crate::event::InteractionEvent;
use crate::interactor::Interactor;

/// Parameter of the event configuration that sets the slice step.
pub const SLICE_STEP_PARAMETER: &str = "slice_step";

/// Parameter of the event configuration that enables wrap-around.
pub const WRAP_AROUND_PARAMETER: &str = "wrap_around";

/// Action parameter multiplying the step.
const STEPS_PARAMETER: &str = "steps";

/// Moves through slices on wheel and arrow key events.
///
/// Unlike most interactors it does not depend on the visibility of a data
/// node: every event is offered to the behavior.
///
/// Moving fails at the first and last slice unless wrap-around is enabled, so
/// the event stays available to other interactors.
pub struct SliceNavigator {
    slice_count: usize,
    current: usize,
    step: usize,
    wrap_around: bool,
    slice_changed: Signal<usize>,
}

impl SliceNavigator {
    /// Create a navigator over `slice_count` slices, starting at slice 0.
    pub fn new(slice_count: usize) -> Self {
        Self {
            slice_count,
            current: 0,
            step: 1,
            wrap_around: false,
            slice_changed: Signal::new(),
        }
    }

    /// The current slice.
    pub fn current_slice(&self) -> usize {
        self.current
    }

    /// Number of slices.
    pub fn slice_count(&self) -> usize {
        self.slice_count
    }

    /// Slices moved per step.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Whether moving past either end wraps around.
    pub fn wraps_around(&self) -> bool {
        self.wrap_around
    }

    /// Emitted with the new slice index.
    pub fn slice_changed(&self) -> &Signal<usize> {
        &self.slice_changed
    }

    /// Jump to `slice`. Returns `false` if it is out of range or already current.
    pub fn set_current_slice(&mut self, slice: usize) -> bool {
        if slice >= self.slice_count || slice == self.current {
            return false;
        }
        self.current = slice;
        self.slice_changed.emit(slice);
        true
    }

    fn move_by(&mut self, delta: i64) -> bool {
        if self.slice_count == 0 {
            return false;
        }
        let count = self.slice_count as i64;
        let target = (self.current as i64).saturating_add(delta);
        let target = if self.wrap_around {
            target.rem_euclid(count)
        } else {
            target.clamp(0, count - 1)
        };
        self.set_current_slice(target as usize)
    }

    fn steps(&self, ctx: &ActionContext<'_>) -> i64 {
        let multiplier = ctx.parameters().get_int(STEPS_PARAMETER).unwrap_or(1);
        i64::try_from(self.step)
            .unwrap_or(i64::MAX)
            .saturating_mul(multiplier)
    }
}

impl Interactor for SliceNavigator {
    fn connect_actions(&self, actions: &mut ActionRegistry<Self>) {
        actions.add_action("NextSlice", |nav: &mut Self, ctx: &ActionContext<'_>| {
            let delta = nav.steps(ctx);
            nav.move_by(delta)
        });
        actions.add_action("PreviousSlice", |nav: &mut Self, ctx: &ActionContext<'_>| {
            let delta = nav.steps(ctx);
            nav.move_by(delta.saturating_neg())
        });
    }

    fn filter_event(&self, _event: &InteractionEvent, _node: Option<&DataNode>) -> bool {
        true
    }

    fn configuration_changed(&mut self, parameters: &PropertyList) {
        self.step = parameters
            .get_int(SLICE_STEP_PARAMETER)
            .and_then(|step| usize::try_from(step).ok())
            .filter(|step| *step > 0)
            .unwrap_or(1);
        self.wrap_around = parameters.get_bool(WRAP_AROUND_PARAMETER).unwrap_or(false);
    }
}

impl std::fmt::Debug for SliceNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceNavigator")
            .field("slice_count", &self.slice_count)
            .field("current", &self.current)
            .field("step", &self.step)
            .field("wrap_around", &self.wrap_around)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_bounds() {
        let mut nav = SliceNavigator::new(3);
        assert!(!nav.move_by(-1));
        assert!(nav.move_by(5));
        assert_eq!(nav.current_slice(), 2);
        assert!(!nav.move_by(1));
        assert!(!nav.set_current_slice(3));
    }

    #[test]
    fn test_wrap_around_and_step() {
        let mut nav = SliceNavigator::new(4);
        let parameters: PropertyList = [(SLICE_STEP_PARAMETER, "3"), (WRAP_AROUND_PARAMETER, "true")]
            .into_iter()
            .collect();
        nav.configuration_changed(&parameters);
        assert_eq!(nav.step(), 3);
        assert!(nav.wraps_around());

        let seen = Arc::new(AtomicUsize::new(usize::MAX));
        let sink = seen.clone();
        nav.slice_changed().connect(move |slice: &usize| sink.store(*slice, Ordering::SeqCst));

        assert!(nav.move_by(-1));
        assert_eq!(nav.current_slice(), 3);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_invalid_step_falls_back() {
        let mut nav = SliceNavigator::new(4);
        let parameters: PropertyList = [(SLICE_STEP_PARAMETER, "-2")].into_iter().collect();
        nav.configuration_changed(&parameters);
        assert_eq!(nav.step(), 1);
    }

    #[test]
    fn test_huge_step_saturates() {
        let mut nav = SliceNavigator::new(5);
        let parameters: PropertyList = [(SLICE_STEP_PARAMETER, "1000000000000000000")]
            .into_iter()
            .collect();
        nav.configuration_changed(&parameters);
        assert_eq!(nav.step(), 1_000_000_000_000_000_000);

        let action: PropertyList = [(STEPS_PARAMETER, "10")].into_iter().collect();
        let event = InteractionEvent::key("PageUp");
        let ctx = ActionContext::new("NextSlice", &action, &event, None);
        assert_eq!(nav.steps(&ctx), i64::MAX);

        assert!(nav.move_by(nav.steps(&ctx)));
        assert_eq!(nav.current_slice(), 4);
        assert!(nav.move_by(i64::MIN));
        assert_eq!(nav.current_slice(), 0);
    }

    #[test]
    fn test_empty_volume() {
        let mut nav = SliceNavigator::new(0);
        assert!(!nav.move_by(1));
    }
}
