//! Drawing closed or open contours point by point.

use horizon_interact_core::PropertyList;
use horizon_interact_core::logging::targets;

use crate::actions::{ActionContext, ActionRegistry, ConditionRegistry};
use crate::event::Point3;
use crate::interactor::Interactor;

/// Parameter of the event configuration that sets the closing distance.
pub const CLOSING_DISTANCE_PARAMETER: &str = "closing_distance";

/// Internal signal raised when a contour was closed.
pub const CONTOUR_CLOSED_SIGNAL: &str = "ContourClosed";

const DEFAULT_CLOSING_DISTANCE: f64 = 5.0;

/// Computes the path between two control points.
pub trait PathProvider {
    /// The points following `from` up to and including `to`.
    fn path(&self, from: Point3, to: Point3) -> Vec<Point3>;
}

/// Connects control points with straight segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLine;

impl PathProvider for StraightLine {
    fn path(&self, _from: Point3, to: Point3) -> Vec<Point3> {
        vec![to]
    }
}

/// A finished contour.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Every point of the contour, control points and path points alike.
    pub points: Vec<Point3>,
    /// Whether the last point connects back to the first.
    pub closed: bool,
}

/// Builds contours from clicks in world coordinates.
///
/// A press starts a contour, further presses add control points and a press
/// close to the first point closes it. Actions fail for events that carry no
/// world position.
pub struct ContourInteractor {
    control_points: Vec<Point3>,
    segments: Vec<Vec<Point3>>,
    preview: Option<Point3>,
    closed: bool,
    closing_distance: f64,
    path_provider: Box<dyn PathProvider>,
    finished: Vec<Contour>,
    signals: Vec<String>,
}

impl Default for ContourInteractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContourInteractor {
    /// Create an interactor connecting points with straight lines.
    pub fn new() -> Self {
        Self::with_path_provider(StraightLine)
    }

    /// Create an interactor using `provider` between control points.
    pub fn with_path_provider(provider: impl PathProvider + 'static) -> Self {
        Self {
            control_points: Vec::new(),
            segments: Vec::new(),
            preview: None,
            closed: false,
            closing_distance: DEFAULT_CLOSING_DISTANCE,
            path_provider: Box::new(provider),
            finished: Vec::new(),
            signals: Vec::new(),
        }
    }

    /// Control points of the contour being drawn.
    pub fn control_points(&self) -> &[Point3] {
        &self.control_points
    }

    /// All points of the contour being drawn.
    pub fn contour(&self) -> Vec<Point3> {
        self.control_points
            .first()
            .into_iter()
            .copied()
            .chain(self.segments.iter().flatten().copied())
            .collect()
    }

    /// Where the next point would go.
    pub fn preview(&self) -> Option<Point3> {
        self.preview
    }

    /// Whether the contour being drawn is closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Contours finished so far.
    pub fn finished_contours(&self) -> &[Contour] {
        &self.finished
    }

    /// Distance to the first point below which a click closes the contour.
    pub fn closing_distance(&self) -> f64 {
        self.closing_distance
    }

    /// Set the closing distance.
    pub fn set_closing_distance(&mut self, distance: f64) {
        self.closing_distance = distance;
    }

    fn clear(&mut self) {
        self.control_points.clear();
        self.segments.clear();
        self.preview = None;
        self.closed = false;
    }

    fn init_contour(&mut self, ctx: &ActionContext<'_>) -> bool {
        let Some(point) = ctx.event().world_position() else {
            return false;
        };
        self.clear();
        self.control_points.push(point);
        true
    }

    fn add_point(&mut self, ctx: &ActionContext<'_>) -> bool {
        let (Some(&last), Some(point)) = (self.control_points.last(), ctx.event().world_position())
        else {
            return false;
        };
        self.segments.push(self.path_provider.path(last, point));
        self.control_points.push(point);
        self.preview = None;
        true
    }

    fn move_preview(&mut self, ctx: &ActionContext<'_>) -> bool {
        if self.control_points.is_empty() {
            return false;
        }
        match ctx.event().world_position() {
            Some(point) => {
                self.preview = Some(point);
                true
            }
            None => false,
        }
    }

    fn remove_last_point(&mut self) -> bool {
        if self.control_points.len() < 2 {
            return false;
        }
        self.control_points.pop();
        self.segments.pop();
        true
    }

    fn close_contour(&mut self) -> bool {
        let (Some(&first), Some(&last)) = (self.control_points.first(), self.control_points.last())
        else {
            return false;
        };
        if self.control_points.len() < 3 {
            return false;
        }
        self.segments.push(self.path_provider.path(last, first));
        self.closed = true;
        self.preview = None;
        self.signals.push(CONTOUR_CLOSED_SIGNAL.to_string());
        true
    }

    fn finish_contour(&mut self) -> bool {
        if self.control_points.len() >= 2 {
            let mut points = self.contour();
            if self.closed {
                // The closing segment ends on the first point.
                points.pop();
            }
            tracing::debug!(target: targets::STATE_MACHINE, points = points.len(), closed = self.closed, "contour finished");
            self.finished.push(Contour {
                points,
                closed: self.closed,
            });
        }
        self.clear();
        true
    }

    fn is_near_first_point(&self, ctx: &ActionContext<'_>) -> bool {
        let (Some(first), Some(point)) = (self.control_points.first(), ctx.event().world_position())
        else {
            return false;
        };
        self.control_points.len() >= 3 && first.distance(&point) <= self.closing_distance
    }
}

impl Interactor for ContourInteractor {
    fn connect_actions(&self, actions: &mut ActionRegistry<Self>) {
        actions.add_action("InitContour", |tool: &mut Self, ctx: &ActionContext<'_>| {
            tool.init_contour(ctx)
        });
        actions.add_action("AddPoint", |tool: &mut Self, ctx: &ActionContext<'_>| {
            tool.add_point(ctx)
        });
        actions.add_action("MovePreview", |tool: &mut Self, ctx: &ActionContext<'_>| {
            tool.move_preview(ctx)
        });
        actions.add_action("RemoveLastPoint", |tool: &mut Self, _: &ActionContext<'_>| {
            tool.remove_last_point()
        });
        actions.add_action("CloseContour", |tool: &mut Self, _: &ActionContext<'_>| {
            tool.close_contour()
        });
        actions.add_action("FinishContour", |tool: &mut Self, _: &ActionContext<'_>| {
            tool.finish_contour()
        });
        actions.add_action("ClearContour", |tool: &mut Self, _: &ActionContext<'_>| {
            tool.clear();
            true
        });
    }

    fn connect_conditions(&self, conditions: &mut ConditionRegistry<Self>) {
        conditions.add_condition("IsNearFirstPoint", |tool: &Self, ctx: &ActionContext<'_>| {
            tool.is_near_first_point(ctx)
        });
    }

    fn configuration_changed(&mut self, parameters: &PropertyList) {
        self.closing_distance = parameters
            .get_float(CLOSING_DISTANCE_PARAMETER)
            .unwrap_or(DEFAULT_CLOSING_DISTANCE);
    }

    fn take_internal_signals(&mut self) -> Vec<String> {
        std::mem::take(&mut self.signals)
    }
}

impl std::fmt::Debug for ContourInteractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContourInteractor")
            .field("control_points", &self.control_points.len())
            .field("closed", &self.closed)
            .field("closing_distance", &self.closing_distance)
            .field("finished", &self.finished.len())
            .finish()
    }
}
