//! Interactors shipped with the built-in resources.
//!
//! | Interactor | Behavior | Configuration |
//! |------------|----------|---------------|
//! | [`ContourInteractor`] | `ContourTool.xml` | `ContourToolConfig.xml` |
//! | [`SliceNavigator`] | `SliceNavigation.xml` | `DisplayConfig.xml` |
//!
//! All documents live in [`BUILTIN_MODULE`](crate::resource::BUILTIN_MODULE).

mod contour;
mod slice_navigator;

pub use contour::{Contour, ContourInteractor, PathProvider, StraightLine};
pub use slice_navigator::SliceNavigator;
