//! Curve geometry, panels and seams of garment sewing patterns.
//!
//! Every pattern object carries a registered id (see [`registry`]). Curves are
//! owned by groups, groups by panels; sewings only hold generation-checked
//! handles to the curves they join. Documents persist as a markup tree of
//! named elements, encoded as JSON.

pub mod config;
pub mod error;
pub mod group;
pub mod markup;
pub mod model;
pub mod object;
pub mod panel;
pub mod pattern;
pub mod registry;
pub mod sewing;
pub mod shape;
pub mod geometry {
    pub mod bezier;
    pub mod fit;
    pub mod math;
    pub mod tolerance;
}

pub use config::SamplingConfig;
pub use error::{PanelError, Result};
pub use group::ShapeGroup;
pub use markup::Element;
pub use model::{Bound, ObjectType, SelectOp};
pub use object::{ObjectRef, ObjectState, PanelObject, Selectable};
pub use panel::PanelPolygon;
pub use pattern::{Pattern, Seam, SeamSegment};
pub use registry::{Handle, IdRegistry, ObjectId};
pub use sewing::{Sewing, Unit};
pub use shape::{Curve, CurveShape, KeyPoint};
