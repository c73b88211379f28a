//! Behaviour shared by every pattern object: identity, selection and
//! highlight flags, pre-order traversal and markup persistence.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::group::ShapeGroup;
use crate::markup::Element;
use crate::model::{ObjectType, SelectOp};
use crate::panel::PanelPolygon;
use crate::registry::{Handle, ObjectId};
use crate::sewing::Sewing;
use crate::shape::{CurveShape, KeyPoint};

/// Identity plus display flags. Cloning registers a fresh id and keeps the flags.
#[derive(Clone, Debug)]
pub struct ObjectState {
    id: ObjectId,
    selected: bool,
    highlighted: bool,
}

impl ObjectState {
    pub fn new(kind: ObjectType) -> Self {
        Self::from_id(ObjectId::new(kind))
    }

    pub fn with_id(id: u32, kind: ObjectType) -> Self {
        Self::from_id(ObjectId::with_id(id, kind))
    }

    fn from_id(id: ObjectId) -> Self {
        ObjectState {
            id,
            selected: false,
            highlighted: false,
        }
    }

    /// Checks the tag of `e` and registers the `id` it carries.
    pub fn from_element(e: &Element, kind: ObjectType) -> Result<Self> {
        e.expect_tag(kind.type_name())?;
        let id = e.require_u32("id")?;
        Ok(Self::with_id(id, kind))
    }

    /// Bare element for this object: tag and `id` only.
    pub fn element(&self) -> Element {
        let mut e = Element::new(self.id.kind().type_name());
        e.set_attr_u32("id", self.id.get());
        e
    }

    pub fn id(&self) -> u32 {
        self.id.get()
    }

    pub fn handle(&self) -> Handle {
        self.id.handle()
    }

    pub fn kind(&self) -> ObjectType {
        self.id.kind()
    }
}

/// Anything carrying a selected and a highlighted flag.
pub trait Selectable {
    fn is_selected(&self) -> bool;
    fn set_selected(&mut self, s: bool);
    fn is_highlighted(&self) -> bool;
    fn set_highlighted(&mut self, h: bool);
}

impl Selectable for ObjectState {
    fn is_selected(&self) -> bool {
        self.selected
    }
    fn set_selected(&mut self, s: bool) {
        self.selected = s;
    }
    fn is_highlighted(&self) -> bool {
        self.highlighted
    }
    fn set_highlighted(&mut self, h: bool) {
        self.highlighted = h;
    }
}

pub trait PanelObject {
    fn state(&self) -> &ObjectState;
    fn state_mut(&mut self) -> &mut ObjectState;
    fn object_type(&self) -> ObjectType;

    /// Markup element of this object and everything it owns.
    fn to_element(&self) -> Element;

    fn from_element(e: &Element) -> Result<Self>
    where
        Self: Sized;

    /// Self first, then owned descendants in storage order.
    fn collect_objects(&self) -> Vec<ObjectRef<'_>>;

    /// Same order as [`PanelObject::collect_objects`].
    fn collect_states_mut<'a>(&'a mut self, out: &mut Vec<&'a mut ObjectState>);

    fn id(&self) -> u32 {
        self.state().id()
    }

    fn handle(&self) -> Handle {
        self.state().handle()
    }

    fn type_name(&self) -> &'static str {
        self.object_type().type_name()
    }

    fn is_selected(&self) -> bool {
        self.state().selected
    }

    fn set_selected(&mut self, s: bool) {
        self.state_mut().selected = s;
    }

    fn is_highlighted(&self) -> bool {
        self.state().highlighted
    }

    fn set_highlighted(&mut self, h: bool) {
        self.state_mut().highlighted = h;
    }

    /// Append this object's element to `parent` and return it.
    fn serialize<'p>(&self, parent: &'p mut Element) -> &'p mut Element {
        parent.push_child(self.to_element())
    }
}

/// Borrowed view of any pattern object.
#[derive(Clone, Copy, Debug)]
pub enum ObjectRef<'a> {
    KeyPoint(&'a KeyPoint),
    Curve(&'a CurveShape),
    Group(&'a ShapeGroup),
    Panel(&'a PanelPolygon),
    Sewing(&'a Sewing),
}

impl<'a> ObjectRef<'a> {
    pub fn state(&self) -> &'a ObjectState {
        match *self {
            ObjectRef::KeyPoint(o) => o.state(),
            ObjectRef::Curve(o) => o.state(),
            ObjectRef::Group(o) => o.state(),
            ObjectRef::Panel(o) => o.state(),
            ObjectRef::Sewing(o) => o.state(),
        }
    }

    pub fn id(&self) -> u32 {
        self.state().id()
    }

    pub fn object_type(&self) -> ObjectType {
        match *self {
            ObjectRef::KeyPoint(o) => o.object_type(),
            ObjectRef::Curve(o) => o.object_type(),
            ObjectRef::Group(o) => o.object_type(),
            ObjectRef::Panel(o) => o.object_type(),
            ObjectRef::Sewing(o) => o.object_type(),
        }
    }

    pub fn is_selected(&self) -> bool {
        self.state().selected
    }

    pub fn is_highlighted(&self) -> bool {
        self.state().highlighted
    }

    pub fn as_curve(&self) -> Option<&'a CurveShape> {
        match *self {
            ObjectRef::Curve(c) => Some(c),
            _ => None,
        }
    }
}

/// Apply `op` to `items` with `indices` as targets. Out of range indices are
/// ignored. Returns whether any flag changed.
pub fn apply_select<S: Selectable + ?Sized>(items: &mut [&mut S], indices: &[usize], op: SelectOp) -> bool {
    let targets: BTreeSet<usize> = indices.iter().copied().filter(|&i| i < items.len()).collect();
    let mut changed = false;
    for (i, item) in items.iter_mut().enumerate() {
        let old = item.is_selected();
        let new = match op {
            SelectOp::SelectThis => targets.contains(&i),
            SelectOp::SelectUnion => old || targets.contains(&i),
            SelectOp::SelectUnionInverse => old ^ targets.contains(&i),
            SelectOp::SelectAll => true,
            SelectOp::SelectNone => false,
            SelectOp::SelectInverse => !old,
        };
        if new != old {
            item.set_selected(new);
            changed = true;
        }
    }
    changed
}

/// Move the highlight from `previous` to `index`. An invalid `index` only
/// clears.
pub fn apply_highlight<S: Selectable + ?Sized>(items: &mut [&mut S], index: Option<usize>, previous: Option<usize>) {
    if let Some(p) = previous.and_then(|p| items.get_mut(p)) {
        p.set_highlighted(false);
    }
    let len = items.len();
    match index {
        Some(i) if i < len => items[i].set_highlighted(true),
        Some(i) => debug!(index = i, len, "highlight index out of range"),
        None => {}
    }
}

/// Rebuild every child of `e` whose tag is one of `kinds`, in order. Other
/// children are skipped.
pub(crate) fn read_children<T, F>(e: &Element, accept: F) -> Result<Vec<T>>
where
    T: PanelObject,
    F: Fn(ObjectType) -> bool,
{
    let mut out = Vec::new();
    for child in &e.children {
        match ObjectType::from_type_name(&child.tag) {
            Some(kind) if accept(kind) => out.push(T::from_element(child)?),
            _ => debug!(parent = %e.tag, tag = %child.tag, "skipping unknown element"),
        }
    }
    Ok(out)
}
