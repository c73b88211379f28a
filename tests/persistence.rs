use glam::Vec2;
use parking_lot::Mutex;
use sewkit::{
    CurveShape, Element, ObjectType, PanelError, PanelObject, PanelPolygon, Pattern, Sewing,
    ShapeGroup, Unit,
};

// Ids freed by one test may be claimed by another running in parallel, so
// every test here holds this lock while it allocates.
static SERIAL: Mutex<()> = parking_lot::const_mutex(());

fn v(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

fn bodice() -> PanelPolygon {
    let mut outer = ShapeGroup::new();
    outer.append(CurveShape::line(v(0.0, 0.0), v(20.0, 0.0)));
    outer.append(CurveShape::cubic(v(20.0, 0.0), v(22.0, 10.0), v(18.0, 20.0), v(20.0, 30.0)));
    outer.append(CurveShape::quadratic(v(20.0, 30.0), v(10.0, 33.3), v(0.0, 30.0)));
    outer.append(CurveShape::line(v(0.0, 30.0), v(0.0, 0.0)));
    let mut dart = ShapeGroup::new();
    dart.append(CurveShape::line(v(8.0, 0.0), v(10.0, 9.5)));
    dart.append(CurveShape::line(v(10.0, 9.5), v(12.0, 0.0)));
    let mut inner = ShapeGroup::new();
    inner.append(CurveShape::line(v(0.0, 15.0), v(20.0, 15.0)));

    let mut p = PanelPolygon::new();
    p.set_outer(outer);
    p.add_dart(dart);
    p.add_inner_line(inner);
    p
}

fn side_seam_pattern() -> Pattern {
    let front = bodice();
    let mut back = bodice();
    back.translate(v(40.0, 0.0));
    let mut sewing = Sewing::new();
    sewing.add_first(Unit::of(front.outer().unwrap().get(1).unwrap(), false));
    sewing.add_second(Unit::of(back.outer().unwrap().get(3).unwrap(), true));
    let mut pat = Pattern::new();
    pat.add_panel(front);
    pat.add_panel(back);
    pat.add_sewing(sewing);
    pat
}

type Snapshot = Vec<(u32, ObjectType, Vec<Vec2>)>;

fn snapshot(pat: &Pattern) -> Snapshot {
    pat.collect_objects()
        .iter()
        .map(|o| {
            let geometry = o.as_curve().map(CurveShape::positions).unwrap_or_default();
            (o.id(), o.object_type(), geometry)
        })
        .collect()
}

#[test]
fn pattern_round_trip_keeps_ids_geometry_and_membership() {
    let _guard = SERIAL.lock();
    let pat = side_seam_pattern();
    let before = snapshot(&pat);
    let seam_ids: Vec<(u32, u32)> = pat
        .sewings()
        .iter()
        .map(|s| (s.firsts()[0].id(), s.seconds()[0].id()))
        .collect();
    let text = pat.to_json_string();
    drop(pat);

    let back = Pattern::from_json_str(&text).unwrap();
    assert_eq!(snapshot(&back), before);
    let after: Vec<(u32, u32)> = back
        .sewings()
        .iter()
        .map(|s| (s.firsts()[0].id(), s.seconds()[0].id()))
        .collect();
    assert_eq!(after, seam_ids);
    assert!(back.sewings()[0].seconds()[0].reversed);

    // units bind to the rebuilt shapes
    let seam = back.seam(&back.sewings()[0]);
    assert_eq!(seam.firsts.len(), 1);
    assert_eq!(seam.seconds.len(), 1);
    assert_eq!(seam.firsts[0].shape.object_type(), ObjectType::Cubic);
}

#[test]
fn group_round_trip_reproduces_ids() {
    let _guard = SERIAL.lock();
    let g = bodice().outer().cloned().unwrap();
    let ids: Vec<u32> = g.collect_objects().iter().map(|o| o.id()).collect();
    let e = g.to_element();
    drop(g);
    let back = ShapeGroup::from_element(&e).unwrap();
    let back_ids: Vec<u32> = back.collect_objects().iter().map(|o| o.id()).collect();
    assert_eq!(back_ids, ids);
    assert_eq!(back.to_element(), e);
}

#[test]
fn reloading_while_the_source_lives_assigns_fresh_ids() {
    let _guard = SERIAL.lock();
    let p = bodice();
    let back = PanelPolygon::from_element(&p.to_element()).unwrap();
    assert_ne!(back.id(), p.id());
    assert_eq!(back.collect_objects().len(), p.collect_objects().len());
    assert_eq!(back.bound(), p.bound());
}

#[test]
fn reloading_a_live_pattern_binds_seams_to_the_copy() {
    let _guard = SERIAL.lock();
    let pat = side_seam_pattern();
    let back = Pattern::from_json_str(&pat.to_json_string()).unwrap();

    let seam = back.seam(&back.sewings()[0]);
    assert_eq!(seam.firsts.len(), 1);
    assert_eq!(seam.seconds.len(), 1);
    assert!(seam.seconds[0].reversed);
    // bound to the reloaded shapes, not the source ones still alive
    let first = back.panels()[0].outer().and_then(|g| g.get(1)).unwrap();
    let second = back.panels()[1].outer().and_then(|g| g.get(3)).unwrap();
    assert_eq!(seam.firsts[0].shape.handle(), first.handle());
    assert_eq!(seam.seconds[0].shape.handle(), second.handle());
    assert_ne!(first.id(), pat.panels()[0].outer().and_then(|g| g.get(1)).unwrap().id());

    let mut back = back;
    assert_eq!(back.prune_sewings(), 0);
}

#[test]
fn ids_taken_by_an_unrelated_pattern_do_not_capture_seams() {
    let _guard = SERIAL.lock();
    let text = side_seam_pattern().to_json_string();
    // the saved ids are free again and now belong to a different document
    let mut squatter = Pattern::new();
    squatter.add_panel(bodice());
    squatter.add_panel(bodice());
    let squatter_ids: Vec<u32> = squatter.collect_objects().iter().map(|o| o.id()).collect();

    let back = Pattern::from_json_str(&text).unwrap();
    let seam = back.seam(&back.sewings()[0]);
    assert_eq!(seam.firsts.len(), 1);
    assert_eq!(seam.seconds.len(), 1);
    for seg in seam.firsts.iter().chain(&seam.seconds) {
        assert!(!squatter_ids.contains(&seg.shape.id()));
        assert!(back.find_shape(seg.shape.id()).is_some());
    }
    assert!(squatter.find_shape(back.sewings()[0].firsts()[0].id()).is_none());
}

#[test]
fn units_naming_shapes_outside_the_document_dangle() {
    let _guard = SERIAL.lock();
    let outsider = CurveShape::line(v(0.0, 0.0), v(1.0, 0.0));
    let mut pat = side_seam_pattern();
    pat.sewings_mut()[0].add_first(Unit::of(&outsider, false));
    let back = Pattern::from_json_str(&pat.to_json_string()).unwrap();
    assert_eq!(back.sewings()[0].firsts().len(), 2);
    assert!(!back.sewings()[0].firsts()[1].is_live());
    assert_eq!(back.seam(&back.sewings()[0]).firsts.len(), 1);
}

#[test]
fn huge_ids_load_without_filling_the_registry() {
    let _guard = SERIAL.lock();
    let mut kp = Element::new("KeyPoint");
    kp.set_attr_u32("id", 4_000_000_000).set_attr_f32("x", 1.0).set_attr_f32("y", 2.0);
    let before = sewkit::registry::live_count();
    let p = sewkit::KeyPoint::from_element(&kp).unwrap();
    assert_eq!(p.id(), 4_000_000_000);
    assert_eq!(sewkit::registry::live_count(), before + 1);
}

#[test]
fn missing_id_and_coordinates_are_reported() {
    let _guard = SERIAL.lock();
    let mut kp = Element::new("KeyPoint");
    kp.set_attr_f32("x", 1.0).set_attr_f32("y", 2.0);
    let mut line = Element::new("Line");
    line.set_attr_u32("id", 4000);
    line.push_child(kp.clone());
    line.push_child(kp);
    match CurveShape::from_element(&line) {
        Err(PanelError::MissingAttribute { element, attribute }) => {
            assert_eq!(element, "KeyPoint");
            assert_eq!(attribute, "id");
        }
        other => panic!("expected a missing id, got {:?}", other.map(|s| s.id())),
    }

    let mut group = Element::new("Group");
    group.push_child(Element::new("Line"));
    let err = ShapeGroup::from_element(&group).unwrap_err();
    assert_eq!(err.to_string(), "missing attribute 'id' on <Group>");
}

#[test]
fn unknown_tags_are_skipped() {
    let _guard = SERIAL.lock();
    let mut doc = side_seam_pattern().to_element();
    doc.push_child(Element::new("Mesh"));
    let panel = &mut doc.children[0];
    panel.push_child(Element::new("Notch"));
    let text = doc.to_json_string();
    let back = Pattern::from_json_str(&text).unwrap();
    assert_eq!(back.panels().len(), 2);
    assert_eq!(back.sewings().len(), 1);
}

#[test]
fn malformed_documents_fail() {
    let _guard = SERIAL.lock();
    assert!(matches!(Pattern::from_json_str("not json"), Err(PanelError::Json(_))));
    let wrong = Element::new("Sewing").to_json_string();
    assert!(matches!(
        Pattern::from_json_str(&wrong),
        Err(PanelError::UnexpectedElement { .. })
    ));
}

#[test]
fn xml_rendering_lists_every_element() {
    let _guard = SERIAL.lock();
    let pat = side_seam_pattern();
    let xml = pat.to_element().to_xml_string();
    assert!(xml.starts_with("<?xml"));
    assert_eq!(xml.matches("<PanelPolygon ").count(), 2);
    assert_eq!(xml.matches("<Unit ").count(), 2);
    assert!(xml.contains("reverse=\"1\""));
}
