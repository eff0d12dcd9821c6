use super::*;
use crate::dom::VirtualDocument;
use std::cell::Cell;
use std::rc::Rc;

fn sync_for(doc: &VirtualDocument) -> AnchorSynchronizer<VirtualDocument> {
    AnchorSynchronizer::new(doc.clone(), AnchorLayout::default())
}

fn div(id: &str) -> ElementSpec {
    ElementSpec::new("div").id(id)
}

// =========================================================================
// ensure_mounted
// =========================================================================

#[test]
fn mounts_panel_as_first_child_of_sidebar() {
    let doc = VirtualDocument::search_page();
    let sidebar = doc.element_by_id("rhs").unwrap();
    doc.insert_last(sidebar, &div("knowledge-card")).unwrap();

    let panel = sync_for(&doc).ensure_mounted().unwrap().unwrap();
    assert_eq!(doc.first_element_child(&sidebar), Some(panel));
    assert!(doc.element_by_id("answer-panel-settings").is_some());
    assert_eq!(doc.attr(doc.element_by_id("answer-panel-settings").unwrap(), "title").as_deref(), Some("Settings"));
    assert!(doc.text_content(panel).contains("AI Analysis"));
}

#[test]
fn repeated_mounts_never_duplicate_the_panel() {
    let doc = VirtualDocument::search_page();
    let sync = sync_for(&doc);
    let first = sync.ensure_mounted().unwrap();
    for _ in 0..3 {
        assert_eq!(sync.ensure_mounted().unwrap(), first);
    }
    assert_eq!(sync_for(&doc).ensure_mounted().unwrap(), first);
    assert_eq!(doc.count_with_id("answer-panel"), 1);
    assert_eq!(doc.count_with_id("answer-panel-body"), 1);
}

#[test]
fn missing_sidebar_is_created_under_fallback_parent() {
    let doc = VirtualDocument::new();
    let center = doc.insert_last(doc.body(), &div("rcnt")).unwrap();
    doc.insert_last(center, &div("center_col")).unwrap();

    let panel = sync_for(&doc).ensure_mounted().unwrap().unwrap();
    let sidebar = doc.element_by_id("rhs").unwrap();
    assert_eq!(doc.parent(sidebar), Some(center));
    assert_eq!(doc.children(center).last(), Some(&sidebar));
    assert_eq!(doc.children(sidebar), vec![panel]);
}

#[test]
fn no_sidebar_and_no_fallback_mounts_nothing() {
    let doc = VirtualDocument::new();
    let sync = sync_for(&doc);
    assert_eq!(sync.ensure_mounted().unwrap(), None);
    assert_eq!(doc.count_with_id("answer-panel"), 0);
    assert_eq!(sync.pin(), PinOutcome::NotMounted);
    assert!(matches!(sync.render(&RequestState::Loading), Err(DomError::NotMounted)));
}

#[test]
fn remount_reattaches_the_same_panel_after_host_removed_it() {
    let doc = VirtualDocument::search_page();
    let sync = sync_for(&doc);
    let panel = sync.ensure_mounted().unwrap().unwrap();
    sync.render(&RequestState::Success { text: "kept".into() }).unwrap();

    doc.remove(panel).unwrap();
    assert_eq!(doc.count_with_id("answer-panel"), 0);

    assert_eq!(sync.ensure_mounted().unwrap(), Some(panel));
    assert_eq!(doc.count_with_id("answer-panel"), 1);
    assert!(doc.text_content(panel).contains("kept"));
}

// =========================================================================
// pin / keep_pinned
// =========================================================================

#[test]
fn pin_reports_already_first() {
    let doc = VirtualDocument::search_page();
    let sync = sync_for(&doc);
    sync.ensure_mounted().unwrap();
    assert_eq!(sync.pin(), PinOutcome::AlreadyFirst);
}

#[test]
fn watch_restores_panel_after_host_inserts_siblings_before_it() {
    let doc = VirtualDocument::search_page();
    let sync = sync_for(&doc);
    let panel = sync.ensure_mounted().unwrap().unwrap();
    sync.render(&RequestState::Success { text: "299,792,458 m/s".into() }).unwrap();
    let before = doc.outline(panel);
    let _watch = sync.keep_pinned().unwrap();

    let sidebar = doc.element_by_id("rhs").unwrap();
    for id in ["ad-1", "ad-2", "ad-3"] {
        doc.insert_first(sidebar, &div(id)).unwrap();
    }
    assert_ne!(doc.first_element_child(&sidebar), Some(panel));

    doc.flush_mutations();
    assert_eq!(doc.first_element_child(&sidebar), Some(panel));
    assert_eq!(doc.children(sidebar).len(), 4);
    assert_eq!(doc.outline(panel), before);
}

#[test]
fn watch_installed_early_pins_into_a_rebuilt_sidebar() {
    let doc = VirtualDocument::new();
    let sync = sync_for(&doc);
    let _watch = sync.keep_pinned().unwrap();
    assert_eq!(sync.ensure_mounted().unwrap(), None);

    let center = doc.insert_last(doc.body(), &div("rcnt")).unwrap();
    doc.flush_mutations();
    let panel = sync.panel().unwrap();
    assert_eq!(doc.count_with_id("answer-panel"), 1);

    let sidebar = doc.element_by_id("rhs").unwrap();
    doc.remove(sidebar).unwrap();
    let rebuilt = doc.insert_last(center, &div("rhs")).unwrap();
    doc.insert_last(rebuilt, &div("host-card")).unwrap();
    doc.flush_mutations();

    assert_eq!(doc.first_element_child(&rebuilt), Some(panel));
    assert_eq!(doc.count_with_id("answer-panel"), 1);
}

#[test]
fn watch_mounts_late_panel_and_replays_last_state() {
    let doc = VirtualDocument::new();
    let sync = sync_for(&doc);
    let mounts = Rc::new(Cell::new(0));
    let seen = Rc::clone(&mounts);
    sync.on_mount(move |_| seen.set(seen.get() + 1));
    let _watch = sync.keep_pinned().unwrap();
    assert!(sync.render(&RequestState::Loading).is_err());
    assert!(matches!(
        sync.render(&RequestState::Success { text: "found it".into() }),
        Err(DomError::NotMounted)
    ));

    let center = doc.insert_last(doc.body(), &div("rcnt")).unwrap();
    let sidebar = doc.insert_last(center, &div("rhs")).unwrap();
    doc.insert_last(sidebar, &div("host-card")).unwrap();
    doc.flush_mutations();

    let panel = sync.panel().unwrap();
    assert_eq!(doc.first_element_child(&sidebar), Some(panel));
    assert_eq!(doc.count_with_id("answer-panel"), 1);
    assert_eq!(doc.count_with_id("rhs"), 1);
    assert!(doc.text_content(panel).contains("found it"));
    assert_eq!(doc.element_by_id(render::LOADING_ID), None);
    assert_eq!(mounts.get(), 1);

    doc.insert_first(sidebar, &div("late-card")).unwrap();
    doc.flush_mutations();
    assert_eq!(mounts.get(), 1);
}

#[test]
fn mount_hook_runs_for_current_panel_and_not_on_reattach() {
    let doc = VirtualDocument::search_page();
    let sync = sync_for(&doc);
    let panel = sync.ensure_mounted().unwrap().unwrap();
    let mounts = Rc::new(Cell::new(0));
    let seen = Rc::clone(&mounts);
    sync.on_mount(move |_| seen.set(seen.get() + 1));
    assert_eq!(mounts.get(), 1);

    doc.remove(panel).unwrap();
    assert_eq!(sync.ensure_mounted().unwrap(), Some(panel));
    assert_eq!(mounts.get(), 1);
}

#[test]
fn element_with_panel_id_but_no_body_is_not_mounted() {
    let doc = VirtualDocument::search_page();
    let sidebar = doc.element_by_id("rhs").unwrap();
    doc.insert_last(sidebar, &div("answer-panel")).unwrap();
    let sync = sync_for(&doc);

    assert_eq!(sync.ensure_mounted().unwrap(), None);
    assert_eq!(sync.panel(), None);
    assert_eq!(doc.count_with_id("answer-panel"), 1);
}

#[test]
fn loading_indicator_survives_repinning() {
    let doc = VirtualDocument::search_page();
    let sync = sync_for(&doc);
    sync.ensure_mounted().unwrap();
    sync.render(&RequestState::Loading).unwrap();
    let loading = doc.element_by_id(render::LOADING_ID).unwrap();
    let _watch = sync.keep_pinned().unwrap();

    let sidebar = doc.element_by_id("rhs").unwrap();
    doc.insert_first(sidebar, &div("late-card")).unwrap();
    doc.flush_mutations();

    assert_eq!(doc.element_by_id(render::LOADING_ID), Some(loading));
}

#[test]
fn sidebar_gone_for_good_is_silent() {
    let doc = VirtualDocument::search_page();
    let sync = sync_for(&doc);
    sync.ensure_mounted().unwrap();
    let _watch = sync.keep_pinned().unwrap();

    let sidebar = doc.element_by_id("rhs").unwrap();
    doc.remove(sidebar).unwrap();
    doc.flush_mutations();

    assert_eq!(sync.pin(), PinOutcome::NoContainer);
    assert_eq!(doc.count_with_id("answer-panel"), 0);
}

#[test]
fn scaffold_has_header_and_empty_body() {
    let spec = scaffold(&AnchorLayout::default());
    assert_eq!(spec.id.as_deref(), Some("answer-panel"));
    let container = &spec.children[0];
    assert_eq!(container.children.len(), 2);
    let body = &container.children[1];
    assert_eq!(body.id.as_deref(), Some("answer-panel-body"));
    assert!(body.children.is_empty());
}
