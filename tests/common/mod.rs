#![allow(dead_code)]

use geodraw::mode::{Cursor, MapHost};
use geodraw::{CursorEvent, DrawEvent, LngLat, ScreenPoint};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Pixels per degree of the flat test projection
pub const SCALE: f64 = 100.0;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Map host with a linear projection that records what the modes ask of it
#[derive(Debug)]
pub struct TestHost {
    pub cursor: Cell<Cursor>,
    pub double_click_zoom: Cell<bool>,
    pub draggable: Cell<bool>,
}

impl TestHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            cursor: Cell::new(Cursor::Unset),
            double_click_zoom: Cell::new(true),
            draggable: Cell::new(true),
        })
    }
}

impl MapHost for TestHost {
    fn project(&self, lng: f64, lat: f64) -> ScreenPoint {
        ScreenPoint::new(lng * SCALE, -lat * SCALE)
    }

    fn unproject(&self, x: f64, y: f64) -> LngLat {
        LngLat::new(x / SCALE, -y / SCALE)
    }

    fn set_cursor(&self, cursor: Cursor) {
        self.cursor.set(cursor);
    }

    fn set_double_click_to_zoom(&self, enabled: bool) {
        self.double_click_zoom.set(enabled);
    }

    fn set_map_draggability(&self, enabled: bool) {
        self.draggable.set(enabled);
    }
}

/// Left-button event at a coordinate, located on screen with the test projection
pub fn cursor_at(lng: f64, lat: f64) -> CursorEvent {
    CursorEvent::new(lng, lat, lng * SCALE, -lat * SCALE)
}

/// Collects every event published on a bus
pub fn record_events() -> (Rc<RefCell<Vec<DrawEvent>>>, impl FnMut(&DrawEvent) + 'static) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    (events, move |event: &DrawEvent| sink.borrow_mut().push(event.clone()))
}
