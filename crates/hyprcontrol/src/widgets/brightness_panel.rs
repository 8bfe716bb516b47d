//! Brightness panel: one slider plus preset buttons.

use std::cell::Cell;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{
    Box as GtkBox, Button, Grid, Label, Orientation, PositionType, Scale, ScrolledWindow,
};

use crate::services::brightness::{BrightnessService, BrightnessSnapshot};

/// The Brightness notebook page.
pub struct BrightnessPanel {
    pub root: ScrolledWindow,
}

struct BrightnessPanelState {
    scale: Scale,
    updating: Cell<bool>,
}

/// Build the Brightness panel and wire it to the service.
pub fn build() -> BrightnessPanel {
    let panel_box = GtkBox::new(Orientation::Vertical, 10);
    panel_box.set_margin_top(10);
    panel_box.set_margin_bottom(10);
    panel_box.set_margin_start(10);
    panel_box.set_margin_end(10);

    let grid = Grid::new();
    grid.set_column_homogeneous(true);
    grid.set_column_spacing(10);
    grid.set_row_spacing(10);
    panel_box.append(&grid);

    let label = Label::new(Some("Screen Brightness"));
    label.set_xalign(0.0);
    grid.attach(&label, 0, 0, 5, 1);

    let scale = Scale::with_range(Orientation::Horizontal, 0.0, 100.0, 1.0);
    scale.set_value_pos(PositionType::Left);
    grid.attach(&scale, 0, 1, 5, 1);

    for i in 0..5 {
        let percent = i * 25;
        let button = Button::with_label(&format!("{}%", percent));
        button.connect_clicked(move |_| BrightnessService::global().set_percent(percent));
        grid.attach(&button, i as i32, 2, 1, 1);
    }

    let root = ScrolledWindow::new();
    root.set_policy(gtk4::PolicyType::Automatic, gtk4::PolicyType::Automatic);
    root.set_child(Some(&panel_box));

    let state = Rc::new(BrightnessPanelState {
        scale,
        updating: Cell::new(false),
    });

    {
        let state_clone = state.clone();
        state.scale.connect_value_changed(move |scale| {
            if !state_clone.updating.get() {
                BrightnessService::global().set_percent(scale.value() as u32);
            }
        });
    }

    {
        let state_clone = state.clone();
        BrightnessService::global().connect(move |snapshot| {
            on_snapshot(&state_clone, snapshot);
        });
    }

    BrightnessPanel { root }
}

fn on_snapshot(state: &Rc<BrightnessPanelState>, snapshot: &BrightnessSnapshot) {
    state.updating.set(true);
    state.scale.set_value(snapshot.percent as f64);
    state.updating.set(false);

    state.scale.set_sensitive(snapshot.available);
}
