//! Audio panel: speaker and microphone volume sliders, preset buttons,
//! and mute toggles.

use std::cell::Cell;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{
    Box as GtkBox, Button, Grid, Label, Orientation, PositionType, Scale, ScrolledWindow,
};

use crate::services::audio::{AudioService, AudioSnapshot};

/// The Audio notebook page.
pub struct AudioPanel {
    pub root: ScrolledWindow,
}

struct AudioPanelState {
    speaker_scale: Scale,
    mic_scale: Scale,
    speaker_mute: Button,
    mic_mute: Button,
    /// Blocks slider handlers while values are set from a snapshot.
    updating: Cell<bool>,
}

/// Build the Audio panel and wire it to the service.
pub fn build() -> AudioPanel {
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

    // Speaker controls.
    let speaker_label = Label::new(Some("Speaker Volume"));
    speaker_label.set_xalign(0.0);
    grid.attach(&speaker_label, 0, 0, 5, 1);

    let speaker_scale = Scale::with_range(Orientation::Horizontal, 0.0, 100.0, 1.0);
    speaker_scale.set_value_pos(PositionType::Left);
    grid.attach(&speaker_scale, 0, 1, 5, 1);

    for i in 0..5 {
        let percent = i * 25;
        let button = Button::with_label(&format!("{}%", percent));
        button.connect_clicked(move |_| AudioService::global().set_volume(percent));
        grid.attach(&button, i as i32, 2, 1, 1);
    }

    // Microphone controls.
    let mic_label = Label::new(Some("Microphone Volume"));
    mic_label.set_xalign(0.0);
    grid.attach(&mic_label, 0, 3, 5, 1);

    let mic_scale = Scale::with_range(Orientation::Horizontal, 0.0, 100.0, 1.0);
    mic_scale.set_value_pos(PositionType::Left);
    grid.attach(&mic_scale, 0, 4, 5, 1);

    for i in 0..5 {
        let percent = i * 25;
        let button = Button::with_label(&format!("{}%", percent));
        button.connect_clicked(move |_| AudioService::global().set_mic_volume(percent));
        grid.attach(&button, i as i32, 5, 1, 1);
    }

    // Mute buttons.
    let speaker_mute = Button::with_label("Mute Speaker");
    speaker_mute.connect_clicked(|_| AudioService::global().toggle_mute());
    grid.attach(&speaker_mute, 0, 6, 1, 1);

    let mic_mute = Button::with_label("Mute Mic");
    mic_mute.connect_clicked(|_| AudioService::global().toggle_mic_mute());
    grid.attach(&mic_mute, 1, 6, 1, 1);

    let root = ScrolledWindow::new();
    root.set_policy(gtk4::PolicyType::Automatic, gtk4::PolicyType::Automatic);
    root.set_child(Some(&panel_box));

    let state = Rc::new(AudioPanelState {
        speaker_scale,
        mic_scale,
        speaker_mute,
        mic_mute,
        updating: Cell::new(false),
    });

    {
        let state_clone = state.clone();
        state.speaker_scale.connect_value_changed(move |scale| {
            if !state_clone.updating.get() {
                AudioService::global().set_volume(scale.value() as u32);
            }
        });
    }
    {
        let state_clone = state.clone();
        state.mic_scale.connect_value_changed(move |scale| {
            if !state_clone.updating.get() {
                AudioService::global().set_mic_volume(scale.value() as u32);
            }
        });
    }

    {
        let state_clone = state.clone();
        AudioService::global().connect(move |snapshot| {
            on_snapshot(&state_clone, snapshot);
        });
    }

    AudioPanel { root }
}

fn on_snapshot(state: &Rc<AudioPanelState>, snapshot: &AudioSnapshot) {
    state.updating.set(true);
    state.speaker_scale.set_value(snapshot.volume as f64);
    state.mic_scale.set_value(snapshot.mic_volume as f64);
    state.updating.set(false);

    state
        .speaker_mute
        .set_label(mute_label(snapshot.muted, "Speaker"));
    state.mic_mute.set_label(mute_label(snapshot.mic_muted, "Mic"));

    state.speaker_scale.set_sensitive(snapshot.available);
    state.mic_scale.set_sensitive(snapshot.available);
}

fn mute_label(muted: bool, target: &str) -> &'static str {
    match (muted, target) {
        (true, "Speaker") => "Unmute Speaker",
        (false, "Speaker") => "Mute Speaker",
        (true, _) => "Unmute Mic",
        (false, _) => "Mute Mic",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_label_reflects_state() {
        assert_eq!(mute_label(false, "Speaker"), "Mute Speaker");
        assert_eq!(mute_label(true, "Speaker"), "Unmute Speaker");
        assert_eq!(mute_label(false, "Mic"), "Mute Mic");
        assert_eq!(mute_label(true, "Mic"), "Unmute Mic");
    }
}
