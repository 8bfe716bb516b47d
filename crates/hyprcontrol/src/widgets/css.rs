//! Application CSS.

use gtk4::gdk::Display;
use gtk4::CssProvider;

/// Stylesheet for the panels: signal-strength coloring, the connected
/// check mark, and placeholder rows. The image rule keeps GTK from
/// complaining about zero-size symbolic icons.
const CSS: &str = "\
image { min-width: 16px; min-height: 16px; }

.success {
    color: #2ec27e;
    font-weight: bold;
}

.good-signal {
    color: #2ec27e;
}

.medium-signal {
    color: #e5a50a;
}

.weak-signal {
    color: #c01c28;
}

.placeholder-row {
    color: alpha(currentColor, 0.55);
    font-style: italic;
}
";

/// Install the application stylesheet on the default display.
pub fn install() {
    let provider = CssProvider::new();
    provider.load_from_data(CSS);

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}
