//! Namespaces - path-addressed JSON surfaces over the panel.

mod panel;

pub use panel::PanelNamespace;
