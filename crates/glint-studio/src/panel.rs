//! A parameter panel that narrates to the log.
//!
//! Stands in for a slider UI: it shows what a panel would offer for each
//! visible pass, and tracks which passes are on screen.

use std::collections::BTreeSet;

use glint_engine::pipeline::{PanelEntry, ParameterPanel, PassId};

#[derive(Debug, Default)]
pub struct LogPanel {
    visible: BTreeSet<PassId>,
}

impl LogPanel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParameterPanel for LogPanel {
    fn programs(&mut self, names: &[String], active: usize) {
        for (i, name) in names.iter().enumerate() {
            let marker = if i == active { '*' } else { ' ' };
            log::info!("{marker} [{}] {name}", i + 1);
        }
    }

    fn show(&mut self, entry: &PanelEntry<'_>) {
        self.visible.insert(entry.pass);

        let title = entry.spec.title.as_deref().unwrap_or(entry.name);
        let state = match (entry.spec.switch, entry.enabled) {
            (false, _) => "",
            (true, true) => " (on)",
            (true, false) => " (off)",
        };
        log::info!("panel '{title}'{state}");

        for param in &entry.spec.params {
            let value = entry
                .uniforms
                .get(&param.uniform)
                .and_then(|v| v.as_float())
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string());
            log::info!(
                "  {} = {value}  [{} .. {}, step {}]",
                param.uniform, param.min, param.max, param.step
            );
        }
    }

    fn hide(&mut self, pass: PassId) {
        if self.visible.remove(&pass) {
            log::debug!("panel hidden: {pass:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_engine::pipeline::{PanelSpec, UniformSet};

    #[test]
    fn tracks_visible_passes() {
        let spec = PanelSpec::new().title("echo").param("zoom", 1.0, 2.0, 0.01);
        let uniforms = UniformSet::new().with("zoom", 1.5_f32);
        let mut panel = LogPanel::new();

        panel.show(&PanelEntry {
            pass: PassId::chained(1, 0),
            name: "echo",
            spec: &spec,
            uniforms: &uniforms,
            enabled: true,
        });
        assert!(panel.visible.contains(&PassId::chained(1, 0)));

        panel.hide(PassId::chained(1, 0));
        assert!(panel.visible.is_empty());
    }
}
