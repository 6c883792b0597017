//! Plain-text rendering of a [`ViewModel`].

use std::fmt::Write;

use weatherview_core::display::{ViewModel, ViewStatus};

const RULE: &str = "────────────────────────────────────────";

pub fn render(vm: &ViewModel) -> String {
    let mut out = String::new();
    let theme = if vm.dark_mode { "dark" } else { "light" };

    let _ = writeln!(
        out,
        "📍 {}",
        vm.location.as_deref().unwrap_or("Unknown location")
    );
    let _ = writeln!(out, "{RULE}");

    match vm.status {
        ViewStatus::Idle => {
            let _ = writeln!(out, "  Enter a location to begin.");
        }
        ViewStatus::Loading => {
            let _ = writeln!(out, "  Loading...");
        }
        ViewStatus::NotFound => {
            let _ = writeln!(out, "  Not Found");
        }
        ViewStatus::Found => {
            let glyph = vm.icon.map(|i| i.glyph()).unwrap_or(" ");
            let _ = writeln!(
                out,
                "  {glyph}  {}",
                vm.condition.as_deref().unwrap_or_default()
            );
            let _ = writeln!(out, "  {}", vm.temperature.as_deref().unwrap_or_default());
            let _ = writeln!(out, "  {} · {}", vm.date, vm.time);
            let _ = writeln!(
                out,
                "  Humidity {}    Wind {}",
                vm.humidity.as_deref().unwrap_or_default(),
                vm.wind.as_deref().unwrap_or_default()
            );
            let _ = writeln!(out, "  Map: {}", vm.map.link);
        }
    }

    let _ = writeln!(out, "  Theme: {theme} ({})", vm.background);

    if !vm.history.is_empty() {
        let _ = writeln!(out, "{RULE}");
        let _ = write!(out, "{}", render_history(&vm.history));
    }

    out
}

pub fn render_history(entries: &[String]) -> String {
    if entries.is_empty() {
        return "No recent searches.\n".to_string();
    }

    let mut out = String::from("Recent Searches\n");
    for (i, city) in entries.iter().enumerate() {
        let _ = writeln!(out, "  {}. {city}", i + 1);
    }
    out
}
