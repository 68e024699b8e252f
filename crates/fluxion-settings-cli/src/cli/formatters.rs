// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use fluxion_settings::FieldView;
use fluxion_settings_types::{HaEntity, SaveWarning, ThemesResponse};
use std::fmt::Write;

/// Formatter for pretty terminal tables
#[derive(Debug)]
pub struct TableFormatter;

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
        .collect()
}

impl TableFormatter {
    /// Fields grouped by subsection, with errors and disabled reasons
    pub fn format_fields(views: &[FieldView]) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(header(&["Section", "Field", "Key", "Value", "Status"]));

        let mut last_section: Option<&str> = None;
        for view in views {
            let section = view.subsection.as_deref().unwrap_or("");
            let section_cell = if last_section == Some(section) {
                Cell::new("")
            } else {
                Cell::new(section).add_attribute(Attribute::Bold)
            };
            last_section = Some(section);

            let status = match (&view.error, view.enabled) {
                (Some(error), _) => Cell::new(error).fg(Color::Red),
                (None, false) => Cell::new(view.disabled_text.as_deref().unwrap_or("disabled"))
                    .add_attribute(Attribute::Dim),
                (None, true) => Cell::new(""),
            };
            let value = if view.value.is_empty() {
                Cell::new("-").add_attribute(Attribute::Dim)
            } else {
                Cell::new(&view.value)
            };

            table.add_row(vec![
                section_cell,
                Cell::new(&view.label),
                Cell::new(&view.key),
                value,
                status,
            ]);
        }
        table.to_string()
    }

    pub fn format_entities(entities: &[HaEntity]) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(header(&["Entity", "Name", "Domain"]));
        for entity in entities {
            table.add_row(vec![
                Cell::new(&entity.entity_id),
                Cell::new(&entity.friendly_name),
                Cell::new(&entity.domain),
            ]);
        }
        table.to_string()
    }

    pub fn format_themes(themes: &ThemesResponse) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(header(&["Theme", "Foreground", "Background", "Accent"]));

        for theme in &themes.themes {
            let is_current = themes.current.as_deref() == Some(theme.name.as_str());
            let name = if is_current {
                Cell::new(format!("* {}", theme.name))
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold)
            } else {
                Cell::new(&theme.name)
            };
            let accent = themes
                .accent_index
                .filter(|_| is_current)
                .and_then(|i| theme.palette.get(usize::from(i)))
                .map_or_else(String::new, |colour| {
                    format!("{colour} (#{})", themes.accent_index.unwrap_or_default())
                });

            table.add_row(vec![
                name,
                Cell::new(&theme.foreground),
                Cell::new(&theme.background),
                Cell::new(accent),
            ]);
        }
        table.to_string()
    }
}

/// One `key: message` line per issue
pub fn format_issues<'a>(issues: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut output = String::new();
    for (key, message) in issues {
        let _ = writeln!(output, "  ✗ {key}: {message}");
    }
    output
}

pub fn format_warnings(warnings: &[SaveWarning]) -> String {
    let mut output = String::new();
    for warning in warnings {
        let _ = writeln!(output, "  ⚠ {}", warning.message);
        if let Some(guidance) = &warning.guidance {
            let _ = writeln!(output, "    {guidance}");
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxion_settings_types::{FieldType, ThemeInfo};

    fn view(key: &str, value: &str) -> FieldView {
        FieldView {
            key: key.to_owned(),
            label: key.to_owned(),
            helper: None,
            field_type: FieldType::Number,
            value: value.to_owned(),
            error: None,
            enabled: true,
            disabled_text: None,
            options: Vec::new(),
            companion_key: None,
            subsection: Some("Battery".to_owned()),
        }
    }

    #[test]
    fn test_fields_table_shows_status() {
        let mut broken = view("battery.min_soc_percent", "120");
        broken.error = Some("Must be between 0 and 100".to_owned());
        let mut hidden = view("water_heating.power_kw", "3");
        hidden.enabled = false;
        hidden.disabled_text = Some("Enable water heater in System".to_owned());

        let output = TableFormatter::format_fields(&[
            view("battery.capacity_kwh", "27"),
            broken,
            hidden,
        ]);
        assert!(output.contains("battery.capacity_kwh"));
        assert!(output.contains("Must be between 0 and 100"));
        assert!(output.contains("Enable water heater in System"));
        assert_eq!(output.matches("Battery").count(), 1);
    }

    #[test]
    fn test_themes_table_marks_current() {
        let palette: Vec<String> = (0..16).map(|i| format!("#0000{i:02x}")).collect();
        let themes = ThemesResponse {
            current: Some("nord".to_owned()),
            accent_index: Some(2),
            themes: vec![ThemeInfo {
                name: "nord".to_owned(),
                foreground: "#ffffff".to_owned(),
                background: "#000000".to_owned(),
                palette,
            }],
        };
        let output = TableFormatter::format_themes(&themes);
        assert!(output.contains("* nord"));
        assert!(output.contains("#000002 (#2)"));
    }

    #[test]
    fn test_issue_and_warning_lines() {
        let issues = format_issues([("battery.capacity_kwh", "Required")]);
        assert_eq!(issues, "  ✗ battery.capacity_kwh: Required\n");

        let warnings = format_warnings(&[SaveWarning {
            message: "Solar is enabled".to_owned(),
            guidance: Some("Set the array size".to_owned()),
        }]);
        assert!(warnings.contains("Set the array size"));
    }
}
