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

//! Built-in field catalogs, one per settings tab
//!
//! Tabs reference each other's toggles (battery fields follow `system.has_battery`),
//! so reference checks only run on the combined [`standard`] schema.

use fluxion_settings_types::{Field, FieldType, Relation, Schema, SchemaError, SelectOption};
use std::fmt;
use std::str::FromStr;

const HAS_SOLAR: &str = "system.has_solar";
const HAS_BATTERY: &str = "system.has_battery";
const HAS_WATER_HEATER: &str = "system.has_water_heater";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    System,
    Parameters,
    Ui,
    Advanced,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::System, Tab::Parameters, Tab::Ui, Tab::Advanced];

    pub fn schema(self) -> Result<Schema, SchemaError> {
        match self {
            Self::System => system(),
            Self::Parameters => parameters(),
            Self::Ui => ui(),
            Self::Advanced => advanced(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Parameters => "parameters",
            Self::Ui => "ui",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(Self::System),
            "parameters" => Ok(Self::Parameters),
            "ui" => Ok(Self::Ui),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!(
                "unknown tab '{other}', expected one of: system, parameters, ui, advanced"
            )),
        }
    }
}

fn entity(key: &str, label: &str) -> Field {
    Field::new(key, label, FieldType::Entity)
}

fn number(key: &str, label: &str) -> Field {
    Field::new(key, label, FieldType::Number)
}

fn toggle(key: &str, label: &str) -> Field {
    Field::new(key, label, FieldType::Boolean)
}

/// Installed hardware, location, prices and Home Assistant sensors
pub fn system() -> Result<Schema, SchemaError> {
    Schema::new(vec![
        toggle(HAS_SOLAR, "Solar panels").with_subsection("Hardware"),
        toggle(HAS_BATTERY, "Home battery").with_subsection("Hardware"),
        toggle(HAS_WATER_HEATER, "Water heater").with_subsection("Hardware"),
        number("system.grid.max_power_kw", "Grid fuse limit (kW)")
            .with_helper("Maximum import power allowed by the main fuse")
            .with_subsection("Hardware"),
        number("system.location.latitude", "Latitude").with_subsection("Location"),
        number("system.location.longitude", "Longitude").with_subsection("Location"),
        Field::new("timezone", "Timezone", FieldType::Text)
            .with_helper("IANA name, e.g. Europe/Stockholm")
            .with_subsection("Location")
            .required(),
        number("system.solar_array.kwp", "Array size (kWp)")
            .with_subsection("Solar array")
            .show_when(HAS_SOLAR, true),
        Field::new("system.solar_array.azimuth", "Azimuth", FieldType::Azimuth)
            .with_helper("180 = south")
            .with_subsection("Solar array")
            .show_when(HAS_SOLAR, true),
        Field::new("system.solar_array.tilt", "Tilt", FieldType::Tilt)
            .with_subsection("Solar array")
            .show_when(HAS_SOLAR, true),
        Field::new("nordpool.price_area", "Price area", FieldType::Select)
            .with_options(
                ["SE1", "SE2", "SE3", "SE4", "NO1", "DK1", "DK2", "FI"]
                    .into_iter()
                    .map(|area| SelectOption::new(area, area))
                    .collect(),
            )
            .with_subsection("Prices"),
        Field::new("nordpool.currency", "Currency", FieldType::Text).with_subsection("Prices"),
        Field::new("nordpool.resolution_minutes", "Price resolution", FieldType::Select)
            .with_options(vec![
                SelectOption::new(15, "15 minutes"),
                SelectOption::new(30, "30 minutes"),
                SelectOption::new(60, "60 minutes"),
            ])
            .with_subsection("Prices"),
        Field::new("home_assistant.url", "Home Assistant URL", FieldType::Text)
            .with_subsection("Home Assistant"),
        entity("input_sensors.battery_soc", "Battery SoC sensor")
            .with_subsection("Sensors")
            .show_when(HAS_BATTERY, true),
        entity("input_sensors.battery_power", "Battery power sensor")
            .with_companion("input_sensors.battery_power_inverted")
            .with_subsection("Sensors")
            .show_when(HAS_BATTERY, true),
        toggle("input_sensors.battery_power_inverted", "Invert battery power")
            .with_subsection("Sensors")
            .show_when(HAS_BATTERY, true),
        entity("input_sensors.grid_power", "Grid power sensor")
            .with_companion("input_sensors.grid_power_inverted")
            .with_subsection("Sensors"),
        toggle("input_sensors.grid_power_inverted", "Invert grid power").with_subsection("Sensors"),
        entity("input_sensors.pv_power", "PV power sensor")
            .with_subsection("Sensors")
            .show_when(HAS_SOLAR, true),
        entity("input_sensors.load_power", "Load power sensor").with_subsection("Sensors"),
        entity("input_sensors.water_power", "Water heater power sensor")
            .with_subsection("Sensors")
            .show_when(HAS_WATER_HEATER, true),
        entity("input_sensors.total_load_consumption", "Total load consumption")
            .with_subsection("Sensors"),
        entity("input_sensors.total_pv_production", "Total PV production")
            .with_subsection("Sensors")
            .show_when(HAS_SOLAR, true),
        entity("input_sensors.vacation_mode", "Vacation mode").with_subsection("Sensors"),
        entity("input_sensors.alarm_state", "Alarm state").with_subsection("Sensors"),
    ])
}

/// Battery, water heater, tariff and risk parameters
pub fn parameters() -> Result<Schema, SchemaError> {
    Schema::new(vec![
        number("battery.capacity_kwh", "Capacity (kWh)")
            .with_subsection("Battery")
            .show_when(HAS_BATTERY, true),
        number("battery.min_soc_percent", "Min SoC (%)")
            .with_subsection("Battery")
            .show_when(HAS_BATTERY, true),
        number("battery.max_soc_percent", "Max SoC (%)")
            .with_subsection("Battery")
            .show_when(HAS_BATTERY, true),
        number("battery.max_charge_power_kw", "Max charge power (kW)")
            .with_subsection("Battery")
            .show_when(HAS_BATTERY, true),
        number("battery.max_discharge_power_kw", "Max discharge power (kW)")
            .with_subsection("Battery")
            .show_when(HAS_BATTERY, true),
        number("battery.roundtrip_efficiency_percent", "Round-trip efficiency (%)")
            .with_subsection("Battery")
            .show_when(HAS_BATTERY, true),
        number("battery_economics.battery_cycle_cost_kwh", "Cycle cost (SEK/kWh)")
            .with_subsection("Battery")
            .show_when(HAS_BATTERY, true),
        number("water_heating.power_kw", "Heater power (kW)")
            .with_subsection("Water heater")
            .show_when(HAS_WATER_HEATER, true),
        number("water_heating.min_kwh_per_day", "Daily energy (kWh)")
            .with_subsection("Water heater")
            .show_when(HAS_WATER_HEATER, true),
        number("pricing.vat_percent", "VAT (%)").with_subsection("Tariffs"),
        number("pricing.grid_transfer_fee_sek", "Grid transfer fee (SEK/kWh)")
            .with_subsection("Tariffs"),
        number("pricing.energy_tax_sek", "Energy tax (SEK/kWh)").with_subsection("Tariffs"),
        Field::new("s_index.mode", "Safety margin mode", FieldType::Select)
            .with_options(vec![
                SelectOption::new("static", "Static"),
                SelectOption::new("dynamic", "Dynamic"),
            ])
            .with_subsection("Risk"),
        number("s_index.base_factor", "Base factor").with_subsection("Risk"),
        number("s_index.max_factor", "Max factor")
            .with_subsection("Risk")
            .show_when("s_index.mode", "dynamic"),
        Field::new("s_index.risk_appetite", "Risk appetite", FieldType::Select)
            .with_options(
                (1..=5)
                    .map(|level| SelectOption::new(level, format!("Level {level}")))
                    .collect(),
            )
            .with_subsection("Risk"),
        Field::new("s_index.days_ahead_for_sindex", "Days ahead", FieldType::Array)
            .with_helper("Comma separated day offsets, e.g. 2, 3, 4")
            .with_subsection("Risk")
            .show_when("s_index.mode", "dynamic"),
    ])
}

/// Dashboard appearance
pub fn ui() -> Result<Schema, SchemaError> {
    Schema::new(vec![
        Field::new("ui.theme", "Theme", FieldType::Text)
            .with_helper("Pick from the theme list")
            .read_only(),
        number("ui.theme_accent_index", "Accent colour"),
    ])
}

/// Executor, inverter entities, notifications and learning
pub fn advanced() -> Result<Schema, SchemaError> {
    Schema::new(vec![
        toggle("executor.enabled", "Executor enabled").with_subsection("Executor"),
        toggle("executor.shadow_mode", "Shadow mode")
            .with_helper("Log decisions without touching the inverter")
            .with_subsection("Executor")
            .show_when_all(&["executor.enabled"]),
        number("executor.interval_seconds", "Interval (s)")
            .with_subsection("Executor")
            .show_when_all(&["executor.enabled"]),
        entity("executor.automation_toggle_entity", "Automation toggle")
            .with_subsection("Executor"),
        entity("executor.manual_override_entity", "Manual override").with_subsection("Executor"),
        entity("executor.soc_target_entity", "SoC target")
            .with_subsection("Executor")
            .show_when(HAS_BATTERY, true),
        entity("executor.inverter.work_mode_entity", "Work mode").with_subsection("Inverter"),
        entity("executor.inverter.grid_charging_entity", "Grid charging")
            .with_subsection("Inverter")
            .show_when(HAS_BATTERY, true),
        entity(
            "executor.inverter.max_charging_current_entity",
            "Max charging current",
        )
        .with_subsection("Inverter")
        .show_when(HAS_BATTERY, true),
        entity(
            "executor.inverter.max_discharging_current_entity",
            "Max discharging current",
        )
        .with_subsection("Inverter")
        .show_when(HAS_BATTERY, true),
        entity("executor.water_heater.target_entity", "Water heater target")
            .with_subsection("Inverter")
            .show_when(HAS_WATER_HEATER, true),
        Field::new("executor.notifications.service", "Notify service", FieldType::Service)
            .with_subsection("Notifications"),
        toggle("executor.notifications.on_charge_start", "On charge start")
            .with_subsection("Notifications")
            .show_when_any(&["executor.notifications.service"]),
        toggle("executor.notifications.on_export_start", "On export start")
            .with_subsection("Notifications")
            .show_when_any(&["executor.notifications.service"]),
        toggle("executor.notifications.on_error", "On error")
            .with_subsection("Notifications")
            .show_when_any(&["executor.notifications.service"]),
        toggle("learning.enable", "Learning enabled").with_subsection("Learning"),
        Field::new("learning.sqlite_path", "Database path", FieldType::Text)
            .with_subsection("Learning")
            .show_when("learning.enable", true),
        number("learning.min_sample_threshold", "Min samples")
            .with_subsection("Learning")
            .show_when("learning.enable", true),
        number("learning.min_improvement_threshold", "Min improvement")
            .with_subsection("Learning")
            .show_when("learning.enable", true),
    ])
}

/// Every tab combined into one save transaction, with cross-field relations
pub fn standard() -> Result<Schema, SchemaError> {
    let tabs = Tab::ALL
        .into_iter()
        .map(Tab::schema)
        .collect::<Result<Vec<_>, _>>()?;
    let schema = Schema::combine(tabs)?.with_relations(vec![Relation::less_than(
        "battery.min_soc_percent",
        "battery.max_soc_percent",
    )])?;
    schema.check_references()?;
    Ok(schema)
}
