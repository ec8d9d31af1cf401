//! The telemetry record published for every DER on every tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sim::types::{DerKind, DerProfile};

/// Units reported in every reading.
pub const UNITS_KW: &str = "kW";

/// Timestamp layout: ISO-8601 UTC with millisecond precision and a `Z` suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Rounds to two decimals, the precision of every numeric field on the wire.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats a timestamp the way readings carry it.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// One DER's telemetry for one tick, in the canonical snake_case schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub der_id: String,
    #[serde(rename = "type")]
    pub der_type: DerKind,
    pub is_online: bool,
    #[serde(with = "timestamp_ms")]
    pub timestamp: DateTime<Utc>,
    /// DER output (kW). Battery: positive discharge, negative charge.
    pub current_output: f64,
    /// Site meter reading (kW).
    pub power_meter_measurement: f64,
    pub baseline: f64,
    pub contract_threshold: f64,
    pub units: String,
    pub project_id: String,
    pub utility_id: String,
    pub is_standalone: bool,
    /// Start of the current EV session; `null` for other kinds or when unplugged.
    #[serde(with = "timestamp_ms::option")]
    pub connection_start_at: Option<DateTime<Utc>>,
    /// Battery/EV state of charge in percent, `0` for solar.
    pub current_soc: f64,
    pub nameplate_capacity: f64,
}

/// Per-tick values that vary; everything else comes from the profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    pub is_online: bool,
    pub output_kw: f64,
    pub meter_kw: f64,
    pub soc_pct: Option<f64>,
    pub connection_start_at: Option<DateTime<Utc>>,
}

impl Reading {
    /// Builds a reading, rounding every numeric field to two decimals.
    pub fn new(profile: &DerProfile, m: Measurement) -> Self {
        Self {
            der_id: profile.der_id.clone(),
            der_type: profile.kind,
            is_online: m.is_online,
            timestamp: m.timestamp,
            current_output: round2(m.output_kw),
            power_meter_measurement: round2(m.meter_kw),
            baseline: round2(profile.baseline_kw),
            contract_threshold: round2(profile.contract_threshold_kw),
            units: UNITS_KW.to_string(),
            project_id: profile.project_id.clone(),
            utility_id: profile.utility_id.clone(),
            is_standalone: profile.is_standalone,
            connection_start_at: m.connection_start_at,
            current_soc: round2(m.soc_pct.unwrap_or(0.0)),
            nameplate_capacity: round2(profile.nameplate_capacity_kw),
        }
    }

    /// Serializes the reading as a JSON payload.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Serde adapter for [`TIMESTAMP_FORMAT`] timestamps.
pub mod timestamp_ms {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }

    /// Same format, with `null` for `None`.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(at: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
            match at {
                Some(at) => super::serialize(at, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapped(#[serde(with = "super")] DateTime<Utc>);

            Ok(Option::<Wrapped>::deserialize(d)?.map(|Wrapped(at)| at))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::Region;
    use chrono::{TimeDelta, TimeZone};
    use serde_json::Value;

    fn profile(kind: DerKind) -> DerProfile {
        DerProfile {
            der_id: "17".to_string(),
            kind,
            nameplate_capacity_kw: 11.0,
            region: Region::Moncton,
            project_id: "8b434748-ff61-4e0f-9f24-654c3abf81fb".to_string(),
            utility_id: "utility1234".to_string(),
            is_standalone: false,
            baseline_kw: 22.0,
            contract_threshold_kw: 18.0,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 16, 5, 9).single().expect("valid timestamp")
            + TimeDelta::milliseconds(42)
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-0.005_1), -0.01);
        assert_eq!(round2(7.0), 7.0);
    }

    #[test]
    fn json_uses_canonical_field_names() {
        let reading = Reading::new(
            &profile(DerKind::Ev),
            Measurement {
                timestamp: at(),
                is_online: true,
                output_kw: 2.345_6,
                meter_kw: 14.999,
                soc_pct: Some(63.456),
                connection_start_at: Some(at() - TimeDelta::minutes(20)),
            },
        );
        let bytes = reading.to_json_bytes().expect("serialize reading");
        let json: Value = serde_json::from_slice(&bytes).expect("valid json");

        assert_eq!(json["der_id"], "17");
        assert_eq!(json["type"], "ev");
        assert_eq!(json["timestamp"], "2025-03-12T16:05:09.042Z");
        assert_eq!(json["connection_start_at"], "2025-03-12T15:45:09.042Z");
        assert_eq!(json["current_output"], 2.35);
        assert_eq!(json["power_meter_measurement"], 15.0);
        assert_eq!(json["current_soc"], 63.46);
        assert_eq!(json["units"], "kW");
        assert_eq!(json["baseline"], 22.0);
        assert_eq!(json["contract_threshold"], 18.0);
        assert_eq!(json["nameplate_capacity"], 11.0);
        assert_eq!(json["utility_id"], "utility1234");
        assert_eq!(json.as_object().map(|o| o.len()), Some(15));
    }

    #[test]
    fn solar_reading_has_null_session_and_zero_soc() {
        let reading = Reading::new(
            &profile(DerKind::Solar),
            Measurement {
                timestamp: at(),
                is_online: true,
                output_kw: 3.0,
                meter_kw: 10.0,
                soc_pct: None,
                connection_start_at: None,
            },
        );
        let json: Value =
            serde_json::from_slice(&reading.to_json_bytes().expect("serialize")).expect("json");
        assert!(json["connection_start_at"].is_null());
        assert_eq!(json["current_soc"], 0.0);
        assert_eq!(json["type"], "solar");
    }

    #[test]
    fn deserializes_what_it_serializes() {
        let reading = Reading::new(
            &profile(DerKind::BatteryStorage),
            Measurement {
                timestamp: at(),
                is_online: true,
                output_kw: -1.5,
                meter_kw: 9.25,
                soc_pct: Some(55.0),
                connection_start_at: None,
            },
        );
        let bytes = reading.to_json_bytes().expect("serialize");
        let back: Reading = serde_json::from_slice(&bytes).expect("deserialize");
        assert_eq!(back, reading);
    }
}
