//! Vendor API payload types and host tool-definition shapes.
//!
//! The vendor data records mirror the v2 user-collection payloads; score and
//! contributor fields are nullable on the wire, so they are `Option` here.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tool definitions (published to the host)
// ---------------------------------------------------------------------------

/// Tool definition registered with the host so its agent can call us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool definition type; currently expected to be `"function"`.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function schema published to the agent.
    pub function: FunctionDefinition,
}

/// The schema of a callable function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Exposed function/tool name.
    pub name: String,
    /// Natural-language description of tool behavior.
    pub description: String,
    /// JSON Schema object describing the parameters.
    pub parameters: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Daily summaries
// ---------------------------------------------------------------------------

/// Daily sleep score record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySleep {
    pub id: String,
    pub day: String,
    pub score: Option<u8>,
    pub timestamp: String,
    pub contributors: SleepContributors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepContributors {
    pub deep_sleep: Option<u8>,
    pub efficiency: Option<u8>,
    pub latency: Option<u8>,
    pub rem_sleep: Option<u8>,
    pub restfulness: Option<u8>,
    pub timing: Option<u8>,
    pub total_sleep: Option<u8>,
}

/// Daily readiness score record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReadiness {
    pub id: String,
    pub day: String,
    pub score: Option<u8>,
    pub timestamp: String,
    pub temperature_deviation: Option<f64>,
    pub temperature_trend_deviation: Option<f64>,
    pub contributors: ReadinessContributors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessContributors {
    pub activity_balance: Option<u8>,
    pub body_temperature: Option<u8>,
    pub hrv_balance: Option<u8>,
    pub previous_day_activity: Option<u8>,
    pub previous_night: Option<u8>,
    pub recovery_index: Option<u8>,
    pub resting_heart_rate: Option<u8>,
    pub sleep_balance: Option<u8>,
}

/// Daily activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub id: String,
    pub day: String,
    pub score: Option<u8>,
    pub timestamp: String,
    pub active_calories: u32,
    pub total_calories: u32,
    pub steps: u32,
    pub equivalent_walking_distance: u32,
    pub high_activity_time: u32,
    pub medium_activity_time: u32,
    pub low_activity_time: u32,
    pub sedentary_time: u32,
    pub resting_time: u32,
    pub met: MetSamples,
    pub contributors: ActivityContributors,
}

/// Metabolic-equivalent sample series for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetSamples {
    /// Sampling interval in seconds.
    pub interval: f64,
    pub items: Vec<Option<f64>>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityContributors {
    pub meet_daily_targets: Option<u8>,
    pub move_every_hour: Option<u8>,
    pub recovery_time: Option<u8>,
    pub stay_active: Option<u8>,
    pub training_frequency: Option<u8>,
    pub training_volume: Option<u8>,
}

// ---------------------------------------------------------------------------
// Detailed sleep periods
// ---------------------------------------------------------------------------

/// One sleep period with stage durations and heart metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepPeriod {
    pub id: String,
    pub day: String,
    pub bedtime_start: String,
    pub bedtime_end: String,
    /// Total period duration in seconds.
    pub duration: u32,
    pub total_sleep_duration: u32,
    pub awake_time: u32,
    pub light_sleep_duration: u32,
    pub deep_sleep_duration: u32,
    pub rem_sleep_duration: u32,
    pub restless_periods: u32,
    pub efficiency: u8,
    pub average_heart_rate: Option<f64>,
    pub lowest_heart_rate: Option<f64>,
    pub average_hrv: Option<f64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub readiness_score_delta: Option<f64>,
}

// ---------------------------------------------------------------------------
// Daily stress
// ---------------------------------------------------------------------------

/// Daily stress/recovery record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStress {
    pub id: String,
    pub day: String,
    /// Seconds of elevated stress.
    pub stress_high: Option<u32>,
    /// Seconds of elevated recovery.
    pub recovery_high: Option<u32>,
    pub day_summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_sleep_parses_with_null_scores() {
        let record: DailySleep = serde_json::from_str(
            r#"{
                "id": "sleep-1",
                "day": "2025-06-01",
                "score": null,
                "timestamp": "2025-06-01T06:12:00+00:00",
                "contributors": {
                    "deep_sleep": 80,
                    "efficiency": null,
                    "latency": 95,
                    "rem_sleep": 70,
                    "restfulness": 60,
                    "timing": 88,
                    "total_sleep": 92
                }
            }"#,
        )
        .expect("parse daily sleep");
        assert_eq!(record.score, None);
        assert_eq!(record.contributors.deep_sleep, Some(80));
        assert_eq!(record.contributors.efficiency, None);
    }

    #[test]
    fn sleep_period_keeps_vendor_type_field_name() {
        let record: SleepPeriod = serde_json::from_str(
            r#"{
                "id": "period-1",
                "day": "2025-06-01",
                "bedtime_start": "2025-05-31T23:02:00+02:00",
                "bedtime_end": "2025-06-01T07:14:00+02:00",
                "duration": 29520,
                "total_sleep_duration": 27100,
                "awake_time": 2420,
                "light_sleep_duration": 14800,
                "deep_sleep_duration": 6100,
                "rem_sleep_duration": 6200,
                "restless_periods": 3,
                "efficiency": 92,
                "average_heart_rate": 54.5,
                "lowest_heart_rate": 47,
                "average_hrv": 61.0,
                "type": "long_sleep",
                "readiness_score_delta": null
            }"#,
        )
        .expect("parse sleep period");
        assert_eq!(record.kind, "long_sleep");
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains("\"type\":\"long_sleep\""), "got: {json}");
    }

    #[test]
    fn daily_stress_tolerates_missing_summary() {
        let record: DailyStress = serde_json::from_str(
            r#"{
                "id": "stress-1",
                "day": "2025-06-01",
                "stress_high": 3600,
                "recovery_high": 7200,
                "day_summary": null
            }"#,
        )
        .expect("parse daily stress");
        assert_eq!(record.stress_high, Some(3600));
        assert_eq!(record.day_summary, None);
    }

    #[test]
    fn tool_definition_serializes_type_key() {
        let definition = ToolDefinition {
            tool_type: "function".into(),
            function: FunctionDefinition {
                name: "oura_data".into(),
                description: "fetch health data".into(),
                parameters: serde_json::json!({"type": "object"}),
            },
        };
        let json = serde_json::to_string(&definition).expect("serialize");
        assert!(json.contains("\"type\":\"function\""), "got: {json}");
        assert!(json.contains("\"name\":\"oura_data\""), "got: {json}");
    }
}
