use feature_engine::Reading;

use crate::trend::Trend;

/// Human-readable alert text embedding the triggering readings
pub fn alert_message(location: &str, trend: Trend, confidence: f64, reading: &Reading) -> String {
    format!(
        "HIGH RISK detected at {}! Trend: {}. Rainfall={:.1}mm, pH={:.2}, Contamination={:.2}, Cases={}. Confidence: {:.1}%",
        location,
        trend,
        reading.rainfall,
        reading.ph_level,
        reading.contamination,
        reading.cases_count,
        confidence * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_contents() {
        let message = alert_message("Ward 7", Trend::Rising, 0.98, &Reading::new(400.0, 4.0, 0.9, 100));
        assert_eq!(
            message,
            "HIGH RISK detected at Ward 7! Trend: RISING. Rainfall=400.0mm, pH=4.00, Contamination=0.90, Cases=100. Confidence: 98.0%"
        );
    }
}
