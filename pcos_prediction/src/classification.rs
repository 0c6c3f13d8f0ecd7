use serde::Serialize;

pub const DEFAULT_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    #[serde(rename = "PCOS Detected")]
    PcosDetected,
    #[serde(rename = "No PCOS Detected")]
    NoPcosDetected,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::PcosDetected => "PCOS Detected",
            Label::NoPcosDetected => "No PCOS Detected",
        }
    }
}

/// Body of a successful `/predict` response.
///
/// `confidence` is the raw output of the model's single sigmoid unit. It is
/// reported as-is for both labels, so a "No PCOS Detected" answer usually
/// carries a confidence close to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub prediction: Label,
    pub confidence: f32,
}

impl Prediction {
    /// Only a score strictly above `threshold` is a positive. Callers reject
    /// non-finite scores before getting here; NaN would land on the negative side.
    pub fn from_score(score: f32, threshold: f32) -> Self {
        let prediction = if score > threshold {
            Label::PcosDetected
        } else {
            Label::NoPcosDetected
        };

        Self {
            prediction,
            confidence: score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_above_threshold_is_positive() {
        let prediction = Prediction::from_score(0.87, DEFAULT_THRESHOLD);

        assert_eq!(prediction.prediction, Label::PcosDetected);
        assert_eq!(prediction.confidence, 0.87);
    }

    #[test]
    fn test_threshold_itself_is_negative() {
        let prediction = Prediction::from_score(0.5, DEFAULT_THRESHOLD);

        assert_eq!(prediction.prediction, Label::NoPcosDetected);
        assert_eq!(
            Prediction::from_score(0.500_001, DEFAULT_THRESHOLD).prediction,
            Label::PcosDetected
        );
    }

    #[test]
    fn test_negative_keeps_raw_score() {
        let prediction = Prediction::from_score(0.03, DEFAULT_THRESHOLD);

        assert_eq!(prediction.prediction, Label::NoPcosDetected);
        assert_eq!(prediction.confidence, 0.03);
    }

    #[test]
    fn test_nan_score_is_negative() {
        let prediction = Prediction::from_score(f32::NAN, DEFAULT_THRESHOLD);

        assert_eq!(prediction.prediction, Label::NoPcosDetected);
    }

    #[test]
    fn test_serialized_shape() {
        let body = serde_json::to_value(Prediction::from_score(0.25, DEFAULT_THRESHOLD)).unwrap();

        assert_eq!(body["prediction"], "No PCOS Detected");
        assert_eq!(body["confidence"], 0.25);
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_label_strings_match_serde() {
        for label in [Label::PcosDetected, Label::NoPcosDetected] {
            assert_eq!(serde_json::to_value(label).unwrap(), label.as_str());
        }
    }
}
