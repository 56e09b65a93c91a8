use async_trait::async_trait;
use langtag::detection::detector::threshold_to_external;
use langtag::detection::{
    ConfigurableDetector, DetectionResult, Detector, DetectorError, LanguageFilter,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted answer of a [`MockDetector`]
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockResponse {
    Detect(&'static str, u8),
    Nothing,
    Error(&'static str),
    Panic,
}

/// Detector that replays scripted responses
///
/// Queued responses are consumed in order; once the queue is empty every
/// call gets the fallback response.
pub struct MockDetector {
    name: String,
    responses: Mutex<VecDeque<MockResponse>>,
    fallback: MockResponse,
    threshold: f64,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    enabled_languages: Option<Vec<String>>,
    payload: Option<Value>,
}

#[allow(dead_code)]
impl MockDetector {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: Mutex::new(VecDeque::new()),
            fallback: MockResponse::Nothing,
            threshold: 0.0,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            enabled_languages: None,
            payload: None,
        }
    }

    pub fn returning(name: &str, language: &'static str, confidence: u8) -> Self {
        Self::new(name).with_fallback(MockResponse::Detect(language, confidence))
    }

    pub fn failing(name: &str) -> Self {
        Self::new(name).with_fallback(MockResponse::Error("scripted failure"))
    }

    pub fn panicking(name: &str) -> Self {
        Self::new(name).with_fallback(MockResponse::Panic)
    }

    pub fn with_fallback(mut self, response: MockResponse) -> Self {
        self.fallback = response;
        self
    }

    pub fn with_responses(self, responses: impl IntoIterator<Item = MockResponse>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .extend(responses);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Exposes a [`LanguageFilter`] with the given allow-list.
    pub fn with_language_filter(mut self, languages: &[&str]) -> Self {
        self.enabled_languages = Some(languages.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Exposes a [`ConfigurableDetector`] holding `payload`.
    pub fn configurable(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Shared call counter, still readable after the detector is boxed.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn boxed(self) -> Box<dyn Detector> {
        Box::new(self)
    }
}

#[async_trait]
impl Detector for MockDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Scripted test detector"
    }

    fn supported_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .chain(std::iter::once(&self.fallback))
            .filter_map(|r| match r {
                MockResponse::Detect(language, _) => Some(language.to_string()),
                _ => None,
            })
            .collect();
        languages.sort();
        languages.dedup();
        languages
    }

    async fn detect(&self, code: &str) -> Result<Option<DetectionResult>, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if code.trim().is_empty() {
            return Ok(None);
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match response {
            MockResponse::Detect(language, confidence) => {
                if confidence < threshold_to_external(self.threshold) {
                    return Ok(None);
                }
                Ok(Some(DetectionResult::new(language, confidence, &self.name)))
            }
            MockResponse::Nothing => Ok(None),
            MockResponse::Error(message) => Err(DetectorError::Failed(message.to_string())),
            MockResponse::Panic => panic!("scripted panic in {}", self.name),
        }
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    fn as_configurable(&self) -> Option<&dyn ConfigurableDetector> {
        self.payload.as_ref().map(|_| self as &dyn ConfigurableDetector)
    }

    fn as_configurable_mut(&mut self) -> Option<&mut dyn ConfigurableDetector> {
        if self.payload.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn as_language_filter(&self) -> Option<&dyn LanguageFilter> {
        self.enabled_languages
            .as_ref()
            .map(|_| self as &dyn LanguageFilter)
    }

    fn as_language_filter_mut(&mut self) -> Option<&mut dyn LanguageFilter> {
        if self.enabled_languages.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl ConfigurableDetector for MockDetector {
    fn get_configuration(&self) -> Value {
        self.payload.clone().unwrap_or(Value::Null)
    }

    fn set_configuration(&mut self, payload: Value) -> Result<(), DetectorError> {
        if !payload.is_object() {
            return Err(DetectorError::InvalidConfiguration(
                "payload must be an object".to_string(),
            ));
        }
        self.payload = Some(payload);
        Ok(())
    }
}

impl LanguageFilter for MockDetector {
    fn enabled_languages(&self) -> Vec<String> {
        self.enabled_languages.clone().unwrap_or_default()
    }

    fn set_enabled_languages(&mut self, languages: Vec<String>) {
        self.enabled_languages = Some(languages);
    }
}

/// Path to the built `langtag` binary
#[allow(dead_code)]
pub fn langtag_bin() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_langtag"))
}
