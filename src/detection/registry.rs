use super::detector::Detector;
use std::collections::BTreeSet;
use tracing::debug;

/// Owns every registered detector plus the detection order
///
/// Membership in the order means "enabled"; position means try order. The
/// order never contains duplicates or names without a registered detector.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn Detector>>,
    order: Vec<String>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a detector by name. A new name is appended to the
    /// order; an existing name keeps its current position and enablement.
    pub fn register(&mut self, detector: Box<dyn Detector>) {
        let name = detector.name().to_string();

        match self.position_of(&name) {
            Some(index) => {
                debug!(detector = %name, "Replacing registered detector");
                self.detectors[index] = detector;
            }
            None => {
                debug!(detector = %name, "Registering detector");
                self.detectors.push(detector);
                if !self.order.contains(&name) {
                    self.order.push(name);
                }
            }
        }
    }

    /// Removes a detector and its order membership. Returns the removed
    /// instance, if any.
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn Detector>> {
        self.order.retain(|n| n != name);
        let index = self.position_of(name)?;
        debug!(detector = %name, "Unregistering detector");
        Some(self.detectors.remove(index))
    }

    /// Replaces the order. Unknown names and repeats are dropped silently.
    pub fn set_order<S: AsRef<str>>(&mut self, names: &[S]) {
        let mut order: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !self.contains(name) {
                debug!(detector = %name, "Ignoring unknown detector in order");
                continue;
            }
            if !order.iter().any(|n| n == name) {
                order.push(name.to_string());
            }
        }
        self.order = order;
    }

    /// Appends `name` to the order if registered and not already enabled.
    /// Returns whether the detector is enabled afterwards.
    pub fn enable(&mut self, name: &str) -> bool {
        if !self.contains(name) {
            return false;
        }
        if !self.is_enabled(name) {
            self.order.push(name.to_string());
        }
        true
    }

    /// Removes `name` from the order without touching the others. Returns
    /// whether it was enabled before.
    pub fn disable(&mut self, name: &str) -> bool {
        let before = self.order.len();
        self.order.retain(|n| n != name);
        self.order.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position_of(name).is_some()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.order.iter().any(|n| n == name)
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Detector> {
        self.detectors
            .iter()
            .find(|d| d.name() == name)
            .map(|d| d.as_ref())
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut (dyn Detector + 'static)> {
        self.detectors
            .iter_mut()
            .find(|d| d.name() == name)
            .map(|d| d.as_mut())
    }

    /// All registered detectors in registration order.
    pub fn list_all(&self) -> Vec<&dyn Detector> {
        self.detectors.iter().map(|d| d.as_ref()).collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Detector>> {
        self.detectors.iter_mut()
    }

    /// Names of all registered detectors in registration order.
    pub fn list_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Enabled detectors resolved in order, skipping names whose instance
    /// has vanished.
    pub fn list_in_order(&self) -> Vec<&dyn Detector> {
        self.order
            .iter()
            .filter_map(|name| self.lookup(name))
            .collect()
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Deduplicated, sorted union of every registered detector's languages.
    pub fn supported_languages(&self) -> Vec<String> {
        self.detectors
            .iter()
            .flat_map(|d| d.supported_languages())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// At least one registered detector and at least one enabled.
    pub fn is_valid(&self) -> bool {
        !self.detectors.is_empty() && !self.list_in_order().is_empty()
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.detectors.iter().position(|d| d.name() == name)
    }
}
