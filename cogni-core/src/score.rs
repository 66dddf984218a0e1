//! Small numeric helpers shared by the game scorers.

/// Clamps to `[0, 100]`; NaN counts as zero.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let var = values.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Standard deviation over mean. `None` for empty input or a zero mean.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    if avg <= 0.0 {
        return None;
    }
    Some(std_dev(values)? / avg)
}

/// Percentage of `part` in `whole`, `None` when `whole` is zero.
pub fn percent(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

/// Weighted blend of sub-scores.
///
/// Each component is clamped to `[0, 100]` on insertion and the blend is
/// clamped again, so the result never leaves the score range whatever the
/// weights add up to.
#[derive(Debug, Clone, Default)]
pub struct WeightedScore {
    components: Vec<(&'static str, f64, f64)>,
}

impl WeightedScore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(mut self, name: &'static str, weight: f64, value: f64) -> Self {
        self.components.push((name, weight, clamp_score(value)));
        self
    }

    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.components
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, _, v)| *v)
    }

    /// `(name, clamped value)` pairs in insertion order.
    pub fn components(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.components.iter().map(|(n, _, v)| (*n, *v))
    }

    pub fn total(&self) -> f64 {
        clamp_score(self.components.iter().map(|(_, w, v)| w * v).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_on_empty_input() {
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[]), None);
        assert_eq!(coefficient_of_variation(&[]), None);
        assert_eq!(percent(3, 0), None);
    }

    #[test]
    fn uniform_values_have_no_variation() {
        let rts = [400.0; 10];
        assert_eq!(mean(&rts), Some(400.0));
        assert_eq!(coefficient_of_variation(&rts), Some(0.0));
    }

    #[test]
    fn std_dev_is_population() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(std_dev(&v), Some(2.0));
    }

    #[test]
    fn weighted_components_are_clamped_before_blending() {
        let s = WeightedScore::new()
            .component("a", 0.5, 250.0)
            .component("b", 0.5, -80.0);
        assert_eq!(s.value_of("a"), Some(100.0));
        assert_eq!(s.value_of("b"), Some(0.0));
        assert_eq!(s.total(), 50.0);
    }

    #[test]
    fn total_is_clamped() {
        let s = WeightedScore::new().component("a", 3.0, 90.0);
        assert_eq!(s.total(), 100.0);
        assert_eq!(clamp_score(f64::NAN), 0.0);
    }
}
