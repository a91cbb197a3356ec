/// Running exponentially weighted mean.
///
/// The adjusted form divides by the accumulated weight of every observation
/// seen so far; the unadjusted form is the plain recurrence
/// `y[i] = alpha * x[i] + (1 - alpha) * y[i - 1]`. In both, weights decay by
/// absolute position, so an undefined input holds the mean but still ages it.
#[derive(Debug, Clone, Copy)]
pub struct Ewm {
    alpha: f64,
    adjust: bool,
    mean: Option<f64>,
    old_weight: f64,
}

impl Ewm {
    pub fn new(alpha: f64, adjust: bool) -> Self {
        Self {
            alpha,
            adjust,
            mean: None,
            old_weight: 1.0,
        }
    }

    /// Adjusted mean with `alpha = 1 / (1 + com)`.
    pub fn center_of_mass(com: f64) -> Self {
        Self::new(1.0 / (1.0 + com), true)
    }

    /// Feed one value and return the mean after it.
    pub fn update(&mut self, value: Option<f64>) -> Option<f64> {
        let value = value.filter(|v| v.is_finite());
        match (self.mean, value) {
            (None, None) => {}
            (None, Some(v)) => {
                self.mean = Some(v);
                self.old_weight = 1.0;
            }
            (Some(mean), observed) => {
                self.old_weight *= 1.0 - self.alpha;
                if let Some(v) = observed {
                    let new_weight = if self.adjust { 1.0 } else { self.alpha };
                    if mean != v {
                        let blended = (self.old_weight * mean + new_weight * v)
                            / (self.old_weight + new_weight);
                        self.mean = Some(blended);
                    }
                    self.old_weight = if self.adjust {
                        self.old_weight + new_weight
                    } else {
                        1.0
                    };
                }
            }
        }
        self.mean
    }
}

pub fn ewm_mean(values: &[Option<f64>], ewm: Ewm) -> Vec<Option<f64>> {
    values
        .iter()
        .scan(ewm, |state, &value| Some(state.update(value)))
        .collect()
}
