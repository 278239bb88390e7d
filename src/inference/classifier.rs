//! Fitted discriminant models.
//!
//! Each variant maps a transformed feature vector to a class index and, when
//! the model was fitted with probability estimates, a confidence in `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;

/// Class index plus optional max-probability confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class_index: usize,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Classifier {
    /// One-vs-rest linear decision functions; no probability estimates
    Linear {
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
    /// Multinomial logistic regression
    Logistic {
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
    /// Kernel SVM with one-vs-one voting
    Svc(SvcModel),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
    Poly { gamma: f64, coef0: f64, degree: i32 },
    Sigmoid { gamma: f64, coef0: f64 },
}

impl Kernel {
    fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        match *self {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf { gamma } => {
                let dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                (-gamma * dist).exp()
            }
            Kernel::Poly {
                gamma,
                coef0,
                degree,
            } => (gamma * dot(a, b) + coef0).powi(degree),
            Kernel::Sigmoid { gamma, coef0 } => (gamma * dot(a, b) + coef0).tanh(),
        }
    }
}

/// Pairwise Platt scaling parameters, one per class pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub prob_a: Vec<f64>,
    pub prob_b: Vec<f64>,
}

/// libsvm layout: support vectors grouped by class, `dual_coef` has
/// `n_classes - 1` rows, pairs ordered (0,1), (0,2), .., (1,2), ..
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvcModel {
    pub kernel: Kernel,
    pub support_vectors: Vec<Vec<f64>>,
    pub n_support: Vec<usize>,
    pub dual_coef: Vec<Vec<f64>>,
    /// Per-pair offset added to the kernel sum; positive votes for the lower class
    pub intercept: Vec<f64>,
    #[serde(default)]
    pub probability: Option<PlattScaling>,
}

impl Classifier {
    pub fn n_classes(&self) -> usize {
        match self {
            Classifier::Linear { intercept, .. } | Classifier::Logistic { intercept, .. } => {
                intercept.len()
            }
            Classifier::Svc(svc) => svc.n_support.len(),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Classifier::Linear { coef, .. } | Classifier::Logistic { coef, .. } => {
                coef.first().map_or(0, Vec::len)
            }
            Classifier::Svc(svc) => svc.support_vectors.first().map_or(0, Vec::len),
        }
    }

    pub fn supports_probability(&self) -> bool {
        match self {
            Classifier::Linear { .. } => false,
            Classifier::Logistic { .. } => true,
            Classifier::Svc(svc) => svc.probability.is_some(),
        }
    }

    pub fn validate(&self) -> Result<(), ClassifyError> {
        match self {
            Classifier::Linear { coef, intercept } | Classifier::Logistic { coef, intercept } => {
                validate_linear(coef, intercept)
            }
            Classifier::Svc(svc) => svc.validate(),
        }
    }

    pub fn predict(&self, x: &[f64]) -> Result<Prediction, ClassifyError> {
        if x.len() != self.n_features() {
            return Err(ClassifyError::ShapeMismatch {
                stage: "classifier",
                expected: self.n_features(),
                actual: x.len(),
            });
        }

        let prediction = match self {
            Classifier::Linear { coef, intercept } => Prediction {
                class_index: argmax(&decision(coef, intercept, x)),
                confidence: None,
            },
            Classifier::Logistic { coef, intercept } => {
                let probabilities = softmax(&decision(coef, intercept, x));
                let class_index = argmax(&probabilities);
                Prediction {
                    class_index,
                    confidence: Some(probabilities[class_index]),
                }
            }
            Classifier::Svc(svc) => svc.predict(x),
        };
        Ok(prediction)
    }
}

fn validate_linear(coef: &[Vec<f64>], intercept: &[f64]) -> Result<(), ClassifyError> {
    if coef.len() < 2 {
        return Err(ClassifyError::InvalidBundle(
            "linear model needs one weight row per class".to_string(),
        ));
    }
    if coef.len() != intercept.len() {
        return Err(ClassifyError::InvalidBundle(format!(
            "linear model has {} weight rows but {} intercepts",
            coef.len(),
            intercept.len()
        )));
    }
    let width = coef[0].len();
    if width == 0 || coef.iter().any(|row| row.len() != width) {
        return Err(ClassifyError::InvalidBundle(
            "linear model weight rows must share a non-zero length".to_string(),
        ));
    }
    Ok(())
}

impl SvcModel {
    fn n_pairs(&self) -> usize {
        let n = self.n_support.len();
        n * n.saturating_sub(1) / 2
    }

    pub fn validate(&self) -> Result<(), ClassifyError> {
        let n_classes = self.n_support.len();
        let n_sv: usize = self.n_support.iter().sum();
        let invalid = |msg: String| Err(ClassifyError::InvalidBundle(msg));

        if n_classes < 2 {
            return invalid("svc needs at least two classes".to_string());
        }
        if n_sv != self.support_vectors.len() {
            return invalid(format!(
                "svc declares {} support vectors but stores {}",
                n_sv,
                self.support_vectors.len()
            ));
        }
        let width = self.support_vectors.first().map_or(0, Vec::len);
        if width == 0 || self.support_vectors.iter().any(|sv| sv.len() != width) {
            return invalid("svc support vectors must share a non-zero length".to_string());
        }
        if self.dual_coef.len() != n_classes - 1
            || self.dual_coef.iter().any(|row| row.len() != n_sv)
        {
            return invalid(format!(
                "svc dual coefficients must be {} rows of {}",
                n_classes - 1,
                n_sv
            ));
        }
        if self.intercept.len() != self.n_pairs() {
            return invalid(format!(
                "svc needs {} intercepts, found {}",
                self.n_pairs(),
                self.intercept.len()
            ));
        }
        if let Some(platt) = &self.probability {
            if platt.prob_a.len() != self.n_pairs() || platt.prob_b.len() != self.n_pairs() {
                return invalid("svc probability parameters must cover every class pair".to_string());
            }
        }
        Ok(())
    }

    /// Pairwise decision values in pair order
    fn decision_values(&self, x: &[f64]) -> Vec<f64> {
        let kernel: Vec<f64> = self
            .support_vectors
            .iter()
            .map(|sv| self.kernel.eval(sv, x))
            .collect();

        let mut starts = Vec::with_capacity(self.n_support.len());
        let mut offset = 0;
        for &count in &self.n_support {
            starts.push(offset);
            offset += count;
        }

        let n_classes = self.n_support.len();
        let mut values = Vec::with_capacity(self.n_pairs());
        let mut pair = 0;
        for i in 0..n_classes {
            for j in i + 1..n_classes {
                let range_i = starts[i]..starts[i] + self.n_support[i];
                let range_j = starts[j]..starts[j] + self.n_support[j];

                let sum_i: f64 = range_i.map(|s| self.dual_coef[j - 1][s] * kernel[s]).sum();
                let sum_j: f64 = range_j.map(|s| self.dual_coef[i][s] * kernel[s]).sum();
                values.push(sum_i + sum_j + self.intercept[pair]);
                pair += 1;
            }
        }
        values
    }

    fn predict(&self, x: &[f64]) -> Prediction {
        let n_classes = self.n_support.len();
        let decisions = self.decision_values(x);

        let mut votes = vec![0.0f64; n_classes];
        let mut pair = 0;
        for i in 0..n_classes {
            for j in i + 1..n_classes {
                if decisions[pair] > 0.0 {
                    votes[i] += 1.0;
                } else {
                    votes[j] += 1.0;
                }
                pair += 1;
            }
        }

        let confidence = self.probability.as_ref().map(|platt| {
            let probabilities = coupled_probabilities(n_classes, &decisions, platt);
            probabilities.iter().cloned().fold(0.0, f64::max)
        });

        Prediction {
            class_index: argmax(&votes),
            confidence,
        }
    }
}

/// Turn pairwise Platt probabilities into class probabilities by iterative
/// pairwise coupling.
fn coupled_probabilities(n_classes: usize, decisions: &[f64], platt: &PlattScaling) -> Vec<f64> {
    const MIN_PROB: f64 = 1e-7;
    let k = n_classes;

    let mut r = vec![vec![0.0f64; k]; k];
    let mut pair = 0;
    for i in 0..k {
        for j in i + 1..k {
            let p = sigmoid_predict(decisions[pair], platt.prob_a[pair], platt.prob_b[pair])
                .clamp(MIN_PROB, 1.0 - MIN_PROB);
            r[i][j] = p;
            r[j][i] = 1.0 - p;
            pair += 1;
        }
    }

    let mut q = vec![vec![0.0f64; k]; k];
    for t in 0..k {
        for j in 0..k {
            if j == t {
                continue;
            }
            q[t][t] += r[j][t] * r[j][t];
            q[t][j] = -r[j][t] * r[t][j];
        }
    }

    let mut p = vec![1.0 / k as f64; k];
    let mut qp = vec![0.0f64; k];
    let max_iter = k.max(100);
    let eps = 0.005 / k as f64;

    for _ in 0..max_iter {
        let mut pqp = 0.0;
        for t in 0..k {
            qp[t] = (0..k).map(|j| q[t][j] * p[j]).sum();
            pqp += p[t] * qp[t];
        }
        let max_error = qp.iter().map(|v| (v - pqp).abs()).fold(0.0, f64::max);
        if max_error < eps {
            break;
        }
        for t in 0..k {
            let diff = (-qp[t] + pqp) / q[t][t];
            p[t] += diff;
            pqp = (pqp + diff * (diff * q[t][t] + 2.0 * qp[t])) / ((1.0 + diff) * (1.0 + diff));
            for j in 0..k {
                qp[j] = (qp[j] + diff * q[t][j]) / (1.0 + diff);
                p[j] /= 1.0 + diff;
            }
        }
    }
    p
}

fn sigmoid_predict(decision: f64, a: f64, b: f64) -> f64 {
    let f = decision * a + b;
    if f >= 0.0 {
        (-f).exp() / (1.0 + (-f).exp())
    } else {
        1.0 / (1.0 + f.exp())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn decision(coef: &[Vec<f64>], intercept: &[f64], x: &[f64]) -> Vec<f64> {
    coef.iter()
        .zip(intercept)
        .map(|(row, b)| dot(row, x) + b)
        .collect()
}

fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|v| v / total).collect()
}

/// Index of the first maximum
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
