//! Simulator estimator for ZNE
//!
//! Gantree: L2_Backend → SimulatorEstimator
//!
//! State-vector evolution of the ideal circuit followed by analytic
//! depolarizing damping and optional shot sampling. Small registers only.

use crate::estimator::{EstimationJob, Estimator, RawMeasurement, RunOptions};
use crate::noise::NoiseModel;
use num_complex::Complex64;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::FRAC_1_SQRT_2;
use zne_core::{Circuit, Gate, Observable, Pauli, ZneError, ZneResult};

/// Largest register the simulator accepts
pub const MAX_QUBITS: usize = 20;

type Matrix2 = [[Complex64; 2]; 2];
type Matrix4 = [[Complex64; 4]; 4];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

// ============================================================================
// State Vector
// ============================================================================

/// Pure state of `n` qubits; bit `q` of a basis index is qubit `q`
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl StateVector {
    /// |0…0⟩
    pub fn zero(num_qubits: usize) -> ZneResult<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(ZneError::EstimatorError(format!(
                "{} qubits exceed simulator limit of {}",
                num_qubits, MAX_QUBITS
            )));
        }
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Ok(Self {
            num_qubits,
            amplitudes,
        })
    }

    /// Evolve |0…0⟩ through a circuit
    ///
    /// Barriers and measurements are skipped; resets and opaque gates are
    /// rejected.
    /// Gantree: from_circuit(&Circuit) -> Result<Self>
    pub fn from_circuit(circuit: &Circuit) -> ZneResult<Self> {
        let mut state = Self::zero(circuit.num_qubits())?;
        for gate in circuit.gates() {
            state.apply(gate)?;
        }
        Ok(state)
    }

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Amplitudes
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// |⟨self|other⟩|², insensitive to global phase
    pub fn fidelity(&self, other: &StateVector) -> f64 {
        self.amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum::<Complex64>()
            .norm_sqr()
    }

    /// ⟨ψ|P|ψ⟩ for one Pauli string
    pub fn pauli_expectation(&self, paulis: &[Pauli]) -> f64 {
        let mut flip = 0usize;
        for (q, p) in paulis.iter().enumerate() {
            if matches!(p, Pauli::X | Pauli::Y) {
                flip |= 1 << q;
            }
        }

        let mut total = ZERO;
        for (i, &amp) in self.amplitudes.iter().enumerate() {
            let mut phase = ONE;
            for (q, p) in paulis.iter().enumerate() {
                let bit = (i >> q) & 1;
                phase *= match (p, bit) {
                    (Pauli::Y, 0) => I,
                    (Pauli::Y, _) => -I,
                    (Pauli::Z, 1) => -ONE,
                    _ => ONE,
                };
            }
            total += self.amplitudes[i ^ flip].conj() * phase * amp;
        }
        total.re
    }

    // ========================================================================
    // Gate Application
    // ========================================================================

    fn apply(&mut self, gate: &Gate) -> ZneResult<()> {
        match gate {
            Gate::H(q) => {
                let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
                self.apply_1q(*q, [[h, h], [h, -h]]);
            }
            Gate::X(q) => self.apply_1q(*q, pauli_x()),
            Gate::Y(q) => self.apply_1q(*q, pauli_y()),
            Gate::Z(q) => self.apply_1q(*q, phase(std::f64::consts::PI)),
            Gate::S(q) => self.apply_1q(*q, [[ONE, ZERO], [ZERO, I]]),
            Gate::Sdg(q) => self.apply_1q(*q, [[ONE, ZERO], [ZERO, -I]]),
            Gate::T(q) => self.apply_1q(*q, phase(std::f64::consts::FRAC_PI_4)),
            Gate::Tdg(q) => self.apply_1q(*q, phase(-std::f64::consts::FRAC_PI_4)),
            Gate::Sx(q) => self.apply_1q(*q, sqrt_x(false)),
            Gate::Sxdg(q) => self.apply_1q(*q, sqrt_x(true)),
            Gate::Id(_) => {}
            Gate::Rx(q, theta) => self.apply_1q(*q, rx(*theta)),
            Gate::Ry(q, theta) => self.apply_1q(*q, ry(*theta)),
            Gate::Rz(q, theta) => self.apply_1q(*q, rz(*theta)),
            Gate::U(q, theta, phi, lambda) => self.apply_1q(*q, u(*theta, *phi, *lambda)),
            Gate::P(q, lambda) => self.apply_1q(*q, phase(*lambda)),

            Gate::Cnot(c, t) => self.apply_controlled(&[*c], *t, pauli_x()),
            Gate::Cy(c, t) => self.apply_controlled(&[*c], *t, pauli_y()),
            Gate::Cz(c, t) => self.apply_controlled(&[*c], *t, phase(std::f64::consts::PI)),
            Gate::Crx(c, t, theta) => self.apply_controlled(&[*c], *t, rx(*theta)),
            Gate::Cry(c, t, theta) => self.apply_controlled(&[*c], *t, ry(*theta)),
            Gate::Crz(c, t, theta) => self.apply_controlled(&[*c], *t, rz(*theta)),
            Gate::Swap(a, b) => self.apply_swap(None, *a, *b),
            Gate::ISwap(a, b) => self.apply_2q(*a, *b, iswap(false)),
            Gate::ISwapdg(a, b) => self.apply_2q(*a, *b, iswap(true)),
            Gate::Ecr(a, b) => self.apply_2q(*a, *b, ecr()),
            Gate::Ccx(c1, c2, t) => self.apply_controlled(&[*c1, *c2], *t, pauli_x()),
            Gate::Cswap(c, a, b) => self.apply_swap(Some(*c), *a, *b),

            Gate::Barrier(_) | Gate::Measure(_) | Gate::MeasureAll => {}
            Gate::Reset(_) | Gate::Opaque(_) => {
                return Err(ZneError::EstimatorError(format!(
                    "simulator cannot apply '{}'",
                    gate.name()
                )));
            }
        }
        Ok(())
    }

    fn apply_1q(&mut self, q: usize, m: Matrix2) {
        self.apply_controlled(&[], q, m);
    }

    fn apply_controlled(&mut self, controls: &[usize], target: usize, m: Matrix2) {
        let control_mask = controls.iter().fold(0usize, |acc, &c| acc | (1usize << c));
        let target_mask = 1 << target;

        for i in 0..self.amplitudes.len() {
            if i & target_mask == 0 && i & control_mask == control_mask {
                let j = i | target_mask;
                let (a, b) = (self.amplitudes[i], self.amplitudes[j]);
                self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
                self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_swap(&mut self, control: Option<usize>, a: usize, b: usize) {
        let control_mask = control.map_or(0, |c| 1 << c);
        let (mask_a, mask_b) = (1 << a, 1 << b);

        for i in 0..self.amplitudes.len() {
            if i & control_mask == control_mask && i & mask_a != 0 && i & mask_b == 0 {
                self.amplitudes.swap(i, i ^ mask_a ^ mask_b);
            }
        }
    }

    /// Two-qubit matrix in the basis `|b⟩|a⟩` (local index `bit_a + 2·bit_b`)
    fn apply_2q(&mut self, a: usize, b: usize, m: Matrix4) {
        let (mask_a, mask_b) = (1 << a, 1 << b);

        for base in 0..self.amplitudes.len() {
            if base & (mask_a | mask_b) != 0 {
                continue;
            }
            let idx = [base, base | mask_a, base | mask_b, base | mask_a | mask_b];
            let old = idx.map(|k| self.amplitudes[k]);
            for (row, &k) in idx.iter().enumerate() {
                self.amplitudes[k] = (0..4).map(|col| m[row][col] * old[col]).sum();
            }
        }
    }
}

// ============================================================================
// Gate Matrices
// ============================================================================

fn pauli_x() -> Matrix2 {
    [[ZERO, ONE], [ONE, ZERO]]
}

fn pauli_y() -> Matrix2 {
    [[ZERO, -I], [I, ZERO]]
}

fn phase(lambda: f64) -> Matrix2 {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, lambda)]]
}

fn sqrt_x(adjoint: bool) -> Matrix2 {
    let p = Complex64::new(0.5, if adjoint { -0.5 } else { 0.5 });
    let m = p.conj();
    [[p, m], [m, p]]
}

fn rx(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    [[c, s], [s, c]]
}

fn ry(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

fn rz(theta: f64) -> Matrix2 {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

fn u(theta: f64, phi: f64, lambda: f64) -> Matrix2 {
    let (s, c) = (theta / 2.0).sin_cos();
    [
        [
            Complex64::new(c, 0.0),
            -Complex64::from_polar(s, lambda),
        ],
        [
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        ],
    ]
}

fn iswap(adjoint: bool) -> Matrix4 {
    let i = if adjoint { -I } else { I };
    [
        [ONE, ZERO, ZERO, ZERO],
        [ZERO, ZERO, i, ZERO],
        [ZERO, i, ZERO, ZERO],
        [ZERO, ZERO, ZERO, ONE],
    ]
}

fn ecr() -> Matrix4 {
    let r = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let ri = Complex64::new(0.0, FRAC_1_SQRT_2);
    [
        [ZERO, r, ZERO, ri],
        [r, ZERO, -ri, ZERO],
        [ZERO, ri, ZERO, r],
        [-ri, ZERO, r, ZERO],
    ]
}

// ============================================================================
// Simulator Estimator
// ============================================================================

/// Estimator backed by state-vector simulation with depolarizing noise
/// Gantree: SimulatorEstimator // reference collaborator
#[derive(Debug, Clone)]
pub struct SimulatorEstimator {
    name: String,
    noise_model: NoiseModel,
}

impl SimulatorEstimator {
    /// Create with a noise model
    pub fn new(noise_model: NoiseModel) -> Self {
        Self {
            name: "zne_simulator".to_string(),
            noise_model,
        }
    }

    /// Noiseless estimator
    pub fn ideal() -> Self {
        Self::new(NoiseModel::ideal())
    }

    /// Create from an effective depolarizing rate
    pub fn from_depol(p_depol: f64) -> ZneResult<Self> {
        Ok(Self::new(NoiseModel::from_depol(p_depol)?))
    }

    /// Set estimator name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Noise model
    pub fn noise_model(&self) -> &NoiseModel {
        &self.noise_model
    }

    /// Noisy expectation of each term of an observable
    ///
    /// Identity terms are returned undamped.
    pub fn term_expectations(
        &self,
        circuit: &Circuit,
        observable: &Observable,
    ) -> ZneResult<Vec<f64>> {
        let state = StateVector::from_circuit(circuit)?;
        let gate_fidelity = self.noise_model.gate_fidelity(circuit.gates());

        Ok(observable
            .terms()
            .iter()
            .map(|term| {
                let weight = term.support().len();
                let ideal = state.pauli_expectation(&term.paulis);
                if weight == 0 {
                    ideal
                } else {
                    ideal * gate_fidelity * self.noise_model.readout_damping(weight)
                }
            })
            .collect())
    }

    /// Estimate one job with an optional sampling RNG
    fn estimate_job(
        &self,
        job: &EstimationJob,
        shots: Option<u64>,
        rng: &mut ChaCha8Rng,
    ) -> ZneResult<RawMeasurement> {
        let exact = self.term_expectations(&job.circuit, &job.observable)?;
        let terms = job.observable.terms();

        let means: Vec<f64> = match shots {
            None => exact,
            Some(shots) => exact
                .iter()
                .zip(terms)
                .map(|(&e, term)| {
                    if term.support().is_empty() {
                        return e;
                    }
                    let p_plus = ((1.0 + e) / 2.0).clamp(0.0, 1.0);
                    let plus = (0..shots).filter(|_| rng.gen_bool(p_plus)).count() as f64;
                    2.0 * plus / shots as f64 - 1.0
                })
                .collect(),
        };

        let value: f64 = means.iter().zip(terms).map(|(m, t)| t.coefficient * m).sum();
        let variance: f64 = means
            .iter()
            .zip(terms)
            .map(|(m, t)| t.coefficient * t.coefficient * (1.0 - m * m).max(0.0))
            .sum();

        Ok(RawMeasurement::new(value, variance, shots.unwrap_or(0)))
    }
}

impl Estimator for SimulatorEstimator {
    fn name(&self) -> &str {
        &self.name
    }

    fn estimate(
        &self,
        jobs: &[EstimationJob],
        options: &RunOptions,
    ) -> ZneResult<Vec<RawMeasurement>> {
        options.validate()?;

        let mut rng = match options.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        log::debug!(
            "{}: estimating {} jobs (shots={:?}, {})",
            self.name,
            jobs.len(),
            options.shots,
            self.noise_model
        );

        jobs.iter()
            .map(|job| self.estimate_job(job, options.shots, &mut rng))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use zne_core::CircuitBuilder;

    fn bell_job() -> EstimationJob {
        let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build();
        EstimationJob::new(circuit, "ZZ".parse().unwrap()).unwrap()
    }

    #[test]
    fn test_bell_correlations() {
        let state = StateVector::from_circuit(&bell_job().circuit).unwrap();
        assert_relative_eq!(state.pauli_expectation(&[Pauli::Z, Pauli::Z]), 1.0, epsilon = 1e-12);
        assert_relative_eq!(state.pauli_expectation(&[Pauli::X, Pauli::X]), 1.0, epsilon = 1e-12);
        assert_relative_eq!(state.pauli_expectation(&[Pauli::Y, Pauli::Y]), -1.0, epsilon = 1e-12);
        assert_relative_eq!(state.pauli_expectation(&[Pauli::Z, Pauli::I]), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_expectation() {
        let circuit = CircuitBuilder::new(1).ry(0, 0.7).build();
        let state = StateVector::from_circuit(&circuit).unwrap();
        assert_relative_eq!(state.pauli_expectation(&[Pauli::Z]), 0.7f64.cos(), epsilon = 1e-12);
        assert_relative_eq!(state.pauli_expectation(&[Pauli::X]), 0.7f64.sin(), epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_gates_cancel() {
        let gates = [
            Gate::U(0, 0.3, 1.2, -0.4),
            Gate::Sx(1),
            Gate::ISwap(0, 1),
            Gate::Ecr(1, 0),
            Gate::Crx(0, 1, 0.8),
            Gate::Cswap(2, 0, 1),
        ];
        let prep = CircuitBuilder::new(3).h(0).ry(1, 0.4).h(2).build();
        let reference = StateVector::from_circuit(&prep).unwrap();

        for gate in gates {
            let mut circuit = prep.clone();
            circuit.add_gate(gate.clone()).unwrap();
            circuit.add_gate(gate.inverse().unwrap()).unwrap();
            let state = StateVector::from_circuit(&circuit).unwrap();
            assert_relative_eq!(state.fidelity(&reference), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_exact_noisy_value() {
        let model = NoiseModel::new(0.0, 0.1, 0.0).unwrap();
        let estimator = SimulatorEstimator::new(model);
        let m = estimator
            .estimate_one(&bell_job(), &RunOptions::exact())
            .unwrap();

        assert_relative_eq!(m.value, 0.9, epsilon = 1e-12);
        assert_relative_eq!(m.variance, 1.0 - 0.81, epsilon = 1e-12);
        assert_eq!(m.shots, 0);
    }

    #[test]
    fn test_sampling_is_seeded() {
        let estimator = SimulatorEstimator::from_depol(0.01).unwrap();
        let options = RunOptions::default().with_shots(2000).with_seed(42);
        let jobs = vec![bell_job(), bell_job()];

        let first = estimator.estimate(&jobs, &options).unwrap();
        let second = estimator.estimate(&jobs, &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].shots, 2000);

        let exact = estimator.estimate_one(&bell_job(), &RunOptions::exact()).unwrap();
        assert!((first[0].value - exact.value).abs() < 0.1);
    }

    #[test]
    fn test_reset_rejected() {
        let circuit = CircuitBuilder::new(1).reset(0).build();
        let job = EstimationJob::new(circuit, "Z".parse().unwrap()).unwrap();
        let result = SimulatorEstimator::ideal().estimate_one(&job, &RunOptions::exact());
        assert!(matches!(result, Err(ZneError::EstimatorError(_))));
    }

    #[test]
    fn test_qubit_limit() {
        assert!(StateVector::zero(MAX_QUBITS + 1).is_err());
    }
}
