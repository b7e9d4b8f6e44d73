//! Finite-difference sensitivity of a node voltage to component parameters.

use crate::circuits::{Circuit, CircuitAnalyzer, NodeId};
use crate::errors::{CircuitError, Result};
use crate::math::Scalar;

/// One parameter to perturb: component name, parameter name, and the
/// fractional tolerance used for the worst-case figure.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct SensitivityTarget {
    /// Component name as registered in the circuit.
    pub component: String,
    /// Parameter key within that component.
    pub parameter: String,
    /// Fractional tolerance (0.05 for ±5 %).
    pub tolerance: Scalar,
}

/// Per-parameter sensitivity report.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct SensitivityResult {
    /// Component name.
    pub component: String,
    /// Parameter key.
    pub parameter: String,
    /// Unperturbed parameter value.
    pub nominal_value: Scalar,
    /// Normalized sensitivity |ΔV| / (Δp/p), volts per fractional change.
    pub sensitivity: Scalar,
    /// Fractional tolerance copied from the target.
    pub tolerance: Scalar,
    /// Sensitivity scaled by the tolerance: the voltage deviation a
    /// worst-case part would cause.
    pub worst_case_deviation: Scalar,
}

/// Perturbs named parameters by 1 % and re-solves to rank their influence on
/// a probe node.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensitivityAnalyzer;

impl SensitivityAnalyzer {
    /// Creates an analyzer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Runs the finite-difference analysis at `frequency`, probing the
    /// voltage at `node`. The circuit is left solved at its nominal values.
    ///
    /// # Errors
    ///
    /// [`CircuitError::InvalidConfiguration`] for an empty target list, an
    /// unknown component or parameter, or a zero nominal value (no relative
    /// perturbation exists); solver errors are propagated.
    pub fn analyze(
        &self,
        analyzer: &mut CircuitAnalyzer,
        circuit: &mut Circuit,
        targets: &[SensitivityTarget],
        node: NodeId,
        frequency: Scalar,
    ) -> Result<Vec<SensitivityResult>> {
        if targets.is_empty() {
            return Err(CircuitError::InvalidConfiguration(
                "sensitivity analysis needs at least one target".into(),
            ));
        }

        analyzer.analyze(circuit, frequency)?;
        let nominal_voltage = circuit.node_voltage(node);

        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let id = circuit.component_by_name(&target.component).ok_or_else(|| {
                CircuitError::InvalidConfiguration(format!(
                    "unknown component {}",
                    target.component
                ))
            })?;
            let nominal = circuit.component(id).parameter(&target.parameter);
            if nominal == 0.0 {
                return Err(CircuitError::InvalidConfiguration(format!(
                    "parameter {}.{} is zero or missing",
                    target.component, target.parameter
                )));
            }

            // 1 % perturbation, solve, restore.
            let delta = nominal * 0.01;
            circuit
                .component_mut(id)
                .set_parameter(target.parameter.clone(), nominal + delta);
            analyzer.analyze(circuit, frequency)?;
            let perturbed_voltage = circuit.node_voltage(node);
            circuit
                .component_mut(id)
                .set_parameter(target.parameter.clone(), nominal);

            let sensitivity = (perturbed_voltage - nominal_voltage).norm() / 0.01;
            results.push(SensitivityResult {
                component: target.component.clone(),
                parameter: target.parameter.clone(),
                nominal_value: nominal,
                sensitivity,
                tolerance: target.tolerance,
                worst_case_deviation: sensitivity * target.tolerance,
            });
        }

        // Leave the circuit solved at its nominal operating point.
        analyzer.analyze(circuit, frequency)?;
        Ok(results)
    }
}
