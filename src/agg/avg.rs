// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use num_bigint::BigInt;
use num_traits::Zero;
use tracing::warn;

use super::planner::AvgPlan;
use super::state::AvgDecimalState;
use crate::decimal::{self, Decimal, DecimalArray};
use crate::error::{AggError, AggPhase, DecimalError};

/// Exact decimal AVG kernel.
///
/// Drives one [`AvgDecimalState`] per partition through the aggregation
/// lifecycle: `init_state`, any number of `update_batch` calls, any tree of
/// `merge` calls over peer states, and exactly one `finalize` on the fully
/// reduced state. Accumulation never rounds; the single rounding step is the
/// ROUND_HALF_UP division to the output shape at finalize, and finalize
/// refuses with a diagnostic when the exact sum provably cannot fit the
/// precision ceiling.
pub struct ExactAvg {
    plan: AvgPlan,
}

impl ExactAvg {
    pub fn new(plan: AvgPlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &AvgPlan {
        &self.plan
    }

    /// Fresh zeroed state: sum 0, count 0, input shape not yet learned.
    pub fn init_state(&self) -> AvgDecimalState {
        AvgDecimalState::new()
    }

    /// Fold one batch of nullable input values into the state. Null rows are
    /// never counted and never summed.
    pub fn update_batch(
        &self,
        state: &mut AvgDecimalState,
        input: &DecimalArray,
    ) -> Result<(), AggError> {
        // On the first call, record the input column's shape in the state so
        // finalize can diagnose overflow from it.
        if state.input_shape.is_none() {
            let shape = input.shape();
            shape
                .validate()
                .map_err(AggError::arithmetic(AggPhase::Accumulate))?;
            if shape.precision < 1 || shape.precision > self.plan.max_precision {
                return Err(AggError::InvalidInputShape {
                    precision: shape.precision,
                    max_precision: self.plan.max_precision,
                });
            }
            state.input_shape = Some(shape);
        }

        // The planner keeps the accumulator at the input scale, but the
        // rescale path stays: a batch at a different scale is folded in
        // exactly or not at all.
        let sum_scale = self.plan.sum_shape.scale;
        let input_scale = input.shape().scale;
        let scale_diff = sum_scale as i64 - input_scale as i64;
        let factor = (scale_diff != 0).then(|| decimal::pow10(scale_diff.unsigned_abs() as u32));

        for row in 0..input.len() {
            let Some(value) = input.value_at(row) else {
                continue;
            };
            let addend = match &factor {
                None => value.clone(),
                Some(factor) if scale_diff > 0 => value * factor,
                Some(factor) => {
                    if !(value % factor).is_zero() {
                        return Err(AggError::Arithmetic {
                            phase: AggPhase::Accumulate,
                            source: DecimalError::InexactRescale {
                                from: input_scale,
                                to: sum_scale,
                            },
                        });
                    }
                    value / factor
                }
            };
            state.sum += addend;
            state.count = state.count.checked_add(1).ok_or_else(|| {
                AggError::InternalConsistency("row count overflowed 64 bits".to_string())
            })?;
        }
        Ok(())
    }

    /// Fold one peer's partial state into `state`, consuming the peer.
    /// Associative and commutative: any merge tree over the same partials
    /// reduces to the same state.
    pub fn merge(&self, state: &mut AvgDecimalState, peer: AvgDecimalState) -> Result<(), AggError> {
        state.sum += peer.sum;
        state.count = state.count.checked_add(peer.count).ok_or_else(|| {
            AggError::InternalConsistency("merged row count overflowed 64 bits".to_string())
        })?;

        // All peers of one logical group are planned with the same input
        // shape. A disagreement signals an upstream bug: reconcile to the
        // wider shape (never narrow a learned shape) and flag it.
        state.input_shape = match (state.input_shape, peer.input_shape) {
            (Some(mine), Some(theirs)) => {
                if mine != theirs {
                    warn!(
                        "exact_avg: merged partial states disagree on input shape: {} vs {}",
                        mine, theirs
                    );
                }
                Some(mine.reconcile_max(theirs))
            }
            (mine, theirs) => mine.or(theirs),
        };
        Ok(())
    }

    /// Fold any number of peer states, in the order given.
    pub fn merge_batch(
        &self,
        state: &mut AvgDecimalState,
        peers: impl IntoIterator<Item = AvgDecimalState>,
    ) -> Result<(), AggError> {
        for peer in peers {
            self.merge(state, peer)?;
        }
        Ok(())
    }

    /// Fold a batch of encoded partial states as exchanged between nodes.
    /// Null blobs are empty peers and fold to nothing.
    pub fn merge_encoded(
        &self,
        state: &mut AvgDecimalState,
        blobs: &[Option<&str>],
    ) -> Result<(), AggError> {
        for blob in blobs {
            let Some(text) = blob else {
                continue;
            };
            let peer = AvgDecimalState::decode(text)?;
            self.merge(state, peer)?;
        }
        Ok(())
    }

    /// Produce the exact average, or `None` for a group with no non-null
    /// rows. Called exactly once, on the fully reduced state.
    pub fn finalize(&self, state: AvgDecimalState) -> Result<Option<Decimal>, AggError> {
        // No non-null rows in this group: NULL, like AVG.
        if state.count == 0 {
            return Ok(None);
        }

        let input_shape = state.input_shape.ok_or_else(|| {
            AggError::InternalConsistency(
                "input shape was never learned for a non-empty state".to_string(),
            )
        })?;
        if input_shape.validate_against(self.plan.max_precision).is_err() {
            return Err(AggError::InternalConsistency(format!(
                "invalid stored input shape {}",
                input_shape
            )));
        }

        let count_digits = decimal::digits10_u64(state.count);
        debug_assert!(count_digits >= 1);

        // Worst-case total precision needed for the sum:
        //   p_needed = p_in + ceil(log10(count)) = p_in + count_digits
        // Past the ceiling no implementation can hold an exact sum, so fail
        // loudly instead of returning a wrong answer.
        let required = input_shape.precision + count_digits;
        if required > self.plan.max_precision {
            return Err(AggError::PrecisionOverflow {
                required,
                input_precision: input_shape.precision,
                count_digits,
                row_count: state.count,
                max_precision: self.plan.max_precision,
            });
        }

        // p_sum = min(ceiling, p_in + 19) >= p_in + count_digits = required,
        // since count_digits <= 19 for any 64-bit count: the accumulated sum
        // is already exactly representable and needs no re-check.
        let sum_scale = self.plan.sum_shape.scale;
        let out_shape = self.plan.output_shape;
        let count = BigInt::from(state.count);
        let quotient = if out_shape.scale >= sum_scale {
            let scaled = &state.sum * decimal::pow10(out_shape.scale - sum_scale);
            decimal::div_round(&scaled, &count)
        } else {
            let divisor = &count * decimal::pow10(sum_scale - out_shape.scale);
            decimal::div_round(&state.sum, &divisor)
        };

        let out =
            Decimal::try_new(quotient, out_shape).map_err(AggError::arithmetic(AggPhase::Finalize))?;
        Ok(Some(out))
    }
}
