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
use tracing::debug;

use crate::decimal::DecimalShape;
use crate::error::{AggError, AggPhase};

/// Extra digits reserved in the accumulator for row-count growth.
/// 19 covers any possible 64-bit row count (N <= 9.2e18, 19 digits).
pub const EXTRA_DIGITS_FOR_ROW_COUNT: u32 = 19;

/// Headroom added to the output shape. Affects display/storage width of the
/// final quotient only, not overflow reasoning.
const OUTPUT_EXTRA_DIGITS: u32 = 5;

/// Shapes chosen once per query at bind time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AvgPlan {
    pub input_shape: DecimalShape,
    pub sum_shape: DecimalShape,
    pub output_shape: DecimalShape,
    pub max_precision: u32,
}

/// Derive the accumulator and output shapes for one aggregation.
///
/// The accumulator gets `p_sum = min(max_precision, p_in + 19)`: always large
/// enough when an exact sum is representable at all, and cheaper than the
/// full ceiling for small and moderate `p_in`. The output grows by five
/// digits of precision and scale, clamped to the ceiling.
///
/// Pure: the same input shape and ceiling always produce the same plan.
pub fn plan(input_shape: DecimalShape, max_precision: u32) -> Result<AvgPlan, AggError> {
    input_shape
        .validate()
        .map_err(AggError::arithmetic(AggPhase::Plan))?;
    if input_shape.precision < 1 || input_shape.precision > max_precision {
        return Err(AggError::InvalidInputShape {
            precision: input_shape.precision,
            max_precision,
        });
    }

    let p_sum = (input_shape.precision + EXTRA_DIGITS_FOR_ROW_COUNT).min(max_precision);
    let s_sum = input_shape.scale.min(p_sum);

    let p_out = (input_shape.precision + OUTPUT_EXTRA_DIGITS).min(max_precision);
    let s_out = (input_shape.scale + OUTPUT_EXTRA_DIGITS).min(p_out);

    let plan = AvgPlan {
        input_shape,
        sum_shape: DecimalShape {
            precision: p_sum,
            scale: s_sum,
        },
        output_shape: DecimalShape {
            precision: p_out,
            scale: s_out,
        },
        max_precision,
    };
    debug!(
        "exact_avg plan: input {} sum {} output {} ceiling {}",
        plan.input_shape, plan.sum_shape, plan.output_shape, plan.max_precision
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::{EXTRA_DIGITS_FOR_ROW_COUNT, plan};
    use crate::decimal::{DEFAULT_MAX_NUMERIC_PRECISION, DecimalShape};
    use crate::error::AggError;

    fn shape(precision: u32, scale: u32) -> DecimalShape {
        DecimalShape { precision, scale }
    }

    #[test]
    fn test_plan_grows_sum_by_row_count_digits() {
        let plan = plan(shape(10, 2), DEFAULT_MAX_NUMERIC_PRECISION).unwrap();
        assert_eq!(plan.sum_shape, shape(10 + EXTRA_DIGITS_FOR_ROW_COUNT, 2));
        assert_eq!(plan.output_shape, shape(15, 7));
    }

    #[test]
    fn test_plan_clamps_to_ceiling() {
        let plan = plan(shape(1020, 3), DEFAULT_MAX_NUMERIC_PRECISION).unwrap();
        assert_eq!(plan.sum_shape, shape(1024, 3));
        assert_eq!(plan.output_shape, shape(1024, 8));
    }

    #[test]
    fn test_plan_is_idempotent() {
        let first = plan(shape(38, 10), 76).unwrap();
        let second = plan(shape(38, 10), 76).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_plan_rejects_precision_out_of_range() {
        match plan(shape(0, 0), 1024) {
            Err(AggError::InvalidInputShape {
                precision: 0,
                max_precision: 1024,
            }) => {}
            other => panic!("unexpected plan result: {:?}", other),
        }
        assert!(plan(shape(1025, 0), 1024).is_err());
    }

    #[test]
    fn test_plan_with_small_injected_ceiling() {
        let plan = plan(shape(6, 2), 20).unwrap();
        assert_eq!(plan.sum_shape, shape(20, 2));
        assert_eq!(plan.output_shape, shape(11, 7));
    }
}
