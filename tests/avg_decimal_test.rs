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

use exact_avg::{
    AggError, AggPhase, AvgDecimalState, DEFAULT_MAX_NUMERIC_PRECISION, Decimal, DecimalArray,
    DecimalArrayBuilder, DecimalShape, ExactAvg, plan,
};

fn shape(precision: u32, scale: u32) -> DecimalShape {
    DecimalShape { precision, scale }
}

fn run_one_partition(
    input_shape: DecimalShape,
    max_precision: u32,
    literals: &[Option<&str>],
) -> Result<Option<Decimal>, AggError> {
    let kernel = ExactAvg::new(plan(input_shape, max_precision)?);
    let mut state = kernel.init_state();
    let input = DecimalArray::from_strs(input_shape, literals).expect("build input");
    kernel.update_batch(&mut state, &input)?;
    kernel.finalize(state)
}

#[test]
fn test_avg_exact_no_nulls() {
    // avg(1.00, 2.00, 3.00) = 2.00 exactly
    let out = run_one_partition(
        shape(10, 2),
        DEFAULT_MAX_NUMERIC_PRECISION,
        &[Some("1.00"), Some("2.00"), Some("3.00")],
    )
    .unwrap()
    .expect("non-empty group");
    assert_eq!(out.shape(), shape(15, 7));
    assert_eq!(out.to_string(), "2.0000000");
}

#[test]
fn test_avg_skips_null_rows() {
    // avg(1.00, NULL, 3.00) = 2.00; the null row joins neither sum nor count
    let out = run_one_partition(
        shape(10, 2),
        DEFAULT_MAX_NUMERIC_PRECISION,
        &[Some("1.00"), None, Some("3.00")],
    )
    .unwrap()
    .expect("non-empty group");
    assert_eq!(out.to_string(), "2.0000000");
}

#[test]
fn test_avg_empty_group_is_null() {
    let out = run_one_partition(shape(10, 2), DEFAULT_MAX_NUMERIC_PRECISION, &[]).unwrap();
    assert!(out.is_none());
}

#[test]
fn test_avg_all_null_group_is_null() {
    let out = run_one_partition(
        shape(10, 2),
        DEFAULT_MAX_NUMERIC_PRECISION,
        &[None, None, None],
    )
    .unwrap();
    assert!(out.is_none());
}

#[test]
fn test_avg_round_half_up_positive() {
    // avg(2, 0, 0) = 0.666... -> 0.66667 at the output scale
    let out = run_one_partition(
        shape(3, 0),
        DEFAULT_MAX_NUMERIC_PRECISION,
        &[Some("2"), Some("0"), Some("0")],
    )
    .unwrap()
    .expect("non-empty group");
    assert_eq!(out.shape(), shape(8, 5));
    assert_eq!(out.to_string(), "0.66667");
}

#[test]
fn test_avg_round_half_up_negative() {
    // avg(-2, 0, 0) = -0.666... -> ROUND_HALF_UP (away from zero) => -0.66667
    let out = run_one_partition(
        shape(3, 0),
        DEFAULT_MAX_NUMERIC_PRECISION,
        &[Some("-2"), Some("0"), Some("0")],
    )
    .unwrap()
    .expect("non-empty group");
    assert_eq!(out.to_string(), "-0.66667");
}

#[test]
fn test_avg_exact_tie_rounds_away_from_zero() {
    // 1 / 64 = 0.015625: the 5-digit output scale sees an exact tie, which
    // carries away from zero on both signs.
    let mut positive = vec![Some("1")];
    positive.extend(std::iter::repeat_n(Some("0"), 63));
    let out = run_one_partition(shape(5, 0), DEFAULT_MAX_NUMERIC_PRECISION, &positive)
        .unwrap()
        .expect("non-empty group");
    assert_eq!(out.to_string(), "0.01563");

    let mut negative = vec![Some("-1")];
    negative.extend(std::iter::repeat_n(Some("0"), 63));
    let out = run_one_partition(shape(5, 0), DEFAULT_MAX_NUMERIC_PRECISION, &negative)
        .unwrap()
        .expect("non-empty group");
    assert_eq!(out.to_string(), "-0.01563");
}

#[test]
fn test_avg_never_rounds_during_accumulation() {
    // avg(0.10, 0.20, 0.40) = 0.2333... only the final division rounds
    let out = run_one_partition(
        shape(10, 2),
        DEFAULT_MAX_NUMERIC_PRECISION,
        &[Some("0.10"), Some("0.20"), Some("0.40")],
    )
    .unwrap()
    .expect("non-empty group");
    assert_eq!(out.to_string(), "0.2333333");
}

#[test]
fn test_avg_large_batch_stays_exact() {
    // 1000 rows of 0.001 sum to exactly 1.000
    let input_shape = shape(12, 3);
    let mut builder = DecimalArrayBuilder::new(input_shape);
    for _ in 0..1000 {
        builder.append_value(BigInt::from(1));
    }
    let input = builder.finish().expect("build input");

    let kernel = ExactAvg::new(plan(input_shape, DEFAULT_MAX_NUMERIC_PRECISION).unwrap());
    let mut state = kernel.init_state();
    kernel.update_batch(&mut state, &input).unwrap();
    assert_eq!(state.count(), 1000);
    assert_eq!(state.sum_unscaled(), &BigInt::from(1000));

    let out = kernel.finalize(state).unwrap().expect("non-empty group");
    assert_eq!(out.to_string(), "0.00100000");
}

#[test]
fn test_overflow_boundary_at_ceiling_succeeds() {
    // p_in + digits10(count) == ceiling: 18 + digits10(99) = 20
    let literals: Vec<Option<&str>> = vec![Some("1"); 99];
    let out = run_one_partition(shape(18, 0), 20, &literals)
        .unwrap()
        .expect("non-empty group");
    assert_eq!(out.to_string(), "1.00000");
}

#[test]
fn test_overflow_boundary_one_past_ceiling_fails() {
    // p_in + digits10(count) == ceiling + 1: 18 + digits10(100) = 21
    let literals: Vec<Option<&str>> = vec![Some("1"); 100];
    match run_one_partition(shape(18, 0), 20, &literals) {
        Err(AggError::PrecisionOverflow {
            required,
            input_precision,
            count_digits,
            row_count,
            max_precision,
        }) => {
            assert_eq!(required, 21);
            assert_eq!(input_precision, 18);
            assert_eq!(count_digits, 3);
            assert_eq!(row_count, 100);
            assert_eq!(max_precision, 20);
        }
        other => panic!("expected precision overflow, got {:?}", other),
    }
}

#[test]
fn test_overflow_diagnosis_is_shape_driven() {
    // 100000 rows of a 1020-digit input need 1026 total digits regardless of
    // the actual values; the merged-state wire form stands in for the rows.
    let kernel = ExactAvg::new(plan(shape(1020, 0), DEFAULT_MAX_NUMERIC_PRECISION).unwrap());
    let mut state = kernel.init_state();
    let peer = AvgDecimalState::decode("0,100000,1020,0").unwrap();
    kernel.merge(&mut state, peer).unwrap();

    match kernel.finalize(state) {
        Err(AggError::PrecisionOverflow {
            required,
            row_count,
            ..
        }) => {
            assert_eq!(required, 1026);
            assert_eq!(row_count, 100000);
        }
        other => panic!("expected precision overflow, got {:?}", other),
    }
}

#[test]
fn test_overflow_error_message_is_actionable() {
    let literals: Vec<Option<&str>> = vec![Some("1"); 100];
    let err = run_one_partition(shape(18, 0), 20, &literals).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("required precision 21"), "{message}");
    assert!(message.contains("input precision 18"), "{message}");
    assert!(message.contains("row count 100"), "{message}");
    assert!(message.contains("maximum numeric precision 20"), "{message}");
}

#[test]
fn test_plan_rejects_out_of_range_precision() {
    assert!(matches!(
        plan(shape(0, 0), DEFAULT_MAX_NUMERIC_PRECISION),
        Err(AggError::InvalidInputShape { precision: 0, .. })
    ));
    assert!(matches!(
        plan(shape(1025, 0), DEFAULT_MAX_NUMERIC_PRECISION),
        Err(AggError::InvalidInputShape {
            precision: 1025,
            ..
        })
    ));
}

#[test]
fn test_accumulate_rejects_undersized_batch_shape() {
    // A zero-precision column reaching the kernel is a static configuration
    // error surfaced on the first batch.
    let kernel = ExactAvg::new(plan(shape(10, 2), DEFAULT_MAX_NUMERIC_PRECISION).unwrap());
    let mut state = kernel.init_state();
    let bogus = DecimalArray::from_strs(shape(0, 0), &[]).expect("build input");
    assert!(matches!(
        kernel.update_batch(&mut state, &bogus),
        Err(AggError::InvalidInputShape { precision: 0, .. })
    ));
}

#[test]
fn test_quotient_wider_than_output_shape_fails_loudly() {
    // avg of a single 18-digit value: the sum fits, but at the +5 output
    // scale the quotient needs 23 digits against a 20-digit ceiling.
    let out = run_one_partition(shape(18, 0), 20, &[Some("100000000000000000")]);
    match out {
        Err(AggError::Arithmetic {
            phase: AggPhase::Finalize,
            ..
        }) => {}
        other => panic!("expected finalize arithmetic failure, got {:?}", other),
    }
}
