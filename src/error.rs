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
use std::fmt;

use thiserror::Error;

/// Errors raised by the fixed-point decimal layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    #[error("invalid decimal shape: scale {scale} exceeds precision {precision}")]
    InvalidShape { precision: u32, scale: u32 },

    #[error("invalid numeric precision {precision}: must be within [1, {max_precision}]")]
    PrecisionOutOfRange { precision: u32, max_precision: u32 },

    #[error("value with {digits} digits does not fit decimal({precision}, {scale})")]
    ValueOutOfRange {
        digits: u32,
        precision: u32,
        scale: u32,
    },

    #[error("cannot rescale exactly from scale {from} to scale {to}: non-zero digits dropped")]
    InexactRescale { from: u32, to: u32 },

    #[error("invalid decimal literal '{text}': {reason}")]
    InvalidLiteral { text: String, reason: String },
}

/// Lifecycle phase an arithmetic failure is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggPhase {
    Plan,
    Accumulate,
    Merge,
    Finalize,
}

impl fmt::Display for AggPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggPhase::Plan => "plan",
            AggPhase::Accumulate => "accumulate",
            AggPhase::Merge => "merge",
            AggPhase::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Errors surfaced at the aggregate lifecycle boundaries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggError {
    /// Static configuration error: the input column's precision is unusable.
    #[error("exact_avg: invalid input numeric precision {precision}: must be within [1, {max_precision}]")]
    InvalidInputShape { precision: u32, max_precision: u32 },

    /// The only data-dependent expected failure: no implementation can
    /// represent the exact sum within the bounded-precision system.
    #[error(
        "exact_avg: cannot calculate the exact average for such huge numbers: \
         required precision {required} (input precision {input_precision} plus \
         {count_digits} digits for row count {row_count}) exceeds the maximum \
         numeric precision {max_precision}; consider reducing the magnitude or \
         the number of rows"
    )]
    PrecisionOverflow {
        required: u32,
        input_precision: u32,
        count_digits: u32,
        row_count: u64,
        max_precision: u32,
    },

    /// Protocol bug in the surrounding engine, not bad data.
    #[error("exact_avg: internal error: {0}")]
    InternalConsistency(String),

    /// A malformed partial-state blob arrived at a merge boundary.
    #[error("exact_avg: invalid intermediate state '{blob}': {reason}")]
    InvalidIntermediate { blob: String, reason: String },

    /// Decimal-library failure, tagged with the phase it occurred in.
    #[error("exact_avg: error in {phase}: {source}")]
    Arithmetic {
        phase: AggPhase,
        #[source]
        source: DecimalError,
    },
}

impl AggError {
    pub(crate) fn arithmetic(phase: AggPhase) -> impl FnOnce(DecimalError) -> AggError {
        move |source| AggError::Arithmetic { phase, source }
    }
}
