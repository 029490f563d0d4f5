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

use crate::decimal::DecimalShape;
use crate::error::AggError;

/// Per-partition partial aggregation record: running exact sum (unscaled, at
/// the planned accumulator scale), non-null row count, and the input shape
/// once learned. `input_shape` is written on first use and never narrows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AvgDecimalState {
    pub(crate) sum: BigInt,
    pub(crate) count: u64,
    pub(crate) input_shape: Option<DecimalShape>,
}

impl AvgDecimalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum_unscaled(&self) -> &BigInt {
        &self.sum
    }

    pub fn input_shape(&self) -> Option<DecimalShape> {
        self.input_shape
    }

    /// Encode the partial state for cross-partition exchange as
    /// `"{unscaled},{count},{precision},{scale}"`. An empty state (no rows
    /// counted) travels as null.
    pub fn encode(&self) -> Option<String> {
        if self.count == 0 {
            return None;
        }
        debug_assert!(self.input_shape.is_some());
        let shape = self.input_shape?;
        Some(format!(
            "{},{},{},{}",
            self.sum, self.count, shape.precision, shape.scale
        ))
    }

    /// Decode a partial state produced by [`encode`](Self::encode).
    pub fn decode(text: &str) -> Result<Self, AggError> {
        let invalid = |reason: String| AggError::InvalidIntermediate {
            blob: text.to_string(),
            reason,
        };

        let mut parts = text.split(',');
        let mut next_field = |name: &str| {
            parts
                .next()
                .ok_or_else(|| invalid(format!("missing '{}' field", name)))
        };

        let sum = next_field("sum")?
            .parse::<BigInt>()
            .map_err(|e| invalid(format!("bad sum: {}", e)))?;
        let count = next_field("count")?
            .parse::<u64>()
            .map_err(|e| invalid(format!("bad count: {}", e)))?;
        let precision = next_field("precision")?
            .parse::<u32>()
            .map_err(|e| invalid(format!("bad precision: {}", e)))?;
        let scale = next_field("scale")?
            .parse::<u32>()
            .map_err(|e| invalid(format!("bad scale: {}", e)))?;
        if parts.next().is_some() {
            return Err(invalid("too many fields".to_string()));
        }

        let shape = DecimalShape { precision, scale };
        shape
            .validate()
            .map_err(|e| invalid(format!("bad shape: {}", e)))?;

        Ok(Self {
            sum,
            count,
            input_shape: Some(shape),
        })
    }
}
