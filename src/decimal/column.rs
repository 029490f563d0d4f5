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

use super::{DecimalShape, digits10, parse_decimal};
use crate::error::DecimalError;

/// A nullable column of fixed-point values sharing one shape. This is the
/// host engine's row-batch surface as the accumulate phase sees it; batch
/// length is whatever the engine produced, never assumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecimalArray {
    shape: DecimalShape,
    values: Vec<Option<BigInt>>,
}

impl DecimalArray {
    /// Build a column, checking every coefficient fits the shape's precision.
    pub fn try_new(
        shape: DecimalShape,
        values: Vec<Option<BigInt>>,
    ) -> Result<Self, DecimalError> {
        shape.validate()?;
        for value in values.iter().flatten() {
            let digits = digits10(value);
            if digits > shape.precision {
                return Err(DecimalError::ValueOutOfRange {
                    digits,
                    precision: shape.precision,
                    scale: shape.scale,
                });
            }
        }
        Ok(Self { shape, values })
    }

    /// Parse a batch of literals at the column's scale.
    pub fn from_strs(
        shape: DecimalShape,
        literals: &[Option<&str>],
    ) -> Result<Self, DecimalError> {
        let mut values = Vec::with_capacity(literals.len());
        for literal in literals {
            match literal {
                Some(text) => values.push(Some(parse_decimal(text, shape.scale)?)),
                None => values.push(None),
            }
        }
        Self::try_new(shape, values)
    }

    pub fn shape(&self) -> DecimalShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.values.get(row).is_none_or(|v| v.is_none())
    }

    pub fn value_at(&self, row: usize) -> Option<&BigInt> {
        self.values.get(row).and_then(|v| v.as_ref())
    }
}

/// Incremental builder for [`DecimalArray`]; validation happens in `finish`.
#[derive(Debug)]
pub struct DecimalArrayBuilder {
    shape: DecimalShape,
    values: Vec<Option<BigInt>>,
}

impl DecimalArrayBuilder {
    pub fn new(shape: DecimalShape) -> Self {
        Self {
            shape,
            values: Vec::new(),
        }
    }

    pub fn append_value(&mut self, unscaled: BigInt) {
        self.values.push(Some(unscaled));
    }

    pub fn append_null(&mut self) {
        self.values.push(None);
    }

    pub fn append_option(&mut self, unscaled: Option<BigInt>) {
        self.values.push(unscaled);
    }

    pub fn finish(self) -> Result<DecimalArray, DecimalError> {
        DecimalArray::try_new(self.shape, self.values)
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::{DecimalArray, DecimalArrayBuilder};
    use crate::decimal::DecimalShape;

    #[test]
    fn test_from_strs_with_nulls() {
        let shape = DecimalShape {
            precision: 10,
            scale: 2,
        };
        let array = DecimalArray::from_strs(shape, &[Some("1.00"), None, Some("3.00")]).unwrap();
        assert_eq!(array.len(), 3);
        assert!(!array.is_null(0));
        assert!(array.is_null(1));
        assert_eq!(array.value_at(0), Some(&BigInt::from(100)));
        assert_eq!(array.value_at(1), None);
        assert_eq!(array.value_at(2), Some(&BigInt::from(300)));
    }

    #[test]
    fn test_builder_validates_precision_on_finish() {
        let shape = DecimalShape {
            precision: 3,
            scale: 0,
        };
        let mut builder = DecimalArrayBuilder::new(shape);
        builder.append_value(BigInt::from(999));
        builder.append_null();
        builder.append_value(BigInt::from(1000));
        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_out_of_range_row_reads_as_null() {
        let shape = DecimalShape {
            precision: 5,
            scale: 1,
        };
        let array = DecimalArray::from_strs(shape, &[Some("4.2")]).unwrap();
        assert!(array.is_null(7));
        assert_eq!(array.value_at(7), None);
    }
}
