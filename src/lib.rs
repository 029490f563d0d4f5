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
pub mod agg;
pub mod common;
pub mod decimal;
pub mod error;

pub use common::config as exact_avg_config;
pub use common::logging as exact_avg_logging;

pub use agg::avg::ExactAvg;
pub use agg::planner::{AvgPlan, EXTRA_DIGITS_FOR_ROW_COUNT, plan};
pub use agg::state::AvgDecimalState;
pub use decimal::{
    DEFAULT_MAX_NUMERIC_PRECISION, Decimal, DecimalArray, DecimalArrayBuilder, DecimalShape,
};
pub use error::{AggError, AggPhase, DecimalError};
