// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("dependency graph is structurally invalid: {0}")]
    InvalidGraph(String),

    #[error("resolver did not converge after {0} iterations")]
    ResolverDidNotConverge(usize),

    #[error("ascendant path count overflowed while tracking {0}")]
    PathCountOverflow(String),
}
