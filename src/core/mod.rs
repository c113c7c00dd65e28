// Pure aggregation engine and its shared models/errors
pub mod range {
    pub use crate::range::*;
}

pub mod filter {
    pub use crate::filter::*;
}

pub mod series {
    pub use crate::series::*;
}

pub mod journey {
    pub use crate::journey::*;
}

pub mod dashboard {
    pub use crate::dashboard::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}

pub mod normalization {
    pub use crate::normalization::*;
}

pub mod metrics {
    pub use crate::metrics::*;
}
